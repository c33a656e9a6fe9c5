//! Test fixtures: a throwaway workspace with a stub core package.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;

use crate::consts::{DEFAULT_CORE_PACKAGE, MAIN_TPL_C, MAIN_TPL_LUA};
use crate::context::{BuildContext, Engine};
use crate::workspace::Workspace;

pub struct Fixture {
  pub temp: TempDir,
  pub engine: Rc<Engine>,
}

impl Fixture {
  /// A workspace containing the stub core package (with runtime template
  /// files) and an empty package `host/pkg`.
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let engine = Engine::with_core(Workspace::new(temp.path().join("ws")), DEFAULT_CORE_PACKAGE);
    let fx = Self { temp, engine };
    fx.add_package(
      DEFAULT_CORE_PACKAGE,
      &format!(r#"return {{ package = "{}" }}"#, DEFAULT_CORE_PACKAGE),
    );
    fx.write_source(
      DEFAULT_CORE_PACKAGE,
      MAIN_TPL_C,
      "/* runtime loader */\nint main(int argc, char **argv) { return 0; }\n",
    );
    fx.write_source(DEFAULT_CORE_PACKAGE, MAIN_TPL_LUA, "-- runtime loader template\n");
    fx.add_package("host/pkg", r#"return { package = "host/pkg" }"#);
    fx
  }

  pub fn workspace_root(&self) -> PathBuf {
    self.temp.path().join("ws")
  }

  pub fn srcdir(&self, package: &str) -> PathBuf {
    self.workspace_root().join("src").join(package)
  }

  /// Writes `src/<package>/package.lua`.
  pub fn add_package(&self, package: &str, descriptor: &str) {
    self.write_source(package, "package.lua", descriptor);
  }

  /// Writes a file under the package source tree.
  pub fn write_source(&self, package: &str, rel: &str, content: &str) -> PathBuf {
    let path = self.srcdir(package).join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  pub fn context(&self, package: &str) -> Rc<BuildContext> {
    self.engine.context(package).unwrap()
  }

  /// Path of a file under the workspace, for assertions.
  pub fn path(&self, rel: &str) -> PathBuf {
    self.workspace_root().join(rel)
  }

  pub fn read(&self, path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
  }
}

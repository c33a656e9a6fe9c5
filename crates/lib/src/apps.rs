//! Application and runner executables.
//!
//! An application target links the bootstrap pair, the app's own module
//! objects (unless the module is exported, in which case the package
//! archive already carries it) and the full link set into an executable
//! under the package bin directory. The `_run` and `_test` runners are the
//! same construction without an app module, placed under the tmp
//! directory.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::bootstrap::BootstrapKind;
use crate::context::BuildContext;
use crate::error::Result;
use crate::target::Target;
use crate::tools;

impl BuildContext {
  /// Executable targets of every declared application, memoized.
  pub fn app_targets(self: &Rc<Self>) -> Result<Vec<Rc<Target>>> {
    if let Some(targets) = self.apps.borrow().as_ref() {
      return Ok(targets.clone());
    }

    let apps = self.descriptor().apps.clone();
    let mut out = Vec::new();
    for app in &apps {
      out.push(self.app_target(app)?);
    }

    *self.apps.borrow_mut() = Some(out.clone());
    Ok(out)
  }

  /// The executable target of one application at `bindir/<app>`.
  pub fn app_target(self: &Rc<Self>, app: &str) -> Result<Rc<Target>> {
    let exported = self.descriptor().exports.iter().any(|e| e == app);
    let mut objects = self.bootstrap_targets(&BootstrapKind::App(app.to_string()))?;
    if !exported {
      // exported app modules reach the image through the package archive
      objects.extend(self.module_targets(app)?);
    }
    self.executable_target(&self.paths().bindir.join(app), objects)
  }

  /// The `_run` or `_test` executable under the tmp directory.
  pub fn runner_target(self: &Rc<Self>, kind: &BootstrapKind) -> Result<Rc<Target>> {
    let objects = self.bootstrap_targets(kind)?;
    self.executable_target(&self.paths().tmpdir.join(kind.stem()), objects)
  }

  fn executable_target(self: &Rc<Self>, path: &Path, objects: Vec<Rc<Target>>) -> Result<Rc<Target>> {
    let link_set = self.link_targets()?;

    let object_paths: Vec<PathBuf> = objects.iter().filter_map(|t| t.path()).collect();
    let archives: Vec<PathBuf> = link_set.iter().filter_map(|t| t.path()).collect();
    let mut ldflags: Vec<String> = Vec::new();
    for target in &link_set {
      ldflags.extend(target.ldflags().iter().cloned());
    }
    ldflags.extend(self.link_flags()?);

    let target = Target::builder(self)
      .output(path)
      .depend_all(&objects)
      .depend_all(&link_set)
      .recipe(move |t, _| tools::link_executable(&t.output(), &object_paths, &archives, &ldflags))
      .finish();
    Ok(target)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::Fixture;

  fn app_fixture(exported: bool) -> Fixture {
    let fx = Fixture::new();
    let exports = if exported { r#"exports = { "main" },"# } else { "" };
    let descriptor = format!(
      r#"return {{
        package = "host/app",
        {}
        apps = {{ "main" }},
      }}"#,
      exports
    );
    fx.add_package("host/app", &descriptor);
    fx.write_source("host/app", "main.lua", "return {}\n");
    fx
  }

  #[test]
  fn app_target_lands_in_bindir() {
    let fx = app_fixture(false);
    let ctx = fx.context("host/app");
    let app = ctx.app_target("main").unwrap();
    assert_eq!(app.output(), fx.path("bin/host/app/main"));
  }

  #[test]
  fn unexported_app_links_its_module_objects_directly() {
    let fx = app_fixture(false);
    let ctx = fx.context("host/app");
    let app = ctx.app_target("main").unwrap();

    let deps: Vec<_> = app.resolved_depends().unwrap().iter().map(|d| d.output()).collect();
    assert!(deps.contains(&fx.path("obj/host/app/main.lo")));
    assert!(deps.contains(&fx.path("tmp/host/app/main_main.o")));
    assert!(deps.contains(&fx.path("tmp/host/app/main_main.lo")));
    assert!(deps.contains(&fx.path("lib/host/app/libapp.a")));
  }

  #[test]
  fn exported_app_module_comes_from_the_archive_only() {
    let fx = app_fixture(true);
    let ctx = fx.context("host/app");
    let app = ctx.app_target("main").unwrap();

    let deps: Vec<_> = app.resolved_depends().unwrap().iter().map(|d| d.output()).collect();
    // no direct module object edge: the archive carries main.lo
    assert!(!deps.contains(&fx.path("obj/host/app/main.lo")));
    assert!(deps.contains(&fx.path("lib/host/app/libapp.a")));
  }

  #[test]
  fn app_targets_follow_declared_order_and_memoize() {
    let fx = Fixture::new();
    fx.add_package(
      "host/multi",
      r#"return { package = "host/multi", apps = { "first", "second" } }"#,
    );
    fx.write_source("host/multi", "first.lua", "return {}\n");
    fx.write_source("host/multi", "second.lua", "return {}\n");
    let ctx = fx.context("host/multi");

    let apps = ctx.app_targets().unwrap();
    let outputs: Vec<_> = apps.iter().map(|t| t.output()).collect();
    assert_eq!(
      outputs,
      vec![fx.path("bin/host/multi/first"), fx.path("bin/host/multi/second")]
    );

    let again = ctx.app_targets().unwrap();
    assert!(Rc::ptr_eq(&apps[0], &again[0]));
  }

  #[test]
  fn runner_target_lands_in_tmpdir() {
    let fx = Fixture::new();
    let ctx = fx.context("host/pkg");
    let runner = ctx.runner_target(&BootstrapKind::Run).unwrap();
    assert_eq!(runner.output(), fx.path("tmp/host/pkg/_run"));

    let test_runner = ctx.runner_target(&BootstrapKind::Test).unwrap();
    assert_eq!(test_runner.output(), fx.path("tmp/host/pkg/_test"));
  }
}

//! Source acquisition front end.
//!
//! Thin wrappers over the git client: `init` lays out a fresh package
//! skeleton, `checkout` clones (or updates) a package into the workspace
//! source tree. The build engine only depends on the output contract: the
//! package source tree at `$WORKSPACE/src/<package>` with a `package.lua`
//! at its root. The client binary can be overridden with `ZZ_GIT`.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::context::Engine;
use crate::error::{Error, Result};
use crate::remote::PackageRef;
use crate::tools::{self, env_tool};

pub fn git() -> String {
  env_tool("ZZ_GIT", "git")
}

/// Creates `src/<package>` with a skeleton descriptor and initializes a
/// repository in it. Fails if the package already has a descriptor.
pub fn init_package(engine: &Engine, package: &str) -> Result<PathBuf> {
  let paths = engine.workspace().package_paths(package);
  if paths.descriptor_path().exists() {
    return Err(Error::PackageExists(paths.srcdir));
  }
  fs::create_dir_all(&paths.srcdir)?;
  fs::write(paths.descriptor_path(), skeleton_descriptor(package))?;
  tools::run_tool(
    &git(),
    &["init".to_string(), "-q".to_string(), paths.srcdir.display().to_string()],
  )?;
  info!(package = %package, dir = %paths.srcdir.display(), "initialized");
  Ok(paths.srcdir)
}

/// Clones the package into the workspace source tree, or with `update`
/// pulls an existing checkout. An optional `rev` is checked out afterward.
pub fn checkout(engine: &Engine, package: &PackageRef, update: bool, rev: Option<&str>) -> Result<PathBuf> {
  let paths = engine.workspace().package_paths(&package.id);
  let dir = paths.srcdir.display().to_string();

  if paths.srcdir.is_dir() {
    if update {
      tools::run_tool(&git(), &["-C".to_string(), dir.clone(), "pull".to_string(), "-q".to_string()])?;
    }
  } else {
    if let Some(parent) = paths.srcdir.parent() {
      fs::create_dir_all(parent)?;
    }
    tools::run_tool(
      &git(),
      &[
        "clone".to_string(),
        "-q".to_string(),
        package.url.clone(),
        dir.clone(),
      ],
    )?;
  }

  if let Some(rev) = rev {
    tools::run_tool(
      &git(),
      &[
        "-C".to_string(),
        dir,
        "checkout".to_string(),
        "-q".to_string(),
        rev.to_string(),
      ],
    )?;
  }

  info!(package = %package.id, "checked out");
  Ok(paths.srcdir)
}

fn skeleton_descriptor(package: &str) -> String {
  format!(
    r#"return {{
   package = "{}",
   imports = {{}},
   exports = {{}},
}}
"#,
    package
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::Fixture;
  use serial_test::serial;

  #[test]
  #[serial]
  fn init_writes_a_loadable_skeleton() {
    temp_env::with_vars([("ZZ_GIT", Some("true"))], || {
      let fx = Fixture::new();
      let srcdir = init_package(&fx.engine, "host/fresh").unwrap();
      assert_eq!(srcdir, fx.srcdir("host/fresh"));

      let descriptor =
        crate::descriptor::load_descriptor(&srcdir.join("package.lua"), fx.engine.core_package()).unwrap();
      assert_eq!(descriptor.package, "host/fresh");
      assert_eq!(descriptor.exports, vec!["package"]);
    });
  }

  #[test]
  #[serial]
  fn init_refuses_to_clobber_an_existing_package() {
    temp_env::with_vars([("ZZ_GIT", Some("true"))], || {
      let fx = Fixture::new();
      assert!(matches!(
        init_package(&fx.engine, "host/pkg"),
        Err(Error::PackageExists(_))
      ));
    });
  }

  #[test]
  #[serial]
  fn checkout_of_existing_tree_without_update_is_noop() {
    temp_env::with_vars([("ZZ_GIT", Some("false"))], || {
      // git is never invoked: the tree exists and update is off
      let fx = Fixture::new();
      let package = PackageRef::parse("host/pkg").unwrap();
      let srcdir = checkout(&fx.engine, &package, false, None).unwrap();
      assert_eq!(srcdir, fx.srcdir("host/pkg"));
    });
  }

  #[test]
  #[serial]
  fn failing_client_is_fatal() {
    temp_env::with_vars([("ZZ_GIT", Some("false"))], || {
      let fx = Fixture::new();
      let package = PackageRef::parse("host/newpkg").unwrap();
      assert!(matches!(
        checkout(&fx.engine, &package, false, None),
        Err(Error::ToolFailed { .. })
      ));
    });
  }
}

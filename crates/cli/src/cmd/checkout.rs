//! Implementation of the `zz checkout` command.

use std::rc::Rc;

use anyhow::{Context, Result};

use zz_lib::remote::PackageRef;
use zz_lib::{vcs, Engine};

/// Clones the package into the workspace source tree, pulling instead
/// when it is already checked out and `-u` was given.
pub fn cmd_checkout(engine: &Rc<Engine>, spec: &str, update: bool, rev: Option<&str>) -> Result<()> {
  let package = PackageRef::parse(spec)?;
  let srcdir = vcs::checkout(engine, &package, update, rev).context("checkout failed")?;
  println!("Checked out {} at {}", package.id, srcdir.display());
  Ok(())
}

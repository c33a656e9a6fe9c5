//! Implementation of the `zz init` command.

use std::rc::Rc;

use anyhow::{Context, Result};

use zz_lib::remote::PackageRef;
use zz_lib::{vcs, Engine};

/// Creates a fresh package skeleton under the workspace source tree and
/// initializes a repository in it.
pub fn cmd_init(engine: &Rc<Engine>, spec: &str) -> Result<()> {
  let package = PackageRef::parse(spec)?;
  let srcdir = vcs::init_package(engine, &package.id).context("init failed")?;
  println!("Initialized {} at {}", package.id, srcdir.display());
  Ok(())
}

//! Implementation of the `zz get` command.

use std::rc::Rc;

use anyhow::{Context, Result};

use zz_lib::remote::PackageRef;
use zz_lib::{driver, vcs, Engine};

/// Checkout followed by a recursive build and install.
pub fn cmd_get(engine: &Rc<Engine>, spec: &str, update: bool) -> Result<()> {
  let package = PackageRef::parse(spec)?;
  vcs::checkout(engine, &package, update, None).context("checkout failed")?;
  let ctx = engine.context(&package.id)?;
  driver::install(&ctx).context("install failed")?;
  println!("Installed {}", package.id);
  Ok(())
}

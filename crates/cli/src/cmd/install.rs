//! Implementation of the `zz install` command.

use std::rc::Rc;

use anyhow::{Context, Result};

use zz_lib::{driver, Engine};

use crate::cmd::context_for;

/// Recursive build with apps, then global bin symlinks for every
/// installable application.
pub fn cmd_install(engine: &Rc<Engine>, package: Option<&str>) -> Result<()> {
  let ctx = context_for(engine, package)?;
  driver::install(&ctx).context("install failed")?;
  println!("Installed {}", ctx.package());
  Ok(())
}

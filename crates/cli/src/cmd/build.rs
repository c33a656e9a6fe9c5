//! Implementation of the `zz build` command.

use std::rc::Rc;

use anyhow::{Context, Result};

use zz_lib::{driver, Engine};

use crate::cmd::context_for;

/// Builds the named package (or the current one): native prerequisites,
/// the package archive, and every declared application.
pub fn cmd_build(engine: &Rc<Engine>, package: Option<&str>, recursive: bool) -> Result<()> {
  let ctx = context_for(engine, package)?;
  driver::build(&ctx, recursive, true).context("build failed")?;
  println!("Built {}", ctx.package());
  Ok(())
}

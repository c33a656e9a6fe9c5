//! Implementation of the `zz clean` command.

use std::rc::Rc;

use anyhow::{Context, Result};

use zz_lib::{driver, Engine};

use crate::cmd::context_for;

/// Removes the package's derived object, library and tmp trees.
pub fn cmd_clean(engine: &Rc<Engine>, package: Option<&str>) -> Result<()> {
  let ctx = context_for(engine, package)?;
  driver::clean(&ctx).context("clean failed")?;
  Ok(())
}

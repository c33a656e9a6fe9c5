//! Implementation of the `zz distclean` command.

use std::rc::Rc;

use anyhow::{Context, Result};

use zz_lib::{driver, Engine};

use crate::cmd::context_for;

/// `clean` plus the package executables, the native staging directory and
/// any global bin symlinks into this package's bindir.
pub fn cmd_distclean(engine: &Rc<Engine>, package: Option<&str>) -> Result<()> {
  let ctx = context_for(engine, package)?;
  driver::distclean(&ctx).context("distclean failed")?;
  Ok(())
}

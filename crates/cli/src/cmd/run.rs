//! Implementation of the `zz run` command.

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};

use zz_lib::{driver, Engine};

/// Builds a runner executable for the current package and executes the
/// given script with the remaining arguments. On success this does not
/// return: the process image is replaced by the runner.
pub fn cmd_run(engine: &Rc<Engine>, script: &Path, args: &[String]) -> Result<()> {
  let ctx = engine.current_context()?;
  driver::run(&ctx, script, args).context("run failed")?;
  Ok(())
}

//! Implementation of the `zz test` command.

use std::rc::Rc;

use anyhow::{Context, Result};

use zz_lib::{driver, Engine};

/// Builds a test-runner executable for the current package and executes
/// the resolved test files. On success this does not return: the process
/// image is replaced by the runner.
pub fn cmd_test(engine: &Rc<Engine>, names: &[String]) -> Result<()> {
  let ctx = engine.current_context()?;
  driver::test(&ctx, names).context("test failed")?;
  Ok(())
}

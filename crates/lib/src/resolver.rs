//! Target-reference resolution.
//!
//! A target reference is a string name bound within some build context.
//! Resolution consults the owning context's registry first, then the
//! registries of its direct imports in declared order. Imports are loaded
//! lazily: on a miss, the import's standard target groups (natives and the
//! package library) are materialized so cross-package references resolve
//! without a prior recursive build. Resolution never recurses past direct
//! imports; transitive imports register their targets when their own
//! contexts are built.

use std::rc::Rc;

use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::target::Target;

impl BuildContext {
  pub fn resolve(self: &Rc<Self>, name: &str) -> Result<Rc<Target>> {
    if let Some(target) = self.lookup(name) {
      return Ok(target);
    }

    // own natives may not have been materialized yet
    self.native_targets()?;
    if let Some(target) = self.lookup(name) {
      return Ok(target);
    }

    let engine = self.engine();
    for import in &self.descriptor().imports {
      let ictx = engine.context(import)?;
      if let Some(target) = ictx.lookup(name) {
        return Ok(target);
      }
      ictx.native_targets()?;
      ictx.library_target()?;
      if let Some(target) = ictx.lookup(name) {
        return Ok(target);
      }
    }

    Err(Error::UnresolvedTarget {
      name: name.to_string(),
      package: self.package().to_string(),
    })
  }
}

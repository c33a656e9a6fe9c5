//! Native prerequisite targets.
//!
//! Each entry of the descriptor's `native` table is a recipe for a static
//! library `lib<name>.a` built from C sources in the package tree. The
//! archive target carries the recipe's `cflags`/`ldflags`, so module C
//! halves that reference it (via `depends`) inherit the flags through the
//! compile-flag walk, and executables pick up the link flags.

use std::path::Path;
use std::rc::Rc;

use crate::context::BuildContext;
use crate::descriptor::NativeSpec;
use crate::error::{Error, Result};
use crate::link;
use crate::target::Target;
use crate::tools;

impl BuildContext {
  /// Archive targets of every native prerequisite, memoized. Each archive
  /// is registered under `lib<name>.a`.
  pub fn native_targets(self: &Rc<Self>) -> Result<Vec<Rc<Target>>> {
    if let Some(targets) = self.natives.borrow().as_ref() {
      return Ok(targets.clone());
    }

    let specs = self.descriptor().native.clone();
    let mut archives = Vec::new();
    for (name, spec) in &specs {
      let archive = self.native_archive(name, spec)?;
      self.register(&format!("lib{}.a", name), archive.clone())?;
      archives.push(archive);
    }

    *self.natives.borrow_mut() = Some(archives.clone());
    Ok(archives)
  }

  fn native_archive(self: &Rc<Self>, name: &str, spec: &NativeSpec) -> Result<Rc<Target>> {
    let mut objects = Vec::new();
    for source in &spec.sources {
      let src_path = self.paths().srcdir.join(source);
      if !src_path.is_file() {
        return Err(Error::MissingSource(src_path));
      }
      let src_target = Target::file(self, &src_path);
      let obj_rel = Path::new(source).with_extension("o");
      let obj = {
        let src = src_path.clone();
        Target::builder(self)
          .output(&self.paths().objdir.join(obj_rel))
          .depend(&src_target)
          .cflags(spec.cflags.clone())
          .recipe(move |t, _| {
            let flags = link::collect_cflags(t)?;
            tools::compile_c(&src, &t.output(), &flags)
          })
          .finish()
      };
      objects.push(obj);
    }

    let archive = Target::builder(self)
      .output(&self.paths().libdir.join(format!("lib{}.a", name)))
      .depend_all(&objects)
      .cflags(spec.cflags.clone())
      .ldflags(spec.ldflags.clone())
      .recipe(|t, changed| {
        let members: Vec<_> = changed.iter().filter_map(|d| d.path()).collect();
        tools::archive(&t.output(), &members)
      })
      .finish();
    Ok(archive)
  }
}

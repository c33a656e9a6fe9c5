//! Module target factories.
//!
//! A module named `a/b` is backed by `src/a/b.lua` and optionally by a C
//! half `src/a/b.c` (with a soft header dependency on `src/a/b.h`). The
//! factory produces the pair of object targets: the bytecode object
//! `obj/a/b.lo` registered under the module's mangled loader symbol, and
//! the C object `obj/a/b.o` when the C source exists.

use std::rc::Rc;

use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::link;
use crate::mangle::mangle;
use crate::target::Target;
use crate::tools;

impl BuildContext {
  /// The object targets of module `name`, memoized per context.
  pub fn module_targets(self: &Rc<Self>, name: &str) -> Result<Vec<Rc<Target>>> {
    if let Some(targets) = self.modules.borrow().get(name) {
      return Ok(targets.clone());
    }

    let lua_src = self.paths().srcdir.join(format!("{}.lua", name));
    if !lua_src.is_file() {
      return Err(Error::MissingSource(lua_src));
    }

    let src_target = Target::file(self, &lua_src);
    let symbol = mangle(self.package(), name);
    let lua_obj = {
      let src = lua_src.clone();
      Target::builder(self)
        .output(&self.paths().objdir.join(format!("{}.lo", name)))
        .depend(&src_target)
        .recipe(move |t, _| tools::compile_lua(&src, &t.output(), &symbol))
        .finish()
    };
    self.register(&format!("{}.lo", name), lua_obj.clone())?;

    let mut targets = vec![lua_obj];

    let c_src = self.paths().srcdir.join(format!("{}.c", name));
    if c_src.is_file() {
      let c_target = Target::file(self, &c_src);
      // the header need not exist; its mtime participates when it does
      let h_target = Target::file(self, &self.paths().srcdir.join(format!("{}.h", name)));

      let mut builder = Target::builder(self)
        .output(&self.paths().objdir.join(format!("{}.o", name)))
        .depend(&c_target)
        .depend(&h_target);
      if let Some(refs) = self.descriptor().depends.get(name) {
        for r in refs {
          builder = builder.depend_ref(r.clone());
        }
      }

      let c_obj = {
        let src = c_src.clone();
        builder
          .recipe(move |t, _| {
            let flags = link::collect_cflags(t)?;
            tools::compile_c(&src, &t.output(), &flags)
          })
          .finish()
      };
      self.register(&format!("{}.o", name), c_obj.clone())?;
      targets.push(c_obj);
    }

    self.modules.borrow_mut().insert(name.to_string(), targets.clone());
    Ok(targets)
  }

  /// Targets of every exported module, memoized.
  pub fn exported_targets(self: &Rc<Self>) -> Result<Vec<Rc<Target>>> {
    if let Some(targets) = self.exported.borrow().as_ref() {
      return Ok(targets.clone());
    }

    let exports = self.descriptor().exports.clone();
    let mut out = Vec::new();
    for module in &exports {
      out.extend(self.module_targets(module)?);
    }

    *self.exported.borrow_mut() = Some(out.clone());
    Ok(out)
  }
}

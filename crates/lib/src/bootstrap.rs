//! Bootstrap target generation.
//!
//! Every executable embeds a generated source pair: a C file copied
//! verbatim from the core package's `_main.tpl.c` (the runtime and loader
//! entry point), and a Lua file assembled from a header binding the
//! package identifiers, the verbatim `_main.tpl.lua` template, and a
//! flavor-specific trailer. The templates are opaque payloads; the engine
//! never parses them.
//!
//! The pair is rebuilt on every invocation: its logical inputs (mount
//! tables, the selected app, runtime argument conventions) are not backed
//! by files, so mtimes cannot capture them.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use crate::consts::{CORE_PACKAGE_GLOBAL, MAIN_SYMBOL, MAIN_TPL_C, MAIN_TPL_LUA, PACKAGE_GLOBAL};
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::link;
use crate::mangle::mangle;
use crate::target::Target;
use crate::tools;

/// Output flavor of a generated bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapKind {
  /// Launches the mangled module of the named application.
  App(String),
  /// Runs the script path passed as the first runtime argument.
  Run,
  /// Runs every test file passed as a runtime argument.
  Test,
}

impl BootstrapKind {
  /// File stem of the generated sources under the package tmp directory.
  pub fn stem(&self) -> String {
    match self {
      BootstrapKind::App(name) => format!("{}_main", name),
      BootstrapKind::Run => "_run".to_string(),
      BootstrapKind::Test => "_test".to_string(),
    }
  }

  fn trailer(&self, package: &str) -> String {
    match self {
      BootstrapKind::App(name) => format!("boot_module(\"{}\")\n", mangle(package, name)),
      BootstrapKind::Run => "boot_script()\n".to_string(),
      BootstrapKind::Test => "boot_tests()\n".to_string(),
    }
  }
}

/// Assembles the generated Lua bootstrap: identifier bindings, the
/// verbatim template, mount statements, and the flavor trailer.
pub fn bootstrap_script(
  package: &str,
  core_package: &str,
  template: &str,
  mounts: &BTreeMap<String, String>,
  srcdir: &Path,
  kind: &BootstrapKind,
) -> String {
  let mut text = String::new();
  text.push_str(&format!("{} = \"{}\"\n", PACKAGE_GLOBAL, package));
  text.push_str(&format!("{} = \"{}\"\n", CORE_PACKAGE_GLOBAL, core_package));
  text.push_str(template);
  for (vpath, src) in mounts {
    text.push_str(&format!("mount(\"{}\", \"{}\")\n", vpath, srcdir.join(src).display()));
  }
  text.push_str(&kind.trailer(package));
  text
}

impl BuildContext {
  /// The generated source pair `(c, lua)` under the tmp directory, both
  /// flagged for unconditional rebuild.
  pub fn bootstrap_sources(self: &Rc<Self>, kind: &BootstrapKind) -> Result<(Rc<Target>, Rc<Target>)> {
    let engine = self.engine();
    let core = engine.context(engine.core_package())?;
    let tpl_c = core.paths().srcdir.join(MAIN_TPL_C);
    let tpl_lua = core.paths().srcdir.join(MAIN_TPL_LUA);
    if !tpl_c.is_file() {
      return Err(Error::MissingSource(tpl_c));
    }
    if !tpl_lua.is_file() {
      return Err(Error::MissingSource(tpl_lua));
    }

    let stem = kind.stem();
    let tmpdir = &self.paths().tmpdir;

    let c_gen = {
      let tpl = tpl_c.clone();
      Target::builder(self)
        .output(&tmpdir.join(format!("{}.c", stem)))
        .depend(&Target::file(&core, &tpl_c))
        .always()
        .recipe(move |t, _| {
          std::fs::copy(&tpl, t.output())?;
          Ok(())
        })
        .finish()
    };

    let lua_gen = {
      let tpl = tpl_lua.clone();
      let package = self.package().to_string();
      let core_package = engine.core_package().to_string();
      let mounts = self.descriptor().mounts.clone();
      let srcdir = self.paths().srcdir.clone();
      let kind = kind.clone();
      Target::builder(self)
        .output(&tmpdir.join(format!("{}.lua", stem)))
        .depend(&Target::file(&core, &tpl_lua))
        .always()
        .recipe(move |t, _| {
          let template = std::fs::read_to_string(&tpl)?;
          let text = bootstrap_script(&package, &core_package, &template, &mounts, &srcdir, &kind);
          std::fs::write(t.output(), text)?;
          Ok(())
        })
        .finish()
    };

    Ok((c_gen, lua_gen))
  }

  /// The compiled bootstrap objects `[<stem>.o, <stem>.lo]` for linking.
  /// The Lua half is compiled under the fixed `_main` loader symbol.
  pub fn bootstrap_targets(self: &Rc<Self>, kind: &BootstrapKind) -> Result<Vec<Rc<Target>>> {
    let (c_gen, lua_gen) = self.bootstrap_sources(kind)?;
    let stem = kind.stem();
    let tmpdir = &self.paths().tmpdir;

    let c_obj = {
      let src = c_gen.output();
      Target::builder(self)
        .output(&tmpdir.join(format!("{}.o", stem)))
        .depend(&c_gen)
        .recipe(move |t, _| {
          let flags = link::collect_cflags(t)?;
          tools::compile_c(&src, &t.output(), &flags)
        })
        .finish()
    };

    let lua_obj = {
      let src = lua_gen.output();
      Target::builder(self)
        .output(&tmpdir.join(format!("{}.lo", stem)))
        .depend(&lua_gen)
        .recipe(move |t, _| tools::compile_lua(&src, &t.output(), MAIN_SYMBOL))
        .finish()
    };

    Ok(vec![c_obj, lua_obj])
  }
}

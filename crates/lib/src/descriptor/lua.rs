//! Descriptor evaluation.
//!
//! `package.lua` is evaluated with a plain Lua runtime; the chunk must
//! return a table, which is then converted field by field. There is no
//! sandboxing: descriptors are trusted the same way build scripts are.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mlua::{Lua, Table, Value};

use crate::consts::DESCRIPTOR_FILE;
use crate::descriptor::{Descriptor, NativeSpec};
use crate::error::{Error, Result};

/// Loads and finalizes the descriptor at `path`.
pub fn load_descriptor(path: &Path, core_package: &str) -> Result<Descriptor> {
  if !path.is_file() {
    return Err(Error::DescriptorNotFound(path.display().to_string()));
  }
  let source = std::fs::read_to_string(path)?;
  descriptor_from_source(&source, path, core_package)
}

/// Evaluates descriptor source. `path` is only used for diagnostics.
pub fn descriptor_from_source(source: &str, path: &Path, core_package: &str) -> Result<Descriptor> {
  let lua = Lua::new();
  let value: Value = lua.load(source).eval()?;
  let table = match value {
    Value::Table(t) => t,
    _ => return Err(Error::NotATable(path.to_path_buf())),
  };
  parse_table(&table, path, core_package)
}

/// Walks from `start` upward to the nearest `package.lua`.
///
/// This is how the "current" package is located when no package is named
/// on the command line. Reaching the filesystem root is fatal.
pub fn locate_descriptor(start: &Path) -> Result<PathBuf> {
  let mut dir = start.to_path_buf();
  loop {
    let candidate = dir.join(DESCRIPTOR_FILE);
    if candidate.is_file() {
      return Ok(candidate);
    }
    match dir.parent() {
      Some(parent) => dir = parent.to_path_buf(),
      None => {
        return Err(Error::DescriptorNotFound(format!(
          "no {} found above {}",
          DESCRIPTOR_FILE,
          start.display()
        )));
      }
    }
  }
}

fn parse_table(table: &Table, path: &Path, core_package: &str) -> Result<Descriptor> {
  let package: Option<String> = table.get("package")?;
  let package = package.ok_or_else(|| Error::MissingField {
    path: path.to_path_buf(),
    field: "package".to_string(),
  })?;

  let libname: Option<String> = table.get("libname")?;
  let install: Option<Vec<String>> = table.get("install")?;
  let install_declared = install.is_some();

  let descriptor = Descriptor {
    package,
    libname: libname.unwrap_or_default(),
    imports: opt_seq(table, "imports")?,
    native: parse_native(table)?,
    exports: opt_seq(table, "exports")?,
    depends: parse_depends(table)?,
    mounts: parse_mounts(table)?,
    apps: opt_seq(table, "apps")?,
    install: install.unwrap_or_default(),
    ldflags: opt_seq(table, "ldflags")?,
  };

  Ok(descriptor.finalize(core_package, install_declared))
}

fn opt_seq(table: &Table, key: &str) -> Result<Vec<String>> {
  let value: Option<Vec<String>> = table.get(key)?;
  Ok(value.unwrap_or_default())
}

fn parse_native(table: &Table) -> Result<BTreeMap<String, NativeSpec>> {
  let mut native = BTreeMap::new();
  let value: Option<Table> = table.get("native")?;
  if let Some(entries) = value {
    for pair in entries.pairs::<String, Table>() {
      let (name, spec) = pair?;
      native.insert(
        name,
        NativeSpec {
          sources: opt_seq(&spec, "sources")?,
          cflags: opt_seq(&spec, "cflags")?,
          ldflags: opt_seq(&spec, "ldflags")?,
        },
      );
    }
  }
  Ok(native)
}

fn parse_depends(table: &Table) -> Result<BTreeMap<String, Vec<String>>> {
  let mut depends = BTreeMap::new();
  let value: Option<Table> = table.get("depends")?;
  if let Some(entries) = value {
    for pair in entries.pairs::<String, Vec<String>>() {
      let (module, refs) = pair?;
      depends.insert(module, refs);
    }
  }
  Ok(depends)
}

fn parse_mounts(table: &Table) -> Result<BTreeMap<String, String>> {
  let mut mounts = BTreeMap::new();
  let value: Option<Table> = table.get("mounts")?;
  if let Some(entries) = value {
    for pair in entries.pairs::<String, String>() {
      let (vpath, src) = pair?;
      mounts.insert(vpath, src);
    }
  }
  Ok(mounts)
}

#[cfg(test)]
mod tests {
  use super::*;

  const CORE: &str = "github.com/cellux/zz";

  fn parse(source: &str) -> Result<Descriptor> {
    descriptor_from_source(source, Path::new("package.lua"), CORE)
  }

  #[test]
  fn full_descriptor_parses() {
    let d = parse(
      r#"
      return {
         package = "github.com/user/app",
         libname = "application",
         imports = { "github.com/user/lib" },
         exports = { "util", "main" },
         native = {
            z = {
               sources = { "native/z/adler32.c" },
               cflags = { "-iquote", "native/z" },
               ldflags = { "-lz" },
            },
         },
         depends = { codec = { "libz.a" } },
         mounts = { ["/assets"] = "assets" },
         apps = { "main" },
         install = { "main" },
         ldflags = { "-lrt" },
      }
    "#,
    )
    .unwrap();

    assert_eq!(d.package, "github.com/user/app");
    assert_eq!(d.libname, "application");
    assert_eq!(d.imports, vec!["github.com/user/lib", CORE]);
    assert_eq!(d.exports, vec!["util", "main", "package"]);
    let z = d.native.get("z").unwrap();
    assert_eq!(z.sources, vec!["native/z/adler32.c"]);
    assert_eq!(z.cflags, vec!["-iquote", "native/z"]);
    assert_eq!(z.ldflags, vec!["-lz"]);
    assert_eq!(d.depends.get("codec").unwrap(), &vec!["libz.a".to_string()]);
    assert_eq!(d.mounts.get("/assets").unwrap(), "assets");
    assert_eq!(d.apps, vec!["main"]);
    assert_eq!(d.install, vec!["main"]);
    assert_eq!(d.ldflags, vec!["-lrt"]);
  }

  #[test]
  fn minimal_descriptor_gets_defaults() {
    let d = parse(r#"return { package = "github.com/user/proj" }"#).unwrap();
    assert_eq!(d.libname, "proj");
    assert_eq!(d.imports, vec![CORE]);
    assert_eq!(d.exports, vec!["package"]);
    assert!(d.apps.is_empty());
    assert!(d.install.is_empty());
  }

  #[test]
  fn missing_package_field_is_fatal() {
    let err = parse(r#"return { exports = { "util" } }"#).unwrap_err();
    assert!(matches!(err, Error::MissingField { ref field, .. } if field == "package"));
  }

  #[test]
  fn non_table_chunk_is_fatal() {
    let err = parse(r#"return 42"#).unwrap_err();
    assert!(matches!(err, Error::NotATable(_)));
  }

  #[test]
  fn invalid_lua_is_fatal() {
    assert!(matches!(parse("this is not lua {{{"), Err(Error::Lua(_))));
  }

  #[test]
  fn descriptor_may_use_lua_expressions() {
    let d = parse(
      r#"
      local exports = {}
      for _, m in ipairs({ "a", "b" }) do
         exports[#exports + 1] = m
      end
      return { package = "host/pkg", exports = exports }
    "#,
    )
    .unwrap();
    assert_eq!(d.exports, vec!["a", "b", "package"]);
  }

  #[test]
  fn locate_walks_up_to_descriptor() {
    let temp = tempfile::TempDir::new().unwrap();
    let pkg = temp.path().join("src/host/pkg");
    let nested = pkg.join("deep/subdir");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(pkg.join(DESCRIPTOR_FILE), "return { package = 'host/pkg' }").unwrap();

    let found = locate_descriptor(&nested).unwrap();
    assert_eq!(found, pkg.join(DESCRIPTOR_FILE));
  }

  #[test]
  fn locate_fails_at_filesystem_root() {
    let temp = tempfile::TempDir::new().unwrap();
    assert!(matches!(
      locate_descriptor(temp.path()),
      Err(Error::DescriptorNotFound(_))
    ));
  }

  #[test]
  fn load_missing_file_is_fatal() {
    let err = load_descriptor(Path::new("/nonexistent/package.lua"), CORE).unwrap_err();
    assert!(matches!(err, Error::DescriptorNotFound(_)));
  }
}

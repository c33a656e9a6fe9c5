//! Package descriptors.
//!
//! A package is declared by a `package.lua` file in its source root. The
//! chunk is evaluated as data and must return a table:
//!
//! ```lua
//! return {
//!    package = "github.com/user/proj",
//!    imports = { "github.com/user/lib" },
//!    exports = { "util", "main" },
//!    native = {
//!       z = {
//!          sources = { "native/z/adler32.c", "native/z/inflate.c" },
//!          cflags = { "-iquote", "native/z" },
//!          ldflags = {},
//!       },
//!    },
//!    depends = { codec = { "libz.a" } },
//!    mounts = { ["/assets"] = "assets" },
//!    apps = { "main" },
//!    ldflags = { "-lrt" },
//! }
//! ```

mod lua;

use std::collections::BTreeMap;

pub use lua::{descriptor_from_source, load_descriptor, locate_descriptor};

use crate::consts::PACKAGE_MODULE;

/// Recipe for a native prerequisite library `lib<name>.a`: C sources
/// relative to the package source root, plus the compile and link flags the
/// library carries. Dependent targets inherit the flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeSpec {
  pub sources: Vec<String>,
  pub cflags: Vec<String>,
  pub ldflags: Vec<String>,
}

/// Parsed representation of a package's `package.lua`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
  /// Package identifier (repository path). Required.
  pub package: String,
  /// Short name of the package archive `lib<libname>.a`.
  pub libname: String,
  /// Imported package identifiers, in declared order. The core package is
  /// implicitly appended.
  pub imports: Vec<String>,
  /// Native prerequisite libraries by short name.
  pub native: BTreeMap<String, NativeSpec>,
  /// Exported module names, in declared order. `"package"` is implicit.
  pub exports: Vec<String>,
  /// Compile-time target references of each module's C half.
  pub depends: BTreeMap<String, Vec<String>>,
  /// Virtual-filesystem mount table, emitted verbatim into the bootstrap.
  pub mounts: BTreeMap<String, String>,
  /// Application names.
  pub apps: Vec<String>,
  /// Applications symlinked into the global bin directory by `install`.
  pub install: Vec<String>,
  /// Raw link flags contributed to any executable that imports this
  /// package.
  pub ldflags: Vec<String>,
}

impl Descriptor {
  /// Applies the descriptor defaults:
  /// - `libname` falls back to the last path component of `package`
  /// - the core package is appended to `imports` unless this *is* the core
  ///   package or it is already listed
  /// - `"package"` is appended to `exports` if absent
  /// - `install` (when not declared) defaults to `apps`
  pub(crate) fn finalize(mut self, core_package: &str, install_declared: bool) -> Self {
    if self.libname.is_empty() {
      self.libname = self.package.rsplit('/').next().unwrap_or(&self.package).to_string();
    }
    if self.package != core_package && !self.imports.iter().any(|i| i == core_package) {
      self.imports.push(core_package.to_string());
    }
    if !self.exports.iter().any(|e| e == PACKAGE_MODULE) {
      self.exports.push(PACKAGE_MODULE.to_string());
    }
    if !install_declared {
      self.install = self.apps.clone();
    }
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bare(package: &str) -> Descriptor {
    Descriptor {
      package: package.to_string(),
      libname: String::new(),
      imports: vec![],
      native: BTreeMap::new(),
      exports: vec![],
      depends: BTreeMap::new(),
      mounts: BTreeMap::new(),
      apps: vec![],
      install: vec![],
      ldflags: vec![],
    }
  }

  #[test]
  fn libname_defaults_to_last_path_component() {
    let d = bare("github.com/user/proj").finalize("core/zz", false);
    assert_eq!(d.libname, "proj");
  }

  #[test]
  fn core_import_is_appended() {
    let d = bare("github.com/user/proj").finalize("core/zz", false);
    assert_eq!(d.imports, vec!["core/zz"]);
  }

  #[test]
  fn core_import_not_duplicated() {
    let mut d = bare("github.com/user/proj");
    d.imports = vec!["core/zz".to_string(), "other/pkg".to_string()];
    let d = d.finalize("core/zz", false);
    assert_eq!(d.imports, vec!["core/zz", "other/pkg"]);
  }

  #[test]
  fn core_package_does_not_import_itself() {
    let d = bare("core/zz").finalize("core/zz", false);
    assert!(d.imports.is_empty());
  }

  #[test]
  fn package_module_is_implicitly_exported() {
    let mut d = bare("host/pkg");
    d.exports = vec!["util".to_string()];
    let d = d.finalize("core/zz", false);
    assert_eq!(d.exports, vec!["util", "package"]);
  }

  #[test]
  fn install_defaults_to_apps() {
    let mut d = bare("host/pkg");
    d.apps = vec!["main".to_string(), "helper".to_string()];
    let d = d.finalize("core/zz", false);
    assert_eq!(d.install, vec!["main", "helper"]);
  }

  #[test]
  fn declared_empty_install_is_kept() {
    let mut d = bare("host/pkg");
    d.apps = vec!["main".to_string()];
    let d = d.finalize("core/zz", true);
    assert!(d.install.is_empty());
  }
}

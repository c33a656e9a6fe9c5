//! Workspace layout.
//!
//! All build state lives under a single workspace root selected by the
//! `WORKSPACE` environment variable (default `$HOME/zz`). For a package
//! identified by `P` the derived roots are:
//!
//! ```text
//! src/<P>/          package sources (must contain package.lua)
//! src/<P>/native/   native prerequisite staging
//! obj/<P>/          compiled objects (.o, .lo)
//! lib/<P>/          lib<libname>.a and per-native lib<L>.a
//! tmp/<P>/          generated bootstrap sources
//! bin/<P>/          per-package executables
//! bin/              global executables (symlinks into bin/<P>/)
//! ```

use std::path::{Path, PathBuf};

use crate::consts::{DEFAULT_WORKSPACE_DIR, DESCRIPTOR_FILE, WORKSPACE_ENV};

/// Returns the user's home directory.
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  let userprofile = std::env::var("USERPROFILE").expect("USERPROFILE not set");
  PathBuf::from(userprofile)
}

/// Returns the user's home directory.
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  let home = std::env::var("HOME").expect("HOME not set");
  PathBuf::from(home)
}

/// The workspace root and the path arithmetic derived from it.
#[derive(Debug, Clone)]
pub struct Workspace {
  root: PathBuf,
}

impl Workspace {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Workspace selected by `WORKSPACE`, defaulting to `$HOME/zz`.
  pub fn from_env() -> Self {
    if let Ok(root) = std::env::var(WORKSPACE_ENV) {
      return Self::new(root);
    }
    Self::new(home_dir().join(DEFAULT_WORKSPACE_DIR))
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Directory for global executables (symlinks into per-package bindirs).
  pub fn global_bindir(&self) -> PathBuf {
    self.root.join("bin")
  }

  /// Derived directory roots for a package.
  pub fn package_paths(&self, package: &str) -> PackagePaths {
    let srcdir = self.root.join("src").join(package);
    PackagePaths {
      natdir: srcdir.join("native"),
      srcdir,
      objdir: self.root.join("obj").join(package),
      libdir: self.root.join("lib").join(package),
      bindir: self.root.join("bin").join(package),
      tmpdir: self.root.join("tmp").join(package),
    }
  }
}

/// Canonical per-package directories.
#[derive(Debug, Clone)]
pub struct PackagePaths {
  pub srcdir: PathBuf,
  pub natdir: PathBuf,
  pub objdir: PathBuf,
  pub libdir: PathBuf,
  pub bindir: PathBuf,
  pub tmpdir: PathBuf,
}

impl PackagePaths {
  pub fn descriptor_path(&self) -> PathBuf {
    self.srcdir.join(DESCRIPTOR_FILE)
  }

  /// Replace the source root, keeping the derived roots. Used when the
  /// current package is discovered by walking up from the working
  /// directory.
  pub fn with_srcdir(mut self, srcdir: impl Into<PathBuf>) -> Self {
    self.srcdir = srcdir.into();
    self.natdir = self.srcdir.join("native");
    self
  }
}

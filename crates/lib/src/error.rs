//! Error types for the build engine.
//!
//! Every failure is fatal: the driver prints one diagnostic and exits with
//! status 1. Nothing is retried or recovered locally.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Lua error while evaluating a package descriptor.
  #[error("lua error: {0}")]
  Lua(#[from] mlua::Error),

  /// I/O error.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// No `package.lua` was found for the requested package.
  #[error("package descriptor not found: {0}")]
  DescriptorNotFound(String),

  /// The descriptor is missing a required field.
  #[error("descriptor {}: missing required field '{field}'", .path.display())]
  MissingField { path: PathBuf, field: String },

  /// The descriptor chunk did not evaluate to a table.
  #[error("descriptor {}: chunk must return a table", .0.display())]
  NotATable(PathBuf),

  /// A required source file does not exist.
  #[error("missing source file: {}", .0.display())]
  MissingSource(PathBuf),

  /// A target reference could not be resolved.
  #[error("unresolved target reference '{name}' in package {package}")]
  UnresolvedTarget { name: String, package: String },

  /// A named target was registered twice. Signals a factory bug.
  #[error("target '{name}' registered twice in package {package}")]
  DuplicateTarget { name: String, package: String },

  /// The import graph contains a cycle.
  #[error("import cycle through package {0}")]
  ImportCycle(String),

  /// An external tool returned a non-zero exit code.
  #[error("{tool} failed with exit code {code:?}")]
  ToolFailed { tool: String, code: Option<i32> },

  /// A script passed to `run` lies outside the package source tree.
  #[error("{} is outside the package source tree {}", .path.display(), .srcdir.display())]
  OutsideSourceTree { path: PathBuf, srcdir: PathBuf },

  /// A package spec string could not be parsed.
  #[error("invalid package spec: {0}")]
  InvalidPackageSpec(String),

  /// A package source directory already exists where `init` or `checkout`
  /// would create one.
  #[error("package directory already exists: {}", .0.display())]
  PackageExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;

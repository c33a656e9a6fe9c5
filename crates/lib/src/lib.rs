//! zz-lib: build engine for zz
//!
//! This crate implements the package manager and build orchestrator behind
//! the `zz` command:
//! - `Descriptor`: the parsed representation of a package's `package.lua`
//! - `Target`: a node in the incremental build graph with mtime-based
//!   rebuild decisions
//! - `BuildContext`: per-package state owning the named-target registry and
//!   the memoized target groups (natives, exported modules, library, link
//!   set, apps)
//! - `Engine`: the process-wide value holding the workspace and the context
//!   cache
//! - driver actions: build, install, run, test, clean, distclean
//!
//! Descriptors are evaluated with the `mlua` runtime; external tools (the C
//! compiler, `ar`, `luajit`, `git`) are spawned synchronously.

pub mod apps;
pub mod bootstrap;
pub mod consts;
pub mod context;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod link;
pub mod mangle;
pub mod modules;
pub mod native;
pub mod remote;
pub mod resolver;
pub mod target;
pub mod tools;
pub mod vcs;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testutil;

pub use context::{BuildContext, Engine};
pub use descriptor::Descriptor;
pub use error::{Error, Result};
pub use target::Target;
pub use workspace::Workspace;

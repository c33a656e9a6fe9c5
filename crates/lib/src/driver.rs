//! Top-level driver actions.
//!
//! These are the operations behind the CLI verbs: recursive builds over
//! the import graph, installation of app symlinks, the script runner, the
//! test runner, and the cleanup actions. Builds run with the working
//! directory scoped to the package source root so relative paths in
//! descriptors stay well-defined.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::info;
use walkdir::WalkDir;

use crate::bootstrap::BootstrapKind;
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::tools::{self, CwdGuard};

/// Builds the package: native prerequisites, the package archive and,
/// when `apps` is set, every application executable. With `recursive`,
/// imports are driven first.
pub fn build(ctx: &Rc<BuildContext>, recursive: bool, apps: bool) -> Result<()> {
  ctx.engine().verify_imports(ctx)?;
  let mut seen = HashSet::new();
  build_inner(ctx, recursive, apps, &mut seen)
}

fn build_inner(ctx: &Rc<BuildContext>, recursive: bool, apps: bool, seen: &mut HashSet<String>) -> Result<()> {
  if !seen.insert(ctx.package().to_string()) {
    return Ok(());
  }

  if recursive {
    for ictx in ctx.import_contexts()? {
      build_inner(&ictx, recursive, false, seen)?;
    }
  }

  info!(package = %ctx.package(), "building");
  let _cwd = CwdGuard::enter(&ctx.paths().srcdir)?;

  for target in ctx.native_targets()? {
    target.make(false)?;
  }
  ctx.library_target()?.make(false)?;
  if apps {
    for target in ctx.app_targets()? {
      target.make(false)?;
    }
  }
  Ok(())
}

/// Recursive build with apps, then a symlink in the global bin directory
/// for every installable application.
pub fn install(ctx: &Rc<BuildContext>) -> Result<()> {
  build(ctx, true, true)?;

  let engine = ctx.engine();
  let global = engine.workspace().global_bindir();
  fs::create_dir_all(&global)?;

  for app in &ctx.descriptor().install {
    let target = ctx.paths().bindir.join(app);
    let link = global.join(app);
    replace_symlink(&target, &link)?;
    info!(app = %app, link = %link.display(), "installed");
  }
  Ok(())
}

/// Builds a `_run` executable and replaces the process with it, passing
/// the script path and the remaining arguments. The script must live
/// under the package source tree.
pub fn run(ctx: &Rc<BuildContext>, script: &Path, args: &[String]) -> Result<()> {
  let script = fs::canonicalize(script)?;
  let srcdir = fs::canonicalize(&ctx.paths().srcdir)?;
  if !script.starts_with(&srcdir) {
    return Err(Error::OutsideSourceTree { path: script, srcdir });
  }

  build(ctx, true, false)?;
  let runner = ctx.runner_target(&BootstrapKind::Run)?;
  runner.make(false)?;

  let mut runtime_args = vec![script.display().to_string()];
  runtime_args.extend(args.iter().cloned());
  tools::exec_replace(&runner.output(), &runtime_args)
}

/// Builds a `_test` executable and replaces the process with it, passing
/// the resolved test files. With no names, every `*_test.lua` under the
/// source tree runs.
pub fn test(ctx: &Rc<BuildContext>, names: &[String]) -> Result<()> {
  build(ctx, true, false)?;
  let files = resolve_test_files(ctx, names)?;
  let runner = ctx.runner_target(&BootstrapKind::Test)?;
  runner.make(false)?;

  let args: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
  tools::exec_replace(&runner.output(), &args)
}

/// Maps test names to files under the source tree. Bare names get a
/// `_test` suffix; a missing file is fatal. Without names, the source tree
/// is scanned for `*_test.lua`.
pub fn resolve_test_files(ctx: &BuildContext, names: &[String]) -> Result<Vec<PathBuf>> {
  let srcdir = &ctx.paths().srcdir;

  if names.is_empty() {
    let mut files = Vec::new();
    for entry in WalkDir::new(srcdir).sort_by_file_name() {
      let entry = entry.map_err(std::io::Error::from)?;
      if !entry.file_type().is_file() {
        continue;
      }
      let name = entry.file_name().to_string_lossy();
      if name.ends_with("_test.lua") {
        files.push(entry.into_path());
      }
    }
    return Ok(files);
  }

  names
    .iter()
    .map(|name| {
      let name = if name.ends_with("_test") {
        name.clone()
      } else {
        format!("{}_test", name)
      };
      let path = srcdir.join(format!("{}.lua", name));
      if path.is_file() {
        Ok(path)
      } else {
        Err(Error::MissingSource(path))
      }
    })
    .collect()
}

/// Removes the derived object, library and tmp trees. Missing trees are
/// fine: clean on a never-built package is a no-op.
pub fn clean(ctx: &Rc<BuildContext>) -> Result<()> {
  let paths = ctx.paths();
  for dir in [&paths.objdir, &paths.libdir, &paths.tmpdir] {
    remove_tree(dir)?;
  }
  info!(package = %ctx.package(), "cleaned");
  Ok(())
}

/// `clean` plus the bin tree, the native staging directory, and any global
/// bin symlinks that point into this package's bindir.
pub fn distclean(ctx: &Rc<BuildContext>) -> Result<()> {
  clean(ctx)?;
  remove_tree(&ctx.paths().bindir)?;
  remove_tree(&ctx.paths().natdir)?;

  let global = ctx.engine().workspace().global_bindir();
  if global.is_dir() {
    for entry in fs::read_dir(&global)? {
      let path = entry?.path();
      if let Ok(dest) = fs::read_link(&path) {
        if dest.starts_with(&ctx.paths().bindir) {
          fs::remove_file(&path)?;
        }
      }
    }
  }
  Ok(())
}

fn remove_tree(dir: &Path) -> std::io::Result<()> {
  match fs::remove_dir_all(dir) {
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
    other => other,
  }
}

#[cfg(unix)]
fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
  if link.symlink_metadata().is_ok() {
    fs::remove_file(link)?;
  }
  std::os::unix::fs::symlink(target, link)?;
  Ok(())
}

#[cfg(windows)]
fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
  if link.symlink_metadata().is_ok() {
    fs::remove_file(link)?;
  }
  std::os::windows::fs::symlink_file(target, link)?;
  Ok(())
}

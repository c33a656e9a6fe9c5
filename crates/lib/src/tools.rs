//! External tool invocation.
//!
//! Every build step shells out to the host toolchain: the C compiler,
//! `ar`, the `luajit` bytecode compiler and the linker driver. Tools are
//! spawned synchronously with inherited stdio; a non-zero exit code aborts
//! the build. Tool names can be overridden through `ZZ_CC`, `ZZ_AR` and
//! `ZZ_LUAJIT`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::error::{Error, Result};

pub(crate) fn env_tool(var: &str, default: &str) -> String {
  std::env::var(var).unwrap_or_else(|_| default.to_string())
}

pub fn cc() -> String {
  env_tool("ZZ_CC", "cc")
}

pub fn ar() -> String {
  env_tool("ZZ_AR", "ar")
}

pub fn luajit() -> String {
  env_tool("ZZ_LUAJIT", "luajit")
}

/// Runs a tool and fails on a non-zero exit code.
pub fn run_tool(program: &str, args: &[String]) -> Result<()> {
  debug!(tool = %program, ?args, "spawning");
  let status = Command::new(program).args(args).status()?;
  if !status.success() {
    return Err(Error::ToolFailed {
      tool: program.to_string(),
      code: status.code(),
    });
  }
  Ok(())
}

/// Compiles a Lua source to a bytecode object registered under `symbol`.
pub fn compile_lua(src: &Path, out: &Path, symbol: &str) -> Result<()> {
  let args = vec![
    "-b".to_string(),
    "-t".to_string(),
    "o".to_string(),
    "-n".to_string(),
    symbol.to_string(),
    src.display().to_string(),
    out.display().to_string(),
  ];
  run_tool(&luajit(), &args)
}

/// Compiles a C source to an object file.
pub fn compile_c(src: &Path, out: &Path, cflags: &[String]) -> Result<()> {
  let mut args = cflags.to_vec();
  args.push("-c".to_string());
  args.push("-o".to_string());
  args.push(out.display().to_string());
  args.push(src.display().to_string());
  run_tool(&cc(), &args)
}

/// Replaces or appends `members` in `archive`. With the `r` modifier `ar`
/// keeps untouched members, so passing only the changed objects gives
/// incremental archive updates.
pub fn archive(archive: &Path, members: &[PathBuf]) -> Result<()> {
  let mut args = vec!["rsc".to_string(), archive.display().to_string()];
  args.extend(members.iter().map(|m| m.display().to_string()));
  run_tool(&ar(), &args)
}

/// Links an executable. The whole payload of every static archive is
/// forced into the image: the runtime resolves module objects lazily by
/// name, so the linker must not drop "unused" members.
pub fn link_executable(out: &Path, objects: &[PathBuf], archives: &[PathBuf], ldflags: &[String]) -> Result<()> {
  let mut args = vec!["-o".to_string(), out.display().to_string()];
  args.extend(objects.iter().map(|o| o.display().to_string()));
  args.push(export_dynamic_flag().to_string());
  args.extend(whole_archive_args(archives));
  args.extend(ldflags.iter().cloned());
  args.extend(["-lm", "-ldl", "-lpthread"].map(String::from));
  run_tool(&cc(), &args)
}

#[cfg(target_os = "macos")]
fn export_dynamic_flag() -> &'static str {
  "-Wl,-export_dynamic"
}

#[cfg(not(target_os = "macos"))]
fn export_dynamic_flag() -> &'static str {
  "-rdynamic"
}

#[cfg(target_os = "macos")]
pub fn whole_archive_args(archives: &[PathBuf]) -> Vec<String> {
  archives
    .iter()
    .map(|a| format!("-Wl,-force_load,{}", a.display()))
    .collect()
}

#[cfg(not(target_os = "macos"))]
pub fn whole_archive_args(archives: &[PathBuf]) -> Vec<String> {
  if archives.is_empty() {
    return Vec::new();
  }
  let mut args = vec!["-Wl,--whole-archive".to_string()];
  args.extend(archives.iter().map(|a| a.display().to_string()));
  args.push("-Wl,--no-whole-archive".to_string());
  args
}

/// Replaces the current process image on Unix; elsewhere runs the program
/// and surfaces its exit code.
#[cfg(unix)]
pub fn exec_replace(program: &Path, args: &[String]) -> Result<()> {
  use std::os::unix::process::CommandExt;
  let err = Command::new(program).args(args).exec();
  Err(Error::Io(err))
}

#[cfg(not(unix))]
pub fn exec_replace(program: &Path, args: &[String]) -> Result<()> {
  let status = Command::new(program).args(args).status()?;
  if !status.success() {
    return Err(Error::ToolFailed {
      tool: program.display().to_string(),
      code: status.code(),
    });
  }
  Ok(())
}

/// Scoped working-directory change; the previous directory is restored on
/// drop, on success and on error propagation alike.
pub struct CwdGuard {
  prev: PathBuf,
}

impl CwdGuard {
  pub fn enter(dir: &Path) -> Result<Self> {
    let prev = std::env::current_dir()?;
    std::env::set_current_dir(dir)?;
    Ok(Self { prev })
  }
}

impl Drop for CwdGuard {
  fn drop(&mut self) {
    if let Err(err) = std::env::set_current_dir(&self.prev) {
      warn!(dir = %self.prev.display(), %err, "failed to restore working directory");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn tool_names_honor_env_overrides() {
    temp_env::with_vars([("ZZ_CC", Some("clang")), ("ZZ_AR", None::<&str>)], || {
      assert_eq!(cc(), "clang");
      assert_eq!(ar(), "ar");
    });
  }

  #[test]
  #[cfg(not(target_os = "macos"))]
  fn whole_archive_brackets_every_archive() {
    let libs = vec![PathBuf::from("/l/liba.a"), PathBuf::from("/l/libb.a")];
    let args = whole_archive_args(&libs);
    assert_eq!(
      args,
      vec!["-Wl,--whole-archive", "/l/liba.a", "/l/libb.a", "-Wl,--no-whole-archive"]
    );
  }

  #[test]
  #[cfg(not(target_os = "macos"))]
  fn whole_archive_empty_is_empty() {
    assert!(whole_archive_args(&[]).is_empty());
  }

  #[test]
  #[serial]
  fn cwd_guard_restores_on_drop() {
    let temp = tempfile::TempDir::new().unwrap();
    let before = std::env::current_dir().unwrap();
    {
      let _guard = CwdGuard::enter(temp.path()).unwrap();
      assert_eq!(
        std::env::current_dir().unwrap().canonicalize().unwrap(),
        temp.path().canonicalize().unwrap()
      );
    }
    assert_eq!(std::env::current_dir().unwrap(), before);
  }

  #[test]
  fn failed_tool_reports_exit_code() {
    let err = run_tool("false", &[]).unwrap_err();
    match err {
      Error::ToolFailed { tool, code } => {
        assert_eq!(tool, "false");
        assert_eq!(code, Some(1));
      }
      other => panic!("unexpected error: {}", other),
    }
  }
}

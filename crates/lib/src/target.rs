//! Build-graph nodes.
//!
//! A `Target` couples an optional output path with an ordered list of
//! dependencies and an optional build recipe. `make` walks the graph in
//! post-order and reruns a recipe whenever the output is missing or older
//! than the newest dependency. Dependencies are either target nodes or
//! string references resolved against the owning build context at make
//! time.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::time::SystemTime;

use tracing::debug;

use crate::context::BuildContext;
use crate::error::Result;

/// A dependency edge: a concrete node, or a name resolved at make time.
pub enum Dep {
  Node(Rc<Target>),
  Ref(String),
}

/// Build recipe: receives the target and the dependencies that are newer
/// than the target's output, and must produce the output path.
pub type BuildFn = Box<dyn Fn(&Target, &[Rc<Target>]) -> Result<()>>;

pub struct Target {
  ctx: Weak<BuildContext>,
  dirname: Option<PathBuf>,
  basename: Option<String>,
  depends: Vec<Dep>,
  build: Option<BuildFn>,
  cflags: Vec<String>,
  ldflags: Vec<String>,
  always: bool,
}

impl std::fmt::Debug for Target {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Target")
      .field("dirname", &self.dirname)
      .field("basename", &self.basename)
      .field("cflags", &self.cflags)
      .field("ldflags", &self.ldflags)
      .field("always", &self.always)
      .finish_non_exhaustive()
  }
}

impl Target {
  pub fn builder(ctx: &Rc<BuildContext>) -> TargetBuilder {
    TargetBuilder {
      ctx: Rc::downgrade(ctx),
      dirname: None,
      basename: None,
      depends: Vec::new(),
      build: None,
      cflags: Vec::new(),
      ldflags: Vec::new(),
      always: false,
    }
  }

  /// A source-only input: it has a path but no recipe, so `make` never
  /// produces it. Its mtime still drives rebuild decisions of dependents.
  pub fn file(ctx: &Rc<BuildContext>, path: &Path) -> Rc<Target> {
    Target::builder(ctx).output(path).finish()
  }

  /// The owning build context. Contexts are cached by the engine for the
  /// whole invocation, so they strictly outlive their targets.
  pub fn context(&self) -> Rc<BuildContext> {
    self.ctx.upgrade().expect("build context outlives its targets")
  }

  pub fn path(&self) -> Option<PathBuf> {
    match (&self.dirname, &self.basename) {
      (Some(dir), Some(base)) => Some(dir.join(base)),
      _ => None,
    }
  }

  /// The output path of a target known to have one.
  pub fn output(&self) -> PathBuf {
    self.path().expect("target has no output path")
  }

  pub fn cflags(&self) -> &[String] {
    &self.cflags
  }

  pub fn ldflags(&self) -> &[String] {
    &self.ldflags
  }

  /// Modification time of the output, or None when the target has no path
  /// or the file does not exist yet. None sorts below every real mtime.
  pub fn mtime(&self) -> Option<SystemTime> {
    let path = self.path()?;
    fs::metadata(path).ok()?.modified().ok()
  }

  /// Dependencies with references resolved against the owning context.
  pub fn resolved_depends(&self) -> Result<Vec<Rc<Target>>> {
    let mut out = Vec::with_capacity(self.depends.len());
    for dep in &self.depends {
      match dep {
        Dep::Node(t) => out.push(t.clone()),
        Dep::Ref(name) => out.push(self.context().resolve(name)?),
      }
    }
    Ok(out)
  }

  /// Post-order walk: make every dependency, then rebuild this target if
  /// its output is missing, older than the newest dependency, forced, or
  /// flagged always. After a successful build the output is touched so
  /// clock-skewed recipes cannot leave it stale.
  pub fn make(&self, force: bool) -> Result<()> {
    let own = self.mtime();
    let mut newest: Option<SystemTime> = None;
    let mut changed: Vec<Rc<Target>> = Vec::new();

    for dep in self.resolved_depends()? {
      dep.make(force)?;
      if let Some(dep_mtime) = dep.mtime() {
        if own.map_or(true, |m| dep_mtime > m) {
          changed.push(dep.clone());
        }
        if newest.map_or(true, |n| dep_mtime > n) {
          newest = Some(dep_mtime);
        }
      }
    }

    let stale = match own {
      None => true,
      Some(m) => newest.map_or(false, |n| m < n),
    };

    if stale || force || self.always {
      if let Some(build) = &self.build {
        if let Some(dir) = &self.dirname {
          fs::create_dir_all(dir)?;
        }
        if let Some(path) = self.path() {
          debug!(path = %path.display(), changed = changed.len(), "rebuilding");
        }
        build(self, &changed)?;
        if let Some(path) = self.path() {
          touch(&path)?;
        }
      }
    }

    Ok(())
  }

  /// Rebuilds this target and everything beneath it unconditionally.
  pub fn force_make(&self) -> Result<()> {
    self.make(true)
  }
}

pub struct TargetBuilder {
  ctx: Weak<BuildContext>,
  dirname: Option<PathBuf>,
  basename: Option<String>,
  depends: Vec<Dep>,
  build: Option<BuildFn>,
  cflags: Vec<String>,
  ldflags: Vec<String>,
  always: bool,
}

impl TargetBuilder {
  pub fn output(mut self, path: &Path) -> Self {
    self.dirname = path.parent().map(Path::to_path_buf);
    self.basename = path.file_name().map(|n| n.to_string_lossy().into_owned());
    self
  }

  pub fn depend(mut self, target: &Rc<Target>) -> Self {
    self.depends.push(Dep::Node(target.clone()));
    self
  }

  pub fn depend_all(mut self, targets: &[Rc<Target>]) -> Self {
    for t in targets {
      self.depends.push(Dep::Node(t.clone()));
    }
    self
  }

  pub fn depend_ref(mut self, name: impl Into<String>) -> Self {
    self.depends.push(Dep::Ref(name.into()));
    self
  }

  pub fn cflags(mut self, flags: Vec<String>) -> Self {
    self.cflags = flags;
    self
  }

  pub fn ldflags(mut self, flags: Vec<String>) -> Self {
    self.ldflags = flags;
    self
  }

  /// Marks the target as rebuilt on every invocation. Used by the
  /// generated bootstrap sources whose logical inputs are not file-backed.
  pub fn always(mut self) -> Self {
    self.always = true;
    self
  }

  pub fn recipe(mut self, f: impl Fn(&Target, &[Rc<Target>]) -> Result<()> + 'static) -> Self {
    self.build = Some(Box::new(f));
    self
  }

  pub fn finish(self) -> Rc<Target> {
    Rc::new(Target {
      ctx: self.ctx,
      dirname: self.dirname,
      basename: self.basename,
      depends: self.depends,
      build: self.build,
      cflags: self.cflags,
      ldflags: self.ldflags,
      always: self.always,
    })
  }
}

/// Creates the file if needed and advances its mtime to the present.
fn touch(path: &Path) -> std::io::Result<()> {
  let file = fs::OpenOptions::new().create(true).write(true).open(path)?;
  file.set_modified(SystemTime::now())
}

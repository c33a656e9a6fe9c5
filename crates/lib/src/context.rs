//! The engine and per-package build contexts.
//!
//! The `Engine` is the explicit process-wide state: the workspace, the core
//! package identifier, and the cache of build contexts. A `BuildContext`
//! owns a package's descriptor, its derived directories, the write-once
//! registry of named targets, and the memoized target groups produced by
//! the factories in `modules`, `native`, `link`, `bootstrap` and `apps`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::consts::{CORE_PACKAGE_ENV, DEFAULT_CORE_PACKAGE};
use crate::descriptor::{self, Descriptor};
use crate::error::{Error, Result};
use crate::target::Target;
use crate::workspace::{PackagePaths, Workspace};

pub struct Engine {
  workspace: Workspace,
  core_package: String,
  contexts: RefCell<HashMap<String, Rc<BuildContext>>>,
}

impl Engine {
  /// Engine with the core package taken from `ZZ_CORE_PACKAGE` (or the
  /// built-in default).
  pub fn new(workspace: Workspace) -> Rc<Self> {
    let core_package = std::env::var(CORE_PACKAGE_ENV).unwrap_or_else(|_| DEFAULT_CORE_PACKAGE.to_string());
    Self::with_core(workspace, core_package)
  }

  pub fn with_core(workspace: Workspace, core_package: impl Into<String>) -> Rc<Self> {
    Rc::new(Self {
      workspace,
      core_package: core_package.into(),
      contexts: RefCell::new(HashMap::new()),
    })
  }

  pub fn workspace(&self) -> &Workspace {
    &self.workspace
  }

  pub fn core_package(&self) -> &str {
    &self.core_package
  }

  /// The build context of `package`, creating it on first reference.
  pub fn context(self: &Rc<Self>, package: &str) -> Result<Rc<BuildContext>> {
    {
      let cache = self.contexts.borrow();
      if let Some(ctx) = cache.get(package) {
        return Ok(ctx.clone());
      }
    }

    let paths = self.workspace.package_paths(package);
    let descriptor = descriptor::load_descriptor(&paths.descriptor_path(), &self.core_package)?;
    if descriptor.package != package {
      debug!(
        requested = %package,
        declared = %descriptor.package,
        "descriptor declares a different package identifier"
      );
    }

    let ctx = BuildContext::create(self, descriptor, paths);
    self.contexts.borrow_mut().insert(package.to_string(), ctx.clone());
    Ok(ctx)
  }

  /// The context of the package containing the current directory, located
  /// by walking up to the nearest `package.lua`. The found directory
  /// becomes the source root; obj/lib/bin/tmp still derive from the
  /// workspace.
  pub fn current_context(self: &Rc<Self>) -> Result<Rc<BuildContext>> {
    let cwd = std::env::current_dir()?;
    self.context_at(&cwd)
  }

  /// Like `current_context`, starting the walk at `start`.
  pub fn context_at(self: &Rc<Self>, start: &Path) -> Result<Rc<BuildContext>> {
    let descriptor_path = descriptor::locate_descriptor(start)?;
    let descriptor = descriptor::load_descriptor(&descriptor_path, &self.core_package)?;
    let package = descriptor.package.clone();

    {
      let cache = self.contexts.borrow();
      if let Some(ctx) = cache.get(&package) {
        return Ok(ctx.clone());
      }
    }

    let srcdir = descriptor_path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from("."));
    let paths = self.workspace.package_paths(&package).with_srcdir(srcdir);
    let ctx = BuildContext::create(self, descriptor, paths);
    self.contexts.borrow_mut().insert(package, ctx.clone());
    Ok(ctx)
  }

  /// Rejects cycles in the import graph reachable from `root`. Cycles
  /// would otherwise surface as unbounded recursion in the link-set walk.
  pub fn verify_imports(self: &Rc<Self>, root: &Rc<BuildContext>) -> Result<()> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
    let mut queue: Vec<Rc<BuildContext>> = vec![root.clone()];

    while let Some(ctx) = queue.pop() {
      let from = node_index(&mut graph, &mut nodes, ctx.package());
      for import in &ctx.descriptor().imports {
        let ictx = self.context(import)?;
        let known = nodes.contains_key(ictx.package());
        let to = node_index(&mut graph, &mut nodes, ictx.package());
        graph.add_edge(from, to, ());
        if !known {
          queue.push(ictx);
        }
      }
    }

    toposort(&graph, None).map_err(|cycle| Error::ImportCycle(graph[cycle.node_id()].clone()))?;
    Ok(())
  }
}

fn node_index(graph: &mut DiGraph<String, ()>, nodes: &mut HashMap<String, NodeIndex>, package: &str) -> NodeIndex {
  if let Some(&idx) = nodes.get(package) {
    return idx;
  }
  let idx = graph.add_node(package.to_string());
  nodes.insert(package.to_string(), idx);
  idx
}

pub struct BuildContext {
  engine: Weak<Engine>,
  descriptor: Descriptor,
  paths: PackagePaths,
  registry: RefCell<HashMap<String, Rc<Target>>>,
  pub(crate) modules: RefCell<HashMap<String, Vec<Rc<Target>>>>,
  pub(crate) natives: RefCell<Option<Vec<Rc<Target>>>>,
  pub(crate) exported: RefCell<Option<Vec<Rc<Target>>>>,
  pub(crate) library: RefCell<Option<Rc<Target>>>,
  pub(crate) link_set: RefCell<Option<Vec<Rc<Target>>>>,
  pub(crate) apps: RefCell<Option<Vec<Rc<Target>>>>,
}

impl BuildContext {
  fn create(engine: &Rc<Engine>, descriptor: Descriptor, paths: PackagePaths) -> Rc<Self> {
    Rc::new(Self {
      engine: Rc::downgrade(engine),
      descriptor,
      paths,
      registry: RefCell::new(HashMap::new()),
      modules: RefCell::new(HashMap::new()),
      natives: RefCell::new(None),
      exported: RefCell::new(None),
      library: RefCell::new(None),
      link_set: RefCell::new(None),
      apps: RefCell::new(None),
    })
  }

  /// The owning engine. The engine outlives every context it caches.
  pub fn engine(&self) -> Rc<Engine> {
    self.engine.upgrade().expect("engine outlives build contexts")
  }

  pub fn package(&self) -> &str {
    &self.descriptor.package
  }

  pub fn descriptor(&self) -> &Descriptor {
    &self.descriptor
  }

  pub fn paths(&self) -> &PackagePaths {
    &self.paths
  }

  /// Registers a named target. Names are write-once: a second registration
  /// signals a factory bug and is fatal.
  pub fn register(&self, name: &str, target: Rc<Target>) -> Result<()> {
    let mut registry = self.registry.borrow_mut();
    if registry.contains_key(name) {
      return Err(Error::DuplicateTarget {
        name: name.to_string(),
        package: self.package().to_string(),
      });
    }
    registry.insert(name.to_string(), target);
    Ok(())
  }

  pub fn lookup(&self, name: &str) -> Option<Rc<Target>> {
    self.registry.borrow().get(name).cloned()
  }

  /// Contexts of the direct imports, in declared order.
  pub fn import_contexts(&self) -> Result<Vec<Rc<BuildContext>>> {
    let engine = self.engine();
    self.descriptor.imports.iter().map(|i| engine.context(i)).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::Fixture;

  #[test]
  fn contexts_are_cached_by_package() {
    let fx = Fixture::new();
    let a = fx.context("host/pkg");
    let b = fx.context("host/pkg");
    assert!(Rc::ptr_eq(&a, &b));
  }

  #[test]
  fn context_for_unknown_package_is_fatal() {
    let fx = Fixture::new();
    assert!(matches!(
      fx.engine.context("host/nope"),
      Err(Error::DescriptorNotFound(_))
    ));
  }

  #[test]
  fn registry_is_write_once() {
    let fx = Fixture::new();
    let ctx = fx.context("host/pkg");
    let t = Target::builder(&ctx).finish();
    ctx.register("libfoo.a", t.clone()).unwrap();
    assert!(matches!(
      ctx.register("libfoo.a", t),
      Err(Error::DuplicateTarget { .. })
    ));
  }

  #[test]
  fn lookup_returns_registered_target() {
    let fx = Fixture::new();
    let ctx = fx.context("host/pkg");
    assert!(ctx.lookup("libfoo.a").is_none());
    let t = Target::builder(&ctx).finish();
    ctx.register("libfoo.a", t.clone()).unwrap();
    assert!(Rc::ptr_eq(&ctx.lookup("libfoo.a").unwrap(), &t));
  }

  #[test]
  fn context_at_discovers_enclosing_package() {
    let fx = Fixture::new();
    let subdir = fx.srcdir("host/pkg").join("deep/nested");
    std::fs::create_dir_all(&subdir).unwrap();
    let ctx = fx.engine.context_at(&subdir).unwrap();
    assert_eq!(ctx.package(), "host/pkg");
    assert_eq!(ctx.paths().srcdir, fx.srcdir("host/pkg"));
  }

  #[test]
  fn import_contexts_follow_declared_order() {
    let fx = Fixture::new();
    fx.add_package("host/a", r#"return { package = "host/a" }"#);
    fx.add_package("host/b", r#"return { package = "host/b" }"#);
    fx.add_package(
      "host/app",
      r#"return { package = "host/app", imports = { "host/b", "host/a" } }"#,
    );
    let ctx = fx.context("host/app");
    let imports: Vec<String> = ctx
      .import_contexts()
      .unwrap()
      .iter()
      .map(|c| c.package().to_string())
      .collect();
    assert_eq!(imports, vec!["host/b", "host/a", crate::consts::DEFAULT_CORE_PACKAGE]);
  }

  #[test]
  fn acyclic_imports_pass_verification() {
    let fx = Fixture::new();
    fx.add_package("host/lib", r#"return { package = "host/lib" }"#);
    fx.add_package(
      "host/app",
      r#"return { package = "host/app", imports = { "host/lib" } }"#,
    );
    let ctx = fx.context("host/app");
    fx.engine.verify_imports(&ctx).unwrap();
  }

  #[test]
  fn import_cycle_is_rejected() {
    let fx = Fixture::new();
    fx.add_package(
      "host/a",
      r#"return { package = "host/a", imports = { "host/b" } }"#,
    );
    fx.add_package(
      "host/b",
      r#"return { package = "host/b", imports = { "host/a" } }"#,
    );
    let ctx = fx.context("host/a");
    assert!(matches!(fx.engine.verify_imports(&ctx), Err(Error::ImportCycle(_))));
  }

  #[test]
  fn self_import_is_rejected() {
    let fx = Fixture::new();
    fx.add_package(
      "host/selfish",
      r#"return { package = "host/selfish", imports = { "host/selfish" } }"#,
    );
    let ctx = fx.context("host/selfish");
    assert!(matches!(fx.engine.verify_imports(&ctx), Err(Error::ImportCycle(_))));
  }
}

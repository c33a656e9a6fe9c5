//! Composite link-side factories: the package archive, the link set, and
//! the compile/link flag walks.

use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use crate::context::BuildContext;
use crate::error::Result;
use crate::target::Target;
use crate::tools;

impl BuildContext {
  /// The package archive `lib<libname>.a`, depending on every target of
  /// every exported module. The recipe feeds only the changed objects to
  /// `ar r`, which preserves untouched members.
  pub fn library_target(self: &Rc<Self>) -> Result<Rc<Target>> {
    if let Some(target) = self.library.borrow().as_ref() {
      return Ok(target.clone());
    }

    let exported = self.exported_targets()?;
    let name = format!("lib{}.a", self.descriptor().libname);
    let target = Target::builder(self)
      .output(&self.paths().libdir.join(&name))
      .depend_all(&exported)
      .recipe(|t, changed| {
        let members: Vec<_> = changed.iter().filter_map(|d| d.path()).collect();
        tools::archive(&t.output(), &members)
      })
      .finish();
    self.register(&name, target.clone())?;

    *self.library.borrow_mut() = Some(target.clone());
    Ok(target)
  }

  /// Every static library an executable of this package links against:
  /// for each reachable context, in import-walk order, its package archive
  /// followed by its native archives. Each context appears exactly once.
  pub fn link_targets(self: &Rc<Self>) -> Result<Vec<Rc<Target>>> {
    if let Some(targets) = self.link_set.borrow().as_ref() {
      return Ok(targets.clone());
    }

    self.engine().verify_imports(self)?;
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_link_targets(self, &mut seen, &mut out)?;

    *self.link_set.borrow_mut() = Some(out.clone());
    Ok(out)
  }

  /// Raw link flags declared by every reachable context, same visitation
  /// order as the link set.
  pub fn link_flags(self: &Rc<Self>) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_ldflags(self, &mut seen, &mut out)?;
    Ok(out)
  }
}

fn collect_link_targets(ctx: &Rc<BuildContext>, seen: &mut HashSet<String>, out: &mut Vec<Rc<Target>>) -> Result<()> {
  if !seen.insert(ctx.package().to_string()) {
    return Ok(());
  }
  out.push(ctx.library_target()?);
  out.extend(ctx.native_targets()?);
  for ictx in ctx.import_contexts()? {
    collect_link_targets(&ictx, seen, out)?;
  }
  Ok(())
}

fn collect_ldflags(ctx: &Rc<BuildContext>, seen: &mut HashSet<String>, out: &mut Vec<String>) -> Result<()> {
  if !seen.insert(ctx.package().to_string()) {
    return Ok(());
  }
  out.extend(ctx.descriptor().ldflags.iter().cloned());
  for ictx in ctx.import_contexts()? {
    collect_ldflags(&ictx, seen, out)?;
  }
  Ok(())
}

/// Compile flags of a C object: walks the dependency DAG from `root`;
/// every reachable target contributes its owning package's source
/// directory as an include path (deduplicated by package identity) and its
/// own `cflags`.
pub fn collect_cflags(root: &Target) -> Result<Vec<String>> {
  let mut flags = Vec::new();
  let mut seen_packages: HashSet<String> = HashSet::new();
  let mut seen: HashSet<*const Target> = HashSet::new();
  let mut queue: VecDeque<Rc<Target>> = VecDeque::new();

  add_target_flags(root, &mut seen_packages, &mut flags);
  seen.insert(root as *const Target);
  queue.extend(root.resolved_depends()?);

  while let Some(target) = queue.pop_front() {
    if !seen.insert(Rc::as_ptr(&target)) {
      continue;
    }
    add_target_flags(&target, &mut seen_packages, &mut flags);
    queue.extend(target.resolved_depends()?);
  }

  Ok(flags)
}

fn add_target_flags(target: &Target, seen_packages: &mut HashSet<String>, flags: &mut Vec<String>) {
  let ctx = target.context();
  if seen_packages.insert(ctx.package().to_string()) {
    flags.push(format!("-I{}", ctx.paths().srcdir.display()));
  }
  flags.extend(target.cflags().iter().cloned());
}

//! Recursive classification of a dependency tree against an allow-list.
//!
//! Every node is either ignored (standard library at the root traversal,
//! or external with `ignore_external`), permitted (prefixed by an allowed
//! package) or a violation. Permitted nodes are descended into depth-first;
//! the first violation in a subtree ends the walk of that subtree.

use tracing::debug;

use crate::module::ModuleInfo;
use crate::types::{
    DependencyNode, DependencyTree, ImportStack, PackagePath, ValidationResult, ViolationError,
};

/// Directory segment whose packages are treated as external.
pub const VENDOR_SEGMENT: &str = "vendor";

/// Inputs shared by every step of one validation walk.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// The project being checked.
    pub module: &'a ModuleInfo,
    /// Normalized allowed package prefixes.
    pub allowed: &'a [PackagePath],
    /// Skip packages outside the module.
    pub ignore_external: bool,
    /// Skip standard-library packages.
    pub ignore_internal_at_root: bool,
}

/// Whether `package` is permitted by `allowed`.
///
/// This is a raw string-prefix test, not a path-segment test: an entry
/// `proj/core` also permits `proj/corex`.
#[must_use]
pub fn is_permitted(package: &PackagePath, allowed: &[PackagePath]) -> bool {
    allowed.iter().any(|a| package.starts_with(a.as_str()))
}

/// Whether `package` lies outside the module (or in its vendor directory).
#[must_use]
pub fn is_external(package: &PackagePath, module: &ModuleInfo) -> bool {
    let module_name = module.module_name.as_str();
    !package.starts_with(module_name)
        || package.starts_with(&format!("{module_name}/{VENDOR_SEGMENT}"))
}

/// Validates `node` and its subtree.
///
/// `stack` is the trail above `node`; it is extended, never modified.
/// Returns the first violation found in depth-first pre-order.
#[must_use]
pub fn validate(
    node: &DependencyNode,
    stack: &ImportStack<'_>,
    ctx: &ValidationContext<'_>,
) -> Option<ViolationError> {
    let stack = stack.push(node);

    if node.internal {
        if ctx.ignore_internal_at_root {
            return None;
        }
    } else if is_external(&node.name, ctx.module) && ctx.ignore_external {
        return None;
    }

    if !is_permitted(&node.name, ctx.allowed) {
        return Some(ViolationError {
            offending: node.name.clone(),
            stack: stack.frames(),
        });
    }

    if !node.resolved {
        debug!("{} could not be located, its imports are not checked", node.name);
    }

    node.children
        .iter()
        .find_map(|child| validate(child, &stack, ctx))
}

/// Validates each direct dependency of the tree root independently.
#[must_use]
pub fn check_direct_dependencies(
    tree: &DependencyTree,
    ctx: &ValidationContext<'_>,
) -> Vec<ValidationResult> {
    tree.root
        .children
        .iter()
        .map(|dep| ValidationResult {
            subject: dep.name.clone(),
            violation: validate(dep, &ImportStack::empty(), ctx),
        })
        .collect()
}

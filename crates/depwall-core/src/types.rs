//! Core types for dependency trees, import trails and validation results.

use std::fmt;
use std::path::PathBuf;

/// Fully-qualified package identifier (e.g. `github.com/acme/shop/domain`).
///
/// After normalization it never starts with `./` nor ends with `**`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PackagePath(String);

impl PackagePath {
    /// Creates a package path from anything string-like.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw string-prefix test, no path-segment awareness.
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for PackagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackagePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackagePath {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PackagePath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A package in a resolved dependency tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    /// Package identifier.
    pub name: PackagePath,
    /// Directory of the package that imported this one.
    pub source_dir: PathBuf,
    /// Standard-library package.
    pub internal: bool,
    /// Whether the resolver could locate the package on disk.
    ///
    /// Informational only: an unresolved node has no children, and verdicts
    /// do not depend on this flag.
    pub resolved: bool,
    /// Direct imports, in resolver order.
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// Creates a resolved, non-internal leaf node.
    #[must_use]
    pub fn new(name: impl Into<PackagePath>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_dir: source_dir.into(),
            internal: false,
            resolved: true,
            children: Vec::new(),
        }
    }

    /// Marks the node as a standard-library package.
    #[must_use]
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Marks the node as not locatable.
    #[must_use]
    pub fn unresolved(mut self) -> Self {
        self.resolved = false;
        self
    }

    /// Sets the node's direct imports.
    #[must_use]
    pub fn with_children(mut self, children: Vec<DependencyNode>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Self::size).sum::<usize>()
    }
}

/// A dependency tree handed out by an [`ImportResolver`](crate::ImportResolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTree {
    /// The package the tree was resolved from.
    pub root: DependencyNode,
}

/// One frame of an import trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFrame {
    /// Imported package.
    pub package: PackagePath,
    /// Directory the import was found in.
    pub source_dir: PathBuf,
}

impl From<&DependencyNode> for ImportFrame {
    fn from(node: &DependencyNode) -> Self {
        Self {
            package: node.name.clone(),
            source_dir: node.source_dir.clone(),
        }
    }
}

/// Path from a validation root down to the node being checked.
///
/// Each frame borrows its parent, so extending the stack never touches the
/// caller's value and sibling branches cannot observe each other's frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportStack<'a> {
    node: Option<&'a DependencyNode>,
    parent: Option<&'a ImportStack<'a>>,
}

impl<'a> ImportStack<'a> {
    /// An empty trail.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            node: None,
            parent: None,
        }
    }

    /// Returns a new stack with `node` on top of `self`.
    #[must_use]
    pub fn push<'b>(&'b self, node: &'b DependencyNode) -> ImportStack<'b>
    where
        'a: 'b,
    {
        ImportStack {
            node: Some(node),
            parent: Some(self),
        }
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.node.map_or(0, |_| 1) + self.parent.map_or(0, ImportStack::len)
    }

    /// Whether the trail has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames ordered from the validation root to the top.
    #[must_use]
    pub fn frames(&self) -> Vec<ImportFrame> {
        let mut frames = Vec::with_capacity(self.len());
        let mut current = Some(self);
        while let Some(stack) = current {
            if let Some(node) = stack.node {
                frames.push(ImportFrame::from(node));
            }
            current = stack.parent;
        }
        frames.reverse();
        frames
    }
}

/// A package imported outside of the allowed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationError {
    /// The package that is not allowed.
    pub offending: PackagePath,
    /// Import trail leading to it, root first.
    pub stack: Vec<ImportFrame>,
}

impl ViolationError {
    /// Renders the violation as a header followed by an indented trail.
    ///
    /// Trail entries are the frames' source directories in descending
    /// lexicographic order; indentation starts at two spaces and grows by two.
    #[must_use]
    pub fn render(&self) -> String {
        let mut dirs: Vec<String> = self
            .stack
            .iter()
            .map(|frame| frame.source_dir.display().to_string())
            .collect();
        dirs.sort_by(|a, b| b.cmp(a));

        let trail: Vec<String> = dirs
            .iter()
            .enumerate()
            .map(|(i, dir)| format!("{}from {dir}", " ".repeat(2 * (i + 1))))
            .collect();

        format!("{} is imported\n{}", self.offending, trail.join("\n"))
    }
}

impl fmt::Display for ViolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl std::error::Error for ViolationError {}

/// Verdict for one direct dependency of a validation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// The direct dependency.
    pub subject: PackagePath,
    /// First violation found under it, if any.
    pub violation: Option<ViolationError>,
}

impl ValidationResult {
    /// `true` when no violation was found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.violation.is_none()
    }
}

/// All verdicts for one validation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootReport {
    /// The checked root package.
    pub root: PackagePath,
    /// One result per direct dependency, in tree order.
    pub results: Vec<ValidationResult>,
}

impl RootReport {
    /// `true` when every direct dependency passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.results.iter().all(ValidationResult::is_ok)
    }
}

//! Import tree resolution for Go modules.
//!
//! Packages are located on disk relative to the module root:
//!
//! - `<module>` and `<module>/...` map to directories under the module root
//! - other paths are looked up in `<root>/vendor/...` and renamed to
//!   `<module>/vendor/...` when found there
//! - a path whose first element has no dot is a standard-library package
//! - anything else is an external package that cannot be located
//!
//! Standard-library packages are never expanded. A package is expanded at
//! most once per tree; later occurrences are leaves, which also breaks
//! import cycles.

use std::collections::{BTreeSet, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use depwall_core::validator::VENDOR_SEGMENT;
use depwall_core::{
    DependencyNode, DependencyTree, ImportResolver, ModuleInfo, PackagePath, ResolveError,
};
use tracing::debug;

use crate::extractor::GoExtractor;

/// Where an import path lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PackageLocation {
    /// Source directory inside the module or its vendor tree.
    Source { name: PackagePath, dir: PathBuf },
    /// Standard-library package.
    Standard,
    /// Cannot be located.
    Missing,
}

/// Resolves Go import trees for packages of one module.
pub struct GoImportResolver {
    module: ModuleInfo,
    extractor: GoExtractor,
}

impl GoImportResolver {
    /// Creates a resolver for `module`.
    #[must_use]
    pub fn new(module: ModuleInfo) -> Self {
        Self {
            module,
            extractor: GoExtractor::new(),
        }
    }

    fn locate(&self, import: &str) -> PackageLocation {
        let package = PackagePath::new(import);
        if let Some(dir) = self.module.dir_for(&package) {
            return PackageLocation::Source { name: package, dir };
        }

        let vendored = import
            .split('/')
            .fold(self.module.root_dir.join(VENDOR_SEGMENT), |dir, part| dir.join(part));
        if vendored.is_dir() {
            return PackageLocation::Source {
                name: PackagePath::new(format!(
                    "{}/{VENDOR_SEGMENT}/{import}",
                    self.module.module_name
                )),
                dir: vendored,
            };
        }

        let first = import.split('/').next().unwrap_or_default();
        if first.contains('.') {
            PackageLocation::Missing
        } else {
            PackageLocation::Standard
        }
    }

    /// Union of the imports of every buildable file in `dir`.
    ///
    /// `None` when the directory is missing or holds no buildable Go file.
    fn read_imports(&self, dir: &Path) -> Result<Option<BTreeSet<String>>, ResolveError> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ResolveError::Io {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ResolveError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && is_buildable(&path) {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Ok(None);
        }
        files.sort();

        let mut imports = BTreeSet::new();
        for file in files {
            let source = std::fs::read_to_string(&file).map_err(|source| ResolveError::Io {
                path: file.clone(),
                source,
            })?;
            let parsed = self
                .extractor
                .extract(&source)
                .map_err(|e| ResolveError::Parse {
                    path: file.clone(),
                    message: e.to_string(),
                })?;
            imports.extend(parsed.imports.into_iter().filter(|i| i != "C"));
        }
        Ok(Some(imports))
    }
}

/// Whether a file takes part in a regular (non-test) build.
fn is_buildable(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('_')
        && !name.starts_with('.')
}

/// State of one tree resolution.
struct Walk<'r> {
    resolver: &'r GoImportResolver,
    max_depth: Option<usize>,
    expanded: HashSet<PackagePath>,
}

impl Walk<'_> {
    fn within_depth(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }

    /// Builds the children of a package found in `dir` at `depth`.
    fn children(
        &mut self,
        dir: &Path,
        imports: BTreeSet<String>,
        depth: usize,
    ) -> Result<Vec<DependencyNode>, ResolveError> {
        let mut nodes = imports
            .iter()
            .map(|import| self.node(import, dir, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        nodes.sort_by(|a, b| b.internal.cmp(&a.internal).then_with(|| a.name.cmp(&b.name)));
        Ok(nodes)
    }

    fn node(
        &mut self,
        import: &str,
        importer_dir: &Path,
        depth: usize,
    ) -> Result<DependencyNode, ResolveError> {
        match self.resolver.locate(import) {
            PackageLocation::Standard => Ok(DependencyNode::new(import, importer_dir).internal()),
            PackageLocation::Missing => {
                debug!("Cannot locate package {import}");
                Ok(DependencyNode::new(import, importer_dir).unresolved())
            }
            PackageLocation::Source { name, dir } => {
                let node = DependencyNode::new(name.clone(), importer_dir);
                if !self.within_depth(depth) || !self.expanded.insert(name) {
                    return Ok(if dir.is_dir() { node } else { node.unresolved() });
                }
                match self.resolver.read_imports(&dir)? {
                    Some(imports) => {
                        let children = self.children(&dir, imports, depth)?;
                        Ok(node.with_children(children))
                    }
                    None => Ok(node.unresolved()),
                }
            }
        }
    }
}

impl ImportResolver for GoImportResolver {
    fn resolve(
        &self,
        root: &PackagePath,
        max_depth: Option<usize>,
    ) -> Result<DependencyTree, ResolveError> {
        let unresolved = || ResolveError::RootUnresolved {
            package: root.clone(),
        };

        let PackageLocation::Source { name, dir } = self.locate(root.as_str()) else {
            return Err(unresolved());
        };
        let imports = self.read_imports(&dir)?.ok_or_else(unresolved)?;

        let mut walk = Walk {
            resolver: self,
            max_depth,
            expanded: HashSet::from([name.clone()]),
        };
        let children = walk.children(&dir, imports, 0)?;

        Ok(DependencyTree {
            root: DependencyNode::new(name, self.module.root_dir.clone()).with_children(children),
        })
    }
}

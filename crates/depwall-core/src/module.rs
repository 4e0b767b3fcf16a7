//! Module root discovery.
//!
//! Relative rule patterns (`./domain`) are anchored to the module that
//! contains the configuration file. The module is found by walking upward
//! from the configuration file until a `go.mod` marker appears.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::CheckError;
use crate::types::PackagePath;

/// Name of the module-definition marker file.
pub const MODULE_MARKER: &str = "go.mod";

/// Identity of the project being checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Declared module path (e.g. `github.com/acme/shop`).
    pub module_name: PackagePath,
    /// Absolute directory containing the marker.
    pub root_dir: PathBuf,
    /// Absolute path of the marker file.
    pub marker_path: PathBuf,
}

impl ModuleInfo {
    /// Creates module info for a module rooted at `root_dir`.
    #[must_use]
    pub fn new(module_name: impl Into<PackagePath>, root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        Self {
            module_name: module_name.into(),
            marker_path: root_dir.join(MODULE_MARKER),
            root_dir,
        }
    }

    /// Package identifier for a directory relative to the module root.
    #[must_use]
    pub fn package_for(&self, relative: &Path) -> PackagePath {
        let mut name = self.module_name.as_str().to_owned();
        for component in relative.components() {
            if let Component::Normal(part) = component {
                name.push('/');
                name.push_str(&part.to_string_lossy());
            }
        }
        PackagePath::new(name)
    }

    /// Directory of a package inside this module, `None` for other packages.
    #[must_use]
    pub fn dir_for(&self, package: &PackagePath) -> Option<PathBuf> {
        let module = self.module_name.as_str();
        let rest = package.as_str().strip_prefix(module)?;
        if rest.is_empty() {
            return Some(self.root_dir.clone());
        }
        let rest = rest.strip_prefix('/')?;
        Some(
            rest.split('/')
                .filter(|s| !s.is_empty())
                .fold(self.root_dir.clone(), |dir, part| dir.join(part)),
        )
    }
}

/// Finds the module containing `start`.
///
/// `start` may be a file (its directory is searched first) or a directory.
///
/// # Errors
///
/// [`CheckError::ModuleNotFound`] when no marker exists up to the filesystem
/// root, [`CheckError::InvalidModuleFile`] when the marker has no module
/// directive, [`CheckError::FileAccess`] for other I/O failures.
pub fn locate(start: &Path) -> Result<ModuleInfo, CheckError> {
    let absolute = std::fs::canonicalize(start).map_err(|source| CheckError::FileAccess {
        path: start.to_path_buf(),
        source,
    })?;

    let mut dir = if absolute.is_dir() {
        absolute.clone()
    } else {
        match absolute.parent() {
            Some(parent) => parent.to_path_buf(),
            None => absolute.clone(),
        }
    };

    loop {
        let marker = dir.join(MODULE_MARKER);
        match std::fs::read_to_string(&marker) {
            Ok(content) => {
                let name = parse_module_directive(&content).map_err(|message| {
                    CheckError::InvalidModuleFile {
                        path: marker.clone(),
                        message,
                    }
                })?;
                debug!("Found module {} at {}", name, marker.display());
                return Ok(ModuleInfo {
                    module_name: PackagePath::new(name),
                    root_dir: dir,
                    marker_path: marker,
                });
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CheckError::FileAccess {
                    path: marker,
                    source,
                })
            }
        }

        match dir.parent() {
            Some(parent) if parent != dir => dir = parent.to_path_buf(),
            _ => return Err(CheckError::ModuleNotFound { start: absolute }),
        }
    }
}

/// Extracts the module path from `go.mod` content.
///
/// # Errors
///
/// Returns a description when no usable `module` directive is present.
pub fn parse_module_directive(content: &str) -> Result<String, String> {
    for line in content.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        if !(rest.is_empty() || rest.starts_with([' ', '\t', '"', '`'])) {
            continue;
        }

        let rest = rest.trim();
        if rest.starts_with('(') {
            return Err("module directive must not be a block".into());
        }
        let name = rest.trim_matches(|c| c == '"' || c == '`').trim();
        if name.is_empty() {
            return Err("empty module path".into());
        }
        return Ok(name.to_owned());
    }
    Err("no module directive".into())
}

//! Rule pattern normalization and wildcard expansion.
//!
//! Patterns in the configuration are either module-relative (`./domain`)
//! or fully qualified (`github.com/pkg/errors`). A trailing `**` on a
//! `from` pattern selects every directory below the named package.

use walkdir::WalkDir;

use crate::error::CheckError;
use crate::module::ModuleInfo;
use crate::types::PackagePath;

/// Prefix marking a module-relative pattern.
pub const RELATIVE_PREFIX: &str = "./";

/// Suffix marking a recursive wildcard pattern.
pub const WILDCARD_SUFFIX: &str = "**";

/// Turns a rule pattern into a module-qualified package path.
///
/// `./x/y` becomes `<module>/x/y`; anything else is returned unchanged.
///
/// # Example
///
/// ```ignore
/// let module = ModuleInfo::new("example.com/shop", "/src/shop");
/// assert_eq!(normalize("./domain", &module).as_str(), "example.com/shop/domain");
/// assert_eq!(normalize("fmt", &module).as_str(), "fmt");
/// ```
#[must_use]
pub fn normalize(pattern: &str, module: &ModuleInfo) -> PackagePath {
    match pattern.strip_prefix(RELATIVE_PREFIX) {
        Some(rest) => PackagePath::new(join(
            module.module_name.as_str(),
            &rest.replace('\\', "/"),
        )),
        None => PackagePath::new(pattern),
    }
}

/// Normalizes every pattern in order.
#[must_use]
pub fn normalize_all(patterns: &[String], module: &ModuleInfo) -> Vec<PackagePath> {
    patterns.iter().map(|p| normalize(p, module)).collect()
}

/// Whether `pattern` ends in the recursive wildcard marker.
#[must_use]
pub fn is_wildcard(pattern: &str) -> bool {
    pattern.ends_with(WILDCARD_SUFFIX)
}

/// Expands a wildcard pattern into the packages found below it on disk.
///
/// Non-wildcard patterns come back as a single-element list. The directory
/// named by the pattern is included; traversal is sorted by file name.
///
/// # Errors
///
/// [`CheckError::InvalidWildcardScope`] when a wildcard pattern is not
/// inside the module, [`CheckError::Filesystem`] when walking fails.
pub fn expand(pattern: &PackagePath, module: &ModuleInfo) -> Result<Vec<PackagePath>, CheckError> {
    if !is_wildcard(pattern.as_str()) {
        return Ok(vec![pattern.clone()]);
    }

    let out_of_scope = || CheckError::InvalidWildcardScope {
        pattern: pattern.clone(),
        module: module.module_name.clone(),
    };

    let base = pattern.as_str().trim_end_matches('*');
    let relative = base
        .strip_prefix(module.module_name.as_str())
        .ok_or_else(out_of_scope)?
        .trim_matches('/');
    let search_root = relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(module.root_dir.clone(), |dir, part| dir.join(part));

    let mut packages = Vec::new();
    for entry in WalkDir::new(&search_root).sort_by_file_name() {
        let entry = entry.map_err(|source| CheckError::Filesystem {
            path: search_root.clone(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(&module.root_dir)
            .map_err(|_| out_of_scope())?;
        packages.push(module.package_for(rel));
    }

    tracing::debug!("Expanded {} into {} package(s)", pattern, packages.len());
    Ok(packages)
}

/// Joins `rest` onto `base` with `/`, resolving `.` and `..` segments.
fn join(base: &str, rest: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in base.split('/').chain(rest.split('/')) {
        match seg {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    if parts.is_empty() {
        ".".to_owned()
    } else {
        parts.join("/")
    }
}

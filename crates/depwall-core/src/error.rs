//! Fatal errors of a check run.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::resolver::ResolveError;
use crate::types::PackagePath;

/// Errors that abort a check run.
///
/// Policy violations are not errors; they are reported as
/// [`ValidationResult`](crate::ValidationResult)s.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Malformed or missing configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No module marker above the start path.
    #[error("go.mod not found in {} or any parent directory", start.display())]
    ModuleNotFound {
        /// Where the upward search started.
        start: PathBuf,
    },

    /// The module marker exists but declares no usable module path.
    #[error("invalid module file {}: {message}", path.display())]
    InvalidModuleFile {
        /// Marker file path.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// A wildcard pattern points outside the module.
    #[error("wildcard suffix can only be used within module package \"{module}\": \"{pattern}\"")]
    InvalidWildcardScope {
        /// Offending pattern.
        pattern: PackagePath,
        /// Module name of the project.
        module: PackagePath,
    },

    /// Directory enumeration failed during wildcard expansion.
    #[error("failed to walk {}: {source}", path.display())]
    Filesystem {
        /// Directory being walked.
        path: PathBuf,
        /// Underlying walk error.
        source: walkdir::Error,
    },

    /// A file or directory could not be accessed.
    #[error("failed to access {}: {source}", path.display())]
    FileAccess {
        /// Path that failed.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },

    /// An explicitly named root package cannot be located.
    #[error("package \"{package}\" cannot be resolved")]
    RootUnresolved {
        /// The root package.
        package: PackagePath,
    },

    /// The import resolver failed.
    #[error(transparent)]
    Resolution(ResolveError),

    /// Writing the report failed.
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// A worker task panicked or was cancelled.
    #[error("check task failed: {0}")]
    Task(String),
}

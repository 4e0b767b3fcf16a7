//! The seam between depwall and a language-specific import graph.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{DependencyTree, PackagePath};

/// Builds dependency trees for packages.
///
/// Implementations decide how packages map to source and how imports are
/// extracted. The returned tree must be finite; `max_depth` bounds how many
/// import levels below the root are expanded (`None` means unbounded).
pub trait ImportResolver: Send + Sync {
    /// Resolves the import tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::RootUnresolved`] when `root` cannot be located, other
    /// variants for I/O and parse failures.
    fn resolve(
        &self,
        root: &PackagePath,
        max_depth: Option<usize>,
    ) -> Result<DependencyTree, ResolveError>;
}

/// Errors reported by an [`ImportResolver`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The root package cannot be located.
    #[error("package \"{package}\" cannot be resolved")]
    RootUnresolved {
        /// The root package.
        package: PackagePath,
    },

    /// Reading sources failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },

    /// A source file could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Parser detail.
        message: String,
    },
}

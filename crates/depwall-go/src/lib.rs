//! # depwall-go
//!
//! Go support for depwall.
//!
//! - [`GoExtractor`] parses Go source with Tree-sitter and extracts imports
//! - [`GoImportResolver`] implements [`depwall_core::ImportResolver`] for a
//!   Go module, building import trees from the sources on disk

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod extractor;
pub mod resolver;

pub use extractor::{GoExtractor, GoFileImports};
pub use resolver::GoImportResolver;

//! # depwall-core
//!
//! Core of depwall, a package layering checker.
//!
//! A project declares, per package (or package subtree), which packages it
//! may transitively import. This crate provides:
//!
//! - [`Config`] for TOML-based constraint definitions
//! - [`module::locate`] for discovering the project's module identity
//! - [`paths`] for normalizing and wildcard-expanding rule patterns
//! - [`validator`] for classifying a resolved dependency tree
//! - [`ImportResolver`], the seam to a language-specific import graph
//! - [`orchestrator::run`] for checking many roots concurrently
//!
//! ## Example
//!
//! ```ignore
//! use depwall_core::{module, orchestrator, Config, Reporter};
//!
//! let config = Config::from_file(path)?;
//! let module = module::locate(path)?;
//! let reporter = Arc::new(Reporter::stdout(true));
//! let ok = orchestrator::run(&config, &module, resolver, reporter).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod report;
mod resolver;
mod types;

pub mod module;
pub mod orchestrator;
pub mod paths;
pub mod validator;

pub use config::{Config, ConfigError, ConfigOverrides, Constraint};
pub use error::CheckError;
pub use module::ModuleInfo;
pub use report::{render_block, MemorySink, Reporter};
pub use resolver::{ImportResolver, ResolveError};
pub use types::{
    DependencyNode, DependencyTree, ImportFrame, ImportStack, PackagePath, RootReport,
    ValidationResult, ViolationError,
};

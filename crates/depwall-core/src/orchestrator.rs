//! Bounded-concurrency execution of constraint checks.
//!
//! Every constraint's `from` pattern is expanded into root packages, and
//! each root becomes one task: resolve its dependency tree, validate the
//! direct dependencies, print the block. At most `concurrency` tasks run at
//! once. The first fatal error stops scheduling; tasks already running are
//! drained before the error is returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::CheckError;
use crate::module::ModuleInfo;
use crate::paths;
use crate::report::Reporter;
use crate::resolver::{ImportResolver, ResolveError};
use crate::types::{PackagePath, RootReport};
use crate::validator::{check_direct_dependencies, ValidationContext};

/// One root package to check, with the rule it came from.
#[derive(Debug, Clone)]
pub struct RootJob {
    /// Package to resolve and check.
    pub root: PackagePath,
    /// Normalized allow-list of the originating constraint.
    pub allowed: Arc<[PackagePath]>,
    /// Whether the root's pattern expanded to more than one package.
    /// Only such roots may be skipped when they cannot be resolved.
    pub multi_match: bool,
}

/// Expands every constraint into root jobs, in declaration order.
///
/// # Errors
///
/// Wildcard scope and filesystem errors from [`paths::expand`].
pub fn plan(config: &Config, module: &ModuleInfo) -> Result<Vec<RootJob>, CheckError> {
    let mut jobs = Vec::new();
    for constraint in &config.constraints {
        let from = paths::normalize(&constraint.from, module);
        let allowed: Arc<[PackagePath]> = paths::normalize_all(&constraint.allow, module).into();
        let roots = paths::expand(&from, module)?;
        let multi_match = roots.len() > 1;

        for root in roots {
            jobs.push(RootJob {
                root,
                allowed: Arc::clone(&allowed),
                multi_match,
            });
        }
    }
    Ok(jobs)
}

/// Settings copied into every task.
#[derive(Debug, Clone, Copy)]
struct TaskSettings {
    max_depth: Option<usize>,
    ignore_external: bool,
}

/// Checks every constraint of `config`.
///
/// Returns `Ok(true)` when every direct dependency of every root passed,
/// `Ok(false)` when at least one violation was printed.
///
/// # Errors
///
/// The first fatal error of any task, or a planning error.
pub async fn run(
    config: &Config,
    module: &ModuleInfo,
    resolver: Arc<dyn ImportResolver>,
    reporter: Arc<Reporter>,
) -> Result<bool, CheckError> {
    let jobs = plan(config, module)?;
    info!("Checking {} root package(s)", jobs.len());

    let settings = TaskSettings {
        max_depth: config.max_depth(),
        ignore_external: config.ignore_external,
    };
    let module = Arc::new(module.clone());
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let aborted = Arc::new(AtomicBool::new(false));
    let mut tasks = JoinSet::new();

    for job in jobs {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| CheckError::Task(e.to_string()))?;
        if aborted.load(Ordering::SeqCst) {
            debug!("Fatal error reported, not scheduling {}", job.root);
            break;
        }

        let module = Arc::clone(&module);
        let resolver = Arc::clone(&resolver);
        let reporter = Arc::clone(&reporter);
        let aborted = Arc::clone(&aborted);
        tasks.spawn(async move {
            let _permit = permit;
            let outcome = check_root(job, module, resolver, reporter, settings).await;
            if outcome.is_err() {
                aborted.store(true, Ordering::SeqCst);
            }
            outcome
        });
    }

    let mut succeeded = true;
    let mut fatal = None;
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(task_error) {
            Ok(Ok(passed)) => succeeded &= passed,
            Ok(Err(e)) | Err(e) => {
                if fatal.is_none() {
                    fatal = Some(e);
                }
            }
        }
    }

    match fatal {
        Some(e) => Err(e),
        None => {
            info!("Check finished: {}", if succeeded { "passed" } else { "failed" });
            Ok(succeeded)
        }
    }
}

fn task_error(e: JoinError) -> CheckError {
    CheckError::Task(e.to_string())
}

/// Resolves, validates and prints one root. `Ok(true)` also covers a skipped root.
async fn check_root(
    job: RootJob,
    module: Arc<ModuleInfo>,
    resolver: Arc<dyn ImportResolver>,
    reporter: Arc<Reporter>,
    settings: TaskSettings,
) -> Result<bool, CheckError> {
    let report = tokio::task::spawn_blocking(move || {
        resolve_and_validate(&job, &module, resolver.as_ref(), settings)
    })
    .await
    .map_err(task_error)??;

    match report {
        Some(report) => {
            reporter.print_block(&report).await?;
            Ok(report.is_success())
        }
        None => Ok(true),
    }
}

fn resolve_and_validate(
    job: &RootJob,
    module: &ModuleInfo,
    resolver: &dyn ImportResolver,
    settings: TaskSettings,
) -> Result<Option<RootReport>, CheckError> {
    let tree = match resolver.resolve(&job.root, settings.max_depth) {
        Ok(tree) => tree,
        Err(ResolveError::RootUnresolved { package }) if job.multi_match => {
            debug!("Skipping {package}: not a resolvable package");
            return Ok(None);
        }
        Err(ResolveError::RootUnresolved { package }) => {
            return Err(CheckError::RootUnresolved { package })
        }
        Err(e) => return Err(CheckError::Resolution(e)),
    };
    debug!("Resolved {} ({} node(s))", job.root, tree.root.size());

    let ctx = ValidationContext {
        module,
        allowed: &job.allowed,
        ignore_external: settings.ignore_external,
        ignore_internal_at_root: true,
    };
    Ok(Some(RootReport {
        root: job.root.clone(),
        results: check_direct_dependencies(&tree, &ctx),
    }))
}

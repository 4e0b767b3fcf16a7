//! Check command implementation.

use anyhow::{bail, Context, Result};
use depwall_core::{module, orchestrator, Config, ConfigOverrides, Reporter};
use depwall_go::GoImportResolver;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use crate::config_resolver::{self, ConfigSource};
use crate::{CheckArgs, ColorChoice};

/// Runs the check command.
///
/// Returns `Ok(false)` when any constraint was violated.
pub async fn run(explicit_config: Option<&Path>, args: &CheckArgs) -> Result<bool> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let source = config_resolver::resolve(&cwd, explicit_config);
    let config_path = match &source {
        ConfigSource::NotFound => {
            bail!("No depwall.toml found. Run `depwall init` to create one.")
        }
        other => other.path().context("resolved config has no path")?,
    };
    tracing::debug!("Using config: {}", config_path.display());

    let config = load_config(config_path, &overrides(args))?;
    let module = module::locate(config_path)?;

    let resolver = Arc::new(GoImportResolver::new(module.clone()));
    let reporter = Arc::new(Reporter::stdout(use_color(args.color)));

    Ok(orchestrator::run(&config, &module, resolver, reporter).await?)
}

fn load_config(path: &Path, overrides: &ConfigOverrides) -> Result<Config> {
    let mut config = Config::from_file(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    config.apply(overrides);
    config.validate().context("Config validation failed")?;
    Ok(config)
}

fn overrides(args: &CheckArgs) -> ConfigOverrides {
    ConfigOverrides {
        ignore_external: args.ignore_external,
        recursive: args.recursive,
        concurrency: args.concurrency,
    }
}

fn use_color(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal(),
    }
}

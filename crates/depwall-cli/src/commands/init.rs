//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# depwall configuration
# Each [[constraint]] names the packages a set of packages may import.
# Paths starting with "./" are relative to the module root (the directory
# holding go.mod). A trailing "**" matches a package and everything below it.

# Skip imports from outside the module (standard library, third party).
ignoreExternal = true

# Follow imports transitively instead of checking direct imports only.
recursive = true

# Number of packages checked at the same time.
concurrency = 1

[[constraint]]
from = "./domain"
allow = ["./domain"]

[[constraint]]
from = "./usecase"
allow = ["./domain", "./usecase"]

[[constraint]]
from = "./infra/**"
allow = ["./domain", "./usecase", "./infra"]

# Allow-list entries are prefixes: "./infra" also permits "./infrastructure".
# Spell out "./infra/" style entries when that matters.
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_template(Path::new("depwall.toml"), force)?;

    println!("Created depwall.toml");
    println!();
    println!("Next steps:");
    println!("  1. Edit the [[constraint]] entries for your module");
    println!("  2. Run: depwall check");

    Ok(())
}

fn write_template(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, CONFIG_TEMPLATE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depwall_core::Config;
    use tempfile::TempDir;

    #[test]
    fn template_is_a_valid_config() {
        let config = Config::parse(CONFIG_TEMPLATE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.constraints.len(), 3);
        assert!(config.recursive);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("depwall.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        let err = write_template(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        write_template(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }
}

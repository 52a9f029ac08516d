//! CLI command implementations.

pub mod build;
pub mod dev;
pub mod init;

pub use build::build_site;
pub use dev::dev_server;
pub use init::init_project;

use anyhow::{Context, Result};
use inkpress_core::config::CONFIG_FILE_NAME;
use inkpress_core::Config;
use std::path::Path;

/// Load the configuration named by `--config`, or `inkpress.yml` if present.
///
/// An explicitly named file must exist; only the implicit default may be
/// absent, in which case built-in defaults apply.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path)),
        None => Config::load_or_default(CONFIG_FILE_NAME).context("Failed to load configuration"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("typo.yml");

        let err = load_config(Some(&missing)).unwrap_err();
        assert!(format!("{:#}", err).contains("typo.yml"));
    }

    #[test]
    fn test_explicit_config_roots_paths() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("site.yml");
        std::fs::write(&path, "paths:\n  output: dist\n")?;

        let config = load_config(Some(&path))?;
        assert_eq!(config.directories().output, dir.path().join("dist"));
        Ok(())
    }
}

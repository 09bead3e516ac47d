//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod extract;
pub mod templates;

use std::path::{Path, PathBuf};

use tracing::debug;

use docroi_core::DocroiConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docroi")
        .join("config.json")
}

/// Load the configuration named on the command line, falling back to the
/// default file and then to built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocroiConfig> {
    if let Some(path) = config_path {
        debug!("Loading config from {}", path);
        return Ok(DocroiConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(DocroiConfig::from_file(&default_path)?)
    } else {
        Ok(DocroiConfig::default())
    }
}

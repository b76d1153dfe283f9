//! TOML configuration file loading
//!
//! Supports `~/.config/kernelci/dashboard/config.toml` as a persistent config
//! source. All fields are optional; the file is an overlay under env vars.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct DashboardConfigFile {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendFileConfig,
}

/// `[backend]` section
#[derive(Debug, Default, Deserialize)]
pub struct BackendFileConfig {
    /// Backend base URL
    pub url: Option<String>,

    /// Batch endpoint path
    pub batch_path: Option<String>,

    /// Backend API token
    pub token: Option<String>,

    /// Header name for the token
    pub token_header: Option<String>,

    /// Connect timeout in seconds
    pub connect_timeout: Option<f64>,

    /// Request timeout in seconds
    pub request_timeout: Option<f64>,
}

/// Parse a config file from TOML text
///
/// # Errors
///
/// Returns error if the text is not valid TOML for this schema
pub fn parse_config(content: &str) -> Result<DashboardConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `DashboardConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> DashboardConfigFile {
    config_file_path().map_or_else(DashboardConfigFile::default, |path| load_config_from(&path))
}

/// Load a config file from `path`, falling back to defaults
#[must_use]
pub fn load_config_from(path: &Path) -> DashboardConfigFile {
    if !path.exists() {
        return DashboardConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                DashboardConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            DashboardConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/kernelci/dashboard/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("kernelci")
            .join("dashboard")
            .join("config.toml")
    })
}

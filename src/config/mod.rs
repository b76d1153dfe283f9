//! Configuration management for the dashboard client

pub mod file;

use std::time::Duration;

use crate::{Error, Result};

use file::DashboardConfigFile;

/// Default path of the backend batch endpoint
pub const DEFAULT_BATCH_PATH: &str = "batch";

/// Default header carrying the backend token
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

/// Seconds allowed to establish a backend connection
const DEFAULT_CONNECT_TIMEOUT_SECS: f64 = 6.0;

/// Seconds allowed for a whole backend request
const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 10.0;

/// Backend connection settings
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend API (e.g. <https://api.kernelci.org>)
    pub backend_url: String,

    /// Path of the batch endpoint, relative to `backend_url`
    pub batch_path: String,

    /// Header name used to send `auth_token`
    pub auth_header: String,

    /// Backend API token, sent on every request when present
    pub auth_token: Option<String>,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Total request timeout
    pub request_timeout: Duration,
}

impl BackendConfig {
    /// Create a config for `backend_url` with default settings
    #[must_use]
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            batch_path: DEFAULT_BATCH_PATH.to_string(),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            auth_token: None,
            connect_timeout: Duration::from_secs_f64(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs_f64(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Set the backend token
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Load configuration from the environment, overlaid on the config file
    ///
    /// `backend_url` (e.g. from the command line) wins over both.
    ///
    /// # Errors
    ///
    /// Returns error if no backend URL is configured or a value is invalid
    pub fn load(backend_url: Option<String>) -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(&fc, |key| match key {
            "DASHBOARD_BACKEND_URL" if backend_url.is_some() => backend_url.clone(),
            _ => std::env::var(key).ok(),
        })
    }

    /// Resolve configuration from a parsed config file and an env lookup
    ///
    /// Environment values win over file values, which win over defaults.
    ///
    /// # Errors
    ///
    /// Returns error if no backend URL is configured or a value is invalid
    pub fn from_sources<F>(fc: &DashboardConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = &fc.backend;

        let backend_url = env("DASHBOARD_BACKEND_URL")
            .or_else(|| backend.url.clone())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::Config("DASHBOARD_BACKEND_URL is not set".to_string()))?;

        url::Url::parse(&backend_url)
            .map_err(|e| Error::Config(format!("invalid backend url {backend_url}: {e}")))?;

        let mut config = Self::new(backend_url);

        if let Some(path) = env("DASHBOARD_BATCH_PATH").or_else(|| backend.batch_path.clone()) {
            config.batch_path = path;
        }

        if let Some(header) =
            env("DASHBOARD_BACKEND_TOKEN_HEADER").or_else(|| backend.token_header.clone())
        {
            config.auth_header = header;
        }

        config.auth_token = env("DASHBOARD_BACKEND_TOKEN")
            .or_else(|| backend.token.clone())
            .filter(|token| !token.is_empty());

        if let Some(value) = timeout(&env, "DASHBOARD_CONNECT_TIMEOUT", backend.connect_timeout)? {
            config.connect_timeout = value;
        }

        if let Some(value) = timeout(&env, "DASHBOARD_REQUEST_TIMEOUT", backend.request_timeout)? {
            config.request_timeout = value;
        }

        Ok(config)
    }
}

/// Read a timeout in seconds from `key`, falling back to the file value
fn timeout<F>(env: &F, key: &str, file_value: Option<f64>) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match env(key) {
        Some(raw) => Some(
            raw.trim()
                .parse::<f64>()
                .map_err(|e| Error::Config(format!("invalid {key} value {raw:?}: {e}")))?,
        ),
        None => file_value,
    };

    match secs {
        Some(s) if !s.is_finite() || s <= 0.0 => {
            Err(Error::Config(format!("{key} must be a positive number of seconds")))
        }
        Some(s) => Duration::try_from_secs_f64(s)
            .map(Some)
            .map_err(|e| Error::Config(format!("{key}: {e}"))),
        None => Ok(None),
    }
}

/// Page-level parameters that were previously read from ambient page state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Job (tree) name
    pub job: String,

    /// Number of days to look back, if limited
    pub date_range: Option<u32>,
}

impl PageContext {
    /// Create a context for `job` with no date limit
    #[must_use]
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            date_range: None,
        }
    }

    /// Limit queries to the last `days` days
    #[must_use]
    pub fn with_date_range(mut self, days: u32) -> Self {
        self.date_range = Some(days);
        self
    }
}

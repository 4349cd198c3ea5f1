use std::path::PathBuf;

use aura_core::error::CoreError;

pub const DEFAULT_MODEL_PATH: &str = "model/aura_model.json";

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Where the failure model is loaded from and saved to.
    pub model_path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                                        |
    /// |------------------------|------------------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                                      |
    /// | `PORT`                 | `5000`                                         |
    /// | `CORS_ORIGINS`         | `http://localhost:5000,http://127.0.0.1:5000`  |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                           |
    /// | `MODEL_PATH`           | `model/aura_model.json`                        |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "5000".into())
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation("PORT must be a valid u16".into()))?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5000,http://127.0.0.1:5000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = lookup("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".into())
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation("REQUEST_TIMEOUT_SECS must be a valid u64".into()))?;
        if request_timeout_secs == 0 {
            return Err(CoreError::Validation(
                "REQUEST_TIMEOUT_SECS must be greater than zero".into(),
            ));
        }

        let model_path = lookup("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            model_path,
        })
    }
}

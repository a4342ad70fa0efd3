use reqwest::Url;
use serde::Deserialize;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for crate::error::ClientError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Config(e) => crate::error::ClientError::Config(e),
            ConfigError::Validation(msg) => crate::error::ClientError::Configuration(msg),
        }
    }
}

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_SESSION_FILE: &str = ".taskdesk/session.json";
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;
pub const MAX_HTTP_TIMEOUT_SECONDS: f64 = 600.0;

fn default_user_agent() -> String {
    format!("taskdesk/{}", env!("CARGO_PKG_VERSION"))
}

/// Client settings with environment variable support
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // API
    pub api_base_url: String,
    pub http_timeout_seconds: f64,
    pub user_agent: String,

    // Session persistence
    pub session_file: String,

    // Logging
    pub log_level: String,
    pub log_format: String,
}

impl Default for Settings {
    /// Built-in defaults. Does not read the environment.
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            http_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS as f64,
            user_agent: default_user_agent(),
            session_file: DEFAULT_SESSION_FILE.to_string(),
            log_level: "WARN".to_string(),
            log_format: "plain".to_string(),
        }
    }
}

impl Settings {
    /// Create new settings instance from environment variables and .env file
    pub fn new() -> Result<Self, ConfigError> {
        Self::new_with_env_file(true)
    }

    /// Create new settings instance with optional .env file loading
    pub fn new_with_env_file(load_env_file: bool) -> Result<Self, ConfigError> {
        // Tests mutate process env; serialize reads of it
        static SETTINGS_BUILD_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        let build_mutex = SETTINGS_BUILD_MUTEX.get_or_init(|| Mutex::new(()));
        let _guard = match build_mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if load_env_file {
            dotenvy::dotenv().ok();
        }

        let defaults = Settings::default();
        let mut builder = config::Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("http_timeout_seconds", defaults.http_timeout_seconds)?
            .set_default("user_agent", defaults.user_agent)?
            .set_default("session_file", defaults.session_file)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", defaults.log_format)?;

        // .env values arrive through the process environment (dotenvy above)
        fn read_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        }

        // String overrides (UPPERCASE only)
        if let Some(v) = read_env("API_BASE_URL") { builder = builder.set_override("api_base_url", v)?; }
        if let Some(v) = read_env("USER_AGENT") { builder = builder.set_override("user_agent", v)?; }
        if let Some(v) = read_env("SESSION_FILE") { builder = builder.set_override("session_file", v)?; }
        if let Some(v) = read_env("LOG_LEVEL") { builder = builder.set_override("log_level", v)?; }
        if let Some(v) = read_env("LOG_FORMAT") { builder = builder.set_override("log_format", v)?; }

        // Numeric overrides
        if let Some(v) = read_env("HTTP_TIMEOUT_SECONDS") {
            let parsed = v.trim().parse::<f64>().map_err(|_| {
                ConfigError::Validation(format!("HTTP_TIMEOUT_SECONDS is not a number: {}", v))
            })?;
            builder = builder.set_override("http_timeout_seconds", parsed)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api_base_url).map_err(|e| {
            ConfigError::Validation(format!("api_base_url is not a valid URL: {}", e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(
                "api_base_url must use http or https".to_string(),
            ));
        }

        if !matches!(self.log_format.to_lowercase().as_str(), "json" | "plain") {
            return Err(ConfigError::Validation(
                "log_format must be 'json' or 'plain'".to_string(),
            ));
        }

        if !matches!(
            self.log_level.to_uppercase().as_str(),
            "TRACE" | "DEBUG" | "INFO" | "WARN" | "WARNING" | "ERROR"
        ) {
            return Err(ConfigError::Validation(format!(
                "log_level '{}' is not recognised",
                self.log_level
            )));
        }

        let timeout = self.http_timeout_seconds;
        // NaN fails both comparisons
        if !(timeout > 0.0 && timeout <= MAX_HTTP_TIMEOUT_SECONDS) {
            return Err(ConfigError::Validation(format!(
                "http_timeout_seconds must be greater than 0 and at most {}",
                MAX_HTTP_TIMEOUT_SECONDS
            )));
        }

        if self.session_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "session_file cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.http_timeout_seconds)
            .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS))
    }

    /// Settings pointing at another API, keeping every other default.
    pub fn for_api(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api/v1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CURRENCY_CODE: &str = "INR";
const DEFAULT_CURRENCY_SYMBOL: &str = "₹";
const CONFIG_DIR: &str = "config";

/// Client configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the marketplace REST backend, e.g. `https://api.example.com/api/v1`
    #[validate(url)]
    pub api_base_url: String,

    /// Per-request timeout in seconds (1 - 120)
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 120))]
    pub request_timeout_secs: u64,

    /// Application environment
    #[serde(default = "default_environment")]
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// ISO currency code prices are quoted in
    #[serde(default = "default_currency_code")]
    #[validate(length(equal = 3))]
    pub currency_code: String,

    /// Symbol used when rendering amounts
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: default_request_timeout_secs(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            currency_code: default_currency_code(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl ClientConfig {
    /// Config pointing at the given backend with every other field defaulted.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        if self.is_production() && !self.api_base_url.starts_with("https://") {
            let mut errors = ValidationErrors::new();
            let mut err = ValidationError::new("insecure_api_base_url");
            err.message = Some("api_base_url must use https in production".into());
            errors.add("api_base_url", err);
            return Err(errors);
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_currency_code() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}

fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] ConfigError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("coursemart_checkout={},coursemart_cli={}", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads client configuration from `config/` under the working directory.
pub fn load_config() -> Result<ClientConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Loads client configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (`<dir>/default.toml`)
/// 3. Environment-specific config (`<dir>/{env}.toml`)
/// 4. Environment variables (APP__*)
pub fn load_config_from(config_dir: &Path) -> Result<ClientConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let dir = config_dir.display();
    let config = Config::builder()
        .set_default("api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", dir)).required(false))
        .add_source(File::with_name(&format!("{}/{}", dir, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let client_config: ClientConfig = config.try_deserialize()?;

    client_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    client_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(client_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, filename: &str, content: &str) {
        fs::write(dir.path().join(filename), content).unwrap();
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = ClientConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.validate_additional_constraints().is_ok());
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn production_requires_https() {
        let mut cfg = ClientConfig::with_base_url("http://api.example.com");
        cfg.environment = "production".into();
        assert!(cfg.validate_additional_constraints().is_err());

        cfg.api_base_url = "https://api.example.com".into();
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn rejects_bad_log_level_and_timeout() {
        let mut cfg = ClientConfig::default();
        cfg.log_level = "loud".into();
        cfg.request_timeout_secs = 0;

        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("log_level"));
        assert!(errors.field_errors().contains_key("request_timeout_secs"));
    }

    #[test]
    fn loads_values_from_default_file() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
                api_base_url = "https://courses.example.com/api/v1"
                request_timeout_secs = 30
                currency_code = "USD"
                currency_symbol = "$"
            "#,
        );

        let cfg = load_config_from(dir.path()).unwrap();
        assert_eq!(cfg.api_base_url, "https://courses.example.com/api/v1");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.currency_symbol, "$");
    }

    #[test]
    fn invalid_file_fails_validation() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
                api_base_url = "not a url"
            "#,
        );

        let result = load_config_from(dir.path());
        assert!(matches!(result, Err(AppConfigError::Validation(_))));
    }
}

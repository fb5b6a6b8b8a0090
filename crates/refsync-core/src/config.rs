//! Configuration module for refsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, environment overrides, validation, defaults, and a builder
//! pattern for programmatic use. [`EngineSettings`] is the validated subset the
//! sync engine is constructed from.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigError;

/// Environment variable overriding `remote.api_token`.
pub const ENV_API_TOKEN: &str = "REFSYNC_API_TOKEN";

/// Environment variable overriding `remote.database_id`.
pub const ENV_DATABASE_ID: &str = "REFSYNC_DATABASE_ID";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for refsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Remote workspace connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Integration access token. Required before the engine can start.
    pub api_token: Option<String>,
    /// Identifier of the target database. Required before the engine can start.
    pub database_id: Option<String>,
    /// Base URL of the workspace REST API.
    pub base_url: String,
    /// API version sent with every request.
    pub api_version: String,
}

/// Change-driven synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period (milliseconds) after the last change before a batch runs.
    pub debounce_ms: u64,
    /// Forward "modified" notifications, not only additions to tracked collections.
    pub sync_on_modify: bool,
    /// Re-enqueue the unattempted remainder of a batch that aborted.
    pub requeue_on_abort: bool,
    /// Tag added to catalog items after they were synced.
    pub synced_tag: Option<String>,
    /// Record the remote URL as a link on the catalog item.
    pub attach_link: bool,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/refsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("refsync")
            .join("config.yaml")
    }

    /// Apply credential overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply credential overrides from an arbitrary lookup.
    ///
    /// Blank values are ignored so an exported-but-empty variable does not
    /// wipe a configured credential.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_blank(ENV_API_TOKEN) {
            self.remote.api_token = Some(token);
        }
        if let Some(database_id) = non_blank(ENV_DATABASE_ID) {
            self.remote.database_id = Some(database_id);
        }
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            database_id: None,
            base_url: "https://api.notion.com/v1".to_string(),
            api_version: "2022-06-28".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 2000,
            sync_on_modify: false,
            requeue_on_abort: false,
            synced_tag: None,
            attach_link: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.debounce_ms"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        if is_blank(&self.remote.api_token) {
            errors.push(ValidationError {
                field: "remote.api_token".into(),
                message: format!("is required (or set {ENV_API_TOKEN})"),
            });
        }
        if is_blank(&self.remote.database_id) {
            errors.push(ValidationError {
                field: "remote.database_id".into(),
                message: format!("is required (or set {ENV_DATABASE_ID})"),
            });
        }
        if !(self.remote.base_url.starts_with("http://")
            || self.remote.base_url.starts_with("https://"))
        {
            errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.remote.base_url),
            });
        }
        if self.remote.api_version.trim().is_empty() {
            errors.push(ValidationError {
                field: "remote.api_version".into(),
                message: "must not be empty".into(),
            });
        }

        // --- sync ---
        if self.sync.debounce_ms == 0 {
            errors.push(ValidationError {
                field: "sync.debounce_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if let Some(tag) = &self.sync.synced_tag {
            if tag.trim().is_empty() {
                errors.push(ValidationError {
                    field: "sync.synced_tag".into(),
                    message: "must not be blank when set".into(),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// EngineSettings
// ---------------------------------------------------------------------------

/// Settings the sync engine is constructed from, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Integration access token
    pub api_token: String,
    /// Target database identifier
    pub database_id: String,
    /// Base URL of the workspace REST API
    pub base_url: String,
    /// API version header value
    pub api_version: String,
    /// Debounce quiet period
    pub debounce: Duration,
    /// Whether "modified" notifications trigger a sync
    pub sync_on_modify: bool,
    /// Whether an aborted batch re-enqueues its unattempted remainder
    pub requeue_on_abort: bool,
}

impl EngineSettings {
    /// Resolve engine settings from a loaded configuration.
    ///
    /// # Errors
    /// - [`ConfigError::ConfigurationMissing`] if the access token or the
    ///   database identifier is absent or blank
    /// - [`ConfigError::Invalid`] for the first other validation failure
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_token = config
            .remote
            .api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::ConfigurationMissing("remote.api_token"))?;

        let database_id = config
            .remote
            .database_id
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::ConfigurationMissing("remote.database_id"))?;

        if let Some(err) = config.validate().into_iter().next() {
            return Err(ConfigError::Invalid {
                field: err.field,
                message: err.message,
            });
        }

        Ok(Self {
            api_token: api_token.to_string(),
            database_id: database_id.to_string(),
            base_url: config.remote.base_url.trim_end_matches('/').to_string(),
            api_version: config.remote.api_version.clone(),
            debounce: Duration::from_millis(config.sync.debounce_ms),
            sync_on_modify: config.sync.sync_on_modify,
            requeue_on_abort: config.sync.requeue_on_abort,
        })
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use refsync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .api_token("secret_abc")
///     .database_id("d9824bdc84454327be8b5b47500af6ce")
///     .sync_on_modify(true)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.remote.api_token = Some(token.into());
        self
    }

    pub fn database_id(mut self, id: impl Into<String>) -> Self {
        self.config.remote.database_id = Some(id.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.base_url = url.into();
        self
    }

    // --- sync ---

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.sync.debounce_ms = ms;
        self
    }

    pub fn sync_on_modify(mut self, enabled: bool) -> Self {
        self.config.sync.sync_on_modify = enabled;
        self
    }

    pub fn requeue_on_abort(mut self, enabled: bool) -> Self {
        self.config.sync.requeue_on_abort = enabled;
        self
    }

    pub fn synced_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.sync.synced_tag = Some(tag.into());
        self
    }

    pub fn attach_link(mut self, enabled: bool) -> Self {
        self.config.sync.attach_link = enabled;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn complete() -> ConfigBuilder {
        ConfigBuilder::new()
            .api_token("secret_token")
            .database_id("d9824bdc84454327be8b5b47500af6ce")
    }

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert!(cfg.remote.api_token.is_none());
        assert!(cfg.remote.database_id.is_none());
        assert_eq!(cfg.remote.base_url, "https://api.notion.com/v1");
        assert_eq!(cfg.remote.api_version, "2022-06-28");
        assert_eq!(cfg.sync.debounce_ms, 2000);
        assert!(!cfg.sync.sync_on_modify);
        assert!(!cfg.sync.requeue_on_abort);
        assert!(cfg.sync.synced_tag.is_none());
        assert!(cfg.sync.attach_link);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn default_config_only_lacks_credentials() {
        let errors = Config::default().validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["remote.api_token", "remote.database_id"]);
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
remote:
  api_token: secret_from_file
  database_id: db-123
  base_url: http://localhost:9999/v1
  api_version: "2022-06-28"
sync:
  debounce_ms: 500
  sync_on_modify: true
  requeue_on_abort: true
  synced_tag: notion
  attach_link: false
logging:
  level: debug
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.remote.api_token.as_deref(), Some("secret_from_file"));
        assert_eq!(cfg.remote.database_id.as_deref(), Some("db-123"));
        assert_eq!(cfg.remote.base_url, "http://localhost:9999/v1");
        assert_eq!(cfg.sync.debounce_ms, 500);
        assert!(cfg.sync.sync_on_modify);
        assert!(cfg.sync.requeue_on_abort);
        assert_eq!(cfg.sync.synced_tag.as_deref(), Some("notion"));
        assert!(!cfg.sync.attach_link);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn load_partial_yaml_fills_defaults() {
        let yaml = "sync:\n  sync_on_modify: true\n";
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).unwrap();
        assert!(cfg.sync.sync_on_modify);
        assert_eq!(cfg.sync.debounce_ms, 2000);
        assert_eq!(cfg.remote.base_url, "https://api.notion.com/v1");
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/refsync/config.yaml"));
        assert_eq!(cfg.sync.debounce_ms, 2000);
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        let path = Config::default_path();
        assert!(path.ends_with("refsync/config.yaml"));
    }

    // -- Environment overrides --

    #[test]
    fn env_overrides_replace_credentials() {
        let mut cfg = complete().build();
        cfg.apply_overrides_from(|key| match key {
            ENV_API_TOKEN => Some("secret_env".to_string()),
            ENV_DATABASE_ID => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(cfg.remote.api_token.as_deref(), Some("secret_env"));
        // Blank override ignored
        assert_eq!(
            cfg.remote.database_id.as_deref(),
            Some("d9824bdc84454327be8b5b47500af6ce")
        );
    }

    // -- Validation --

    #[test]
    fn validate_catches_zero_debounce() {
        let cfg = complete().debounce_ms(0).build();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "sync.debounce_ms"));
    }

    #[test]
    fn validate_catches_bad_log_level() {
        let cfg = complete().logging_level("verbose").build();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "logging.level"));
    }

    #[test]
    fn validate_catches_non_http_base_url() {
        let cfg = complete().base_url("ftp://example.com").build();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "remote.base_url"));
    }

    #[test]
    fn build_validated_ok() {
        assert!(complete().build_validated().is_ok());
    }

    // -- EngineSettings --

    #[test]
    fn engine_settings_fail_fast_without_token() {
        let cfg = ConfigBuilder::new().database_id("db").build();
        assert_eq!(
            EngineSettings::from_config(&cfg),
            Err(ConfigError::ConfigurationMissing("remote.api_token"))
        );
    }

    #[test]
    fn engine_settings_fail_fast_without_database() {
        let cfg = ConfigBuilder::new().api_token("secret").database_id("  ").build();
        assert_eq!(
            EngineSettings::from_config(&cfg),
            Err(ConfigError::ConfigurationMissing("remote.database_id"))
        );
    }

    #[test]
    fn engine_settings_report_other_invalid_fields() {
        let cfg = complete().debounce_ms(0).build();
        assert!(matches!(
            EngineSettings::from_config(&cfg),
            Err(ConfigError::Invalid { ref field, .. }) if field == "sync.debounce_ms"
        ));
    }

    #[test]
    fn engine_settings_resolved() {
        let cfg = complete()
            .base_url("http://localhost:8080/v1/")
            .debounce_ms(750)
            .sync_on_modify(true)
            .build();
        let settings = EngineSettings::from_config(&cfg).unwrap();
        assert_eq!(settings.api_token, "secret_token");
        assert_eq!(settings.base_url, "http://localhost:8080/v1");
        assert_eq!(settings.debounce, Duration::from_millis(750));
        assert!(settings.sync_on_modify);
        assert!(!settings.requeue_on_abort);
    }
}

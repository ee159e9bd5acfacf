use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use offline_queue_core::{CategoryTimeouts, EngineConfig, RetryPolicy};

/// Default endpoint; echoes the request back when reachable.
pub const DEFAULT_ENDPOINT: &str = "https://httpbin.org/post";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Retry forever; overrides `max_retries`
    pub unbounded: bool,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries.unwrap_or_default(),
            unbounded: false,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
        }
    }
}

/// Per-category transport timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub small_ms: u64,
    pub large_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        let timeouts = CategoryTimeouts::default();
        Self {
            small_ms: timeouts.small.as_millis() as u64,
            large_ms: timeouts.large.as_millis() as u64,
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the sync log and pending actions
    pub data_dir: ConfigValue<PathBuf>,
    /// URL actions are POSTed to
    pub endpoint: ConfigValue<String>,
    /// URL probed for reachability (defaults to the endpoint)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_url: Option<String>,
    pub retry: RetrySettings,
    pub timeouts: TimeoutSettings,
    /// Seconds between reachability probes
    pub probe_interval_secs: u64,
    /// Seconds `submit`/`flush` wait for the queue to drain
    pub drain_timeout_secs: u64,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    endpoint: Option<String>,
    health_url: Option<String>,
    retry: Option<RetrySettings>,
    timeouts: Option<TimeoutSettings>,
    probe_interval_secs: Option<u64>,
    drain_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut endpoint = ConfigValue::new(DEFAULT_ENDPOINT.to_string(), ConfigSource::Default);
        let mut health_url = None;
        let mut retry = RetrySettings::default();
        let mut timeouts = TimeoutSettings::default();
        let mut probe_interval_secs = 5;
        let mut drain_timeout_secs = 60;
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(url) = file_config.endpoint {
                endpoint = ConfigValue::new(url, ConfigSource::File);
            }
            if file_config.health_url.is_some() {
                health_url = file_config.health_url;
            }
            if let Some(r) = file_config.retry {
                retry = r;
            }
            if let Some(t) = file_config.timeouts {
                timeouts = t;
            }
            if let Some(secs) = file_config.probe_interval_secs {
                probe_interval_secs = secs;
            }
            if let Some(secs) = file_config.drain_timeout_secs {
                drain_timeout_secs = secs;
            }
        }

        // Apply environment variable overrides
        if let Ok(dir) = std::env::var("OFFQ_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("OFFQ_ENDPOINT") {
            endpoint = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("OFFQ_HEALTH_URL") {
            health_url = Some(url);
        }
        if let Ok(value) = std::env::var("OFFQ_MAX_RETRIES") {
            apply_max_retries(&mut retry, &value)?;
        }

        let config = Self {
            data_dir,
            endpoint,
            health_url,
            retry,
            timeouts,
            probe_interval_secs,
            drain_timeout_secs,
            config_file,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::InvalidValue(
                "retry.base_delay_ms".to_string(),
                format!(
                    "{} exceeds retry.max_delay_ms ({})",
                    self.retry.base_delay_ms, self.retry.max_delay_ms
                ),
            ));
        }
        if self.probe_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "probe_interval_secs".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// URL used for reachability checks
    pub fn health_url(&self) -> &str {
        self.health_url.as_deref().unwrap_or(&self.endpoint.value)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            retry: RetryPolicy::new(
                (!self.retry.unbounded).then_some(self.retry.max_retries),
                Duration::from_millis(self.retry.base_delay_ms),
                Duration::from_millis(self.retry.max_delay_ms),
            ),
            timeouts: CategoryTimeouts {
                small: Duration::from_millis(self.timeouts.small_ms),
                large: Duration::from_millis(self.timeouts.large_ms),
            },
        }
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/offq/
    /// - macOS: ~/Library/Application Support/offq/
    /// - Windows: %APPDATA%/offq/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("offq")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/offq/
    /// - macOS: ~/Library/Application Support/offq/
    /// - Windows: %APPDATA%/offq/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("offq")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

/// Accepts a retry count or `unbounded`.
fn apply_max_retries(retry: &mut RetrySettings, value: &str) -> Result<(), ConfigError> {
    if value.eq_ignore_ascii_case("unbounded") {
        retry.unbounded = true;
        return Ok(());
    }
    retry.max_retries = value.parse().map_err(|e| {
        ConfigError::InvalidValue("OFFQ_MAX_RETRIES".to_string(), format!("{}", e))
    })?;
    retry.unbounded = false;
    Ok(())
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, reason) => {
                write!(f, "Invalid value for '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

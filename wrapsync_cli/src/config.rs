use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use wrapsync_core::{ClientConfig, RetryPolicy};

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RetryConfig {
    pub fetch_max_attempts: u32,
    pub publish_max_attempts: u32,
    /// Base delay between attempts, multiplied by the attempt number
    pub delay_ms: u64,
    /// 0 disables the per-attempt timeout
    pub attempt_timeout_seconds: u64,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct DownloadConfig {
    pub on_failure: FailurePolicy,
}

/// What a download does with a wrapper that cannot be fetched or written
#[derive(
    Deserialize, Serialize, Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole batch
    #[default]
    Abort,
    /// Report the wrapper and continue with the next one
    ///
    /// Covers every per-wrapper failure: fetch exhaustion, an unusable
    /// identifier, and entries that cannot be written safely.
    Skip,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            fetch_max_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            publish_max_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            delay_ms: 0,
            attempt_timeout_seconds: 300,
        }
    }
}

impl RetryConfig {
    pub fn fetch_policy(&self) -> RetryPolicy {
        self.policy(self.fetch_max_attempts)
    }

    pub fn publish_policy(&self) -> RetryPolicy {
        self.policy(self.publish_max_attempts)
    }

    fn policy(&self, max_attempts: u32) -> RetryPolicy {
        let attempt_timeout = (self.attempt_timeout_seconds > 0)
            .then(|| Duration::from_secs(self.attempt_timeout_seconds));

        RetryPolicy::new(max_attempts)
            .with_delay(Duration::from_millis(self.delay_ms))
            .with_attempt_timeout(attempt_timeout)
    }
}

impl AppConfig {
    /// Apply CLI argument overrides to the configuration
    pub fn apply_cli_overrides(&mut self, url: Option<String>, on_failure: Option<FailurePolicy>) {
        if let Some(url) = url {
            self.client.gateway_url = url;
        }
        if let Some(policy) = on_failure {
            self.download.on_failure = policy;
        }
    }
}

/// Configuration manager that handles XDG-compliant paths and layered configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    const ENV_PREFIX: &'static str = "WRAPSYNC_";

    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a ConfigManager with a specific path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }

    fn default_config_path() -> PathBuf {
        // Check for XDG_CONFIG_HOME override first (Linux/macOS)
        #[cfg(not(target_os = "windows"))]
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg_config).join("wrapsync/config.toml");
        }

        #[cfg(target_os = "linux")]
        {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config/wrapsync/config.toml")
        }

        #[cfg(target_os = "macos")]
        {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Library/Application Support/wrapsync/config.toml")
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("wrapsync")
                .join("config.toml")
        }
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    ///
    /// CLI flags are applied on top by the caller.
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new();

        figment = figment.merge(Serialized::defaults(AppConfig::default()));

        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        figment = figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__"));

        figment.extract().context("Failed to load configuration")
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> Result<String> {
        let value = Self::to_toml(&self.load()?)?;
        let mut current = &value;

        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table
                        .get(part)
                        .ok_or_else(|| anyhow::anyhow!("Key '{}' not found", key))?;
                }
                _ => anyhow::bail!("Invalid key path: {}", key),
            }
        }

        match current {
            toml::Value::String(s) => Ok(s.clone()),
            toml::Value::Integer(i) => Ok(i.to_string()),
            toml::Value::Float(f) => Ok(f.to_string()),
            toml::Value::Boolean(b) => Ok(b.to_string()),
            _ => anyhow::bail!("Value at '{}' is not a simple type", key),
        }
    }

    /// List all configuration values, sorted by key
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let value = Self::to_toml(&self.load()?)?;

        let mut items = Vec::new();
        Self::collect_values(&value, String::new(), &mut items);
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(items)
    }

    fn to_toml(config: &AppConfig) -> Result<toml::Value> {
        let toml_string = toml::to_string(config)?;
        Ok(toml::from_str(&toml_string)?)
    }

    /// Recursively collect all key-value pairs from TOML
    fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
        match value {
            toml::Value::Table(table) => {
                for (key, val) in table {
                    let new_prefix = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    Self::collect_values(val, new_prefix, items);
                }
            }
            toml::Value::String(s) => items.push((prefix, s.clone())),
            toml::Value::Integer(i) => items.push((prefix, i.to_string())),
            toml::Value::Float(f) => items.push((prefix, f.to_string())),
            toml::Value::Boolean(b) => items.push((prefix, b.to_string())),
            _ => {}
        }
    }
}

//! Application configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::reporter::{DEFAULT_DISCOVERY_KEY, DEFAULT_ITEM_KEY, ReportTarget};
use crate::scheduler::DEFAULT_INTERVAL;
use crate::zabbix::{DEFAULT_PORT, DEFAULT_TIMEOUT as DEFAULT_SENDER_TIMEOUT};

use super::validation::{ConfigError, expand_env_vars, validate_endpoint};

// =============================================================================
// Constants
// =============================================================================

/// Default queue service request timeout (10 seconds).
pub const DEFAULT_QUEUE_TIMEOUT: Duration = Duration::from_secs(10);

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

// =============================================================================
// Queue Service Configuration
// =============================================================================

/// Queue service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Service endpoint URL (required, e.g. "http://elasticmq:9324").
    pub endpoint: String,

    /// Per-request timeout (default: 10s).
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout: DEFAULT_QUEUE_TIMEOUT,
        }
    }
}

impl QueueConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Zabbix Configuration
// =============================================================================

/// Zabbix server and item configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZabbixConfig {
    /// Zabbix server or proxy host (required).
    pub host: String,

    /// Trapper port (default: 10051).
    pub port: u16,

    /// Host name the items belong to in Zabbix (default: "").
    pub target_host: String,

    /// Low-level discovery rule key (default: "elasticmq.queue.discovery").
    pub discovery_key: String,

    /// Item key prefix (default: "elasticmq.queue").
    pub item_key: String,

    /// Connect + exchange timeout (default: 10s).
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ZabbixConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            target_host: String::new(),
            discovery_key: DEFAULT_DISCOVERY_KEY.to_string(),
            item_key: DEFAULT_ITEM_KEY.to_string(),
            timeout: DEFAULT_SENDER_TIMEOUT,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Queue service configuration.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Zabbix configuration.
    #[serde(default)]
    pub zabbix: ZabbixConfig,

    /// Polling interval (default: 5m).
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            zabbix: ZabbixConfig::default(),
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Values that take precedence over the configuration file.
///
/// `None` leaves the file (or default) value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub queue_endpoint: Option<String>,
    pub zabbix_host: Option<String>,
    pub zabbix_port: Option<u16>,
    pub zabbix_target_host: Option<String>,
    pub discovery_key: Option<String>,
    pub item_key: Option<String>,
    pub interval_secs: Option<u64>,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    /// The result is not validated; apply overrides first, then call
    /// [`validate`](Self::validate).
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&expand_env_vars(&content))?;
        Ok(config)
    }

    /// Apply CLI/env overrides.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(endpoint) = overrides.queue_endpoint {
            self.queue.endpoint = endpoint;
        }
        if let Some(host) = overrides.zabbix_host {
            self.zabbix.host = host;
        }
        if let Some(port) = overrides.zabbix_port {
            self.zabbix.port = port;
        }
        if let Some(target) = overrides.zabbix_target_host {
            self.zabbix.target_host = target;
        }
        if let Some(key) = overrides.discovery_key {
            self.zabbix.discovery_key = key;
        }
        if let Some(key) = overrides.item_key {
            self.zabbix.item_key = key;
        }
        if let Some(secs) = overrides.interval_secs {
            self.interval = Duration::from_secs(secs);
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint(&self.queue.endpoint)?;

        if self.zabbix.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "zabbix host is required (ZABBIX_HOST)".to_string(),
            ));
        }

        if self.zabbix.port == 0 {
            return Err(ConfigError::ValidationError(
                "zabbix port must be non-zero".to_string(),
            ));
        }

        if self.zabbix.discovery_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "zabbix discovery key cannot be empty".to_string(),
            ));
        }

        if self.zabbix.item_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "zabbix item key cannot be empty".to_string(),
            ));
        }

        if self.interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "interval must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Report target derived from the Zabbix settings.
    pub fn report_target(&self) -> ReportTarget {
        ReportTarget::new(&self.zabbix.target_host)
            .with_discovery_key(&self.zabbix.discovery_key)
            .with_item_key(&self.zabbix.item_key)
    }
}

//! Configuration module for queuewatch.
//!
//! Settings come from, in increasing precedence: built-in defaults, an
//! optional YAML file, environment variables, and command-line flags.
//!
//! - Queue service settings (endpoint, request timeout)
//! - Zabbix settings (server, target host, item keys, timeout)
//! - Polling interval

mod app;
mod validation;

pub use app::{AppConfig, ConfigOverrides, QueueConfig, ZabbixConfig};
pub use validation::{ConfigError, expand_env_vars};

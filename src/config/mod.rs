//! Configuration management for the nobat watcher
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. The core components never read either directly;
//! a validated [`Config`] value is passed in at construction time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Polling cadence and look-ahead window
    pub watcher: WatcherConfig,

    /// Booking backend protocol settings
    pub booking: BookingConfig,

    /// Public profile pages of the booking provider
    pub provider: ProviderConfig,

    /// Messaging gateway settings
    pub messaging: MessagingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Sleep between polling cycles, in seconds
    pub poll_interval_secs: u64,

    /// Look-ahead window: how many calendar days ahead of "now" to query
    pub days_ahead: u32,

    /// Worker count for the distributed execution mode
    pub workers: usize,
}

/// Booking backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Base URL of the booking API
    pub base_url: String,

    /// Namespace prefix for generated terminal ids
    pub terminal_prefix: String,

    /// Rate limit (requests per second)
    pub rate_limit: u32,

    /// Per-call timeout in seconds
    pub request_timeout_secs: u64,
}

/// Profile page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL for public profile pages
    pub profile_base: String,

    /// Retry budget for the profile-page fetch (extraction path only;
    /// polling calls are never retried inline)
    pub max_retries: u32,
}

/// Messaging gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Bot gateway endpoint messages are POSTed to
    pub gateway_url: String,

    /// Optional bearer token for the gateway
    pub auth_token: Option<String>,

    /// Pause between deliveries to the same channel, in milliseconds
    pub send_pause_ms: u64,

    /// Per-send timeout in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse::<u64>("NOBAT_POLL_INTERVAL") {
            config.watcher.poll_interval_secs = v;
        }
        if let Some(v) = env_parse::<u32>("NOBAT_DAYS_AHEAD") {
            config.watcher.days_ahead = v;
        }
        if let Some(v) = env_parse::<usize>("NOBAT_WORKERS") {
            config.watcher.workers = v;
        }
        if let Ok(v) = std::env::var("NOBAT_BOOKING_URL") {
            config.booking.base_url = v;
        }
        if let Some(v) = env_parse::<u32>("NOBAT_RATE_LIMIT") {
            config.booking.rate_limit = v;
        }
        if let Some(v) = env_parse::<u64>("NOBAT_REQUEST_TIMEOUT") {
            config.booking.request_timeout_secs = v;
        }
        if let Ok(v) = std::env::var("NOBAT_PROFILE_BASE") {
            config.provider.profile_base = v;
        }
        if let Some(v) = env_parse::<u32>("NOBAT_MAX_RETRIES") {
            config.provider.max_retries = v;
        }
        if let Ok(v) = std::env::var("NOBAT_GATEWAY_URL") {
            config.messaging.gateway_url = v;
        }
        config.messaging.auth_token = std::env::var("NOBAT_GATEWAY_TOKEN").ok();
        if let Some(v) = env_parse::<u64>("NOBAT_SEND_PAUSE_MS") {
            config.messaging.send_pause_ms = v;
        }
        if let Ok(v) = std::env::var("NOBAT_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = std::env::var("NOBAT_LOG_FORMAT") {
            config.logging.format = v;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.watcher.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than 0");
        }

        if self.watcher.days_ahead == 0 {
            anyhow::bail!("days_ahead must be greater than 0");
        }

        if self.watcher.workers == 0 {
            anyhow::bail!("workers must be greater than 0");
        }

        if self.booking.rate_limit == 0 {
            anyhow::bail!("rate_limit must be greater than 0");
        }

        if self.booking.base_url.is_empty() {
            anyhow::bail!("booking base_url cannot be empty");
        }

        if self.provider.profile_base.is_empty() {
            anyhow::bail!("profile_base cannot be empty");
        }

        Ok(())
    }

    /// Get the inter-cycle sleep as a Duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.watcher.poll_interval_secs)
    }

    /// Get the per-call booking timeout as a Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.booking.request_timeout_secs)
    }

    /// Get the inter-message delivery pause as a Duration
    #[must_use]
    pub fn send_pause(&self) -> Duration {
        Duration::from_millis(self.messaging.send_pause_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watcher: WatcherConfig {
                poll_interval_secs: 45,
                days_ahead: 7,
                workers: 4,
            },
            booking: BookingConfig {
                base_url: String::from("https://apigw.paziresh24.com/booking/v2"),
                terminal_prefix: String::from("clinic-"),
                rate_limit: 2,
                request_timeout_secs: 15,
            },
            provider: ProviderConfig {
                profile_base: String::from("https://www.paziresh24.com"),
                max_retries: 3,
            },
            messaging: MessagingConfig {
                gateway_url: String::from("http://localhost:8081/send"),
                auth_token: None,
                send_pause_ms: 350,
                timeout_secs: 10,
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

//! Bot-gateway messaging channel
//!
//! Sends alerts as JSON payloads to a chat-bot gateway endpoint and maps the
//! HTTP response onto the delivery-failure taxonomy. No inline retries:
//! transient failures are naturally retried on the next cycle if the slot
//! condition persists.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{MessagingChannel, SendOutcome};
use crate::config::MessagingConfig;

/// Bot gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotApiConfig {
    /// Gateway URL messages are POSTed to
    pub gateway_url: String,
    /// Optional bearer token
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl BotApiConfig {
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            auth_token: None,
            timeout_secs: 10,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.gateway_url.is_empty() {
            return Err("Gateway URL cannot be empty".to_string());
        }

        if !self.gateway_url.starts_with("http://") && !self.gateway_url.starts_with("https://") {
            return Err("Gateway URL must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl From<&MessagingConfig> for BotApiConfig {
    fn from(config: &MessagingConfig) -> Self {
        Self {
            gateway_url: config.gateway_url.clone(),
            auth_token: config.auth_token.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// HTTP channel talking to a bot gateway
pub struct BotApiChannel {
    config: BotApiConfig,
    client: Client,
}

impl BotApiChannel {
    /// Create a new channel
    pub fn new(config: BotApiConfig) -> Result<Self, String> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

        Ok(Self { config, client })
    }

    /// Create a channel with just a gateway URL
    pub fn from_url(url: impl Into<String>) -> Result<Self, String> {
        Self::new(BotApiConfig::new(url))
    }

    pub fn url(&self) -> &str {
        &self.config.gateway_url
    }

    /// Map an HTTP status onto the delivery taxonomy.
    ///
    /// 403/404/410 mean the recipient is gone or blocked the sender; 429 and
    /// server errors are worth another attempt on a later cycle; remaining
    /// client errors indicate an unusable address.
    fn classify_status(status: StatusCode) -> SendOutcome {
        match status {
            s if s.is_success() => SendOutcome::Delivered,
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::GONE => {
                SendOutcome::Permanent(format!("recipient unreachable ({status})"))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                SendOutcome::Transient("rate limited by gateway".to_string())
            }
            s if s.is_server_error() => SendOutcome::Transient(format!("gateway error ({s})")),
            s => SendOutcome::Permanent(format!("rejected by gateway ({s})")),
        }
    }
}

#[async_trait]
impl MessagingChannel for BotApiChannel {
    fn name(&self) -> &str {
        "bot-api"
    }

    async fn send(&self, chat_id: i64, text: &str) -> SendOutcome {
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let mut request = self.client.post(&self.config.gateway_url).json(&payload);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) => {
                let outcome = Self::classify_status(response.status());
                debug!(chat_id, status = response.status().as_u16(), ?outcome, "delivery attempt");
                outcome
            }
            Err(e) => {
                warn!(chat_id, error = %e, "delivery transport failure");
                if e.is_timeout() {
                    SendOutcome::Transient("timeout".to_string())
                } else {
                    SendOutcome::Transient(e.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(BotApiConfig::new("https://gateway.example/send")
            .validate()
            .is_ok());
        assert!(BotApiConfig::new("").validate().is_err());
        assert!(BotApiConfig::new("gateway.example/send").validate().is_err());
        assert!(BotApiConfig::new("https://gateway.example")
            .with_timeout(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = BotApiConfig::new("https://gateway.example/send")
            .with_auth_token("secret")
            .with_timeout(30);

        assert_eq!(config.gateway_url, "https://gateway.example/send");
        assert_eq!(config.auth_token, Some("secret".to_string()));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_channel_creation() {
        let channel = BotApiChannel::from_url("https://gateway.example/send");
        assert!(channel.is_ok());
        assert_eq!(channel.unwrap().name(), "bot-api");

        assert!(BotApiChannel::from_url("not-a-url").is_err());
    }

    #[test]
    fn test_status_classification() {
        assert!(BotApiChannel::classify_status(StatusCode::OK).is_delivered());
        assert!(BotApiChannel::classify_status(StatusCode::FORBIDDEN).is_permanent());
        assert!(BotApiChannel::classify_status(StatusCode::NOT_FOUND).is_permanent());
        assert!(BotApiChannel::classify_status(StatusCode::GONE).is_permanent());
        assert!(BotApiChannel::classify_status(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(BotApiChannel::classify_status(StatusCode::BAD_GATEWAY).is_transient());
        assert!(BotApiChannel::classify_status(StatusCode::BAD_REQUEST).is_permanent());
    }
}

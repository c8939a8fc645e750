//! Messaging channel capability
//!
//! The fan-out component treats message delivery as a capability interface:
//! the concrete transport (chat platform, gateway, test double) is irrelevant
//! to the core logic. What matters is the three-way outcome classification.

pub mod bot_api;

use async_trait::async_trait;

use crate::utils::error::DeliveryError;

/// Classified result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Message accepted by the transport
    Delivered,
    /// Recipient unreachable or blocked the sender; do not re-attempt
    Permanent(String),
    /// Timeout or rate limit; worth re-attempting on a later cycle
    Transient(String),
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Convert a failed outcome into its error form
    pub fn into_error(self) -> Option<DeliveryError> {
        match self {
            Self::Delivered => None,
            Self::Permanent(reason) => Some(DeliveryError::Permanent(reason)),
            Self::Transient(reason) => Some(DeliveryError::Transient(reason)),
        }
    }
}

/// Trait for message transports
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Deliver one message to one channel address
    async fn send(&self, chat_id: i64, text: &str) -> SendOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        assert!(SendOutcome::Delivered.is_delivered());
        assert!(SendOutcome::Permanent("blocked".into()).is_permanent());
        assert!(SendOutcome::Transient("429".into()).is_transient());
        assert!(!SendOutcome::Delivered.is_permanent());
    }

    #[test]
    fn test_into_error() {
        assert!(SendOutcome::Delivered.into_error().is_none());
        assert!(matches!(
            SendOutcome::Permanent("blocked".into()).into_error(),
            Some(DeliveryError::Permanent(_))
        ));
        assert!(matches!(
            SendOutcome::Transient("timeout".into()).into_error(),
            Some(DeliveryError::Transient(_))
        ));
    }
}

//! Unified error handling for the nobat crate
//!
//! This module provides a unified error type that consolidates all
//! domain-specific errors into a single `Error` enum, while maintaining the
//! ability to use domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`NobatErrorTrait`] - Common interface implemented by the unified type
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::providers::ProviderError;
pub use crate::scheduler::error::SchedulerError;
pub use crate::utils::error::{BookingError, DeliveryError, ExtractError, ExtractFailureReason};

/// Common interface for error handling across module boundaries
pub trait NobatErrorTrait: std::error::Error {
    /// Check if this error is recoverable (worth a later retry)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-level errors (HTTP, timeout)
    Network,
    /// Booking-protocol errors (unexpected response shapes)
    Protocol,
    /// Profile extraction errors
    Extraction,
    /// Message delivery errors
    Delivery,
    /// Scheduler and cycle bookkeeping errors
    Scheduler,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Protocol => "protocol",
            Self::Extraction => "extraction",
            Self::Delivery => "delivery",
            Self::Scheduler => "scheduler",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the nobat crate
#[derive(Error, Debug)]
pub enum Error {
    /// Booking backend errors
    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    /// Profile extraction errors
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Message delivery errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// External store errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// HTTP client errors outside the booking protocol
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl NobatErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Booking(e) => e.is_recoverable(),
            Self::Extract(e) => e.is_recoverable(),
            Self::Delivery(e) => e.is_recoverable(),
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Provider(_) => true,
            Self::Http(_) => true,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Booking(BookingError::Protocol(_)) => ErrorCategory::Protocol,
            Self::Booking(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Extract(_) => ErrorCategory::Extraction,
            Self::Delivery(_) => ErrorCategory::Delivery,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Provider(_) | Self::Io(_) => ErrorCategory::Other,
            Self::Json(_) => ErrorCategory::Protocol,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let timeout = Error::Booking(BookingError::Timeout);
        assert_eq!(timeout.category(), ErrorCategory::Network);

        let shape = Error::Booking(BookingError::Protocol("missing status".into()));
        assert_eq!(shape.category(), ErrorCategory::Protocol);

        let extract = Error::Extract(ExtractError::NotFound);
        assert_eq!(extract.category(), ErrorCategory::Extraction);
    }

    #[test]
    fn test_is_recoverable() {
        let timeout = Error::Booking(BookingError::Timeout);
        assert!(timeout.is_recoverable());

        let invalid = Error::Extract(ExtractError::InvalidUrl("::".into()));
        assert!(!invalid.is_recoverable());

        let transient = Error::Delivery(DeliveryError::Transient("rate limit".into()));
        assert!(transient.is_recoverable());
    }

    #[test]
    fn test_error_conversion() {
        let booking: Error = BookingError::Timeout.into();
        assert!(matches!(booking, Error::Booking(_)));

        let delivery: Error = DeliveryError::Permanent("blocked".into()).into();
        assert!(matches!(delivery, Error::Delivery(_)));
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("poll interval must be positive");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(ErrorCategory::Network.as_str(), "network");
        assert_eq!(ErrorCategory::Delivery.as_str(), "delivery");
    }
}

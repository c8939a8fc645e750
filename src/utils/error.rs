//! Error types for the nobat watcher
//!
//! This module defines custom error types used throughout the application.

use thiserror::Error;

/// Errors that can occur while talking to the booking backend
#[derive(Error, Debug)]
pub enum BookingError {
    /// Transport failure (connection refused, DNS, TLS)
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Unexpected response shape from the backend
    #[error("Unexpected response shape: {0}")]
    Protocol(String),

    /// Identifiers are missing or placeholders
    #[error("Unusable identifiers: {0}")]
    InvalidIdentifiers(String),

    /// Hold request rejected by the backend
    #[error("Hold rejected by backend (status {0})")]
    HoldRejected(u16),
}

impl BookingError {
    /// Transport-level failures are retried implicitly on the next cycle;
    /// everything else is a per-unit skip.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

/// Structured reason for a failed profile extraction, so the caller can
/// present an actionable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractFailureReason {
    /// Malformed input URL or foreign host
    InvalidInput,
    /// Network-level failure fetching the page
    Network,
    /// Profile does not exist
    NotFound,
    /// Page fetched but its shape was not recognized at all
    UnrecognizedPage,
}

/// Errors that can occur during profile extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Input could not be normalized into a profile URL
    #[error("Invalid profile URL: {0}")]
    InvalidUrl(String),

    /// Host does not belong to the booking provider
    #[error("Host not recognized: {0}")]
    WrongHost(String),

    /// Network failure fetching the profile page
    #[error("Network failure fetching profile: {0}")]
    Network(String),

    /// Profile page not found (404)
    #[error("Profile page not found")]
    NotFound,

    /// Page fetched but no known shape matched
    #[error("Page shape not recognized")]
    UnrecognizedPage,
}

impl ExtractError {
    /// Classify into the user-facing failure taxonomy
    pub fn reason(&self) -> ExtractFailureReason {
        match self {
            Self::InvalidUrl(_) | Self::WrongHost(_) => ExtractFailureReason::InvalidInput,
            Self::Network(_) => ExtractFailureReason::Network,
            Self::NotFound => ExtractFailureReason::NotFound,
            Self::UnrecognizedPage => ExtractFailureReason::UnrecognizedPage,
        }
    }

    /// Only network failures are worth a second attempt within one extraction
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Delivery failure classification for the notification fan-out
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Recipient unreachable or blocked the sender; the subscription is
    /// flipped inactive and not re-attempted
    #[error("Permanent delivery failure: {0}")]
    Permanent(String),

    /// Timeout or rate limit; naturally retried next cycle if slots persist
    #[error("Transient delivery failure: {0}")]
    Transient(String),
}

impl DeliveryError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

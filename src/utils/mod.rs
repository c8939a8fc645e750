//! Common utilities and helpers

pub mod error;
pub mod retry;

pub use error::{BookingError, DeliveryError, ExtractError, ExtractFailureReason};
pub use retry::{with_retry_if, RetryConfig};

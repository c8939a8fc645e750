//! Scheduler error types

use thiserror::Error;

/// Result type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors raised by the monitoring scheduler itself.
///
/// Per-unit booking failures never surface here; they are recorded in the
/// cycle report and iteration continues.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The catalog provider could not produce a snapshot
    #[error("Catalog unavailable: {0}")]
    Catalog(String),

    /// A worker task ended without reporting back
    #[error("Worker pool failure: {0}")]
    WorkerPool(String),

    /// Invalid scheduler configuration
    #[error("Invalid scheduler configuration: {0}")]
    Config(String),
}

impl SchedulerError {
    /// Catalog hiccups are retried on the next tick; the rest are not
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Catalog(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(SchedulerError::Catalog("down".into()).is_recoverable());
        assert!(!SchedulerError::Config("workers=0".into()).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = SchedulerError::WorkerPool("worker 2 dropped".into());
        assert!(err.to_string().contains("worker 2 dropped"));
    }
}

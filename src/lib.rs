//! nobat - Appointment-slot watcher for medical booking pages
//!
//! Watches third-party medical-appointment booking pages for newly opened
//! time slots and pushes alerts to subscribed end users.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`booking`] - Protocol client for the undocumented booking backend
//! - [`extractor`] - Profile URL → identifier bundle extraction
//! - [`scheduler`] - Polling cadence, per-doctor aggregation, cycle reports
//! - [`notify`] - Notification fan-out with delivery-failure classification
//! - [`models`] - Core data structures and types
//! - [`providers`] - External collaborator interfaces (catalog, subscribers, audit)
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use nobat::config::Config;
//! use nobat::extractor::ProfileExtractor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let extractor = ProfileExtractor::new(&config.provider)?;
//!     let bundle = extractor.extract("https://www.paziresh24.com/dr/some-doctor/").await?;
//!     println!("{} ({})", bundle.doctor.name, bundle.doctor.id);
//!     Ok(())
//! }
//! ```

pub mod booking;
pub mod config;
pub mod error;
pub mod extractor;
pub mod models;
pub mod notify;
pub mod providers;
pub mod scheduler;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::booking::{BookingClient, TerminalId};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, NobatErrorTrait, Result};
    pub use crate::extractor::{ProfileBundle, ProfileExtractor};
    pub use crate::models::{AppointmentSlot, Center, Doctor, Service, Subscriber};
    pub use crate::notify::{NotificationFanout, SendOutcome};
    pub use crate::scheduler::{CycleReport, DistributedMonitor, Monitor};
}

// Direct re-exports for convenience
pub use models::{AppointmentSlot, Center, Doctor, Service};

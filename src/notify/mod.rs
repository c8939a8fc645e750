//! Notification fan-out for discovery results
//!
//! Given a non-empty discovery result for one doctor, resolve the doctor's
//! active subscribers and deliver one alert each, classifying every outcome:
//!
//! - **Delivered**: counted, no state change
//! - **Permanent failure**: deactivation requested immediately; later
//!   cycles skip the subscriber without re-attempting
//! - **Transient failure**: counted for this cycle only; retried naturally
//!   on the next cycle if the slot condition persists
//!
//! Delivery loss on transient transport failure is accepted; nothing is
//! retried within the same cycle. After each pass one aggregate record goes
//! to the audit sink.

pub mod channels;
pub mod fanout;
pub mod message;

pub use channels::bot_api::{BotApiChannel, BotApiConfig};
pub use channels::{MessagingChannel, SendOutcome};
pub use fanout::{DeliveryReport, NotificationFanout};

//! Booking backend protocol client
//!
//! Stateless per-call wrapper around the multi-step booking protocol:
//! day discovery, per-day slot discovery, and the best-effort hold/release
//! pair used by diagnostic self-checks.
//!
//! # Protocol shape
//!
//! ```text
//! getFreeDays(center, service, terminal)   -> [day timestamps]
//!     │  filter: now <= day < now + days_ahead
//!     ▼
//! getFreeTurns(center, service, terminal, day) -> [slots]   (per day)
//!
//! suspend(center, service, slot)           -> request_code  (diagnostic)
//! unsuspend(center, request_code)
//! ```
//!
//! Failure semantics: non-success HTTP statuses and body-level "no data"
//! flags yield empty results; transport failures abort only the current
//! (doctor, center, service) unit and are retried implicitly next cycle.

pub mod client;
pub mod headers;
pub mod terminal;

pub use client::{filter_days, BookingClient, ReservationToken};
pub use terminal::TerminalId;

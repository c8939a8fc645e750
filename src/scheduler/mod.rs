//! Monitoring scheduler
//!
//! Owns the polling cadence: for each active doctor, walk its centers and
//! services, invoke the booking protocol client, aggregate results, and hand
//! non-empty discoveries to the notification fan-out.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Catalog snapshot                  │
//! └─────────────────────────┬───────────────────────────┘
//!                           │ once per cycle
//!           ┌───────────────┴───────────────┐
//!           ▼                               ▼
//!  ┌─────────────────┐          ┌─────────────────────┐
//!  │     Monitor     │          │  DistributedMonitor │
//!  │ (one worker,    │          │ (coordinator + pool │
//!  │  sequential)    │          │  of per-doctor      │
//!  │                 │          │  work items)        │
//!  └────────┬────────┘          └──────────┬──────────┘
//!           │        same CycleReport      │
//!           └───────────────┬──────────────┘
//!                           ▼
//!                  NOTIFY_IF_NONEMPTY
//! ```
//!
//! Two invariants both modes uphold: no de-duplication across cycles (a slot
//! still open on the next cycle re-notifies), and no global abort (a unit's
//! failure is recorded in the report and iteration continues).
//!
//! # Modules
//!
//! - [`monitor`] - Cooperative single-process loop
//! - [`distributed`] - Coordinator/worker-pool execution mode
//! - [`report`] - Cycle report structures shared by both modes
//! - [`error`] - Scheduler error types

pub mod distributed;
pub mod error;
pub mod monitor;
pub mod report;

pub use distributed::{DistributedConfig, DistributedMonitor, WorkItem};
pub use error::{SchedulerError, SchedulerResult};
pub use monitor::{shutdown_channel, Monitor};
pub use report::{CycleReport, DoctorReport, UnitOutcome, UnitStatus};

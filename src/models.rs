// Core data structures for the nobat watcher

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Prefix marking identifiers derived by the placeholder fallback.
///
/// Placeholder identifiers are never accepted by the booking protocol client;
/// any layer can recognize them with [`is_placeholder_id`].
pub const PLACEHOLDER_PREFIX: &str = "ph-";

/// Check whether an opaque identifier is a placeholder (or empty).
pub fn is_placeholder_id(id: &str) -> bool {
    id.is_empty() || id.starts_with(PLACEHOLDER_PREFIX)
}

/// A monitored doctor with the centers and services discovered for them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    /// Provider-assigned numeric id
    pub id: i64,
    /// Display name (may contain Persian text)
    pub name: String,
    /// Canonical profile slug, percent-decoded
    pub slug: String,
    /// Specialty text, empty when extraction could not resolve it
    #[serde(default)]
    pub specialty: String,
    /// Inactive doctors are excluded from polling
    pub active: bool,
    /// Last time a polling cycle touched this doctor
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Centers this doctor practices at (1..N)
    pub centers: Vec<Center>,
}

impl Doctor {
    /// Canonical public profile URL for this doctor
    pub fn profile_url(&self, base: &str) -> String {
        format!("{}/dr/{}/", base.trim_end_matches('/'), self.slug)
    }

    /// Iterate (center, service) units in fixed enumeration order,
    /// skipping services without usable identifiers.
    pub fn pollable_units(&self) -> impl Iterator<Item = (&Center, &Service)> {
        self.centers.iter().flat_map(|center| {
            center
                .services
                .iter()
                .filter(|s| s.is_pollable())
                .map(move |service| (center, service))
        })
    }

    /// True when at least one (center, service) unit can be polled
    pub fn is_pollable(&self) -> bool {
        self.pollable_units().next().is_some()
    }
}

/// A practice location belonging to exactly one doctor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Center {
    /// Opaque center identifier used by the booking backend
    pub center_id: String,
    /// Opaque user-center binding identifier
    pub user_center_id: String,
    /// Display name
    pub name: String,
    /// Street address, may be empty
    #[serde(default)]
    pub address: String,
    /// Phone number, may be empty
    #[serde(default)]
    pub phone: String,
    /// Bookable services at this center (1..N)
    pub services: Vec<Service>,
}

impl Center {
    /// True when the center identifiers are real (not placeholders)
    pub fn has_usable_ids(&self) -> bool {
        !is_placeholder_id(&self.center_id) && !is_placeholder_id(&self.user_center_id)
    }
}

/// A bookable service belonging to exactly one center
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Opaque service identifier used by the booking backend
    pub service_id: String,
    /// Optional display label
    #[serde(default)]
    pub name: Option<String>,
}

impl Service {
    /// A service with placeholder or missing identifiers is excluded from polling
    pub fn is_pollable(&self) -> bool {
        !is_placeholder_id(&self.service_id)
    }
}

/// One open appointment slot as reported by the booking backend.
///
/// Ephemeral: slots are never persisted individually, only the per-cycle
/// aggregate ([`AppointmentLog`]) is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSlot {
    /// Slot start, Unix seconds
    pub from_time: i64,
    /// Slot end, Unix seconds
    pub to_time: i64,
    /// Position within the workhour
    pub turn_number: u32,
}

impl AppointmentSlot {
    /// Slot start as a UTC timestamp
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.from_time, 0)
    }

    /// Slot length in seconds
    pub fn duration_secs(&self) -> i64 {
        self.to_time - self.from_time
    }
}

/// Per-cycle audit aggregate for one doctor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentLog {
    pub doctor_id: i64,
    /// Calendar day the cycle ran on
    pub date: NaiveDate,
    /// Open slots observed across all units
    pub slot_count: usize,
    /// Subscribers successfully notified
    pub notified_count: usize,
    pub created_at: DateTime<Utc>,
}

impl AppointmentLog {
    pub fn new(doctor_id: i64, slot_count: usize, notified_count: usize) -> Self {
        let now = Utc::now();
        Self {
            doctor_id,
            date: now.date_naive(),
            slot_count,
            notified_count,
            created_at: now,
        }
    }
}

/// An end user known to the messaging side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// External numeric identity
    pub id: i64,
    pub display_name: String,
    /// Flipped by delivery-failure classification, never by the user
    pub active: bool,
}

/// The (user, doctor) subscription edge.
///
/// Invariant: at most one row per (user, doctor) is ever logically active.
/// Re-subscribing toggles `active` back on instead of inserting a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: i64,
    pub doctor_id: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(user_id: i64, doctor_id: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            doctor_id,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Toggle the subscription back on (reactivation, not duplication)
    pub fn reactivate(&mut self) {
        self.active = true;
        self.updated_at = Utc::now();
    }

    /// Flip the subscription off, typically after a permanent delivery failure
    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }
}

/// A resolved delivery target: one active subscriber of one doctor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub user_id: i64,
    /// Messaging channel address
    pub chat_id: i64,
    pub display_name: String,
}

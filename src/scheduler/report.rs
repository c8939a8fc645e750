//! Cycle report structures
//!
//! Both execution modes (cooperative loop and distributed fan-out) produce
//! the same [`CycleReport`] shape, so the notification side stays
//! mode-agnostic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of polling one (center, service) unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Unit polled successfully
    Ok { slot_count: usize },
    /// Unit skipped for this cycle
    Failed { reason: String },
}

impl UnitStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// One (center, service) unit tagged with its outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub center_id: String,
    pub service_id: String,
    pub status: UnitStatus,
}

/// Aggregated per-doctor result for one cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorReport {
    pub doctor_id: i64,
    /// Open slots aggregated across all units
    pub slot_count: usize,
    /// Subscribers successfully notified (0 when fan-out was not invoked)
    pub notified_count: usize,
    pub units: Vec<UnitOutcome>,
}

impl DoctorReport {
    pub fn new(doctor_id: i64) -> Self {
        Self {
            doctor_id,
            slot_count: 0,
            notified_count: 0,
            units: Vec::new(),
        }
    }

    pub fn record_ok(&mut self, center_id: &str, service_id: &str, slot_count: usize) {
        self.slot_count += slot_count;
        self.units.push(UnitOutcome {
            center_id: center_id.to_string(),
            service_id: service_id.to_string(),
            status: UnitStatus::Ok { slot_count },
        });
    }

    pub fn record_failure(&mut self, center_id: &str, service_id: &str, reason: String) {
        self.units.push(UnitOutcome {
            center_id: center_id.to_string(),
            service_id: service_id.to_string(),
            status: UnitStatus::Failed { reason },
        });
    }

    /// Every unit failed (vacuously false for a doctor with no units)
    pub fn all_units_failed(&self) -> bool {
        !self.units.is_empty() && self.units.iter().all(|u| !u.status.is_ok())
    }

    pub fn failed_units(&self) -> usize {
        self.units.iter().filter(|u| !u.status.is_ok()).count()
    }
}

/// Full result of one polling cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Doctor id → aggregated result
    pub doctors: HashMap<i64, DoctorReport>,
}

impl CycleReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            doctors: HashMap::new(),
        }
    }

    pub fn insert(&mut self, report: DoctorReport) {
        self.doctors.insert(report.doctor_id, report);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Aggregated slot count for one doctor
    pub fn slot_count(&self, doctor_id: i64) -> Option<usize> {
        self.doctors.get(&doctor_id).map(|r| r.slot_count)
    }

    pub fn total_slots(&self) -> usize {
        self.doctors.values().map(|r| r.slot_count).sum()
    }

    pub fn total_failed_units(&self) -> usize {
        self.doctors.values().map(|r| r.failed_units()).sum()
    }

    /// One-line summary for the cycle log
    pub fn summary(&self) -> String {
        format!(
            "{} doctors, {} open slots, {} failed units",
            self.doctors.len(),
            self.total_slots(),
            self.total_failed_units(),
        )
    }
}

impl Default for CycleReport {
    fn default() -> Self {
        Self::new()
    }
}

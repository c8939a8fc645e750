//! External collaborator interfaces
//!
//! The catalog (doctor/center/service tree) and the subscription table are
//! owned by an external persistence layer; the core only reads the catalog
//! and issues deactivation requests. These traits keep the polling and
//! notification logic storage-agnostic, and the in-memory implementations
//! below back both the CLI's watch-list mode and the test suites.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::models::{AppointmentLog, Doctor, Subscriber, Subscription, User};

/// Errors surfaced by external stores
#[derive(Error, Debug)]
#[error("store error: {0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Read-only view of the monitored doctor/center/service catalog.
///
/// The snapshot is taken once per polling cycle.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// List doctors flagged active, with their centers and services
    async fn list_active_doctors(&self) -> Result<Vec<Doctor>, ProviderError>;
}

/// Subscription store, reached only through reads and deactivation requests
#[async_trait]
pub trait SubscriberProvider: Send + Sync {
    /// Resolve the active subscribers of one doctor
    async fn list_active_subscribers(&self, doctor_id: i64)
        -> Result<Vec<Subscriber>, ProviderError>;

    /// Request that a (user, doctor) subscription be flipped inactive
    async fn deactivate_subscription(&self, user_id: i64, doctor_id: i64)
        -> Result<(), ProviderError>;
}

/// Append-only sink for per-cycle audit aggregates
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append_cycle_record(&self, record: AppointmentLog) -> Result<(), ProviderError>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// In-memory catalog snapshot
#[derive(Default)]
pub struct MemoryCatalog {
    doctors: RwLock<Vec<Doctor>>,
}

impl MemoryCatalog {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self {
            doctors: RwLock::new(doctors),
        }
    }

    pub async fn push(&self, doctor: Doctor) {
        self.doctors.write().await.push(doctor);
    }
}

#[async_trait]
impl CatalogProvider for MemoryCatalog {
    async fn list_active_doctors(&self) -> Result<Vec<Doctor>, ProviderError> {
        Ok(self
            .doctors
            .read()
            .await
            .iter()
            .filter(|d| d.active)
            .cloned()
            .collect())
    }
}

/// In-memory subscriber store.
///
/// Enforces the subscription-uniqueness invariant: at most one row per
/// (user, doctor), reactivation toggles the existing row.
#[derive(Default)]
pub struct MemorySubscriberStore {
    users: RwLock<HashMap<i64, User>>,
    chats: RwLock<HashMap<i64, i64>>,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl MemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with their messaging address
    pub async fn add_user(&self, user: User, chat_id: i64) {
        self.chats.write().await.insert(user.id, chat_id);
        self.users.write().await.insert(user.id, user);
    }

    /// Subscribe a user to a doctor.
    ///
    /// Subscribing while already active is a no-op; re-subscribing after a
    /// deactivation toggles the existing row back on. No duplicate rows.
    pub async fn subscribe(&self, user_id: i64, doctor_id: i64) {
        let mut subscriptions = self.subscriptions.write().await;
        match subscriptions
            .iter_mut()
            .find(|s| s.user_id == user_id && s.doctor_id == doctor_id)
        {
            Some(existing) => {
                if !existing.active {
                    existing.reactivate();
                }
            }
            None => subscriptions.push(Subscription::new(user_id, doctor_id)),
        }
    }

    /// Number of subscription rows for one (user, doctor) pair
    pub async fn row_count(&self, user_id: i64, doctor_id: i64) -> usize {
        self.subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.user_id == user_id && s.doctor_id == doctor_id)
            .count()
    }

    /// Whether a (user, doctor) subscription is currently active
    pub async fn is_active(&self, user_id: i64, doctor_id: i64) -> bool {
        self.subscriptions
            .read()
            .await
            .iter()
            .any(|s| s.user_id == user_id && s.doctor_id == doctor_id && s.active)
    }
}

#[async_trait]
impl SubscriberProvider for MemorySubscriberStore {
    async fn list_active_subscribers(
        &self,
        doctor_id: i64,
    ) -> Result<Vec<Subscriber>, ProviderError> {
        let subscriptions = self.subscriptions.read().await;
        let users = self.users.read().await;
        let chats = self.chats.read().await;

        Ok(subscriptions
            .iter()
            .filter(|s| s.doctor_id == doctor_id && s.active)
            .filter_map(|s| {
                let user = users.get(&s.user_id).filter(|u| u.active)?;
                let chat_id = *chats.get(&s.user_id)?;
                Some(Subscriber {
                    user_id: user.id,
                    chat_id,
                    display_name: user.display_name.clone(),
                })
            })
            .collect())
    }

    async fn deactivate_subscription(
        &self,
        user_id: i64,
        doctor_id: i64,
    ) -> Result<(), ProviderError> {
        let mut subscriptions = self.subscriptions.write().await;
        let row = subscriptions
            .iter_mut()
            .find(|s| s.user_id == user_id && s.doctor_id == doctor_id)
            .ok_or_else(|| {
                ProviderError::new(format!("no subscription ({user_id}, {doctor_id})"))
            })?;
        row.deactivate();
        Ok(())
    }
}

/// In-memory audit log
#[derive(Default)]
pub struct MemoryAudit {
    records: RwLock<Vec<AppointmentLog>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<AppointmentLog> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAudit {
    async fn append_cycle_record(&self, record: AppointmentLog) -> Result<(), ProviderError> {
        self.records.write().await.push(record);
        Ok(())
    }
}

/// Audit sink that only emits structured log lines
pub struct LogAudit;

#[async_trait]
impl AuditSink for LogAudit {
    async fn append_cycle_record(&self, record: AppointmentLog) -> Result<(), ProviderError> {
        info!(
            doctor_id = record.doctor_id,
            slot_count = record.slot_count,
            notified_count = record.notified_count,
            date = %record.date,
            "cycle record"
        );
        Ok(())
    }
}

//! Notification fan-out
//!
//! One-to-many delivery from a single discovery event to every active
//! subscriber of the doctor. Outcomes are classified per subscriber:
//! permanent failures trigger an immediate deactivation request, transient
//! failures count against this cycle only and are naturally retried next
//! cycle if the slot condition persists. An inter-message pause backpressures
//! toward the transport's rate limits.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::channels::MessagingChannel;
use super::message;
use crate::models::{AppointmentLog, AppointmentSlot, Doctor, Subscriber};
use crate::providers::{AuditSink, SubscriberProvider};

/// Outcome of one fan-out pass for one doctor
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub doctor_id: i64,
    /// Subscribers a delivery was attempted for
    pub attempted: usize,
    /// Successful deliveries
    pub delivered: usize,
    /// Transient failures (no state change)
    pub transient_failures: usize,
    /// User ids whose subscription was flipped inactive
    pub deactivated: Vec<i64>,
    pub completed_at: DateTime<Utc>,
}

impl DeliveryReport {
    fn new(doctor_id: i64) -> Self {
        Self {
            doctor_id,
            attempted: 0,
            delivered: 0,
            transient_failures: 0,
            deactivated: Vec::new(),
            completed_at: Utc::now(),
        }
    }
}

/// Fan-out component wired to its external collaborators
pub struct NotificationFanout {
    subscribers: Arc<dyn SubscriberProvider>,
    channel: Arc<dyn MessagingChannel>,
    audit: Arc<dyn AuditSink>,
    profile_base: String,
    pause: Duration,
}

impl NotificationFanout {
    pub fn new(
        subscribers: Arc<dyn SubscriberProvider>,
        channel: Arc<dyn MessagingChannel>,
        audit: Arc<dyn AuditSink>,
        profile_base: impl Into<String>,
        pause: Duration,
    ) -> Self {
        Self {
            subscribers,
            channel,
            audit,
            profile_base: profile_base.into(),
            pause,
        }
    }

    /// Resolve the doctor's active subscribers at invocation time and run one
    /// delivery pass.
    pub async fn notify(&self, doctor: &Doctor, slots: &[AppointmentSlot]) -> DeliveryReport {
        let subscribers = match self.subscribers.list_active_subscribers(doctor.id).await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                warn!(doctor_id = doctor.id, error = %e, "subscriber resolution failed");
                Vec::new()
            }
        };

        self.deliver(doctor, slots, &subscribers).await
    }

    /// Deliver to an explicit subscriber set, classify outcomes, and append
    /// the audit aggregate.
    pub async fn deliver(
        &self,
        doctor: &Doctor,
        slots: &[AppointmentSlot],
        subscribers: &[Subscriber],
    ) -> DeliveryReport {
        let mut report = DeliveryReport::new(doctor.id);
        let text = message::slot_alert(doctor, slots, &self.profile_base);

        for (index, subscriber) in subscribers.iter().enumerate() {
            if index > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            report.attempted += 1;
            let outcome = self.channel.send(subscriber.chat_id, &text).await;

            match outcome {
                super::channels::SendOutcome::Delivered => {
                    report.delivered += 1;
                }
                super::channels::SendOutcome::Permanent(reason) => {
                    info!(
                        doctor_id = doctor.id,
                        user_id = subscriber.user_id,
                        reason,
                        "permanent delivery failure, requesting deactivation"
                    );
                    if let Err(e) = self
                        .subscribers
                        .deactivate_subscription(subscriber.user_id, doctor.id)
                        .await
                    {
                        warn!(
                            user_id = subscriber.user_id,
                            doctor_id = doctor.id,
                            error = %e,
                            "deactivation request failed"
                        );
                    }
                    report.deactivated.push(subscriber.user_id);
                }
                super::channels::SendOutcome::Transient(reason) => {
                    warn!(
                        doctor_id = doctor.id,
                        user_id = subscriber.user_id,
                        reason,
                        "transient delivery failure, will retry next cycle if slots persist"
                    );
                    report.transient_failures += 1;
                }
            }
        }

        report.completed_at = Utc::now();

        let record = AppointmentLog::new(doctor.id, slots.len(), report.delivered);
        if let Err(e) = self.audit.append_cycle_record(record).await {
            warn!(doctor_id = doctor.id, error = %e, "audit append failed");
        }

        info!(
            doctor_id = doctor.id,
            slots = slots.len(),
            attempted = report.attempted,
            delivered = report.delivered,
            deactivated = report.deactivated.len(),
            "fan-out pass complete"
        );

        report
    }
}

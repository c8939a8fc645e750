//! Cooperative single-process monitoring loop
//!
//! One logical worker walks every active doctor sequentially per cycle:
//!
//! ```text
//! IDLE → FOR_EACH_DOCTOR → FOR_EACH_CENTER_SERVICE → AGGREGATE
//!      → NOTIFY_IF_NONEMPTY → IDLE(sleep)
//! ```
//!
//! A single unit's failure never aborts the cycle; iteration continues with
//! the next (center, service) or the next doctor. The stop signal is only
//! checked between units, never mid-HTTP-call.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::{SchedulerError, SchedulerResult};
use super::report::{CycleReport, DoctorReport};
use crate::booking::{filter_days, BookingClient};
use crate::config::WatcherConfig;
use crate::models::{AppointmentSlot, Center, Doctor, Service};
use crate::notify::NotificationFanout;
use crate::providers::CatalogProvider;
use crate::utils::error::BookingError;

/// Create a cooperative stop signal pair.
///
/// Flip the sender to `true` to request a stop; the monitor checks the
/// receiver between units.
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

fn stop_requested(stop: Option<&watch::Receiver<bool>>) -> bool {
    stop.map(|s| *s.borrow()).unwrap_or(false)
}

/// The monitoring scheduler in cooperative single-process mode
pub struct Monitor {
    client: Arc<BookingClient>,
    fanout: Arc<NotificationFanout>,
    catalog: Arc<dyn CatalogProvider>,
    poll_interval: Duration,
    days_ahead: u32,
}

impl Monitor {
    pub fn new(
        client: Arc<BookingClient>,
        fanout: Arc<NotificationFanout>,
        catalog: Arc<dyn CatalogProvider>,
        watcher: &WatcherConfig,
    ) -> Self {
        Self {
            client,
            fanout,
            catalog,
            poll_interval: Duration::from_secs(watcher.poll_interval_secs),
            days_ahead: watcher.days_ahead,
        }
    }

    /// Run cycles until the stop signal flips.
    ///
    /// An empty active-doctor set is a no-op cycle, not an error; a failed
    /// catalog snapshot is logged and retried on the next tick.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            days_ahead = self.days_ahead,
            "monitor loop starting"
        );

        loop {
            if *stop.borrow() {
                break;
            }

            match self.snapshot().await {
                Ok(doctors) => {
                    let report = self.run_cycle_with_stop(&doctors, Some(&stop)).await;
                    info!(summary = %report.summary(), "cycle complete");
                }
                Err(e) => {
                    warn!(error = %e, "catalog snapshot failed, skipping cycle");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = stop.changed() => {}
            }
        }

        info!("monitor loop stopped");
    }

    /// Take the per-cycle catalog snapshot
    pub async fn snapshot(&self) -> SchedulerResult<Vec<Doctor>> {
        self.catalog
            .list_active_doctors()
            .await
            .map_err(|e| SchedulerError::Catalog(e.to_string()))
    }

    /// Run one full cycle over a catalog snapshot
    pub async fn run_cycle(&self, catalog: &[Doctor]) -> CycleReport {
        self.run_cycle_with_stop(catalog, None).await
    }

    /// Run one cycle, checking the stop signal between units
    pub async fn run_cycle_with_stop(
        &self,
        catalog: &[Doctor],
        stop: Option<&watch::Receiver<bool>>,
    ) -> CycleReport {
        let mut cycle = CycleReport::new();

        for doctor in catalog {
            if stop_requested(stop) {
                debug!("stop requested, abandoning cycle");
                break;
            }
            cycle.insert(self.process_doctor(doctor, stop).await);
        }

        cycle.finish();
        cycle
    }

    /// The per-doctor body shared by both execution modes: poll every unit,
    /// aggregate, and invoke fan-out exactly once when the result is
    /// non-empty.
    pub async fn process_doctor(
        &self,
        doctor: &Doctor,
        stop: Option<&watch::Receiver<bool>>,
    ) -> DoctorReport {
        let (mut report, slots) = self.check_doctor(doctor, stop).await;

        if !slots.is_empty() {
            let delivery = self.fanout.notify(doctor, &slots).await;
            report.notified_count = delivery.delivered;
        }

        report
    }

    /// Poll every (center, service) unit of one doctor and aggregate slots.
    ///
    /// Per-unit failures are recorded and logged, never raised.
    async fn check_doctor(
        &self,
        doctor: &Doctor,
        stop: Option<&watch::Receiver<bool>>,
    ) -> (DoctorReport, Vec<AppointmentSlot>) {
        let mut report = DoctorReport::new(doctor.id);
        let mut slots = Vec::new();

        debug!(doctor_id = doctor.id, slug = %doctor.slug, "checking doctor");

        'centers: for center in &doctor.centers {
            // One fresh terminal id per call burst against a center
            let terminal = self.client.new_terminal();

            for service in center.services.iter().filter(|s| s.is_pollable()) {
                if stop_requested(stop) {
                    break 'centers;
                }

                match self.check_unit(center, service, &terminal).await {
                    Ok(unit_slots) => {
                        report.record_ok(&center.center_id, &service.service_id, unit_slots.len());
                        slots.extend(unit_slots);
                    }
                    Err(e) => {
                        warn!(
                            doctor_id = doctor.id,
                            center_id = %center.center_id,
                            service_id = %service.service_id,
                            error = %e,
                            "unit skipped for this cycle"
                        );
                        report.record_failure(
                            &center.center_id,
                            &service.service_id,
                            e.to_string(),
                        );
                    }
                }
            }
        }

        (report, slots)
    }

    /// Poll one unit: day discovery, look-ahead filter, then per-day slot
    /// queries in chronological order.
    async fn check_unit(
        &self,
        center: &Center,
        service: &Service,
        terminal: &crate::booking::TerminalId,
    ) -> Result<Vec<AppointmentSlot>, BookingError> {
        let days = self
            .client
            .list_open_days(center, service, terminal)
            .await?;

        let now = Utc::now().timestamp();
        let days = filter_days(days, now, self.days_ahead);

        let mut slots = Vec::new();
        for day in days {
            slots.extend(
                self.client
                    .list_slots_for_day(center, service, terminal, day)
                    .await?,
            );
        }

        Ok(slots)
    }
}

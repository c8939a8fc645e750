//! Distributed fan-out execution mode
//!
//! A coordinator enumerates the active doctors and emits one independent
//! work item per doctor onto a bounded queue; a worker pool runs the same
//! per-doctor body as the cooperative loop. Both modes produce the same
//! [`CycleReport`] shape, so the notification side cannot tell them apart.
//!
//! Cancellation is per-work-item: a worker checks the stop signal before
//! picking up the next item, never mid-HTTP-call.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{SchedulerError, SchedulerResult};
use super::monitor::Monitor;
use super::report::{CycleReport, DoctorReport};
use crate::models::Doctor;
use crate::providers::CatalogProvider;

/// Distributed-mode settings
#[derive(Debug, Clone)]
pub struct DistributedConfig {
    /// Worker task count
    pub workers: usize,
    /// Bound of the work-item queue
    pub queue_depth: usize,
}

impl Default for DistributedConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_depth: 64,
        }
    }
}

/// One independent unit of work: a single doctor's full check
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: Uuid,
    pub doctor: Doctor,
    pub enqueued_at: DateTime<Utc>,
}

impl WorkItem {
    fn new(doctor: Doctor) -> Self {
        Self {
            id: Uuid::new_v4(),
            doctor,
            enqueued_at: Utc::now(),
        }
    }
}

/// Coordinator + worker pool over the shared per-doctor body
pub struct DistributedMonitor {
    monitor: Arc<Monitor>,
    catalog: Arc<dyn CatalogProvider>,
    config: DistributedConfig,
}

impl DistributedMonitor {
    pub fn new(
        monitor: Arc<Monitor>,
        catalog: Arc<dyn CatalogProvider>,
        config: DistributedConfig,
    ) -> SchedulerResult<Self> {
        if config.workers == 0 {
            return Err(SchedulerError::Config("workers must be greater than 0".into()));
        }
        if config.queue_depth == 0 {
            return Err(SchedulerError::Config(
                "queue_depth must be greater than 0".into(),
            ));
        }

        Ok(Self {
            monitor,
            catalog,
            config,
        })
    }

    /// Take the per-cycle catalog snapshot
    pub async fn snapshot(&self) -> SchedulerResult<Vec<Doctor>> {
        self.catalog
            .list_active_doctors()
            .await
            .map_err(|e| SchedulerError::Catalog(e.to_string()))
    }

    /// Run cycles until the stop signal flips, sleeping `poll_interval`
    /// between them.
    pub async fn run(&self, mut stop: watch::Receiver<bool>, poll_interval: std::time::Duration) {
        info!(workers = self.config.workers, "distributed monitor starting");

        loop {
            if *stop.borrow() {
                break;
            }

            match self.snapshot().await {
                Ok(doctors) => match self.run_cycle(&doctors, Some(stop.clone())).await {
                    Ok(report) => {
                        info!(summary = %report.summary(), "distributed cycle complete");
                    }
                    Err(e) => {
                        warn!(error = %e, "distributed cycle failed");
                    }
                },
                Err(e) => {
                    warn!(error = %e, "catalog snapshot failed, skipping cycle");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                _ = stop.changed() => {}
            }
        }

        info!("distributed monitor stopped");
    }

    /// Fan one catalog snapshot out to the worker pool and assemble the
    /// cycle report from the per-doctor results.
    pub async fn run_cycle(
        &self,
        catalog: &[Doctor],
        stop: Option<watch::Receiver<bool>>,
    ) -> SchedulerResult<CycleReport> {
        let mut cycle = CycleReport::new();

        let (work_tx, work_rx) = mpsc::channel::<WorkItem>(self.config.queue_depth);
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<DoctorReport>(catalog.len().max(1));

        let mut workers = Vec::with_capacity(self.config.workers);
        for worker_id in 0..self.config.workers {
            let monitor = Arc::clone(&self.monitor);
            let work_rx = Arc::clone(&work_rx);
            let result_tx = result_tx.clone();
            let stop = stop.clone();

            workers.push(tokio::spawn(async move {
                loop {
                    // Per-work-item cancellation point
                    if stop.as_ref().map(|s| *s.borrow()).unwrap_or(false) {
                        debug!(worker_id, "stop requested, worker exiting");
                        break;
                    }

                    let item = { work_rx.lock().await.recv().await };
                    let Some(item) = item else { break };

                    debug!(worker_id, work_item = %item.id, doctor_id = item.doctor.id, "work item picked up");
                    let report = monitor.process_doctor(&item.doctor, stop.as_ref()).await;

                    if result_tx.send(report).await.is_err() {
                        break;
                    }
                }
            }));
        }
        drop(result_tx);

        // Coordinator: enqueue one item per active doctor
        for doctor in catalog {
            if stop.as_ref().map(|s| *s.borrow()).unwrap_or(false) {
                debug!("stop requested, coordinator stops enqueueing");
                break;
            }
            if work_tx.send(WorkItem::new(doctor.clone())).await.is_err() {
                warn!("work queue closed early");
                break;
            }
        }
        drop(work_tx);

        while let Some(report) = result_rx.recv().await {
            cycle.insert(report);
        }

        for result in futures::future::join_all(workers).await {
            if let Err(e) = result {
                return Err(SchedulerError::WorkerPool(e.to_string()));
            }
        }

        cycle.finish();
        Ok(cycle)
    }
}

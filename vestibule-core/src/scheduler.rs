//! The recurring promotion task.
//!
//! Every run discovers the queues with waiting users and asks the engine
//! to promote a bounded batch from each. Runs never overlap: the task
//! sleeps a fixed delay after each run completes, so a slow run delays the
//! next tick rather than racing it.

use crate::engine::AdmissionEngine;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Tuning for the promotion task. Deployment parameters, not invariants;
/// the defaults mirror the reference deployment.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Master switch, read at the start of every run. Disabled runs are
    /// logged as skipped rather than silently absent.
    pub enabled: bool,
    /// Delay before the first run after startup.
    pub initial_delay: Duration,
    /// Delay between the end of one run and the start of the next.
    pub interval: Duration,
    /// Promotion batch ceiling applied to every queue, independent of
    /// queue length.
    pub max_batch: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay: Duration::from_secs(5),
            interval: Duration::from_secs(10),
            max_batch: 100,
        }
    }
}

/// Drives batch promotion across all discovered queues.
#[derive(Debug)]
pub struct PromotionScheduler {
    engine: Arc<AdmissionEngine>,
    config: SchedulerConfig,
}

impl PromotionScheduler {
    pub fn new(engine: Arc<AdmissionEngine>, config: SchedulerConfig) -> Self {
        Self { engine, config }
    }

    /// Start the fixed-delay loop on the runtime. The task runs until the
    /// handle is aborted or the runtime shuts down; callers do not await
    /// individual runs.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            enabled = self.config.enabled,
            interval_ms = self.config.interval.as_millis() as u64,
            max_batch = self.config.max_batch,
            "starting promotion scheduler"
        );

        tokio::spawn(async move {
            tokio::time::sleep(self.config.initial_delay).await;
            loop {
                self.run_once().await;
                tokio::time::sleep(self.config.interval).await;
            }
        })
    }

    /// A single promotion sweep. One queue's failure never blocks the
    /// others; a failed discovery scan only aborts this run.
    pub async fn run_once(&self) {
        if !self.config.enabled {
            debug!("promotion scheduling disabled; skipping run");
            return;
        }

        let queues = match self.engine.active_queues().await {
            Ok(queues) => queues,
            Err(err) => {
                warn!(error = %err, "queue discovery failed; skipping promotion run");
                return;
            }
        };

        for queue in queues {
            match self.engine.allow(&queue, self.config.max_batch).await {
                Ok(promoted) => {
                    info!(
                        queue = %queue,
                        requested = self.config.max_batch,
                        promoted,
                        "promoted waiting users"
                    );
                }
                Err(err) => {
                    warn!(queue = %queue, error = %err, "promotion failed for queue");
                }
            }
        }
    }
}

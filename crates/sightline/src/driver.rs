//! # Tick Driver
//!
//! Runs the pipeline on a fixed interval from a tokio task.
//!
//! Each tick goes to the blocking pool, so a slow tick never stalls the
//! runtime. The loop itself never waits on a tick: when the next interval
//! fires and the previous tick is still running, the interval is skipped.
//!
//! ```text
//! interval ──▶ in flight? ──yes──▶ skip
//!                  │
//!                  no ──▶ spawn_blocking(pipeline.tick())
//! ```

use std::sync::Arc;
use std::time::Duration;

use sightline_core::{CullingPipeline, TickOutcome};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a running interval driver.
#[derive(Debug)]
pub struct TickDriver {
    pipeline: Arc<CullingPipeline>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TickDriver {
    /// Starts ticking `pipeline` every `period`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, or if `period` is zero.
    pub fn spawn(pipeline: Arc<CullingPipeline>, period: Duration) -> Self {
        let (stop, stopped) = watch::channel(false);
        let task = tokio::spawn(run(Arc::clone(&pipeline), period, stopped));
        tracing::info!("Culling driver started: every {:?}", period);
        Self {
            pipeline,
            stop,
            task,
        }
    }

    /// Returns true until the driver loop has exited.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// The pipeline being driven.
    #[must_use]
    pub fn pipeline(&self) -> &Arc<CullingPipeline> {
        &self.pipeline
    }

    /// Stops the driver and releases the registry.
    ///
    /// Cancels the pipeline so any running tick aborts its remaining
    /// batches, waits for that tick to finish, then clears every
    /// registration.
    pub async fn shutdown(self) {
        self.pipeline.cancel();
        // The loop may already be gone; a closed channel is fine.
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Culling driver task ended abnormally: {}", e);
        }
        self.pipeline.release();
        tracing::info!("Culling driver stopped");
    }
}

async fn run(pipeline: Arc<CullingPipeline>, period: Duration, mut stopped: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: Option<JoinHandle<TickOutcome>> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stopped.changed() => break,
        }

        if let Some(handle) = in_flight.take() {
            if !handle.is_finished() {
                tracing::debug!("Culling driver skipped an interval: tick still in flight");
                in_flight = Some(handle);
                continue;
            }
            log_finished(handle.await);
        }

        let pipeline = Arc::clone(&pipeline);
        in_flight = Some(tokio::task::spawn_blocking(move || pipeline.tick()));
    }

    if let Some(handle) = in_flight {
        log_finished(handle.await);
    }
}

fn log_finished(result: Result<TickOutcome, tokio::task::JoinError>) {
    match result {
        Ok(TickOutcome::Cancelled) => tracing::debug!("Culling tick cancelled"),
        Ok(_) => {}
        Err(e) => tracing::error!("Culling tick failed: {}", e),
    }
}

//! # Culling Pipeline
//!
//! One tick:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 0. GUARD       acquire in-flight flag (else: skipped)              │
//! │ 1. SNAPSHOT    read camera + player once → FrameSnapshot            │
//! │ 2. COLLECT     registry.snapshot_all() → refresh dynamic bounds     │
//! │                → one CullingTask per object                        │
//! │ 3. EVALUATE    rayon fan-out over batches, hard barrier             │
//! │ 4. APPLY       single thread, current registry, set_enabled()       │
//! │ 5. REPORT      TickReport, tracing                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every decision applied in a tick comes from that tick's single
//! snapshot. Cancellation is checked per batch and again before apply;
//! a cancelled tick applies nothing.

mod applier;
mod evaluator;
mod snapshot;
mod stats;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::config::CullingConfig;
use crate::error::{ConfigResult, EvaluationError};
use crate::registry::ObjectRegistry;
use crate::scene::{Anchor, Camera};
use crate::tick::InFlightGuard;

pub use applier::{apply_decisions, ApplySummary};
pub use evaluator::{decide, BatchEvaluator, BatchSummary, CullingParams, CullingTask};
pub use snapshot::FrameSnapshot;
pub use stats::TickReport;

/// What happened when a tick was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick ran to completion and applied its decisions.
    Completed(TickReport),
    /// Another tick was still in flight; nothing was done.
    Skipped,
    /// Shutdown was requested; nothing was applied.
    Cancelled,
}

/// Snapshot → evaluate → apply, guarded against overlap.
pub struct CullingPipeline {
    /// Tuning values.
    config: CullingConfig,
    /// Geometric subset of the config, copied into every worker.
    params: CullingParams,
    /// Participating objects.
    registry: Arc<ObjectRegistry>,
    /// View source.
    camera: Arc<dyn Camera>,
    /// Player reference.
    player: Arc<dyn Anchor>,
    /// Parallel batch runner.
    evaluator: BatchEvaluator,
    /// Set while a tick runs.
    in_flight: AtomicBool,
    /// Set once on shutdown, never cleared.
    cancelled: AtomicBool,
    /// Completed ticks.
    tick_count: AtomicU64,
    /// Report of the last completed tick.
    last_report: Mutex<Option<TickReport>>,
}

impl CullingPipeline {
    /// Creates a pipeline over an existing registry.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::ConfigError`] if the configuration is invalid or
    /// the worker pool cannot start.
    pub fn new(
        config: CullingConfig,
        registry: Arc<ObjectRegistry>,
        camera: Arc<dyn Camera>,
        player: Arc<dyn Anchor>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let evaluator = BatchEvaluator::new(config.batch_size, config.worker_threads)?;

        tracing::info!(
            "Culling pipeline ready: batch size {}, {} workers, interval {:.3}s",
            evaluator.batch_size(),
            evaluator.worker_threads(),
            config.check_interval
        );

        Ok(Self {
            params: CullingParams::from(&config),
            config,
            registry,
            camera,
            player,
            evaluator,
            in_flight: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            tick_count: AtomicU64::new(0),
            last_report: Mutex::new(None),
        })
    }

    /// Runs one full tick.
    ///
    /// Returns [`TickOutcome::Skipped`] without doing anything if another
    /// tick is in flight.
    pub fn tick(&self) -> TickOutcome {
        if self.is_cancelled() {
            return TickOutcome::Cancelled;
        }
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Culling tick skipped: previous tick still in flight");
            return TickOutcome::Skipped;
        };

        let start = Instant::now();
        let snapshot = FrameSnapshot::capture(
            self.camera.as_ref(),
            self.player.as_ref(),
            self.config.ground_check_height,
        );

        let objects = self.registry.snapshot_all();
        let mut refreshed = 0;
        let mut tasks: Vec<CullingTask> = objects
            .iter()
            .map(|object| {
                if !object.is_static() {
                    refreshed += 1;
                }
                CullingTask::new(object.id(), object.refresh_spatial())
            })
            .collect();
        drop(objects);

        let batches = match self
            .evaluator
            .evaluate(&mut tasks, &snapshot, &self.params, &self.cancelled)
        {
            Ok(summary) => summary,
            Err(EvaluationError::Cancelled) => {
                tracing::debug!("Culling tick cancelled during evaluation; results discarded");
                return TickOutcome::Cancelled;
            }
        };
        if self.is_cancelled() {
            tracing::debug!("Culling tick cancelled before apply; results discarded");
            return TickOutcome::Cancelled;
        }

        let applied = apply_decisions(&tasks, &self.registry.snapshot_all());

        let tick = self.tick_count.fetch_add(1, Ordering::AcqRel) + 1;
        let report = TickReport {
            tick,
            objects: tasks.len(),
            refreshed,
            batches: batches.batches,
            failed_batches: batches.failed_batches,
            visible: applied.visible,
            hidden: applied.hidden,
            changed: applied.changed,
            discarded: applied.discarded,
            duration: start.elapsed(),
        };
        self.log_report(&report);
        *self.last_report.lock() = Some(report);

        TickOutcome::Completed(report)
    }

    fn log_report(&self, report: &TickReport) {
        tracing::debug!(
            "Culling tick {}: {} objects, {} visible, {} hidden, {} changed, {} discarded, {} batches in {:?}",
            report.tick,
            report.objects,
            report.visible,
            report.hidden,
            report.changed,
            report.discarded,
            report.batches,
            report.duration
        );
        if report.failed_batches > 0 {
            tracing::warn!(
                "Culling tick {}: {} of {} batches failed",
                report.tick,
                report.failed_batches,
                report.batches
            );
        }
        let every = self.config.log_interval_ticks;
        if every > 0 && report.tick % every == 0 {
            tracing::info!(
                "[CULL STATS] tick {}: visible {}, hidden {}, cull rate {:.1}%, {:?}",
                report.tick,
                report.visible,
                report.hidden,
                report.cull_ratio() * 100.0,
                report.duration
            );
        }
    }

    /// Requests shutdown: pending batches abort and no further tick runs.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            tracing::info!("Culling pipeline cancelled");
        }
    }

    /// Returns true once [`CullingPipeline::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns true while a tick is running.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Cancels and drops every registered object.
    pub fn release(&self) {
        self.cancel();
        self.registry.clear();
    }

    /// The registry this pipeline evaluates.
    #[must_use]
    pub fn registry(&self) -> &Arc<ObjectRegistry> {
        &self.registry
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CullingConfig {
        &self.config
    }

    /// Completed ticks so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Acquire)
    }

    /// Report of the most recent completed tick.
    #[must_use]
    pub fn last_report(&self) -> Option<TickReport> {
        *self.last_report.lock()
    }
}

impl std::fmt::Debug for CullingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CullingPipeline")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("evaluator", &self.evaluator)
            .field("in_flight", &self.is_in_flight())
            .field("cancelled", &self.is_cancelled())
            .field("tick_count", &self.tick_count())
            .finish_non_exhaustive()
    }
}

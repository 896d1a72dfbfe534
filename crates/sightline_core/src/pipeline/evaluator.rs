//! # Batch Evaluator
//!
//! Splits the tick's tasks into contiguous batches and evaluates them on a
//! rayon pool.
//!
//! ```text
//!   tasks: [........|........|........|....]
//!            batch 0  batch 1  batch 2  batch 3
//!               │        │        │       │      (parallel, read-only snapshot)
//!               ▼        ▼        ▼       ▼
//!            ───────────── barrier ─────────────
//! ```
//!
//! Batching only amortizes dispatch overhead: every batch size yields the
//! same decisions. A batch that panics is isolated; its tasks keep
//! `decision = None` and the applier leaves those objects alone.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use sightline_shared::Vec3;

use crate::config::CullingConfig;
use crate::culling::{in_frustum, near_player, within_culling_distance};
use crate::error::{ConfigResult, EvaluationError};
use crate::registry::{ObjectId, SpatialCache};

use super::snapshot::FrameSnapshot;

/// One object's input and output for a single tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CullingTask {
    /// Object the decision is for.
    pub id: ObjectId,
    /// Pivot position.
    pub position: Vec3,
    /// Bounds center.
    pub bounds_center: Vec3,
    /// Bounds half-extents.
    pub bounds_extents: Vec3,
    /// Visibility decision; `None` until evaluated.
    pub decision: Option<bool>,
}

impl CullingTask {
    /// Creates an unevaluated task from cached spatial data.
    #[must_use]
    pub fn new(id: ObjectId, spatial: SpatialCache) -> Self {
        Self {
            id,
            position: spatial.position,
            bounds_center: spatial.bounds_center,
            bounds_extents: spatial.bounds_extents,
            decision: None,
        }
    }
}

/// The geometric tuning a decision depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CullingParams {
    /// Maximum visible distance from the camera.
    pub culling_distance: f32,
    /// Horizontal radius of the ground override.
    pub ground_check_radius: f32,
    /// Frustum margin multiplier.
    pub frustum_padding: f32,
}

impl From<&CullingConfig> for CullingParams {
    fn from(config: &CullingConfig) -> Self {
        Self {
            culling_distance: config.culling_distance,
            ground_check_radius: config.ground_check_radius,
            frustum_padding: config.frustum_padding,
        }
    }
}

/// Decides one object's visibility. First match wins:
///
/// 1. near the player → visible
/// 2. beyond culling distance → hidden
/// 3. otherwise → frustum test
///
/// Proximity comes first so a tight culling distance can never hide the
/// ground the player stands on.
#[inline]
#[must_use]
pub fn decide(task: &CullingTask, snapshot: &FrameSnapshot, params: &CullingParams) -> bool {
    let bounds_min = task.bounds_center - task.bounds_extents;
    let bounds_max = task.bounds_center + task.bounds_extents;

    if near_player(
        task.position,
        bounds_min,
        bounds_max,
        snapshot.player_position,
        snapshot.player_ground_position,
        params.ground_check_radius,
    ) {
        return true;
    }

    if !within_culling_distance(task.position, snapshot.camera_position, params.culling_distance) {
        return false;
    }

    in_frustum(
        task.bounds_center,
        task.bounds_extents,
        &snapshot.frustum_planes,
        params.frustum_padding,
    )
}

/// Outcome of one evaluation phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Batches dispatched.
    pub batches: usize,
    /// Batches that panicked.
    pub failed_batches: usize,
}

/// Parallel fan-out/fan-in over fixed-size batches.
pub struct BatchEvaluator {
    pool: rayon::ThreadPool,
    batch_size: usize,
}

impl BatchEvaluator {
    /// Creates an evaluator with its own worker pool.
    ///
    /// `worker_threads == 0` uses one thread per core. A `batch_size` of 0
    /// is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::WorkerPool`] if the pool cannot start.
    pub fn new(batch_size: usize, worker_threads: usize) -> ConfigResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("sightline-cull-{i}"))
            .build()?;
        Ok(Self {
            pool,
            batch_size: batch_size.max(1),
        })
    }

    /// Objects per batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Worker threads in the pool.
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Evaluates every task against `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Cancelled`] if `cancel` is raised before
    /// all batches ran. Decisions already written must then be discarded.
    pub fn evaluate(
        &self,
        tasks: &mut [CullingTask],
        snapshot: &FrameSnapshot,
        params: &CullingParams,
        cancel: &AtomicBool,
    ) -> Result<BatchSummary, EvaluationError> {
        self.evaluate_with(tasks, cancel, |task| decide(task, snapshot, params))
    }

    /// Evaluates every task with a custom decision function.
    ///
    /// # Errors
    ///
    /// Same as [`BatchEvaluator::evaluate`].
    pub fn evaluate_with<F>(
        &self,
        tasks: &mut [CullingTask],
        cancel: &AtomicBool,
        decide: F,
    ) -> Result<BatchSummary, EvaluationError>
    where
        F: Fn(&CullingTask) -> bool + Sync,
    {
        let batch_size = self.batch_size;
        let batches = tasks.len().div_ceil(batch_size);
        let failed = AtomicUsize::new(0);

        self.pool.install(|| {
            tasks
                .par_chunks_mut(batch_size)
                .enumerate()
                .try_for_each(|(index, batch)| {
                    if cancel.load(Ordering::Acquire) {
                        return Err(EvaluationError::Cancelled);
                    }

                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        for task in batch.iter_mut() {
                            task.decision = Some(decide(task));
                        }
                    }));

                    if outcome.is_err() {
                        for task in batch.iter_mut() {
                            task.decision = None;
                        }
                        failed.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(
                            "Culling batch {} panicked; {} objects keep their previous decision",
                            index,
                            batch.len()
                        );
                    }
                    Ok(())
                })
        })?;

        Ok(BatchSummary {
            batches,
            failed_batches: failed.into_inner(),
        })
    }
}

impl std::fmt::Debug for BatchEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchEvaluator")
            .field("batch_size", &self.batch_size)
            .field("worker_threads", &self.worker_threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling::Frustum;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn params() -> CullingParams {
        CullingParams::from(&CullingConfig::default())
    }

    /// Camera at the origin looking down +Z; player standing at the origin.
    fn snapshot() -> FrameSnapshot {
        let frustum = Frustum::from_perspective(Vec3::ZERO, Vec3::Z, Vec3::Y, 60f32.to_radians(), 16.0 / 9.0, 0.3, 1000.0);
        FrameSnapshot::new(Vec3::ZERO, Vec3::ZERO, frustum.planes, 5.0)
    }

    /// Camera at the origin looking down -Z (away from +Z objects).
    fn snapshot_facing_away() -> FrameSnapshot {
        let frustum = Frustum::from_perspective(Vec3::ZERO, -Vec3::Z, Vec3::Y, 60f32.to_radians(), 16.0 / 9.0, 0.3, 1000.0);
        FrameSnapshot::new(Vec3::ZERO, Vec3::ZERO, frustum.planes, 5.0)
    }

    fn task(id: u64, center: Vec3, extents: Vec3) -> CullingTask {
        CullingTask::new(
            ObjectId::new(id),
            SpatialCache {
                position: center,
                bounds_center: center,
                bounds_extents: extents,
            },
        )
    }

    fn random_tasks(count: usize) -> Vec<CullingTask> {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        (0..count)
            .map(|i| {
                let center = Vec3::new(
                    rng.gen_range(-1500.0..1500.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-1500.0..1500.0),
                );
                let extents = Vec3::new(rng.gen_range(0.1..8.0), rng.gen_range(0.1..8.0), rng.gen_range(0.1..8.0));
                task(i as u64, center, extents)
            })
            .collect()
    }

    #[test]
    fn test_object_under_player_visible_when_facing_away() {
        let t = task(0, Vec3::ZERO, Vec3::ONE);
        assert!(decide(&t, &snapshot_facing_away(), &params()));
    }

    #[test]
    fn test_far_object_hidden() {
        let t = task(0, Vec3::new(0.0, 0.0, 2000.0), Vec3::ONE);
        assert!(!decide(&t, &snapshot(), &params()));
    }

    #[test]
    fn test_object_in_front_visible() {
        let t = task(0, Vec3::new(0.0, 0.0, 50.0), Vec3::ONE);
        assert!(decide(&t, &snapshot(), &params()));
        assert!(!decide(&t, &snapshot_facing_away(), &params()));
    }

    #[test]
    fn test_proximity_beats_distance() {
        // Camera is far away; the player stands on the object.
        let frustum = Frustum::from_perspective(Vec3::new(0.0, 0.0, -5000.0), -Vec3::Z, Vec3::Y, 1.0, 1.0, 0.3, 100.0);
        let snap = FrameSnapshot::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -5000.0), frustum.planes, 5.0);
        let t = task(0, Vec3::ZERO, Vec3::new(2.0, 0.5, 2.0));
        assert!(decide(&t, &snap, &params()));
    }

    #[test]
    fn test_distance_beats_frustum() {
        // Inside the frustum (far plane at 1000) but beyond a 100 unit culling distance.
        let p = CullingParams {
            culling_distance: 100.0,
            ..params()
        };
        let t = task(0, Vec3::new(0.0, 0.0, 500.0), Vec3::ONE);
        assert!(!decide(&t, &snapshot(), &p));
        assert!(decide(&t, &snapshot(), &params()));
    }

    #[test]
    fn test_batch_size_invariance() {
        let snap = snapshot();
        let p = params();
        let cancel = AtomicBool::new(false);
        let base = random_tasks(1234);

        let run = |batch_size: usize| {
            let evaluator = BatchEvaluator::new(batch_size, 4).unwrap();
            let mut tasks = base.clone();
            evaluator.evaluate(&mut tasks, &snap, &p, &cancel).unwrap();
            tasks
        };

        let one = run(1);
        let ten = run(10);
        let all = run(base.len());

        assert_eq!(one, ten);
        assert_eq!(one, all);
        assert!(one.iter().all(|t| t.decision.is_some()));
        assert!(one.iter().any(|t| t.decision == Some(true)));
        assert!(one.iter().any(|t| t.decision == Some(false)));
    }

    #[test]
    fn test_batch_count() {
        let evaluator = BatchEvaluator::new(100, 2).unwrap();
        let mut tasks = random_tasks(250);
        let summary = evaluator
            .evaluate(&mut tasks, &snapshot(), &params(), &AtomicBool::new(false))
            .unwrap();
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.failed_batches, 0);
    }

    #[test]
    fn test_empty_task_list() {
        let evaluator = BatchEvaluator::new(100, 1).unwrap();
        let summary = evaluator
            .evaluate(&mut [], &snapshot(), &params(), &AtomicBool::new(false))
            .unwrap();
        assert_eq!(summary, BatchSummary::default());
    }

    #[test]
    fn test_cancelled_before_dispatch() {
        let evaluator = BatchEvaluator::new(10, 2).unwrap();
        let mut tasks = random_tasks(100);
        let cancel = AtomicBool::new(true);
        let result = evaluator.evaluate(&mut tasks, &snapshot(), &params(), &cancel);
        assert_eq!(result, Err(EvaluationError::Cancelled));
        assert!(tasks.iter().all(|t| t.decision.is_none()));
    }

    #[test]
    fn test_cancelled_between_batches() {
        let evaluator = BatchEvaluator::new(10, 1).unwrap();
        let mut tasks = random_tasks(100);
        let cancel = AtomicBool::new(false);

        // The first batch to run raises the flag; every later batch sees it.
        let result = evaluator.evaluate_with(&mut tasks, &cancel, |_| {
            cancel.store(true, Ordering::Release);
            true
        });

        assert_eq!(result, Err(EvaluationError::Cancelled));
        let decided = tasks.iter().filter(|t| t.decision.is_some()).count();
        assert_eq!(decided, 10);
    }

    #[test]
    fn test_panicking_batch_is_isolated() {
        let evaluator = BatchEvaluator::new(10, 2).unwrap();
        let mut tasks = random_tasks(50);
        let summary = evaluator
            .evaluate_with(&mut tasks, &AtomicBool::new(false), |t| {
                assert!(t.id.raw() != 25, "poisoned task");
                true
            })
            .unwrap();

        assert_eq!(summary.batches, 5);
        assert_eq!(summary.failed_batches, 1);
        for t in &tasks {
            let in_poisoned_batch = (20..30).contains(&t.id.raw());
            assert_eq!(t.decision.is_none(), in_poisoned_batch);
        }
    }
}

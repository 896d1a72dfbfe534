//! # Culling System
//!
//! The host-facing entry point. Built once per scene:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. RESOLVE     camera, scene, player (explicit or by tag)          │
//! │ 2. PIPELINE    validate config, start the worker pool              │
//! │ 3. SCAN        every scene node with a visual → registry           │
//! │ 4. RUN         tick() / update(now) / spawn_driver()               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping the system releases the registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sightline_core::{
    Anchor, Camera, ConfigError, ConfigResult, CullingConfig, CullingPipeline, ObjectId,
    ObjectRegistry, RegistrationError, RegistrationResult, Scene, SceneObject, Scope, TickGate,
    TickOutcome, TickReport, TickStats, VisualHandle,
};

use crate::driver::TickDriver;

/// Collects the collaborators a [`CullingSystem`] needs.
#[derive(Default)]
pub struct CullingSystemBuilder {
    config: CullingConfig,
    camera: Option<Arc<dyn Camera>>,
    player: Option<Arc<dyn Anchor>>,
    scene: Option<(Arc<dyn Scene>, Arc<dyn Scope>)>,
}

impl CullingSystemBuilder {
    /// Replaces the default configuration.
    #[must_use]
    pub fn config(mut self, config: CullingConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the view the frustum is taken from.
    #[must_use]
    pub fn camera(mut self, camera: Arc<dyn Camera>) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Sets the player anchor explicitly.
    ///
    /// Without one, the scene is searched for `reference_object_tag`.
    #[must_use]
    pub fn player(mut self, player: Arc<dyn Anchor>) -> Self {
        self.player = Some(player);
        self
    }

    /// Sets the scene to scan and to scope registrations to.
    #[must_use]
    pub fn scene<S: Scene + 'static>(mut self, scene: Arc<S>) -> Self {
        let scope: Arc<dyn Scope> = scene.clone();
        let scene: Arc<dyn Scene> = scene;
        self.scene = Some((scene, scope));
        self
    }

    /// Resolves collaborators, starts the pipeline and scans the scene.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the scene or camera is missing, no
    /// player anchor can be resolved, or the configuration is invalid.
    pub fn build(self) -> ConfigResult<CullingSystem> {
        let Self {
            config,
            camera,
            player,
            scene,
        } = self;

        config.validate()?;
        let (scene, scope) = scene.ok_or(ConfigError::MissingScene)?;
        let camera = camera.ok_or(ConfigError::MissingCamera)?;
        let player = match player {
            Some(player) => player,
            None => scene
                .find_tagged(&config.reference_object_tag)
                .ok_or_else(|| ConfigError::MissingPlayerAnchor {
                    tag: config.reference_object_tag.clone(),
                })?,
        };

        let gate = TickGate::new(config.check_interval_duration());
        let registry = Arc::new(ObjectRegistry::new(scope));
        let pipeline = Arc::new(CullingPipeline::new(
            config,
            Arc::clone(&registry),
            camera,
            player,
        )?);

        let mut without_visual = 0usize;
        let scanned: Vec<(VisualHandle, bool)> = scene
            .objects()
            .into_iter()
            .filter_map(|object| {
                let visual = object.visual();
                if visual.is_none() {
                    without_visual += 1;
                }
                visual.map(|visual| (visual, object.is_static()))
            })
            .collect();
        let added = registry.add_many(scanned);

        tracing::info!(
            "Culling system initialized: {} objects registered, {} nodes without a visual",
            added.len(),
            without_visual
        );

        Ok(CullingSystem {
            pipeline,
            gate: Mutex::new(gate),
        })
    }
}

/// Periodic visibility culling over one scene.
pub struct CullingSystem {
    pipeline: Arc<CullingPipeline>,
    /// Interval gate for [`CullingSystem::update`], also holds timing stats.
    gate: Mutex<TickGate>,
}

impl CullingSystem {
    /// Starts building a system.
    #[must_use]
    pub fn builder() -> CullingSystemBuilder {
        CullingSystemBuilder::default()
    }

    /// Registers a scene node created after startup.
    ///
    /// The object starts hidden and is decided on the next tick.
    ///
    /// # Errors
    ///
    /// Rejected without side effects if the node has no visual, lives
    /// outside the scene, or is already registered.
    pub fn register_object(&self, object: &dyn SceneObject) -> RegistrationResult<ObjectId> {
        let Some(visual) = object.visual() else {
            tracing::warn!("Rejected registration: scene object has no visual");
            return Err(RegistrationError::MissingVisual);
        };
        self.pipeline.registry().add(visual, object.is_static())
    }

    /// Unregisters the object wrapping `visual`. No-op if absent.
    pub fn unregister_object(&self, visual: &VisualHandle) -> Option<ObjectId> {
        self.pipeline.registry().remove(visual)
    }

    /// Runs one tick now, ignoring the interval.
    pub fn tick(&self) -> TickOutcome {
        let outcome = self.pipeline.tick();
        self.record(outcome);
        outcome
    }

    /// Runs a tick if `check_interval` has passed since the last one.
    ///
    /// Meant to be called from the host's frame loop. Returns `None` when
    /// the interval has not elapsed.
    pub fn update(&self, now: Instant) -> Option<TickOutcome> {
        {
            let mut gate = self.gate.lock();
            if !gate.should_tick(now) {
                return None;
            }
            gate.begin_tick(now);
        }
        let outcome = self.pipeline.tick();
        self.record(outcome);
        Some(outcome)
    }

    fn record(&self, outcome: TickOutcome) {
        if let TickOutcome::Completed(report) = outcome {
            self.gate.lock().record(report.duration);
        }
    }

    /// Starts a tokio driver ticking every `check_interval`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use = "the driver stops ticking only through shutdown()"]
    pub fn spawn_driver(&self) -> TickDriver {
        TickDriver::spawn(
            Arc::clone(&self.pipeline),
            self.pipeline.config().check_interval_duration(),
        )
    }

    /// How long `update()` will keep returning `None` from `now` on.
    ///
    /// Zero before the first tick and once the interval has elapsed.
    #[must_use]
    pub fn time_until_next_tick(&self, now: Instant) -> Duration {
        self.gate.lock().time_until_next(now)
    }

    /// Timing statistics of ticks completed through `tick()` and `update()`.
    #[must_use]
    pub fn stats(&self) -> TickStats {
        *self.gate.lock().stats()
    }

    /// Clears the timing statistics. The interval gate is unaffected.
    pub fn reset_stats(&self) {
        self.gate.lock().reset_stats();
    }

    /// Report of the last completed tick, from any driver.
    #[must_use]
    pub fn last_report(&self) -> Option<TickReport> {
        self.pipeline.last_report()
    }

    /// Number of registered objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.pipeline.registry().len()
    }

    /// Cancels any running tick and drops every registration.
    pub fn release(&self) {
        self.pipeline.release();
    }

    /// The underlying pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Arc<CullingPipeline> {
        &self.pipeline
    }
}

impl Drop for CullingSystem {
    fn drop(&mut self) {
        self.pipeline.release();
    }
}

impl std::fmt::Debug for CullingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CullingSystem")
            .field("pipeline", &self.pipeline)
            .field("stats", &self.stats())
            .finish()
    }
}

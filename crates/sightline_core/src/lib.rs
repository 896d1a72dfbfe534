//! # Sightline Core
//!
//! Visibility decision engine. Every tick it decides, per registered
//! object, whether the object should be drawn:
//! - 10,000+ dynamic objects per tick
//! - Brute-force per-object tests, batched across all cores
//! - Add/remove at any time without disturbing an in-flight tick
//!
//! ## Decision Rules
//!
//! 1. **Near the player** - visible, no matter where the camera looks
//! 2. **Too far from the camera** - hidden
//! 3. **Otherwise** - visible if the bounds touch the padded frustum
//!
//! ## Example
//!
//! ```rust,ignore
//! use sightline_core::{CullingConfig, CullingPipeline, ObjectRegistry};
//!
//! let registry = Arc::new(ObjectRegistry::new(scene.clone()));
//! registry.add(visual, false)?;
//!
//! let pipeline = CullingPipeline::new(CullingConfig::default(), registry, camera, player)?;
//! pipeline.tick();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod culling;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod scene;
pub mod tick;

pub use config::CullingConfig;
pub use culling::{in_frustum, near_player, within_culling_distance, Aabb, Frustum, Plane};
pub use error::{ConfigError, ConfigResult, EvaluationError, RegistrationError, RegistrationResult};
pub use pipeline::{
    apply_decisions, decide, ApplySummary, BatchEvaluator, BatchSummary, CullingParams,
    CullingPipeline, CullingTask, FrameSnapshot, TickOutcome, TickReport,
};
pub use registry::{CullableObject, ObjectId, ObjectRegistry, RegistrySnapshot, SpatialCache};
pub use scene::{
    same_visual, Anchor, Camera, CameraPose, PerspectiveCamera, Scene, SceneObject, Scope,
    TrackedAnchor, Visual, VisualHandle,
};
pub use tick::{InFlightGuard, TickGate, TickStats};

pub use sightline_shared::Vec3;

//! # Sightline
//!
//! Periodic visibility culling for scenes with thousands of moving objects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              SIGHTLINE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Host scene ──scan──▶ CullingSystem ──register/unregister──▶ Registry   │
//! │                            │                                   │        │
//! │                 tick()/update()/TickDriver                     │        │
//! │                            ▼                                   ▼        │
//! │                     CullingPipeline ──snapshot──▶ rayon batches         │
//! │                            │                                            │
//! │                            └──apply──▶ Visual::set_enabled()            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `system`: host-facing facade and builder
//! - `driver`: tokio interval driver

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod driver;
pub mod system;

// Re-export the engine
pub use sightline_core as core;

// Re-export commonly used types
pub use driver::TickDriver;
pub use sightline_core::{
    Aabb, Anchor, Camera, CameraPose, ConfigError, ConfigResult, CullingConfig, ObjectId,
    PerspectiveCamera, Plane, RegistrationError, RegistrationResult, Scene, SceneObject, Scope,
    TickOutcome, TickReport, TickStats, TrackedAnchor, Visual, VisualHandle,
};
pub use sightline_shared::Vec3;
pub use system::{CullingSystem, CullingSystemBuilder};

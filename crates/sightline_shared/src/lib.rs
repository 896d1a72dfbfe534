//! # Sightline Shared
//!
//! Common types used by the culling engine and its hosts.
//!
//! ## RULE
//!
//! This crate has no dependencies. Anything that needs a thread pool,
//! a logger or an allocator-heavy container belongs in `sightline_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_CULLING_DISTANCE,
    DEFAULT_FRUSTUM_PADDING, DEFAULT_GROUND_CHECK_HEIGHT, DEFAULT_GROUND_CHECK_RADIUS,
    DEFAULT_REFERENCE_TAG, FRUSTUM_PLANE_COUNT,
};
pub use math::Vec3;

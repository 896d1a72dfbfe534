//! Geometric predicates for the visibility decision.
//!
//! Pure functions only. Nothing in here reads shared state, so every
//! batch worker can call them without synchronization.

mod frustum;
mod proximity;

pub use frustum::{in_frustum, Aabb, Frustum, Plane};
pub use proximity::{near_player, within_culling_distance};

//! # Culling Defaults
//!
//! Tuning values used when a host does not override them.
//! Distances are in world units, times in seconds.

// =============================================================================
// SCHEDULING
// =============================================================================

/// Minimum time between two culling ticks.
pub const DEFAULT_CHECK_INTERVAL_SECS: f32 = 0.2;

/// Objects evaluated per parallel batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

// =============================================================================
// GEOMETRY
// =============================================================================

/// Maximum distance from the camera at which an object stays visible.
pub const DEFAULT_CULLING_DISTANCE: f32 = 1000.0;

/// Horizontal radius around the player that forces objects visible.
pub const DEFAULT_GROUND_CHECK_RADIUS: f32 = 5.0;

/// How far below the player the ground check band reaches.
pub const DEFAULT_GROUND_CHECK_HEIGHT: f32 = 5.0;

/// Multiplier applied to projected box radii in the frustum test.
///
/// Values above 1.0 widen the frustum so objects do not pop at screen edges.
pub const DEFAULT_FRUSTUM_PADDING: f32 = 1.5;

/// Number of planes bounding a view frustum.
pub const FRUSTUM_PLANE_COUNT: usize = 6;

// =============================================================================
// SCENE
// =============================================================================

/// Tag used to find the player anchor when none is supplied.
pub const DEFAULT_REFERENCE_TAG: &str = "Player";

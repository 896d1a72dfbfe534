//! # Host Collaborators
//!
//! The engine never walks a scene graph or talks to a renderer directly.
//! Hosts implement these traits and hand them to the pipeline:
//!
//! ```text
//!   Scene ──objects()──▶ SceneObject ──visual()──▶ Visual ◀── set_enabled()
//!     │                                               ▲
//!     └─find_tagged()──▶ Anchor (player)              │ bounds()/position()
//!   Camera ──position()/frustum_planes()──▶ FrameSnapshot
//! ```
//!
//! All traits are `Send + Sync`: batch workers and the tick driver call
//! into them from worker threads.

use std::sync::Arc;

use parking_lot::RwLock;
use sightline_shared::{Vec3, FRUSTUM_PLANE_COUNT};

use crate::culling::{Aabb, Frustum, Plane};

/// A renderable component whose drawing can be toggled.
pub trait Visual: Send + Sync {
    /// Current world-space bounding box.
    fn bounds(&self) -> Aabb;

    /// Current world-space pivot position.
    fn position(&self) -> Vec3;

    /// Enables or disables drawing.
    fn set_enabled(&self, enabled: bool);
}

/// Shared handle to a host visual.
pub type VisualHandle = Arc<dyn Visual>;

/// Returns true if both handles point at the same visual.
///
/// Compares data pointers only; two handles to one object may carry
/// different vtable pointers across codegen units.
#[must_use]
pub fn same_visual(a: &VisualHandle, b: &VisualHandle) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// A node of the host scene that may carry a visual.
pub trait SceneObject: Send + Sync {
    /// The node's visual component, if it has one.
    fn visual(&self) -> Option<VisualHandle>;

    /// Whether the host marked this node as never moving.
    fn is_static(&self) -> bool;
}

/// The hierarchy that owns every registered visual.
pub trait Scope: Send + Sync {
    /// Returns true if `visual` lives under this hierarchy.
    fn contains(&self, visual: &VisualHandle) -> bool;
}

/// A scene the pipeline can scan at startup.
pub trait Scene: Scope {
    /// Every descendant node, in scene order.
    fn objects(&self) -> Vec<Arc<dyn SceneObject>>;

    /// Looks up the node carrying `tag` and returns it as an anchor.
    fn find_tagged(&self, tag: &str) -> Option<Arc<dyn Anchor>>;
}

/// A positioned reference point, normally the player.
pub trait Anchor: Send + Sync {
    /// Current world-space position.
    fn position(&self) -> Vec3;
}

/// The viewpoint the frustum is taken from.
pub trait Camera: Send + Sync {
    /// Current world-space eye position.
    fn position(&self) -> Vec3;

    /// Current frustum planes, normals pointing inwards.
    fn frustum_planes(&self) -> [Plane; FRUSTUM_PLANE_COUNT];
}

/// Pose and lens of a [`PerspectiveCamera`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    /// Eye position.
    pub eye: Vec3,
    /// View direction.
    pub forward: Vec3,
    /// Up hint.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            eye: Vec3::ZERO,
            forward: Vec3::Z,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.3,
            far: 1000.0,
        }
    }
}

/// A perspective camera the host can move between ticks.
#[derive(Debug, Default)]
pub struct PerspectiveCamera {
    pose: RwLock<CameraPose>,
}

impl PerspectiveCamera {
    /// Creates a camera with the given pose.
    #[must_use]
    pub fn new(pose: CameraPose) -> Self {
        Self {
            pose: RwLock::new(pose),
        }
    }

    /// Moves and re-aims the camera.
    pub fn look(&self, eye: Vec3, forward: Vec3) {
        let mut pose = self.pose.write();
        pose.eye = eye;
        pose.forward = forward;
    }

    /// Returns the current pose.
    #[must_use]
    pub fn pose(&self) -> CameraPose {
        *self.pose.read()
    }
}

impl Camera for PerspectiveCamera {
    fn position(&self) -> Vec3 {
        self.pose.read().eye
    }

    fn frustum_planes(&self) -> [Plane; FRUSTUM_PLANE_COUNT] {
        let p = self.pose();
        Frustum::from_perspective(p.eye, p.forward, p.up, p.fov_y, p.aspect, p.near, p.far).planes
    }
}

/// An anchor whose position the host updates directly.
#[derive(Debug, Default)]
pub struct TrackedAnchor {
    position: RwLock<Vec3>,
}

impl TrackedAnchor {
    /// Creates an anchor at `position`.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position: RwLock::new(position),
        }
    }

    /// Moves the anchor.
    pub fn set_position(&self, position: Vec3) {
        *self.position.write() = position;
    }
}

impl Anchor for TrackedAnchor {
    fn position(&self) -> Vec3 {
        *self.position.read()
    }
}

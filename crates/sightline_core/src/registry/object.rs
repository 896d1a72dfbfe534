//! # Cullable Objects
//!
//! Objects are identified by an [`ObjectId`] drawn from a monotonically
//! increasing counter. Ids are never handed out twice, so a decision
//! computed for a removed object can never land on a newer one.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sightline_shared::Vec3;

use crate::culling::Aabb;
use crate::scene::{Visual, VisualHandle};

/// Stable identifier of a registered object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cached world-space data for one object.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpatialCache {
    /// Pivot position.
    pub position: Vec3,
    /// Bounding box center.
    pub bounds_center: Vec3,
    /// Bounding box half-extents.
    pub bounds_extents: Vec3,
}

impl SpatialCache {
    /// Reads the current spatial data from a live visual.
    #[must_use]
    pub fn capture(visual: &dyn Visual) -> Self {
        let bounds = visual.bounds();
        Self {
            position: visual.position(),
            bounds_center: bounds.center,
            bounds_extents: bounds.extents,
        }
    }

    /// Cached bounds as a box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.bounds_center, self.bounds_extents)
    }

    /// Returns true if no component is NaN or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.bounds_center.is_finite() && self.bounds_extents.is_finite()
    }
}

/// A registered object with its spatial cache folded in.
///
/// The cache lives inside the record, so an id always has exactly one
/// cache entry and both disappear together.
pub struct CullableObject {
    id: ObjectId,
    visual: VisualHandle,
    is_static: bool,
    desired_visible: AtomicBool,
    spatial: Mutex<SpatialCache>,
}

impl CullableObject {
    /// Creates an object, capturing its initial spatial data.
    #[must_use]
    pub fn new(id: ObjectId, visual: VisualHandle, is_static: bool) -> Self {
        let spatial = SpatialCache::capture(visual.as_ref());
        Self::with_spatial(id, visual, is_static, spatial)
    }

    /// Creates an object from spatial data captured earlier.
    ///
    /// Does not call into the visual.
    #[must_use]
    pub fn with_spatial(id: ObjectId, visual: VisualHandle, is_static: bool, spatial: SpatialCache) -> Self {
        Self {
            id,
            visual,
            is_static,
            desired_visible: AtomicBool::new(false),
            spatial: Mutex::new(spatial),
        }
    }

    /// The object's id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The host visual.
    #[must_use]
    pub fn visual(&self) -> &VisualHandle {
        &self.visual
    }

    /// Whether bounds are frozen at registration.
    #[inline]
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// The last decision applied to this object.
    #[inline]
    #[must_use]
    pub fn desired_visible(&self) -> bool {
        self.desired_visible.load(Ordering::Acquire)
    }

    /// Records a decision. Returns the previous one.
    pub fn set_desired_visible(&self, visible: bool) -> bool {
        self.desired_visible.swap(visible, Ordering::AcqRel)
    }

    /// The cached spatial data.
    #[must_use]
    pub fn spatial(&self) -> SpatialCache {
        *self.spatial.lock()
    }

    /// Returns spatial data for this tick.
    ///
    /// Dynamic objects re-read their visual and update the cache; static
    /// objects return what was captured at registration.
    pub fn refresh_spatial(&self) -> SpatialCache {
        if self.is_static {
            return self.spatial();
        }
        let fresh = SpatialCache::capture(self.visual.as_ref());
        *self.spatial.lock() = fresh;
        fresh
    }
}

impl fmt::Debug for CullableObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CullableObject")
            .field("id", &self.id)
            .field("is_static", &self.is_static)
            .field("desired_visible", &self.desired_visible())
            .field("spatial", &self.spatial())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;
    use std::sync::Arc;

    struct Moving(RwLock<Vec3>);

    impl Visual for Moving {
        fn bounds(&self) -> Aabb {
            Aabb::new(*self.0.read(), Vec3::ONE)
        }
        fn position(&self) -> Vec3 {
            *self.0.read()
        }
        fn set_enabled(&self, _enabled: bool) {}
    }

    #[test]
    fn test_static_cache_is_frozen() {
        let visual = Arc::new(Moving(RwLock::new(Vec3::ZERO)));
        let object = CullableObject::new(ObjectId::new(1), visual.clone(), true);

        *visual.0.write() = Vec3::new(10.0, 0.0, 0.0);
        assert_eq!(object.refresh_spatial().position, Vec3::ZERO);
    }

    #[test]
    fn test_dynamic_cache_follows_visual() {
        let visual = Arc::new(Moving(RwLock::new(Vec3::ZERO)));
        let object = CullableObject::new(ObjectId::new(1), visual.clone(), false);

        *visual.0.write() = Vec3::new(10.0, 0.0, 0.0);
        let fresh = object.refresh_spatial();
        assert_eq!(fresh.position, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(fresh.bounds_center, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(object.spatial(), fresh);
    }

    #[test]
    fn test_desired_visible_swap() {
        let visual = Arc::new(Moving(RwLock::new(Vec3::ZERO)));
        let object = CullableObject::new(ObjectId::new(7), visual, false);
        assert!(!object.desired_visible());
        assert!(!object.set_desired_visible(true));
        assert!(object.desired_visible());
        assert_eq!(object.id().to_string(), "#7");
    }

    #[test]
    fn test_capture_flags_non_finite_position() {
        let visual = Moving(RwLock::new(Vec3::new(f32::NAN, 0.0, 0.0)));
        assert!(!SpatialCache::capture(&visual).is_finite());

        *visual.0.write() = Vec3::new(1.0, 2.0, 3.0);
        assert!(SpatialCache::capture(&visual).is_finite());
    }
}

//! Frustum culling for view-dependent visibility.
//!
//! Extracts frustum planes from a view-projection matrix (or builds them
//! directly from perspective parameters) and tests axis-aligned bounding
//! boxes against them.

use sightline_shared::{Vec3, FRUSTUM_PLANE_COUNT};

/// A plane in 3D space: `dot(normal, p) + distance = 0`.
///
/// Frustum planes point their normal towards the inside of the volume, so
/// a positive signed distance means "inside this half-space".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    /// Plane normal.
    pub normal: Vec3,
    /// Offset from the origin along the normal.
    pub distance: f32,
}

impl Plane {
    /// Creates a new plane.
    #[must_use]
    pub const fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Creates a plane with the given normal passing through `point`.
    #[must_use]
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self::new(normal, -normal.dot(point))
    }

    /// Normalizes the plane.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.normal.length();
        if len > 0.0 {
            Self {
                normal: self.normal * (1.0 / len),
                distance: self.distance / len,
            }
        } else {
            self
        }
    }

    /// Returns the signed distance from a point to the plane.
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Axis-aligned bounding box stored as center + half-extents.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aabb {
    /// Box center.
    pub center: Vec3,
    /// Half size along each axis.
    pub extents: Vec3,
}

impl Aabb {
    /// Creates a box from its center and half-extents.
    #[must_use]
    pub const fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    /// Creates a box spanning two corners.
    #[must_use]
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min).abs() * 0.5,
        }
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }
}

/// Tests whether a box lies inside (or straddles) all frustum planes.
///
/// For each plane the box is projected onto the normal,
/// `r = extents . |normal|`, and widened by `padding`. The box is rejected
/// as soon as one plane has it entirely on the outside. The test is
/// conservative: boxes near frustum corners may pass while being outside,
/// an axis-aligned box overlapping the frustum is never rejected.
#[inline]
#[must_use]
pub fn in_frustum(center: Vec3, extents: Vec3, planes: &[Plane; FRUSTUM_PLANE_COUNT], padding: f32) -> bool {
    for plane in planes {
        // Projection interval radius
        let r = extents.dot(plane.normal.abs());
        if plane.distance_to_point(center) + r * padding < 0.0 {
            return false;
        }
    }
    true
}

/// View frustum for culling.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far planes.
    pub planes: [Plane; FRUSTUM_PLANE_COUNT],
}

impl Frustum {
    /// Left plane index.
    pub const LEFT: usize = 0;
    /// Right plane index.
    pub const RIGHT: usize = 1;
    /// Bottom plane index.
    pub const BOTTOM: usize = 2;
    /// Top plane index.
    pub const TOP: usize = 3;
    /// Near plane index.
    pub const NEAR: usize = 4;
    /// Far plane index.
    pub const FAR: usize = 5;

    /// Extracts frustum planes from a view-projection matrix.
    ///
    /// The matrix should be in column-major order (OpenGL convention,
    /// clip-space depth in `[-1, 1]`).
    #[must_use]
    pub fn from_view_projection(m: &[[f32; 4]; 4]) -> Self {
        let row = |r: usize| [m[0][r], m[1][r], m[2][r], m[3][r]];
        let combine = |a: [f32; 4], b: [f32; 4], sign: f32| {
            Plane::new(
                Vec3::new(a[0] + sign * b[0], a[1] + sign * b[1], a[2] + sign * b[2]),
                a[3] + sign * b[3],
            )
            .normalized()
        };

        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let mut planes = [Plane::default(); FRUSTUM_PLANE_COUNT];
        planes[Self::LEFT] = combine(r3, r0, 1.0);
        planes[Self::RIGHT] = combine(r3, r0, -1.0);
        planes[Self::BOTTOM] = combine(r3, r1, 1.0);
        planes[Self::TOP] = combine(r3, r1, -1.0);
        planes[Self::NEAR] = combine(r3, r2, 1.0);
        planes[Self::FAR] = combine(r3, r2, -1.0);

        Self { planes }
    }

    /// Builds frustum planes directly from perspective camera parameters.
    ///
    /// `forward` and `up` need not be normalized but must not be parallel.
    /// `fov_y` is the full vertical field of view in radians.
    #[must_use]
    pub fn from_perspective(
        eye: Vec3,
        forward: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let f = forward.normalize_or_zero();
        let right = up.cross(f).normalize_or_zero();
        let u = f.cross(right);

        let half_h = (fov_y * 0.5).tan();
        let half_w = half_h * aspect;

        let mut planes = [Plane::default(); FRUSTUM_PLANE_COUNT];
        planes[Self::LEFT] = Plane::from_point_normal(eye, f * half_w + right);
        planes[Self::RIGHT] = Plane::from_point_normal(eye, f * half_w - right);
        planes[Self::BOTTOM] = Plane::from_point_normal(eye, f * half_h + u);
        planes[Self::TOP] = Plane::from_point_normal(eye, f * half_h - u);
        planes[Self::NEAR] = Plane::from_point_normal(eye + f * near, f);
        planes[Self::FAR] = Plane::from_point_normal(eye + f * far, -f);

        Self { planes }
    }

    /// Tests a box against this frustum.
    #[must_use]
    pub fn contains_aabb(&self, aabb: &Aabb, padding: f32) -> bool {
        in_frustum(aabb.center, aabb.extents, &self.planes, padding)
    }
}

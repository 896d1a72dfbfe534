//! Per-tick frame capture.
//!
//! The only place camera and player state is read during a tick. Every
//! batch worker reads the same immutable [`FrameSnapshot`].

use sightline_shared::{Vec3, FRUSTUM_PLANE_COUNT};

use crate::culling::Plane;
use crate::scene::{Anchor, Camera};

/// Camera and player state frozen for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSnapshot {
    /// Player position.
    pub player_position: Vec3,
    /// Player position lowered by the ground check height.
    pub player_ground_position: Vec3,
    /// Camera eye position.
    pub camera_position: Vec3,
    /// Frustum planes, normals pointing inwards.
    pub frustum_planes: [Plane; FRUSTUM_PLANE_COUNT],
}

impl FrameSnapshot {
    /// Builds a snapshot from raw values.
    #[must_use]
    pub fn new(
        player_position: Vec3,
        camera_position: Vec3,
        frustum_planes: [Plane; FRUSTUM_PLANE_COUNT],
        ground_check_height: f32,
    ) -> Self {
        Self {
            player_position,
            player_ground_position: player_position - Vec3::Y * ground_check_height,
            camera_position,
            frustum_planes,
        }
    }

    /// Reads the live camera and player once.
    #[must_use]
    pub fn capture(camera: &dyn Camera, player: &dyn Anchor, ground_check_height: f32) -> Self {
        Self::new(
            player.position(),
            camera.position(),
            camera.frustum_planes(),
            ground_check_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{CameraPose, PerspectiveCamera, TrackedAnchor};

    #[test]
    fn test_ground_position_is_below_player() {
        let camera = PerspectiveCamera::new(CameraPose::default());
        let player = TrackedAnchor::new(Vec3::new(3.0, 10.0, -2.0));
        let snapshot = FrameSnapshot::capture(&camera, &player, 5.0);

        assert_eq!(snapshot.player_position, Vec3::new(3.0, 10.0, -2.0));
        assert_eq!(snapshot.player_ground_position, Vec3::new(3.0, 5.0, -2.0));
        assert_eq!(snapshot.camera_position, Vec3::ZERO);
        assert_eq!(snapshot.frustum_planes, camera.frustum_planes());
    }

    #[test]
    fn test_snapshot_is_detached_from_camera() {
        let camera = PerspectiveCamera::new(CameraPose::default());
        let player = TrackedAnchor::new(Vec3::ZERO);
        let snapshot = FrameSnapshot::capture(&camera, &player, 5.0);

        camera.look(Vec3::new(100.0, 0.0, 0.0), -Vec3::Z);
        player.set_position(Vec3::Y);

        assert_eq!(snapshot.camera_position, Vec3::ZERO);
        assert_eq!(snapshot.player_position, Vec3::ZERO);
    }
}

//! Distance and ground-proximity tests.

use sightline_shared::Vec3;

/// Returns true if the object is close enough to the player to be forced
/// visible.
///
/// Two conditions must both hold:
/// - the horizontal (XZ) distance between object and player is below
///   `ground_radius` plus half the object's widest horizontal side,
/// - the object's vertical span overlaps the band between
///   `player_ground_pos.y` and `player_pos.y`.
///
/// This keeps the ground under the player's feet rendered even when the
/// camera is pitched away from it.
#[inline]
#[must_use]
pub fn near_player(
    object_pos: Vec3,
    bounds_min: Vec3,
    bounds_max: Vec3,
    player_pos: Vec3,
    player_ground_pos: Vec3,
    ground_radius: f32,
) -> bool {
    let half_horizontal = ((bounds_max.x - bounds_min.x).abs()).max((bounds_max.z - bounds_min.z).abs()) * 0.5;
    let reach = ground_radius + half_horizontal;
    if object_pos.horizontal_distance_squared(player_pos) >= reach * reach {
        return false;
    }

    let band_low = player_ground_pos.y.min(player_pos.y);
    let band_high = player_ground_pos.y.max(player_pos.y);
    bounds_min.y <= band_high && bounds_max.y >= band_low
}

/// Returns true if the object is within `culling_distance` of the camera.
#[inline]
#[must_use]
pub fn within_culling_distance(object_pos: Vec3, camera_pos: Vec3, culling_distance: f32) -> bool {
    object_pos.distance_squared(camera_pos) <= culling_distance * culling_distance
}

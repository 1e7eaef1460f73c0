//! Closed-form camera fit for 3-D previews.

use crate::config::CameraSettings;
use glam::Vec3;
use iconforge_scene::{Aabb, Camera};

const MIN_FILL: f32 = 0.4;
const MAX_FILL: f32 = 0.95;

/// Orthonormal camera basis for a view direction (subject towards camera).
///
/// Falls back to +Z when `view_dir` is zero or not finite, and to a Z-up
/// reference when the view is parallel to the Y axis.
pub fn camera_basis(view_dir: Vec3) -> (Vec3, Vec3, Vec3) {
    let view = if view_dir.is_finite() {
        view_dir.normalize_or_zero()
    } else {
        Vec3::ZERO
    };
    let view = if view == Vec3::ZERO { Vec3::Z } else { view };
    let forward = -view;

    let mut right = forward.cross(Vec3::Y);
    if right.length_squared() < 1e-8 {
        right = forward.cross(Vec3::Z);
    }
    let right = right.normalize();
    let up = right.cross(forward).normalize();
    (right, up, forward)
}

/// Distance from the bounds' center at which the subject fills `target_fill`
/// of the vertical field of view.
///
/// The eight corners are projected onto the camera basis; the largest
/// lateral extent is fitted to the (fill-scaled) frustum and the forward
/// depth is added so the nearest face also fits. The result is never below
/// `min_distance`. Pure: the same inputs always give the same distance.
pub fn compute_preview_camera_distance(
    bounds: &Aabb,
    view_dir: Vec3,
    fov_y: f32,
    target_fill: f32,
    min_distance: f32,
) -> f32 {
    let min_distance = if min_distance.is_finite() {
        min_distance.max(0.0)
    } else {
        0.0
    };
    let (right, up, forward) = camera_basis(view_dir);
    let center = bounds.center();

    let (mut max_x, mut max_y, mut max_z) = (0.0f32, 0.0f32, 0.0f32);
    for corner in bounds.corners() {
        let d = corner - center;
        max_x = max_x.max(d.dot(right).abs());
        max_y = max_y.max(d.dot(up).abs());
        max_z = max_z.max(d.dot(forward).abs());
    }

    let fill = if target_fill.is_finite() {
        target_fill.clamp(MIN_FILL, MAX_FILL)
    } else {
        MIN_FILL
    };
    let half_tan = (fov_y * 0.5).tan();
    if !(half_tan.is_finite() && half_tan > 0.0) {
        return min_distance;
    }

    let distance = max_x.max(max_y) / (half_tan * fill) + max_z;
    if distance.is_finite() {
        distance.max(min_distance)
    } else {
        min_distance
    }
}

/// Camera looking at the center of `bounds` from the configured direction.
pub fn fit_camera(bounds: &Aabb, settings: &CameraSettings) -> Camera {
    let view_dir = Vec3::from(settings.view_direction);
    let fov_y = settings.fov_y_degrees.to_radians();
    let distance = compute_preview_camera_distance(
        bounds,
        view_dir,
        fov_y,
        settings.target_fill,
        settings.min_distance,
    );
    let (_, up, forward) = camera_basis(view_dir);
    let target = bounds.center();
    let radius = bounds.extent().length() * 0.5;

    Camera {
        position: target - forward * distance,
        target,
        up,
        fov_y,
        near: (distance - radius).max(distance * 0.01).max(1e-3),
        far: distance + radius * 2.0 + 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Aabb {
        Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    #[test]
    fn test_distance_is_pure() {
        let view = Vec3::new(1.0, 0.8, 1.0);
        let a = compute_preview_camera_distance(&unit_cube(), view, 30f32.to_radians(), 0.8, 0.25);
        let b = compute_preview_camera_distance(&unit_cube(), view, 30f32.to_radians(), 0.8, 0.25);
        assert_eq!(a.to_bits(), b.to_bits());
        assert!(a > 0.25);
    }

    #[test]
    fn test_distance_axis_aligned_view() {
        // Looking straight down +Z at a cube: lateral extent 0.5, depth 0.5.
        let fov = 90f32.to_radians();
        let d = compute_preview_camera_distance(&unit_cube(), Vec3::Z, fov, 0.5, 0.0);
        let expected = 0.5 / (1.0 * 0.5) + 0.5;
        assert!((d - expected).abs() < 1e-5, "{} vs {}", d, expected);
    }

    #[test]
    fn test_fill_is_clamped() {
        let fov = 60f32.to_radians();
        let low = compute_preview_camera_distance(&unit_cube(), Vec3::Z, fov, 0.01, 0.0);
        let clamped_low = compute_preview_camera_distance(&unit_cube(), Vec3::Z, fov, 0.4, 0.0);
        assert_eq!(low, clamped_low);

        let high = compute_preview_camera_distance(&unit_cube(), Vec3::Z, fov, 5.0, 0.0);
        let clamped_high = compute_preview_camera_distance(&unit_cube(), Vec3::Z, fov, 0.95, 0.0);
        assert_eq!(high, clamped_high);
    }

    #[test]
    fn test_degenerate_bounds_use_min_distance() {
        let point = Aabb::new(Vec3::ONE, Vec3::ONE);
        let d = compute_preview_camera_distance(&point, Vec3::new(1.0, 0.8, 1.0), 0.5, 0.8, 0.25);
        assert_eq!(d, 0.25);

        let d = compute_preview_camera_distance(&unit_cube(), Vec3::Z, 0.0, 0.8, 0.25);
        assert_eq!(d, 0.25);
    }

    #[test]
    fn test_basis_handles_vertical_and_zero_views() {
        for view in [Vec3::Y, Vec3::NEG_Y, Vec3::ZERO, Vec3::splat(f32::NAN)] {
            let (right, up, forward) = camera_basis(view);
            assert!(right.is_normalized() && up.is_normalized() && forward.is_normalized());
            assert!(right.dot(up).abs() < 1e-5);
            assert!(right.dot(forward).abs() < 1e-5);
        }
    }

    #[test]
    fn test_fit_camera_looks_at_center() {
        let bounds = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 2.0, 2.0));
        let camera = fit_camera(&bounds, &CameraSettings::default());
        assert_eq!(camera.target, Vec3::new(3.0, 1.0, 1.0));
        // Default view direction is diagonal and elevated.
        let offset = camera.position - camera.target;
        assert!(offset.x > 0.0 && offset.y > 0.0 && offset.z > 0.0);
        assert!(camera.near > 0.0 && camera.near < offset.length());
        assert!(camera.far > offset.length());
    }
}

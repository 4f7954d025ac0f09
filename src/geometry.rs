//! Shared geometric primitives for visibility testing.

use nalgebra::Vector3;

/// Bodies whose apparent angular diameter is below this threshold
/// (radians, ~10 arcmin) are never considered for occlusion.
/// For reference, the sun and moon seen from Earth subtend ~30 arcmin,
/// Venus at most ~1 arcmin.
pub const OCCLUSION_ANGULAR_THRESHOLD: f64 = 0.003;

/// Distances are clamped to this value (`m`) before any division, so
/// an observer coincident with a body center yields large but finite
/// fluxes instead of NaN.
pub const MIN_DISTANCE: f64 = 1.0;

/// Direction and distance from the observer to a point, with the
/// distance clamped to [`MIN_DISTANCE`].
pub fn direction_and_distance(offset: &Vector3<f64>) -> (Vector3<f64>, f64) {
    let distance = offset.norm().max(MIN_DISTANCE);
    (offset / distance, distance)
}

/// Does a sphere block the segment from the observer to a target?
///
/// `obs_to_center` is the vector from the observer to the sphere
/// center, `dir` the unit direction toward the target and `max_dist`
/// the distance to the target; spheres behind the observer or beyond
/// the target do not block. A sphere exactly tangent to the segment
/// counts as blocking.
pub fn ray_hit_sphere(
    obs_to_center: &Vector3<f64>,
    dir: &Vector3<f64>,
    radius: f64,
    max_dist: f64,
) -> bool {
    let along = obs_to_center.dot(dir);
    if along < 0.0 || along > max_dist {
        return false;
    }

    let perp_sq = obs_to_center.norm_squared() - along * along;
    perp_sq <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_between_observer_and_target_blocks() {
        let center = Vector3::new(5.0, 0.0, 0.0);
        let dir = Vector3::new(1.0, 0.0, 0.0);
        assert!(ray_hit_sphere(&center, &dir, 1.0, 10.0));
    }

    #[test]
    fn sphere_behind_observer_does_not_block() {
        let center = Vector3::new(-5.0, 0.0, 0.0);
        let dir = Vector3::new(1.0, 0.0, 0.0);
        assert!(!ray_hit_sphere(&center, &dir, 1.0, 10.0));
    }

    #[test]
    fn sphere_beyond_target_does_not_block() {
        let center = Vector3::new(15.0, 0.0, 0.0);
        let dir = Vector3::new(1.0, 0.0, 0.0);
        assert!(!ray_hit_sphere(&center, &dir, 1.0, 10.0));
    }

    #[test]
    fn sphere_off_axis_misses() {
        let center = Vector3::new(5.0, 3.0, 0.0);
        let dir = Vector3::new(1.0, 0.0, 0.0);
        assert!(!ray_hit_sphere(&center, &dir, 1.0, 10.0));
    }

    #[test]
    fn tangent_sphere_counts_as_hit() {
        // closest approach exactly equals the radius
        let center = Vector3::new(5.0, 1.0, 0.0);
        let dir = Vector3::new(1.0, 0.0, 0.0);
        assert!(ray_hit_sphere(&center, &dir, 1.0, 10.0));
        assert!(!ray_hit_sphere(&center, &dir, 1.0 - 1e-9, 10.0));
    }

    #[test]
    fn zero_offset_clamps_distance() {
        let (dir, distance) = direction_and_distance(&Vector3::zeros());
        assert_eq!(distance, MIN_DISTANCE);
        assert!(dir.norm().is_finite());
    }
}

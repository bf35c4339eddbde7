use super::{BoundingBox, TrajectoryConfig, TrajectoryKind, Viewpoint};
use crate::report::ValidationReport;

/// Orbital configuration that keeps the whole box in view with the requested overlap.
///
/// # Arguments
///
/// * `bounding_box` - Bounds of the subject in engine units.
/// * `desired_overlap` - Fraction of the field of view shared by neighbouring views, in [0, 1).
/// * `horizontal_fov` - Horizontal field of view in degrees.
///
/// # Returns
///
/// An orbital configuration centered on the box with staggering, radius variation and
/// look-at enabled.
pub fn calculate_optimal_config(
    bounding_box: &BoundingBox,
    desired_overlap: f64,
    horizontal_fov: f64,
) -> TrajectoryConfig {
    let mut config = TrajectoryConfig {
        kind: TrajectoryKind::Orbital,
        focus_point: bounding_box.center(),
        ..Default::default()
    };

    // distance to fit the box, plus 30% margin
    let max_extent = bounding_box.extent().max_element();
    let min_distance = max_extent / (horizontal_fov.to_radians() / 2.0).tan();
    config.base_radius = min_distance * 1.3;

    let angular_step = horizontal_fov * (1.0 - desired_overlap);
    config.views_per_ring = ((360.0 / angular_step).ceil() as u32).clamp(12, 72);

    // 16:9 frame
    let vertical_fov = horizontal_fov / (16.0 / 9.0);
    let vertical_step = vertical_fov * (1.0 - desired_overlap);
    let elevation_range = config.max_elevation - config.min_elevation;
    config.num_rings = ((elevation_range / vertical_step).ceil() as u32).clamp(3, 8);

    config.stagger_rings = true;
    config.vary_radius_per_ring = true;
    config.look_at_focus_point = true;

    config
}

/// [`calculate_optimal_config`] with 70% overlap and a 90 degree field of view.
pub fn calculate_default_optimal_config(bounding_box: &BoundingBox) -> TrajectoryConfig {
    calculate_optimal_config(bounding_box, 0.7, 90.0)
}

/// Check a trajectory configuration for 3DGS suitability.
///
/// Only a custom trajectory with fewer than 3 waypoints is fatal.
pub fn validate_config(config: &TrajectoryConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    let total_views = config.expected_viewpoint_count();
    if total_views < 50 {
        report.warn(format!(
            "Low viewpoint count ({total_views}). 100-180 recommended for quality 3DGS training."
        ));
    } else if total_views > 500 {
        report.warn(format!(
            "High viewpoint count ({total_views}). May significantly increase capture and training time."
        ));
    }

    if config.base_radius < 100.0 {
        report.warn("Very small radius (<1m). May cause near-plane clipping issues.");
    } else if config.base_radius > 10000.0 {
        report.warn("Very large radius (>100m). May affect depth precision.");
    }

    if config.max_elevation - config.min_elevation < 30.0 {
        report.warn("Narrow elevation range (<30 deg). May result in incomplete vertical coverage.");
    }

    let angular_step = 360.0 / config.views_per_ring as f64;
    if angular_step > 30.0 {
        report.warn(format!(
            "Angular step ({angular_step:.1} deg) may result in insufficient overlap with 90 deg FOV."
        ));
    }

    if config.kind == TrajectoryKind::Custom && config.custom_waypoints.len() < 3 {
        report.fail("Custom trajectory requires at least 3 waypoints.");
    }

    report
}

/// Mean overlap between consecutive viewpoints, the last one paired with the first.
///
/// The overlap of a pair is `1 - angle / fov` clamped to [0, 1], where `angle` is the angle
/// between their forward vectors in degrees. Returns 0 for fewer than two viewpoints.
pub fn average_overlap(viewpoints: &[Viewpoint], horizontal_fov: f64) -> f64 {
    if viewpoints.len() < 2 {
        return 0.0;
    }

    let total: f64 = viewpoints
        .iter()
        .zip(viewpoints.iter().cycle().skip(1))
        .map(|(a, b)| {
            let cos_angle = a.forward().dot(b.forward()).clamp(-1.0, 1.0);
            let angle = cos_angle.acos().to_degrees();
            (1.0 - angle / horizontal_fov).clamp(0.0, 1.0)
        })
        .sum();

    total / viewpoints.len() as f64
}

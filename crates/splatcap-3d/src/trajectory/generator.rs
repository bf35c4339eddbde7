use std::f64::consts::PI;

use glam::DVec3;

use super::{TrajectoryConfig, TrajectoryKind, Viewpoint};
use crate::transforms::Rotator;

const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// Generate the ordered viewpoints of a trajectory.
///
/// Generation is deterministic: the same configuration always yields the same viewpoints.
///
/// # Arguments
///
/// * `config` - The trajectory parameters.
///
/// # Returns
///
/// The viewpoints with sequence ids `0..n`.
pub fn generate_viewpoints(config: &TrajectoryConfig) -> Vec<Viewpoint> {
    let viewpoints = match config.kind {
        TrajectoryKind::Orbital | TrajectoryKind::Grid => generate_orbital(config),
        TrajectoryKind::Spherical => generate_spherical(config),
        TrajectoryKind::Spiral => generate_spiral(config),
        TrajectoryKind::Hemisphere => generate_hemisphere(config),
        TrajectoryKind::Panoramic360 => generate_panoramic(config),
        TrajectoryKind::Custom => generate_custom(config),
    };
    log::debug!(
        "generated {} viewpoints for {:?} trajectory",
        viewpoints.len(),
        config.kind
    );
    viewpoints
}

fn generate_orbital(config: &TrajectoryConfig) -> Vec<Viewpoint> {
    let num_rings = config.num_rings as usize;
    let views_per_ring = config.views_per_ring as usize;
    let mut viewpoints = Vec::with_capacity(num_rings * views_per_ring);

    let elevation_range = config.max_elevation - config.min_elevation;
    let elevation_step = if num_rings > 1 {
        elevation_range / (num_rings - 1) as f64
    } else {
        0.0
    };
    let angular_step = 360.0 / views_per_ring as f64;

    for ring in 0..num_rings {
        let elevation = config.min_elevation + elevation_step * ring as f64;

        let mut radius = config.base_radius;
        if config.vary_radius_per_ring {
            let variation = (ring as f64 * PI / num_rings as f64).sin();
            radius *= 1.0 + config.radius_variation * variation;
        }

        let mut azimuth_offset = config.start_azimuth;
        if config.stagger_rings {
            azimuth_offset += (ring % 2) as f64 * (angular_step / 2.0);
        }

        for view in 0..views_per_ring {
            let azimuth = azimuth_offset + view as f64 * angular_step;
            let position = spherical_to_cartesian(radius, elevation, azimuth, config.focus_point);

            let rotation = if config.look_at_focus_point {
                look_at(position, config.focus_point, config.pitch_offset)
            } else {
                // tangent of the orbit
                Rotator::new(-elevation, azimuth + 90.0, 0.0)
            };

            viewpoints.push(Viewpoint {
                id: viewpoints.len(),
                position,
                rotation,
                ring_index: ring,
                ring_position: view as f64 / views_per_ring as f64,
                distance: radius,
                elevation,
                azimuth,
            });
        }
    }

    viewpoints
}

fn generate_spherical(config: &TrajectoryConfig) -> Vec<Viewpoint> {
    let total = (config.num_rings * config.views_per_ring) as usize;
    let mut viewpoints = Vec::with_capacity(total);

    for i in 0..total {
        // angles come from the unit sphere so a zero radius still yields finite elevations
        let direction = fibonacci_sphere_point(i, total, 1.0, DVec3::ZERO);
        let position = config.focus_point + direction * config.base_radius;
        let elevation = direction.z.clamp(-1.0, 1.0).asin().to_degrees();

        if elevation < config.min_elevation || elevation > config.max_elevation {
            continue;
        }

        let rotation = if config.look_at_focus_point {
            look_at(position, config.focus_point, config.pitch_offset)
        } else {
            // facing away from the focus point
            Rotator::from_direction(direction)
        };

        viewpoints.push(Viewpoint {
            id: viewpoints.len(),
            position,
            rotation,
            ring_index: 0,
            ring_position: i as f64 / total as f64,
            distance: config.base_radius,
            elevation,
            azimuth: direction.y.atan2(direction.x).to_degrees(),
        });
    }

    viewpoints
}

fn generate_spiral(config: &TrajectoryConfig) -> Vec<Viewpoint> {
    let total = config.views_per_ring as usize * 3;
    let elevation_range = config.max_elevation - config.min_elevation;
    let mut viewpoints = Vec::with_capacity(total);

    for i in 0..total {
        let t = if total > 1 {
            i as f64 / (total - 1) as f64
        } else {
            0.0
        };

        let elevation = config.max_elevation - t * elevation_range;
        let azimuth = config.start_azimuth + t * 360.0 * 3.0;

        let mut radius = config.base_radius;
        if config.vary_radius_per_ring {
            radius *= 1.0 + config.radius_variation * (t * PI * 2.0).sin();
        }

        let position = spherical_to_cartesian(radius, elevation, azimuth, config.focus_point);
        let rotation = if config.look_at_focus_point {
            look_at(position, config.focus_point, config.pitch_offset)
        } else {
            Rotator::new(-elevation, azimuth + 90.0, 0.0)
        };

        viewpoints.push(Viewpoint {
            id: i,
            position,
            rotation,
            ring_index: (t * 3.0).floor().min(2.0) as usize,
            ring_position: t,
            distance: radius,
            elevation,
            azimuth: azimuth % 360.0,
        });
    }

    viewpoints
}

fn generate_hemisphere(config: &TrajectoryConfig) -> Vec<Viewpoint> {
    let hemisphere = TrajectoryConfig {
        min_elevation: config.min_elevation.max(0.0),
        max_elevation: config.max_elevation.min(85.0),
        custom_waypoints: Vec::new(),
        ..config.clone()
    };
    generate_orbital(&hemisphere)
}

fn generate_panoramic(config: &TrajectoryConfig) -> Vec<Viewpoint> {
    // forward, right, back, left, up, down
    const DIRECTIONS: [Rotator; 6] = [
        Rotator::new(0.0, 0.0, 0.0),
        Rotator::new(0.0, 90.0, 0.0),
        Rotator::new(0.0, 180.0, 0.0),
        Rotator::new(0.0, 270.0, 0.0),
        Rotator::new(90.0, 0.0, 0.0),
        Rotator::new(-90.0, 0.0, 0.0),
    ];

    let num_positions = config.views_per_ring as usize;
    let path_length = config.base_radius * 2.0;
    let step = if num_positions > 1 {
        path_length / (num_positions - 1) as f64
    } else {
        0.0
    };

    let mut viewpoints = Vec::with_capacity(num_positions * DIRECTIONS.len());
    for position_index in 0..num_positions {
        let x = if num_positions > 1 {
            -path_length / 2.0 + step * position_index as f64
        } else {
            0.0
        };
        let position = config.focus_point + DVec3::new(x, 0.0, 0.0);

        for (direction_index, rotation) in DIRECTIONS.iter().enumerate() {
            viewpoints.push(Viewpoint {
                id: viewpoints.len(),
                position,
                rotation: *rotation,
                ring_index: position_index,
                ring_position: direction_index as f64 / DIRECTIONS.len() as f64,
                distance: x.abs(),
                elevation: rotation.pitch,
                azimuth: rotation.yaw,
            });
        }
    }

    viewpoints
}

fn generate_custom(config: &TrajectoryConfig) -> Vec<Viewpoint> {
    config
        .custom_waypoints
        .iter()
        .enumerate()
        .map(|(i, waypoint)| {
            let local = waypoint.position - config.focus_point;
            let distance = local.length();
            let elevation = if distance > 0.0 {
                (local.z / distance).clamp(-1.0, 1.0).asin().to_degrees()
            } else {
                0.0
            };
            Viewpoint {
                id: i,
                position: waypoint.position,
                rotation: waypoint.rotation,
                ring_index: 0,
                ring_position: 0.0,
                distance,
                elevation,
                azimuth: local.y.atan2(local.x).to_degrees(),
            }
        })
        .collect()
}

/// Orientation looking from `camera` at `target`, with `pitch_offset` degrees added to pitch.
pub fn look_at(camera: DVec3, target: DVec3, pitch_offset: f64) -> Rotator {
    let direction = (target - camera).normalize_or_zero();
    let mut rotation = Rotator::from_direction(direction);
    rotation.pitch += pitch_offset;
    rotation
}

/// Position at `radius` from `center` for an elevation above the XY plane and an azimuth
/// measured from +X towards +Y, both in degrees.
pub fn spherical_to_cartesian(
    radius: f64,
    elevation_degrees: f64,
    azimuth_degrees: f64,
    center: DVec3,
) -> DVec3 {
    let (sin_elevation, cos_elevation) = elevation_degrees.to_radians().sin_cos();
    let (sin_azimuth, cos_azimuth) = azimuth_degrees.to_radians().sin_cos();
    center
        + DVec3::new(
            radius * cos_elevation * cos_azimuth,
            radius * cos_elevation * sin_azimuth,
            radius * sin_elevation,
        )
}

/// Point `index` of a `total` point Fibonacci sphere of `radius` around `center`.
///
/// Index 0 is the top of the sphere and `total - 1` the bottom.
pub fn fibonacci_sphere_point(index: usize, total: usize, radius: f64, center: DVec3) -> DVec3 {
    let z = if total > 1 {
        1.0 - (index as f64 / (total - 1) as f64) * 2.0
    } else {
        1.0
    };
    let ring_radius = (1.0 - z * z).max(0.0).sqrt();
    let theta = 2.0 * PI * index as f64 / GOLDEN_RATIO;

    center
        + DVec3::new(
            ring_radius * theta.cos() * radius,
            ring_radius * theta.sin() * radius,
            z * radius,
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::Transform;
    use approx::assert_relative_eq;

    fn orbital_config() -> TrajectoryConfig {
        TrajectoryConfig {
            num_rings: 3,
            views_per_ring: 12,
            vary_radius_per_ring: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_orbital_count_and_distance() {
        let config = TrajectoryConfig {
            focus_point: DVec3::new(100.0, -50.0, 20.0),
            ..orbital_config()
        };
        let viewpoints = generate_viewpoints(&config);
        assert_eq!(viewpoints.len(), 36);
        assert_eq!(viewpoints.len(), config.expected_viewpoint_count());

        for (i, vp) in viewpoints.iter().enumerate() {
            assert_eq!(vp.id, i);
            let distance = (vp.position - config.focus_point).length();
            assert_relative_eq!(distance, config.base_radius, epsilon = 1e-6);
            assert_relative_eq!(vp.distance, config.base_radius);

            let to_focus = (config.focus_point - vp.position).normalize();
            assert!(vp.forward().dot(to_focus) > 0.9);
        }
    }

    #[test]
    fn test_orbital_rings() {
        let viewpoints = generate_viewpoints(&orbital_config());
        let elevations = [-30.0, 15.0, 60.0];
        for vp in &viewpoints {
            assert_relative_eq!(vp.elevation, elevations[vp.ring_index], epsilon = 1e-9);
        }
        // odd rings are staggered by half a step
        assert_relative_eq!(viewpoints[0].azimuth, 0.0);
        assert_relative_eq!(viewpoints[12].azimuth, 15.0);
        assert_relative_eq!(viewpoints[13].ring_position, 1.0 / 12.0);
    }

    #[test]
    fn test_orbital_radius_variation() {
        let config = TrajectoryConfig {
            vary_radius_per_ring: true,
            ..orbital_config()
        };
        let viewpoints = generate_viewpoints(&config);
        let expected = 500.0 * (1.0 + 0.15 * (PI / 3.0).sin());
        assert_relative_eq!(viewpoints[0].distance, 500.0);
        assert_relative_eq!(viewpoints[12].distance, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_orbital_tangent_heading() {
        let config = TrajectoryConfig {
            look_at_focus_point: false,
            ..orbital_config()
        };
        let viewpoints = generate_viewpoints(&config);
        assert_relative_eq!(viewpoints[0].rotation.pitch, 30.0);
        assert_relative_eq!(viewpoints[0].rotation.yaw, 90.0);
    }

    #[test]
    fn test_single_ring() {
        let config = TrajectoryConfig {
            num_rings: 1,
            views_per_ring: 8,
            ..Default::default()
        };
        let viewpoints = generate_viewpoints(&config);
        assert_eq!(viewpoints.len(), 8);
        assert!(viewpoints.iter().all(|vp| vp.elevation == -30.0));
    }

    #[test]
    fn test_spherical_filters_elevation() {
        let config = TrajectoryConfig {
            kind: TrajectoryKind::Spherical,
            num_rings: 10,
            views_per_ring: 20,
            ..Default::default()
        };
        let viewpoints = generate_viewpoints(&config);
        assert!(!viewpoints.is_empty());
        assert!(viewpoints.len() < 200);
        for (i, vp) in viewpoints.iter().enumerate() {
            assert_eq!(vp.id, i);
            assert!(vp.elevation >= -30.0 && vp.elevation <= 60.0);
            assert_relative_eq!((vp.position - config.focus_point).length(), 500.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_spherical_zero_radius() {
        let config = TrajectoryConfig {
            kind: TrajectoryKind::Spherical,
            num_rings: 10,
            views_per_ring: 20,
            ..Default::default()
        };
        let expected = generate_viewpoints(&config);
        let collapsed = generate_viewpoints(&TrajectoryConfig {
            base_radius: 0.0,
            ..config.clone()
        });

        assert_eq!(collapsed.len(), expected.len());
        for (vp, reference) in collapsed.iter().zip(&expected) {
            assert!(vp.elevation.is_finite() && vp.azimuth.is_finite());
            assert_relative_eq!(vp.elevation, reference.elevation, epsilon = 1e-9);
            assert_eq!(vp.position, config.focus_point);
        }
    }

    #[test]
    fn test_spiral() {
        let config = TrajectoryConfig {
            kind: TrajectoryKind::Spiral,
            views_per_ring: 24,
            vary_radius_per_ring: false,
            ..Default::default()
        };
        let viewpoints = generate_viewpoints(&config);
        assert_eq!(viewpoints.len(), 72);
        assert_relative_eq!(viewpoints[0].elevation, 60.0);
        assert_relative_eq!(viewpoints[71].elevation, -30.0, epsilon = 1e-9);
        assert_relative_eq!(viewpoints[71].azimuth, 0.0, epsilon = 1e-9);
        assert_eq!(viewpoints[71].ring_index, 2);
        for vp in &viewpoints {
            assert!(vp.azimuth >= 0.0 && vp.azimuth < 360.0);
        }
    }

    #[test]
    fn test_hemisphere_clamps_elevation() {
        let config = TrajectoryConfig {
            kind: TrajectoryKind::Hemisphere,
            min_elevation: -45.0,
            max_elevation: 90.0,
            ..orbital_config()
        };
        let viewpoints = generate_viewpoints(&config);
        assert_eq!(viewpoints.len(), 36);
        assert_relative_eq!(viewpoints[0].elevation, 0.0);
        assert_relative_eq!(viewpoints[35].elevation, 85.0);
    }

    #[test]
    fn test_grid_falls_back_to_orbital() {
        let config = TrajectoryConfig {
            kind: TrajectoryKind::Grid,
            ..orbital_config()
        };
        assert_eq!(generate_viewpoints(&config), generate_viewpoints(&orbital_config()));
    }

    #[test]
    fn test_panoramic() {
        let config = TrajectoryConfig {
            kind: TrajectoryKind::Panoramic360,
            views_per_ring: 3,
            base_radius: 200.0,
            ..Default::default()
        };
        let viewpoints = generate_viewpoints(&config);
        assert_eq!(viewpoints.len(), 18);
        assert_eq!(viewpoints.len(), config.expected_viewpoint_count());
        assert_relative_eq!(viewpoints[0].position.x, -200.0);
        assert_relative_eq!(viewpoints[6].position.x, 0.0);
        assert_relative_eq!(viewpoints[17].position.x, 200.0);
        assert_eq!(viewpoints[7].ring_index, 1);

        // up looks up, down looks down
        assert_relative_eq!(viewpoints[4].forward().z, 1.0, epsilon = 1e-9);
        assert_relative_eq!(viewpoints[5].forward().z, -1.0, epsilon = 1e-9);

        let single = TrajectoryConfig {
            views_per_ring: 1,
            ..config
        };
        let viewpoints = generate_viewpoints(&single);
        assert_eq!(viewpoints.len(), 6);
        assert!(viewpoints.iter().all(|vp| vp.position == DVec3::ZERO));
    }

    #[test]
    fn test_custom() {
        let waypoints = vec![
            Transform::new(DVec3::new(100.0, 0.0, 0.0), Rotator::new(0.0, 180.0, 0.0)),
            Transform::new(DVec3::new(0.0, 100.0, 0.0), Rotator::new(0.0, -90.0, 0.0)),
        ];
        let config = TrajectoryConfig {
            kind: TrajectoryKind::Custom,
            custom_waypoints: waypoints.clone(),
            ..Default::default()
        };
        let viewpoints = generate_viewpoints(&config);
        assert_eq!(viewpoints.len(), 2);
        assert_eq!(viewpoints[1].transform(), waypoints[1]);
        assert_relative_eq!(viewpoints[1].azimuth, 90.0);
        assert_relative_eq!(viewpoints[0].distance, 100.0);
    }

    #[test]
    fn test_look_at() {
        let rotation = look_at(DVec3::new(100.0, 0.0, 100.0), DVec3::ZERO, 0.0);
        assert_relative_eq!(rotation.pitch, -45.0, epsilon = 1e-9);
        assert_relative_eq!(rotation.yaw, 180.0, epsilon = 1e-9);
        assert_eq!(rotation.roll, 0.0);

        let rotation = look_at(DVec3::new(100.0, 0.0, 0.0), DVec3::ZERO, -10.0);
        assert_relative_eq!(rotation.pitch, -10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_spherical_to_cartesian() {
        let p = spherical_to_cartesian(10.0, 0.0, 90.0, DVec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 12.0, epsilon = 1e-9);
        assert_relative_eq!(p.z, 3.0, epsilon = 1e-9);

        let p = spherical_to_cartesian(10.0, 90.0, 0.0, DVec3::ZERO);
        assert_relative_eq!(p.z, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fibonacci_sphere_point() {
        let top = fibonacci_sphere_point(0, 100, 2.0, DVec3::ZERO);
        assert_relative_eq!(top.z, 2.0);
        let bottom = fibonacci_sphere_point(99, 100, 2.0, DVec3::ZERO);
        assert_relative_eq!(bottom.z, -2.0);
        for i in 0..100 {
            let p = fibonacci_sphere_point(i, 100, 2.0, DVec3::ZERO);
            assert_relative_eq!(p.length(), 2.0, epsilon = 1e-9);
        }
        let single = fibonacci_sphere_point(0, 1, 1.0, DVec3::ZERO);
        assert!(single.is_finite());
    }
}

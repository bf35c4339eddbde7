mod analysis;
mod generator;

pub use analysis::*;
pub use generator::*;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::pointcloud::PointCloud;
use crate::transforms::{Rotator, Transform};

/// The algorithm used to place cameras around the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrajectoryKind {
    /// Stacked horizontal rings at evenly spaced elevations.
    #[default]
    Orbital,
    /// Fibonacci sphere distribution filtered by elevation.
    Spherical,
    /// Three revolutions descending from the maximum to the minimum elevation.
    Spiral,
    /// Orbital rings restricted to the upper hemisphere.
    Hemisphere,
    /// Regular grid layout. Generated as orbital rings.
    Grid,
    /// Six axis aligned views at positions along a line through the focus point.
    Panoramic360,
    /// Caller supplied waypoints.
    Custom,
}

/// Parameters of a camera trajectory. Lengths are in engine units, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Trajectory algorithm.
    pub kind: TrajectoryKind,
    /// Point the cameras orbit around.
    pub focus_point: DVec3,
    /// Distance from the focus point.
    pub base_radius: f64,
    /// Number of elevation rings.
    pub num_rings: u32,
    /// Number of views on each ring.
    pub views_per_ring: u32,
    /// Lowest ring elevation.
    pub min_elevation: f64,
    /// Highest ring elevation.
    pub max_elevation: f64,
    /// Azimuth of the first view of a ring.
    pub start_azimuth: f64,
    /// Vary the radius sinusoidally between rings.
    pub vary_radius_per_ring: bool,
    /// Relative amplitude of the radius variation.
    pub radius_variation: f64,
    /// Offset odd rings by half an angular step.
    pub stagger_rings: bool,
    /// Orient every camera towards the focus point.
    pub look_at_focus_point: bool,
    /// Pitch added on top of the look-at orientation.
    pub pitch_offset: f64,
    /// Waypoints used by [`TrajectoryKind::Custom`].
    pub custom_waypoints: Vec<Transform>,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            kind: TrajectoryKind::Orbital,
            focus_point: DVec3::ZERO,
            base_radius: 500.0,
            num_rings: 5,
            views_per_ring: 36,
            min_elevation: -30.0,
            max_elevation: 60.0,
            start_azimuth: 0.0,
            vary_radius_per_ring: true,
            radius_variation: 0.15,
            stagger_rings: true,
            look_at_focus_point: true,
            pitch_offset: 0.0,
            custom_waypoints: Vec::new(),
        }
    }
}

impl TrajectoryConfig {
    /// Number of viewpoints the configuration is expected to produce.
    ///
    /// Spherical and hemisphere counts are upper bounds.
    pub fn expected_viewpoint_count(&self) -> usize {
        let rings = self.num_rings as usize;
        let views = self.views_per_ring as usize;
        match self.kind {
            TrajectoryKind::Orbital
            | TrajectoryKind::Spherical
            | TrajectoryKind::Hemisphere
            | TrajectoryKind::Grid => rings * views,
            TrajectoryKind::Spiral => views * 3,
            TrajectoryKind::Panoramic360 => views * 6,
            TrajectoryKind::Custom => self.custom_waypoints.len(),
        }
    }
}

/// A generated camera pose together with where it sits on the trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    /// Sequence id, starting at zero.
    pub id: usize,
    /// Camera position in engine units.
    pub position: DVec3,
    /// Camera orientation in engine convention.
    pub rotation: Rotator,
    /// Ring the viewpoint belongs to.
    pub ring_index: usize,
    /// Fractional position along the ring in [0, 1).
    pub ring_position: f64,
    /// Distance from the focus point.
    pub distance: f64,
    /// Elevation above the focus point in degrees.
    pub elevation: f64,
    /// Azimuth around the focus point in degrees.
    pub azimuth: f64,
}

impl Viewpoint {
    /// The camera pose.
    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> DVec3 {
        self.rotation.forward()
    }
}

/// Axis aligned box in engine units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl BoundingBox {
    /// Create a new box from its corners.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Center of the box.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Half size of the box along each axis.
    pub fn extent(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }

    /// Bounds of a point cloud, or `None` if it is empty.
    pub fn from_pointcloud(pointcloud: &PointCloud) -> Option<Self> {
        if pointcloud.is_empty() {
            return None;
        }
        Some(Self::new(
            pointcloud.get_min_bound(),
            pointcloud.get_max_bound(),
        ))
    }
}

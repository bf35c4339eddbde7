use glam::DVec3;

use crate::trajectory::Viewpoint;
use crate::transforms::{direction_to_colmap, position_to_colmap};

/// Normal written for points that do not carry one.
pub const DEFAULT_NORMAL: [f64; 3] = [0.0, 0.0, 1.0];

/// Color written for points that do not carry one.
pub const DEFAULT_COLOR: [u8; 3] = [255, 255, 255];

/// A point cloud with points, colors, and normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The colors of the points.
    colors: Option<Vec<[u8; 3]>>,
    // The normals of the points.
    normals: Option<Vec<[f64; 3]>>,
}

impl PointCloud {
    /// Create a new point cloud from points, colors (optional), and normals (optional).
    pub fn new(
        points: Vec<[f64; 3]>,
        colors: Option<Vec<[u8; 3]>>,
        normals: Option<Vec<[f64; 3]>>,
    ) -> Self {
        Self {
            points,
            colors,
            normals,
        }
    }

    /// Build a point cloud in the COLMAP frame from engine mesh vertices.
    ///
    /// Normals and colors are kept only when they have one entry per vertex.
    pub fn from_mesh(vertices: &[DVec3], normals: &[DVec3], colors: &[[u8; 3]]) -> Self {
        let points = vertices
            .iter()
            .map(|v| position_to_colmap(*v).to_array())
            .collect::<Vec<_>>();

        let normals = (!normals.is_empty() && normals.len() == vertices.len()).then(|| {
            normals
                .iter()
                .map(|n| direction_to_colmap(*n).to_array())
                .collect()
        });

        let colors =
            (!colors.is_empty() && colors.len() == vertices.len()).then(|| colors.to_vec());

        Self::new(points, colors, normals)
    }

    /// Placeholder sparse cloud in the COLMAP frame built from the capture trajectory.
    ///
    /// For every viewpoint the camera position is added in red with its look direction as
    /// normal, followed by the focus point in white with an up normal.
    pub fn from_viewpoints(viewpoints: &[Viewpoint], focus_point: DVec3) -> Self {
        let mut points = Vec::with_capacity(viewpoints.len() * 2);
        let mut colors = Vec::with_capacity(viewpoints.len() * 2);
        let mut normals = Vec::with_capacity(viewpoints.len() * 2);

        let focus = position_to_colmap(focus_point).to_array();
        let up = direction_to_colmap(DVec3::Z).to_array();

        for viewpoint in viewpoints {
            points.push(position_to_colmap(viewpoint.position).to_array());
            colors.push([255, 0, 0]);
            normals.push(direction_to_colmap(viewpoint.forward()).to_array());

            points.push(focus);
            colors.push(DEFAULT_COLOR);
            normals.push(up);
        }

        Self::new(points, Some(colors), Some(normals))
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &Vec<[f64; 3]> {
        &self.points
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> Option<&Vec<[u8; 3]>> {
        self.colors.as_ref()
    }

    /// Get as reference the normals of the points in the point cloud.
    pub fn normals(&self) -> Option<&Vec<[f64; 3]>> {
        self.normals.as_ref()
    }

    /// Color of the point at `index`, white when the cloud has no colors.
    pub fn color_at(&self, index: usize) -> [u8; 3] {
        self.colors
            .as_ref()
            .and_then(|c| c.get(index).copied())
            .unwrap_or(DEFAULT_COLOR)
    }

    /// Normal of the point at `index`, +Z when the cloud has no normals.
    pub fn normal_at(&self, index: usize) -> [f64; 3] {
        self.normals
            .as_ref()
            .and_then(|n| n.get(index).copied())
            .unwrap_or(DEFAULT_NORMAL)
    }

    /// Get the minimum bound of the point cloud.
    pub fn get_min_bound(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        self.points
            .iter()
            .map(|&point| DVec3::from_array(point))
            .fold(DVec3::splat(f64::INFINITY), |a, b| a.min(b))
    }

    /// Get the maximum bound of the point cloud.
    pub fn get_max_bound(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        self.points
            .iter()
            .map(|&point| DVec3::from_array(point))
            .fold(DVec3::splat(f64::NEG_INFINITY), |a, b| a.max(b))
    }
}

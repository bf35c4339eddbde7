use crate::camera::ColmapCameraModel;

/// Point3D id of a keypoint that has no matching 3D point, as stored in text files.
pub const UNMATCHED_POINT3D_ID: i64 = -1;

/// Point3D id of a keypoint that has no matching 3D point, as stored in binary files.
pub const UNMATCHED_POINT3D_ID_BIN: u64 = u64::MAX;

/// Represents a camera in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapCamera {
    /// Camera id
    pub camera_id: u32,
    /// Camera model, which fixes the number of parameters
    pub model: ColmapCameraModel,
    /// Image width
    pub width: usize,
    /// Image height
    pub height: usize,
    /// Camera parameters
    pub params: Vec<f64>,
}

/// Represents an image in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapImage {
    /// Image name
    pub name: String,
    /// Image id
    pub image_id: u32,
    /// Camera id
    pub camera_id: u32,
    /// World-to-camera rotation
    pub rotation: [f64; 4], // qw, qx, qy, qz
    /// World-to-camera translation
    pub translation: [f64; 3], // x, y, z
    /// Keypoints as (x, y, point3d_id), with [`UNMATCHED_POINT3D_ID`] for unmatched ones
    pub points2d: Vec<(f64, f64, i64)>,
}

/// Represents a 3D point in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapPoint3d {
    /// Point3d id
    pub point3d_id: u64,
    /// x, y, z coordinates
    pub xyz: [f64; 3],
    /// rgb color
    pub rgb: [u8; 3],
    /// reprojection error
    pub error: f64,
    /// Track as (image_id, point2d_idx)
    pub track: Vec<(u32, u32)>,
}

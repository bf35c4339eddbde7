use glam::DMat3;
use serde::{Deserialize, Serialize};

use crate::report::ValidationReport;

/// Camera models this exporter can describe, with their COLMAP model ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColmapCameraModel {
    /// f, cx, cy
    SimplePinhole,
    /// fx, fy, cx, cy
    #[default]
    Pinhole,
    /// f, cx, cy, k1
    SimpleRadial,
    /// f, cx, cy, k1, k2
    Radial,
    /// fx, fy, cx, cy, k1, k2, p1, p2
    OpenCv,
    /// fx, fy, cx, cy, k1, k2, p1, p2, k3, k4, k5, k6
    FullOpenCv,
}

impl ColmapCameraModel {
    const ALL: [ColmapCameraModel; 6] = [
        ColmapCameraModel::SimplePinhole,
        ColmapCameraModel::Pinhole,
        ColmapCameraModel::SimpleRadial,
        ColmapCameraModel::Radial,
        ColmapCameraModel::OpenCv,
        ColmapCameraModel::FullOpenCv,
    ];

    /// The COLMAP model id.
    pub fn model_id(&self) -> i32 {
        match self {
            ColmapCameraModel::SimplePinhole => 0,
            ColmapCameraModel::Pinhole => 1,
            ColmapCameraModel::SimpleRadial => 2,
            ColmapCameraModel::Radial => 3,
            ColmapCameraModel::OpenCv => 4,
            ColmapCameraModel::FullOpenCv => 6,
        }
    }

    /// The COLMAP model name as written in `cameras.txt`.
    pub fn model_name(&self) -> &'static str {
        match self {
            ColmapCameraModel::SimplePinhole => "SIMPLE_PINHOLE",
            ColmapCameraModel::Pinhole => "PINHOLE",
            ColmapCameraModel::SimpleRadial => "SIMPLE_RADIAL",
            ColmapCameraModel::Radial => "RADIAL",
            ColmapCameraModel::OpenCv => "OPENCV",
            ColmapCameraModel::FullOpenCv => "FULL_OPENCV",
        }
    }

    /// The model with the given COLMAP id, if it is one of the supported models.
    pub fn from_model_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|model| model.model_id() == id)
    }

    /// The model with the given COLMAP name, if it is one of the supported models.
    pub fn from_model_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|model| model.model_name() == name)
    }

    /// Number of parameters the model serializes.
    pub fn num_params(&self) -> usize {
        match self {
            ColmapCameraModel::SimplePinhole => 3,
            ColmapCameraModel::Pinhole | ColmapCameraModel::SimpleRadial => 4,
            ColmapCameraModel::Radial => 5,
            ColmapCameraModel::OpenCv => 8,
            ColmapCameraModel::FullOpenCv => 12,
        }
    }
}

/// Pinhole camera parameters in pixels with optional distortion coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraIntrinsics {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Focal length along x in pixels.
    pub fx: f64,
    /// Focal length along y in pixels.
    pub fy: f64,
    /// Principal point x in pixels.
    pub cx: f64,
    /// Principal point y in pixels.
    pub cy: f64,
    /// First radial distortion coefficient.
    pub k1: f64,
    /// Second radial distortion coefficient.
    pub k2: f64,
    /// First tangential distortion coefficient.
    pub p1: f64,
    /// Second tangential distortion coefficient.
    pub p2: f64,
    /// The COLMAP model the parameters are serialized as.
    pub model: ColmapCameraModel,
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::from_fov(1920, 1080, 90.0)
    }
}

impl CameraIntrinsics {
    /// Pinhole intrinsics with square pixels and a centered principal point.
    ///
    /// # Arguments
    ///
    /// * `width` - Image width in pixels.
    /// * `height` - Image height in pixels.
    /// * `horizontal_fov` - Horizontal field of view in degrees.
    pub fn from_fov(width: u32, height: u32, horizontal_fov: f64) -> Self {
        Self::from_fov_with_model(width, height, horizontal_fov, ColmapCameraModel::Pinhole)
    }

    /// Same as [`CameraIntrinsics::from_fov`] with an explicit camera model.
    pub fn from_fov_with_model(
        width: u32,
        height: u32,
        horizontal_fov: f64,
        model: ColmapCameraModel,
    ) -> Self {
        let f = focal_from_fov(horizontal_fov, width as f64);
        Self {
            width,
            height,
            fx: f,
            fy: f,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
            k1: 0.0,
            k2: 0.0,
            p1: 0.0,
            p2: 0.0,
            model,
        }
    }

    /// Pinhole intrinsics from a physical sensor and lens.
    ///
    /// # Arguments
    ///
    /// * `sensor_width_mm` - Sensor width in millimeters.
    /// * `sensor_height_mm` - Sensor height in millimeters.
    /// * `focal_length_mm` - Lens focal length in millimeters.
    /// * `width` - Image width in pixels.
    /// * `height` - Image height in pixels.
    pub fn from_sensor(
        sensor_width_mm: f64,
        sensor_height_mm: f64,
        focal_length_mm: f64,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            width,
            height,
            fx: (focal_length_mm / sensor_width_mm) * width as f64,
            fy: (focal_length_mm / sensor_height_mm) * height as f64,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
            k1: 0.0,
            k2: 0.0,
            p1: 0.0,
            p2: 0.0,
            model: ColmapCameraModel::Pinhole,
        }
    }

    /// Whether every dimension, focal length and principal point coordinate is positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.fx > 0.0
            && self.fy > 0.0
            && self.cx > 0.0
            && self.cy > 0.0
    }

    /// Width over height, or zero for a degenerate image.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    /// Horizontal field of view in degrees.
    pub fn horizontal_fov(&self) -> f64 {
        fov_from_focal(self.fx, self.width as f64)
    }

    /// Vertical field of view in degrees.
    pub fn vertical_fov(&self) -> f64 {
        fov_from_focal(self.fy, self.height as f64)
    }

    /// The 3x3 camera matrix K.
    pub fn intrinsic_matrix(&self) -> DMat3 {
        DMat3::from_cols_array_2d(&[
            [self.fx, 0.0, 0.0],
            [0.0, self.fy, 0.0],
            [self.cx, self.cy, 1.0],
        ])
    }

    /// Parameter vector in the order of the camera model.
    pub fn colmap_params(&self) -> Vec<f64> {
        match self.model {
            ColmapCameraModel::SimplePinhole => vec![self.fx, self.cx, self.cy],
            ColmapCameraModel::Pinhole => vec![self.fx, self.fy, self.cx, self.cy],
            ColmapCameraModel::SimpleRadial => vec![self.fx, self.cx, self.cy, self.k1],
            ColmapCameraModel::Radial => vec![self.fx, self.cx, self.cy, self.k1, self.k2],
            ColmapCameraModel::OpenCv => vec![
                self.fx, self.fy, self.cx, self.cy, self.k1, self.k2, self.p1, self.p2,
            ],
            // k3..k6 are not tracked
            ColmapCameraModel::FullOpenCv => vec![
                self.fx, self.fy, self.cx, self.cy, self.k1, self.k2, self.p1, self.p2, 0.0,
                0.0, 0.0, 0.0,
            ],
        }
    }

    /// Space separated parameters with 10 decimal digits, as written in `cameras.txt`.
    pub fn colmap_params_string(&self) -> String {
        self.colmap_params()
            .iter()
            .map(|p| format!("{p:.10}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check the intrinsics for 3DGS training suitability.
    ///
    /// Only non-positive parameters are fatal; everything else is advisory.
    pub fn validate_for_3dgs(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        if self.width < 800 || self.height < 600 {
            report.warn("Resolution below 800x600 may result in poor 3DGS training quality");
        }
        if self.width > 4096 || self.height > 4096 {
            report.warn("Resolution above 4096 may significantly increase training time");
        }

        let hfov = self.horizontal_fov();
        if hfov < 30.0 {
            report.warn(format!(
                "Very narrow FOV ({hfov:.1} deg) may cause sparse coverage"
            ));
        } else if hfov > 120.0 {
            report.warn(format!(
                "Very wide FOV ({hfov:.1} deg) may cause distortion issues"
            ));
        }

        let aspect = self.aspect_ratio();
        if !(0.5..=2.5).contains(&aspect) {
            report.warn(format!(
                "Unusual aspect ratio ({aspect:.2}) - typical is 1.33-1.78"
            ));
        }

        let cx_offset = (self.cx - self.width as f64 / 2.0).abs();
        let cy_offset = (self.cy - self.height as f64 / 2.0).abs();
        if cx_offset > self.width as f64 * 0.1 || cy_offset > self.height as f64 * 0.1 {
            report.warn("Principal point significantly off-center (>10%)");
        }

        if !self.is_valid() {
            report.fail("Invalid intrinsics: zero or negative values detected");
        }

        if self.fy != 0.0 {
            let ratio = self.fx / self.fy;
            if (ratio - 1.0).abs() > 0.01 {
                report.warn(format!("Non-square pixels detected (fx/fy = {ratio:.3})"));
            }
        }

        report
    }
}

/// Focal length in pixels covering `fov_degrees` over `dimension` pixels.
pub fn focal_from_fov(fov_degrees: f64, dimension: f64) -> f64 {
    (dimension / 2.0) / (fov_degrees.to_radians() / 2.0).tan()
}

/// Field of view in degrees covered by a focal length of `focal` pixels over `dimension` pixels.
pub fn fov_from_focal(focal: f64, dimension: f64) -> f64 {
    (2.0 * ((dimension / 2.0) / focal).atan()).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_focal_from_fov() {
        assert_relative_eq!(focal_from_fov(90.0, 1920.0), 960.0, epsilon = 1e-9);
        let f = focal_from_fov(75.0, 1920.0);
        assert_relative_eq!(fov_from_focal(f, 1920.0), 75.0, epsilon = 1e-3);
    }

    #[test]
    fn test_from_fov() {
        let k = CameraIntrinsics::from_fov(1920, 1080, 90.0);
        assert_relative_eq!(k.fx, 960.0, epsilon = 1e-9);
        assert_eq!(k.fx, k.fy);
        assert_eq!(k.cx, 960.0);
        assert_eq!(k.cy, 540.0);
        assert!(k.is_valid());
        assert_relative_eq!(k.horizontal_fov(), 90.0, epsilon = 1e-9);
        assert_eq!(k.model, ColmapCameraModel::Pinhole);

        let m = k.intrinsic_matrix();
        assert_eq!(m.x_axis.x, k.fx);
        assert_eq!(m.z_axis.x, k.cx);
        assert_eq!(m.z_axis.y, k.cy);
        assert_eq!(m.z_axis.z, 1.0);
    }

    #[test]
    fn test_from_sensor() {
        let k = CameraIntrinsics::from_sensor(36.0, 24.0, 50.0, 1920, 1080);
        assert_relative_eq!(k.fx, 50.0 / 36.0 * 1920.0, epsilon = 1e-9);
        assert_relative_eq!(k.fy, 50.0 / 24.0 * 1080.0, epsilon = 1e-9);
    }

    #[test]
    fn test_is_valid() {
        let mut k = CameraIntrinsics::from_fov(640, 480, 60.0);
        assert!(k.is_valid());
        k.cy = 0.0;
        assert!(!k.is_valid());
        let k = CameraIntrinsics::from_fov(0, 480, 60.0);
        assert!(!k.is_valid());
    }

    #[test]
    fn test_model_taxonomy() {
        let cases = [
            (ColmapCameraModel::SimplePinhole, 0, "SIMPLE_PINHOLE", 3),
            (ColmapCameraModel::Pinhole, 1, "PINHOLE", 4),
            (ColmapCameraModel::SimpleRadial, 2, "SIMPLE_RADIAL", 4),
            (ColmapCameraModel::Radial, 3, "RADIAL", 5),
            (ColmapCameraModel::OpenCv, 4, "OPENCV", 8),
            (ColmapCameraModel::FullOpenCv, 6, "FULL_OPENCV", 12),
        ];
        for (model, id, name, num_params) in cases {
            assert_eq!(model.model_id(), id);
            assert_eq!(model.model_name(), name);
            assert_eq!(model.num_params(), num_params);
            assert_eq!(ColmapCameraModel::from_model_id(id), Some(model));
            assert_eq!(ColmapCameraModel::from_model_name(name), Some(model));

            let k = CameraIntrinsics::from_fov_with_model(1920, 1080, 90.0, model);
            assert_eq!(k.colmap_params().len(), num_params);
            let tokens = k.colmap_params_string();
            assert_eq!(tokens.split_whitespace().count(), num_params);
            assert!(tokens.starts_with("960.0000000000"));
        }
        assert_eq!(ColmapCameraModel::from_model_id(5), None);
        assert_eq!(ColmapCameraModel::from_model_name("OPENCV_FISHEYE"), None);
    }

    #[test]
    fn test_validate_for_3dgs() {
        let k = CameraIntrinsics::from_fov(1920, 1080, 90.0);
        assert!(k.validate_for_3dgs().is_clean());

        let k = CameraIntrinsics::from_fov(640, 480, 20.0);
        let report = k.validate_for_3dgs();
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 2);

        let mut k = CameraIntrinsics::from_fov(1920, 1080, 90.0);
        k.fy = 900.0;
        k.cx = 100.0;
        let report = k.validate_for_3dgs();
        assert!(report.valid);
        assert!(report.warnings.iter().any(|w| w.contains("off-center")));
        assert!(report.warnings.iter().any(|w| w.contains("Non-square")));

        let mut k = CameraIntrinsics::from_fov(1920, 1080, 90.0);
        k.fx = -1.0;
        assert!(!k.validate_for_3dgs().valid);
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use splatcap_3d::io::colmap::ColmapFormat;
use splatcap_3d::report::ValidationReport;
use splatcap_3d::trajectory::{validate_config, TrajectoryConfig};
use splatcap_depth::extract::DepthExtractionConfig;

use super::CaptureError;

/// Compression of the captured color images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageFormat {
    /// `.jpg`
    #[default]
    Jpeg,
    /// `.png`
    Png,
}

impl ImageFormat {
    /// File extension including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => ".jpg",
            ImageFormat::Png => ".png",
        }
    }
}

/// Everything a capture session needs to produce a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Dataset root. Required.
    pub output_directory: PathBuf,
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Horizontal field of view in degrees.
    pub field_of_view: f64,
    /// Camera trajectory.
    pub trajectory: TrajectoryConfig,
    /// Capture and export a depth map per frame.
    pub capture_depth: bool,
    /// Depth extraction options.
    pub depth: DepthExtractionConfig,
    /// Write the placeholder point cloud to `sparse/0/points3D.ply`.
    pub export_point_cloud: bool,
    /// Color image format.
    pub image_format: ImageFormat,
    /// JPEG quality passed to the capture backend, 1 to 100.
    pub jpeg_quality: u8,
    /// Text or binary sparse model.
    pub colmap_format: ColmapFormat,
    /// Pause between frames in seconds, letting the scene settle.
    pub capture_delay: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::new(),
            image_width: 1920,
            image_height: 1080,
            field_of_view: 90.0,
            trajectory: TrajectoryConfig::default(),
            capture_depth: true,
            depth: DepthExtractionConfig::default(),
            export_point_cloud: true,
            image_format: ImageFormat::Jpeg,
            jpeg_quality: 95,
            colmap_format: ColmapFormat::Text,
            capture_delay: 0.1,
        }
    }
}

impl CaptureConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// Save the configuration as pretty printed JSON.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), CaptureError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check the configuration, including its trajectory.
    ///
    /// A missing output directory is fatal. Resolution, field of view and trajectory findings
    /// are advisory unless the trajectory report itself is invalid.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        if self.output_directory.as_os_str().is_empty() {
            report.fail("Output directory not specified");
        }

        if self.image_width < 640 || self.image_height < 480 {
            report.warn("Resolution below 640x480 may result in poor training quality");
        }
        if self.image_width > 4096 || self.image_height > 4096 {
            report.warn("Resolution above 4096 may significantly increase capture and training time");
        }

        report.merge(validate_config(&self.trajectory));
        if self.capture_depth {
            report.merge(self.depth.validate());
        }

        if !(45.0..=120.0).contains(&self.field_of_view) {
            report.warn(format!(
                "Unusual FOV ({:.1}). 60-90 recommended for 3DGS.",
                self.field_of_view
            ));
        }

        report
    }
}

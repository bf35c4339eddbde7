use serde::{Deserialize, Serialize};

use crate::error::DepthError;
use splatcap_3d::report::ValidationReport;
use splatcap_3d::transforms::CM_TO_METERS;

/// File format of exported depth maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DepthFormat {
    /// 8 bit grayscale PNG of the normalized depth.
    Png16,
    /// Raw float32 samples with a JSON sidecar.
    #[default]
    Exr32,
    /// NumPy `.npy` array of shape `(height, width)`.
    Npy,
    /// Bare little-endian float32 samples.
    RawFloat32,
}

impl DepthFormat {
    /// File extension of the format, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            DepthFormat::Png16 => "png",
            DepthFormat::Exr32 => "exr",
            DepthFormat::Npy => "npy",
            DepthFormat::RawFloat32 => "raw",
        }
    }
}

/// Options of the depth extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthExtractionConfig {
    /// Output format.
    pub format: DepthFormat,
    /// Near clip plane in engine units.
    pub near_plane: f32,
    /// Far clip plane in engine units.
    pub far_plane: f32,
    /// Convert depth to meters after linearization.
    pub export_in_meters: bool,
    /// Apply a gamma remap to the depth range.
    pub apply_gamma_correction: bool,
    /// Gamma of the remap.
    pub gamma: f32,
    /// Store `1 / depth` instead of depth.
    pub invert_depth: bool,
}

impl Default for DepthExtractionConfig {
    fn default() -> Self {
        Self {
            format: DepthFormat::Exr32,
            near_plane: 10.0,
            far_plane: 100_000.0,
            export_in_meters: true,
            apply_gamma_correction: false,
            gamma: 2.2,
            invert_depth: false,
        }
    }
}

impl DepthExtractionConfig {
    /// Whether the clip planes are finite and ordered `0 < near < far`.
    pub fn has_valid_planes(&self) -> bool {
        self.near_plane.is_finite()
            && self.far_plane.is_finite()
            && self.near_plane > 0.0
            && self.near_plane < self.far_plane
    }

    /// Check the options before a capture.
    ///
    /// Invalid clip planes are fatal, a non-positive gamma is advisory.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if !self.has_valid_planes() {
            report.fail(format!(
                "Invalid depth clip planes (near {}, far {}). Expected 0 < near < far.",
                self.near_plane, self.far_plane
            ));
        }
        if self.apply_gamma_correction && (self.gamma.is_nan() || self.gamma <= 0.0) {
            report.warn(format!(
                "Gamma correction enabled with non-positive gamma ({})",
                self.gamma
            ));
        }
        report
    }
}

/// A linearized depth map.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthExtractionResult {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Row-major depth samples.
    pub data: Vec<f32>,
    /// Smallest sample.
    pub min_depth: f32,
    /// Largest sample.
    pub max_depth: f32,
    /// Near clip plane, in the units of `data`.
    pub near_plane: f32,
    /// Far clip plane, in the units of `data`.
    pub far_plane: f32,
    /// Whether `data` holds linear depth.
    pub is_linear: bool,
    /// Whether `data` is expressed in meters.
    pub in_meters: bool,
}

impl DepthExtractionResult {
    /// Whether the dimensions are non-zero and match the sample count.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.width.checked_mul(self.height) == Some(self.data.len())
    }

    /// The sample at a pixel, or `None` outside the image.
    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            self.data.get(y * self.width + x).copied()
        } else {
            None
        }
    }

    /// Scale samples, range and clip planes from centimeters to meters.
    pub fn convert_to_meters(&mut self) {
        let scale = CM_TO_METERS as f32;
        self.data.iter_mut().for_each(|d| *d *= scale);
        self.min_depth *= scale;
        self.max_depth *= scale;
        self.near_plane *= scale;
        self.far_plane *= scale;
        self.in_meters = true;
    }
}

/// Convert a reversed-Z depth buffer sample to linear depth.
///
/// A sample of 1 is the near plane and 0 the far plane. The result is clamped to the planes.
pub fn scene_depth_to_linear(scene_depth: f32, near_plane: f32, far_plane: f32) -> f32 {
    if scene_depth >= 1.0 {
        return near_plane;
    }
    if scene_depth <= 0.0 {
        return far_plane;
    }
    // max/min instead of clamp: unordered or NaN planes must not panic
    (near_plane / scene_depth).max(near_plane).min(far_plane)
}

/// Linearize a float depth buffer, one sample per pixel.
///
/// # Arguments
///
/// * `raw` - Reversed-Z samples, row-major.
/// * `width` - Width in pixels.
/// * `height` - Height in pixels.
/// * `config` - Clip planes and post-processing options.
pub fn extract_depth(
    raw: &[f32],
    width: usize,
    height: usize,
    config: &DepthExtractionConfig,
) -> Result<DepthExtractionResult, DepthError> {
    linearize(raw.iter().copied(), raw.len(), width, height, config)
}

/// Linearize an 8 bit depth buffer, normalizing each sample by 255.
pub fn extract_depth_from_u8(
    raw: &[u8],
    width: usize,
    height: usize,
    config: &DepthExtractionConfig,
) -> Result<DepthExtractionResult, DepthError> {
    linearize(
        raw.iter().map(|&v| v as f32 / 255.0),
        raw.len(),
        width,
        height,
        config,
    )
}

fn linearize(
    samples: impl Iterator<Item = f32>,
    num_samples: usize,
    width: usize,
    height: usize,
    config: &DepthExtractionConfig,
) -> Result<DepthExtractionResult, DepthError> {
    if width == 0 || height == 0 {
        return Err(DepthError::InvalidResult);
    }
    let expected = width
        .checked_mul(height)
        .ok_or(DepthError::LengthMismatch {
            expected: usize::MAX,
            actual: num_samples,
        })?;
    if num_samples != expected {
        return Err(DepthError::LengthMismatch {
            expected,
            actual: num_samples,
        });
    }
    if !config.has_valid_planes() {
        return Err(DepthError::InvalidClipPlanes {
            near: config.near_plane,
            far: config.far_plane,
        });
    }

    let mut min_depth = f32::MAX;
    let mut max_depth = f32::MIN;
    let data = samples
        .map(|sample| {
            let depth = scene_depth_to_linear(sample, config.near_plane, config.far_plane);
            min_depth = min_depth.min(depth);
            max_depth = max_depth.max(depth);
            depth
        })
        .collect::<Vec<_>>();

    let mut result = DepthExtractionResult {
        width,
        height,
        data,
        min_depth,
        max_depth,
        near_plane: config.near_plane,
        far_plane: config.far_plane,
        is_linear: true,
        in_meters: false,
    };
    post_process(&mut result, config);

    log::debug!(
        "extracted {}x{} depth, range [{}, {}]",
        width,
        height,
        result.min_depth,
        result.max_depth
    );

    Ok(result)
}

/// Apply unit conversion, gamma remap and inversion, in that order.
pub fn post_process(result: &mut DepthExtractionResult, config: &DepthExtractionConfig) {
    if config.export_in_meters {
        result.convert_to_meters();
    }

    if config.apply_gamma_correction {
        let range = result.max_depth - result.min_depth;
        if range > 0.0 {
            let min = result.min_depth;
            for d in result.data.iter_mut() {
                let normalized = ((*d - min) / range).powf(1.0 / config.gamma);
                *d = min + normalized * range;
            }
        }
    }

    if config.invert_depth {
        for d in result.data.iter_mut() {
            if *d > 1e-4 {
                *d = 1.0 / *d;
            }
        }
        let min = result.min_depth;
        result.min_depth = 1.0 / result.max_depth;
        result.max_depth = 1.0 / min;
    }
}

use glam::{Quat, Vec3};

use super::properties::{GaussianRecord, SH_REST_COUNT};
use crate::pointcloud::PointCloud;
use crate::report::ValidationReport;

/// Zeroth order real spherical harmonic basis value, `1 / (2 * sqrt(pi))`.
pub const SH_C0: f64 = 0.28209479177387814;

/// Default log-space scale of a freshly initialized splat.
pub const DEFAULT_INITIAL_SCALE: f32 = -5.0;

/// Bytes per splat used for memory estimates.
pub const SPLAT_MEMORY_BYTES: usize = 236;

/// Splat counts below this are reported as too sparse.
const LOW_SPLAT_COUNT: usize = 1_000;

/// Splat counts above this are reported as too dense.
const HIGH_SPLAT_COUNT: usize = 10_000_000;

/// A 3D gaussian as stored by 3DGS training code.
///
/// Scale is stored in log space and opacity as a plain value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianSplat {
    /// Center in the COLMAP frame, meters.
    pub position: Vec3,
    /// Normal, unused by training but kept by the file format.
    pub normal: Vec3,
    /// DC spherical harmonic coefficients (base color).
    pub sh_dc: Vec3,
    /// Higher order spherical harmonic coefficients.
    pub sh_rest: [f32; SH_REST_COUNT],
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Per axis log-space scale.
    pub scale: Vec3,
    /// Orientation.
    pub rotation: Quat,
}

impl Default for GaussianSplat {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            sh_dc: Vec3::splat(0.5),
            sh_rest: [0.0; SH_REST_COUNT],
            opacity: 1.0,
            scale: Vec3::splat(DEFAULT_INITIAL_SCALE),
            rotation: Quat::IDENTITY,
        }
    }
}

impl GaussianSplat {
    /// Create a splat at a position with the base color of an RGB triple.
    pub fn from_position_color(position: Vec3, color: [u8; 3]) -> Self {
        Self {
            position,
            sh_dc: color_to_sh_dc(color),
            ..Default::default()
        }
    }

    /// Create a splat at a position with a normal and the base color of an RGB triple.
    pub fn from_position_color_normal(position: Vec3, color: [u8; 3], normal: Vec3) -> Self {
        Self {
            normal,
            ..Self::from_position_color(position, color)
        }
    }

    /// The RGB color encoded by the DC coefficients.
    pub fn color(&self) -> [u8; 3] {
        sh_dc_to_color(self.sh_dc)
    }

    pub(crate) fn to_record(&self) -> GaussianRecord {
        GaussianRecord {
            position: self.position.to_array(),
            normal: self.normal.to_array(),
            f_dc: self.sh_dc.to_array(),
            f_rest: self.sh_rest,
            opacity: self.opacity,
            scale: self.scale.to_array(),
            rotation: self.rotation.to_array(),
        }
    }

    pub(crate) fn from_record(record: &GaussianRecord) -> Self {
        Self {
            position: Vec3::from_array(record.position),
            normal: Vec3::from_array(record.normal),
            sh_dc: Vec3::from_array(record.f_dc),
            sh_rest: record.f_rest,
            opacity: record.opacity,
            scale: Vec3::from_array(record.scale),
            rotation: Quat::from_array(record.rotation),
        }
    }
}

/// Convert an RGB color to DC spherical harmonic coefficients.
pub fn color_to_sh_dc(color: [u8; 3]) -> Vec3 {
    let channel = |c: u8| ((c as f64 / 255.0 - 0.5) / SH_C0) as f32;
    Vec3::new(channel(color[0]), channel(color[1]), channel(color[2]))
}

/// Convert DC spherical harmonic coefficients back to an RGB color.
pub fn sh_dc_to_color(sh_dc: Vec3) -> [u8; 3] {
    let channel = |sh: f32| ((sh as f64 * SH_C0 + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8;
    [channel(sh_dc.x), channel(sh_dc.y), channel(sh_dc.z)]
}

/// Initialize one splat per point of a cloud already expressed in the COLMAP frame.
///
/// # Arguments
///
/// * `cloud` - Source points, colors and normals. Missing colors and normals take the cloud defaults.
/// * `initial_scale` - Log-space scale applied on all three axes.
pub fn create_splats_from_pointcloud(cloud: &PointCloud, initial_scale: f32) -> Vec<GaussianSplat> {
    (0..cloud.len())
        .map(|i| {
            let [x, y, z] = cloud.points()[i];
            let [nx, ny, nz] = cloud.normal_at(i);
            GaussianSplat {
                scale: Vec3::splat(initial_scale),
                ..GaussianSplat::from_position_color_normal(
                    Vec3::new(x as f32, y as f32, z as f32),
                    cloud.color_at(i),
                    Vec3::new(nx as f32, ny as f32, nz as f32),
                )
            }
        })
        .collect()
}

/// Estimated memory footprint in bytes of `num_splats` splats.
pub fn estimate_memory_usage(num_splats: usize) -> usize {
    num_splats * SPLAT_MEMORY_BYTES
}

/// Check splats for values that would break training.
///
/// Non-finite positions and an empty input are fatal. Out of range opacity, extreme scales,
/// non-unit rotations and unusual splat counts are advisory.
pub fn validate_splats(splats: &[GaussianSplat]) -> ValidationReport {
    let mut report = ValidationReport::new();

    if splats.is_empty() {
        report.fail("Empty splat array");
        return report;
    }

    let mut invalid_positions = 0;
    let mut invalid_opacity = 0;
    let mut extreme_scale = 0;
    let mut invalid_rotation = 0;

    for splat in splats {
        if !splat.position.is_finite() {
            invalid_positions += 1;
        }
        if !(0.0..=1.0).contains(&splat.opacity) {
            invalid_opacity += 1;
        }
        if !(-20.0..=10.0).contains(&splat.scale.x) {
            extreme_scale += 1;
        }
        if (splat.rotation.length() - 1.0).abs() > 0.01 {
            invalid_rotation += 1;
        }
    }

    if invalid_positions > 0 {
        report.fail(format!("{invalid_positions} splats have invalid positions"));
    }
    if invalid_opacity > 0 {
        report.warn(format!("{invalid_opacity} splats have invalid opacity values"));
    }
    if extreme_scale > 0 {
        report.warn(format!("{extreme_scale} splats have extreme scale values"));
    }
    if invalid_rotation > 0 {
        report.warn(format!(
            "{invalid_rotation} splats have non-unit rotation quaternions"
        ));
    }

    let count = splats.len();
    if count < LOW_SPLAT_COUNT {
        report.warn(format!(
            "Low splat count ({count}). 10K-1M typical for quality scenes."
        ));
    } else if count > HIGH_SPLAT_COUNT {
        report.warn(format!(
            "Very high splat count ({count}). May impact performance."
        ));
    }

    if !report.valid {
        log::warn!("splat validation failed: {report}");
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_sh_roundtrip() {
        for color in [[0, 0, 0], [255, 255, 255], [128, 64, 192], [1, 254, 127]] {
            let recovered = sh_dc_to_color(color_to_sh_dc(color));
            for c in 0..3 {
                assert!((recovered[c] as i32 - color[c] as i32).abs() <= 1);
            }
        }
        assert_eq!(color_to_sh_dc([255, 255, 255]).x, (0.5 / SH_C0) as f32);
        assert_eq!(sh_dc_to_color(Vec3::splat(100.0)), [255, 255, 255]);
        assert_eq!(sh_dc_to_color(Vec3::splat(-100.0)), [0, 0, 0]);
    }

    #[test]
    fn test_splat_defaults() {
        let splat = GaussianSplat::default();
        assert_eq!(splat.normal, Vec3::Z);
        assert_eq!(splat.opacity, 1.0);
        assert_eq!(splat.scale, Vec3::splat(-5.0));
        assert_eq!(splat.rotation, Quat::IDENTITY);
        assert!(splat.sh_rest.iter().all(|&v| v == 0.0));

        let splat = GaussianSplat::from_position_color(Vec3::ONE, [200, 100, 50]);
        assert_eq!(splat.color(), [200, 100, 50]);
    }

    #[test]
    fn test_record_conversion() {
        let splat = GaussianSplat {
            rotation: Quat::from_rotation_z(0.3),
            opacity: 0.25,
            ..GaussianSplat::from_position_color(Vec3::new(1.0, 2.0, 3.0), [10, 20, 30])
        };
        let record = splat.to_record();
        assert_eq!(record.rotation[3], splat.rotation.w);
        assert_eq!(GaussianSplat::from_record(&record), splat);
    }

    #[test]
    fn test_create_splats_from_pointcloud() {
        let cloud = PointCloud::new(
            vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            Some(vec![[255, 0, 0], [0, 255, 0]]),
            None,
        );
        let splats = create_splats_from_pointcloud(&cloud, -3.0);
        assert_eq!(splats.len(), 2);
        assert_eq!(splats[0].position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(splats[1].color(), [0, 255, 0]);
        assert_eq!(splats[0].normal, Vec3::Z);
        assert_eq!(splats[0].scale, Vec3::splat(-3.0));
        assert_eq!(splats[0].opacity, 1.0);
    }

    #[test]
    fn test_estimate_memory_usage() {
        assert_eq!(estimate_memory_usage(100_000), 100_000 * 236);
        assert_eq!(estimate_memory_usage(1_000_000), 1_000_000 * 236);
    }

    #[test]
    fn test_validate_splats() {
        assert!(!validate_splats(&[]).valid);

        let mut splats = vec![GaussianSplat::default(); 2000];
        assert!(validate_splats(&splats).is_clean());

        splats[0].opacity = 1.5;
        splats[1].scale.x = 30.0;
        splats[2].rotation = Quat::from_xyzw(0.0, 0.0, 0.0, 2.0);
        let report = validate_splats(&splats);
        assert!(report.valid);
        assert_eq!(
            report.warnings,
            vec![
                "1 splats have invalid opacity values".to_string(),
                "1 splats have extreme scale values".to_string(),
                "1 splats have non-unit rotation quaternions".to_string(),
            ]
        );

        splats[3].position = Vec3::new(f32::NAN, 0.0, 0.0);
        let report = validate_splats(&splats);
        assert!(!report.valid);
        assert_eq!(report.warnings[0], "1 splats have invalid positions");

        let report = validate_splats(&splats[4..10]);
        assert!(report.valid);
        assert!(report.warnings[0].starts_with("Low splat count (6)"));
    }
}

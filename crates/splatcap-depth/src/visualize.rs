use splatcap_3d::report::ValidationReport;

use crate::extract::DepthExtractionResult;

// Anchors of the piecewise linear turbo approximation at 0, 0.25, 0.5, 0.75 and 1.
const TURBO_ANCHORS: [[f32; 3]; 5] = [
    [0.18995, 0.07176, 0.23217],
    [0.35238, 0.34290, 0.93411],
    [0.56924, 0.77063, 0.46915],
    [0.94227, 0.89411, 0.10175],
    [0.98644, 0.46916, 0.07991],
];

/// Map a normalized value in `[0, 1]` to an RGB color of the turbo colormap.
///
/// Values outside the range are clamped.
pub fn turbo_colormap(value: f32) -> [u8; 3] {
    let value = value.clamp(0.0, 1.0);
    let segment = if value < 0.25 {
        0
    } else if value < 0.5 {
        1
    } else if value < 0.75 {
        2
    } else {
        3
    };
    let t = (value - segment as f32 * 0.25) / 0.25;
    let (from, to) = (TURBO_ANCHORS[segment], TURBO_ANCHORS[segment + 1]);
    let channel = |c: usize| ((from[c] + t * (to[c] - from[c])) * 255.0) as u8;
    [channel(0), channel(1), channel(2)]
}

/// Render a depth map as RGB pixels, near values first in the colormap.
///
/// # Arguments
///
/// * `result` - The depth map.
/// * `colorize` - Use the turbo colormap instead of grayscale.
pub fn depth_visualization(result: &DepthExtractionResult, colorize: bool) -> Vec<[u8; 3]> {
    let mut range = result.max_depth - result.min_depth;
    if range <= 0.0 {
        range = 1.0;
    }

    result
        .data
        .iter()
        .map(|&d| {
            let normalized = ((d - result.min_depth) / range).clamp(0.0, 1.0);
            if colorize {
                turbo_colormap(normalized)
            } else {
                let gray = (normalized * 255.0) as u8;
                [gray, gray, gray]
            }
        })
        .collect()
}

/// Check a depth map for values that would break training.
///
/// NaN samples and inconsistent dimensions are fatal. Infinite samples, more than 5% of
/// non-positive samples, a flat range and a very far maximum are advisory.
pub fn validate_for_training(result: &DepthExtractionResult) -> ValidationReport {
    let mut report = ValidationReport::new();

    if !result.is_valid() {
        report.fail("Invalid depth result dimensions or data");
        return report;
    }

    let mut nan_count = 0;
    let mut inf_count = 0;
    let mut invalid_count = 0;
    for &d in &result.data {
        if d.is_nan() {
            nan_count += 1;
        } else if d.is_infinite() {
            inf_count += 1;
        } else if d <= 0.0 {
            invalid_count += 1;
        }
    }

    if nan_count > 0 {
        report.fail(format!("{nan_count} NaN values detected in depth data"));
    }
    if inf_count > 0 {
        report.warn(format!(
            "{inf_count} infinite values detected in depth data"
        ));
    }

    let invalid_percent = 100.0 * invalid_count as f32 / result.data.len() as f32;
    if invalid_percent > 5.0 {
        report.warn(format!(
            "{invalid_percent:.1}% invalid depth values (<=0)"
        ));
    }

    if result.max_depth - result.min_depth < 0.1 {
        report.warn("Very narrow depth range (<0.1m). Scene may be flat.");
    }
    if result.max_depth > 1000.0 {
        report.warn("Very large maximum depth (>1km). May affect precision.");
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(data: Vec<f32>) -> DepthExtractionResult {
        let min_depth = data.iter().copied().fold(f32::MAX, f32::min);
        let max_depth = data.iter().copied().fold(f32::MIN, f32::max);
        DepthExtractionResult {
            width: data.len(),
            height: 1,
            data,
            min_depth,
            max_depth,
            near_plane: 0.1,
            far_plane: 1000.0,
            is_linear: true,
            in_meters: true,
        }
    }

    #[test]
    fn test_turbo_colormap() {
        assert_eq!(turbo_colormap(0.0), [48, 18, 59]);
        assert_eq!(turbo_colormap(0.25), [89, 87, 238]);
        assert_eq!(turbo_colormap(0.5), [145, 196, 119]);
        assert_eq!(turbo_colormap(1.0), [251, 119, 20]);
        assert_eq!(turbo_colormap(-3.0), turbo_colormap(0.0));
        assert_eq!(turbo_colormap(7.0), turbo_colormap(1.0));
    }

    #[test]
    fn test_depth_visualization() {
        let result = depth(vec![1.0, 2.0, 3.0]);
        let gray = depth_visualization(&result, false);
        assert_eq!(gray, vec![[0, 0, 0], [127, 127, 127], [255, 255, 255]]);

        let color = depth_visualization(&result, true);
        assert_eq!(color[0], turbo_colormap(0.0));
        assert_eq!(color[2], turbo_colormap(1.0));

        let flat = depth(vec![4.0, 4.0]);
        assert_eq!(depth_visualization(&flat, false), vec![[0, 0, 0]; 2]);
    }

    #[test]
    fn test_validate_for_training() {
        let report = validate_for_training(&depth(vec![1.0, 2.0, 5.0, 10.0]));
        assert!(report.is_clean());

        let report = validate_for_training(&depth(vec![1.0, f32::NAN, 5.0]));
        assert!(!report.valid);
        assert_eq!(report.warnings[0], "1 NaN values detected in depth data");

        let report = validate_for_training(&depth(vec![0.0, 2.0, f32::INFINITY, 4.0]));
        assert!(report.valid);
        assert!(report.warnings.contains(&"1 infinite values detected in depth data".to_string()));
        assert!(report.warnings.contains(&"25.0% invalid depth values (<=0)".to_string()));

        let report = validate_for_training(&depth(vec![2.0, 2.05]));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Very narrow depth range"));

        let mut broken = depth(vec![1.0, 2.0]);
        broken.height = 2;
        assert!(!validate_for_training(&broken).valid);
    }
}

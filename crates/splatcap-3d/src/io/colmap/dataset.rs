use std::path::{Path, PathBuf};

use super::{
    write_cameras_bin, write_cameras_txt, write_images_bin, write_images_txt, write_points3d_bin,
    write_points3d_txt, ColmapCamera, ColmapError, ColmapImage, ColmapPoint3d,
};
use crate::camera::CameraIntrinsics;
use crate::report::ValidationReport;
use crate::trajectory::Viewpoint;
use crate::transforms::{camera_to_colmap, camera_translation};

/// Default prefix of exported image names.
pub const DEFAULT_IMAGE_PREFIX: &str = "image_";

/// Default extension of exported image names.
pub const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";

/// Number of digits of the zero padded image index.
pub const IMAGE_INDEX_DIGITS: usize = 5;

/// Recommended minimum number of training images.
pub const MIN_RECOMMENDED_IMAGES: usize = 50;

/// On-disk flavour of the sparse model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ColmapFormat {
    /// `cameras.txt`, `images.txt`, `points3D.txt`
    #[default]
    Text,
    /// `cameras.bin`, `images.bin`, `points3D.bin`
    Binary,
}

/// `{root}/sparse/0`
pub fn sparse_dir(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join("sparse").join("0")
}

/// `{root}/images`
pub fn images_dir(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join("images")
}

/// `{root}/depth`
pub fn depth_dir(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join("depth")
}

/// Zero padded decimal index, e.g. `format_image_index(7, 5) == "00007"`.
pub fn format_image_index(index: usize, digits: usize) -> String {
    format!("{index:0digits$}")
}

/// Name of the image captured at `index`.
pub fn image_name(prefix: &str, index: usize, extension: &str) -> String {
    format!(
        "{prefix}{}{extension}",
        format_image_index(index, IMAGE_INDEX_DIGITS)
    )
}

/// Build the COLMAP camera record of a set of intrinsics.
pub fn create_camera(intrinsics: &CameraIntrinsics, camera_id: u32) -> ColmapCamera {
    ColmapCamera {
        camera_id,
        model: intrinsics.model,
        width: intrinsics.width as usize,
        height: intrinsics.height as usize,
        params: intrinsics.colmap_params(),
    }
}

/// Build one COLMAP image record per viewpoint.
///
/// Image ids are `1..=n` in viewpoint order, every image uses camera 1 and the pose is the
/// world-to-camera transform of the viewpoint in the COLMAP frame.
///
/// # Arguments
///
/// * `viewpoints` - The captured viewpoints.
/// * `intrinsics` - The shared camera intrinsics.
/// * `prefix` - Image name prefix.
/// * `extension` - Image name extension, including the dot.
pub fn create_images_from_viewpoints(
    viewpoints: &[Viewpoint],
    intrinsics: &CameraIntrinsics,
    prefix: &str,
    extension: &str,
) -> Vec<ColmapImage> {
    if !intrinsics.is_valid() {
        log::warn!("creating COLMAP images with invalid intrinsics: {intrinsics:?}");
    }

    viewpoints
        .iter()
        .enumerate()
        .map(|(index, viewpoint)| {
            let (center, rotation) = camera_to_colmap(&viewpoint.transform());
            let translation = camera_translation(rotation, center);
            ColmapImage {
                name: image_name(prefix, index, extension),
                image_id: index as u32 + 1,
                camera_id: 1,
                rotation: [rotation.w, rotation.x, rotation.y, rotation.z],
                translation: translation.to_array(),
                points2d: Vec::new(),
            }
        })
        .collect()
}

/// Create `sparse/0`, `images` and `depth` below `root`.
pub fn create_directory_structure(root: impl AsRef<Path>) -> Result<(), ColmapError> {
    let root = root.as_ref();
    for dir in [sparse_dir(root), images_dir(root), depth_dir(root)] {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Write a complete sparse model below `root`, creating the directory layout first.
///
/// # Returns
///
/// The `sparse/0` directory the model was written to.
pub fn write_colmap_dataset(
    root: impl AsRef<Path>,
    cameras: &[ColmapCamera],
    images: &[ColmapImage],
    points: &[ColmapPoint3d],
    format: ColmapFormat,
) -> Result<PathBuf, ColmapError> {
    create_directory_structure(root.as_ref())?;
    let sparse = sparse_dir(root);

    match format {
        ColmapFormat::Text => {
            write_cameras_txt(sparse.join("cameras.txt"), cameras)?;
            write_images_txt(sparse.join("images.txt"), images)?;
            write_points3d_txt(sparse.join("points3D.txt"), points)?;
        }
        ColmapFormat::Binary => {
            write_cameras_bin(sparse.join("cameras.bin"), cameras)?;
            write_images_bin(sparse.join("images.bin"), images)?;
            write_points3d_bin(sparse.join("points3D.bin"), points)?;
        }
    }

    log::info!(
        "wrote COLMAP {:?} model with {} cameras, {} images and {} points to {}",
        format,
        cameras.len(),
        images.len(),
        points.len(),
        sparse.display()
    );

    Ok(sparse)
}

/// Check that a dataset directory is ready for training.
///
/// The report is valid when both a cameras file and an images file exist, in either format.
/// Missing or few images are reported as warnings.
pub fn validate_dataset(root: impl AsRef<Path>) -> ValidationReport {
    let root = root.as_ref();
    let sparse = sparse_dir(root);
    let mut report = ValidationReport::new();

    let has_any = |stem: &str| {
        sparse.join(format!("{stem}.txt")).is_file() || sparse.join(format!("{stem}.bin")).is_file()
    };

    if !has_any("cameras") {
        report.fail("Missing cameras file (cameras.txt or cameras.bin)");
    }
    if !has_any("images") {
        report.fail("Missing images file (images.txt or images.bin)");
    }

    let images = images_dir(root);
    if !images.is_dir() {
        report.warn("Images directory does not exist");
        return report;
    }

    let image_count = std::fs::read_dir(&images)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|entry| {
                    entry
                        .path()
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| {
                            ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("png")
                        })
                })
                .count()
        })
        .unwrap_or(0);

    if image_count == 0 {
        report.warn("No image files found in images directory");
    } else if image_count < MIN_RECOMMENDED_IMAGES {
        report.warn(format!(
            "Low image count ({image_count}). 100+ recommended for quality training."
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ColmapCameraModel;
    use crate::io::colmap::{read_cameras_bin, read_images_txt};
    use crate::trajectory::{generate_viewpoints, TrajectoryConfig};
    use crate::transforms::{camera_center, position_to_colmap};
    use glam::{DQuat, DVec3};
    use std::collections::HashSet;

    fn viewpoints() -> Vec<Viewpoint> {
        generate_viewpoints(&TrajectoryConfig {
            num_rings: 2,
            views_per_ring: 6,
            focus_point: DVec3::new(10.0, 20.0, 30.0),
            ..Default::default()
        })
    }

    #[test]
    fn test_format_image_index() {
        assert_eq!(format_image_index(7, 5), "00007");
        assert_eq!(format_image_index(123456, 5), "123456");
        assert_eq!(image_name("image_", 12, ".png"), "image_00012.png");
    }

    #[test]
    fn test_create_camera() {
        let intrinsics =
            CameraIntrinsics::from_fov_with_model(1920, 1080, 90.0, ColmapCameraModel::OpenCv);
        let camera = create_camera(&intrinsics, 1);
        assert_eq!(camera.model, ColmapCameraModel::OpenCv);
        assert_eq!(camera.params.len(), 8);
        assert_eq!(camera.width, 1920);
    }

    #[test]
    fn test_create_images_from_viewpoints() {
        let viewpoints = viewpoints();
        let intrinsics = CameraIntrinsics::from_fov(1920, 1080, 90.0);
        let images = create_images_from_viewpoints(
            &viewpoints,
            &intrinsics,
            DEFAULT_IMAGE_PREFIX,
            DEFAULT_IMAGE_EXTENSION,
        );
        assert_eq!(images.len(), viewpoints.len());

        let names = images.iter().map(|i| i.name.clone()).collect::<HashSet<_>>();
        assert_eq!(names.len(), images.len());
        assert_eq!(images[0].name, "image_00000.jpg");

        for (i, (image, viewpoint)) in images.iter().zip(&viewpoints).enumerate() {
            assert_eq!(image.image_id, i as u32 + 1);
            assert_eq!(image.camera_id, 1);

            let [w, x, y, z] = image.rotation;
            let rotation = DQuat::from_xyzw(x, y, z, w);
            assert!((rotation.length() - 1.0).abs() < 1e-9);

            let center = camera_center(rotation, DVec3::from_array(image.translation));
            let expected = position_to_colmap(viewpoint.position);
            assert!((center - expected).length() < 1e-9);
        }
    }

    #[test]
    fn test_write_dataset_text_and_binary() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let intrinsics = CameraIntrinsics::from_fov(1920, 1080, 90.0);
        let cameras = vec![create_camera(&intrinsics, 1)];
        let images = create_images_from_viewpoints(&viewpoints(), &intrinsics, "image_", ".jpg");

        let sparse = write_colmap_dataset(dir.path(), &cameras, &images, &[], ColmapFormat::Text)?;
        assert!(sparse.join("points3D.txt").is_file());
        assert!(dir.path().join("images").is_dir());
        assert!(dir.path().join("depth").is_dir());
        assert_eq!(read_images_txt(sparse.join("images.txt"))?.len(), images.len());

        write_colmap_dataset(dir.path(), &cameras, &images, &[], ColmapFormat::Binary)?;
        assert_eq!(read_cameras_bin(sparse.join("cameras.bin"))?, cameras);
        Ok(())
    }

    #[test]
    fn test_validate_dataset() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;

        let report = validate_dataset(dir.path());
        assert!(!report.valid);
        assert_eq!(report.warnings.len(), 3);

        let intrinsics = CameraIntrinsics::from_fov(1920, 1080, 90.0);
        write_colmap_dataset(
            dir.path(),
            &[create_camera(&intrinsics, 1)],
            &[],
            &[],
            ColmapFormat::Binary,
        )?;
        let report = validate_dataset(dir.path());
        assert!(report.valid);
        assert_eq!(
            report.warnings,
            vec!["No image files found in images directory".to_string()]
        );

        for i in 0..3 {
            std::fs::write(images_dir(dir.path()).join(image_name("image_", i, ".png")), b"")?;
        }
        std::fs::write(images_dir(dir.path()).join("notes.txt"), b"")?;
        let report = validate_dataset(dir.path());
        assert!(report.valid);
        assert!(report.warnings[0].contains("Low image count (3)"));
        Ok(())
    }
}

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use super::{ColmapCamera, ColmapError, ColmapImage, ColmapPoint3d};
use crate::camera::ColmapCameraModel;

/// Write cameras in the `cameras.txt` layout.
///
/// # Arguments
///
/// * `writer` - The destination.
/// * `cameras` - The cameras to write.
pub fn write_cameras_text<W: Write>(
    writer: &mut W,
    cameras: &[ColmapCamera],
) -> Result<(), ColmapError> {
    writeln!(writer, "# Camera list with one line of data per camera:")?;
    writeln!(writer, "#   CAMERA_ID, MODEL, WIDTH, HEIGHT, PARAMS[]")?;
    writeln!(writer, "# Number of cameras: {}", cameras.len())?;

    for camera in cameras {
        check_num_params(camera)?;
        write!(
            writer,
            "{} {} {} {}",
            camera.camera_id,
            camera.model.model_name(),
            camera.width,
            camera.height
        )?;
        for param in &camera.params {
            write!(writer, " {param:.10}")?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Write images in the `images.txt` layout: a pose line followed by a keypoint line, which
/// is left blank when the image has no keypoints.
///
/// # Arguments
///
/// * `writer` - The destination.
/// * `images` - The images to write.
pub fn write_images_text<W: Write>(
    writer: &mut W,
    images: &[ColmapImage],
) -> Result<(), ColmapError> {
    writeln!(writer, "# Image list with two lines of data per image:")?;
    writeln!(writer, "#   IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME")?;
    writeln!(writer, "#   POINTS2D[] as (X, Y, POINT3D_ID)")?;
    writeln!(writer, "# Number of images: {}", images.len())?;

    for image in images {
        let [qw, qx, qy, qz] = image.rotation;
        let [tx, ty, tz] = image.translation;
        writeln!(
            writer,
            "{} {qw:.10} {qx:.10} {qy:.10} {qz:.10} {tx:.10} {ty:.10} {tz:.10} {} {}",
            image.image_id, image.camera_id, image.name
        )?;

        let keypoints = image
            .points2d
            .iter()
            .map(|(x, y, point3d_id)| format!("{x:.6} {y:.6} {point3d_id}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{keypoints}")?;
    }

    Ok(())
}

/// Write points in the `points3D.txt` layout.
///
/// # Arguments
///
/// * `writer` - The destination.
/// * `points` - The points to write.
pub fn write_points3d_text<W: Write>(
    writer: &mut W,
    points: &[ColmapPoint3d],
) -> Result<(), ColmapError> {
    writeln!(writer, "# 3D point list with one line of data per point:")?;
    writeln!(
        writer,
        "#   POINT3D_ID, X, Y, Z, R, G, B, ERROR, TRACK[] as (IMAGE_ID, POINT2D_IDX)"
    )?;
    writeln!(writer, "# Number of points: {}", points.len())?;

    for point in points {
        let [x, y, z] = point.xyz;
        let [r, g, b] = point.rgb;
        write!(
            writer,
            "{} {x:.10} {y:.10} {z:.10} {r} {g} {b} {:.6}",
            point.point3d_id, point.error
        )?;
        for (image_id, point2d_idx) in &point.track {
            write!(writer, " {image_id} {point2d_idx}")?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Write the cameras.txt file.
pub fn write_cameras_txt(
    path: impl AsRef<Path>,
    cameras: &[ColmapCamera],
) -> Result<(), ColmapError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_cameras_text(&mut writer, cameras)?;
    writer.flush()?;
    Ok(())
}

/// Write the images.txt file.
pub fn write_images_txt(path: impl AsRef<Path>, images: &[ColmapImage]) -> Result<(), ColmapError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_images_text(&mut writer, images)?;
    writer.flush()?;
    Ok(())
}

/// Write the points3D.txt file.
pub fn write_points3d_txt(
    path: impl AsRef<Path>,
    points: &[ColmapPoint3d],
) -> Result<(), ColmapError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_points3d_text(&mut writer, points)?;
    writer.flush()?;
    Ok(())
}

/// Read the cameras.txt file and return a vector of ColmapCamera structs.
///
/// # Arguments
///
/// * `path` - The path to the cameras.txt file.
///
/// # Returns
///
/// A vector of ColmapCamera structs.
pub fn read_cameras_txt(path: impl AsRef<Path>) -> Result<Vec<ColmapCamera>, ColmapError> {
    data_lines(path)?
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_camera_line(line))
        .collect()
}

/// Read the points3D.txt file and return a vector of ColmapPoint3d structs.
///
/// # Arguments
///
/// * `path` - The path to the points3D.txt file.
///
/// # Returns
///
/// A vector of ColmapPoint3d structs.
pub fn read_points3d_txt(path: impl AsRef<Path>) -> Result<Vec<ColmapPoint3d>, ColmapError> {
    data_lines(path)?
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_point3d_line(line))
        .collect()
}

/// Read the images.txt file and return a vector of ColmapImage structs.
///
/// Blank keypoint lines are significant and kept.
///
/// # Arguments
///
/// * `path` - The path to the images.txt file.
///
/// # Returns
///
/// A vector of ColmapImage structs.
pub fn read_images_txt(path: impl AsRef<Path>) -> Result<Vec<ColmapImage>, ColmapError> {
    data_lines(path)?
        .chunks(2)
        .map(|chunk| match chunk {
            [pose, keypoints] => parse_image_lines(pose, keypoints),
            _ => Err(ColmapError::ParseError(
                "Image record without a keypoint line".to_string(),
            )),
        })
        .collect()
}

// every line of the file except `#` comments
fn data_lines(path: impl AsRef<Path>) -> Result<Vec<String>, ColmapError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.starts_with('#') {
            lines.push(line);
        }
    }
    Ok(lines)
}

fn parse_part<T: std::str::FromStr>(s: &str) -> Result<T, ColmapError>
where
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| ColmapError::ParseError(format!("{s}: {e}")))
}

fn parse_array<T, const N: usize>(parts: &[&str], what: &str) -> Result<[T; N], ColmapError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parts
        .iter()
        .map(|s| parse_part(s))
        .collect::<Result<Vec<T>, _>>()?
        .try_into()
        .map_err(|_| ColmapError::ParseError(format!("Invalid number of {what}")))
}

fn check_num_params(camera: &ColmapCamera) -> Result<(), ColmapError> {
    if camera.params.len() != camera.model.num_params() {
        return Err(ColmapError::InvalidNumCameraParams(camera.params.len()));
    }
    Ok(())
}

/// CAMERA_ID, MODEL, WIDTH, HEIGHT, PARAMS[0], PARAMS[1], ...
fn parse_camera_line(line: &str) -> Result<ColmapCamera, ColmapError> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts.len() < 5 {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of parts: {}",
            parts.len()
        )));
    }

    let model = ColmapCameraModel::from_model_name(parts[1])
        .ok_or_else(|| ColmapError::ParseError(format!("Invalid camera model: {}", parts[1])))?;

    let camera = ColmapCamera {
        camera_id: parse_part(parts[0])?,
        model,
        width: parse_part(parts[2])?,
        height: parse_part(parts[3])?,
        params: parts[4..]
            .iter()
            .map(|s| parse_part(s))
            .collect::<Result<Vec<_>, _>>()?,
    };
    check_num_params(&camera)?;

    Ok(camera)
}

/// POINT3D_ID, X, Y, Z, R, G, B, ERROR, TRACK[] as (IMAGE_ID, POINT2D_IDX)
fn parse_point3d_line(line: &str) -> Result<ColmapPoint3d, ColmapError> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts.len() < 8 || (parts.len() - 8) % 2 != 0 {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of parts: {}",
            parts.len()
        )));
    }

    Ok(ColmapPoint3d {
        point3d_id: parse_part(parts[0])?,
        xyz: parse_array(&parts[1..4], "xyz coordinates")?,
        rgb: parse_array(&parts[4..7], "rgb values")?,
        error: parse_part(parts[7])?,
        track: parts[8..]
            .chunks_exact(2)
            .map(|chunk| -> Result<(u32, u32), ColmapError> {
                Ok((parse_part(chunk[0])?, parse_part(chunk[1])?))
            })
            .collect::<Result<Vec<_>, _>>()?,
    })
}

/// IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME
/// POINTS2D[] as (X, Y, POINT3D_ID)
fn parse_image_lines(pose: &str, keypoints: &str) -> Result<ColmapImage, ColmapError> {
    let pose_parts = pose.split_whitespace().collect::<Vec<_>>();
    if pose_parts.len() != 10 {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of parts: {}",
            pose_parts.len()
        )));
    }

    let keypoint_parts = keypoints.split_whitespace().collect::<Vec<_>>();
    if keypoint_parts.len() % 3 != 0 {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of keypoint values: {}",
            keypoint_parts.len()
        )));
    }

    Ok(ColmapImage {
        image_id: parse_part(pose_parts[0])?,
        rotation: parse_array(&pose_parts[1..5], "rotation coordinates")?,
        translation: parse_array(&pose_parts[5..8], "translation coordinates")?,
        camera_id: parse_part(pose_parts[8])?,
        name: pose_parts[9].to_string(),
        points2d: keypoint_parts
            .chunks_exact(3)
            .map(|chunk| -> Result<(f64, f64, i64), ColmapError> {
                Ok((
                    parse_part(chunk[0])?,
                    parse_part(chunk[1])?,
                    parse_part(chunk[2])?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?,
    })
}

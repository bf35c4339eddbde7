//! COLMAP binary format.
//!
//! All values are little-endian:
//! - cameras.bin: `u64` count, then per camera `u32` id, `i32` model id, `u64` width,
//!   `u64` height and the model parameters as `f64`.
//! - images.bin: `u64` count, then per image `u32` id, `f64 x 4` quaternion (w, x, y, z),
//!   `f64 x 3` translation, `u32` camera id, NUL terminated name, `u64` keypoint count and
//!   per keypoint `f64` x, `f64` y, `u64` point3D id.
//! - points3D.bin: `u64` count, then per point `u64` id, `f64 x 3` position, `u8 x 3` color,
//!   `f64` error, `u64` track length and per track entry `u32` image id, `u32` point2D index.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::camera::ColmapCameraModel;

use super::{
    ColmapCamera, ColmapError, ColmapImage, ColmapPoint3d, UNMATCHED_POINT3D_ID,
    UNMATCHED_POINT3D_ID_BIN,
};

/// Write cameras in the `cameras.bin` layout.
pub fn write_cameras_binary<W: Write>(
    writer: &mut W,
    cameras: &[ColmapCamera],
) -> Result<(), ColmapError> {
    writer.write_u64::<LittleEndian>(cameras.len() as u64)?;
    for camera in cameras {
        if camera.params.len() != camera.model.num_params() {
            return Err(ColmapError::InvalidNumCameraParams(camera.params.len()));
        }
        writer.write_u32::<LittleEndian>(camera.camera_id)?;
        writer.write_i32::<LittleEndian>(camera.model.model_id())?;
        writer.write_u64::<LittleEndian>(camera.width as u64)?;
        writer.write_u64::<LittleEndian>(camera.height as u64)?;
        for param in &camera.params {
            writer.write_f64::<LittleEndian>(*param)?;
        }
    }
    Ok(())
}

/// Write images in the `images.bin` layout.
///
/// Negative point3D ids are written as the all-ones unmatched sentinel.
pub fn write_images_binary<W: Write>(
    writer: &mut W,
    images: &[ColmapImage],
) -> Result<(), ColmapError> {
    writer.write_u64::<LittleEndian>(images.len() as u64)?;
    for image in images {
        if image.name.as_bytes().contains(&0) {
            return Err(ColmapError::ParseError(format!(
                "Image name contains a NUL byte: {:?}",
                image.name
            )));
        }

        writer.write_u32::<LittleEndian>(image.image_id)?;
        for q in image.rotation {
            writer.write_f64::<LittleEndian>(q)?;
        }
        for t in image.translation {
            writer.write_f64::<LittleEndian>(t)?;
        }
        writer.write_u32::<LittleEndian>(image.camera_id)?;
        writer.write_all(image.name.as_bytes())?;
        writer.write_u8(0)?;

        writer.write_u64::<LittleEndian>(image.points2d.len() as u64)?;
        for &(x, y, point3d_id) in &image.points2d {
            writer.write_f64::<LittleEndian>(x)?;
            writer.write_f64::<LittleEndian>(y)?;
            let id = u64::try_from(point3d_id).unwrap_or(UNMATCHED_POINT3D_ID_BIN);
            writer.write_u64::<LittleEndian>(id)?;
        }
    }
    Ok(())
}

/// Write points in the `points3D.bin` layout.
pub fn write_points3d_binary<W: Write>(
    writer: &mut W,
    points: &[ColmapPoint3d],
) -> Result<(), ColmapError> {
    writer.write_u64::<LittleEndian>(points.len() as u64)?;
    for point in points {
        writer.write_u64::<LittleEndian>(point.point3d_id)?;
        for v in point.xyz {
            writer.write_f64::<LittleEndian>(v)?;
        }
        writer.write_all(&point.rgb)?;
        writer.write_f64::<LittleEndian>(point.error)?;
        writer.write_u64::<LittleEndian>(point.track.len() as u64)?;
        for &(image_id, point2d_idx) in &point.track {
            writer.write_u32::<LittleEndian>(image_id)?;
            writer.write_u32::<LittleEndian>(point2d_idx)?;
        }
    }
    Ok(())
}

/// Write the cameras.bin file.
pub fn write_cameras_bin(
    path: impl AsRef<Path>,
    cameras: &[ColmapCamera],
) -> Result<(), ColmapError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_cameras_binary(&mut writer, cameras)?;
    writer.flush()?;
    Ok(())
}

/// Write the images.bin file.
pub fn write_images_bin(path: impl AsRef<Path>, images: &[ColmapImage]) -> Result<(), ColmapError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_images_binary(&mut writer, images)?;
    writer.flush()?;
    Ok(())
}

/// Write the points3D.bin file.
pub fn write_points3d_bin(
    path: impl AsRef<Path>,
    points: &[ColmapPoint3d],
) -> Result<(), ColmapError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_points3d_binary(&mut writer, points)?;
    writer.flush()?;
    Ok(())
}

/// Read cameras from the `cameras.bin` layout.
pub fn read_cameras_binary<R: Read>(reader: &mut R) -> Result<Vec<ColmapCamera>, ColmapError> {
    let num_cameras = reader.read_u64::<LittleEndian>()?;
    let mut cameras = Vec::new();

    for _ in 0..num_cameras {
        let camera_id = reader.read_u32::<LittleEndian>()?;
        let raw_model_id = reader.read_i32::<LittleEndian>()?;
        let model = ColmapCameraModel::from_model_id(raw_model_id)
            .ok_or(ColmapError::UnsupportedCameraModel(raw_model_id))?;
        let width = reader.read_u64::<LittleEndian>()? as usize;
        let height = reader.read_u64::<LittleEndian>()? as usize;

        let mut params = vec![0.0; model.num_params()];
        reader.read_f64_into::<LittleEndian>(&mut params)?;

        cameras.push(ColmapCamera {
            camera_id,
            model,
            width,
            height,
            params,
        });
    }

    Ok(cameras)
}

/// Read images from the `images.bin` layout.
///
/// The unmatched sentinel is returned as [`UNMATCHED_POINT3D_ID`].
pub fn read_images_binary<R: Read>(reader: &mut R) -> Result<Vec<ColmapImage>, ColmapError> {
    let num_images = reader.read_u64::<LittleEndian>()?;
    let mut images = Vec::new();

    for _ in 0..num_images {
        let image_id = reader.read_u32::<LittleEndian>()?;
        let mut rotation = [0.0; 4];
        reader.read_f64_into::<LittleEndian>(&mut rotation)?;
        let mut translation = [0.0; 3];
        reader.read_f64_into::<LittleEndian>(&mut translation)?;
        let camera_id = reader.read_u32::<LittleEndian>()?;
        let name = read_nul_terminated(reader)?;

        let num_points2d = reader.read_u64::<LittleEndian>()?;
        let mut points2d = Vec::new();
        for _ in 0..num_points2d {
            let x = reader.read_f64::<LittleEndian>()?;
            let y = reader.read_f64::<LittleEndian>()?;
            let id = reader.read_u64::<LittleEndian>()?;
            let point3d_id = i64::try_from(id).unwrap_or(UNMATCHED_POINT3D_ID);
            points2d.push((x, y, point3d_id));
        }

        images.push(ColmapImage {
            name,
            image_id,
            camera_id,
            rotation,
            translation,
            points2d,
        });
    }

    Ok(images)
}

/// Read points from the `points3D.bin` layout.
pub fn read_points3d_binary<R: Read>(reader: &mut R) -> Result<Vec<ColmapPoint3d>, ColmapError> {
    let num_points = reader.read_u64::<LittleEndian>()?;
    let mut points = Vec::new();

    for _ in 0..num_points {
        let point3d_id = reader.read_u64::<LittleEndian>()?;
        let mut xyz = [0.0; 3];
        reader.read_f64_into::<LittleEndian>(&mut xyz)?;
        let mut rgb = [0u8; 3];
        reader.read_exact(&mut rgb)?;
        let error = reader.read_f64::<LittleEndian>()?;

        let track_length = reader.read_u64::<LittleEndian>()?;
        let mut track = Vec::new();
        for _ in 0..track_length {
            let image_id = reader.read_u32::<LittleEndian>()?;
            let point2d_idx = reader.read_u32::<LittleEndian>()?;
            track.push((image_id, point2d_idx));
        }

        points.push(ColmapPoint3d {
            point3d_id,
            xyz,
            rgb,
            error,
            track,
        });
    }

    Ok(points)
}

/// Read the cameras.bin file.
pub fn read_cameras_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapCamera>, ColmapError> {
    read_cameras_binary(&mut BufReader::new(File::open(path)?))
}

/// Read the images.bin file.
pub fn read_images_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapImage>, ColmapError> {
    read_images_binary(&mut BufReader::new(File::open(path)?))
}

/// Read the points3D.bin file.
pub fn read_points3d_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapPoint3d>, ColmapError> {
    read_points3d_binary(&mut BufReader::new(File::open(path)?))
}

fn read_nul_terminated<R: Read>(reader: &mut R) -> Result<String, ColmapError> {
    let mut bytes = Vec::new();
    loop {
        let byte = reader.read_u8()?;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    String::from_utf8(bytes).map_err(|e| ColmapError::ParseError(e.to_string()))
}

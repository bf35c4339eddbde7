use std::io::{BufWriter, Write};
use std::path::Path;

use super::properties::{
    bincode_config, gaussian_property_names, PointRecord, POINTCLOUD_PROPERTIES,
};
use super::{GaussianSplat, PlyEncoding, PlyError};
use crate::pointcloud::PointCloud;

fn write_header<W: Write>(
    writer: &mut W,
    encoding: PlyEncoding,
    vertex_count: usize,
    properties: impl IntoIterator<Item = (&'static str, String)>,
) -> Result<(), PlyError> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format {}", encoding.header_name())?;
    writeln!(writer, "element vertex {vertex_count}")?;
    for (data_type, name) in properties {
        writeln!(writer, "property {data_type} {name}")?;
    }
    writeln!(writer, "end_header")?;
    Ok(())
}

fn point_record(cloud: &PointCloud, index: usize) -> PointRecord {
    let [x, y, z] = cloud.points()[index];
    let [nx, ny, nz] = cloud.normal_at(index);
    let [red, green, blue] = cloud.color_at(index);
    PointRecord {
        x: x as f32,
        y: y as f32,
        z: z as f32,
        nx: nx as f32,
        ny: ny as f32,
        nz: nz as f32,
        red,
        green,
        blue,
    }
}

/// Write a point cloud with positions, normals and colors.
///
/// Points without a normal are written facing +Z, points without a color are written white.
pub fn write_pointcloud<W: Write>(
    writer: &mut W,
    cloud: &PointCloud,
    encoding: PlyEncoding,
) -> Result<(), PlyError> {
    if cloud.is_empty() {
        return Err(PlyError::EmptyInput);
    }

    write_header(
        writer,
        encoding,
        cloud.len(),
        POINTCLOUD_PROPERTIES
            .iter()
            .map(|(data_type, name)| (data_type.name(), name.to_string())),
    )?;

    for index in 0..cloud.len() {
        let record = point_record(cloud, index);
        match encoding {
            PlyEncoding::BinaryLittleEndian => {
                bincode::encode_into_std_write(record, writer, bincode_config())?;
            }
            PlyEncoding::Ascii => writeln!(
                writer,
                "{:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {} {} {}",
                record.x,
                record.y,
                record.z,
                record.nx,
                record.ny,
                record.nz,
                record.red,
                record.green,
                record.blue
            )?,
        }
    }

    Ok(())
}

/// Write a point cloud PLY file.
pub fn write_pointcloud_ply(
    path: impl AsRef<Path>,
    cloud: &PointCloud,
    encoding: PlyEncoding,
) -> Result<(), PlyError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    write_pointcloud(&mut writer, cloud, encoding)?;
    writer.flush()?;
    log::debug!("wrote {} points to {}", cloud.len(), path.display());
    Ok(())
}

/// Write gaussian splats in the 62 property layout read by 3DGS training code.
pub fn write_gaussians<W: Write>(
    writer: &mut W,
    splats: &[GaussianSplat],
    encoding: PlyEncoding,
) -> Result<(), PlyError> {
    if splats.is_empty() {
        return Err(PlyError::EmptyInput);
    }

    write_header(
        writer,
        encoding,
        splats.len(),
        gaussian_property_names()
            .into_iter()
            .map(|name| ("float", name)),
    )?;

    for splat in splats {
        let record = splat.to_record();
        match encoding {
            PlyEncoding::BinaryLittleEndian => {
                bincode::encode_into_std_write(record, writer, bincode_config())?;
            }
            PlyEncoding::Ascii => {
                let line = record
                    .values()
                    .iter()
                    .map(|v| format!("{v:.6}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(writer, "{line}")?;
            }
        }
    }

    Ok(())
}

/// Write a gaussian splat PLY file.
pub fn write_gaussian_ply(
    path: impl AsRef<Path>,
    splats: &[GaussianSplat],
    encoding: PlyEncoding,
) -> Result<(), PlyError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    write_gaussians(&mut writer, splats, encoding)?;
    writer.flush()?;
    log::debug!("wrote {} splats to {}", splats.len(), path.display());
    Ok(())
}

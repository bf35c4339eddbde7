use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::properties::{bincode_config, gaussian_property_names, GaussianRecord};
use super::{parse_header, GaussianSplat, PlyDataType, PlyError, PlyHeader, GAUSSIAN_RECORD_SIZE};
use crate::pointcloud::PointCloud;

// The vertex count comes from the file, so it only bounds the loops, never the allocation.
const MAX_PREALLOCATED_VERTICES: usize = 1 << 16;

fn initial_capacity(header: &PlyHeader) -> usize {
    header.vertex_count.min(MAX_PREALLOCATED_VERTICES)
}

/// Read a point cloud PLY file, ASCII or binary little-endian.
///
/// Binary payloads are read in a fixed order: position, then normal when `nx` is declared,
/// then color when `red` is declared, as 32 bit floats and bytes. ASCII payloads are read by
/// property name.
pub fn read_pointcloud_ply(path: impl AsRef<Path>) -> Result<PointCloud, PlyError> {
    let mut reader = BufReader::new(std::fs::File::open(path)?);
    let header = parse_header(&mut reader)?;
    if header.is_binary {
        read_pointcloud_binary(&mut reader, &header)
    } else {
        read_pointcloud_ascii(&mut reader, &header)
    }
}

fn read_pointcloud_binary<R: Read>(
    reader: &mut R,
    header: &PlyHeader,
) -> Result<PointCloud, PlyError> {
    let has_normals = header.has_property("nx");
    let has_colors = header.has_property("red");

    let capacity = initial_capacity(header);
    let mut points = Vec::with_capacity(capacity);
    let mut normals = Vec::with_capacity(if has_normals { capacity } else { 0 });
    let mut colors = Vec::with_capacity(if has_colors { capacity } else { 0 });

    let read_vec3 = |reader: &mut R| -> Result<[f64; 3], PlyError> {
        let x = reader.read_f32::<LittleEndian>()?;
        let y = reader.read_f32::<LittleEndian>()?;
        let z = reader.read_f32::<LittleEndian>()?;
        Ok([x as f64, y as f64, z as f64])
    };

    for _ in 0..header.vertex_count {
        points.push(read_vec3(reader)?);
        if has_normals {
            normals.push(read_vec3(reader)?);
        }
        if has_colors {
            let mut rgb = [0u8; 3];
            reader.read_exact(&mut rgb)?;
            colors.push(rgb);
        }
    }

    Ok(PointCloud::new(
        points,
        has_colors.then_some(colors),
        has_normals.then_some(normals),
    ))
}

fn property_index(header: &PlyHeader, name: &str) -> Option<usize> {
    header.properties.iter().position(|p| p.name == name)
}

fn read_pointcloud_ascii<R: BufRead>(
    reader: &mut R,
    header: &PlyHeader,
) -> Result<PointCloud, PlyError> {
    let index = |name: &str| property_index(header, name);
    let position = match (index("x"), index("y"), index("z")) {
        (Some(x), Some(y), Some(z)) => [x, y, z],
        _ => return Err(PlyError::InvalidHeader("missing x y z properties".to_string())),
    };
    let normal = match (index("nx"), index("ny"), index("nz")) {
        (Some(x), Some(y), Some(z)) => Some([x, y, z]),
        _ => None,
    };
    let color = match (index("red"), index("green"), index("blue")) {
        (Some(r), Some(g), Some(b)) => Some([r, g, b]),
        _ => None,
    };

    let mut points = Vec::with_capacity(initial_capacity(header));
    let mut normals = Vec::new();
    let mut colors = Vec::new();

    let mut lines = reader.lines();
    for vertex in 0..header.vertex_count {
        let line = lines
            .next()
            .ok_or_else(|| PlyError::ParseError(format!("missing vertex {vertex}")))??;
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        let field = |i: usize| -> Result<f64, PlyError> {
            tokens
                .get(i)
                .and_then(|t| t.parse::<f64>().ok())
                .ok_or_else(|| PlyError::ParseError(format!("invalid vertex line: {line}")))
        };

        points.push([field(position[0])?, field(position[1])?, field(position[2])?]);
        if let Some([x, y, z]) = normal {
            normals.push([field(x)?, field(y)?, field(z)?]);
        }
        if let Some([r, g, b]) = color {
            let channel = |i| field(i).map(|v| v.clamp(0.0, 255.0) as u8);
            colors.push([channel(r)?, channel(g)?, channel(b)?]);
        }
    }

    Ok(PointCloud::new(
        points,
        color.map(|_| colors),
        normal.map(|_| normals),
    ))
}

/// Read a gaussian splat PLY file in the 62 property layout this crate writes.
///
/// Files declaring any other vertex layout are rejected with [`PlyError::UnsupportedLayout`].
pub fn read_gaussian_ply(path: impl AsRef<Path>) -> Result<Vec<GaussianSplat>, PlyError> {
    let mut reader = BufReader::new(std::fs::File::open(path)?);
    let header = parse_header(&mut reader)?;

    if !header.is_gaussian() {
        return Err(PlyError::UnsupportedLayout(
            "not a gaussian splat file".to_string(),
        ));
    }
    let expected = gaussian_property_names();
    let matches_layout = header.properties.len() == expected.len()
        && header
            .properties
            .iter()
            .zip(&expected)
            .all(|(p, name)| p.data_type == PlyDataType::Float32 && &p.name == name);
    if !matches_layout {
        return Err(PlyError::UnsupportedLayout(header.property_names().join(" ")));
    }

    let mut splats = Vec::with_capacity(initial_capacity(&header));
    if header.is_binary {
        let mut buffer = vec![0u8; GAUSSIAN_RECORD_SIZE];
        for _ in 0..header.vertex_count {
            reader.read_exact(&mut buffer)?;
            let (record, _): (GaussianRecord, usize) =
                bincode::decode_from_slice(&buffer, bincode_config())?;
            splats.push(GaussianSplat::from_record(&record));
        }
    } else {
        let mut lines = reader.lines();
        for vertex in 0..header.vertex_count {
            let line = lines
                .next()
                .ok_or_else(|| PlyError::ParseError(format!("missing vertex {vertex}")))??;
            let values = line
                .split_whitespace()
                .map(|t| t.parse::<f32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| PlyError::ParseError(e.to_string()))?;
            let record = GaussianRecord::from_values(&values)?;
            splats.push(GaussianSplat::from_record(&record));
        }
    }

    log::debug!("read {} splats", splats.len());

    Ok(splats)
}

use std::io::BufRead;
use std::path::Path;

use super::{PlyDataType, PlyError, PlyPropertyDefinition};

/// The parts of a PLY header this crate cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyHeader {
    /// Number of vertices declared by `element vertex N`.
    pub vertex_count: usize,
    /// Whether the `format` line names a binary encoding.
    pub is_binary: bool,
    /// Vertex properties in declaration order.
    pub properties: Vec<PlyPropertyDefinition>,
}

impl PlyHeader {
    /// Whether a vertex property with the given name is declared.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    /// Whether the file holds gaussian splats rather than a plain point cloud.
    pub fn is_gaussian(&self) -> bool {
        ["f_dc_0", "opacity", "scale_0"]
            .iter()
            .any(|name| self.has_property(name))
    }

    /// Property names in declaration order.
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name.as_str()).collect()
    }

    /// Size in bytes of one binary vertex.
    pub fn vertex_size(&self) -> usize {
        self.properties.iter().map(|p| p.data_type.size()).sum()
    }
}

/// Parse a PLY header, leaving the reader positioned on the first byte of vertex data.
///
/// Only properties of the `vertex` element are collected.
pub fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader, PlyError> {
    let mut line = String::new();
    let mut vertex_count = None;
    let mut is_binary = false;
    let mut in_vertex_element = false;
    let mut properties = Vec::new();
    let mut first_line = true;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PlyError::InvalidHeader("missing end_header".to_string()));
        }
        let trimmed = line.trim();

        if first_line {
            if !trimmed.starts_with("ply") {
                return Err(PlyError::InvalidHeader("missing ply magic".to_string()));
            }
            first_line = false;
            continue;
        }

        if trimmed == "end_header" {
            break;
        }

        if trimmed.starts_with("format") {
            is_binary = trimmed.contains("binary");
        } else if trimmed.starts_with("element") {
            in_vertex_element = trimmed.starts_with("element vertex");
            if in_vertex_element {
                let count = trimmed
                    .split_whitespace()
                    .nth(2)
                    .and_then(|s| s.parse::<usize>().ok())
                    .ok_or_else(|| PlyError::InvalidHeader(trimmed.to_string()))?;
                vertex_count = Some(count);
            }
        } else if trimmed.starts_with("property") && in_vertex_element {
            let parts = trimmed.split_whitespace().collect::<Vec<_>>();
            if parts.len() >= 3 {
                let data_type = PlyDataType::parse(parts[1])?;
                let name = parts[2].to_string();
                properties.push(PlyPropertyDefinition { name, data_type });
            }
        }
    }

    let vertex_count = match vertex_count {
        Some(count) if count > 0 => count,
        _ => return Err(PlyError::NoVertices),
    };

    Ok(PlyHeader {
        vertex_count,
        is_binary,
        properties,
    })
}

/// Read only the header of a PLY file.
pub fn read_ply_header(path: impl AsRef<Path>) -> Result<PlyHeader, PlyError> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    parse_header(&mut reader)
}

/// Summary of a PLY file.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyInfo {
    /// Number of vertices.
    pub vertex_count: usize,
    /// Binary or ASCII payload.
    pub is_binary: bool,
    /// Whether the file holds gaussian splats.
    pub is_gaussian: bool,
    /// Vertex property names in declaration order.
    pub property_names: Vec<String>,
}

/// Inspect a PLY file without reading its payload.
pub fn ply_info(path: impl AsRef<Path>) -> Result<PlyInfo, PlyError> {
    let header = read_ply_header(path)?;
    Ok(PlyInfo {
        vertex_count: header.vertex_count,
        is_binary: header.is_binary,
        is_gaussian: header.is_gaussian(),
        property_names: header
            .property_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

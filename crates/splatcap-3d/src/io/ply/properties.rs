use super::PlyError;

/// Number of higher order spherical harmonics coefficients (degree 3, three channels).
pub const SH_REST_COUNT: usize = 45;

/// Size in bytes of a binary point cloud vertex: 6 floats and 3 bytes.
pub const POINT_RECORD_SIZE: usize = 27;

/// Size in bytes of a binary gaussian splat vertex: 62 floats.
pub const GAUSSIAN_RECORD_SIZE: usize = 62 * 4;

/// Vertex properties of a point cloud file, in file order.
pub const POINTCLOUD_PROPERTIES: [(PlyDataType, &str); 9] = [
    (PlyDataType::Float32, "x"),
    (PlyDataType::Float32, "y"),
    (PlyDataType::Float32, "z"),
    (PlyDataType::Float32, "nx"),
    (PlyDataType::Float32, "ny"),
    (PlyDataType::Float32, "nz"),
    (PlyDataType::UInt8, "red"),
    (PlyDataType::UInt8, "green"),
    (PlyDataType::UInt8, "blue"),
];

/// Vertex property names of a gaussian splat file, in file order.
pub fn gaussian_property_names() -> Vec<String> {
    let mut names = ["x", "y", "z", "nx", "ny", "nz", "f_dc_0", "f_dc_1", "f_dc_2"]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    names.extend((0..SH_REST_COUNT).map(|i| format!("f_rest_{i}")));
    names.push("opacity".to_string());
    names.extend((0..3).map(|i| format!("scale_{i}")));
    names.extend((0..4).map(|i| format!("rot_{i}")));
    names
}

/// A vertex property declared in a PLY header.
#[derive(Debug, PartialEq, Clone)]
pub struct PlyPropertyDefinition {
    /// Property name.
    pub name: String,
    /// Scalar type of the property.
    pub data_type: PlyDataType,
}

/// Scalar property types of the PLY format.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PlyDataType {
    /// `char` / `int8`
    Int8,
    /// `uchar` / `uint8`
    UInt8,
    /// `short` / `int16`
    Int16,
    /// `ushort` / `uint16`
    UInt16,
    /// `int` / `int32`
    Int32,
    /// `uint` / `uint32`
    UInt32,
    /// `float` / `float32`
    Float32,
    /// `double` / `float64`
    Float64,
}

impl PlyDataType {
    /// Size of the type in bytes.
    pub fn size(&self) -> usize {
        match self {
            PlyDataType::Float32 | PlyDataType::Int32 | PlyDataType::UInt32 => 4,
            PlyDataType::Float64 => 8,
            PlyDataType::Int16 | PlyDataType::UInt16 => 2,
            PlyDataType::Int8 | PlyDataType::UInt8 => 1,
        }
    }

    /// The type name written in headers.
    pub fn name(&self) -> &'static str {
        match self {
            PlyDataType::Int8 => "char",
            PlyDataType::UInt8 => "uchar",
            PlyDataType::Int16 => "short",
            PlyDataType::UInt16 => "ushort",
            PlyDataType::Int32 => "int",
            PlyDataType::UInt32 => "uint",
            PlyDataType::Float32 => "float",
            PlyDataType::Float64 => "double",
        }
    }

    /// Parse a header type name.
    pub fn parse(type_str: &str) -> Result<Self, PlyError> {
        match type_str {
            "float" | "float32" => Ok(PlyDataType::Float32),
            "double" | "float64" => Ok(PlyDataType::Float64),
            "char" | "int8" => Ok(PlyDataType::Int8),
            "uchar" | "uint8" => Ok(PlyDataType::UInt8),
            "short" | "int16" => Ok(PlyDataType::Int16),
            "ushort" | "uint16" => Ok(PlyDataType::UInt16),
            "int" | "int32" => Ok(PlyDataType::Int32),
            "uint" | "uint32" => Ok(PlyDataType::UInt32),
            _ => Err(PlyError::UnsupportedProperty(type_str.to_string())),
        }
    }
}

/// Binary point cloud vertex: position, normal, color.
#[derive(Debug, Clone, Copy, PartialEq, bincode::Encode, bincode::Decode)]
pub(crate) struct PointRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) z: f32,
    pub(crate) nx: f32,
    pub(crate) ny: f32,
    pub(crate) nz: f32,
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

/// Binary gaussian splat vertex, rotation stored as (x, y, z, w).
#[derive(Debug, Clone, Copy, PartialEq, bincode::Encode, bincode::Decode)]
pub(crate) struct GaussianRecord {
    pub(crate) position: [f32; 3],
    pub(crate) normal: [f32; 3],
    pub(crate) f_dc: [f32; 3],
    pub(crate) f_rest: [f32; SH_REST_COUNT],
    pub(crate) opacity: f32,
    pub(crate) scale: [f32; 3],
    pub(crate) rotation: [f32; 4],
}

impl GaussianRecord {
    /// The record as its 62 property values in file order.
    pub(crate) fn values(&self) -> Vec<f32> {
        let mut values = Vec::with_capacity(GAUSSIAN_RECORD_SIZE / 4);
        values.extend_from_slice(&self.position);
        values.extend_from_slice(&self.normal);
        values.extend_from_slice(&self.f_dc);
        values.extend_from_slice(&self.f_rest);
        values.push(self.opacity);
        values.extend_from_slice(&self.scale);
        values.extend_from_slice(&self.rotation);
        values
    }

    /// Build a record from its 62 property values in file order.
    pub(crate) fn from_values(values: &[f32]) -> Result<Self, PlyError> {
        if values.len() != GAUSSIAN_RECORD_SIZE / 4 {
            return Err(PlyError::ParseError(format!(
                "expected {} gaussian values, found {}",
                GAUSSIAN_RECORD_SIZE / 4,
                values.len()
            )));
        }
        let take3 = |offset: usize| [values[offset], values[offset + 1], values[offset + 2]];
        let mut f_rest = [0.0; SH_REST_COUNT];
        f_rest.copy_from_slice(&values[9..9 + SH_REST_COUNT]);
        Ok(Self {
            position: take3(0),
            normal: take3(3),
            f_dc: take3(6),
            f_rest,
            opacity: values[54],
            scale: take3(55),
            rotation: [values[58], values[59], values[60], values[61]],
        })
    }
}

/// Fixed-width little-endian encoding matching the PLY binary layout.
pub(crate) fn bincode_config() -> impl bincode::config::Config {
    bincode::config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}

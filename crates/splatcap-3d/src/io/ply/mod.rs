mod header;
mod properties;
mod reader;
mod splat;
mod writer;

pub use header::*;
pub use properties::*;
pub use reader::*;
pub use splat::*;
pub use writer::*;

/// Error types for the PLY module.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to read or write PLY file
    #[error("Failed to read or write PLY file")]
    Io(#[from] std::io::Error),

    /// Failed to deserialize PLY vertex data
    #[error("Failed to deserialize PLY vertex data")]
    Deserialize(#[from] bincode::error::DecodeError),

    /// Failed to serialize PLY vertex data
    #[error("Failed to serialize PLY vertex data")]
    Serialize(#[from] bincode::error::EncodeError),

    /// Unsupported PLY property
    #[error("Unsupported PLY property {0}")]
    UnsupportedProperty(String),

    /// Malformed PLY header
    #[error("Invalid PLY header: {0}")]
    InvalidHeader(String),

    /// The header declares no vertices
    #[error("PLY file declares no vertices")]
    NoVertices,

    /// Refused to write an empty point or splat array
    #[error("Nothing to write")]
    EmptyInput,

    /// The vertex layout is not the one this reader understands
    #[error("Unsupported vertex layout: {0}")]
    UnsupportedLayout(String),

    /// Malformed ASCII vertex data
    #[error("Parse error {0}")]
    ParseError(String),
}

/// Encoding of the vertex payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlyEncoding {
    /// One text line per vertex.
    Ascii,
    /// Packed little-endian records.
    #[default]
    BinaryLittleEndian,
}

impl PlyEncoding {
    /// The `format` header line value.
    pub fn header_name(&self) -> &'static str {
        match self {
            PlyEncoding::Ascii => "ascii 1.0",
            PlyEncoding::BinaryLittleEndian => "binary_little_endian 1.0",
        }
    }
}

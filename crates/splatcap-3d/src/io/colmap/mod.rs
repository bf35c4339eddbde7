mod binary;
mod dataset;
mod text;
mod types;

pub use binary::*;
pub use dataset::*;
pub use text::*;
pub use types::*;

/// Error types for the COLMAP module.
#[derive(Debug, thiserror::Error)]
pub enum ColmapError {
    /// Error reading or writing file
    #[error("error reading or writing file")]
    IoError(#[from] std::io::Error),

    /// Invalid number of camera parameters
    #[error("Invalid number of camera parameters {0}")]
    InvalidNumCameraParams(usize),

    /// Camera model id not known to COLMAP
    #[error("Unsupported camera model id {0}")]
    UnsupportedCameraModel(i32),

    /// Parse error
    #[error("Parse error {0}")]
    ParseError(String),
}

/// An error type for the depth module.
#[derive(thiserror::Error, Debug)]
pub enum DepthError {
    /// Failed to write the depth file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Failed to encode the PNG image.
    #[error("Failed to encode the png image. {0}")]
    PngEncodingError(String),

    /// Failed to serialize the depth metadata.
    #[error("Failed to serialize depth metadata. {0}")]
    MetadataError(#[from] serde_json::Error),

    /// The raw buffer does not hold one sample per pixel.
    #[error("Depth buffer has {actual} samples, expected {expected}")]
    LengthMismatch {
        /// `width * height`
        expected: usize,
        /// Samples in the buffer.
        actual: usize,
    },

    /// The clip planes are not finite or not ordered `0 < near < far`.
    #[error("Invalid clip planes: near {near}, far {far}")]
    InvalidClipPlanes {
        /// Near clip plane.
        near: f32,
        /// Far clip plane.
        far: f32,
    },

    /// The depth result has zero dimensions or inconsistent data.
    #[error("Invalid depth result dimensions or data")]
    InvalidResult,
}

mod config;
mod session;

pub use config::*;
pub use session::*;

use splatcap_3d::io::{colmap::ColmapError, ply::PlyError};
use splatcap_depth::DepthError;

/// Error types for the capture module.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The session is not in a state that allows the operation.
    #[error("Operation not allowed in capture state {0:?}")]
    InvalidState(CaptureState),

    /// The configuration has fatal problems.
    #[error("Invalid capture configuration: {0}")]
    InvalidConfig(String),

    /// The trajectory produced no viewpoint.
    #[error("Failed to generate camera viewpoints")]
    NoViewpoints,

    /// The capture backend failed.
    #[error("Capture backend error: {0}")]
    Backend(String),

    /// Failed to read or write a file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Failed to (de)serialize the configuration.
    #[error("Failed to (de)serialize the configuration. {0}")]
    ConfigFormat(#[from] serde_json::Error),

    /// COLMAP export failed.
    #[error(transparent)]
    Colmap(#[from] ColmapError),

    /// PLY export failed.
    #[error(transparent)]
    Ply(#[from] PlyError),

    /// Depth extraction or export failed.
    #[error(transparent)]
    Depth(#[from] DepthError),
}

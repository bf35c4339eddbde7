#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the depth module.
pub mod error;

/// Depth file encoders.
pub mod encode;

/// Depth buffer linearization and post-processing.
pub mod extract;

/// Depth map visualization and training checks.
pub mod visualize;

pub use error::DepthError;

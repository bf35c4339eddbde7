#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Camera intrinsics and the COLMAP camera model taxonomy.
pub mod camera;

/// I/O utilities for COLMAP and PLY datasets.
pub mod io;

/// Point cloud container.
pub mod pointcloud;

/// Validation reports shared by the plausibility checks.
pub mod report;

/// Capture trajectory generation and analysis.
pub mod trajectory;

/// Conversions between the engine frame and the COLMAP frame.
pub mod transforms;

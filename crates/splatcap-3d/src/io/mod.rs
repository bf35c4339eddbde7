/// COLMAP sparse model reader and writer.
pub mod colmap;

/// PLY point cloud and gaussian splat reader and writer.
pub mod ply;

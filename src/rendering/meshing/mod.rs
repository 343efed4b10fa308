//! Mesh generation for voxel rendering.
//!
//! This module turns chunk block data into packed, GPU-ready vertex streams.
//!
//! # Architecture
//! - [`FaceClassifier`]: decides per block face whether it is visible and which
//!   texture it shows, reading across chunk seams through a [`Neighborhood`]
//! - [`GreedyMesher`]: merges coplanar, merge-equal faces into rectangles
//! - [`MeshBuffer`]: accumulates the packed quads as Flat, Indexed or Partial
//! - [`CameraFacing`]: the 26 view directions a Partial buffer keys its draw
//!   ranges by
//!
//! # Usage
//! ```
//! use std::sync::Arc;
//! use voxel_mesher::{
//!     rendering::meshing::{generate_mesh, BufferMode},
//!     voxels::{
//!         block::{TextureRefCatalog, Voxel},
//!         chunk::{ChunkBlocks, Neighborhood},
//!         coords::ChunkDimensions,
//!     },
//! };
//!
//! let blocks = ChunkBlocks::filled(ChunkDimensions::new(4, 4), Voxel::new(1, 1));
//! let mesh = generate_mesh(
//!     &Neighborhood::isolated(Arc::new(blocks)),
//!     &TextureRefCatalog,
//!     BufferMode::Partial,
//! );
//! assert_eq!(mesh.quad_count(), 6);
//! ```
//!
//! [`Neighborhood`]: crate::voxels::chunk::Neighborhood

pub mod camera_facing;
mod face;
mod greedy;
mod mesh_buffer;

pub use camera_facing::{CameraFacing, CAMERA_FACING_COUNT};
pub use face::{FaceClassifier, VoxelFace};
pub use greedy::{generate_mesh, GreedyMesher, CORNER_TAGS};
pub use mesh_buffer::{BufferMode, DrawRange, MeshBuffer, QUAD_WINDING, QUAD_WINDING_REVERSED};

#[cfg(test)]
mod tests;

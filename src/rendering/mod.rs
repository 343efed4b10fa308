//! Rendering side of the mesher.
//!
//! This module turns voxel data into GPU-ready geometry: the packed vertex
//! format, the greedy mesher and its buffers, and the background job that
//! runs them off the main thread. Actual GPU resources are out of scope; the
//! renderer plugs in through [`MeshUploader`].

use crate::voxels::coords::ChunkCoordinates;

pub mod meshing;
pub mod tasks;
pub mod vertex;

pub use meshing::MeshBuffer;

/// Receives each newly published chunk mesh, typically to copy it into a GPU
/// buffer.
///
/// Called on the thread that polls the grid, right before the mesh becomes
/// the chunk's active mesh.
pub trait MeshUploader {
    /// Uploads the mesh for the chunk at `position`.
    fn upload(&mut self, position: ChunkCoordinates, mesh: &MeshBuffer);
}

/// Accepts every mesh and does nothing with it.
impl MeshUploader for () {
    fn upload(&mut self, _position: ChunkCoordinates, _mesh: &MeshBuffer) {}
}

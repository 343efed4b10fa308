use std::sync::Arc;

use crate::voxels::{
    block::{block_side::BlockSide, TextureRefCatalog},
    chunk::{ChunkBlocks, Neighborhood},
    coords::ChunkDimensions,
};

use super::{generate_mesh, BufferMode, MeshBuffer};


pub(super) fn small_dimensions() -> ChunkDimensions {
    ChunkDimensions::new(4, 4)
}

pub(super) fn isolated(blocks: ChunkBlocks) -> Neighborhood {
    Neighborhood::isolated(Arc::new(blocks))
}

pub(super) fn mesh_isolated(blocks: ChunkBlocks, mode: BufferMode) -> MeshBuffer {
    generate_mesh(&isolated(blocks), &TextureRefCatalog, mode)
}

/// Quads of one side in a Partial buffer.
pub(super) fn side_quads(mesh: &MeshBuffer, side: BlockSide) -> usize {
    mesh.side_vertices(side).len() / 6
}

//! A chunk's blocks together with read-only snapshots of the (up to six)
//! chunks around it: exactly what one mesh run is allowed to look at.

use std::sync::Arc;

use super::ChunkBlocks;
use crate::voxels::{block::block_side::BlockSide, coords::ChunkDimensions};

/// Read-only block snapshots for one chunk and its direct neighbors.
#[derive(Clone, Debug)]
pub struct Neighborhood {
    center: Arc<ChunkBlocks>,
    /// Indexed by [`BlockSide`]; `None` at the grid edge.
    neighbors: [Option<Arc<ChunkBlocks>>; 6],
}

impl Neighborhood {
    /// Bundles a chunk with its neighbors, indexed by [`BlockSide`].
    pub fn new(center: Arc<ChunkBlocks>, neighbors: [Option<Arc<ChunkBlocks>>; 6]) -> Self {
        Neighborhood { center, neighbors }
    }

    /// A chunk with nothing around it.
    pub fn isolated(center: Arc<ChunkBlocks>) -> Self {
        Self::new(center, Default::default())
    }

    /// Returns a copy with the neighbor on `side` replaced.
    pub fn with_neighbor(mut self, side: BlockSide, blocks: Arc<ChunkBlocks>) -> Self {
        self.neighbors[side as usize] = Some(blocks);
        self
    }

    /// The chunk being meshed.
    pub fn center(&self) -> &ChunkBlocks {
        &self.center
    }

    /// The chunk across `side`, if there is one.
    pub fn neighbor(&self, side: BlockSide) -> Option<&ChunkBlocks> {
        self.neighbors[side as usize].as_deref()
    }

    /// Extents of the chunk being meshed.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.center.dimensions()
    }
}

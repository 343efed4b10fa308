//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a fixed-size box of voxels, its
//! dirty flag, its cached neighbor slots and the mesh it currently displays.
//!
//! ## Storage
//!
//! Block data lives in [`ChunkBlocks`], held behind an `Arc`. Background mesh
//! jobs take a cheap clone of that `Arc` and only ever read it. The edit path
//! goes through `Arc::make_mut`, so an edit made while a job still holds the
//! old blocks copies them once and leaves the job's snapshot untouched. Block
//! data therefore never needs a lock.
//!
//! An edit is in place and allocation-free only while no job holds the
//! blocks. Every scheduled snapshot (of this chunk, or of a neighbor that
//! reads it) costs at most one full copy of the array, paid by the first edit
//! made before that job finishes.
//!
//! Alongside the voxel array, `ChunkBlocks` keeps a solidity bit vector
//! (one bit per block) so occlusion checks are a single bit test.
//!
//! ## Mesh lifecycle
//!
//! ```text
//! Clean --set_block--> Dirty --begin_mesh_job--> Meshing --publish--> Clean
//!                        ^                          |
//!                        +-------- set_block -------+
//! ```

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use bitvec::prelude::BitVec;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::{
    block::{block_side::BlockSide, Voxel},
    coords::{ChunkCoordinates, ChunkDimensions},
};
use crate::rendering::{
    meshing::MeshBuffer, tasks::chunk_mesh_generation_task::MeshResult, MeshUploader,
};

mod neighborhood;

pub use neighborhood::Neighborhood;

#[cfg(test)]
mod tests;

/// The voxel array of one chunk plus its solidity bits.
#[derive(Clone, Debug)]
pub struct ChunkBlocks {
    dimensions: ChunkDimensions,
    /// Voxels in `x + y * horizontal + z * horizontal * height` order.
    voxels: Vec<Voxel>,
    /// One bit per voxel, set when the voxel is not air. Same order as `voxels`.
    solid_array: BitVec,
}

impl ChunkBlocks {
    /// A chunk's worth of air.
    pub fn empty(dimensions: ChunkDimensions) -> Self {
        let volume = dimensions.volume();
        ChunkBlocks {
            dimensions,
            voxels: vec![Voxel::AIR; volume],
            solid_array: BitVec::repeat(false, volume),
        }
    }

    /// A chunk completely filled with one block.
    pub fn filled(dimensions: ChunkDimensions, voxel: Voxel) -> Self {
        let volume = dimensions.volume();
        ChunkBlocks {
            dimensions,
            voxels: vec![voxel; volume],
            solid_array: BitVec::repeat(!voxel.is_air(), volume),
        }
    }

    /// The extents of this block array.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// Returns the block at a local coordinate, or air outside the chunk.
    pub fn get_local_block(&self, x: i32, y: i32, z: i32) -> Voxel {
        if !self.dimensions.contains(x, y, z) {
            return Voxel::AIR;
        }
        self.voxels[self.dimensions.index(x as usize, y as usize, z as usize)]
    }

    /// Checks if the block at the local coordinate is solid.
    ///
    /// Returns `false` for coordinates outside the chunk.
    pub fn is_block_solid(&self, x: i32, y: i32, z: i32) -> bool {
        if !self.dimensions.contains(x, y, z) {
            return false;
        }
        self.solid_array[self.dimensions.index(x as usize, y as usize, z as usize)]
    }

    /// Overwrites a block in place, keeping the solidity bit in step.
    ///
    /// Returns `false` and writes nothing if the coordinate is outside the chunk.
    pub fn set_local_block(&mut self, x: i32, y: i32, z: i32, voxel: Voxel) -> bool {
        if !self.dimensions.contains(x, y, z) {
            return false;
        }
        let index = self.dimensions.index(x as usize, y as usize, z as usize);
        self.voxels[index] = voxel;
        self.solid_array.set(index, !voxel.is_air());
        true
    }

    /// Number of non-air blocks.
    pub fn solid_count(&self) -> usize {
        self.solid_array.count_ones()
    }

    /// Raw view of the voxel array.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.voxels)
    }
}

/// Cached link from a chunk to the chunk across one of its sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighborSlot {
    /// Not looked up yet.
    Unresolved,
    /// The chunk sits on the grid edge on this side.
    Edge,
    /// Grid index of the adjacent chunk.
    Chunk(usize),
}

/// Where a chunk is in its mesh regeneration cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkMeshState {
    /// The active mesh reflects the current blocks.
    Clean,
    /// A block changed since the last mesh job was scheduled.
    Dirty,
    /// At least one mesh job is in flight and nothing changed since.
    Meshing,
}

/// Everything a background job needs to hand its result back to one chunk.
///
/// A ticket dropped without delivering (full channel, or a job that
/// panicked) counts as a dropped result, so the next poll re-marks the chunk
/// dirty instead of waiting on it forever.
pub(crate) struct MeshJobTicket {
    pub generation: u64,
    sender: Sender<MeshResult>,
    dropped_results: Arc<AtomicUsize>,
    delivered: bool,
}

impl MeshJobTicket {
    /// Sends the finished mesh to the chunk without blocking.
    pub fn deliver(&mut self, mesh: MeshBuffer) -> Result<(), TrySendError<MeshResult>> {
        self.sender.try_send(MeshResult {
            generation: self.generation,
            mesh,
        })?;
        self.delivered = true;
        Ok(())
    }
}

impl Drop for MeshJobTicket {
    fn drop(&mut self) {
        if !self.delivered {
            self.dropped_results.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Represents one chunk of the grid.
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: ChunkCoordinates,
    blocks: Arc<ChunkBlocks>,
    dirty: bool,
    neighbors: [NeighborSlot; 6],
    active_mesh: Option<Arc<MeshBuffer>>,
    result_sender: Sender<MeshResult>,
    result_receiver: Receiver<MeshResult>,
    /// Jobs that ended without delivering a result.
    dropped_results: Arc<AtomicUsize>,
    next_generation: u64,
    published_generation: u64,
    jobs_in_flight: usize,
}

impl Chunk {
    /// Creates an all-air chunk with no mesh.
    ///
    /// A new chunk starts dirty: it has never been meshed.
    pub fn new(
        position: ChunkCoordinates,
        dimensions: ChunkDimensions,
        result_channel_capacity: usize,
    ) -> Self {
        let (result_sender, result_receiver) = bounded(result_channel_capacity);
        Chunk {
            position,
            blocks: Arc::new(ChunkBlocks::empty(dimensions)),
            dirty: true,
            neighbors: [NeighborSlot::Unresolved; 6],
            active_mesh: None,
            result_sender,
            result_receiver,
            dropped_results: Arc::new(AtomicUsize::new(0)),
            next_generation: 1,
            published_generation: 0,
            jobs_in_flight: 0,
        }
    }

    /// The extents of this chunk.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.blocks.dimensions()
    }

    /// Returns the block at a local coordinate, or air outside the chunk.
    ///
    /// Never reads a neighbor; cross-chunk reads go through the grid.
    pub fn get_local_block(&self, x: i32, y: i32, z: i32) -> Voxel {
        self.blocks.get_local_block(x, y, z)
    }

    /// Writes a block in place and marks the chunk dirty.
    ///
    /// Neighbor chunks are not touched. Returns `false` if the coordinate is
    /// outside the chunk, in which case nothing changes.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, voxel: Voxel) -> bool {
        if !self.dimensions().contains(x, y, z) {
            return false;
        }
        Arc::make_mut(&mut self.blocks).set_local_block(x, y, z, voxel);
        self.dirty = true;
        true
    }

    /// Replaces every block with `voxel` and marks the chunk dirty.
    pub fn fill(&mut self, voxel: Voxel) {
        self.blocks = Arc::new(ChunkBlocks::filled(self.dimensions(), voxel));
        self.dirty = true;
    }

    /// Rebuilds every block from a generator of local coordinates and marks
    /// the chunk dirty.
    pub fn fill_with(&mut self, mut generator: impl FnMut(i32, i32, i32) -> Voxel) {
        let dimensions = self.dimensions();
        let mut blocks = ChunkBlocks::empty(dimensions);
        for z in 0..dimensions.horizontal as i32 {
            for y in 0..dimensions.height as i32 {
                for x in 0..dimensions.horizontal as i32 {
                    blocks.set_local_block(x, y, z, generator(x, y, z));
                }
            }
        }
        self.blocks = Arc::new(blocks);
        self.dirty = true;
    }

    /// A shared, read-only handle to the current block data.
    pub fn blocks(&self) -> Arc<ChunkBlocks> {
        self.blocks.clone()
    }

    /// Whether a block changed since the last mesh job was scheduled.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flags the chunk for regeneration without changing any block.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Current position in the regeneration cycle.
    pub fn mesh_state(&self) -> ChunkMeshState {
        if self.dirty {
            ChunkMeshState::Dirty
        } else if self.jobs_in_flight > 0 {
            ChunkMeshState::Meshing
        } else {
            ChunkMeshState::Clean
        }
    }

    /// Number of mesh jobs dispatched whose results have not been collected.
    pub fn jobs_in_flight(&self) -> usize {
        self.jobs_in_flight
    }

    /// The mesh the renderer should draw for this chunk, if any.
    pub fn active_mesh(&self) -> Option<&Arc<MeshBuffer>> {
        self.active_mesh.as_ref()
    }

    /// The cached neighbor link on `side`.
    pub fn neighbor(&self, side: BlockSide) -> NeighborSlot {
        self.neighbors[side as usize]
    }

    pub(crate) fn set_neighbor(&mut self, side: BlockSide, slot: NeighborSlot) {
        self.neighbors[side as usize] = slot;
    }

    /// Clears the dirty flag and hands out a ticket for one new mesh job.
    ///
    /// The flag is cleared before the job starts so an edit made while the job
    /// runs leaves the chunk dirty again.
    pub(crate) fn begin_mesh_job(&mut self) -> MeshJobTicket {
        self.dirty = false;
        self.jobs_in_flight += 1;
        let generation = self.next_generation;
        self.next_generation += 1;
        MeshJobTicket {
            generation,
            sender: self.result_sender.clone(),
            dropped_results: self.dropped_results.clone(),
            delivered: false,
        }
    }

    /// Installs a mesh computed on the calling thread as the active mesh.
    ///
    /// Counts as the newest generation, so any job still in flight for an
    /// older state is discarded when it lands.
    pub(crate) fn publish_immediate(&mut self, mesh: MeshBuffer) {
        self.dirty = false;
        self.published_generation = self.next_generation;
        self.next_generation += 1;
        self.active_mesh = Some(Arc::new(mesh));
    }

    /// Drains finished mesh jobs without blocking.
    ///
    /// Each fresh result is handed to `uploader` and then swapped in as the
    /// active mesh; results older than the mesh already published are
    /// discarded. Jobs that never delivered a result, because the channel was
    /// full or the job panicked, stop counting as in flight and re-mark the
    /// chunk dirty. Returns `true` if a new mesh was published.
    pub(crate) fn collect_results(&mut self, uploader: &mut dyn MeshUploader) -> bool {
        let dropped = self.dropped_results.swap(0, Ordering::AcqRel);
        if dropped > 0 {
            log::warn!(
                "Chunk {:?} lost {} mesh result(s), re-marking dirty",
                self.position,
                dropped
            );
            self.jobs_in_flight = self.jobs_in_flight.saturating_sub(dropped);
            self.dirty = true;
        }

        let mut published = false;
        while let Ok(result) = self.result_receiver.try_recv() {
            self.jobs_in_flight = self.jobs_in_flight.saturating_sub(1);
            if result.generation <= self.published_generation {
                log::debug!(
                    "Discarding stale mesh generation {} for chunk {:?} (published {})",
                    result.generation,
                    self.position,
                    self.published_generation
                );
                continue;
            }
            uploader.upload(self.position, &result.mesh);
            self.published_generation = result.generation;
            self.active_mesh = Some(Arc::new(result.mesh));
            published = true;
        }

        published
    }
}

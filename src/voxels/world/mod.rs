//! # World Module
//!
//! This module provides the [`ChunkGrid`], which owns every chunk of a fixed-size
//! grid and drives their mesh regeneration.
//!
//! ## Architecture
//!
//! Chunks live in one dense array indexed by `cx + cy * width + cz * width * height`.
//! Chunks never hold references to each other: a chunk caches the grid *index*
//! of each neighbor, and a mesh job receives `Arc` snapshots of the neighbor
//! block arrays taken when the job is scheduled.
//!
//! ## Regeneration
//!
//! ```text
//! set_block ──> chunk dirty ──generate_mesh──> job on a worker ──> result channel
//!                                                                       │
//!            active mesh <──── MeshUploader::upload <──── poll_completed_meshes
//! ```
//!
//! The poll never blocks. A chunk edited while its job is in flight keeps the
//! job, publishes its (slightly stale) result, and stays dirty so the next
//! regeneration catches up.

use std::sync::Arc;

use cgmath::Point3;
use log::info;

use crate::{
    config::GridConfig,
    error::GridError,
    rendering::{
        meshing::{GreedyMesher, MeshBuffer},
        tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask,
        MeshUploader,
    },
    task_management::TaskManager,
    voxels::{
        block::{block_side::BlockSide, BlockCatalog, Voxel},
        chunk::{Chunk, NeighborSlot, Neighborhood},
        coords::{ChunkCoordinates, ChunkDimensions, Int3},
    },
};

/// A fixed-size grid of chunks plus the machinery that keeps their meshes
/// up to date.
pub struct ChunkGrid {
    config: GridConfig,
    dimensions: ChunkDimensions,
    chunks: Vec<Option<Chunk>>,
    catalog: Arc<dyn BlockCatalog>,
    task_manager: TaskManager,
    /// Arena for meshing on the calling thread.
    mesher: GreedyMesher,
}

impl ChunkGrid {
    /// Creates a grid of all-air chunks and starts its mesh workers.
    ///
    /// # Errors
    /// Fails if the configuration is invalid or a worker thread cannot start.
    pub fn new(config: GridConfig, catalog: Arc<dyn BlockCatalog>) -> Result<Self, GridError> {
        config.validate()?;

        let dimensions = config.chunk_dimensions();
        let mut chunks = Vec::with_capacity(config.chunk_count());
        for cz in 0..config.grid_depth as i32 {
            for cy in 0..config.grid_height as i32 {
                for cx in 0..config.grid_width as i32 {
                    chunks.push(Some(Chunk::new(
                        Point3::new(cx, cy, cz),
                        dimensions,
                        config.result_channel_capacity,
                    )));
                }
            }
        }

        let task_manager = TaskManager::new(config.worker_count)?;

        info!(
            "Created {}x{}x{} chunk grid of {}x{}x{} blocks ({:?} buffers)",
            config.grid_width,
            config.grid_height,
            config.grid_depth,
            dimensions.horizontal,
            dimensions.height,
            dimensions.horizontal,
            config.buffer_mode
        );

        Ok(ChunkGrid {
            config,
            dimensions,
            chunks,
            catalog,
            task_manager,
            mesher: GreedyMesher::new(dimensions),
        })
    }

    /// The configuration the grid was built with.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Block extents of every chunk.
    pub fn chunk_dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// Flat slot index of a chunk position, or `None` outside the grid.
    pub fn index_of(&self, position: ChunkCoordinates) -> Option<usize> {
        let in_range = |value: i32, limit: usize| value >= 0 && (value as usize) < limit;
        if !in_range(position.x, self.config.grid_width)
            || !in_range(position.y, self.config.grid_height)
            || !in_range(position.z, self.config.grid_depth)
        {
            return None;
        }
        let (x, y, z) = (position.x as usize, position.y as usize, position.z as usize);
        Some(x + y * self.config.grid_width + z * self.config.grid_width * self.config.grid_height)
    }

    /// The chunk in slot `index`, if any.
    pub fn chunk_at_index(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index).and_then(Option::as_ref)
    }

    /// The chunk at a grid position, or `None` outside the grid.
    pub fn get_chunk(&self, position: ChunkCoordinates) -> Option<&Chunk> {
        self.index_of(position)
            .and_then(|index| self.chunk_at_index(index))
    }

    /// Mutable access to the chunk at a grid position.
    pub fn get_chunk_mut(&mut self, position: ChunkCoordinates) -> Option<&mut Chunk> {
        let index = self.index_of(position)?;
        self.chunks.get_mut(index).and_then(Option::as_mut)
    }

    /// Iterates over every chunk in slot order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().flatten()
    }

    /// Returns the block at a world position; air outside the grid.
    pub fn get_block(&self, world: Int3) -> Voxel {
        let (chunk, local) = self.dimensions.world_to_local(world);
        match self.get_chunk(chunk) {
            Some(chunk) => chunk.get_local_block(local.x as i32, local.y as i32, local.z as i32),
            None => Voxel::AIR,
        }
    }

    /// Writes a block at a world position and marks its chunk dirty.
    ///
    /// When the block sits on an x or z chunk boundary the chunk across that
    /// boundary is marked dirty too, since its seam faces may have changed.
    /// Returns `false` if the position is outside the grid.
    pub fn set_block(&mut self, world: Int3, voxel: Voxel) -> bool {
        let (position, local) = self.dimensions.world_to_local(world);
        let Some(chunk) = self.get_chunk_mut(position) else {
            return false;
        };
        chunk.set_block(local.x as i32, local.y as i32, local.z as i32, voxel);

        let last = self.dimensions.horizontal - 1;
        let seams = [
            (local.x == 0, BlockSide::WEST),
            (local.x == last, BlockSide::EAST),
            (local.z == 0, BlockSide::NORTH),
            (local.z == last, BlockSide::SOUTH),
        ];
        for (on_seam, side) in seams {
            if !on_seam {
                continue;
            }
            if let Some(neighbor) = self.get_chunk_mut(position + side.offset()) {
                neighbor.mark_dirty();
            }
        }

        true
    }

    /// Regenerates every chunk's blocks from a function of world position.
    ///
    /// Every chunk ends up dirty; nothing is meshed yet.
    pub fn fill_with(&mut self, mut generator: impl FnMut(Int3) -> Voxel) {
        let dimensions = self.dimensions;
        for chunk in self.chunks.iter_mut().flatten() {
            let origin = dimensions.chunk_origin(chunk.position);
            chunk.fill_with(|x, y, z| generator(Point3::new(origin.x + x, origin.y + y, origin.z + z)));
        }
    }

    /// Resolves and caches the six neighbor slots of the chunk at `index`.
    ///
    /// Slots that are already resolved are left alone, so this is cheap to
    /// call before every mesh job.
    pub fn init_neighbors(&mut self, index: usize) {
        let Some(position) = self.chunk_at_index(index).map(|chunk| chunk.position) else {
            return;
        };

        for side in BlockSide::all() {
            let resolved = match self.chunk_at_index(index) {
                Some(chunk) => chunk.neighbor(side) != NeighborSlot::Unresolved,
                None => return,
            };
            if resolved {
                continue;
            }

            let slot = match self.index_of(position + side.offset()) {
                Some(neighbor) if self.chunk_at_index(neighbor).is_some() => {
                    NeighborSlot::Chunk(neighbor)
                }
                _ => NeighborSlot::Edge,
            };
            if let Some(chunk) = self.chunks[index].as_mut() {
                chunk.set_neighbor(side, slot);
            }
        }
    }

    /// Snapshots the chunk at `index` and its resolved neighbors.
    ///
    /// Call [`ChunkGrid::init_neighbors`] first; unresolved slots are treated
    /// as grid edges.
    pub fn neighborhood(&self, index: usize) -> Option<Neighborhood> {
        let chunk = self.chunk_at_index(index)?;
        let neighbors = BlockSide::all().map(|side| match chunk.neighbor(side) {
            NeighborSlot::Chunk(neighbor) => self.chunk_at_index(neighbor).map(Chunk::blocks),
            NeighborSlot::Unresolved | NeighborSlot::Edge => None,
        });
        Some(Neighborhood::new(chunk.blocks(), neighbors))
    }

    /// Meshes a chunk on the calling thread and publishes the result at once.
    ///
    /// Any background job still running for the chunk is superseded: its
    /// result will be discarded when it lands. Returns the new active mesh,
    /// or `None` if there is no chunk at `position`.
    pub fn mesh_chunk_now(
        &mut self,
        position: ChunkCoordinates,
        uploader: &mut dyn MeshUploader,
    ) -> Option<Arc<MeshBuffer>> {
        let index = self.index_of(position)?;
        self.init_neighbors(index);
        let neighborhood = self.neighborhood(index)?;

        let mut mesh = MeshBuffer::new(self.config.buffer_mode);
        self.mesher
            .mesh(&neighborhood, self.catalog.as_ref(), &mut mesh);
        mesh.flush();

        uploader.upload(position, &mesh);
        let chunk = self.chunks[index].as_mut()?;
        chunk.publish_immediate(mesh);
        chunk.active_mesh().cloned()
    }

    /// Schedules a background mesh job for a dirty chunk.
    ///
    /// The dirty flag is cleared before the job is handed out. Returns `false`
    /// if there is no chunk at `position` or it is not dirty.
    pub fn generate_mesh(&mut self, position: ChunkCoordinates) -> bool {
        match self.index_of(position) {
            Some(index) => self.schedule_mesh_job(index),
            None => false,
        }
    }

    fn schedule_mesh_job(&mut self, index: usize) -> bool {
        if !self.chunk_at_index(index).is_some_and(Chunk::is_dirty) {
            return false;
        }
        self.init_neighbors(index);
        let Some(neighborhood) = self.neighborhood(index) else {
            return false;
        };
        let Some(chunk) = self.chunks[index].as_mut() else {
            return false;
        };

        let ticket = chunk.begin_mesh_job();
        let task = ChunkMeshGenerationTask::new(
            chunk.position,
            neighborhood,
            self.catalog.clone(),
            self.config.buffer_mode,
            ticket,
        );
        self.task_manager.publish_task(Box::new(task));
        true
    }

    /// Schedules a mesh job for every dirty chunk. Returns how many were scheduled.
    pub fn regenerate_dirty(&mut self) -> usize {
        let scheduled = (0..self.chunks.len())
            .filter(|index| self.schedule_mesh_job(*index))
            .count();
        if scheduled > 0 {
            log::debug!("Scheduled {} mesh jobs", scheduled);
        }
        scheduled
    }

    /// The per-frame poll: moves worker bookkeeping along and publishes every
    /// finished mesh.
    ///
    /// Never blocks. Each new mesh goes through `uploader` before it becomes
    /// the chunk's active mesh. Returns the positions of the chunks that got a
    /// new mesh.
    pub fn poll_completed_meshes(&mut self, uploader: &mut dyn MeshUploader) -> Vec<ChunkCoordinates> {
        for report in self.task_manager.process_completed_tasks() {
            if report.panicked {
                log::error!("Mesh job '{}' did not complete", report.label);
            }
        }
        self.task_manager.process_queued_tasks();

        self.chunks
            .iter_mut()
            .flatten()
            .filter_map(|chunk| chunk.collect_results(&mut *uploader).then_some(chunk.position))
            .collect()
    }

    /// Whether no mesh job is queued, running, or waiting to be collected.
    ///
    /// Dirty chunks that were never scheduled do not count as work.
    pub fn is_idle(&self) -> bool {
        self.task_manager.is_idle() && self.chunks().all(|chunk| chunk.jobs_in_flight() == 0)
    }

    /// Number of chunks whose blocks changed since their last scheduled mesh.
    pub fn dirty_count(&self) -> usize {
        self.chunks().filter(|chunk| chunk.is_dirty()).count()
    }
}

#[cfg(test)]
mod tests;

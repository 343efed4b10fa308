//! Task for generating mesh data for chunks in a background thread.
//!
//! The task owns read-only snapshots of its chunk and the chunks around it,
//! runs the greedy mesher over them and sends the finished buffer down the
//! chunk's bounded result channel. It never touches the live chunk.

use std::{cell::RefCell, sync::Arc};

use crossbeam_channel::TrySendError;
use web_time::Instant;

use crate::{
    rendering::meshing::{BufferMode, GreedyMesher, MeshBuffer},
    task_management::task::Task,
    voxels::{
        block::BlockCatalog,
        chunk::{MeshJobTicket, Neighborhood},
        coords::ChunkCoordinates,
    },
};

thread_local! {
    /// One mesher arena per worker thread, reused across jobs.
    static MESHER: RefCell<Option<GreedyMesher>> = const { RefCell::new(None) };
}

/// A finished mesh on its way back to its chunk.
pub struct MeshResult {
    /// Which regeneration of the chunk produced this mesh.
    pub generation: u64,
    /// The flushed mesh.
    pub mesh: MeshBuffer,
}

/// A task that generates mesh data for a chunk in a background thread.
pub struct ChunkMeshGenerationTask {
    position: ChunkCoordinates,
    neighborhood: Neighborhood,
    catalog: Arc<dyn BlockCatalog>,
    mode: BufferMode,
    ticket: MeshJobTicket,
}

impl ChunkMeshGenerationTask {
    pub(crate) fn new(
        position: ChunkCoordinates,
        neighborhood: Neighborhood,
        catalog: Arc<dyn BlockCatalog>,
        mode: BufferMode,
        ticket: MeshJobTicket,
    ) -> Self {
        ChunkMeshGenerationTask {
            position,
            neighborhood,
            catalog,
            mode,
            ticket,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn label(&self) -> String {
        format!(
            "mesh chunk ({}, {}, {}) generation {}",
            self.position.x, self.position.y, self.position.z, self.ticket.generation
        )
    }

    fn process(mut self: Box<Self>) {
        let start_time = Instant::now();

        let mut mesh = MeshBuffer::new(self.mode);
        let quads = MESHER.with(|cell| {
            let mut slot = cell.borrow_mut();
            let mesher =
                slot.get_or_insert_with(|| GreedyMesher::new(self.neighborhood.dimensions()));
            mesher.mesh(&self.neighborhood, self.catalog.as_ref(), &mut mesh)
        });
        mesh.flush();

        log::debug!(
            "Meshed chunk {:?} (generation {}): {} quads in {:?}",
            self.position,
            self.ticket.generation,
            quads,
            start_time.elapsed()
        );

        // An undelivered ticket is counted as dropped when the task goes away.
        match self.ticket.deliver(mesh) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!(
                    "Result channel for chunk {:?} is full, dropping generation {}",
                    self.position,
                    self.ticket.generation
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                log::debug!(
                    "Chunk {:?} is gone, discarding generation {}",
                    self.position,
                    self.ticket.generation
                );
            }
        }
    }
}

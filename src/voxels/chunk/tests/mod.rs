use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use cgmath::Point3;

use crate::{
    rendering::{
        meshing::{BufferMode, MeshBuffer},
        tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask,
        MeshUploader,
    },
    task_management::task::Task,
    voxels::{
        block::{block_side::BlockSide, BlockCatalog, TextureRefCatalog, Voxel},
        coords::{ChunkCoordinates, ChunkDimensions},
    },
};

use super::{Chunk, ChunkBlocks, ChunkMeshState, NeighborSlot, Neighborhood};

const STONE: Voxel = Voxel::new(1, 1);

#[derive(Default)]
struct RecordingUploader {
    uploads: Vec<(ChunkCoordinates, usize)>,
}

impl MeshUploader for RecordingUploader {
    fn upload(&mut self, position: ChunkCoordinates, mesh: &MeshBuffer) {
        self.uploads.push((position, mesh.quad_count()));
    }
}

fn test_chunk(capacity: usize) -> Chunk {
    Chunk::new(Point3::new(1, 0, 2), ChunkDimensions::new(4, 4), capacity)
}

/// Texture lookups blow up, so any job meshing a solid block panics.
struct BrokenCatalog;

impl BlockCatalog for BrokenCatalog {
    fn texture_index(&self, voxel: &Voxel, side: BlockSide) -> u16 {
        panic!("no texture for {voxel:?} on {side:?}");
    }
}

fn mesh_task(chunk: &mut Chunk) -> Box<ChunkMeshGenerationTask> {
    mesh_task_with(chunk, Arc::new(TextureRefCatalog))
}

fn mesh_task_with(chunk: &mut Chunk, catalog: Arc<dyn BlockCatalog>) -> Box<ChunkMeshGenerationTask> {
    let neighborhood = Neighborhood::isolated(chunk.blocks());
    let ticket = chunk.begin_mesh_job();
    Box::new(ChunkMeshGenerationTask::new(
        chunk.position,
        neighborhood,
        catalog,
        BufferMode::Partial,
        ticket,
    ))
}

#[test]
fn out_of_bounds_reads_are_air() {
    let chunk = test_chunk(4);
    for (x, y, z) in [(-1, 0, 0), (4, 0, 0), (0, -1, 0), (0, 4, 0), (0, 0, 4), (i32::MAX, 0, 0)] {
        assert_eq!(chunk.get_local_block(x, y, z), Voxel::AIR);
    }
}

#[test]
fn out_of_bounds_writes_are_ignored() {
    let mut chunk = test_chunk(4);
    chunk.begin_mesh_job();
    assert!(!chunk.set_block(4, 0, 0, STONE));
    assert!(!chunk.is_dirty());
    assert_eq!(chunk.blocks().solid_count(), 0);
}

#[test]
fn block_storage_tracks_solidity() {
    let mut blocks = ChunkBlocks::empty(ChunkDimensions::new(4, 8));
    assert!(blocks.set_local_block(3, 7, 3, STONE));
    assert!(blocks.is_block_solid(3, 7, 3));
    assert_eq!(blocks.get_local_block(3, 7, 3), STONE);
    assert_eq!(blocks.solid_count(), 1);

    blocks.set_local_block(3, 7, 3, Voxel::AIR);
    assert!(!blocks.is_block_solid(3, 7, 3));
    assert_eq!(blocks.solid_count(), 0);

    let filled = ChunkBlocks::filled(ChunkDimensions::new(4, 8), STONE);
    assert_eq!(filled.solid_count(), 128);
    assert_eq!(filled.as_bytes().len(), 128 * 4);
}

#[test]
fn lifecycle_moves_through_dirty_meshing_clean() {
    let mut chunk = test_chunk(4);
    assert_eq!(chunk.mesh_state(), ChunkMeshState::Dirty);

    let task = mesh_task(&mut chunk);
    assert_eq!(chunk.mesh_state(), ChunkMeshState::Meshing);
    task.process();

    assert!(chunk.collect_results(&mut ()));
    assert_eq!(chunk.mesh_state(), ChunkMeshState::Clean);
    assert!(chunk.active_mesh().is_some());
}

#[test]
fn edit_during_meshing_leaves_chunk_dirty_but_still_publishes() {
    let mut chunk = test_chunk(4);
    chunk.set_block(0, 0, 0, STONE);
    let task = mesh_task(&mut chunk);

    chunk.set_block(2, 2, 2, STONE);
    assert_eq!(chunk.mesh_state(), ChunkMeshState::Dirty);
    task.process();

    let mut uploader = RecordingUploader::default();
    assert!(chunk.collect_results(&mut uploader));
    // the published mesh predates the second edit
    assert_eq!(uploader.uploads, vec![(chunk.position, 6)]);
    assert!(chunk.is_dirty());
}

#[test]
fn jobs_read_a_snapshot_of_the_blocks() {
    let mut chunk = test_chunk(4);
    let snapshot = chunk.blocks();
    chunk.set_block(1, 1, 1, STONE);

    assert_eq!(snapshot.get_local_block(1, 1, 1), Voxel::AIR);
    assert_eq!(chunk.get_local_block(1, 1, 1), STONE);
}

#[test]
fn older_generations_are_discarded() {
    let mut chunk = test_chunk(4);
    let mut first = chunk.begin_mesh_job();
    let mut second = chunk.begin_mesh_job();
    assert_eq!(chunk.jobs_in_flight(), 2);

    let mut newer = MeshBuffer::new(BufferMode::Flat);
    newer.append_quad([Point3::new(0, 0, 0); 4], BlockSide::UP, 0, [0; 4]);
    assert!(second.deliver(newer).is_ok());
    assert!(first.deliver(MeshBuffer::new(BufferMode::Flat)).is_ok());

    let mut uploader = RecordingUploader::default();
    assert!(chunk.collect_results(&mut uploader));
    assert_eq!(uploader.uploads.len(), 1);
    assert_eq!(chunk.active_mesh().map(|mesh| mesh.quad_count()), Some(1));
    assert_eq!(chunk.jobs_in_flight(), 0);
}

#[test]
fn immediate_mesh_supersedes_jobs_in_flight() {
    let mut chunk = test_chunk(4);
    let task = mesh_task(&mut chunk);
    chunk.publish_immediate(MeshBuffer::new(BufferMode::Partial));
    let immediate = chunk.active_mesh().cloned().unwrap();

    task.process();
    assert!(!chunk.collect_results(&mut ()));
    assert!(Arc::ptr_eq(chunk.active_mesh().unwrap(), &immediate));
    assert_eq!(chunk.jobs_in_flight(), 0);
}

#[test]
fn dropped_results_mark_the_chunk_dirty_again() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut chunk = test_chunk(1);
    chunk.set_block(1, 1, 1, STONE);

    let first = mesh_task(&mut chunk);
    let second = mesh_task(&mut chunk);
    first.process();
    // the channel holds one result, so this one is dropped
    second.process();
    assert!(!chunk.is_dirty());

    assert!(chunk.collect_results(&mut ()));
    assert!(chunk.is_dirty());
    assert_eq!(chunk.jobs_in_flight(), 0);
    assert_eq!(chunk.active_mesh().map(|mesh| mesh.quad_count()), Some(6));
}

#[test]
fn panicked_job_hands_the_chunk_back_as_dirty() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut chunk = test_chunk(4);
    chunk.set_block(1, 1, 1, STONE);

    let task = mesh_task_with(&mut chunk, Arc::new(BrokenCatalog));
    assert_eq!(chunk.mesh_state(), ChunkMeshState::Meshing);
    assert!(panic::catch_unwind(AssertUnwindSafe(|| task.process())).is_err());

    assert!(!chunk.collect_results(&mut ()));
    assert_eq!(chunk.mesh_state(), ChunkMeshState::Dirty);
    assert_eq!(chunk.jobs_in_flight(), 0);
    assert!(chunk.active_mesh().is_none());

    // a healthy retry publishes normally
    mesh_task(&mut chunk).process();
    assert!(chunk.collect_results(&mut ()));
    assert_eq!(chunk.mesh_state(), ChunkMeshState::Clean);
}

#[test]
fn abandoned_ticket_counts_as_dropped() {
    let mut chunk = test_chunk(4);
    drop(chunk.begin_mesh_job());
    assert_eq!(chunk.mesh_state(), ChunkMeshState::Meshing);

    chunk.collect_results(&mut ());
    assert_eq!(chunk.mesh_state(), ChunkMeshState::Dirty);
    assert_eq!(chunk.jobs_in_flight(), 0);
}

#[test]
fn edits_stay_in_place_without_outstanding_snapshots() {
    let mut chunk = test_chunk(4);
    let before = Arc::as_ptr(&chunk.blocks());
    chunk.set_block(0, 0, 0, STONE);
    assert_eq!(Arc::as_ptr(&chunk.blocks()), before);

    // one copy for the held snapshot, then in place again
    let snapshot = chunk.blocks();
    chunk.set_block(1, 0, 0, STONE);
    let copied = Arc::as_ptr(&chunk.blocks());
    assert_ne!(copied, Arc::as_ptr(&snapshot));
    chunk.set_block(2, 0, 0, STONE);
    assert_eq!(Arc::as_ptr(&chunk.blocks()), copied);
    assert_eq!(snapshot.solid_count(), 1);
}

#[test]
fn fill_with_rebuilds_every_block() {
    let mut chunk = test_chunk(4);
    chunk.begin_mesh_job();
    chunk.fill_with(|_, y, _| if y < 2 { STONE } else { Voxel::AIR });

    assert!(chunk.is_dirty());
    assert_eq!(chunk.blocks().solid_count(), 32);
    assert_eq!(chunk.get_local_block(3, 1, 3), STONE);
    assert_eq!(chunk.get_local_block(3, 2, 3), Voxel::AIR);

    chunk.fill(Voxel::AIR);
    assert_eq!(chunk.blocks().solid_count(), 0);
}

#[test]
fn neighbor_slots_start_unresolved() {
    let chunk = test_chunk(4);
    for side in BlockSide::all() {
        assert_eq!(chunk.neighbor(side), NeighborSlot::Unresolved);
    }
}

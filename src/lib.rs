#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Mesher
//!
//! A greedy voxel-chunk mesher with an asynchronous regeneration pipeline.
//!
//! This crate turns a grid of typed blocks into a small set of textured quads,
//! packs every vertex into a single `u32`, and keeps each chunk's mesh in sync
//! with its blocks without ever blocking the render loop.
//!
//! ## Key Modules
//!
//! * `voxels` - Blocks, coordinates, chunk storage and the chunk grid
//! * `rendering` - Vertex packing, face classification, greedy meshing, mesh buffers
//!   and the background mesh job
//! * `task_management` - The worker pool mesh jobs run on
//! * `config` - Grid construction settings
//! * `error` - Error types
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use cgmath::Point3;
//! use voxel_mesher::{BlockTextureTable, ChunkGrid, GridConfig, Voxel};
//!
//! let mut grid = ChunkGrid::new(GridConfig::default(), Arc::new(BlockTextureTable::standard()))
//!     .expect("valid configuration");
//! grid.set_block(Point3::new(3, 4, 5), Voxel::new(1, 0));
//! grid.regenerate_dirty();
//!
//! // Once per frame:
//! for position in grid.poll_completed_meshes(&mut ()) {
//!     let mesh = grid.get_chunk(position).and_then(|chunk| chunk.active_mesh());
//!     // hand `mesh` to the renderer
//! }
//! ```
//!
//! ## Performance Considerations
//!
//! * Greedy meshing merges coplanar faces, so flat areas cost one quad each
//! * Block data is copy-on-write, so mesh jobs read it without locks
//! * Each worker keeps its own mesher arena, reused across jobs
//! * Partial buffers let the renderer skip faces pointing away from the camera

use log::info;

pub mod config;
mod demo;
pub mod error;
pub mod rendering;
pub mod task_management;
pub mod voxels;

pub use config::GridConfig;
pub use error::{ConfigError, EncodeError, GridError, MeshBufferError};
pub use rendering::{
    meshing::{generate_mesh, BufferMode, CameraFacing, DrawRange, GreedyMesher, MeshBuffer},
    vertex::{compress, decompress, try_compress, PackedVertex},
    MeshUploader,
};
pub use voxels::{
    block::{block_side::BlockSide, BlockCatalog, BlockTextureTable, TextureRefCatalog, Voxel},
    chunk::{Chunk, ChunkBlocks, ChunkMeshState, Neighborhood},
    coords::{ChunkCoordinates, ChunkDimensions, Int3},
    world::ChunkGrid,
};

/// Runs the terrain demo: builds a grid, meshes it, applies random edits and
/// meshes again, logging the totals.
///
/// Log output goes to stdout and is filtered by `RUST_LOG`.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(text) => match GridConfig::from_json_str(&text) {
                Ok(config) => config,
                Err(err) => {
                    log::error!("Invalid configuration in {}: {}", path, err);
                    return;
                }
            },
            Err(err) => {
                log::error!("Cannot read {}: {}", path, err);
                return;
            }
        },
        None => GridConfig::default(),
    };

    if let Err(err) = demo::run_demo(config) {
        log::error!("Demo failed: {}", err);
    }
}

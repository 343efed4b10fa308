//! Voxel data: blocks, coordinates, chunks and the chunk grid.
//!
//! # Module Structure
//! - [`block`]: the voxel cell type, block sides and texture catalogs
//! - [`coords`]: integer coordinate types and world/chunk/local conversions
//! - [`chunk`]: per-chunk block storage, dirty tracking and mesh state
//! - [`world`]: the chunk grid and its regeneration pipeline

pub mod block;
pub mod chunk;
pub mod coords;
pub mod world;

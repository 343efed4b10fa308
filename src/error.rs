//! # Error Types
//!
//! Typed errors for the few operations in the mesher that can actually fail.
//! Out-of-bounds block and chunk lookups are deliberately absent here: they
//! resolve to air and "no chunk" respectively.

use thiserror::Error;

use crate::rendering::meshing::BufferMode;

/// A value did not fit in its field of the packed 32-bit vertex.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// A local corner coordinate is wider than the 6-bit position field.
    #[error("local {axis} coordinate {value} does not fit in 6 bits (max {max})")]
    CoordinateOutOfRange {
        /// Axis name (`x`, `y` or `z`)
        axis: char,
        /// The offending coordinate
        value: u32,
        /// Largest encodable coordinate
        max: u32,
    },
    /// The texture index is wider than the 8-bit texture field.
    #[error("texture index {value} does not fit in 8 bits")]
    TextureOutOfRange {
        /// The offending texture index
        value: u16,
    },
    /// More than the three caller tag bits were supplied.
    #[error("vertex tag {value:#b} does not fit in 3 bits")]
    TagOutOfRange {
        /// The offending tag value
        value: u8,
    },
}

/// Invalid grid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A chunk dimension is zero or too large for the packed vertex format.
    #[error("chunk {name} must be between 1 and {max}, got {value}")]
    ChunkDimension {
        /// Which dimension was rejected
        name: &'static str,
        /// The rejected value
        value: usize,
        /// Largest accepted value
        max: usize,
    },
    /// A grid dimension (counted in chunks) is zero.
    #[error("grid {name} must be at least one chunk")]
    GridDimension {
        /// Which dimension was rejected
        name: &'static str,
    },
    /// The per-chunk result channel would not be able to hold any mesh.
    #[error("result channel capacity must be non-zero")]
    ZeroChannelCapacity,
    /// No worker threads would be available to run mesh jobs.
    #[error("worker count must be non-zero")]
    ZeroWorkers,
    /// The configuration text could not be parsed.
    #[error("failed to parse grid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Mesh buffers that cannot be combined.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MeshBufferError {
    /// The two buffers use different buffering strategies.
    #[error("cannot merge a {theirs:?} buffer into a {ours:?} buffer")]
    ModeMismatch {
        /// Strategy of the receiving buffer
        ours: BufferMode,
        /// Strategy of the buffer being merged in
        theirs: BufferMode,
    },
    /// Indexed buffers carry per-buffer vertex ids and cannot be concatenated.
    #[error("indexed buffers cannot be merged")]
    IndexedMerge,
}

/// Failure while constructing a [`crate::voxels::world::ChunkGrid`].
#[derive(Debug, Error)]
pub enum GridError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A mesh worker thread could not be started.
    #[error("failed to spawn mesh worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

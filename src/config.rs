//! # Grid Configuration
//!
//! Construction-time settings for a [`crate::voxels::world::ChunkGrid`]. Every
//! field has a default, so a JSON document only needs to name what it changes:
//!
//! ```json
//! { "chunk_horizontal_size": 32, "grid_width": 8, "buffer_mode": "Flat" }
//! ```
//!
//! None of these values can be changed once the grid exists.

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    rendering::{meshing::BufferMode, vertex::MAX_LOCAL_COORDINATE},
    voxels::coords::ChunkDimensions,
};

/// Largest chunk dimension the packed vertex format can address.
///
/// Quad corners run from `0` to the dimension itself, so the dimension must
/// be a valid local coordinate.
pub const MAX_CHUNK_DIMENSION: usize = MAX_LOCAL_COORDINATE as usize;

/// Default capacity of each chunk's mesh result channel.
pub const DEFAULT_RESULT_CHANNEL_CAPACITY: usize = 20;

/// Settings fixed at grid construction time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Chunk size along the x and z axes, in blocks
    pub chunk_horizontal_size: usize,
    /// Chunk size along the y axis, in blocks
    pub chunk_height: usize,
    /// Grid size along x, in chunks
    pub grid_width: usize,
    /// Grid size along y, in chunks
    pub grid_height: usize,
    /// Grid size along z, in chunks
    pub grid_depth: usize,
    /// Completed meshes each chunk can hold before further results are dropped
    pub result_channel_capacity: usize,
    /// Number of background mesh worker threads
    pub worker_count: usize,
    /// Buffering strategy used for every chunk mesh
    pub buffer_mode: BufferMode,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            chunk_horizontal_size: 16,
            chunk_height: 32,
            grid_width: 4,
            grid_height: 2,
            grid_depth: 4,
            result_channel_capacity: DEFAULT_RESULT_CHANNEL_CAPACITY,
            worker_count: 4,
            buffer_mode: BufferMode::Partial,
        }
    }
}

impl GridConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: GridConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against the limits of the mesher.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("horizontal size", self.chunk_horizontal_size),
            ("height", self.chunk_height),
        ] {
            if value == 0 || value > MAX_CHUNK_DIMENSION {
                return Err(ConfigError::ChunkDimension {
                    name,
                    value,
                    max: MAX_CHUNK_DIMENSION,
                });
            }
        }

        for (name, value) in [
            ("width", self.grid_width),
            ("height", self.grid_height),
            ("depth", self.grid_depth),
        ] {
            if value == 0 {
                return Err(ConfigError::GridDimension { name });
            }
        }

        if self.result_channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }

        Ok(())
    }

    /// The block dimensions of every chunk in the grid.
    pub fn chunk_dimensions(&self) -> ChunkDimensions {
        ChunkDimensions::new(self.chunk_horizontal_size, self.chunk_height)
    }

    /// Number of chunk slots in the grid.
    pub fn chunk_count(&self) -> usize {
        self.grid_width * self.grid_height * self.grid_depth
    }
}

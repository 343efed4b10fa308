//! # Coordinates
//!
//! Integer coordinate types and the conversions between world blocks, chunk
//! grid positions and chunk-local blocks. All arithmetic is exact integer
//! arithmetic; nothing here touches floating point.

use cgmath::{Point3, Vector3};

/// An integer 3-vector used for world positions and local offsets alike.
pub type Int3 = Point3<i32>;

/// A chunk's position in the chunk grid, counted in chunks rather than blocks.
pub type ChunkCoordinates = Point3<i32>;

/// The block extents of a chunk.
///
/// The horizontal size applies to both x and z; the height applies to y.
/// The two are independent so tall, narrow chunks are possible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkDimensions {
    /// Extent along x and z
    pub horizontal: usize,
    /// Extent along y
    pub height: usize,
}

impl ChunkDimensions {
    /// Creates a new set of chunk dimensions.
    pub const fn new(horizontal: usize, height: usize) -> Self {
        ChunkDimensions { horizontal, height }
    }

    /// Extents indexed by axis (`0 = x`, `1 = y`, `2 = z`).
    pub const fn axis_sizes(&self) -> [usize; 3] {
        [self.horizontal, self.height, self.horizontal]
    }

    /// Total number of blocks in a chunk.
    pub const fn volume(&self) -> usize {
        self.horizontal * self.horizontal * self.height
    }

    /// Largest 2D slice the greedy mesher will ever build a mask for.
    pub fn max_slice_area(&self) -> usize {
        self.horizontal * self.horizontal.max(self.height)
    }

    /// Whether a local coordinate falls inside the chunk.
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        (0..self.horizontal as i32).contains(&x)
            && (0..self.height as i32).contains(&y)
            && (0..self.horizontal as i32).contains(&z)
    }

    /// Flattened storage index of a local coordinate.
    ///
    /// `x + y * horizontal + z * horizontal * height`. The caller guarantees
    /// the coordinate is in bounds.
    pub const fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.horizontal + z * self.horizontal * self.height
    }

    /// World-block origin of the chunk at the given grid position.
    pub fn chunk_origin(&self, chunk: ChunkCoordinates) -> Int3 {
        Point3::new(
            chunk.x * self.horizontal as i32,
            chunk.y * self.height as i32,
            chunk.z * self.horizontal as i32,
        )
    }

    /// Splits a world-block position into its chunk and chunk-local parts.
    ///
    /// Negative world coordinates land in negative chunks, with the local
    /// part always in `[0, dimension)`.
    pub fn world_to_local(&self, world: Int3) -> (ChunkCoordinates, Point3<usize>) {
        let sizes = Vector3::new(
            self.horizontal as i32,
            self.height as i32,
            self.horizontal as i32,
        );
        let chunk = Point3::new(
            world.x.div_euclid(sizes.x),
            world.y.div_euclid(sizes.y),
            world.z.div_euclid(sizes.z),
        );
        let local = Point3::new(
            world.x.rem_euclid(sizes.x) as usize,
            world.y.rem_euclid(sizes.y) as usize,
            world.z.rem_euclid(sizes.z) as usize,
        );
        (chunk, local)
    }
}

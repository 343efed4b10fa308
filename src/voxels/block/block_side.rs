//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the axis arithmetic
//! the mesher and face classifier need to walk between them.

use cgmath::Vector3;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Represents the six possible faces of a voxel block.
///
/// Each variant is assigned `axis * 2 + positive`, so even sides face the
/// negative end of their axis and odd sides the positive end. The value is
/// what ends up in the 3-bit side field of a packed vertex.
///
/// The order is: [WEST, EAST, DOWN, UP, NORTH, SOUTH]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum BlockSide {
    /// The west face (facing negative X)
    WEST = 0,

    /// The east face (facing positive X)
    EAST = 1,

    /// The bottom face (facing negative Y)
    DOWN = 2,

    /// The top face (facing positive Y)
    UP = 3,

    /// The north face (facing negative Z)
    NORTH = 4,

    /// The south face (facing positive Z)
    SOUTH = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    ///
    /// The order is: [WEST, EAST, DOWN, UP, NORTH, SOUTH]
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::WEST,
            BlockSide::EAST,
            BlockSide::DOWN,
            BlockSide::UP,
            BlockSide::NORTH,
            BlockSide::SOUTH,
        ]
    }

    /// The side facing along `axis` (`0 = x`, `1 = y`, `2 = z`).
    ///
    /// # Panics
    /// Panics if `axis` is not 0, 1 or 2.
    pub fn from_axis(axis: usize, positive: bool) -> Self {
        match (axis, positive) {
            (0, false) => BlockSide::WEST,
            (0, true) => BlockSide::EAST,
            (1, false) => BlockSide::DOWN,
            (1, true) => BlockSide::UP,
            (2, false) => BlockSide::NORTH,
            (2, true) => BlockSide::SOUTH,
            _ => panic!("axis {axis} out of range"),
        }
    }

    /// Decodes a side from its 3-bit packed value.
    pub fn from_index(index: u8) -> Option<Self> {
        FromPrimitive::from_u8(index)
    }

    /// The axis this side is perpendicular to.
    pub fn axis(self) -> usize {
        self as usize / 2
    }

    /// Whether this side faces the positive end of its axis.
    ///
    /// Positive sides are the odd-indexed ones, which is also what flips the
    /// quad winding in the mesh buffer.
    pub fn is_positive(self) -> bool {
        self as usize % 2 == 1
    }

    /// Whether this side faces straight up or down.
    pub fn is_vertical(self) -> bool {
        self.axis() == 1
    }

    /// The side facing the other way along the same axis.
    pub fn opposite(self) -> Self {
        Self::from_axis(self.axis(), !self.is_positive())
    }

    /// Unit offset from a block to its neighbor across this side.
    pub fn offset(self) -> Vector3<i32> {
        let mut offset = [0; 3];
        offset[self.axis()] = if self.is_positive() { 1 } else { -1 };
        Vector3::from(offset)
    }
}

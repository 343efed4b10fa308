//! Packed vertex format for voxel rendering.
//!
//! Every vertex is a single `u32`:
//!
//! | bits  | field                        |
//! |-------|------------------------------|
//! | 0–5   | local x                      |
//! | 6–11  | local y                      |
//! | 12–17 | local z                      |
//! | 18–20 | side ([`BlockSide`] value)   |
//! | 21–28 | texture index                |
//! | 29–31 | caller tag bits              |
//!
//! Positions are chunk-local quad corners, so they range over
//! `0..=MAX_LOCAL_COORDINATE`. The shader adds the chunk origin.

use cgmath::Point3;

use crate::{error::EncodeError, voxels::block::block_side::BlockSide};

/// Width of each position field.
pub const POSITION_BITS: u32 = 6;
/// Largest local coordinate a position field can hold.
pub const MAX_LOCAL_COORDINATE: u32 = (1 << POSITION_BITS) - 1;
/// Largest texture index the texture field can hold.
pub const MAX_TEXTURE_INDEX: u16 = 0xFF;
/// Largest value of the caller tag field.
pub const MAX_TAG: u8 = 0b111;

const Y_SHIFT: u32 = 6;
const Z_SHIFT: u32 = 12;
const SIDE_SHIFT: u32 = 18;
const TEXTURE_SHIFT: u32 = 21;
const TAG_SHIFT: u32 = 29;

const POSITION_MASK: u32 = MAX_LOCAL_COORDINATE;
const SIDE_MASK: u32 = 0b111;
const TEXTURE_MASK: u32 = 0xFF;
const TAG_MASK: u32 = MAX_TAG as u32;

/// A vertex in its packed GPU form.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedVertex(pub u32);

impl PackedVertex {
    /// Local corner position.
    pub fn position(self) -> Point3<u32> {
        Point3::new(
            self.0 & POSITION_MASK,
            (self.0 >> Y_SHIFT) & POSITION_MASK,
            (self.0 >> Z_SHIFT) & POSITION_MASK,
        )
    }

    /// Raw 3-bit side value.
    pub fn side_index(self) -> u8 {
        ((self.0 >> SIDE_SHIFT) & SIDE_MASK) as u8
    }

    /// The side this vertex belongs to, if the side bits are valid.
    pub fn side(self) -> Option<BlockSide> {
        BlockSide::from_index(self.side_index())
    }

    /// Texture index.
    pub fn texture_index(self) -> u8 {
        ((self.0 >> TEXTURE_SHIFT) & TEXTURE_MASK) as u8
    }

    /// Caller tag bits.
    pub fn tags(self) -> u8 {
        ((self.0 >> TAG_SHIFT) & TAG_MASK) as u8
    }
}

impl From<u32> for PackedVertex {
    fn from(value: u32) -> Self {
        PackedVertex(value)
    }
}

fn pack_masked(position: Point3<u32>, side: BlockSide, texture_index: u16, tags: u8) -> u32 {
    (position.x & POSITION_MASK)
        | (position.y & POSITION_MASK) << Y_SHIFT
        | (position.z & POSITION_MASK) << Z_SHIFT
        | (side as u32 & SIDE_MASK) << SIDE_SHIFT
        | (texture_index as u32 & TEXTURE_MASK) << TEXTURE_SHIFT
        | (tags as u32 & TAG_MASK) << TAG_SHIFT
}

/// Packs a vertex, rejecting any field that does not fit.
pub fn try_compress(
    position: Point3<u32>,
    side: BlockSide,
    texture_index: u16,
    tags: u8,
) -> Result<u32, EncodeError> {
    for (axis, value) in [('x', position.x), ('y', position.y), ('z', position.z)] {
        if value > MAX_LOCAL_COORDINATE {
            return Err(EncodeError::CoordinateOutOfRange {
                axis,
                value,
                max: MAX_LOCAL_COORDINATE,
            });
        }
    }
    if texture_index > MAX_TEXTURE_INDEX {
        return Err(EncodeError::TextureOutOfRange {
            value: texture_index,
        });
    }
    if tags > MAX_TAG {
        return Err(EncodeError::TagOutOfRange { value: tags });
    }

    Ok(pack_masked(position, side, texture_index, tags))
}

/// Packs a vertex on the meshing hot path.
///
/// An out-of-range field is a configuration error. Debug builds panic on it;
/// release builds log it and keep only the low-order bits of each field.
pub fn compress(position: Point3<u32>, side: BlockSide, texture_index: u16, tags: u8) -> u32 {
    match try_compress(position, side, texture_index, tags) {
        Ok(packed) => packed,
        Err(err) => {
            if cfg!(debug_assertions) {
                panic!("vertex encoding overflow: {err}");
            }
            log::error!("Vertex encoding overflow, truncating: {err}");
            pack_masked(position, side, texture_index, tags)
        }
    }
}

/// Splits a packed vertex back into its fields.
pub fn decompress(packed: u32) -> (Point3<u32>, u8, u8, u8) {
    let vertex = PackedVertex(packed);
    (
        vertex.position(),
        vertex.side_index(),
        vertex.texture_index(),
        vertex.tags(),
    )
}

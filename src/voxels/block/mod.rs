//! # Block Module
//!
//! This module provides the voxel cell type and the boundary through which the
//! mesher learns which texture each face of a block carries.
//!
//! Block naming lives outside this crate: by the time a block reaches the
//! mesher it is already a compact [`Voxel`], and texture lookup goes through
//! whatever [`BlockCatalog`] the caller supplies.

use block_side::BlockSide;

pub mod block_side;

/// The underlying integer type used to represent block kinds in memory.
pub type BlockTypeSize = u16;

/// The block kind reserved for air.
pub const AIR_KIND: BlockTypeSize = 0;

/// Per-side texture indices for a small set of standard block kinds.
///
/// The outer array is indexed by block kind; the inner array holds one texture
/// index per face in [`BlockSide`] order:
/// [West, East, Down, Up, North, South]
pub static STANDARD_TEXTURE_INDICES: [[u16; 6]; 5] = [
    [0, 0, 0, 0, 0, 0], // AIR (never rendered)
    [1, 1, 1, 1, 1, 1], // DIRT
    [2, 2, 1, 3, 2, 2], // GRASS (top: 3, bottom: 1, sides: 2)
    [5, 5, 5, 5, 5, 5], // WOOD (bark on every side)
    [4, 4, 4, 4, 4, 4], // WHITE
];

/// Represents a single voxel block in a chunk.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute keeps the layout at a fixed four bytes so block
/// arrays can be viewed as raw bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Voxel {
    /// Block kind; `0` is air.
    pub kind: BlockTypeSize,
    /// Opaque texture reference, interpreted by the [`BlockCatalog`].
    pub texture_ref: u8,
    /// Free-form per-block state such as health or variant.
    pub auxiliary: u8,
}

impl Voxel {
    /// The air block. Air never contributes geometry.
    pub const AIR: Voxel = Voxel {
        kind: AIR_KIND,
        texture_ref: 0,
        auxiliary: 0,
    };

    /// Creates a new block of the given kind and texture reference.
    pub const fn new(kind: BlockTypeSize, texture_ref: u8) -> Self {
        Voxel {
            kind,
            texture_ref,
            auxiliary: 0,
        }
    }

    /// Returns a copy with the auxiliary state replaced.
    pub const fn with_auxiliary(self, auxiliary: u8) -> Self {
        Voxel { auxiliary, ..self }
    }

    /// Whether this is the air block.
    pub const fn is_air(&self) -> bool {
        self.kind == AIR_KIND
    }
}

/// Resolves the texture index a block shows on a given side.
///
/// Implementations are shared with background mesh jobs, hence `Send + Sync`.
pub trait BlockCatalog: Send + Sync {
    /// Texture index for `side` of `voxel`. Only called for non-air blocks.
    fn texture_index(&self, voxel: &Voxel, side: BlockSide) -> u16;
}

/// A catalog that uses each block's own `texture_ref` on every side.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextureRefCatalog;

impl BlockCatalog for TextureRefCatalog {
    fn texture_index(&self, voxel: &Voxel, _side: BlockSide) -> u16 {
        voxel.texture_ref as u16
    }
}

/// A table of per-side texture indices keyed by block kind.
///
/// Kinds with no entry fall back to the block's `texture_ref`.
#[derive(Clone, Debug, Default)]
pub struct BlockTextureTable {
    entries: Vec<Option<[u16; 6]>>,
}

impl BlockTextureTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table pre-filled from [`STANDARD_TEXTURE_INDICES`].
    pub fn standard() -> Self {
        let mut table = Self::new();
        for (kind, textures) in STANDARD_TEXTURE_INDICES.iter().enumerate().skip(1) {
            table.insert(kind as BlockTypeSize, *textures);
        }
        table
    }

    /// Registers per-side textures for a kind, replacing any previous entry.
    pub fn insert(&mut self, kind: BlockTypeSize, textures: [u16; 6]) {
        let slot = kind as usize;
        if self.entries.len() <= slot {
            self.entries.resize(slot + 1, None);
        }
        self.entries[slot] = Some(textures);
    }

    /// Registers a kind that shows the same texture on every side.
    pub fn with_uniform(mut self, kind: BlockTypeSize, texture: u16) -> Self {
        self.insert(kind, [texture; 6]);
        self
    }
}

impl BlockCatalog for BlockTextureTable {
    fn texture_index(&self, voxel: &Voxel, side: BlockSide) -> u16 {
        match self.entries.get(voxel.kind as usize) {
            Some(Some(textures)) => textures[side as usize],
            _ => voxel.texture_ref as u16,
        }
    }
}

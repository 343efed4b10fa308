//! Mesh buffers for voxel rendering.
//!
//! A [`MeshBuffer`] accumulates packed vertices quad by quad and exposes the
//! result in the form the renderer draws from. Three buffering strategies are
//! available, chosen per buffer:
//!
//! - [`BufferMode::Flat`]: every vertex appended verbatim, six per quad.
//! - [`BufferMode::Indexed`]: unique packed vertices plus a `u32` index buffer.
//! - [`BufferMode::Partial`]: vertices bucketed by [`BlockSide`]; flushing
//!   concatenates the buckets and builds a table of draw ranges for each of
//!   the 26 [`CameraFacing`] keys, so back-facing sides can be skipped.

use std::collections::HashMap;

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use super::camera_facing::{CameraFacing, CAMERA_FACING_COUNT};
use crate::{
    error::MeshBufferError, rendering::vertex::compress,
    voxels::block::block_side::BlockSide,
};

/// Corner order for the two triangles of a quad whose corners run
/// `base, base + u, base + u + v, base + v`.
///
/// Counter-clockwise when seen from the negative end of the face axis.
pub const QUAD_WINDING: [usize; 6] = [0, 2, 1, 0, 3, 2];

/// [`QUAD_WINDING`] reversed, used for the odd (positive-facing) sides.
pub const QUAD_WINDING_REVERSED: [usize; 6] = [0, 1, 2, 0, 2, 3];

/// How a [`MeshBuffer`] stores its vertices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferMode {
    /// Plain vertex stream, no deduplication.
    Flat,
    /// Deduplicated vertices plus an index buffer.
    Indexed,
    /// Vertex stream grouped by side, with per-facing draw ranges.
    #[default]
    Partial,
}

/// A contiguous run of vertices in the vertex stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DrawRange {
    /// First vertex of the run
    pub start: u32,
    /// Number of vertices in the run
    pub count: u32,
}

impl DrawRange {
    /// One past the last vertex of the run.
    pub fn end(&self) -> u32 {
        self.start + self.count
    }
}

/// Packed vertices for one chunk mesh.
#[derive(Clone, Debug)]
pub struct MeshBuffer {
    mode: BufferMode,
    /// The drawable stream: all vertices (Flat), unique vertices (Indexed),
    /// or concatenated side buckets once flushed (Partial).
    vertices: Vec<u32>,
    /// Indexed mode only.
    indices: Vec<u32>,
    /// Indexed mode only: packed vertex to its slot in `vertices`.
    vertex_lookup: HashMap<u32, u32>,
    /// Partial mode only: per-side vertices not yet flushed.
    side_buckets: [Vec<u32>; 6],
    /// Partial mode only: where each side's bucket landed in `vertices`.
    side_ranges: [DrawRange; 6],
    /// Partial mode only: merged ranges for each camera facing.
    direction_table: [Vec<DrawRange>; CAMERA_FACING_COUNT],
    flushed: bool,
    quad_count: usize,
}

impl MeshBuffer {
    /// Creates an empty buffer using the given strategy.
    pub fn new(mode: BufferMode) -> Self {
        MeshBuffer {
            mode,
            vertices: Vec::new(),
            indices: Vec::new(),
            vertex_lookup: HashMap::new(),
            side_buckets: Default::default(),
            side_ranges: [DrawRange::default(); 6],
            direction_table: Default::default(),
            flushed: false,
            quad_count: 0,
        }
    }

    /// The buffering strategy of this buffer.
    pub fn mode(&self) -> BufferMode {
        self.mode
    }

    /// Encodes a quad's four corners and appends its two triangles.
    ///
    /// Corners are expected in `base, base + u, base + u + v, base + v`
    /// order. Odd sides are wound in reverse so every triangle is front-facing
    /// under one cull convention.
    pub fn append_quad(
        &mut self,
        corners: [Point3<u32>; 4],
        side: BlockSide,
        texture_index: u16,
        corner_tags: [u8; 4],
    ) {
        let packed: [u32; 4] = std::array::from_fn(|corner| {
            compress(corners[corner], side, texture_index, corner_tags[corner])
        });
        let winding = if side.is_positive() {
            QUAD_WINDING_REVERSED
        } else {
            QUAD_WINDING
        };

        match self.mode {
            BufferMode::Flat => {
                self.vertices.extend(winding.iter().map(|corner| packed[*corner]));
            }
            BufferMode::Indexed => {
                let slots: [u32; 4] = std::array::from_fn(|corner| self.vertex_slot(packed[corner]));
                self.indices.extend(winding.iter().map(|corner| slots[*corner]));
            }
            BufferMode::Partial => {
                self.reopen_buckets();
                self.side_buckets[side as usize].extend(winding.iter().map(|corner| packed[*corner]));
            }
        }

        self.quad_count += 1;
    }

    fn vertex_slot(&mut self, packed: u32) -> u32 {
        let next = self.vertices.len() as u32;
        let vertices = &mut self.vertices;
        *self.vertex_lookup.entry(packed).or_insert_with(|| {
            vertices.push(packed);
            next
        })
    }

    /// Finalises the drawable stream.
    ///
    /// For Partial buffers this concatenates the side buckets in
    /// [`BlockSide`] order and rebuilds the per-facing draw table. Flat and
    /// Indexed buffers are always drawable; flushing them is a no-op.
    pub fn flush(&mut self) {
        if self.mode != BufferMode::Partial || self.flushed {
            self.flushed = true;
            return;
        }

        self.vertices.clear();
        for side in BlockSide::all() {
            let bucket = std::mem::take(&mut self.side_buckets[side as usize]);
            self.side_ranges[side as usize] = DrawRange {
                start: self.vertices.len() as u32,
                count: bucket.len() as u32,
            };
            self.vertices.extend(bucket);
        }

        for facing in CameraFacing::all() {
            self.direction_table[facing.table_index()] = self.merged_ranges(&facing.visible_sides());
        }

        self.flushed = true;
    }

    /// Splits a flushed Partial stream back into its buckets so more quads
    /// can be added.
    fn reopen_buckets(&mut self) {
        if !self.flushed {
            return;
        }
        for side in BlockSide::all() {
            let range = self.side_ranges[side as usize];
            self.side_buckets[side as usize] =
                self.vertices[range.start as usize..range.end() as usize].to_vec();
            self.side_ranges[side as usize] = DrawRange::default();
        }
        self.vertices.clear();
        for ranges in self.direction_table.iter_mut() {
            ranges.clear();
        }
        self.flushed = false;
    }

    /// Union of the side ranges for `sides`, with touching ranges joined and
    /// empty ones dropped.
    fn merged_ranges(&self, sides: &[BlockSide]) -> Vec<DrawRange> {
        let mut ranges: Vec<DrawRange> = Vec::with_capacity(sides.len());
        for side in sides {
            let range = self.side_ranges[*side as usize];
            if range.count == 0 {
                continue;
            }
            match ranges.last_mut() {
                Some(last) if last.end() == range.start => last.count += range.count,
                _ => ranges.push(range),
            }
        }
        ranges
    }

    /// Vertices of one side.
    ///
    /// Only Partial buffers group by side; other modes return an empty slice.
    pub fn side_vertices(&self, side: BlockSide) -> &[u32] {
        if self.mode != BufferMode::Partial {
            return &[];
        }
        if self.flushed {
            let range = self.side_ranges[side as usize];
            &self.vertices[range.start as usize..range.end() as usize]
        } else {
            &self.side_buckets[side as usize]
        }
    }

    /// Concatenates another buffer onto this one.
    ///
    /// Both buffers must use the same strategy, and that strategy must not be
    /// Indexed. A flushed Partial buffer stays flushed.
    pub fn merge_buffer(&mut self, other: &MeshBuffer) -> Result<(), MeshBufferError> {
        if self.mode != other.mode {
            return Err(MeshBufferError::ModeMismatch {
                ours: self.mode,
                theirs: other.mode,
            });
        }

        match self.mode {
            BufferMode::Indexed => return Err(MeshBufferError::IndexedMerge),
            BufferMode::Flat => self.vertices.extend_from_slice(&other.vertices),
            BufferMode::Partial => {
                let was_flushed = self.flushed;
                self.reopen_buckets();
                for side in BlockSide::all() {
                    self.side_buckets[side as usize].extend_from_slice(other.side_vertices(side));
                }
                if was_flushed {
                    self.flush();
                }
            }
        }

        self.quad_count += other.quad_count;
        Ok(())
    }

    /// The drawable vertex stream.
    ///
    /// For Partial buffers this is empty until [`MeshBuffer::flush`] is called.
    pub fn vertices(&self) -> &[u32] {
        &self.vertices
    }

    /// The index stream, for Indexed buffers.
    pub fn indices(&self) -> Option<&[u32]> {
        (self.mode == BufferMode::Indexed).then_some(self.indices.as_slice())
    }

    /// The vertex stream as raw bytes, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The index stream as raw bytes; empty unless Indexed.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Number of vertices a full draw submits.
    ///
    /// This is the index count for Indexed buffers and the stream length
    /// otherwise (including unflushed Partial buckets).
    pub fn vertex_count(&self) -> usize {
        match self.mode {
            BufferMode::Indexed => self.indices.len(),
            BufferMode::Flat => self.vertices.len(),
            BufferMode::Partial if self.flushed => self.vertices.len(),
            BufferMode::Partial => self.side_buckets.iter().map(Vec::len).sum(),
        }
    }

    /// Number of triangles a full draw submits.
    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    /// Number of quads appended so far.
    pub fn quad_count(&self) -> usize {
        self.quad_count
    }

    /// Whether the buffer holds no geometry.
    pub fn is_empty(&self) -> bool {
        self.quad_count == 0
    }

    /// Where a side's vertices sit in a flushed Partial stream.
    pub fn side_range(&self, side: BlockSide) -> DrawRange {
        self.side_ranges[side as usize]
    }

    /// The ranges to draw for a camera looking along `facing`.
    ///
    /// Only a flushed Partial buffer has ranges; they cover the sides that can
    /// face the camera. Other buffers return nothing and should be drawn whole
    /// with [`MeshBuffer::full_range`].
    pub fn draw_ranges(&self, facing: CameraFacing) -> &[DrawRange] {
        match self.mode {
            BufferMode::Partial if self.flushed => &self.direction_table[facing.table_index()],
            _ => &[],
        }
    }

    /// A single range covering the whole stream.
    pub fn full_range(&self) -> DrawRange {
        DrawRange {
            start: 0,
            count: self.vertex_count() as u32,
        }
    }
}

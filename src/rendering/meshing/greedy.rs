//! Greedy meshing implementation for voxel rendering.
//!
//! This module implements the greedy meshing algorithm which combines adjacent coplanar
//! faces with the same texture into larger quads, significantly reducing the number of
//! vertices and draw calls needed to render a voxel world.
//!
//! For each axis `d` the chunk is cut into slices perpendicular to `d`. Every slice
//! produces a 2D mask of [`VoxelFace`]s on the plane between two block layers, and
//! the mask is covered first-fit with rectangles of merge-equal faces.

use cgmath::Point3;
use web_time::Instant;

use super::{
    face::{FaceClassifier, VoxelFace},
    mesh_buffer::{BufferMode, MeshBuffer},
};
use crate::voxels::{
    block::{block_side::BlockSide, BlockCatalog},
    chunk::Neighborhood,
    coords::ChunkDimensions,
};

/// Per-corner tag bits, in quad corner order: bit 0 is set on the far-`u`
/// corners and bit 1 on the far-`v` corners.
pub const CORNER_TAGS: [u8; 4] = [0b00, 0b01, 0b11, 0b10];

/// A greedy mesher with a reusable slice mask.
///
/// The mask is sized once to the largest slice of the chunk and only cleared
/// between slices, so meshing many chunks of the same size never reallocates.
pub struct GreedyMesher {
    dimensions: ChunkDimensions,
    mask: Vec<Option<VoxelFace>>,
}

impl GreedyMesher {
    /// Creates a mesher for chunks of the given size.
    pub fn new(dimensions: ChunkDimensions) -> Self {
        GreedyMesher {
            dimensions,
            mask: Vec::with_capacity(dimensions.max_slice_area()),
        }
    }

    /// The chunk size the mask is currently sized for.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// Meshes the center chunk of `neighborhood` into `buffer`.
    ///
    /// Quads are appended; the buffer is not flushed. Output is a pure
    /// function of the block data, so identical input always gives an
    /// identical vertex stream. Returns the number of quads emitted.
    pub fn mesh(
        &mut self,
        neighborhood: &Neighborhood,
        catalog: &dyn BlockCatalog,
        buffer: &mut MeshBuffer,
    ) -> usize {
        let start_time = Instant::now();

        let dimensions = neighborhood.dimensions();
        if dimensions != self.dimensions {
            log::debug!(
                "Resizing mesher arena from {:?} to {:?}",
                self.dimensions,
                dimensions
            );
            self.dimensions = dimensions;
            self.mask = Vec::with_capacity(dimensions.max_slice_area());
        }

        let classifier = FaceClassifier::new(neighborhood, catalog);
        let sizes = dimensions.axis_sizes().map(|size| size as i32);
        let mut quads = 0;

        for back_face in [false, true] {
            for d in 0..3 {
                let u = (d + 1) % 3;
                let v = (d + 2) % 3;
                let side = BlockSide::from_axis(d, !back_face);
                let (u_size, v_size) = (sizes[u], sizes[v]);

                let mut x = [0i32; 3];
                let mut q = [0i32; 3];
                q[d] = 1;

                x[d] = -1;
                while x[d] < sizes[d] {
                    self.build_mask(&classifier, d, u, v, &mut x, q, sizes, back_face);

                    // The plane sits between layer x[d] and x[d] + 1.
                    x[d] += 1;
                    quads += self.sweep_mask(x, d, u, v, u_size, v_size, side, buffer);
                }
            }
        }

        log::trace!(
            "Greedy meshed {} quads in {:?}",
            quads,
            start_time.elapsed()
        );

        quads
    }

    /// Fills the mask for the plane between layer `x[d]` and `x[d] + 1`, in
    /// `v`-outer, `u`-inner order.
    #[allow(clippy::too_many_arguments)]
    fn build_mask(
        &mut self,
        classifier: &FaceClassifier,
        d: usize,
        u: usize,
        v: usize,
        x: &mut [i32; 3],
        q: [i32; 3],
        sizes: [i32; 3],
        back_face: bool,
    ) {
        let near_side = BlockSide::from_axis(d, true);
        let far_side = BlockSide::from_axis(d, false);

        self.mask.clear();
        x[v] = 0;
        while x[v] < sizes[v] {
            x[u] = 0;
            while x[u] < sizes[u] {
                let near = (x[d] >= 0).then(|| classifier.classify(x[0], x[1], x[2], near_side));
                let far = (x[d] < sizes[d] - 1)
                    .then(|| classifier.classify(x[0] + q[0], x[1] + q[1], x[2] + q[2], far_side));

                let cell = match (near, far) {
                    (Some(near), Some(far)) if near == far => None,
                    _ if back_face => far,
                    _ => near,
                };
                self.mask.push(cell);
                x[u] += 1;
            }
            x[v] += 1;
        }
    }

    /// Covers the current mask with rectangles and emits the visible ones.
    ///
    /// `x[d]` must already hold the plane coordinate.
    #[allow(clippy::too_many_arguments)]
    fn sweep_mask(
        &mut self,
        mut x: [i32; 3],
        d: usize,
        u: usize,
        v: usize,
        u_size: i32,
        v_size: i32,
        side: BlockSide,
        buffer: &mut MeshBuffer,
    ) -> usize {
        debug_assert_eq!(side.axis(), d);
        let width = u_size as usize;
        let mut quads = 0;
        let mut n = 0;

        for j in 0..v_size as usize {
            let mut i = 0;
            while i < width {
                let Some(seed) = self.mask[n] else {
                    i += 1;
                    n += 1;
                    continue;
                };

                let mut w = 1;
                while i + w < width && self.mask[n + w] == Some(seed) {
                    w += 1;
                }

                let mut h = 1;
                'rows: while j + h < v_size as usize {
                    for k in 0..w {
                        if self.mask[n + k + h * width] != Some(seed) {
                            break 'rows;
                        }
                    }
                    h += 1;
                }

                if !seed.invisible {
                    x[u] = i as i32;
                    x[v] = j as i32;
                    let mut du = [0u32; 3];
                    let mut dv = [0u32; 3];
                    du[u] = w as u32;
                    dv[v] = h as u32;

                    // x[d] runs from 0 to the axis size here, so the corner is never negative.
                    let base = Point3::new(x[0] as u32, x[1] as u32, x[2] as u32);
                    let corners = [
                        base,
                        Point3::new(base.x + du[0], base.y + du[1], base.z + du[2]),
                        Point3::new(
                            base.x + du[0] + dv[0],
                            base.y + du[1] + dv[1],
                            base.z + du[2] + dv[2],
                        ),
                        Point3::new(base.x + dv[0], base.y + dv[1], base.z + dv[2]),
                    ];
                    buffer.append_quad(corners, side, seed.texture_index, CORNER_TAGS);
                    quads += 1;
                }

                for l in 0..h {
                    for k in 0..w {
                        self.mask[n + k + l * width] = None;
                    }
                }

                i += w;
                n += w;
            }
        }

        quads
    }
}

/// Meshes one chunk into a fresh, flushed buffer.
///
/// Convenience wrapper around a throwaway [`GreedyMesher`]; long-lived callers
/// should keep a mesher around instead.
pub fn generate_mesh(
    neighborhood: &Neighborhood,
    catalog: &dyn BlockCatalog,
    mode: BufferMode,
) -> MeshBuffer {
    let mut mesher = GreedyMesher::new(neighborhood.dimensions());
    let mut buffer = MeshBuffer::new(mode);
    mesher.mesh(neighborhood, catalog, &mut buffer);
    buffer.flush();
    buffer
}

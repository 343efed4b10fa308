use crate::voxels::{
    block::{block_side::BlockSide, BlockCatalog},
    chunk::Neighborhood,
};

/// One cell of the mesher's slice mask: the face a block shows on one side.
///
/// Equality is merge-equality: two invisible faces are always equal, and two
/// visible faces are equal when they share a side and a texture.
#[derive(Clone, Copy, Debug)]
pub struct VoxelFace {
    /// No geometry is emitted for this face.
    pub invisible: bool,
    /// The direction the face points.
    pub side: BlockSide,
    /// Texture shown on the face.
    pub texture_index: u16,
}

impl VoxelFace {
    /// A face that emits nothing.
    pub fn hidden(side: BlockSide) -> Self {
        VoxelFace {
            invisible: true,
            side,
            texture_index: 0,
        }
    }
}

impl PartialEq for VoxelFace {
    fn eq(&self, other: &Self) -> bool {
        match (self.invisible, other.invisible) {
            (true, true) => true,
            (false, false) => self.side == other.side && self.texture_index == other.texture_index,
            _ => false,
        }
    }
}

impl Eq for VoxelFace {}

/// Decides whether a block face is visible, looking across chunk seams when
/// the face sits on the chunk boundary.
pub struct FaceClassifier<'a> {
    neighborhood: &'a Neighborhood,
    catalog: &'a dyn BlockCatalog,
}

impl<'a> FaceClassifier<'a> {
    /// Creates a classifier over one chunk and its neighbors.
    pub fn new(neighborhood: &'a Neighborhood, catalog: &'a dyn BlockCatalog) -> Self {
        FaceClassifier {
            neighborhood,
            catalog,
        }
    }

    /// Classifies the face of the block at local `(x, y, z)` on `side`.
    ///
    /// Air is always invisible. A solid face is hidden when the block it
    /// touches is solid and lies in the same chunk or across a horizontal
    /// seam. Across a vertical seam the face is always kept.
    pub fn classify(&self, x: i32, y: i32, z: i32, side: BlockSide) -> VoxelFace {
        let center = self.neighborhood.center();
        let voxel = center.get_local_block(x, y, z);
        if voxel.is_air() {
            return VoxelFace::hidden(side);
        }

        let offset = side.offset();
        let (nx, ny, nz) = (x + offset.x, y + offset.y, z + offset.z);

        let occluded = if center.dimensions().contains(nx, ny, nz) {
            center.is_block_solid(nx, ny, nz)
        } else {
            match self.neighborhood.neighbor(side) {
                Some(neighbor) => {
                    let mut mirrored = [nx, ny, nz];
                    let axis = side.axis();
                    mirrored[axis] = if side.is_positive() {
                        0
                    } else {
                        neighbor.dimensions().axis_sizes()[axis] as i32 - 1
                    };
                    let solid = neighbor.is_block_solid(mirrored[0], mirrored[1], mirrored[2]);
                    solid && !side.is_vertical()
                }
                None => false,
            }
        };

        VoxelFace {
            invisible: occluded,
            side,
            texture_index: self.catalog.texture_index(&voxel, side),
        }
    }
}

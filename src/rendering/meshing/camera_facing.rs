//! Discretised camera directions for selective multi-range draws.
//!
//! A [`CameraFacing`] is one of the 26 non-zero vectors with components in
//! `{-1, 0, 1}`: 6 along a single axis, 12 along two axes and 8 toward the
//! corners of the direction cube. Each one selects the block sides that can
//! face a camera looking that way.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use cgmath::{InnerSpace, Rad, Vector3};

use crate::voxels::block::block_side::BlockSide;

/// Number of distinct camera-facing keys.
pub const CAMERA_FACING_COUNT: usize = 26;

/// A camera view direction snapped to the 26-direction grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CameraFacing {
    x: i8,
    y: i8,
    z: i8,
}

impl CameraFacing {
    /// Builds a facing from its components.
    ///
    /// Returns `None` unless every component is in `{-1, 0, 1}` and at least
    /// one is non-zero.
    pub fn new(x: i8, y: i8, z: i8) -> Option<Self> {
        let in_range = |c: i8| (-1..=1).contains(&c);
        if !(in_range(x) && in_range(y) && in_range(z)) || (x, y, z) == (0, 0, 0) {
            return None;
        }
        Some(CameraFacing { x, y, z })
    }

    /// All 26 facings: single-axis first, then two-axis, then corners.
    pub fn all() -> [CameraFacing; CAMERA_FACING_COUNT] {
        let mut facings = Vec::with_capacity(CAMERA_FACING_COUNT);
        for axes in 1..=3 {
            for z in -1..=1i8 {
                for y in -1..=1i8 {
                    for x in -1..=1i8 {
                        let non_zero = [x, y, z].iter().filter(|c| **c != 0).count();
                        if non_zero == axes {
                            facings.push(CameraFacing { x, y, z });
                        }
                    }
                }
            }
        }
        facings
            .try_into()
            .unwrap_or_else(|_| unreachable!("exactly 26 non-zero direction vectors"))
    }

    /// Snaps a view vector to a facing for a camera with a 90° field of view.
    ///
    /// See [`CameraFacing::from_view_vector_with_half_fov`].
    pub fn from_view_vector(view: Vector3<f32>) -> Option<Self> {
        Self::from_view_vector_with_half_fov(view, Rad(FRAC_PI_4))
    }

    /// Snaps a view vector to the facing whose culled sides no ray of the
    /// view frustum can see.
    ///
    /// A side is only culled once the view direction is within
    /// `90° - half_fov` of that side's normal, so every ray of a frustum
    /// `half_fov` wide still looks at it from behind. Returns `None` when no
    /// side can be culled (the view is not steep enough along any axis) or
    /// for a zero or non-finite vector; draw the full range then.
    pub fn from_view_vector_with_half_fov(view: Vector3<f32>, half_fov: Rad<f32>) -> Option<Self> {
        let magnitude = view.magnitude();
        if !magnitude.is_finite() || magnitude == 0.0 {
            return None;
        }
        let view = view / magnitude;
        let cutoff = half_fov.0.clamp(0.0, FRAC_PI_2).sin();
        let snap = |c: f32| {
            if c > cutoff {
                1
            } else if c < -cutoff {
                -1
            } else {
                0
            }
        };
        Self::new(snap(view.x), snap(view.y), snap(view.z))
    }

    /// The facing as an integer vector.
    pub fn as_vector(self) -> Vector3<i32> {
        Vector3::new(self.x as i32, self.y as i32, self.z as i32)
    }

    /// Position of this facing in a direction table of [`CAMERA_FACING_COUNT`] entries.
    pub fn table_index(self) -> usize {
        let cell = (self.x + 1) as usize + (self.y + 1) as usize * 3 + (self.z + 1) as usize * 9;
        // cell 13 is the zero vector, which is never a facing
        if cell > 13 {
            cell - 1
        } else {
            cell
        }
    }

    /// Block sides that can face a camera looking this way, in [`BlockSide`] order.
    ///
    /// Looking toward +x, only faces pointing toward -x can be front-facing;
    /// along an axis the camera is not looking down, both sides can be.
    pub fn visible_sides(self) -> Vec<BlockSide> {
        let mut sides = Vec::with_capacity(6);
        for (axis, component) in [self.x, self.y, self.z].into_iter().enumerate() {
            if component <= 0 {
                sides.push(BlockSide::from_axis(axis, true));
            }
            if component >= 0 {
                sides.push(BlockSide::from_axis(axis, false));
            }
        }
        sides.sort_by_key(|side| *side as usize);
        sides
    }
}

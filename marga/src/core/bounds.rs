//! Axis-aligned bounding box used for occupancy queries.
//!
//! [`Aabb`] describes the volume handed to the occupancy oracle: the
//! 1×2×1 agent volume at a cell during search, and the box spanning a
//! chunk's first and last voxel centers during execution.
//!
//! Intersection with a voxel is strict overlap on every axis. A flat box
//! (zero extent on an axis) still hits the voxels it passes through, while
//! a box that merely touches a voxel face does not.

use super::point::{GridCoord, Vec3};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    /// Minimum corner (smallest x, y, z).
    pub min: Vec3,
    /// Maximum corner (largest x, y, z).
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from any two opposite corners.
    ///
    /// Corners are normalised so that `min <= max` on every axis.
    #[inline]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Box anchored at `corner` with the given extents.
    #[inline]
    pub fn from_corner(corner: Vec3, width: f64, height: f64) -> Self {
        Self::new(corner, corner + Vec3::new(width, height, width))
    }

    /// Inclusive range of voxel indices this box can overlap on each axis.
    ///
    /// Returns `None` when the box cannot overlap any voxel (a flat box lying
    /// exactly on a voxel boundary).
    pub fn voxel_span(&self) -> Option<(GridCoord, GridCoord)> {
        let lo = GridCoord::new(
            self.min.x.floor() as i32,
            self.min.y.floor() as i32,
            self.min.z.floor() as i32,
        );
        let hi = GridCoord::new(
            self.max.x.ceil() as i32 - 1,
            self.max.y.ceil() as i32 - 1,
            self.max.z.ceil() as i32 - 1,
        );

        if hi.x < lo.x || hi.y < lo.y || hi.z < lo.z {
            return None;
        }
        Some((lo, hi))
    }

    /// Number of voxels covered by [`Aabb::voxel_span`].
    pub fn voxel_count(&self) -> u64 {
        match self.voxel_span() {
            Some((lo, hi)) => {
                let extent = |a: i32, b: i32| (b as i64 - a as i64 + 1) as u64;
                extent(lo.x, hi.x)
                    .saturating_mul(extent(lo.y, hi.y))
                    .saturating_mul(extent(lo.z, hi.z))
            }
            None => 0,
        }
    }
}

//! Occupancy oracle and agent footprint.
//!
//! The planner and executor never look at world geometry directly; they ask
//! an [`OccupancyOracle`] whether an axis-aligned volume is obstructed.
//! [`VoxelGrid`] is a set-backed implementation for simulations and tests.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Aabb, GridCoord};

/// Answers "is anything solid inside this box?".
pub trait OccupancyOracle: Send + Sync {
    /// Returns true if any solid geometry strictly overlaps `area`.
    fn is_obstructed(&self, area: &Aabb) -> bool;
}

impl<T: OccupancyOracle + ?Sized> OccupancyOracle for Arc<T> {
    fn is_obstructed(&self, area: &Aabb) -> bool {
        (**self).is_obstructed(area)
    }
}

impl<T: OccupancyOracle + ?Sized> OccupancyOracle for &T {
    fn is_obstructed(&self, area: &Aabb) -> bool {
        (**self).is_obstructed(area)
    }
}

/// Volume the agent occupies when standing in a cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentVolume {
    /// Extent along x and z.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
}

impl Default for AgentVolume {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 2.0,
        }
    }
}

impl AgentVolume {
    /// Create a new agent volume.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The box the agent occupies when anchored at `cell`'s lower corner.
    #[inline]
    pub fn at(&self, cell: GridCoord) -> Aabb {
        Aabb::from_corner(cell.corner(), self.width, self.height)
    }

    /// Can the agent stand in `cell`?
    #[inline]
    pub fn is_passable<O: OccupancyOracle + ?Sized>(&self, oracle: &O, cell: GridCoord) -> bool {
        !oracle.is_obstructed(&self.at(cell))
    }
}

/// Sparse voxel world: every listed cell is a solid unit cube.
#[derive(Clone, Debug, Default)]
pub struct VoxelGrid {
    solid: HashSet<GridCoord>,
}

impl VoxelGrid {
    /// Create an empty (fully open) grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of solid voxels.
    pub fn solid_count(&self) -> usize {
        self.solid.len()
    }

    /// Is this voxel solid?
    #[inline]
    pub fn is_solid(&self, cell: GridCoord) -> bool {
        self.solid.contains(&cell)
    }

    /// Mark one voxel solid.
    pub fn set_solid(&mut self, cell: GridCoord) {
        self.solid.insert(cell);
    }

    /// Clear one voxel.
    pub fn clear(&mut self, cell: GridCoord) {
        self.solid.remove(&cell);
    }

    /// Fill the inclusive box `a..=b` with solid voxels.
    pub fn fill(&mut self, a: GridCoord, b: GridCoord) {
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    self.solid.insert(GridCoord::new(x, y, z));
                }
            }
        }
    }
}

impl FromIterator<GridCoord> for VoxelGrid {
    fn from_iter<I: IntoIterator<Item = GridCoord>>(iter: I) -> Self {
        Self {
            solid: iter.into_iter().collect(),
        }
    }
}

impl OccupancyOracle for VoxelGrid {
    fn is_obstructed(&self, area: &Aabb) -> bool {
        let Some((lo, hi)) = area.voxel_span() else {
            return false;
        };

        // Large boxes: scan the solid set instead of every covered cell
        if area.voxel_count() > self.solid.len() as u64 {
            return self.solid.iter().any(|cell| {
                (lo.x..=hi.x).contains(&cell.x)
                    && (lo.y..=hi.y).contains(&cell.y)
                    && (lo.z..=hi.z).contains(&cell.z)
            });
        }

        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    if self.solid.contains(&GridCoord::new(x, y, z)) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Vec3;

    #[test]
    fn test_agent_volume_covers_two_cells() {
        let mut grid = VoxelGrid::new();
        let volume = AgentVolume::default();

        grid.set_solid(GridCoord::new(0, 1, 0));
        assert!(!volume.is_passable(&grid, GridCoord::new(0, 0, 0)));
        assert!(!volume.is_passable(&grid, GridCoord::new(0, 1, 0)));
        assert!(volume.is_passable(&grid, GridCoord::new(0, 2, 0)));
        assert!(volume.is_passable(&grid, GridCoord::new(0, -1, 0)));
        assert!(volume.is_passable(&grid, GridCoord::new(1, 0, 0)));
    }

    #[test]
    fn test_fill_and_box_query() {
        let mut grid = VoxelGrid::new();
        grid.fill(GridCoord::new(2, 0, -3), GridCoord::new(2, 1, 3));
        assert_eq!(grid.solid_count(), 14);

        let through = Aabb::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(4.5, 0.5, 0.5));
        assert!(grid.is_obstructed(&through));

        let above = Aabb::new(Vec3::new(0.5, 2.5, 0.5), Vec3::new(4.5, 2.5, 0.5));
        assert!(!grid.is_obstructed(&above));
    }

    #[test]
    fn test_large_box_scans_solid_set() {
        let grid: VoxelGrid = [GridCoord::new(50, 50, 50)].into_iter().collect();
        let huge = Aabb::new(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(100.0, 100.0, 100.0));
        assert!(grid.is_obstructed(&huge));

        let miss = Aabb::new(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(50.0, 100.0, 100.0));
        assert!(!grid.is_obstructed(&miss));
    }
}

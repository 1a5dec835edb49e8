//! Bounded A* over the voxel grid.
//!
//! The search space is deliberately small: a cost ceiling and an iteration
//! ceiling keep each search to a few hundred expansions, and failure is an
//! ordinary outcome (an empty route), not an error.
//!
//! ## Neighbours
//!
//! - ±1 on x and z
//! - −reach..=−1 and +1..=+reach on y (default reach 9), so one step can
//!   cover a tall vertical gap
//! - with `allow_diagonal`, the four (±1, 0, ±1) corners, admitted only when
//!   the corner and both framing cells are passable
//!
//! ```rust,ignore
//! use marga::pathfinding::{Planner, PlannerConfig};
//!
//! let planner = Planner::new(&grid, PlannerConfig::with_max_cost(100));
//! let result = planner.search(start, goal);
//! if result.is_success() {
//!     println!("{} cells, cost {}", result.route.len(), result.cost);
//! }
//! ```

mod frontier;
mod planner;
mod types;

pub use planner::Planner;
pub use types::{CostModel, PathResult, PlannerConfig, SearchFailure, SearchNode};

use crate::core::GridCoord;
use crate::oracle::OccupancyOracle;

/// Default iteration ceiling for [`find_path`].
pub const DEFAULT_MAX_ITERATIONS: usize = 500;

/// Route from `start` towards `goal` with default settings and the given
/// ceilings. Empty when no route exists within them.
pub fn find_path<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    start: GridCoord,
    goal: GridCoord,
    max_cost: i64,
    max_iterations: usize,
) -> Vec<GridCoord> {
    let config = PlannerConfig::with_max_cost(max_cost).with_max_iterations(max_iterations);
    Planner::new(oracle, config).search(start, goal).route
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::VoxelGrid;

    #[test]
    fn test_find_path_open_grid() {
        let grid = VoxelGrid::new();
        let route = find_path(
            &grid,
            GridCoord::ZERO,
            GridCoord::new(5, 0, 0),
            100,
            DEFAULT_MAX_ITERATIONS,
        );

        assert_eq!(
            route,
            vec![
                GridCoord::new(1, 0, 0),
                GridCoord::new(2, 0, 0),
                GridCoord::new(3, 0, 0),
                GridCoord::new(4, 0, 0),
            ]
        );
    }

    #[test]
    fn test_find_path_empty_on_failure() {
        let grid = VoxelGrid::new();
        let route = find_path(&grid, GridCoord::ZERO, GridCoord::new(50, 0, 0), 10, 500);
        assert!(route.is_empty());
    }
}

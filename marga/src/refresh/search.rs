//! Greedy nearest-first target search.
//!
//! Candidates within range are tried in order of distance; the first one
//! the planner reaches wins. This is not globally optimal: a nearer target
//! behind a wall loses to a farther one that is in the open only if the
//! nearer search fails outright.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::core::Vec3;
use crate::oracle::OccupancyOracle;
use crate::pathfinding::{Planner, PlannerConfig};
use crate::plan::{ActivePlan, Candidate};

/// Supplies destination candidates near a point.
pub trait TargetSupplier: Send + Sync {
    /// Candidates whose squared distance from `origin` is at most `max_distance_sq`.
    ///
    /// Implementations may over-supply; the caller filters again.
    fn candidates(&self, origin: Vec3, max_distance_sq: f64) -> Vec<Candidate>;
}

impl<T: TargetSupplier + ?Sized> TargetSupplier for Arc<T> {
    fn candidates(&self, origin: Vec3, max_distance_sq: f64) -> Vec<Candidate> {
        (**self).candidates(origin, max_distance_sq)
    }
}

/// Fixed candidate list.
impl TargetSupplier for Vec<Candidate> {
    fn candidates(&self, origin: Vec3, max_distance_sq: f64) -> Vec<Candidate> {
        self.iter()
            .filter(|c| c.position.distance_squared(&origin) <= max_distance_sq)
            .copied()
            .collect()
    }
}

/// Result of one refresh search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchOutcome {
    /// Plan for the first reachable candidate, if any
    pub plan: Option<ActivePlan>,
    /// Candidates in range
    pub candidates: usize,
    /// Planner calls made
    pub attempts: usize,
    /// Nodes expanded across all attempts
    pub nodes_expanded: usize,
}

/// Everything a refresh search needs, shareable with a worker thread.
pub struct PlanSearch {
    oracle: Arc<dyn OccupancyOracle>,
    supplier: Arc<dyn TargetSupplier>,
    planner: PlannerConfig,
    max_candidate_distance: f64,
}

impl PlanSearch {
    /// Create a search over `oracle` and `supplier`.
    pub fn new(
        oracle: Arc<dyn OccupancyOracle>,
        supplier: Arc<dyn TargetSupplier>,
        planner: PlannerConfig,
        max_candidate_distance: f64,
    ) -> Self {
        Self {
            oracle,
            supplier,
            planner,
            max_candidate_distance,
        }
    }

    /// Planner configuration
    pub fn planner_config(&self) -> &PlannerConfig {
        &self.planner
    }

    /// Find a plan from `origin` to the nearest reachable candidate.
    pub fn run(&self, origin: Vec3) -> SearchOutcome {
        let max_distance_sq = self.max_candidate_distance * self.max_candidate_distance;

        let mut ranked: Vec<(f64, Candidate)> = self
            .supplier
            .candidates(origin, max_distance_sq)
            .into_iter()
            .map(|c| (c.position.distance_squared(&origin), c))
            .filter(|(d, _)| *d <= max_distance_sq)
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut outcome = SearchOutcome {
            candidates: ranked.len(),
            ..SearchOutcome::default()
        };

        let planner = Planner::new(self.oracle.as_ref(), self.planner.clone());
        let start = origin.to_grid();

        for (distance_sq, candidate) in ranked {
            let result = planner.search(start, candidate.cell());
            outcome.attempts += 1;
            outcome.nodes_expanded += result.nodes_expanded;

            if result.has_route() {
                trace!(
                    "[Refresh] Target {} at {:.1} reachable in {} cells",
                    candidate.id,
                    distance_sq.sqrt(),
                    result.route.len()
                );
                outcome.plan = Some(ActivePlan::new(candidate, result.route));
                return outcome;
            }
        }

        debug!(
            "[Refresh] No reachable target among {} candidates ({} nodes expanded)",
            outcome.candidates, outcome.nodes_expanded
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridCoord;
    use crate::oracle::VoxelGrid;
    use crate::plan::TargetId;

    fn search(grid: VoxelGrid, candidates: Vec<Candidate>, max_cost: i64) -> PlanSearch {
        PlanSearch::new(
            Arc::new(grid),
            Arc::new(candidates),
            PlannerConfig::with_max_cost(max_cost),
            95.0,
        )
    }

    #[test]
    fn test_nearest_reachable_wins() {
        let candidates = vec![
            Candidate::new(TargetId(1), Vec3::new(8.5, 0.0, 0.5)),
            Candidate::new(TargetId(2), Vec3::new(4.5, 0.0, 0.5)),
        ];
        let outcome = search(VoxelGrid::new(), candidates, 100).run(Vec3::new(0.5, 0.0, 0.5));

        let plan = outcome.plan.expect("plan");
        assert_eq!(plan.target.id, TargetId(2));
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn test_falls_through_to_next_candidate() {
        // Boxed-in near target
        let mut grid = VoxelGrid::new();
        grid.fill(GridCoord::new(2, -12, -2), GridCoord::new(6, 14, 2));
        grid.clear(GridCoord::new(4, 0, 0));
        grid.clear(GridCoord::new(4, 1, 0));

        let candidates = vec![
            Candidate::new(TargetId(1), Vec3::new(4.5, 0.0, 0.5)),
            Candidate::new(TargetId(2), Vec3::new(-5.5, 0.0, 0.5)),
        ];
        let outcome = search(grid, candidates, 250).run(Vec3::new(0.5, 0.0, 0.5));

        assert_eq!(outcome.plan.map(|p| p.target.id), Some(TargetId(2)));
        assert_eq!(outcome.attempts, 2);
    }

    #[test]
    fn test_out_of_range_candidates_ignored() {
        let candidates = vec![Candidate::new(TargetId(9), Vec3::new(200.5, 0.0, 0.5))];
        let outcome = search(VoxelGrid::new(), candidates, 100).run(Vec3::ZERO);

        assert!(outcome.plan.is_none());
        assert_eq!(outcome.candidates, 0);
        assert_eq!(outcome.attempts, 0);
    }
}

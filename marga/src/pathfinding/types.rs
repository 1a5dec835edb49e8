//! Bounded A* types.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::core::GridCoord;
use crate::oracle::AgentVolume;

/// A node in the A* search.
///
/// Identity (equality, hashing) is the position alone. The frontier orders
/// nodes by [`SearchNode::frontier_key`], so a node whose `f` improves must
/// be re-keyed in the frontier rather than mutated in place.
#[derive(Clone, Copy, Debug)]
pub struct SearchNode {
    /// Cell this node stands for
    pub position: GridCoord,
    /// Predecessor on the best known route (None for the start node)
    pub parent: Option<GridCoord>,
    /// Accumulated cost from start
    pub g: i64,
    /// Heuristic estimate to goal
    pub h: i64,
    /// g + h
    pub f: i64,
}

impl SearchNode {
    /// The start node: no parent, zero cost.
    pub fn root(position: GridCoord) -> Self {
        Self {
            position,
            parent: None,
            g: 0,
            h: 0,
            f: 0,
        }
    }

    /// A node reached from `parent` with cost `g` and estimate `h`.
    pub fn reached(position: GridCoord, parent: GridCoord, g: i64, h: i64) -> Self {
        Self {
            position,
            parent: Some(parent),
            g,
            h,
            f: g.saturating_add(h),
        }
    }

    /// Frontier ordering: f ascending, then position ascending.
    #[inline]
    pub fn frontier_key(&self) -> (i64, GridCoord) {
        (self.f, self.position)
    }
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for SearchNode {}

impl Hash for SearchNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.hash(state);
    }
}

/// Cost function shared by step cost and heuristic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostModel {
    /// Squared Euclidean distance, rounded to integer.
    ///
    /// Strongly favours many short steps over few long ones and inflates the
    /// heuristic far from the goal.
    #[default]
    SquaredEuclidean,
    /// Euclidean distance, rounded to integer.
    Euclidean,
}

impl CostModel {
    /// Cost between two cells under this model.
    #[inline]
    pub fn cost(self, a: GridCoord, b: GridCoord) -> i64 {
        let d2 = a.distance_squared(&b);
        match self {
            CostModel::SquaredEuclidean => d2,
            CostModel::Euclidean => (d2 as f64).sqrt().round() as i64,
        }
    }
}

/// Bounded A* configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Neighbours whose accumulated cost would exceed this are skipped.
    #[serde(default = "default_max_cost")]
    pub max_cost: i64,

    /// Maximum number of frontier pops before giving up.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Admit the four (±1, 0, ±1) corner moves.
    #[serde(default)]
    pub allow_diagonal: bool,

    /// Largest single vertical step, in cells, in either direction.
    #[serde(default = "default_vertical_reach")]
    pub vertical_reach: i32,

    /// Search succeeds on the first node strictly closer than this to the goal.
    #[serde(default = "default_goal_tolerance")]
    pub goal_tolerance: f64,

    /// Step cost / heuristic function.
    #[serde(default)]
    pub cost_model: CostModel,

    /// Volume checked for passability at every cell.
    #[serde(default)]
    pub agent: AgentVolume,
}

fn default_max_cost() -> i64 {
    250
}

fn default_max_iterations() -> usize {
    500
}

fn default_vertical_reach() -> i32 {
    9
}

fn default_goal_tolerance() -> f64 {
    2.0
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_cost: default_max_cost(),
            max_iterations: default_max_iterations(),
            allow_diagonal: false,
            vertical_reach: default_vertical_reach(),
            goal_tolerance: default_goal_tolerance(),
            cost_model: CostModel::default(),
            agent: AgentVolume::default(),
        }
    }
}

impl PlannerConfig {
    /// Default configuration with a custom cost ceiling
    pub fn with_max_cost(max_cost: i64) -> Self {
        Self {
            max_cost,
            ..Default::default()
        }
    }

    /// Enable or disable corner moves
    pub fn with_diagonal(mut self, allow: bool) -> Self {
        self.allow_diagonal = allow;
        self
    }

    /// Override the iteration ceiling
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Why a search produced no route
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchFailure {
    /// Every reachable cell within the cost ceiling was expanded
    FrontierExhausted,
    /// The iteration ceiling was hit first
    IterationLimit,
}

/// Result of a bounded A* search
#[derive(Clone, Debug, Default)]
pub struct PathResult {
    /// Route from the cell after start to a cell near the goal.
    ///
    /// Empty on failure, and also on success when the start itself already
    /// lies within the goal tolerance (there is nothing to walk).
    pub route: Vec<GridCoord>,
    /// Accumulated cost of the route
    pub cost: i64,
    /// Frontier pops performed
    pub nodes_expanded: usize,
    /// Neighbours skipped because they would exceed the cost ceiling
    pub cost_pruned: usize,
    /// Distinct cells sent to the occupancy oracle
    pub oracle_queries: usize,
    /// Reason for failure (if any)
    pub failure: Option<SearchFailure>,
}

impl PathResult {
    pub(super) fn found(route: Vec<GridCoord>, cost: i64) -> Self {
        Self {
            route,
            cost,
            ..Default::default()
        }
    }

    pub(super) fn failed(reason: SearchFailure) -> Self {
        Self {
            failure: Some(reason),
            ..Default::default()
        }
    }

    /// Whether the search reached the goal tolerance.
    ///
    /// A success can carry an empty route (start already near the goal);
    /// callers that need cells to walk should use [`PathResult::has_route`].
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Whether there are cells to walk.
    pub fn has_route(&self) -> bool {
        !self.route.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_node_identity_is_position() {
        let p = GridCoord::new(1, 2, 3);
        let a = SearchNode::reached(p, GridCoord::ZERO, 4, 10);
        let b = SearchNode::reached(p, GridCoord::new(1, 1, 3), 1, 10);
        assert_eq!(a, b);
        assert_ne!(a.frontier_key(), b.frontier_key());

        let set: HashSet<SearchNode> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_cost_models() {
        let a = GridCoord::ZERO;
        let b = GridCoord::new(0, 3, 4);
        assert_eq!(CostModel::SquaredEuclidean.cost(a, b), 25);
        assert_eq!(CostModel::Euclidean.cost(a, b), 5);
        assert_eq!(CostModel::Euclidean.cost(a, GridCoord::new(1, 0, 1)), 1);
    }
}

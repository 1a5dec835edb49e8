//! Bounded A* planner implementation.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::core::GridCoord;
use crate::oracle::{AgentVolume, OccupancyOracle};

use super::frontier::Frontier;
use super::types::{PathResult, PlannerConfig, SearchFailure, SearchNode};

/// Corner moves, checked against both framing cells before admission.
const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Memoised passability for the duration of one search.
struct PassabilityCache<'a, O: ?Sized> {
    oracle: &'a O,
    agent: AgentVolume,
    known: HashMap<GridCoord, bool>,
}

impl<'a, O: OccupancyOracle + ?Sized> PassabilityCache<'a, O> {
    fn new(oracle: &'a O, agent: AgentVolume) -> Self {
        Self {
            oracle,
            agent,
            known: HashMap::new(),
        }
    }

    fn is_passable(&mut self, cell: GridCoord) -> bool {
        let (oracle, agent) = (self.oracle, self.agent);
        *self
            .known
            .entry(cell)
            .or_insert_with(|| agent.is_passable(oracle, cell))
    }

    fn queries(&self) -> usize {
        self.known.len()
    }
}

/// Bounded A* pathfinder over a voxel grid
pub struct Planner<'a, O: ?Sized> {
    oracle: &'a O,
    config: PlannerConfig,
}

impl<'a, O: OccupancyOracle + ?Sized> Planner<'a, O> {
    /// Create a new planner
    pub fn new(oracle: &'a O, config: PlannerConfig) -> Self {
        Self { oracle, config }
    }

    /// Create with default configuration
    pub fn with_defaults(oracle: &'a O) -> Self {
        Self::new(oracle, PlannerConfig::default())
    }

    /// Planner configuration
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Search for a route from `start` to a cell near `goal`.
    pub fn search(&self, start: GridCoord, goal: GridCoord) -> PathResult {
        trace!("[AStar] search: start={} goal={}", start, goal);

        if start == goal {
            return PathResult::found(vec![goal], 0);
        }

        let cost_model = self.config.cost_model;
        let mut cache = PassabilityCache::new(self.oracle, self.config.agent);
        let mut nodes: HashMap<GridCoord, SearchNode> = HashMap::new();
        let mut closed: HashSet<GridCoord> = HashSet::new();
        let mut frontier = Frontier::new();

        let root = SearchNode::root(start);
        nodes.insert(start, root);
        frontier.push(start, root.f);

        let mut nodes_expanded = 0;
        let mut cost_pruned = 0;
        let mut neighbors = Vec::with_capacity(26);

        let failure = loop {
            if frontier.is_empty() {
                break SearchFailure::FrontierExhausted;
            }
            if nodes_expanded >= self.config.max_iterations {
                break SearchFailure::IterationLimit;
            }

            let Some(position) = frontier.pop_min() else {
                break SearchFailure::FrontierExhausted;
            };
            nodes_expanded += 1;
            closed.insert(position);
            let current = nodes[&position];

            if position.is_within_distance(&goal, self.config.goal_tolerance) {
                let route = Self::reconstruct_route(&nodes, position);
                trace!(
                    "[AStar] SUCCESS: {} cells, cost={}, nodes_expanded={}",
                    route.len(),
                    current.g,
                    nodes_expanded
                );
                return PathResult {
                    nodes_expanded,
                    cost_pruned,
                    oracle_queries: cache.queries(),
                    ..PathResult::found(route, current.g)
                };
            }

            neighbors.clear();
            self.adjacent(position, &mut cache, &mut neighbors);

            for &neighbor in &neighbors {
                if closed.contains(&neighbor) {
                    continue;
                }

                let tentative_g = current.g.saturating_add(cost_model.cost(position, neighbor));
                if frontier.contains(neighbor)
                    && nodes.get(&neighbor).is_some_and(|n| tentative_g >= n.g)
                {
                    continue;
                }

                if tentative_g > self.config.max_cost {
                    cost_pruned += 1;
                    continue;
                }

                let h = cost_model.cost(neighbor, goal);
                let node = SearchNode::reached(neighbor, position, tentative_g, h);
                nodes.insert(neighbor, node);
                frontier.push(neighbor, node.f);
            }
        };

        debug!(
            "[AStar] FAILED: {:?} after {} expansions ({} pruned by cost, {} still queued)",
            failure,
            nodes_expanded,
            cost_pruned,
            frontier.len()
        );

        PathResult {
            nodes_expanded,
            cost_pruned,
            oracle_queries: cache.queries(),
            ..PathResult::failed(failure)
        }
    }

    /// Passable neighbours of `cell`, in generation order.
    fn adjacent(
        &self,
        cell: GridCoord,
        cache: &mut PassabilityCache<'_, O>,
        out: &mut Vec<GridCoord>,
    ) {
        let reach = self.config.vertical_reach;

        let orthogonal = [cell.offset(-1, 0, 0), cell.offset(1, 0, 0)]
            .into_iter()
            .chain((-reach..=-1).map(|dy| cell.offset(0, dy, 0)))
            .chain((1..=reach).map(|dy| cell.offset(0, dy, 0)))
            .chain([cell.offset(0, 0, -1), cell.offset(0, 0, 1)]);

        for candidate in orthogonal {
            if cache.is_passable(candidate) {
                out.push(candidate);
            }
        }

        if !self.config.allow_diagonal {
            return;
        }

        for (dx, dz) in DIAGONALS {
            let corner = cell.offset(dx, 0, dz);
            if !cache.is_passable(corner) {
                continue;
            }

            // No cutting through solid geometry: both framing cells must be open
            if cache.is_passable(cell.offset(dx, 0, 0)) && cache.is_passable(cell.offset(0, 0, dz))
            {
                out.push(corner);
            }
        }
    }

    /// Walk parent links back to (but excluding) the start.
    fn reconstruct_route(nodes: &HashMap<GridCoord, SearchNode>, end: GridCoord) -> Vec<GridCoord> {
        let mut route = Vec::new();
        let mut current = end;

        while let Some(parent) = nodes.get(&current).and_then(|n| n.parent) {
            route.push(current);
            current = parent;
        }

        route.reverse();
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::VoxelGrid;

    #[test]
    fn test_start_equals_goal() {
        let grid = VoxelGrid::new();
        let planner = Planner::with_defaults(&grid);
        let p = GridCoord::new(3, 4, 5);

        let result = planner.search(p, p);
        assert!(result.is_success());
        assert_eq!(result.route, vec![p]);
        assert_eq!(result.nodes_expanded, 0);
    }

    #[test]
    fn test_neighbour_generation_counts() {
        let grid = VoxelGrid::new();
        let planner = Planner::new(&grid, PlannerConfig::default());
        let mut cache = PassabilityCache::new(&grid, AgentVolume::default());
        let mut out = Vec::new();

        planner.adjacent(GridCoord::ZERO, &mut cache, &mut out);
        assert_eq!(out.len(), 22);

        let diagonal = Planner::new(&grid, PlannerConfig::default().with_diagonal(true));
        out.clear();
        diagonal.adjacent(GridCoord::ZERO, &mut cache, &mut out);
        assert_eq!(out.len(), 26);
    }

    #[test]
    fn test_corner_post_blocks_diagonal() {
        // Post at (1, *, 0): the (+1, +1) corner is framed by a solid cell
        let mut grid = VoxelGrid::new();
        grid.fill(GridCoord::new(1, -10, 0), GridCoord::new(1, 10, 0));

        let planner = Planner::new(&grid, PlannerConfig::default().with_diagonal(true));
        let mut cache = PassabilityCache::new(&grid, AgentVolume::default());
        let mut out = Vec::new();
        planner.adjacent(GridCoord::ZERO, &mut cache, &mut out);

        assert!(!out.contains(&GridCoord::new(1, 0, 1)));
        assert!(!out.contains(&GridCoord::new(1, 0, -1)));
        assert!(out.contains(&GridCoord::new(-1, 0, 1)));
        assert!(out.contains(&GridCoord::new(-1, 0, -1)));
    }

    #[test]
    fn test_passability_is_memoised() {
        let grid = VoxelGrid::new();
        let mut cache = PassabilityCache::new(&grid, AgentVolume::default());
        assert!(cache.is_passable(GridCoord::ZERO));
        assert!(cache.is_passable(GridCoord::ZERO));
        assert_eq!(cache.queries(), 1);
    }

    #[test]
    fn test_reconstruct_excludes_start() {
        let start = GridCoord::ZERO;
        let a = GridCoord::new(1, 0, 0);
        let b = GridCoord::new(2, 0, 0);

        let mut nodes = HashMap::new();
        nodes.insert(start, SearchNode::root(start));
        nodes.insert(a, SearchNode::reached(a, start, 1, 0));
        nodes.insert(b, SearchNode::reached(b, a, 2, 0));

        let route = Planner::<VoxelGrid>::reconstruct_route(&nodes, b);
        assert_eq!(route, vec![a, b]);
    }
}

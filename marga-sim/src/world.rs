//! Simulated voxel arena and wandering targets.
//!
//! ```text
//!   z ▲  ┌──────────────────────────┐
//!     │  │   ▪        ▪         ▪   │   ▪ pillar
//!     │  │        ║                 │   ║ wall band (one gap)
//!     │  │   ▪    ║     A      ▪    │   A agent spawn
//!     │  │             ║      ▪     │
//!     │  └──────────────────────────┘
//!     └──────────────────────────────▶ x
//! ```
//!
//! The floor is the y = -1 layer, so standing cells have y = 0.

use std::sync::RwLock;

use marga::{
    AgentVolume, Candidate, GridCoord, OccupancyOracle, TargetId, TargetSupplier, Vec3, VoxelGrid,
};
use rand::Rng;
use tracing::debug;

use crate::config::WorldConfig;

/// Cells kept clear around the spawn point.
const SPAWN_CLEARANCE: i32 = 2;

/// Static voxel geometry.
pub struct Arena {
    grid: VoxelGrid,
    half_extent: i32,
}

impl Arena {
    /// Build an arena from `config`, placing pillars with `rng`.
    pub fn build<R: Rng>(config: &WorldConfig, rng: &mut R) -> Self {
        let h = config.half_extent;
        let top = config.wall_height.max(1) - 1;
        let mut grid = VoxelGrid::new();

        // Floor
        grid.fill(GridCoord::new(-h, -1, -h), GridCoord::new(h, -1, h));

        // Perimeter
        grid.fill(GridCoord::new(-h, 0, -h), GridCoord::new(h, top, -h));
        grid.fill(GridCoord::new(-h, 0, h), GridCoord::new(h, top, h));
        grid.fill(GridCoord::new(-h, 0, -h), GridCoord::new(-h, top, h));
        grid.fill(GridCoord::new(h, 0, -h), GridCoord::new(h, top, h));

        if config.wall_band {
            // Two cells tall along x = h/2, with a gap near one end
            let x = h / 2;
            let gap = h - 3;
            grid.fill(GridCoord::new(x, 0, -h + 1), GridCoord::new(x, 1, gap - 1));
            grid.fill(GridCoord::new(x, 0, gap + 1), GridCoord::new(x, 1, h - 1));
        }

        let mut placed = 0;
        let mut attempts = 0;
        while placed < config.pillar_count && attempts < config.pillar_count * 20 {
            attempts += 1;
            let x = rng.random_range(-h + 2..=h - 2);
            let z = rng.random_range(-h + 2..=h - 2);
            if x.abs() <= SPAWN_CLEARANCE && z.abs() <= SPAWN_CLEARANCE {
                continue;
            }
            let height = rng.random_range(2..=5);
            grid.fill(GridCoord::new(x, 0, z), GridCoord::new(x, height - 1, z));
            placed += 1;
        }

        debug!(
            "[World] Arena {}x{} with {} pillars, {} solid voxels",
            2 * h + 1,
            2 * h + 1,
            placed,
            grid.solid_count()
        );

        Self {
            grid,
            half_extent: h,
        }
    }

    /// The voxel geometry
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    /// Take the geometry out of the arena
    pub fn into_grid(self) -> VoxelGrid {
        self.grid
    }

    /// Floor half extent
    pub fn half_extent(&self) -> i32 {
        self.half_extent
    }

    /// Where the agent starts
    pub fn spawn(&self) -> GridCoord {
        GridCoord::new(0, 0, 0)
    }

    /// Random standing cell an agent volume fits in, if one is found.
    pub fn random_open_cell<R: Rng>(&self, rng: &mut R) -> Option<GridCoord> {
        let agent = AgentVolume::default();
        let h = self.half_extent - 1;
        (0..64)
            .map(|_| GridCoord::new(rng.random_range(-h..=h), 0, rng.random_range(-h..=h)))
            .find(|cell| agent.is_passable(&self.grid, *cell))
    }
}

/// Targets drifting over the arena floor, readable from the search worker.
pub struct Wanderers {
    targets: RwLock<Vec<Candidate>>,
    wander_probability: f64,
}

impl Wanderers {
    /// Scatter `config.target_count` targets over open floor cells.
    pub fn scatter<R: Rng>(arena: &Arena, config: &WorldConfig, rng: &mut R) -> Self {
        let targets = (0..config.target_count as u64)
            .filter_map(|id| {
                arena
                    .random_open_cell(rng)
                    .map(|cell| Candidate::new(TargetId(id), standing_point(cell)))
            })
            .collect();

        Self {
            targets: RwLock::new(targets),
            wander_probability: config.wander_probability,
        }
    }

    /// Fixed targets (no wandering).
    #[cfg(test)]
    pub fn fixed(targets: Vec<Candidate>) -> Self {
        Self {
            targets: RwLock::new(targets),
            wander_probability: 0.0,
        }
    }

    /// Move each target at most one cell along x or z, staying on open floor.
    pub fn advance<O: OccupancyOracle + ?Sized, R: Rng>(&self, oracle: &O, rng: &mut R) {
        const MOVES: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        let agent = AgentVolume::default();

        let mut targets = self.targets.write().unwrap_or_else(|e| e.into_inner());
        for target in targets.iter_mut() {
            if !rng.random_bool(self.wander_probability) {
                continue;
            }
            let (dx, dz) = MOVES[rng.random_range(0..MOVES.len())];
            let next = target.cell().offset(dx, 0, dz);
            if agent.is_passable(oracle, next) && !agent.is_passable(oracle, next.offset(0, -1, 0))
            {
                target.position = standing_point(next);
            }
        }
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.targets.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl TargetSupplier for Wanderers {
    fn candidates(&self, origin: Vec3, max_distance_sq: f64) -> Vec<Candidate> {
        self.targets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| c.position.distance_squared(&origin) <= max_distance_sq)
            .copied()
            .collect()
    }
}

/// Feet position of an agent standing in `cell`.
pub fn standing_point(cell: GridCoord) -> Vec3 {
    Vec3::new(cell.x as f64 + 0.5, cell.y as f64, cell.z as f64 + 0.5)
}

//! Configuration loading for the simulator
//!
//! The engine sections (`[planner]`, `[executor]`, `[refresh]`) sit at the top
//! level next to the simulator's own `[world]`, `[authority]` and `[run]`.

use std::path::Path;

use marga::MargaConfig;
use serde::Deserialize;

use crate::error::{Result, SimError};

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SimConfig {
    /// Engine configuration
    #[serde(flatten)]
    pub engine: MargaConfig,

    #[serde(default)]
    pub world: WorldConfig,

    #[serde(default)]
    pub authority: AuthorityConfig,

    #[serde(default)]
    pub run: RunConfig,
}

/// Arena layout and targets
#[derive(Clone, Debug, Deserialize)]
pub struct WorldConfig {
    /// Floor spans -half_extent..=half_extent on x and z (default: 24)
    #[serde(default = "default_half_extent")]
    pub half_extent: i32,

    /// Perimeter wall height in cells (default: 4)
    #[serde(default = "default_wall_height")]
    pub wall_height: i32,

    /// Randomly placed pillars (default: 12)
    #[serde(default = "default_pillar_count")]
    pub pillar_count: usize,

    /// Add a low wall band with a single gap across the arena (default: true)
    #[serde(default = "default_wall_band")]
    pub wall_band: bool,

    /// Wandering targets (default: 6)
    #[serde(default = "default_target_count")]
    pub target_count: usize,

    /// Chance per step that a target moves one cell (default: 0.3)
    #[serde(default = "default_wander_probability")]
    pub wander_probability: f64,
}

/// Simulated authority rules
#[derive(Clone, Debug, Deserialize)]
pub struct AuthorityConfig {
    /// Longest accepted jump between consecutive positions (default: 10.0)
    #[serde(default = "default_max_claim_distance")]
    pub max_claim_distance: f64,

    /// Also require the straight segment from the last accepted position to be
    /// clear (default: true)
    #[serde(default = "default_check_path")]
    pub check_path: bool,
}

/// Run length and reporting
#[derive(Clone, Debug, Deserialize)]
pub struct RunConfig {
    /// Steps to simulate (default: 600)
    #[serde(default = "default_steps")]
    pub steps: u64,

    /// Log status every N steps (default: 100)
    #[serde(default = "default_status_interval")]
    pub status_interval: u64,

    /// Executor cadence: one eligible step every N (default: 4)
    #[serde(default = "default_cadence_interval")]
    pub cadence_interval: u64,

    /// Interaction reach around the effective position (default: 3.0)
    #[serde(default = "default_reach")]
    pub reach: f64,

    /// Random seed (default: 7)
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_half_extent() -> i32 {
    24
}

fn default_wall_height() -> i32 {
    4
}

fn default_pillar_count() -> usize {
    12
}

fn default_wall_band() -> bool {
    true
}

fn default_target_count() -> usize {
    6
}

fn default_wander_probability() -> f64 {
    0.3
}

fn default_max_claim_distance() -> f64 {
    10.0
}

fn default_check_path() -> bool {
    true
}

fn default_steps() -> u64 {
    600
}

fn default_status_interval() -> u64 {
    100
}

fn default_cadence_interval() -> u64 {
    4
}

fn default_reach() -> f64 {
    3.0
}

fn default_seed() -> u64 {
    7
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            half_extent: default_half_extent(),
            wall_height: default_wall_height(),
            pillar_count: default_pillar_count(),
            wall_band: default_wall_band(),
            target_count: default_target_count(),
            wander_probability: default_wander_probability(),
        }
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            max_claim_distance: default_max_claim_distance(),
            check_path: default_check_path(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            status_interval: default_status_interval(),
            cadence_interval: default_cadence_interval(),
            reach: default_reach(),
            seed: default_seed(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("Failed to read config file: {}", e)))?;
        let config: SimConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;

        if self.world.half_extent < 4 {
            return Err(SimError::Config(format!(
                "world.half_extent must be at least 4, got {}",
                self.world.half_extent
            )));
        }
        if !(0.0..=1.0).contains(&self.world.wander_probability) {
            return Err(SimError::Config(format!(
                "world.wander_probability must be within 0..=1, got {}",
                self.world.wander_probability
            )));
        }
        if self.authority.max_claim_distance <= 0.0 {
            return Err(SimError::Config(
                "authority.max_claim_distance must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_merge_with_engine_config() {
        let config: SimConfig = toml::from_str(
            r#"
            [planner]
            max_cost = 90

            [world]
            half_extent = 10

            [run]
            steps = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.planner.max_cost, 90);
        assert_eq!(config.engine.executor.chunk_length, 3);
        assert_eq!(config.world.half_extent, 10);
        assert_eq!(config.world.target_count, 6);
        assert_eq!(config.run.steps, 50);
        assert!(config.authority.check_path);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let err = SimConfig::load(Path::new("does/not/exist/sim.toml")).unwrap_err();
        assert!(matches!(err, SimError::Config(msg) if msg.contains("Failed to read")));
    }

    #[test]
    fn test_tiny_arena_rejected() {
        let mut config = SimConfig::default();
        config.world.half_extent = 2;
        assert!(matches!(config.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn test_engine_errors_surface() {
        let mut config = SimConfig::default();
        config.engine.executor.chunk_length = 9;
        assert!(matches!(config.validate(), Err(SimError::Engine(_))));
    }
}

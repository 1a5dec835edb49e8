//! Configuration loading for Marga
//!
//! ```toml
//! [planner]
//! max_cost = 250
//! allow_diagonal = false
//!
//! [executor]
//! chunk_length = 3
//! dwell_steps = 5
//! chunk_check = { kind = "swept", sample_step = 0.25 }
//!
//! [refresh]
//! max_candidate_distance = 95.0
//! ```
//!
//! Every field is optional; missing ones take the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MargaError, Result};
use crate::execution::{ChunkCheck, ExecutorConfig};
use crate::pathfinding::PlannerConfig;
use crate::refresh::RefreshConfig;

/// Allowed chunk lengths.
pub const CHUNK_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 1..=7;

/// Main configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MargaConfig {
    /// Bounded A* settings
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Traversal settings
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Background refresh settings
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl MargaConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MargaError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: MargaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let executor = &self.executor;
        if !CHUNK_LENGTH_RANGE.contains(&executor.chunk_length) {
            return Err(MargaError::Config(format!(
                "executor.chunk_length must be within 1..=7, got {}",
                executor.chunk_length
            )));
        }
        if let ChunkCheck::Swept { sample_step } = executor.chunk_check
            && !(sample_step > 0.0)
        {
            return Err(MargaError::Config(format!(
                "executor.chunk_check.sample_step must be positive, got {}",
                sample_step
            )));
        }

        let planner = &self.planner;
        if planner.max_iterations == 0 {
            return Err(MargaError::Config(
                "planner.max_iterations must be greater than zero".into(),
            ));
        }
        if !(planner.goal_tolerance > 0.0) {
            return Err(MargaError::Config(format!(
                "planner.goal_tolerance must be positive, got {}",
                planner.goal_tolerance
            )));
        }
        if planner.vertical_reach < 0 {
            return Err(MargaError::Config(format!(
                "planner.vertical_reach must not be negative, got {}",
                planner.vertical_reach
            )));
        }
        if !(planner.agent.width > 0.0 && planner.agent.height > 0.0) {
            return Err(MargaError::Config(
                "planner.agent dimensions must be positive".into(),
            ));
        }

        if !(self.refresh.max_candidate_distance >= 0.0) {
            return Err(MargaError::Config(format!(
                "refresh.max_candidate_distance must not be negative, got {}",
                self.refresh.max_candidate_distance
            )));
        }
        Ok(())
    }
}

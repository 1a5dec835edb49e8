//! Step loop wiring the engine to the simulated world and authority.

use std::sync::Arc;

use marga::{
    AgentState, Engine, EngineStatus, EveryNthStep, Feedback, InboundMessage, OutboundMessage,
    PositionReport, Vec3,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::authority::{Authority, AuthorityStats};
use crate::config::SimConfig;
use crate::error::Result;
use crate::world::{Arena, Wanderers, standing_point};

/// End-of-run totals.
#[derive(Clone, Debug, PartialEq)]
pub struct SimSummary {
    pub steps: u64,
    pub engine: EngineStatus,
    pub authority: AuthorityStats,
    /// Steps on which a target was within reach of the effective position
    pub steps_in_reach: u64,
    /// Steps spent in each state: idle, planned, executing
    pub state_steps: [u64; 3],
}

pub struct Simulation {
    config: SimConfig,
    rng: StdRng,
    grid: Arc<marga::VoxelGrid>,
    targets: Arc<Wanderers>,
    authority: Authority,
    engine: Engine,
    gate: EveryNthStep,
    position: Vec3,
    outbox: Vec<OutboundMessage>,
    steps_in_reach: u64,
    state_steps: [u64; 3],
}

impl Simulation {
    /// Build the arena, targets, authority and engine from `config`.
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.run.seed);

        let arena = Arena::build(&config.world, &mut rng);
        let targets = Arc::new(Wanderers::scatter(&arena, &config.world, &mut rng));
        let position = standing_point(arena.spawn());
        info!(
            "[Sim] Arena half extent {} ({} solid voxels), {} targets, agent at {}",
            arena.half_extent(),
            arena.grid().solid_count(),
            targets.len(),
            position
        );

        let grid = Arc::new(arena.into_grid());
        let authority = Authority::new(
            Arc::clone(&grid),
            config.engine.planner.agent,
            config.authority.clone(),
            position,
        );
        let engine = Engine::new(config.engine.clone(), grid.clone(), targets.clone())?;
        let gate = EveryNthStep::new(config.run.cadence_interval);

        Ok(Self {
            config,
            rng,
            grid,
            targets,
            authority,
            engine,
            gate,
            position,
            outbox: Vec::new(),
            steps_in_reach: 0,
            state_steps: [0; 3],
        })
    }

    /// Run one simulated step.
    pub fn step(&mut self) {
        self.targets.advance(self.grid.as_ref(), &mut self.rng);

        self.engine
            .step(self.position, &mut self.gate, &mut self.outbox);
        self.engine.send_position(
            PositionReport {
                position: self.position,
                on_ground: true,
            },
            &mut self.outbox,
        );

        let replies: Vec<InboundMessage> = self
            .outbox
            .drain(..)
            .filter_map(|message| self.authority.receive(&message))
            .collect();
        for reply in &replies {
            if let Feedback::Rejected { position } = self.engine.on_incoming(reply) {
                // The client is snapped to wherever the authority holds it
                self.position = position;
            }
        }

        if self
            .engine
            .nearest_in_reach(self.position, self.config.run.reach)
            .is_some()
        {
            self.steps_in_reach += 1;
        }
        let slot = match self.engine.state() {
            AgentState::Idle => 0,
            AgentState::Planned => 1,
            AgentState::Executing => 2,
        };
        self.state_steps[slot] += 1;
    }

    /// Run the configured number of steps, logging status periodically.
    pub fn run(&mut self) -> SimSummary {
        let steps = self.config.run.steps;
        let interval = self.config.run.status_interval.max(1);

        for _ in 0..steps {
            self.step();
            let now = self.engine.now();
            if now % interval == 0 {
                let stats = self.authority.stats();
                info!(
                    "[Sim] {} | authority {} accepted / {} rejected, holds agent at {}",
                    self.engine.status(),
                    stats.accepted,
                    stats.rejected,
                    self.authority.accepted()
                );
            }
        }

        self.summary()
    }

    /// Totals so far
    pub fn summary(&self) -> SimSummary {
        SimSummary {
            steps: self.engine.now(),
            engine: self.engine.status(),
            authority: self.authority.stats(),
            steps_in_reach: self.steps_in_reach,
            state_steps: self.state_steps,
        }
    }

    /// Agent's true position
    pub fn position(&self) -> Vec3 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(seed: u64) -> SimConfig {
        let mut config = SimConfig::default();
        config.engine.refresh.background_thread = false;
        config.run.steps = 150;
        config.run.seed = seed;
        config.world.half_extent = 12;
        config
    }

    #[test]
    fn test_run_produces_claims_and_cycles() {
        let mut sim = Simulation::new(quick_config(5)).unwrap();
        let summary = sim.run();

        assert_eq!(summary.steps, 150);
        assert!(summary.engine.refresh.cycles > 0);
        assert!(summary.engine.executor.claims > 0);
        assert!(summary.authority.accepted > 0);
        assert_eq!(summary.state_steps.iter().sum::<u64>(), 150);
        // Every correction the authority sent was seen as a rejection
        assert_eq!(summary.authority.rejected, summary.engine.rejections);
    }

    #[test]
    fn test_inline_runs_are_reproducible() {
        let a = Simulation::new(quick_config(11)).unwrap().run();
        let b = Simulation::new(quick_config(11)).unwrap().run();
        assert_eq!(a, b);
    }
}

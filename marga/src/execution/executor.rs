//! One-shot plan executor: forward pass, dwell, reverse pass.
//!
//! ```text
//!            plan + eligible step
//!   Ready ─────────────────────────▶ forward travel ──▶ Dwelling { resume_at }
//!     ▲                                                        │ clock reached
//!     │        retire plan, clear tracker                      ▼
//!     └──────────────────────────────────────────────── reverse travel
//! ```
//!
//! The executor keeps its own snapshot of the plan from the forward pass
//! until the reverse pass, so a plan published mid-cycle does not alter the
//! running traversal and is not discarded when it finishes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::GridCoord;
use crate::oracle::{AgentVolume, OccupancyOracle};
use crate::plan::{ActivePlan, PlanSlot};
use crate::transport::Transport;

use super::cadence::CadenceGate;
use super::desync::DesyncTracker;
use super::travel::{ChunkCheck, TravelReport, Traveler};

/// Executor configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum cells per chunk (1-7).
    #[serde(default = "default_chunk_length")]
    pub chunk_length: usize,

    /// Steps to wait between the forward and reverse passes.
    #[serde(default = "default_dwell_steps")]
    pub dwell_steps: u64,

    /// How a chunk is judged clear.
    #[serde(default)]
    pub chunk_check: ChunkCheck,
}

fn default_chunk_length() -> usize {
    3
}

fn default_dwell_steps() -> u64 {
    5
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            chunk_length: default_chunk_length(),
            dwell_steps: default_dwell_steps(),
            chunk_check: ChunkCheck::default(),
        }
    }
}

impl ExecutorConfig {
    /// Set chunk length.
    pub fn with_chunk_length(mut self, chunk_length: usize) -> Self {
        self.chunk_length = chunk_length;
        self
    }

    /// Set dwell steps.
    pub fn with_dwell_steps(mut self, dwell_steps: u64) -> Self {
        self.dwell_steps = dwell_steps;
        self
    }

    /// Set chunk check.
    pub fn with_chunk_check(mut self, chunk_check: ChunkCheck) -> Self {
        self.chunk_check = chunk_check;
        self
    }
}

/// What the executor did on one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExecutorStep {
    /// No plan published
    Idle,
    /// Plan published but the cadence gate is closed
    Gated,
    /// Forward pass sent; now dwelling
    Started(TravelReport),
    /// Waiting between passes
    Dwelling,
    /// Reverse pass sent and the plan retired
    Completed(TravelReport),
}

/// Cumulative executor counters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExecutorStats {
    /// Position claims sent
    pub claims: usize,
    /// Chunks sent as a single claim
    pub chunks_skipped: usize,
    /// Chunks sent cell by cell
    pub chunks_walked: usize,
    /// Cycles that ran through the reverse pass
    pub cycles_completed: u64,
    /// Cycles cut short by a rejection or disable
    pub cycles_aborted: u64,
}

impl ExecutorStats {
    fn record(&mut self, report: &TravelReport) {
        self.claims += report.claims;
        self.chunks_skipped += report.chunks_skipped;
        self.chunks_walked += report.chunks_walked;
    }
}

impl std::fmt::Display for ExecutorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Executor: {} claims ({} chunks skipped, {} walked), {} cycles done, {} aborted",
            self.claims,
            self.chunks_skipped,
            self.chunks_walked,
            self.cycles_completed,
            self.cycles_aborted
        )
    }
}

enum Phase {
    Ready,
    Dwelling { plan: Arc<ActivePlan>, resume_at: u64 },
}

/// Consumes published plans, one traversal cycle at a time.
pub struct Executor {
    config: ExecutorConfig,
    agent: AgentVolume,
    slot: Arc<PlanSlot>,
    tracker: Arc<DesyncTracker>,
    phase: Phase,
    stats: ExecutorStats,
}

impl Executor {
    /// Create an executor reading from `slot` and claiming through `tracker`.
    pub fn new(
        config: ExecutorConfig,
        agent: AgentVolume,
        slot: Arc<PlanSlot>,
        tracker: Arc<DesyncTracker>,
    ) -> Self {
        Self {
            config,
            agent,
            slot,
            tracker,
            phase: Phase::Ready,
            stats: ExecutorStats::default(),
        }
    }

    /// Get configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Cumulative counters.
    pub fn stats(&self) -> ExecutorStats {
        self.stats
    }

    /// Is a cycle between its forward and reverse passes?
    pub fn is_executing(&self) -> bool {
        matches!(self.phase, Phase::Dwelling { .. })
    }

    /// Plan of the running cycle, if any.
    pub fn current_plan(&self) -> Option<&Arc<ActivePlan>> {
        match &self.phase {
            Phase::Dwelling { plan, .. } => Some(plan),
            Phase::Ready => None,
        }
    }

    /// Drop the running cycle without sending the reverse pass.
    ///
    /// Returns true if a cycle was running.
    pub fn abort(&mut self) -> bool {
        match std::mem::replace(&mut self.phase, Phase::Ready) {
            Phase::Dwelling { plan, .. } => {
                self.stats.cycles_aborted += 1;
                debug!("[Executor] Aborted cycle for target {}", plan.target.id);
                true
            }
            Phase::Ready => false,
        }
    }

    /// Advance by one foreground step at clock value `now`.
    pub fn step<G, O, T>(
        &mut self,
        now: u64,
        gate: &mut G,
        oracle: &O,
        transport: &mut T,
    ) -> ExecutorStep
    where
        G: CadenceGate + ?Sized,
        O: OccupancyOracle + ?Sized,
        T: Transport + ?Sized,
    {
        match std::mem::replace(&mut self.phase, Phase::Ready) {
            Phase::Dwelling { plan, resume_at } => {
                if now < resume_at {
                    self.phase = Phase::Dwelling { plan, resume_at };
                    return ExecutorStep::Dwelling;
                }
                ExecutorStep::Completed(self.finish(&plan, oracle, transport))
            }
            Phase::Ready => {
                let Some(plan) = self.slot.load() else {
                    return ExecutorStep::Idle;
                };
                if !gate.is_eligible_step(now) {
                    return ExecutorStep::Gated;
                }

                let forward = self.travel(&plan.route, oracle, transport);
                debug!(
                    "[Executor] Forward pass to {}: {} claims over {} cells",
                    plan.target.id,
                    forward.claims,
                    plan.route.len()
                );

                if self.config.dwell_steps == 0 {
                    let mut report = forward;
                    report.merge(&self.finish(&plan, oracle, transport));
                    return ExecutorStep::Completed(report);
                }

                self.phase = Phase::Dwelling {
                    plan,
                    resume_at: now + self.config.dwell_steps,
                };
                ExecutorStep::Started(forward)
            }
        }
    }

    fn finish<O, T>(&mut self, plan: &Arc<ActivePlan>, oracle: &O, transport: &mut T) -> TravelReport
    where
        O: OccupancyOracle + ?Sized,
        T: Transport + ?Sized,
    {
        let reversed: Vec<GridCoord> = plan.route.iter().rev().copied().collect();
        let report = self.travel(&reversed, oracle, transport);

        self.tracker.clear();
        let retired = self.slot.retire(plan);
        self.stats.cycles_completed += 1;

        info!(
            "[Executor] Cycle for target {} complete ({} return claims, plan {})",
            plan.target.id,
            report.claims,
            if retired { "retired" } else { "superseded" }
        );
        report
    }

    fn travel<O, T>(&mut self, route: &[GridCoord], oracle: &O, transport: &mut T) -> TravelReport
    where
        O: OccupancyOracle + ?Sized,
        T: Transport + ?Sized,
    {
        let traveler = Traveler::new(
            oracle,
            self.agent,
            self.config.chunk_length,
            self.config.chunk_check,
        );
        let report = traveler.travel(route, &self.tracker, transport);
        self.stats.record(&report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Vec3;
    use crate::execution::cadence::AlwaysEligible;
    use crate::oracle::VoxelGrid;
    use crate::plan::{Candidate, TargetId};
    use crate::transport::OutboundMessage;

    fn setup(dwell_steps: u64) -> (Executor, Arc<PlanSlot>, Arc<DesyncTracker>) {
        let slot = Arc::new(PlanSlot::new());
        let tracker = Arc::new(DesyncTracker::new());
        let executor = Executor::new(
            ExecutorConfig::default().with_dwell_steps(dwell_steps),
            AgentVolume::default(),
            Arc::clone(&slot),
            Arc::clone(&tracker),
        );
        (executor, slot, tracker)
    }

    fn plan(id: u64) -> ActivePlan {
        ActivePlan::new(
            Candidate::new(TargetId(id), Vec3::new(6.5, 0.0, 0.5)),
            (1..=4).map(|x| GridCoord::new(x, 0, 0)).collect(),
        )
    }

    #[test]
    fn test_idle_without_plan() {
        let (mut executor, _slot, _tracker) = setup(2);
        let grid = VoxelGrid::new();
        let mut sent: Vec<OutboundMessage> = Vec::new();

        let step = executor.step(1, &mut AlwaysEligible, &grid, &mut sent);
        assert_eq!(step, ExecutorStep::Idle);
        assert!(sent.is_empty());
    }

    #[test]
    fn test_closed_gate_sends_nothing() {
        let (mut executor, slot, _tracker) = setup(2);
        slot.publish(Some(plan(1)));
        let grid = VoxelGrid::new();
        let mut sent: Vec<OutboundMessage> = Vec::new();

        let step = executor.step(1, &mut |_: u64| false, &grid, &mut sent);
        assert_eq!(step, ExecutorStep::Gated);
        assert!(sent.is_empty());
        assert!(slot.is_present());
    }

    #[test]
    fn test_full_cycle_returns_to_first_cell() {
        let (mut executor, slot, tracker) = setup(2);
        slot.publish(Some(plan(1)));
        let grid = VoxelGrid::new();
        let mut sent: Vec<OutboundMessage> = Vec::new();

        assert!(matches!(
            executor.step(1, &mut AlwaysEligible, &grid, &mut sent),
            ExecutorStep::Started(_)
        ));
        assert!(executor.is_executing());
        let after_forward = sent.len();

        assert_eq!(
            executor.step(2, &mut AlwaysEligible, &grid, &mut sent),
            ExecutorStep::Dwelling
        );
        assert_eq!(sent.len(), after_forward);

        assert!(matches!(
            executor.step(3, &mut AlwaysEligible, &grid, &mut sent),
            ExecutorStep::Completed(_)
        ));
        let last = sent.last().and_then(|m| m.position());
        assert_eq!(last, Some(GridCoord::new(1, 0, 0).center()));
        assert!(!slot.is_present());
        assert!(!tracker.is_set());
        assert_eq!(executor.stats().cycles_completed, 1);
    }

    #[test]
    fn test_plan_published_mid_cycle_survives() {
        let (mut executor, slot, _tracker) = setup(1);
        slot.publish(Some(plan(1)));
        let grid = VoxelGrid::new();
        let mut sent: Vec<OutboundMessage> = Vec::new();

        executor.step(1, &mut AlwaysEligible, &grid, &mut sent);
        slot.publish(Some(plan(2)));
        executor.step(2, &mut AlwaysEligible, &grid, &mut sent);

        assert_eq!(slot.load().map(|p| p.target.id), Some(TargetId(2)));
    }

    #[test]
    fn test_abort_skips_reverse_pass() {
        let (mut executor, slot, _tracker) = setup(3);
        slot.publish(Some(plan(1)));
        let grid = VoxelGrid::new();
        let mut sent: Vec<OutboundMessage> = Vec::new();

        executor.step(1, &mut AlwaysEligible, &grid, &mut sent);
        let after_forward = sent.len();
        slot.clear();

        assert!(executor.abort());
        assert!(!executor.abort());
        assert_eq!(
            executor.step(5, &mut AlwaysEligible, &grid, &mut sent),
            ExecutorStep::Idle
        );
        assert_eq!(sent.len(), after_forward);
        assert_eq!(executor.stats().cycles_aborted, 1);
    }

    #[test]
    fn test_zero_dwell_completes_in_one_step() {
        let (mut executor, slot, _tracker) = setup(0);
        slot.publish(Some(plan(1)));
        let grid = VoxelGrid::new();
        let mut sent: Vec<OutboundMessage> = Vec::new();

        let step = executor.step(1, &mut AlwaysEligible, &grid, &mut sent);
        assert!(matches!(step, ExecutorStep::Completed(_)));
        assert!(!slot.is_present());
    }
}

//! Simulated remote authority.
//!
//! Holds the agent's last accepted position and judges every position
//! report against the arena: the claimed cell must fit the agent, the jump
//! must be short enough and, optionally, the straight segment from the last
//! accepted position must be clear. A report that fails is answered with a
//! position correction back to the last accepted position.

use std::sync::Arc;

use marga::{AgentVolume, ChunkCheck, InboundMessage, OutboundMessage, Vec3, VoxelGrid};
use tracing::trace;

use crate::config::AuthorityConfig;

/// How a claim was judged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Agent volume does not fit at the claimed cell
    Obstructed,
    /// Jump longer than `max_claim_distance`
    TooFar,
    /// Straight segment from the last accepted position hits geometry
    PathBlocked,
}

/// Authority counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthorityStats {
    pub accepted: u64,
    pub rejected: u64,
}

pub struct Authority {
    grid: Arc<VoxelGrid>,
    agent: AgentVolume,
    config: AuthorityConfig,
    accepted: Vec3,
    stats: AuthorityStats,
}

impl Authority {
    /// Authority that currently holds the agent at `start`.
    pub fn new(grid: Arc<VoxelGrid>, agent: AgentVolume, config: AuthorityConfig, start: Vec3) -> Self {
        Self {
            grid,
            agent,
            config,
            accepted: start,
            stats: AuthorityStats::default(),
        }
    }

    /// Position the authority holds the agent at
    pub fn accepted(&self) -> Vec3 {
        self.accepted
    }

    pub fn stats(&self) -> AuthorityStats {
        self.stats
    }

    /// Judge a claim without changing state.
    pub fn judge(&self, claim: Vec3) -> Verdict {
        let cell = claim.to_grid();
        if !self.agent.is_passable(self.grid.as_ref(), cell) {
            return Verdict::Obstructed;
        }

        let from = self.accepted.to_grid().center();
        let to = cell.center();
        if from.distance(&to) > self.config.max_claim_distance {
            return Verdict::TooFar;
        }

        if self.config.check_path
            && (ChunkCheck::Swept { sample_step: 0.25 }).is_obstructed(
                self.grid.as_ref(),
                &self.agent,
                from,
                to,
            )
        {
            return Verdict::PathBlocked;
        }
        Verdict::Accepted
    }

    /// Process one outbound message; returns the reply, if any.
    pub fn receive(&mut self, message: &OutboundMessage) -> Option<InboundMessage> {
        let OutboundMessage::Position(report) = message else {
            return None;
        };

        match self.judge(report.position) {
            Verdict::Accepted => {
                self.accepted = report.position;
                self.stats.accepted += 1;
                None
            }
            verdict => {
                self.stats.rejected += 1;
                trace!(
                    "[Authority] Rejected claim {} ({:?}), holding agent at {}",
                    report.position, verdict, self.accepted
                );
                Some(InboundMessage::PositionCorrection {
                    position: self.accepted,
                })
            }
        }
    }
}

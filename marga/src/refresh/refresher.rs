//! Plan refresher: periodically replaces the published plan.
//!
//! ```text
//!   Waiting { resume_at } ──clock reached──▶ dispatch search ──▶ Searching { ticket }
//!          ▲                                                          │ result
//!          └──────────── publish (or drop as stale) ◀─────────────────┘
//! ```
//!
//! The refresher never blocks the foreground step: each step it either
//! waits, dispatches, or polls. A result is published only if its ticket is
//! the outstanding one and the engine is still enabled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::core::Vec3;
use crate::plan::PlanSlot;

use super::worker::{SearchDispatch, SearchRequest};

/// Refresher configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Candidate search radius around the agent.
    #[serde(default = "default_max_candidate_distance")]
    pub max_candidate_distance: f64,

    /// Steps to wait before each refresh cycle.
    #[serde(default = "default_refresh_interval_steps")]
    pub refresh_interval_steps: u64,

    /// Whether to search on a worker thread (vs inline).
    #[serde(default = "default_background_thread")]
    pub background_thread: bool,
}

fn default_max_candidate_distance() -> f64 {
    95.0
}

fn default_refresh_interval_steps() -> u64 {
    1
}

fn default_background_thread() -> bool {
    true
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_candidate_distance: default_max_candidate_distance(),
            refresh_interval_steps: default_refresh_interval_steps(),
            background_thread: default_background_thread(),
        }
    }
}

/// What the refresher did on one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshStep {
    /// Pre-cycle delay still running (or engine disabled)
    Waiting,
    /// Search handed to the backend
    Dispatched {
        /// Ticket of the new search
        ticket: u64,
    },
    /// Search still running
    Searching,
    /// Result published; `found` is false when no candidate was reachable
    Published {
        /// A plan was published (rather than nothing)
        found: bool,
    },
    /// Result arrived but was not publishable
    Stale,
    /// Backend failed; the cycle was abandoned
    Failed,
}

/// Cumulative refresher counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Searches dispatched
    pub cycles: u64,
    /// Cycles that published a plan
    pub published: u64,
    /// Cycles that found no reachable candidate
    pub empty: u64,
    /// Results dropped as stale
    pub stale_dropped: u64,
    /// Backend failures
    pub failures: u64,
    /// Nodes expanded across all searches
    pub nodes_expanded: u64,
}

impl std::fmt::Display for RefreshStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Refresh: {} cycles, {} published, {} empty, {} stale, {} failed",
            self.cycles, self.published, self.empty, self.stale_dropped, self.failures
        )
    }
}

enum Phase {
    Waiting { resume_at: u64 },
    Searching { ticket: u64 },
}

/// Background plan producer, driven from the foreground step.
pub struct PlanRefresher {
    config: RefreshConfig,
    dispatch: SearchDispatch,
    slot: Arc<PlanSlot>,
    active: Arc<AtomicBool>,
    phase: Phase,
    next_ticket: u64,
    stats: RefreshStats,
}

impl PlanRefresher {
    /// Create a refresher publishing into `slot`, gated by `active`.
    pub fn new(
        config: RefreshConfig,
        dispatch: SearchDispatch,
        slot: Arc<PlanSlot>,
        active: Arc<AtomicBool>,
    ) -> Self {
        let phase = Phase::Waiting {
            resume_at: config.refresh_interval_steps,
        };
        Self {
            config,
            dispatch,
            slot,
            active,
            phase,
            next_ticket: 1,
            stats: RefreshStats::default(),
        }
    }

    /// Get configuration.
    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Cumulative counters.
    pub fn stats(&self) -> RefreshStats {
        self.stats
    }

    /// Is a search outstanding?
    pub fn is_searching(&self) -> bool {
        matches!(self.phase, Phase::Searching { .. })
    }

    /// Abandon any outstanding search and start a fresh delay at `now`.
    ///
    /// A result for the abandoned ticket is dropped when it arrives.
    pub fn restart(&mut self, now: u64) {
        if let Phase::Searching { ticket } = self.phase {
            debug!("[Refresh] Abandoning search #{}", ticket);
        }
        self.phase = Phase::Waiting {
            resume_at: now + self.config.refresh_interval_steps,
        };
    }

    /// Advance by one foreground step at clock value `now`.
    pub fn step(&mut self, now: u64, origin: Vec3) -> RefreshStep {
        match self.phase {
            Phase::Waiting { resume_at } => {
                if now < resume_at || !self.is_active() {
                    return RefreshStep::Waiting;
                }
                self.begin(now, origin)
            }
            Phase::Searching { ticket } => self.collect(now, ticket),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn begin(&mut self, now: u64, origin: Vec3) -> RefreshStep {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        match self.dispatch.dispatch(SearchRequest { ticket, origin }) {
            Ok(()) => {
                self.stats.cycles += 1;
                self.phase = Phase::Searching { ticket };
                RefreshStep::Dispatched { ticket }
            }
            Err(e) => {
                error!("[Refresh] Dispatch failed: {}", e);
                self.stats.failures += 1;
                self.restart(now);
                RefreshStep::Failed
            }
        }
    }

    fn collect(&mut self, now: u64, ticket: u64) -> RefreshStep {
        let response = match self.dispatch.poll() {
            Ok(Some(response)) => response,
            Ok(None) => return RefreshStep::Searching,
            Err(e) => {
                error!("[Refresh] Search backend failed: {}", e);
                self.stats.failures += 1;
                self.restart(now);
                return RefreshStep::Failed;
            }
        };

        self.stats.nodes_expanded += response.outcome.nodes_expanded as u64;

        if response.ticket != ticket {
            // Leftover from an abandoned search; keep waiting for ours
            self.stats.stale_dropped += 1;
            debug!(
                "[Refresh] Dropped result #{} (waiting for #{})",
                response.ticket, ticket
            );
            return RefreshStep::Stale;
        }

        self.restart(now);

        if !self.is_active() {
            self.stats.stale_dropped += 1;
            debug!("[Refresh] Dropped result #{} after disable", ticket);
            return RefreshStep::Stale;
        }

        let found = response.outcome.plan.is_some();
        if let Some(plan) = &response.outcome.plan {
            self.stats.published += 1;
            info!(
                "[Refresh] Published plan to {} ({} cells, {} candidates tried)",
                plan.target.id,
                plan.route.len(),
                response.outcome.attempts
            );
        } else {
            self.stats.empty += 1;
        }
        self.slot.publish(response.outcome.plan);

        RefreshStep::Published { found }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::VoxelGrid;
    use crate::pathfinding::PlannerConfig;
    use crate::plan::{Candidate, TargetId};
    use crate::refresh::search::PlanSearch;

    fn refresher(candidates: Vec<Candidate>) -> (PlanRefresher, Arc<PlanSlot>, Arc<AtomicBool>) {
        let search = Arc::new(PlanSearch::new(
            Arc::new(VoxelGrid::new()),
            Arc::new(candidates),
            PlannerConfig::with_max_cost(100),
            95.0,
        ));
        let slot = Arc::new(PlanSlot::new());
        let active = Arc::new(AtomicBool::new(true));
        let refresher = PlanRefresher::new(
            RefreshConfig {
                background_thread: false,
                ..RefreshConfig::default()
            },
            SearchDispatch::inline(search),
            Arc::clone(&slot),
            Arc::clone(&active),
        );
        (refresher, slot, active)
    }

    fn target() -> Vec<Candidate> {
        vec![Candidate::new(TargetId(7), Vec3::new(5.5, 0.0, 0.5))]
    }

    #[test]
    fn test_cycle_waits_dispatches_then_publishes() {
        let (mut refresher, slot, _active) = refresher(target());
        let origin = Vec3::new(0.5, 0.0, 0.5);

        assert_eq!(refresher.step(0, origin), RefreshStep::Waiting);
        assert_eq!(
            refresher.step(1, origin),
            RefreshStep::Dispatched { ticket: 1 }
        );
        assert!(!slot.is_present());
        assert_eq!(
            refresher.step(2, origin),
            RefreshStep::Published { found: true }
        );
        assert_eq!(slot.load().map(|p| p.target.id), Some(TargetId(7)));

        // Next cycle waits one step again
        assert_eq!(refresher.step(2, origin), RefreshStep::Waiting);
        assert_eq!(
            refresher.step(3, origin),
            RefreshStep::Dispatched { ticket: 2 }
        );
    }

    #[test]
    fn test_empty_result_clears_slot() {
        let (mut refresher, slot, _active) = refresher(Vec::new());
        slot.publish(Some(crate::plan::ActivePlan::new(target()[0], Vec::new())));

        refresher.step(1, Vec3::ZERO);
        assert_eq!(
            refresher.step(2, Vec3::ZERO),
            RefreshStep::Published { found: false }
        );
        assert!(!slot.is_present());
        assert_eq!(refresher.stats().empty, 1);
    }

    #[test]
    fn test_result_after_disable_is_dropped() {
        let (mut refresher, slot, active) = refresher(target());
        let origin = Vec3::new(0.5, 0.0, 0.5);

        refresher.step(1, origin);
        active.store(false, Ordering::Release);

        assert_eq!(refresher.step(2, origin), RefreshStep::Stale);
        assert!(!slot.is_present());
        assert_eq!(refresher.stats().stale_dropped, 1);

        // No new cycle while disabled
        assert_eq!(refresher.step(10, origin), RefreshStep::Waiting);
    }

    #[test]
    fn test_abandoned_ticket_is_dropped() {
        let (mut refresher, slot, _active) = refresher(target());
        let origin = Vec3::new(0.5, 0.0, 0.5);

        // Inline backend keeps only the latest result, so abandon before it lands
        refresher.step(1, origin);
        refresher.restart(1);
        assert!(!refresher.is_searching());

        assert_eq!(
            refresher.step(2, origin),
            RefreshStep::Dispatched { ticket: 2 }
        );
        assert_eq!(
            refresher.step(3, origin),
            RefreshStep::Published { found: true }
        );
        assert!(slot.is_present());
    }
}

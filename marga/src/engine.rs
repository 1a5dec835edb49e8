//! Foreground engine: the one object a host drives.
//!
//! Each host step calls [`Engine::step`] once; inbound messages go through
//! [`Engine::on_incoming`] and the host's own position reports through
//! [`Engine::send_position`]. Everything in here runs on the caller's
//! thread, so the executor and feedback monitor never interleave.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::clock::StepClock;
use crate::config::MargaConfig;
use crate::core::Vec3;
use crate::error::Result;
use crate::execution::{
    CadenceGate, DesyncTracker, Executor, ExecutorStats, ExecutorStep, Feedback, FeedbackMonitor,
};
use crate::oracle::OccupancyOracle;
use crate::plan::{Candidate, PlanSlot, TargetId};
use crate::refresh::{
    PlanRefresher, PlanSearch, RefreshStats, RefreshStep, SearchDispatch, TargetSupplier,
};
use crate::transport::{
    Diagnostics, InboundMessage, OutboundMessage, PositionReport, TracingDiagnostics, Transport,
};

/// Coarse agent state, as seen from the foreground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentState {
    /// No plan published
    Idle,
    /// A plan is waiting for an eligible step
    Planned,
    /// A traversal cycle is between its forward and reverse passes
    Executing,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AgentState::Idle => "idle",
            AgentState::Planned => "planned",
            AgentState::Executing => "executing",
        };
        f.write_str(name)
    }
}

/// What happened on one engine step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    /// Step number
    pub step: u64,
    /// Refresher activity
    pub refresh: RefreshStep,
    /// Executor activity
    pub executor: ExecutorStep,
}

/// Snapshot of the engine for logging.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineStatus {
    /// Current step
    pub step: u64,
    /// Agent state
    pub state: AgentState,
    /// Whether the engine is enabled
    pub enabled: bool,
    /// Target of the published plan
    pub target: Option<TargetId>,
    /// Length of the published route
    pub route_len: usize,
    /// Last claimed position
    pub desync: Option<Vec3>,
    /// Rejections seen
    pub rejections: u64,
    /// Executor counters
    pub executor: ExecutorStats,
    /// Refresher counters
    pub refresh: RefreshStats,
}

impl std::fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} [{}]", self.step, self.state)?;
        if let Some(target) = self.target {
            write!(f, " target {} ({} cells)", target, self.route_len)?;
        }
        write!(
            f,
            ", {} claims, {} cycles, {} rejections, {} plans published",
            self.executor.claims,
            self.executor.cycles_completed,
            self.rejections,
            self.refresh.published
        )
    }
}

/// Plan refresh, execution and feedback for one agent.
pub struct Engine {
    config: MargaConfig,
    clock: StepClock,
    oracle: Arc<dyn OccupancyOracle>,
    supplier: Arc<dyn TargetSupplier>,
    slot: Arc<PlanSlot>,
    tracker: Arc<DesyncTracker>,
    active: Arc<AtomicBool>,
    executor: Executor,
    refresher: PlanRefresher,
    monitor: FeedbackMonitor,
}

impl Engine {
    /// Create an enabled engine reporting diagnostics through `tracing`.
    pub fn new(
        config: MargaConfig,
        oracle: Arc<dyn OccupancyOracle>,
        supplier: Arc<dyn TargetSupplier>,
    ) -> Result<Self> {
        Self::with_diagnostics(config, oracle, supplier, Arc::new(TracingDiagnostics))
    }

    /// Create an enabled engine with a custom diagnostics sink.
    ///
    /// Spawns the search worker when `refresh.background_thread` is set.
    pub fn with_diagnostics(
        config: MargaConfig,
        oracle: Arc<dyn OccupancyOracle>,
        supplier: Arc<dyn TargetSupplier>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self> {
        config.validate()?;

        let slot = Arc::new(PlanSlot::new());
        let tracker = Arc::new(DesyncTracker::new());
        let active = Arc::new(AtomicBool::new(true));

        let search = Arc::new(PlanSearch::new(
            Arc::clone(&oracle),
            Arc::clone(&supplier),
            config.planner.clone(),
            config.refresh.max_candidate_distance,
        ));
        let dispatch = if config.refresh.background_thread {
            SearchDispatch::threaded(search)?
        } else {
            SearchDispatch::inline(search)
        };

        let refresher = PlanRefresher::new(
            config.refresh.clone(),
            dispatch,
            Arc::clone(&slot),
            Arc::clone(&active),
        );
        let executor = Executor::new(
            config.executor.clone(),
            config.planner.agent,
            Arc::clone(&slot),
            Arc::clone(&tracker),
        );
        let monitor = FeedbackMonitor::new(Arc::clone(&slot), Arc::clone(&tracker), diagnostics);

        info!(
            "[Engine] Created (max_cost={}, chunk_length={}, dwell_steps={}, {} search)",
            config.planner.max_cost,
            config.executor.chunk_length,
            config.executor.dwell_steps,
            if config.refresh.background_thread {
                "threaded"
            } else {
                "inline"
            }
        );

        Ok(Self {
            config,
            clock: StepClock::new(),
            oracle,
            supplier,
            slot,
            tracker,
            active,
            executor,
            refresher,
            monitor,
        })
    }

    /// Run one foreground step with the agent at `agent_position`.
    pub fn step<G, T>(&mut self, agent_position: Vec3, gate: &mut G, transport: &mut T) -> StepReport
    where
        G: CadenceGate + ?Sized,
        T: Transport + ?Sized,
    {
        let now = self.clock.advance();

        // The refresher also runs while disabled so late results are drained
        let refresh = self.refresher.step(now, agent_position);

        let executor = if self.is_enabled() {
            self.executor
                .step(now, gate, self.oracle.as_ref(), transport)
        } else {
            ExecutorStep::Idle
        };

        StepReport {
            step: now,
            refresh,
            executor,
        }
    }

    /// Handle an inbound message from the authority.
    pub fn on_incoming(&mut self, message: &InboundMessage) -> Feedback {
        let feedback = self.monitor.inspect(message, self.clock.now());
        if let Feedback::Rejected { .. } = feedback {
            self.executor.abort();
        }
        feedback
    }

    /// Send a host position report, rewritten to the tracked claim if one is set.
    pub fn send_position<T: Transport + ?Sized>(&self, report: PositionReport, transport: &mut T) {
        transport.send(self.outbound(OutboundMessage::Position(report)));
    }

    /// Apply the desync rewrite to any outbound message.
    pub fn outbound(&self, message: OutboundMessage) -> OutboundMessage {
        self.tracker.rewrite(message)
    }

    /// Resume refreshing and executing.
    pub fn enable(&mut self) {
        if self.active.swap(true, Ordering::AcqRel) {
            return;
        }
        self.refresher.restart(self.clock.now());
        info!("[Engine] Enabled at step {}", self.clock.now());
    }

    /// Stop, discarding the plan and the tracked claim immediately.
    ///
    /// Messages already sent are not retracted; an outstanding search is left
    /// to finish and its result dropped.
    pub fn disable(&mut self) {
        self.active.store(false, Ordering::Release);
        self.tracker.clear();
        self.slot.clear();
        self.executor.abort();
        info!("[Engine] Disabled at step {}", self.clock.now());
    }

    /// Is the engine enabled?
    pub fn is_enabled(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Current agent state.
    pub fn state(&self) -> AgentState {
        if self.executor.is_executing() {
            AgentState::Executing
        } else if self.slot.is_present() {
            AgentState::Planned
        } else {
            AgentState::Idle
        }
    }

    /// Snapshot for logging.
    pub fn status(&self) -> EngineStatus {
        let plan = self
            .executor
            .current_plan()
            .cloned()
            .or_else(|| self.slot.load());
        EngineStatus {
            step: self.clock.now(),
            state: self.state(),
            enabled: self.is_enabled(),
            target: plan.as_ref().map(|p| p.target.id),
            route_len: plan.as_ref().map_or(0, |p| p.route.len()),
            desync: self.tracker.get(),
            rejections: self.monitor.rejections(),
            executor: self.executor.stats(),
            refresh: self.refresher.stats(),
        }
    }

    /// Position the authority believes the agent is at: the tracked claim if
    /// one is outstanding, otherwise `true_position`.
    pub fn effective_position(&self, true_position: Vec3) -> Vec3 {
        self.tracker.get().unwrap_or(true_position)
    }

    /// Closest candidate within `range` of the effective position.
    pub fn nearest_in_reach(&self, true_position: Vec3, range: f64) -> Option<Candidate> {
        let origin = self.effective_position(true_position);
        let range_sq = range * range;
        self.supplier
            .candidates(origin, range_sq)
            .into_iter()
            .map(|c| (c.position.distance_squared(&origin), c))
            .filter(|(d, _)| *d <= range_sq)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, c)| c)
    }

    /// Steps since the last rejection, or `None` if none happened.
    pub fn steps_since_rejection(&self) -> Option<u64> {
        self.monitor.timer().elapsed(self.clock.now())
    }

    /// Current step.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Get configuration.
    pub fn config(&self) -> &MargaConfig {
        &self.config
    }

    /// Shared plan slot.
    pub fn slot(&self) -> &Arc<PlanSlot> {
        &self.slot
    }

    /// Shared desync tracker.
    pub fn tracker(&self) -> &Arc<DesyncTracker> {
        &self.tracker
    }
}

//! # Marga: bounded voxel pathfinding and plan execution
//!
//! Searches a 3-D voxel grid for a short walkable route to a nearby target,
//! refreshes that plan in the background, and executes it by sending chunked
//! position claims to a remote authority while watching for rejections.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use marga::{Candidate, Engine, EveryNthStep, MargaConfig, TargetId, Vec3, VoxelGrid};
//! use marga::transport::OutboundMessage;
//!
//! let world = Arc::new(VoxelGrid::new());
//! let targets = Arc::new(vec![Candidate::new(TargetId(1), Vec3::new(6.5, 0.0, 0.5))]);
//! let mut engine = Engine::new(MargaConfig::default(), world, targets).unwrap();
//!
//! let mut gate = EveryNthStep::new(4);
//! let mut outbox: Vec<OutboundMessage> = Vec::new();
//! for _ in 0..20 {
//!     engine.step(Vec3::new(0.5, 0.0, 0.5), &mut gate, &mut outbox);
//! }
//! println!("{}", engine.status());
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: grid coordinates, world points, boxes
//! - [`oracle`]: occupancy queries and the agent volume
//! - [`pathfinding`]: bounded A*
//! - [`plan`]: the published plan and its atomic slot
//! - [`refresh`]: target search and background dispatch
//! - [`execution`]: chunked travel, desync tracking, rejection feedback
//! - [`engine`]: foreground step loop tying it together
//!
//! ## Data Flow
//!
//! ```text
//!  ┌──────────────────┐  publish   ┌───────────┐  load   ┌──────────────┐
//!  │  Plan Refresher  │──────────▶│ Plan Slot │───────▶│   Executor   │
//!  │ (worker thread)  │            └───────────┘         │ (cadence     │
//!  └────────▲─────────┘                  ▲ clear         │  gated)      │
//!           │ next cycle                 │               └──────┬───────┘
//!           │                   ┌────────┴─────────┐            │ claims
//!           │                   │ Feedback Monitor │            ▼
//!           │                   └────────▲─────────┘   ┌─────────────────┐
//!           │                            │ correction  │ Desync Tracker  │
//!           └────────────────────────────┴─────────────│   (rewrite)     │
//!                                       authority ◀────└─────────────────┘
//! ```

pub mod clock;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod execution;
pub mod oracle;
pub mod pathfinding;
pub mod plan;
pub mod refresh;
pub mod transport;

pub use clock::StepClock;
pub use config::MargaConfig;
pub use self::core::{Aabb, GridCoord, Vec3};
pub use engine::{AgentState, Engine, EngineStatus, StepReport};
pub use error::{MargaError, Result};
pub use execution::{
    AlwaysEligible, CadenceGate, ChunkCheck, DesyncTracker, EveryNthStep, ExecutorConfig,
    Feedback,
};
pub use oracle::{AgentVolume, OccupancyOracle, VoxelGrid};
pub use pathfinding::{CostModel, PathResult, Planner, PlannerConfig, find_path};
pub use plan::{ActivePlan, Candidate, PlanSlot, TargetId};
pub use refresh::{RefreshConfig, TargetSupplier};
pub use transport::{Diagnostics, InboundMessage, OutboundMessage, PositionReport, Transport};

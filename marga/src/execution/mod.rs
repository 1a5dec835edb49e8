//! Plan execution: chunked claims, desync tracking and rejection feedback.

mod cadence;
mod desync;
mod executor;
mod feedback;
mod travel;

pub use cadence::{AlwaysEligible, CadenceGate, EveryNthStep};
pub use desync::DesyncTracker;
pub use executor::{Executor, ExecutorConfig, ExecutorStats, ExecutorStep};
pub use feedback::{Feedback, FeedbackMonitor, StuckTimer};
pub use travel::{ChunkCheck, TravelReport, Traveler};

//! Background plan refresh: target search, dispatch backends and the
//! foreground-driven refresher.

mod refresher;
mod search;
mod worker;

pub use refresher::{PlanRefresher, RefreshConfig, RefreshStats, RefreshStep};
pub use search::{PlanSearch, SearchOutcome, TargetSupplier};
pub use worker::{SearchDispatch, SearchRequest, SearchResponse, SearchWorker};

//! Active plan and the single-slot handoff between refresher and executor.
//!
//! The refresher publishes a complete `{target, route}` pair with one atomic
//! swap; the executor loads a snapshot and keeps it for a whole traversal
//! cycle. Readers never see a half-written pair.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};

use crate::core::{GridCoord, Vec3};

/// Opaque identifier of a destination candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A destination offered by the target supplier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Supplier-assigned identity
    pub id: TargetId,
    /// Current world position
    pub position: Vec3,
}

impl Candidate {
    /// Create a new candidate
    pub fn new(id: TargetId, position: Vec3) -> Self {
        Self { id, position }
    }

    /// Grid cell the candidate stands in
    pub fn cell(&self) -> GridCoord {
        self.position.to_grid()
    }
}

/// A target plus the route leading to it.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivePlan {
    /// Destination the route was planned for
    pub target: Candidate,
    /// Cells from the one after start to one within tolerance of the target
    pub route: Vec<GridCoord>,
}

impl ActivePlan {
    /// Create a new plan
    pub fn new(target: Candidate, route: Vec<GridCoord>) -> Self {
        Self { target, route }
    }
}

/// Atomic single-slot mailbox holding at most one [`ActivePlan`].
#[derive(Debug, Default)]
pub struct PlanSlot {
    inner: ArcSwapOption<ActivePlan>,
}

impl PlanSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is published with `plan` (or clear it with `None`).
    pub fn publish(&self, plan: Option<ActivePlan>) {
        self.inner.store(plan.map(Arc::new));
    }

    /// Snapshot of the current plan.
    pub fn load(&self) -> Option<Arc<ActivePlan>> {
        self.inner.load_full()
    }

    /// Is a plan published?
    pub fn is_present(&self) -> bool {
        self.inner.load().is_some()
    }

    /// Discard whatever is published.
    pub fn clear(&self) -> Option<Arc<ActivePlan>> {
        self.inner.swap(None)
    }

    /// Discard `plan` only if it is still the published one.
    ///
    /// Returns true when the slot was cleared.
    pub fn retire(&self, plan: &Arc<ActivePlan>) -> bool {
        let expected = Some(Arc::clone(plan));
        let guard = self
            .inner
            .compare_and_swap(&expected, None::<Arc<ActivePlan>>);
        let previous: &Option<Arc<ActivePlan>> = &guard;
        previous
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, plan))
    }
}

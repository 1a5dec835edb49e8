//! Cadence gates: which foreground steps the executor may act on.

/// External predicate limiting how often the executor may start a cycle.
pub trait CadenceGate {
    /// Is `step` an eligible step?
    fn is_eligible_step(&mut self, step: u64) -> bool;
}

impl<F: FnMut(u64) -> bool> CadenceGate for F {
    fn is_eligible_step(&mut self, step: u64) -> bool {
        self(step)
    }
}

/// Every step is eligible.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysEligible;

impl CadenceGate for AlwaysEligible {
    fn is_eligible_step(&mut self, _step: u64) -> bool {
        true
    }
}

/// One step out of every `interval` is eligible.
#[derive(Clone, Copy, Debug)]
pub struct EveryNthStep {
    interval: u64,
}

impl EveryNthStep {
    /// Gate that opens on multiples of `interval` (an interval of 0 acts as 1)
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }
}

impl CadenceGate for EveryNthStep {
    fn is_eligible_step(&mut self, step: u64) -> bool {
        step % self.interval == 0
    }
}

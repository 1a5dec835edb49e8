//! Foreground step counter.
//!
//! Every suspension in the engine (refresh delay, executor dwell) is an
//! explicit phase recording the step it resumes at; the engine hands the
//! current step to each phase machine.

/// Monotonic foreground step counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepClock {
    now: u64,
}

impl StepClock {
    /// Clock at step zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step
    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Move to the next step and return it.
    #[inline]
    pub fn advance(&mut self) -> u64 {
        self.now += 1;
        self.now
    }
}

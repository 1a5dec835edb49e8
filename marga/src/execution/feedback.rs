//! Rejection detection on inbound traffic.

use std::sync::Arc;

use tracing::warn;

use crate::core::Vec3;
use crate::plan::PlanSlot;
use crate::transport::{Diagnostics, InboundMessage};

use super::desync::DesyncTracker;

/// Steps elapsed since the last rejection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StuckTimer {
    last_reset: Option<u64>,
}

impl StuckTimer {
    /// Timer that has never been reset
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart counting from `now`.
    pub fn reset(&mut self, now: u64) {
        self.last_reset = Some(now);
    }

    /// Steps since the last reset, or `None` if never reset.
    pub fn elapsed(&self, now: u64) -> Option<u64> {
        self.last_reset.map(|at| now.saturating_sub(at))
    }
}

/// Outcome of inspecting one inbound message.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Feedback {
    /// The authority corrected the agent; plan and tracker were discarded
    Rejected {
        /// Position the authority imposed
        position: Vec3,
    },
    /// Not a message this monitor cares about
    Ignored,
}

/// Watches for position corrections and resets the shared execution state.
pub struct FeedbackMonitor {
    slot: Arc<PlanSlot>,
    tracker: Arc<DesyncTracker>,
    diagnostics: Arc<dyn Diagnostics>,
    timer: StuckTimer,
    rejections: u64,
}

impl FeedbackMonitor {
    /// Create a monitor over the shared plan slot and tracker.
    pub fn new(
        slot: Arc<PlanSlot>,
        tracker: Arc<DesyncTracker>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            slot,
            tracker,
            diagnostics,
            timer: StuckTimer::new(),
            rejections: 0,
        }
    }

    /// Inspect an inbound message received at step `now`.
    pub fn inspect(&mut self, message: &InboundMessage, now: u64) -> Feedback {
        match message {
            InboundMessage::PositionCorrection { position } => {
                let claimed = self.tracker.get();
                self.diagnostics.warn(&format!(
                    "Position claim rejected, authority reset agent to {}",
                    position
                ));
                self.timer.reset(now);
                self.slot.clear();
                self.tracker.clear();
                self.rejections += 1;

                warn!(
                    "[Feedback] Rejection #{} at step {} (claimed {:?})",
                    self.rejections, now, claimed
                );
                Feedback::Rejected {
                    position: *position,
                }
            }
            InboundMessage::KeepAlive(_) => Feedback::Ignored,
        }
    }

    /// Rejections seen so far.
    pub fn rejections(&self) -> u64 {
        self.rejections
    }

    /// The stuck timer.
    pub fn timer(&self) -> &StuckTimer {
        &self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridCoord;
    use crate::plan::{ActivePlan, Candidate, TargetId};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl Diagnostics for Recorder {
        fn warn(&self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn test_correction_clears_plan_and_tracker() {
        let slot = Arc::new(PlanSlot::new());
        let tracker = Arc::new(DesyncTracker::new());
        let recorder = Arc::new(Recorder::default());
        let mut monitor = FeedbackMonitor::new(
            Arc::clone(&slot),
            Arc::clone(&tracker),
            Arc::clone(&recorder) as Arc<dyn Diagnostics>,
        );

        slot.publish(Some(ActivePlan::new(
            Candidate::new(TargetId(3), Vec3::new(2.0, 0.0, 0.0)),
            vec![GridCoord::new(1, 0, 0)],
        )));
        tracker.set(Vec3::new(1.5, 0.5, 0.5));

        let feedback = monitor.inspect(
            &InboundMessage::PositionCorrection {
                position: Vec3::new(0.5, 0.0, 0.5),
            },
            10,
        );

        assert!(matches!(feedback, Feedback::Rejected { .. }));
        assert!(!slot.is_present());
        assert!(!tracker.is_set());
        assert_eq!(monitor.rejections(), 1);
        assert_eq!(monitor.timer().elapsed(14), Some(4));
        assert_eq!(recorder.lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_other_messages_ignored() {
        let slot = Arc::new(PlanSlot::new());
        let tracker = Arc::new(DesyncTracker::new());
        tracker.set(Vec3::new(1.5, 0.5, 0.5));
        let mut monitor = FeedbackMonitor::new(
            Arc::clone(&slot),
            Arc::clone(&tracker),
            Arc::new(crate::transport::TracingDiagnostics),
        );

        assert_eq!(
            monitor.inspect(&InboundMessage::KeepAlive(1), 3),
            Feedback::Ignored
        );
        assert!(tracker.is_set());
        assert_eq!(monitor.timer().elapsed(3), None);
    }
}

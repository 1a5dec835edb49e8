//! Last claimed-but-unconfirmed position.
//!
//! While the tracker holds a point, every outbound position report is
//! rewritten to carry that point, whatever the agent's true position is.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::core::Vec3;
use crate::transport::{OutboundMessage, PositionReport};

/// Atomic optional point shared between the executor and the outbound path.
#[derive(Debug, Default)]
pub struct DesyncTracker {
    claimed: ArcSwapOption<Vec3>,
}

impl DesyncTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `position` as the last claim.
    pub fn set(&self, position: Vec3) {
        self.claimed.store(Some(Arc::new(position)));
    }

    /// Forget the last claim.
    pub fn clear(&self) {
        self.claimed.store(None);
    }

    /// The last claim, if any
    pub fn get(&self) -> Option<Vec3> {
        self.claimed.load().as_deref().copied()
    }

    /// Is a claim outstanding?
    pub fn is_set(&self) -> bool {
        self.claimed.load().is_some()
    }

    /// Apply the tracked claim to an outbound message.
    pub fn rewrite(&self, message: OutboundMessage) -> OutboundMessage {
        match (message, self.get()) {
            (OutboundMessage::Position(report), Some(claimed)) => {
                OutboundMessage::Position(PositionReport {
                    position: claimed,
                    ..report
                })
            }
            (message, _) => message,
        }
    }
}

//! Messages exchanged with the remote authority, and the sinks they go to.

use crate::core::Vec3;

/// A position report sent to the authority.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionReport {
    /// Claimed position
    pub position: Vec3,
    /// Whether the agent claims to be standing on ground
    pub on_ground: bool,
}

impl PositionReport {
    /// Airborne claim at `position` (what the executor sends)
    pub fn claim(position: Vec3) -> Self {
        Self {
            position,
            on_ground: false,
        }
    }
}

/// Outbound message
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundMessage {
    /// Position report (subject to desync rewriting)
    Position(PositionReport),
    /// Liveness ping; passed through untouched
    KeepAlive(u64),
}

impl OutboundMessage {
    /// Position carried by this message, if it is a position report
    pub fn position(&self) -> Option<Vec3> {
        match self {
            OutboundMessage::Position(report) => Some(report.position),
            OutboundMessage::KeepAlive(_) => None,
        }
    }
}

/// Inbound message
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    /// The authority imposes its own position on the agent
    PositionCorrection {
        /// Position the authority holds the agent at
        position: Vec3,
    },
    /// Liveness ping from the authority
    KeepAlive(u64),
}

/// Outbound message sink.
pub trait Transport {
    /// Hand one message to the wire.
    fn send(&mut self, message: OutboundMessage);
}

impl Transport for Vec<OutboundMessage> {
    fn send(&mut self, message: OutboundMessage) {
        self.push(message);
    }
}

/// Channel-backed sink; messages sent after the receiver is gone are dropped.
impl Transport for crossbeam_channel::Sender<OutboundMessage> {
    fn send(&mut self, message: OutboundMessage) {
        if crossbeam_channel::Sender::send(self, message).is_err() {
            tracing::debug!("[Transport] Receiver disconnected, dropping message");
        }
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, message: OutboundMessage) {
        (**self).send(message);
    }
}

/// Sink for human-readable notifications.
pub trait Diagnostics: Send + Sync {
    /// Report a recoverable problem.
    fn warn(&self, message: &str);
}

/// Diagnostics routed to `tracing` at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

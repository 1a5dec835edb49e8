//! Chunked claim transmission along a route.
//!
//! A route is split into chunks of at most `chunk_length` cells. When a chunk
//! is clear between its first and last voxel centers, a single claim for the
//! last center replaces the whole chunk; otherwise every cell is claimed in
//! order. Fewer claims trade against how carefully "clear" is judged, see
//! [`ChunkCheck`].

use serde::{Deserialize, Serialize};

use crate::core::{Aabb, GridCoord, Vec3};
use crate::oracle::{AgentVolume, OccupancyOracle};
use crate::transport::{OutboundMessage, PositionReport, Transport};

use super::desync::DesyncTracker;

/// How a chunk is judged clear before its intermediate cells are skipped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkCheck {
    /// One obstruction test on the box spanning the first and last centers.
    ///
    /// Coarse: the box is flat along any axis the chunk does not move on, so
    /// it can approve a shortcut whose agent volume would clip geometry.
    #[default]
    BoundingBox,
    /// Agent volume tested at points every `sample_step` along the segment.
    Swept {
        /// Distance between samples
        sample_step: f64,
    },
}

impl ChunkCheck {
    /// Is the straight move `start -> end` obstructed?
    pub fn is_obstructed<O: OccupancyOracle + ?Sized>(
        &self,
        oracle: &O,
        agent: &AgentVolume,
        start: Vec3,
        end: Vec3,
    ) -> bool {
        match *self {
            ChunkCheck::BoundingBox => oracle.is_obstructed(&Aabb::new(start, end)),
            ChunkCheck::Swept { sample_step } => {
                let length = start.distance(&end);
                let samples = (length / sample_step.max(1e-3)).ceil().max(1.0) as usize;
                (0..=samples).any(|i| {
                    let point = start.lerp(&end, i as f64 / samples as f64);
                    oracle.is_obstructed(&agent_box_at(agent, point))
                })
            }
        }
    }
}

/// Agent volume around a voxel-center point (feet half a cell below it).
fn agent_box_at(agent: &AgentVolume, center: Vec3) -> Aabb {
    let half = agent.width / 2.0;
    let feet = center.y - 0.5;
    Aabb::new(
        Vec3::new(center.x - half, feet, center.z - half),
        Vec3::new(center.x + half, feet + agent.height, center.z + half),
    )
}

/// What one `travel` call sent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TravelReport {
    /// Position claims sent
    pub claims: usize,
    /// Chunks sent as a single claim
    pub chunks_skipped: usize,
    /// Chunks sent cell by cell
    pub chunks_walked: usize,
    /// Last claimed position
    pub last_claim: Option<Vec3>,
}

impl TravelReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: &TravelReport) {
        self.claims += other.claims;
        self.chunks_skipped += other.chunks_skipped;
        self.chunks_walked += other.chunks_walked;
        if other.last_claim.is_some() {
            self.last_claim = other.last_claim;
        }
    }
}

/// Sends position claims for a route, updating the desync tracker as it goes.
pub struct Traveler<'a, O: ?Sized> {
    oracle: &'a O,
    agent: AgentVolume,
    chunk_length: usize,
    check: ChunkCheck,
}

impl<'a, O: OccupancyOracle + ?Sized> Traveler<'a, O> {
    /// Create a traveler (a chunk length of 0 acts as 1)
    pub fn new(oracle: &'a O, agent: AgentVolume, chunk_length: usize, check: ChunkCheck) -> Self {
        Self {
            oracle,
            agent,
            chunk_length: chunk_length.max(1),
            check,
        }
    }

    /// Claim the positions along `route`, in order.
    pub fn travel<T: Transport + ?Sized>(
        &self,
        route: &[GridCoord],
        tracker: &DesyncTracker,
        transport: &mut T,
    ) -> TravelReport {
        let mut report = TravelReport::default();

        for chunk in route.chunks(self.chunk_length) {
            let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
                continue;
            };
            let start = first.center();
            let end = last.center();

            if self.check.is_obstructed(self.oracle, &self.agent, start, end) {
                for cell in chunk {
                    Self::claim(cell.center(), tracker, transport, &mut report);
                }
                report.chunks_walked += 1;
            } else {
                Self::claim(end, tracker, transport, &mut report);
                report.chunks_skipped += 1;
            }
        }

        report
    }

    fn claim<T: Transport + ?Sized>(
        position: Vec3,
        tracker: &DesyncTracker,
        transport: &mut T,
        report: &mut TravelReport,
    ) {
        // Track first so the outbound rewrite carries this claim, not the previous one
        tracker.set(position);
        let message = tracker.rewrite(OutboundMessage::Position(PositionReport::claim(position)));
        transport.send(message);
        report.claims += 1;
        report.last_claim = Some(position);
    }
}

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use marga::{
    Candidate, Diagnostics, Engine, GridCoord, MargaConfig, OutboundMessage, TargetId, Vec3,
    VoxelGrid,
};

/// Cell the agent starts in for most scenarios.
pub const ORIGIN: GridCoord = GridCoord::new(0, 0, 0);

/// Wall on x in 1..=3, y in 0..=1, spanning z in -half_width..=half_width.
pub fn wall_world(half_width: i32) -> VoxelGrid {
    let mut grid = VoxelGrid::new();
    grid.fill(
        GridCoord::new(1, 0, -half_width),
        GridCoord::new(3, 1, half_width),
    );
    grid
}

/// Config with inline search so tests are deterministic.
pub fn inline_config() -> MargaConfig {
    let mut config = MargaConfig::default();
    config.refresh.background_thread = false;
    config
}

/// Single target standing in `cell`.
pub fn target_at(id: u64, cell: GridCoord) -> Candidate {
    let center = cell.center();
    Candidate::new(TargetId(id), Vec3::new(center.x, cell.y as f64, center.z))
}

/// Agent position standing in `cell`.
pub fn standing_in(cell: GridCoord) -> Vec3 {
    let center = cell.center();
    Vec3::new(center.x, cell.y as f64, center.z)
}

/// Positions carried by position reports, in send order.
pub fn claims(messages: &[OutboundMessage]) -> Vec<Vec3> {
    messages.iter().filter_map(|m| m.position()).collect()
}

/// Diagnostics sink that keeps every line.
#[derive(Default)]
pub struct RecordingDiagnostics {
    lines: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn warn(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}

/// Engine over `grid` with the given targets.
pub fn engine(config: MargaConfig, grid: VoxelGrid, targets: Vec<Candidate>) -> Engine {
    Engine::new(config, Arc::new(grid), Arc::new(targets)).unwrap()
}

/// Step `engine` with a closed gate until `done` holds, or panic after `timeout`.
pub fn step_until(
    engine: &mut Engine,
    position: Vec3,
    timeout: Duration,
    mut done: impl FnMut(&Engine) -> bool,
) {
    let deadline = Instant::now() + timeout;
    let mut sent: Vec<OutboundMessage> = Vec::new();
    while !done(engine) {
        assert!(Instant::now() < deadline, "condition not reached in time");
        engine.step(position, &mut |_: u64| false, &mut sent);
        std::thread::sleep(Duration::from_millis(1));
    }
}

//! Benchmark bounded A* on representative worlds.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use marga::{CostModel, GridCoord, Planner, PlannerConfig, VoxelGrid};

/// Floor at y = -1 with a wall band across x = 4..=5.
fn walled_floor(half_extent: i32) -> VoxelGrid {
    let mut grid = VoxelGrid::new();
    grid.fill(
        GridCoord::new(-half_extent, -1, -half_extent),
        GridCoord::new(half_extent, -1, half_extent),
    );
    grid.fill(
        GridCoord::new(4, 0, -half_extent),
        GridCoord::new(5, 2, half_extent),
    );
    grid
}

fn bench_open_grid(c: &mut Criterion) {
    let grid = VoxelGrid::new();
    let planner = Planner::new(&grid, PlannerConfig::with_max_cost(250));
    let start = GridCoord::new(0, 0, 0);

    let mut group = c.benchmark_group("open_grid");
    for distance in [5, 10, 20] {
        let goal = GridCoord::new(distance, 0, distance / 2);
        group.bench_with_input(BenchmarkId::from_parameter(distance), &goal, |b, goal| {
            b.iter(|| planner.search(black_box(start), black_box(*goal)))
        });
    }
    group.finish();
}

fn bench_wall_crossing(c: &mut Criterion) {
    let grid = walled_floor(16);
    let start = GridCoord::new(0, 0, 0);
    let goal = GridCoord::new(10, 0, 0);

    let mut group = c.benchmark_group("wall_crossing");
    for (name, model) in [
        ("squared", CostModel::SquaredEuclidean),
        ("euclidean", CostModel::Euclidean),
    ] {
        let config = PlannerConfig {
            cost_model: model,
            ..PlannerConfig::with_max_cost(250)
        };
        let planner = Planner::new(&grid, config);
        group.bench_function(name, |b| {
            b.iter(|| planner.search(black_box(start), black_box(goal)))
        });
    }
    group.finish();
}

fn bench_unreachable(c: &mut Criterion) {
    // Sealed box: the search exhausts its iteration budget
    let mut grid = VoxelGrid::new();
    grid.fill(GridCoord::new(18, -12, -2), GridCoord::new(22, 14, 2));
    grid.clear(GridCoord::new(20, 0, 0));
    grid.clear(GridCoord::new(20, 1, 0));
    let planner = Planner::new(&grid, PlannerConfig::default());

    c.bench_function("unreachable_target", |b| {
        b.iter(|| planner.search(black_box(GridCoord::new(0, 0, 0)), GridCoord::new(20, 0, 0)))
    });
}

criterion_group!(
    benches,
    bench_open_grid,
    bench_wall_crossing,
    bench_unreachable
);
criterion_main!(benches);

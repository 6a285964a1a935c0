//! # Navigation pipeline benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use nalgebra::Vector2;
use nav_lib::{
    follower::{self, PathFollower},
    geom::Pose,
    local_path::LocalPath,
    potential_field::{self, PotentialFieldPlanner, StaticObstacles},
};

/// Gentle S-bend, 5 cm between poses, in the robot frame.
fn s_bend() -> Vec<Pose> {
    (0..200)
        .map(|i| {
            let x = i as f64 * 0.05;
            let y = 0.5 * (x * 0.5).sin();
            let heading = (0.25 * (x * 0.5).cos()).atan();
            Pose::new(x, y, heading)
        })
        .collect()
}

/// A ring of obstacle points, like a lidar scan of a small room.
fn lidar_ring(count: usize, radius_m: f64) -> Vec<Vector2<f64>> {
    (0..count)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / count as f64;
            Vector2::new(radius_m * angle.cos(), radius_m * angle.sin())
        })
        .collect()
}

fn potential_field_benchmark(c: &mut Criterion) {
    let path = s_bend();

    let mut planner = PotentialFieldPlanner::new(
        potential_field::Params::default(),
        Box::new(StaticObstacles::new(lidar_ring(360, 1.5))),
    )
    .unwrap();

    c.bench_function("PotentialFieldPlanner::plan", |b| {
        b.iter(|| match planner.plan(LocalPath::from_poses(path.clone())).unwrap() {
            LocalPath::Path(iter) => iter.count(),
            _ => 0,
        })
    });

    let mut follower = PathFollower::new(follower::Params::default()).unwrap();

    c.bench_function("PotentialFieldPlanner::plan + PathFollower::plan", |b| {
        b.iter(|| {
            let deformed = planner.plan(LocalPath::from_poses(path.clone())).unwrap();
            follower.plan(deformed)
        })
    });
}

criterion_group!(benches, potential_field_benchmark);
criterion_main!(benches);

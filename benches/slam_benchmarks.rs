//! Estimator benchmarks.
//!
//! Benchmarks for the CPU-heavy paths:
//! - One full `update` step (predict, weight, trim, map write)
//! - Ancestry-walking map lookups
//!
//! Run with: `cargo bench`
//! View HTML reports in: `target/criterion/`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::f32::consts::TAU;

use dp_slam::{
    BeamModelConfig, Control, DpSlam, DpSlamConfig, LaserScan, MotionModelConfig, Pose2D,
};

const SCAN_SIZE: usize = 180;

/// Simulate a scan of a square room of half-extent 4 around `pose`.
fn simulate_scan(pose: &Pose2D) -> LaserScan {
    let increment = TAU / SCAN_SIZE as f32;
    let ranges = (0..SCAN_SIZE)
        .map(|i| {
            let angle = pose.theta + i as f32 * increment;
            let (sin_a, cos_a) = angle.sin_cos();
            let mut t = f32::INFINITY;
            if cos_a.abs() > 1e-6 {
                t = t.min((4.0 * cos_a.signum() - pose.x) / cos_a);
            }
            if sin_a.abs() > 1e-6 {
                t = t.min((4.0 * sin_a.signum() - pose.y) / sin_a);
            }
            t
        })
        .collect();
    LaserScan::new(ranges)
}

fn bench_config(num_particles: usize) -> DpSlamConfig {
    DpSlamConfig {
        num_particles,
        seed: 42,
        motion: MotionModelConfig::low_noise(),
        sensor: BeamModelConfig {
            variance: 0.05,
            max_range: 12.0,
            samples: 30,
            scan_size: SCAN_SIZE,
        },
        ..Default::default()
    }
}

fn bench_update_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_step");

    for &num_particles in &[10usize, 50] {
        group.bench_function(format!("{}_particles", num_particles), |b| {
            let mut slam = DpSlam::new(bench_config(num_particles)).unwrap();
            let mut odom = Pose2D::identity();

            // Rotate in place so the robot stays inside the simulated
            // room no matter how many iterations the harness runs.
            b.iter(|| {
                let last = odom;
                odom = Pose2D::new(0.0, 0.0, odom.theta + 0.01);
                let scan = simulate_scan(&odom);
                slam.update(black_box(&Control::new(odom, last)), black_box(&scan));
            });
        });
    }

    group.finish();
}

fn bench_map_lookup(c: &mut Criterion) {
    // Build a populated map, then hammer ancestry-walking lookups.
    let mut slam = DpSlam::new(bench_config(50)).unwrap();
    let mut odom = Pose2D::identity();
    for _ in 0..20 {
        let last = odom;
        odom = Pose2D::new(odom.x + 0.02, odom.y, odom.theta + 0.01);
        let scan = simulate_scan(&odom);
        slam.update(&Control::new(odom, last), &scan);
    }

    c.bench_function("region_sample_20x20", |b| {
        b.iter(|| black_box(slam.sample(-10, 10, -10, 10)));
    });
}

criterion_group!(benches, bench_update_step, bench_map_lookup);
criterion_main!(benches);

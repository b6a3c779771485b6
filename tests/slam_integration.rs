//! End-to-end estimator tests.
//!
//! Runs the full predict → weight → resample/trim → map-write cycle
//! against a simulated square room and verifies the structural
//! invariants the ancestry-shared map depends on.

use std::collections::{HashMap, HashSet};

use dp_slam::{
    BeamModelConfig, Control, DpSlam, DpSlamConfig, LaserScan, MotionModelConfig, NodeId, Pose2D,
};

const SCAN_SIZE: usize = 16;
/// Half-extent of the simulated square room.
const ROOM: f32 = 4.0;

fn test_config(num_particles: usize, seed: u64) -> DpSlamConfig {
    DpSlamConfig {
        num_particles,
        seed,
        motion: MotionModelConfig::low_noise(),
        sensor: BeamModelConfig {
            variance: 0.05,
            max_range: 10.0,
            samples: SCAN_SIZE,
            scan_size: SCAN_SIZE,
        },
        ..Default::default()
    }
}

/// Range from `pose` to the room walls along one beam direction.
fn wall_range(pose: &Pose2D, angle: f32) -> f32 {
    let (sin_a, cos_a) = angle.sin_cos();
    let mut t = f32::INFINITY;
    if cos_a > 1e-6 {
        t = t.min((ROOM - pose.x) / cos_a);
    } else if cos_a < -1e-6 {
        t = t.min((-ROOM - pose.x) / cos_a);
    }
    if sin_a > 1e-6 {
        t = t.min((ROOM - pose.y) / sin_a);
    } else if sin_a < -1e-6 {
        t = t.min((-ROOM - pose.y) / sin_a);
    }
    t
}

/// Simulate one noiseless scan of the square room.
fn simulate_scan(pose: &Pose2D) -> LaserScan {
    let increment = std::f32::consts::TAU / SCAN_SIZE as f32;
    let ranges = (0..SCAN_SIZE)
        .map(|i| wall_range(pose, pose.theta + i as f32 * increment))
        .collect();
    LaserScan::new(ranges)
}

fn still_control() -> Control {
    Control::new(Pose2D::identity(), Pose2D::identity())
}

/// Check the structural invariants of the tree and map.
fn assert_invariants(slam: &DpSlam) {
    let tree = slam.tree();
    let map = slam.map();

    // Recount children from parent links.
    let mut child_counts: HashMap<NodeId, u32> = HashMap::new();
    for id in tree.ids() {
        if let Some(parent) = tree.get(id).unwrap().parent {
            *child_counts.entry(parent).or_default() += 1;
        }
    }

    let particle_set: HashSet<NodeId> = slam.particles().iter().copied().collect();
    for id in tree.ids() {
        let node = tree.get(id).unwrap();
        assert_eq!(
            node.children,
            child_counts.get(&id).copied().unwrap_or(0),
            "stored child count disagrees with parent links at node {id}"
        );
        assert_eq!(
            node.leaf,
            particle_set.contains(&id),
            "leaf flag disagrees with the particle set at node {id}"
        );
        if node.parent.is_some() {
            assert!(
                node.children > 0 || node.leaf,
                "dead branch survived trimming at node {id}"
            );
        }

        // Every recorded cell edit is present in the map.
        for &(cx, cy) in &node.modified_cells {
            assert!(
                map.lookup_by_id(cx, cy, id).is_some(),
                "node {id} lists ({cx},{cy}) but the map has no entry"
            );
        }
    }

    // Along any root-to-leaf path a cell is written at most once.
    let mut rows: HashMap<(i32, i32), Vec<NodeId>> = HashMap::new();
    for (cx, cy, id, _) in map.entries() {
        rows.entry((cx, cy)).or_default().push(id);
    }
    for &particle in slam.particles() {
        let ancestry: HashSet<NodeId> = tree.ancestors(particle).collect();
        for (cell, ids) in &rows {
            let writers = ids.iter().filter(|&id| ancestry.contains(id)).count();
            assert!(
                writers <= 1,
                "cell {cell:?} written by {writers} ancestors of particle {particle}"
            );
        }
    }

    // Normalized weights.
    let sum: f64 = slam.weights().iter().sum();
    assert!((sum - 1.0).abs() < 1e-6, "weight sum {sum}");
    assert!(slam.weights().iter().all(|&w| w >= 0.0));
}

#[test]
fn test_invariants_hold_across_updates() {
    let mut slam = DpSlam::new(test_config(20, 42)).unwrap();
    let mut odom = Pose2D::identity();

    for step in 0..15u64 {
        // Drive a slow arc around the room center.
        let last = odom;
        odom = Pose2D::new(
            odom.x + 0.1 * odom.theta.cos(),
            odom.y + 0.1 * odom.theta.sin(),
            odom.theta + 0.05,
        );
        let scan = simulate_scan(&odom);

        slam.update(&Control::new(odom, last), &scan);
        assert_invariants(&slam);
        assert_eq!(slam.state().iterations, step + 1);
    }

    assert!(slam.map().cell_count() > 0, "map should have been built");
}

#[test]
fn test_still_robot_with_empty_scans_is_a_no_op() {
    let mut slam = DpSlam::new(test_config(10, 7)).unwrap();
    let empty = LaserScan::new(vec![0.0; SCAN_SIZE]);

    for _ in 0..5 {
        slam.update(&still_control(), &empty);
    }

    assert_eq!(slam.map().cell_count(), 0);
    for &id in slam.particles() {
        assert_eq!(slam.tree().pose(id), Pose2D::identity());
    }
    assert_eq!(slam.estimate(), Pose2D::identity());
    assert_invariants(&slam);
}

#[test]
fn test_stationary_mapping_marks_the_walls() {
    let mut slam = DpSlam::new(test_config(8, 13)).unwrap();
    let scan = simulate_scan(&Pose2D::identity());

    for _ in 0..4 {
        slam.update(&still_control(), &scan);
    }

    let snapshot = slam.sample(-6, 6, -6, 6);
    // Beam 0 hits the +X wall at range 4, landing in cell (4, 0).
    assert!(snapshot.is_occupied(4, 0));
    // The straight path to it stays free.
    assert!(!snapshot.is_occupied(0, 0));
    assert!(!snapshot.is_occupied(2, 0));
    assert_invariants(&slam);
}

#[test]
fn test_tree_stays_bounded_under_resampling() {
    let mut slam = DpSlam::new(test_config(16, 99)).unwrap();
    let mut odom = Pose2D::identity();

    for _ in 0..25 {
        let last = odom;
        odom = Pose2D::new(odom.x + 0.05, odom.y, odom.theta);
        slam.update(&Control::new(odom, last), &simulate_scan(&odom));
    }

    // A Steiner tree over n leaves has at most n - 1 interior nodes
    // besides the root; trimming order can leave one extra unfolded
    // node per lineage until the next pass.
    let n = slam.particles().len();
    assert!(
        slam.tree().len() <= 3 * n,
        "tree of {} nodes for {} particles",
        slam.tree().len(),
        n
    );
    assert_invariants(&slam);
}

#[test]
fn test_pose_estimate_stays_in_the_room() {
    let mut slam = DpSlam::new(test_config(20, 3)).unwrap();
    let mut odom = Pose2D::identity();

    for _ in 0..10 {
        let last = odom;
        odom = Pose2D::new(odom.x + 0.1, odom.y, odom.theta);
        slam.update(&Control::new(odom, last), &simulate_scan(&odom));
    }

    let estimate = slam.estimate();
    assert!(estimate.x.abs() < ROOM && estimate.y.abs() < ROOM);
    // Odometry travelled 1.0 in +X; the estimate should be in that
    // neighborhood even with motion noise.
    assert!(
        (estimate.x - 1.0).abs() < 0.5,
        "estimate drifted to {:?}",
        estimate
    );
}

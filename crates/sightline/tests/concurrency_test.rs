//! # Concurrency Tests
//!
//! Ticks running back to back on one thread while another thread keeps
//! registering and unregistering objects.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use common::{camera, system, TestBox, TestNode, TestScene};
use sightline::{CullingConfig, ObjectId, TickOutcome, Vec3};

fn box_of(node: &TestNode) -> &Arc<TestBox> {
    node.visual.as_ref().expect("node has a visual")
}

/// Alternates in front of and behind a camera at the origin looking +Z.
fn position(i: usize) -> Vec3 {
    let depth = 50.0 + (i % 100) as f32;
    if i % 2 == 0 {
        Vec3::new(0.0, 0.0, depth)
    } else {
        Vec3::new(0.0, 0.0, -depth)
    }
}

/// Test: Churn during ticks never corrupts the registry or a report.
#[test]
fn test_ticks_interleaved_with_churn() {
    let scene = TestScene::new(Vec3::new(0.0, 0.0, -500.0));
    let mut live: Vec<(usize, Arc<TestNode>, ObjectId)> = Vec::new();
    let config = CullingConfig {
        batch_size: 16,
        ..CullingConfig::default()
    };
    let system = system(&scene, camera(Vec3::ZERO, Vec3::Z), config);

    let stop = AtomicBool::new(false);
    let mut issued = Vec::new();
    let mut removed = Vec::new();

    let completed = thread::scope(|s| {
        let ticker = s.spawn(|| {
            let mut completed = 0usize;
            loop {
                match system.tick() {
                    TickOutcome::Completed(report) => {
                        assert_eq!(report.failed_batches, 0);
                        assert_eq!(report.visible + report.hidden + report.discarded, report.objects);
                        completed += 1;
                    }
                    TickOutcome::Skipped => {}
                    TickOutcome::Cancelled => panic!("nobody cancelled"),
                }
                if stop.load(Ordering::SeqCst) {
                    break completed;
                }
            }
        });

        for i in 0..600 {
            let node = scene.spawn(position(i));
            let id = system.register_object(node.as_ref()).unwrap();
            issued.push(id);
            live.push((i, node, id));

            if i % 3 == 0 {
                let (_, node, id) = live.remove(0);
                let handle = box_of(&node).handle();
                assert_eq!(system.unregister_object(&handle), Some(id));
                scene.despawn(&node);
                removed.push(id);
            }
        }

        stop.store(true, Ordering::SeqCst);
        ticker.join().unwrap()
    });
    assert!(completed > 0);

    // Ids strictly increase and are never reused.
    assert!(issued.windows(2).all(|w| w[0] < w[1]));

    let registry = system.pipeline().registry();
    assert_eq!(system.object_count(), live.len());
    for id in &removed {
        assert!(!registry.contains(*id));
        assert!(registry.spatial(*id).is_none());
    }
    for (_, _, id) in &live {
        assert!(registry.contains(*id));
        assert!(registry.spatial(*id).is_some());
    }

    // A quiet tick settles every survivor.
    match system.tick() {
        TickOutcome::Completed(report) => assert_eq!(report.discarded, 0),
        other => panic!("tick did not complete: {other:?}"),
    }
    for (i, node, _) in &live {
        assert_eq!(box_of(node).enabled(), i % 2 == 0, "object {i}");
    }
}

/// Test: Overlapping tick requests are skipped, not queued.
#[test]
fn test_parallel_tick_requests_never_overlap() {
    let scene = TestScene::new(Vec3::new(0.0, 0.0, -500.0));
    for i in 0..2_000 {
        scene.spawn(position(i));
    }
    let system = system(&scene, camera(Vec3::ZERO, Vec3::Z), CullingConfig::default());

    let outcomes: Vec<TickOutcome> = thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| system.tick())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let completed = outcomes
        .iter()
        .filter(|o| matches!(o, TickOutcome::Completed(_)))
        .count();
    assert!(completed >= 1);
    assert_eq!(system.pipeline().tick_count(), completed as u64);
    assert!(!system.pipeline().is_in_flight());
}

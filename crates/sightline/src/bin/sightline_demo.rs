//! # Sightline Demo
//!
//! Headless run over a synthetic scene:
//!
//! - A few thousand crates drift around a square arena
//! - The camera orbits the arena center, looking inwards
//! - The player walks a small circle near the center
//!
//! The tokio driver culls on its own interval while the main task moves
//! things around. Tick summaries are logged through `tracing`.
//!
//! Run with: `RUST_LOG=info cargo run -p sightline --features demo --bin sightline_demo [config.toml]`

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sightline::core::same_visual;
use sightline::{
    Aabb, Anchor, CullingConfig, CullingSystem, PerspectiveCamera, Scene, SceneObject, Scope,
    TrackedAnchor, Vec3, Visual, VisualHandle,
};

/// Crates in the arena.
const CRATE_COUNT: usize = 5_000;

/// Half-width of the arena.
const ARENA_HALF_SIZE: f32 = 1_200.0;

/// How long the demo runs.
const RUN_TIME: Duration = Duration::from_secs(5);

/// Main-task step.
const FRAME: Duration = Duration::from_millis(16);

struct DemoCrate {
    position: RwLock<Vec3>,
    velocity: Vec3,
    half_size: f32,
    drawn: AtomicBool,
}

impl DemoCrate {
    fn step(&self, dt: f32) {
        let mut position = self.position.write();
        let mut next = *position + self.velocity * dt;
        // Wrap around the arena edges
        if next.x.abs() > ARENA_HALF_SIZE {
            next.x = -next.x.signum() * ARENA_HALF_SIZE;
        }
        if next.z.abs() > ARENA_HALF_SIZE {
            next.z = -next.z.signum() * ARENA_HALF_SIZE;
        }
        *position = next;
    }
}

impl Visual for DemoCrate {
    fn bounds(&self) -> Aabb {
        Aabb::new(*self.position.read(), Vec3::splat(self.half_size))
    }

    fn position(&self) -> Vec3 {
        *self.position.read()
    }

    fn set_enabled(&self, enabled: bool) {
        self.drawn.store(enabled, Ordering::Relaxed);
    }
}

struct Node {
    visual: Arc<DemoCrate>,
    is_static: bool,
}

impl SceneObject for Node {
    fn visual(&self) -> Option<VisualHandle> {
        Some(self.visual.clone())
    }

    fn is_static(&self) -> bool {
        self.is_static
    }
}

struct Arena {
    nodes: Vec<Arc<Node>>,
    player: Arc<TrackedAnchor>,
}

impl Arena {
    fn generate(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let nodes = (0..CRATE_COUNT)
            .map(|_| {
                // One in four crates never moves
                let is_static = rng.gen_bool(0.25);
                let velocity = if is_static {
                    Vec3::ZERO
                } else {
                    Vec3::new(rng.gen_range(-20.0..20.0), 0.0, rng.gen_range(-20.0..20.0))
                };
                let position = Vec3::new(
                    rng.gen_range(-ARENA_HALF_SIZE..ARENA_HALF_SIZE),
                    rng.gen_range(0.0..10.0),
                    rng.gen_range(-ARENA_HALF_SIZE..ARENA_HALF_SIZE),
                );
                Arc::new(Node {
                    visual: Arc::new(DemoCrate {
                        position: RwLock::new(position),
                        velocity,
                        half_size: rng.gen_range(0.5..3.0),
                        drawn: AtomicBool::new(true),
                    }),
                    is_static,
                })
            })
            .collect();

        Self {
            nodes,
            player: Arc::new(TrackedAnchor::new(Vec3::new(0.0, 1.0, 0.0))),
        }
    }

    fn step(&self, dt: f32) {
        for node in self.nodes.iter().filter(|n| !n.is_static) {
            node.visual.step(dt);
        }
    }

    fn drawn(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.visual.drawn.load(Ordering::Relaxed))
            .count()
    }
}

impl Scope for Arena {
    fn contains(&self, visual: &VisualHandle) -> bool {
        self.nodes.iter().any(|n| {
            let handle: VisualHandle = n.visual.clone();
            same_visual(&handle, visual)
        })
    }
}

impl Scene for Arena {
    fn objects(&self) -> Vec<Arc<dyn SceneObject>> {
        self.nodes
            .iter()
            .map(|n| Arc::clone(n) as Arc<dyn SceneObject>)
            .collect()
    }

    fn find_tagged(&self, tag: &str) -> Option<Arc<dyn Anchor>> {
        (tag == "Player").then(|| Arc::clone(&self.player) as Arc<dyn Anchor>)
    }
}

fn load_config() -> CullingConfig {
    let Some(path) = std::env::args().nth(1) else {
        return CullingConfig {
            log_interval_ticks: 5,
            ..CullingConfig::default()
        };
    };
    match CullingConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Falling back to defaults: {}", e);
            CullingConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Sightline demo: {} crates", CRATE_COUNT);

    let arena = Arc::new(Arena::generate(0x5167_4c1e));
    let camera = Arc::new(PerspectiveCamera::default());

    let system = match CullingSystem::builder()
        .config(load_config())
        .scene(arena.clone())
        .camera(camera.clone())
        .build()
    {
        Ok(system) => system,
        Err(e) => {
            tracing::error!("Culling system failed to start: {}", e);
            return;
        }
    };

    let driver = system.spawn_driver();
    let dt = FRAME.as_secs_f32();
    let frames = RUN_TIME.as_millis() / FRAME.as_millis();
    let mut time = 0.0f32;

    for frame in 0..frames {
        time += dt;
        arena.step(dt);

        let orbit = time * 0.2 * TAU;
        let eye = Vec3::new(orbit.cos() * 600.0, 40.0, orbit.sin() * 600.0);
        camera.look(eye, (Vec3::ZERO - eye).normalize_or_zero());
        arena
            .player
            .set_position(Vec3::new((time * 0.5).cos() * 20.0, 1.0, (time * 0.5).sin() * 20.0));

        if frame % 60 == 0 {
            tracing::info!(
                "Frame {}: {} of {} crates drawn",
                frame,
                arena.drawn(),
                system.object_count()
            );
        }
        tokio::time::sleep(FRAME).await;
    }

    driver.shutdown().await;

    match system.last_report() {
        Some(report) => tracing::info!(
            "Demo finished after {} ticks, last tick culled {:.1}% in {:?}",
            report.tick,
            report.cull_ratio() * 100.0,
            report.duration
        ),
        None => tracing::warn!("Demo finished without a completed tick"),
    }
}

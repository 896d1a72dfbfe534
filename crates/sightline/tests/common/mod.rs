//! Shared test scene.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use sightline::core::same_visual;
use sightline::{
    Aabb, Anchor, Camera, CullingConfig, CullingSystem, PerspectiveCamera, Scene, SceneObject,
    Scope, TrackedAnchor, Vec3, Visual, VisualHandle,
};

/// A box the tests can move and inspect.
pub struct TestBox {
    center: RwLock<Vec3>,
    extents: Vec3,
    enabled: AtomicBool,
    toggles: AtomicUsize,
}

impl TestBox {
    pub fn new(center: Vec3, extents: Vec3) -> Arc<Self> {
        Arc::new(Self {
            center: RwLock::new(center),
            extents,
            enabled: AtomicBool::new(true),
            toggles: AtomicUsize::new(0),
        })
    }

    pub fn move_to(&self, center: Vec3) {
        *self.center.write() = center;
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn toggles(&self) -> usize {
        self.toggles.load(Ordering::SeqCst)
    }

    pub fn handle(self: &Arc<Self>) -> VisualHandle {
        self.clone()
    }
}

impl Visual for TestBox {
    fn bounds(&self) -> Aabb {
        Aabb::new(*self.center.read(), self.extents)
    }

    fn position(&self) -> Vec3 {
        *self.center.read()
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        self.toggles.fetch_add(1, Ordering::SeqCst);
    }
}

/// A scene node.
pub struct TestNode {
    pub visual: Option<Arc<TestBox>>,
    pub is_static: bool,
}

impl SceneObject for TestNode {
    fn visual(&self) -> Option<VisualHandle> {
        self.visual.clone().map(|v| v as VisualHandle)
    }

    fn is_static(&self) -> bool {
        self.is_static
    }
}

/// A flat scene with a tagged player.
pub struct TestScene {
    nodes: RwLock<Vec<Arc<TestNode>>>,
    /// Visuals in the hierarchy that are not scanned.
    adopted: RwLock<Vec<VisualHandle>>,
    pub player: Arc<TrackedAnchor>,
}

impl TestScene {
    pub fn new(player: Vec3) -> Arc<Self> {
        Arc::new(Self {
            nodes: RwLock::new(Vec::new()),
            adopted: RwLock::new(Vec::new()),
            player: Arc::new(TrackedAnchor::new(player)),
        })
    }

    /// Adds a dynamic unit box to the hierarchy.
    pub fn spawn(&self, center: Vec3) -> Arc<TestNode> {
        self.spawn_with(center, Vec3::ONE, false)
    }

    pub fn spawn_with(&self, center: Vec3, extents: Vec3, is_static: bool) -> Arc<TestNode> {
        let node = Arc::new(TestNode {
            visual: Some(TestBox::new(center, extents)),
            is_static,
        });
        self.nodes.write().push(node.clone());
        node
    }

    /// Puts a foreign visual under the hierarchy without a scene node.
    pub fn adopt(&self, visual: VisualHandle) {
        self.adopted.write().push(visual);
    }

    /// Removes a node from the hierarchy.
    pub fn despawn(&self, node: &Arc<TestNode>) {
        self.nodes.write().retain(|n| !Arc::ptr_eq(n, node));
    }
}

impl Scope for TestScene {
    fn contains(&self, visual: &VisualHandle) -> bool {
        self.nodes
            .read()
            .iter()
            .filter_map(|n| n.visual())
            .any(|v| same_visual(&v, visual))
            || self.adopted.read().iter().any(|v| same_visual(v, visual))
    }
}

impl Scene for TestScene {
    fn objects(&self) -> Vec<Arc<dyn SceneObject>> {
        self.nodes
            .read()
            .iter()
            .map(|n| Arc::clone(n) as Arc<dyn SceneObject>)
            .collect()
    }

    fn find_tagged(&self, tag: &str) -> Option<Arc<dyn Anchor>> {
        (tag == "Player").then(|| Arc::clone(&self.player) as Arc<dyn Anchor>)
    }
}

/// Camera at `eye` looking along `forward` with the default lens.
pub fn camera(eye: Vec3, forward: Vec3) -> Arc<PerspectiveCamera> {
    let camera = Arc::new(PerspectiveCamera::default());
    camera.look(eye, forward);
    camera
}

/// Builds a system over `scene`.
pub fn system(scene: &Arc<TestScene>, camera: Arc<PerspectiveCamera>, config: CullingConfig) -> CullingSystem {
    let camera: Arc<dyn Camera> = camera;
    CullingSystem::builder()
        .config(config)
        .scene(scene.clone())
        .camera(camera)
        .build()
        .expect("system builds")
}

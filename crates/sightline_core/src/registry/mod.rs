//! # Object Registry
//!
//! Owns the set of participating objects.
//!
//! ## Copy-on-write
//!
//! ```text
//!   add/remove ──▶ clone current set ──▶ modify copy ──▶ publish new Arc
//!                                                            │
//!   snapshot_all() ─────────────── Arc::clone ◀──────────────┘
//! ```
//!
//! A tick holds the `Arc` it got from [`ObjectRegistry::snapshot_all`] for
//! its whole duration. Later mutations publish a new version and never
//! touch the one the tick is reading, so no reader ever sees a half-built
//! or half-removed object.

mod object;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{RegistrationError, RegistrationResult};
use crate::scene::{same_visual, Scope, VisualHandle};

pub use object::{CullableObject, ObjectId, SpatialCache};

/// One immutable version of the registered object set.
#[derive(Clone, Debug, Default)]
pub struct RegistrySnapshot {
    objects: Vec<Arc<CullableObject>>,
    index: HashMap<ObjectId, usize>,
}

impl RegistrySnapshot {
    fn from_objects(objects: Vec<Arc<CullableObject>>) -> Self {
        let index = objects.iter().enumerate().map(|(i, o)| (o.id(), i)).collect();
        Self { objects, index }
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if no objects are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in registration order.
    #[must_use]
    pub fn objects(&self) -> &[Arc<CullableObject>] {
        &self.objects
    }

    /// Iterates objects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CullableObject>> {
        self.objects.iter()
    }

    /// Looks up an object by id.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&Arc<CullableObject>> {
        self.index.get(&id).map(|&i| &self.objects[i])
    }

    /// Looks up the object wrapping `visual`.
    #[must_use]
    pub fn find_visual(&self, visual: &VisualHandle) -> Option<&Arc<CullableObject>> {
        self.objects.iter().find(|o| same_visual(o.visual(), visual))
    }
}

/// Thread-safe registry of cullable objects.
pub struct ObjectRegistry {
    /// Hierarchy every registered visual must belong to.
    scope: Arc<dyn Scope>,
    /// Next id to hand out. Never decremented.
    next_id: AtomicU64,
    /// Current published version.
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl ObjectRegistry {
    /// Creates an empty registry owned by `scope`.
    #[must_use]
    pub fn new(scope: Arc<dyn Scope>) -> Self {
        Self {
            scope,
            next_id: AtomicU64::new(0),
            current: RwLock::new(Arc::new(RegistrySnapshot::default())),
        }
    }

    /// Registers a visual.
    ///
    /// The visual is disabled immediately; the next tick decides whether it
    /// becomes visible. Host callbacks run before the write lock is taken,
    /// so a visual or scope may call back into the registry.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::OutsideScope`] if the visual is not part of the
    ///   owning hierarchy.
    /// - [`RegistrationError::AlreadyRegistered`] if it is tracked already.
    /// - [`RegistrationError::InvalidBounds`] if its position or bounds are
    ///   NaN or infinite.
    ///
    /// Either way the registry is left untouched.
    pub fn add(&self, visual: VisualHandle, is_static: bool) -> RegistrationResult<ObjectId> {
        if !self.scope.contains(&visual) {
            tracing::warn!("Rejected registration: visual is outside the managed hierarchy");
            return Err(RegistrationError::OutsideScope);
        }
        reject_duplicate(&self.snapshot_all(), &visual)?;

        let spatial = SpatialCache::capture(visual.as_ref());
        if !spatial.is_finite() {
            tracing::warn!("Rejected registration: visual reported non-finite bounds");
            return Err(RegistrationError::InvalidBounds);
        }
        visual.set_enabled(false);

        let mut current = self.current.write();
        // A concurrent add of the same visual may have won since the check above.
        reject_duplicate(&current, &visual)?;

        let id = self.allocate_id();
        let object = Arc::new(CullableObject::with_spatial(id, visual, is_static, spatial));

        let mut objects = current.objects.clone();
        objects.push(object);
        *current = Arc::new(RegistrySnapshot::from_objects(objects));
        drop(current);

        tracing::debug!("Registered object {} (static: {})", id, is_static);
        Ok(id)
    }

    /// Registers many visuals with a single rebuild.
    ///
    /// Used by the initial scene scan. Visuals that fail the same checks as
    /// [`ObjectRegistry::add`] are skipped and logged.
    pub fn add_many(&self, visuals: impl IntoIterator<Item = (VisualHandle, bool)>) -> Vec<ObjectId> {
        let existing = self.snapshot_all();
        let mut candidates: Vec<(VisualHandle, bool, SpatialCache)> = Vec::new();

        for (visual, is_static) in visuals {
            if !self.scope.contains(&visual) {
                tracing::warn!("Skipped scanned visual outside the managed hierarchy");
                continue;
            }
            if existing.find_visual(&visual).is_some()
                || candidates.iter().any(|(v, _, _)| same_visual(v, &visual))
            {
                tracing::warn!("Skipped duplicate scanned visual");
                continue;
            }
            let spatial = SpatialCache::capture(visual.as_ref());
            if !spatial.is_finite() {
                tracing::warn!("Skipped scanned visual with non-finite bounds");
                continue;
            }
            visual.set_enabled(false);
            candidates.push((visual, is_static, spatial));
        }

        let mut current = self.current.write();
        let mut objects = current.objects.clone();
        let mut added = Vec::with_capacity(candidates.len());

        for (visual, is_static, spatial) in candidates {
            if current.find_visual(&visual).is_some() {
                continue;
            }
            let id = self.allocate_id();
            objects.push(Arc::new(CullableObject::with_spatial(id, visual, is_static, spatial)));
            added.push(id);
        }

        *current = Arc::new(RegistrySnapshot::from_objects(objects));
        drop(current);

        tracing::debug!("Registered {} scanned objects", added.len());
        added
    }

    /// Removes the object wrapping `visual`.
    ///
    /// Returns the removed id, or `None` if the visual was not registered.
    /// Snapshots taken earlier keep seeing the object until dropped.
    pub fn remove(&self, visual: &VisualHandle) -> Option<ObjectId> {
        let mut current = self.current.write();
        let id = current.find_visual(visual)?.id();

        let objects = current
            .objects
            .iter()
            .filter(|o| o.id() != id)
            .cloned()
            .collect();
        *current = Arc::new(RegistrySnapshot::from_objects(objects));
        drop(current);

        tracing::debug!("Unregistered object {}", id);
        Some(id)
    }

    /// Returns the current object set.
    #[must_use]
    pub fn snapshot_all(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Drops every object and its cache.
    pub fn clear(&self) {
        let removed = {
            let mut current = self.current.write();
            let removed = current.len();
            *current = Arc::new(RegistrySnapshot::default());
            removed
        };
        tracing::debug!("Registry cleared ({} objects released)", removed);
    }

    /// Number of registered objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Returns true if `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.current.read().get(id).is_some()
    }

    /// Cached spatial data of a registered object.
    #[must_use]
    pub fn spatial(&self, id: ObjectId) -> Option<SpatialCache> {
        self.current.read().get(id).map(|o| o.spatial())
    }

    /// The id the next registration will receive.
    #[must_use]
    pub fn next_id(&self) -> ObjectId {
        ObjectId::new(self.next_id.load(Ordering::Acquire))
    }

    fn allocate_id(&self) -> ObjectId {
        ObjectId::new(self.next_id.fetch_add(1, Ordering::AcqRel))
    }
}

fn reject_duplicate(snapshot: &RegistrySnapshot, visual: &VisualHandle) -> RegistrationResult<()> {
    match snapshot.find_visual(visual) {
        Some(existing) => {
            let id = existing.id();
            tracing::warn!("Rejected registration: visual already registered as {}", id);
            Err(RegistrationError::AlreadyRegistered(id))
        }
        None => Ok(()),
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("len", &self.len())
            .field("next_id", &self.next_id())
            .finish_non_exhaustive()
    }
}

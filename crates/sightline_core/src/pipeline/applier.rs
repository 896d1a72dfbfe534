//! Decision applier.
//!
//! Runs on one thread after the evaluation barrier. Decisions are looked
//! up against the registry as it is *now*, not as it was when the tick
//! started: an object removed mid-tick is simply not found and its
//! decision is dropped.

use crate::registry::RegistrySnapshot;

use super::evaluator::CullingTask;

/// Counts from one apply pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Objects set visible.
    pub visible: usize,
    /// Objects set hidden.
    pub hidden: usize,
    /// Objects whose decision differs from the previous tick.
    pub changed: usize,
    /// Decisions for objects no longer registered.
    pub discarded: usize,
    /// Tasks left undecided by a failed batch.
    pub undecided: usize,
}

/// Writes every decided task back to its object's visual.
pub fn apply_decisions(tasks: &[CullingTask], registry: &RegistrySnapshot) -> ApplySummary {
    let mut summary = ApplySummary::default();

    for task in tasks {
        let Some(visible) = task.decision else {
            summary.undecided += 1;
            continue;
        };
        let Some(object) = registry.get(task.id) else {
            summary.discarded += 1;
            continue;
        };

        let previous = object.set_desired_visible(visible);
        object.visual().set_enabled(visible);

        if previous != visible {
            summary.changed += 1;
        }
        if visible {
            summary.visible += 1;
        } else {
            summary.hidden += 1;
        }
    }

    summary
}

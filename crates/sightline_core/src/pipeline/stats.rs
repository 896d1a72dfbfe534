//! Culling statistics.

use std::time::Duration;

/// Statistics from one completed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Objects in the tick's registry snapshot.
    pub objects: usize,
    /// Dynamic objects whose bounds were re-read.
    pub refreshed: usize,
    /// Batches dispatched.
    pub batches: usize,
    /// Batches that panicked and kept their previous decisions.
    pub failed_batches: usize,
    /// Objects set visible.
    pub visible: usize,
    /// Objects set hidden.
    pub hidden: usize,
    /// Objects whose decision flipped this tick.
    pub changed: usize,
    /// Decisions dropped because the object was removed mid-tick.
    pub discarded: usize,
    /// Wall time from snapshot to the end of apply.
    pub duration: Duration,
}

impl TickReport {
    /// Fraction of applied objects that were hidden, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cull_ratio(&self) -> f32 {
        let applied = self.visible + self.hidden;
        if applied == 0 {
            0.0
        } else {
            self.hidden as f32 / applied as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cull_ratio() {
        let report = TickReport {
            visible: 25,
            hidden: 75,
            ..TickReport::default()
        };
        assert!((report.cull_ratio() - 0.75).abs() < 1e-6);
        assert_eq!(TickReport::default().cull_ratio(), 0.0);
    }
}

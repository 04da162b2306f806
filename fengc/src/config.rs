//! Garbage collector tuning knobs.
//!
//! Trimmed down from the shape of `fgc::config::GcConfig` — this collector
//! is single-threaded stop-the-world mark-sweep, so there is no pause-time
//! budget or region sizing to configure, only the threshold growth policy.

/// Growth factor applied to `next_gc` after each collection, matching the
/// reference collector's `GROW_FACTOR`.
pub const GROW_FACTOR: f64 = 2.0;

#[derive(Clone, Debug)]
pub struct GcConfig {
    /// Heap size, in bytes-allocated units, that triggers the first
    /// collection.
    pub initial_threshold: usize,
    /// When set, `Heap::should_collect` always returns `true` — every
    /// allocation triggers a full collection. Used by `fent --stress-gc`
    /// to shake out missing roots.
    pub stress_gc: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            initial_threshold: 1024 * 1024,
            stress_gc: false,
        }
    }
}

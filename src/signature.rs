//! Ring fingerprints and dirty-state tracking.
//!
//! A signature is a canonical JSON encoding of a normalized ring. Two
//! rings compare equal exactly when their normalized forms match
//! point-for-point in order, so the signature doubles as the baseline
//! for unsaved-change detection while the user drags vertices around.

use crate::geometry::{self, GeoPoint};

/// Canonical fingerprint of a ring.
///
/// Encodes `normalize(ring)` as a deterministic `[[lat,lng],...]` JSON
/// array. Serialization of an `f64` vector cannot fail, so this never
/// does either.
pub fn signature(ring: &[GeoPoint]) -> String {
    let pairs: Vec<[f64; 2]> = geometry::normalize(ring)
        .into_iter()
        .map(<[f64; 2]>::from)
        .collect();
    serde_json::to_string(&pairs).unwrap_or_else(|_| "[]".to_string())
}

/// Tracks whether a live-edited ring differs from its last-saved baseline.
///
/// `on_ring_changed` reports only dirty-state *transitions* so the UI is
/// not churned on every vertex-drag event that leaves dirtiness unchanged.
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    baseline: String,
    current: String,
    dirty: bool,
}

impl Default for DirtyTracker {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl DirtyTracker {
    /// Start tracking with the given ring as the clean baseline.
    pub fn new(ring: &[GeoPoint]) -> Self {
        let sig = signature(ring);
        Self {
            baseline: sig.clone(),
            current: sig,
            dirty: false,
        }
    }

    /// Reset the baseline to the given ring and clear the dirty flag.
    pub fn start_baseline(&mut self, ring: &[GeoPoint]) {
        self.baseline = signature(ring);
        self.current = self.baseline.clone();
        self.dirty = false;
    }

    /// Record a new working ring.
    ///
    /// Returns `Some(dirty)` when the dirty state transitioned, `None`
    /// when it is unchanged.
    pub fn on_ring_changed(&mut self, ring: &[GeoPoint]) -> Option<bool> {
        self.current = signature(ring);
        let now_dirty = self.current != self.baseline;
        if now_dirty != self.dirty {
            self.dirty = now_dirty;
            Some(now_dirty)
        } else {
            None
        }
    }

    /// Force the dirty flag on, regardless of the baseline.
    ///
    /// Used for explicit user-initiated "clear": a deliberate action is
    /// treated as an edit even when the ring was already empty. Returns
    /// `Some(true)` on transition, `None` if already dirty.
    pub fn force_dirty(&mut self) -> Option<bool> {
        if self.dirty {
            None
        } else {
            self.dirty = true;
            Some(true)
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The baseline signature (last loaded or saved ring).
    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    /// The signature of the most recently recorded working ring.
    pub fn current(&self) -> &str {
        &self.current
    }
}

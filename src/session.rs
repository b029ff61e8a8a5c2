//! The polygon edit session.
//!
//! `ZoneEditor` owns the in-memory zone list, the single selected zone,
//! and its working ring while the user draws on the map. It drives the
//! lifecycle `NoSelection -> Loaded -> Editing -> Saving -> Loaded`,
//! with Reset/Clear shortcuts and a stale-response guard for saves that
//! resolve after the selection has moved on.
//!
//! Network I/O stays outside: `begin_save` captures the payload and
//! hands back a token, the host performs the call, and `resolve_save`
//! applies or discards the outcome. The interactive drawing widget is
//! equally external, reduced to `EditSurface` plus the three events it
//! emits.

use thiserror::Error;

use crate::backend::{BackendError, SavePolygonRequest};
use crate::constants::{DEFAULT_CENTER, MIN_RING_POINTS};
use crate::geometry::{self, GeoPoint};
use crate::model::Zone;
use crate::signature::DirtyTracker;
use crate::store::{KvStore, StyleOverrides};
use crate::style::{self, StyleConfig};

/// Lifecycle state of the edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing selected; every zone renders read-only.
    NoSelection,
    /// A zone is selected and the working ring matches the baseline.
    Loaded,
    /// The working ring has unsaved changes.
    Editing,
    /// A save for the selected zone is in flight.
    Saving,
}

/// Events emitted by the external drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// A new polygon was drawn from scratch.
    Created,
    /// A vertex was added, moved, or deleted on the existing polygon.
    VertexChanged,
    /// The whole polygon was removed with the surface's delete tool.
    Removed,
}

/// The external map-drawing widget, reduced to the one capability the
/// session needs: reading back the ring as currently drawn.
pub trait EditSurface {
    fn current_ring(&self) -> Vec<GeoPoint>;
}

/// Local validation failures raised before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("No zone is selected")]
    NoSelection,

    /// 1 or 2 points describe no polygon. Zero points is fine: that is
    /// an explicit "no zone".
    #[error("A polygon needs at least {MIN_RING_POINTS} points (got {actual})")]
    TooFewPoints { actual: usize },
}

/// Token for a save in flight. Captures the payload by value at the
/// moment of `begin_save`, so edits made while the request runs affect
/// only the next save.
#[derive(Debug)]
#[must_use = "a pending save must be resolved via ZoneEditor::resolve_save"]
pub struct PendingSave {
    zone_id: u64,
    epoch: u64,
    ring: Vec<GeoPoint>,
}

impl PendingSave {
    pub fn zone_id(&self) -> u64 {
        self.zone_id
    }

    pub fn ring(&self) -> &[GeoPoint] {
        &self.ring
    }

    /// The wire payload for this save.
    pub fn request(&self) -> SavePolygonRequest {
        SavePolygonRequest::new(self.zone_id, &self.ring)
    }
}

/// How a resolved save landed.
#[derive(Debug)]
pub enum SaveOutcome {
    /// The save succeeded and the session baseline was updated.
    Applied,
    /// The save failed; the working ring and dirty flag are untouched
    /// so no edit work is lost.
    Failed(BackendError),
    /// The response arrived for a zone that is no longer selected and
    /// was discarded without touching the current session.
    Stale,
}

/// Orchestrates the interactive editing lifecycle for delivery zones.
#[derive(Debug, Default)]
pub struct ZoneEditor {
    zones: Vec<Zone>,
    selected: Option<u64>,
    working: Vec<GeoPoint>,
    tracker: DirtyTracker,
    active_style: Option<StyleConfig>,
    /// Bumped on every selection change; stale save tokens are detected
    /// by comparing their epoch against this.
    epoch: u64,
    /// Saves in flight for the current epoch.
    in_flight: u32,
    test_point: Option<GeoPoint>,
    test_result: Option<bool>,
}

impl ZoneEditor {
    /// Create an editor over a loaded zone list. Nothing is selected
    /// initially; all zones render read-only until a selection is made.
    pub fn new(zones: Vec<Zone>) -> Self {
        Self {
            zones,
            ..Self::default()
        }
    }

    /// Replace the zone list (page reload). Drops any selection.
    pub fn set_zones(&mut self, zones: Vec<Zone>) {
        self.zones = zones;
        self.deselect();
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, id: u64) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.selected
    }

    pub fn selected_zone(&self) -> Option<&Zone> {
        self.selected.and_then(|id| self.zone(id))
    }

    pub fn state(&self) -> SessionState {
        match self.selected {
            None => SessionState::NoSelection,
            Some(_) if self.in_flight > 0 => SessionState::Saving,
            Some(_) if self.tracker.is_dirty() => SessionState::Editing,
            Some(_) => SessionState::Loaded,
        }
    }

    /// The working ring as last committed from the surface.
    pub fn working_ring(&self) -> &[GeoPoint] {
        &self.working
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// Select a zone for editing, discarding any unsaved edits of the
    /// previous selection. Returns `false` if the id is unknown, in
    /// which case the previous session ends but nothing is selected.
    pub fn select(&mut self, zone_id: u64, styles: &dyn KvStore) -> bool {
        self.end_session();
        let Some(zone) = self.zone(zone_id) else {
            log::warn!("Ignoring selection of unknown zone {}", zone_id);
            return false;
        };

        let ring = zone.ring.clone();
        let is_active = zone.is_active;
        self.selected = Some(zone_id);
        self.working = ring;
        self.tracker.start_baseline(&self.working);
        self.active_style = Some(style::effective_style(zone_id, is_active, styles));
        log::info!("Editing zone {} ({} points)", zone_id, self.working.len());
        true
    }

    /// Drop the selection and all unsaved state.
    pub fn deselect(&mut self) {
        self.end_session();
    }

    fn end_session(&mut self) {
        self.selected = None;
        self.working.clear();
        self.tracker.start_baseline(&[]);
        self.active_style = None;
        self.epoch += 1;
        self.in_flight = 0;
        self.clear_test_point();
    }

    /// Commit a drawing-surface event into the session.
    ///
    /// Returns `Some(dirty)` when the dirty state transitioned, `None`
    /// otherwise (including when no zone is selected).
    pub fn surface_event(
        &mut self,
        event: SurfaceEvent,
        surface: &dyn EditSurface,
    ) -> Option<bool> {
        if self.selected.is_none() {
            log::debug!("Surface event {:?} with no selection; ignored", event);
            return None;
        }

        match event {
            SurfaceEvent::Created | SurfaceEvent::VertexChanged => {
                self.working = geometry::normalize(&surface.current_ring());
                self.tracker.on_ring_changed(&self.working)
            }
            SurfaceEvent::Removed => {
                // Deleting the polygon is a deliberate clear, dirty even
                // against an empty baseline.
                self.working.clear();
                let was_dirty = self.tracker.is_dirty();
                self.tracker.on_ring_changed(&self.working);
                self.tracker.force_dirty();
                if was_dirty { None } else { Some(true) }
            }
        }
    }

    /// Reload the selected zone's last-saved ring and style, discarding
    /// all unsaved edits. No-op without a selection.
    pub fn reset(&mut self, styles: &dyn KvStore) {
        let Some(zone) = self.selected_zone() else {
            return;
        };
        let ring = zone.ring.clone();
        let id = zone.id;
        let is_active = zone.is_active;

        self.working = ring;
        self.tracker.start_baseline(&self.working);
        self.active_style = Some(style::effective_style(id, is_active, styles));
        self.clear_test_point();
        log::info!("Reset zone {} to its saved ring", id);
    }

    /// Empty the working ring, awaiting Save ("no zone") or Reset.
    /// Always marks the session dirty, even if the ring was already
    /// empty. No-op without a selection.
    pub fn clear(&mut self) {
        if self.selected.is_none() {
            return;
        }
        self.working.clear();
        self.tracker.on_ring_changed(&self.working);
        self.tracker.force_dirty();
        self.clear_test_point();
    }

    /// Begin saving the working ring.
    ///
    /// Rejects locally when the ring has 1 or 2 points; zero points is
    /// allowed and persists "no zone". On success the session enters
    /// `Saving` and the returned token must be fed to `resolve_save`
    /// with the backend call's result.
    pub fn begin_save(&mut self) -> Result<PendingSave, SaveError> {
        let zone_id = self.selected.ok_or(SaveError::NoSelection)?;
        let payload = geometry::normalize(&self.working);
        if !payload.is_empty() && payload.len() < MIN_RING_POINTS {
            return Err(SaveError::TooFewPoints {
                actual: payload.len(),
            });
        }

        self.in_flight += 1;
        Ok(PendingSave {
            zone_id,
            epoch: self.epoch,
            ring: payload,
        })
    }

    /// Resolve a save with the backend call's result.
    ///
    /// A token from a superseded session is discarded: logged, no state
    /// touched. Otherwise success updates the in-memory zone and resets
    /// the baseline to the saved ring (dirtiness is recomputed against
    /// it, since the user may have kept editing while the request ran);
    /// failure leaves working ring and dirty flag untouched.
    pub fn resolve_save(
        &mut self,
        pending: PendingSave,
        result: Result<(), BackendError>,
    ) -> SaveOutcome {
        if pending.epoch != self.epoch {
            log::info!(
                "Discarding stale save response for zone {} (selection changed)",
                pending.zone_id
            );
            return SaveOutcome::Stale;
        }

        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(()) => {
                if let Some(zone) = self.zones.iter_mut().find(|z| z.id == pending.zone_id) {
                    zone.ring = pending.ring.clone();
                }
                self.tracker.start_baseline(&pending.ring);
                self.tracker.on_ring_changed(&self.working);
                log::info!(
                    "Saved zone {} ({} points)",
                    pending.zone_id,
                    pending.ring.len()
                );
                SaveOutcome::Applied
            }
            Err(e) => {
                log::warn!("Save failed for zone {}: {}", pending.zone_id, e);
                SaveOutcome::Failed(e)
            }
        }
    }

    /// The live style of the selected zone's ring.
    pub fn style(&self) -> Option<&StyleConfig> {
        self.active_style.as_ref()
    }

    /// Adjust the live style (color picker / sliders). Not persisted
    /// until `save_style`.
    pub fn set_style(&mut self, cfg: StyleConfig) {
        if self.selected.is_some() {
            self.active_style = Some(cfg);
        }
    }

    /// Persist the live style as the selected zone's override.
    pub fn save_style(&self, styles: &mut dyn KvStore) {
        if let (Some(id), Some(cfg)) = (self.selected, &self.active_style) {
            StyleOverrides::save(styles, id, cfg);
        }
    }

    /// Drop the selected zone's override and restore the deterministic
    /// default style.
    pub fn reset_style(&mut self, styles: &mut dyn KvStore) {
        let Some(zone) = self.selected_zone() else {
            return;
        };
        let id = zone.id;
        let is_active = zone.is_active;
        StyleOverrides::clear(styles, id);
        self.active_style = Some(StyleConfig::default_for(id, is_active));
    }

    /// Test a point against the working ring. Returns `None` when the
    /// ring has fewer than three points (result not applicable, shown
    /// as a neutral dash, never as "outside").
    pub fn run_point_test(&mut self, point: GeoPoint) -> Option<bool> {
        self.test_point = Some(point);
        self.test_result = geometry::contains(point, &self.working);
        self.test_result
    }

    pub fn test_point(&self) -> Option<GeoPoint> {
        self.test_point
    }

    pub fn test_result(&self) -> Option<bool> {
        self.test_result
    }

    fn clear_test_point(&mut self) {
        self.test_point = None;
        self.test_result = None;
    }

    /// Preferred map center: first working-ring point, then the
    /// selected zone's anchor, then the city default.
    pub fn map_center(&self) -> GeoPoint {
        if let Some(p) = self.working.first() {
            return *p;
        }
        if let Some(anchor) = self.selected_zone().and_then(|z| z.anchor) {
            return anchor;
        }
        DEFAULT_CENTER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    struct FakeSurface {
        ring: Vec<GeoPoint>,
    }

    impl FakeSurface {
        fn with(points: &[(f64, f64)]) -> Self {
            Self {
                ring: points.iter().map(|&(lat, lng)| GeoPoint::new(lat, lng)).collect(),
            }
        }
    }

    impl EditSurface for FakeSurface {
        fn current_ring(&self) -> Vec<GeoPoint> {
            self.ring.clone()
        }
    }

    fn square(offset: f64) -> Vec<GeoPoint> {
        [
            (offset, offset),
            (offset, offset + 1.0),
            (offset + 1.0, offset + 1.0),
            (offset + 1.0, offset),
        ]
        .iter()
        .map(|&(lat, lng)| GeoPoint::new(lat, lng))
        .collect()
    }

    fn editor() -> ZoneEditor {
        ZoneEditor::new(vec![
            Zone {
                id: 7,
                name: "Chilonzor".to_string(),
                anchor: Some(GeoPoint::new(41.28, 69.2)),
                is_active: true,
                ring: square(0.0),
            },
            Zone {
                id: 9,
                name: "Yunusobod".to_string(),
                anchor: None,
                is_active: false,
                ring: Vec::new(),
            },
        ])
    }

    #[test]
    fn test_initially_nothing_selected() {
        let ed = editor();
        assert_eq!(ed.state(), SessionState::NoSelection);
        assert!(ed.working_ring().is_empty());
    }

    #[test]
    fn test_select_loads_baseline_clean() {
        let styles = MemoryStore::new();
        let mut ed = editor();
        assert!(ed.select(7, &styles));
        assert_eq!(ed.state(), SessionState::Loaded);
        assert_eq!(ed.working_ring().len(), 4);
        assert!(!ed.is_dirty());
        assert_eq!(ed.style().unwrap(), &StyleConfig::default_for(7, true));
    }

    #[test]
    fn test_select_unknown_id_deselects() {
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);
        assert!(!ed.select(999, &styles));
        assert_eq!(ed.state(), SessionState::NoSelection);
    }

    #[test]
    fn test_edit_save_scenario() {
        // Select zone 7, drag a vertex, save, baseline follows.
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);

        let mut dragged = square(0.0);
        dragged[1] = GeoPoint::new(0.0, 2.0);
        let surface = FakeSurface { ring: dragged.clone() };
        assert_eq!(ed.surface_event(SurfaceEvent::VertexChanged, &surface), Some(true));
        assert_eq!(ed.state(), SessionState::Editing);

        let pending = ed.begin_save().unwrap();
        assert_eq!(ed.state(), SessionState::Saving);
        assert_eq!(pending.zone_id(), 7);
        assert_eq!(pending.request().flial_id, 7);

        let outcome = ed.resolve_save(pending, Ok(()));
        assert!(matches!(outcome, SaveOutcome::Applied));
        assert_eq!(ed.state(), SessionState::Loaded);
        assert!(!ed.is_dirty());
        assert_eq!(ed.zone(7).unwrap().ring, dragged);
    }

    #[test]
    fn test_edit_back_to_baseline_goes_clean() {
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);

        let mut dragged = square(0.0);
        dragged[0] = GeoPoint::new(-1.0, 0.0);
        assert_eq!(
            ed.surface_event(SurfaceEvent::VertexChanged, &FakeSurface { ring: dragged }),
            Some(true)
        );

        // Drag back to where it started: clean again, one transition.
        assert_eq!(
            ed.surface_event(SurfaceEvent::VertexChanged, &FakeSurface { ring: square(0.0) }),
            Some(false)
        );
        assert_eq!(ed.state(), SessionState::Loaded);
    }

    #[test]
    fn test_surface_removal_clears_and_dirties() {
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);

        let surface = FakeSurface::with(&[]);
        assert_eq!(ed.surface_event(SurfaceEvent::Removed, &surface), Some(true));
        assert!(ed.working_ring().is_empty());
        assert_eq!(ed.state(), SessionState::Editing);
    }

    #[test]
    fn test_clear_forces_dirty_on_empty_baseline() {
        // Zone 9 starts with no ring; clearing is still a deliberate edit.
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(9, &styles);
        assert!(!ed.is_dirty());

        ed.clear();
        assert!(ed.is_dirty());
        assert_eq!(ed.state(), SessionState::Editing);
    }

    #[test]
    fn test_save_guard_rejects_degenerate_rings() {
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);

        ed.surface_event(
            SurfaceEvent::VertexChanged,
            &FakeSurface::with(&[(0.0, 0.0), (1.0, 1.0)]),
        );
        assert_eq!(ed.begin_save().unwrap_err(), SaveError::TooFewPoints { actual: 2 });
        // Rejected locally: still editing, nothing in flight.
        assert_eq!(ed.state(), SessionState::Editing);

        // Zero points is an explicit "no zone" and passes the guard.
        ed.clear();
        let pending = ed.begin_save().unwrap();
        assert!(pending.ring().is_empty());
    }

    #[test]
    fn test_save_without_selection_rejected() {
        let mut ed = editor();
        assert_eq!(ed.begin_save().unwrap_err(), SaveError::NoSelection);
    }

    #[test]
    fn test_save_failure_preserves_edits() {
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);
        ed.surface_event(SurfaceEvent::VertexChanged, &FakeSurface { ring: square(5.0) });

        let pending = ed.begin_save().unwrap();
        let outcome = ed.resolve_save(
            pending,
            Err(BackendError::Network("connection reset".to_string())),
        );
        assert!(matches!(outcome, SaveOutcome::Failed(_)));
        // No silent data loss: ring and dirtiness survive for a retry.
        assert_eq!(ed.working_ring(), square(5.0));
        assert!(ed.is_dirty());
        assert_eq!(ed.state(), SessionState::Editing);
        assert_eq!(ed.zone(7).unwrap().ring, square(0.0));
    }

    #[test]
    fn test_stale_save_response_discarded() {
        // Save in flight for zone 7; user switches to zone 9 before the
        // response lands. Zone 9's session must be untouched.
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);
        ed.surface_event(SurfaceEvent::VertexChanged, &FakeSurface { ring: square(5.0) });
        let pending = ed.begin_save().unwrap();

        ed.select(9, &styles);
        assert_eq!(ed.state(), SessionState::Loaded);

        let outcome = ed.resolve_save(pending, Ok(()));
        assert!(matches!(outcome, SaveOutcome::Stale));
        assert_eq!(ed.selected_id(), Some(9));
        assert_eq!(ed.state(), SessionState::Loaded);
        assert!(!ed.is_dirty());
        assert!(ed.working_ring().is_empty());
        assert_eq!(ed.zone(7).unwrap().ring, square(0.0));
    }

    #[test]
    fn test_edits_during_in_flight_save_hit_next_save() {
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);
        ed.surface_event(SurfaceEvent::VertexChanged, &FakeSurface { ring: square(5.0) });
        let pending = ed.begin_save().unwrap();

        // Keep editing while the request runs.
        ed.surface_event(SurfaceEvent::VertexChanged, &FakeSurface { ring: square(8.0) });
        assert_eq!(pending.ring(), square(5.0));

        ed.resolve_save(pending, Ok(()));
        // Baseline is the saved ring; the later edit is still unsaved.
        assert!(ed.is_dirty());
        assert_eq!(ed.working_ring(), square(8.0));
        assert_eq!(ed.zone(7).unwrap().ring, square(5.0));
    }

    #[test]
    fn test_reset_restores_saved_ring() {
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);
        ed.surface_event(SurfaceEvent::VertexChanged, &FakeSurface { ring: square(5.0) });
        ed.run_point_test(GeoPoint::new(5.5, 5.5));
        assert!(ed.is_dirty());

        ed.reset(&styles);
        assert!(!ed.is_dirty());
        assert_eq!(ed.working_ring(), square(0.0));
        assert_eq!(ed.test_point(), None);
        assert_eq!(ed.test_result(), None);
    }

    #[test]
    fn test_deselect_discards_session() {
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);
        ed.surface_event(SurfaceEvent::VertexChanged, &FakeSurface { ring: square(5.0) });

        ed.deselect();
        assert_eq!(ed.state(), SessionState::NoSelection);
        assert!(ed.working_ring().is_empty());
        // The stored zone keeps its saved ring.
        assert_eq!(ed.zone(7).unwrap().ring, square(0.0));
    }

    #[test]
    fn test_point_test_against_working_ring() {
        let styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);

        assert_eq!(ed.run_point_test(GeoPoint::new(0.5, 0.5)), Some(true));
        assert_eq!(ed.run_point_test(GeoPoint::new(3.0, 3.0)), Some(false));

        // Fewer than three points: neutral, not "outside".
        ed.clear();
        assert_eq!(ed.run_point_test(GeoPoint::new(0.5, 0.5)), None);
        assert_eq!(ed.test_result(), None);
    }

    #[test]
    fn test_style_override_save_and_reset() {
        let mut styles = MemoryStore::new();
        let mut ed = editor();
        ed.select(7, &styles);

        let custom = StyleConfig {
            color: "#00C853".to_string(),
            weight: 4.5,
            fill_opacity: 0.5,
        };
        ed.set_style(custom.clone());
        ed.save_style(&mut styles);

        // A fresh selection picks the saved override up.
        ed.deselect();
        ed.select(7, &styles);
        assert_eq!(ed.style().unwrap(), &custom);

        ed.reset_style(&mut styles);
        assert_eq!(ed.style().unwrap(), &StyleConfig::default_for(7, true));
        assert_eq!(StyleOverrides::load(&styles, 7), None);
    }

    #[test]
    fn test_map_center_preference_chain() {
        let styles = MemoryStore::new();
        let mut ed = editor();

        // Nothing selected: city default.
        assert_eq!(ed.map_center(), DEFAULT_CENTER);

        // Selected with a ring: first ring point.
        ed.select(7, &styles);
        assert_eq!(ed.map_center(), GeoPoint::new(0.0, 0.0));

        // Ring cleared: anchor.
        ed.clear();
        assert_eq!(ed.map_center(), GeoPoint::new(41.28, 69.2));

        // Zone 9 has neither ring nor anchor.
        ed.select(9, &styles);
        assert_eq!(ed.map_center(), DEFAULT_CENTER);
    }

    #[test]
    fn test_surface_events_ignored_without_selection() {
        let mut ed = editor();
        let surface = FakeSurface { ring: square(0.0) };
        assert_eq!(ed.surface_event(SurfaceEvent::Created, &surface), None);
        assert!(ed.working_ring().is_empty());
    }
}

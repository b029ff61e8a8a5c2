//! Read-only overlay rendering of all zones plus the active ring.
//!
//! The map host asks this module for a render plan: one styled polygon
//! per zone (muted when unselected, emphasized when selected), anchor
//! markers with popup summaries, the actively edited ring on top, and
//! bounds covering everything. The plan is plain data; the host feeds
//! it to whatever map library it embeds.

use crate::geometry::{Bounds, GeoPoint, is_polygon};
use crate::session::ZoneEditor;
use crate::store::KvStore;
use crate::style::{self, PathStyle};

/// Popup summary shown on a zone's anchor marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupInfo {
    pub name: String,
    pub zone_id: u64,
    pub is_active: bool,
    /// Swatch color, the zone's effective base color.
    pub color: String,
}

/// A zone's anchor marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerInfo {
    pub position: GeoPoint,
    pub popup: PopupInfo,
}

/// One zone's read-only overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneOverlay {
    pub zone_id: u64,
    pub selected: bool,
    /// Stored ring with its style; `None` when the zone has fewer than
    /// three points (nothing drawable).
    pub polygon: Option<(Vec<GeoPoint>, PathStyle)>,
    pub marker: Option<MarkerInfo>,
}

/// The actively edited ring, drawn on top of everything.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRing {
    pub ring: Vec<GeoPoint>,
    pub style: PathStyle,
}

/// Complete render plan for the zone map.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPlan {
    pub zones: Vec<ZoneOverlay>,
    pub active: Option<ActiveRing>,
    /// Bounds over every ring, anchor, and the working ring.
    pub bounds: Bounds,
}

/// Build the render plan for the current editor state.
pub fn build_plan(editor: &ZoneEditor, styles: &dyn KvStore) -> OverlayPlan {
    let selected_id = editor.selected_id();
    let mut bounds = Bounds::new();
    let mut zones = Vec::with_capacity(editor.zones().len());

    for zone in editor.zones() {
        let selected = selected_id == Some(zone.id);
        let base = style::effective_style(zone.id, zone.is_active, styles);

        let polygon = if is_polygon(&zone.ring) {
            let path = if selected {
                style::selected_style(&base)
            } else {
                style::muted_style(zone.id, &base)
            };
            Some((zone.ring.clone(), path))
        } else {
            None
        };

        let marker = zone.anchor.map(|position| MarkerInfo {
            position,
            popup: PopupInfo {
                name: zone.name.clone(),
                zone_id: zone.id,
                is_active: zone.is_active,
                color: base.color.clone(),
            },
        });

        bounds.extend_ring(&zone.ring);
        if let Some(anchor) = zone.anchor {
            bounds.extend(anchor);
        }

        zones.push(ZoneOverlay {
            zone_id: zone.id,
            selected,
            polygon,
            marker,
        });
    }

    let active = match (selected_id, editor.style()) {
        (Some(_), Some(cfg)) if !editor.working_ring().is_empty() => {
            bounds.extend_ring(editor.working_ring());
            Some(ActiveRing {
                ring: editor.working_ring().to_vec(),
                style: style::editing_style(cfg),
            })
        }
        _ => None,
    };

    OverlayPlan {
        zones,
        active,
        bounds,
    }
}

/// Decides when the map viewport should be re-fit to the overlay bounds.
///
/// Fitting on every vertex drag makes the viewport jitter, so a fit is
/// requested only when overlay *membership* changes: zones appearing or
/// disappearing, a ring or anchor coming into existence, the selection
/// moving, or the working ring toggling between empty and drawn.
#[derive(Debug, Default)]
pub struct ViewportFitter {
    last_key: Option<String>,
}

impl ViewportFitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bounds to fit when membership changed since the last
    /// call and the plan has any geometry, `None` otherwise.
    pub fn fit_needed(&mut self, plan: &OverlayPlan) -> Option<Bounds> {
        let key = Self::membership_key(plan);
        if self.last_key.as_deref() == Some(key.as_str()) {
            return None;
        }
        self.last_key = Some(key);
        plan.bounds.is_valid().then_some(plan.bounds)
    }

    fn membership_key(plan: &OverlayPlan) -> String {
        let mut key = String::new();
        for z in &plan.zones {
            key.push_str(&format!(
                "{}:{}{}{};",
                z.zone_id,
                u8::from(z.polygon.is_some()),
                u8::from(z.marker.is_some()),
                u8::from(z.selected),
            ));
        }
        key.push_str(if plan.active.is_some() { "A" } else { "-" });
        key
    }
}

//! Global constants for the zone editor core

use crate::geometry::GeoPoint;

/// Default map center when nothing else is available (Tashkent).
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    lat: 41.311081,
    lng: 69.240562,
};

/// Default map zoom level.
pub const DEFAULT_ZOOM: u8 = 12;

/// Coordinate comparison epsilon (matches the normalization precision).
pub const COORD_EPSILON: f64 = 1e-6;

/// Decimal digits kept by ring normalization (sub-meter at city scale).
pub const COORD_PRECISION: u32 = 6;

/// Minimum number of points for a ring to describe a polygon.
pub const MIN_RING_POINTS: usize = 3;

/// Version tag for the default color palette. Bump when the palette
/// changes so persisted expectations can be invalidated.
pub const PALETTE_VERSION: u32 = 1;

/// Key prefix for per-zone style overrides in the local store.
pub const STYLE_KEY_PREFIX: &str = "zone_style_";

/// Key holding the legacy per-zone active-flag fallback map.
pub const ACTIVE_OVERRIDES_KEY: &str = "zone_active_overrides_v1";

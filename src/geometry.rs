//! Geographic primitives for delivery-zone rings.
//!
//! This module provides the core geometry used by the zone editor:
//! - `GeoPoint` coordinates as delivered by the map widget and backend
//! - ring normalization (rounding + closing-point removal)
//! - ray-casting point-in-ring tests
//! - bounds accumulation for viewport fitting
//!
//! Coordinates are treated as planar (lat as Y, lng as X). That is not
//! geodesically correct for very large polygons but is fine for
//! city-scale delivery zones.

use serde::{Deserialize, Serialize};

use crate::constants::{COORD_EPSILON, MIN_RING_POINTS};

/// A geographic point in degrees, `(latitude, longitude)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether two points coincide within the normalization epsilon.
    pub fn approx_eq(&self, other: &GeoPoint) -> bool {
        (self.lat - other.lat).abs() < COORD_EPSILON && (self.lng - other.lng).abs() < COORD_EPSILON
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(p: GeoPoint) -> Self {
        [p.lat, p.lng]
    }
}

/// Round a coordinate to six decimal digits.
fn round6(n: f64) -> f64 {
    (n * 1e6).round() / 1e6
}

/// Canonicalize a ring for storage, signatures, and transmission.
///
/// Rounds every coordinate to six decimal digits to absorb floating-point
/// noise from interactive dragging, and drops a duplicated closing point
/// if the map library produced one. Idempotent.
pub fn normalize(ring: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut out: Vec<GeoPoint> = ring
        .iter()
        .map(|p| GeoPoint::new(round6(p.lat), round6(p.lng)))
        .collect();
    if out.len() > 1 {
        let first = out[0];
        let last = out[out.len() - 1];
        if first.approx_eq(&last) {
            out.pop();
        }
    }
    out
}

/// Whether a ring has enough points to describe a polygon.
pub fn is_polygon(ring: &[GeoPoint]) -> bool {
    ring.len() >= MIN_RING_POINTS
}

/// Ray-casting point-in-ring test (even-odd rule).
///
/// Returns `None` when the ring has fewer than three points: the question
/// is not applicable, and callers must not collapse that into "outside".
/// A point exactly on an edge is implementation-defined, the standard
/// ray-casting ambiguity.
pub fn contains(point: GeoPoint, ring: &[GeoPoint]) -> Option<bool> {
    if !is_polygon(ring) {
        return None;
    }

    let x = point.lng;
    let y = point.lat;
    let mut inside = false;

    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let xi = ring[i].lng;
        let yi = ring[i].lat;
        let xj = ring[j].lng;
        let yj = ring[j].lat;

        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    Some(inside)
}

/// An accumulating lat/lng bounding box, in the style of a map library's
/// `LatLngBounds`. Starts empty; invalid until at least one point is added.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    extent: Option<(GeoPoint, GeoPoint)>,
}

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the bounds to include a point.
    pub fn extend(&mut self, p: GeoPoint) {
        match &mut self.extent {
            None => self.extent = Some((p, p)),
            Some((min, max)) => {
                min.lat = min.lat.min(p.lat);
                min.lng = min.lng.min(p.lng);
                max.lat = max.lat.max(p.lat);
                max.lng = max.lng.max(p.lng);
            }
        }
    }

    /// Grow the bounds to include every point of a ring.
    pub fn extend_ring(&mut self, ring: &[GeoPoint]) {
        for p in ring {
            self.extend(*p);
        }
    }

    /// Whether any point has been added.
    pub fn is_valid(&self) -> bool {
        self.extent.is_some()
    }

    /// South-west corner, if the bounds are valid.
    pub fn south_west(&self) -> Option<GeoPoint> {
        self.extent.map(|(min, _)| min)
    }

    /// North-east corner, if the bounds are valid.
    pub fn north_east(&self) -> Option<GeoPoint> {
        self.extent.map(|(_, max)| max)
    }

    /// Center of the bounds, if valid.
    pub fn center(&self) -> Option<GeoPoint> {
        self.extent.map(|(min, max)| {
            GeoPoint::new((min.lat + max.lat) / 2.0, (min.lng + max.lng) / 2.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> Vec<GeoPoint> {
        points.iter().map(|&(lat, lng)| GeoPoint::new(lat, lng)).collect()
    }

    #[test]
    fn test_normalize_rounds_to_six_digits() {
        let r = ring(&[(41.3110811234, 69.2405629876)]);
        let n = normalize(&r);
        assert_eq!(n[0], GeoPoint::new(41.311081, 69.240563));
    }

    #[test]
    fn test_normalize_strips_closing_point() {
        let open = ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
        let closed = ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (0.0, 0.0)]);
        assert_eq!(normalize(&closed), normalize(&open));
    }

    #[test]
    fn test_normalize_strips_closing_point_within_epsilon() {
        let closed = ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (0.0000001, 0.0)]);
        assert_eq!(normalize(&closed).len(), 3);
    }

    #[test]
    fn test_normalize_idempotent() {
        let r = ring(&[
            (41.31108112, 69.24056298),
            (41.32, 69.25),
            (41.33, 69.24),
            (41.31108112, 69.24056298),
        ]);
        let once = normalize(&r);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_keeps_single_point() {
        let r = ring(&[(1.0, 2.0)]);
        assert_eq!(normalize(&r).len(), 1);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_contains_square() {
        let square = ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        assert_eq!(contains(GeoPoint::new(5.0, 5.0), &square), Some(true));
        assert_eq!(contains(GeoPoint::new(15.0, 15.0), &square), Some(false));
        assert_eq!(contains(GeoPoint::new(-1.0, 5.0), &square), Some(false));
    }

    #[test]
    fn test_contains_concave() {
        // U-shape; the notch at the top center is outside.
        let u = ring(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 4.0),
            (2.0, 4.0),
            (2.0, 6.0),
            (10.0, 6.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ]);
        assert_eq!(contains(GeoPoint::new(6.0, 5.0), &u), Some(false));
        assert_eq!(contains(GeoPoint::new(1.0, 5.0), &u), Some(true));
    }

    #[test]
    fn test_contains_undefined_below_three_points() {
        // Fewer than three points: not applicable, never plain "false".
        assert_eq!(contains(GeoPoint::new(0.0, 0.0), &[]), None);
        let two = ring(&[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(contains(GeoPoint::new(0.5, 0.5), &two), None);
    }

    #[test]
    fn test_bounds_accumulation() {
        let mut b = Bounds::new();
        assert!(!b.is_valid());
        b.extend(GeoPoint::new(1.0, 2.0));
        b.extend(GeoPoint::new(-1.0, 4.0));
        assert!(b.is_valid());
        assert_eq!(b.south_west(), Some(GeoPoint::new(-1.0, 2.0)));
        assert_eq!(b.north_east(), Some(GeoPoint::new(1.0, 4.0)));
        assert_eq!(b.center(), Some(GeoPoint::new(0.0, 3.0)));
    }
}

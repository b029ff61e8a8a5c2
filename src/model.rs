//! Zone (branch) entities and backend list decoding.

use serde::Deserialize;

use crate::geometry::{self, GeoPoint};
use crate::store::{ActiveOverrides, KvStore};

/// A delivery branch with its coverage zone.
///
/// Loaded wholesale from the backend on page entry and held in memory
/// for the session. The ring is kept in normalized form (see
/// `geometry::normalize`); an empty ring means "no zone defined".
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    /// Stable backend identifier.
    pub id: u64,
    pub name: String,
    /// Marker location of the branch itself, when known.
    pub anchor: Option<GeoPoint>,
    pub is_active: bool,
    /// Coverage polygon boundary, without a duplicated closing point.
    pub ring: Vec<GeoPoint>,
}

impl Zone {
    /// Whether the zone currently has a drawable polygon.
    pub fn has_polygon(&self) -> bool {
        geometry::is_polygon(&self.ring)
    }
}

/// Raw zone record as served by the backend. Most fields are optional;
/// older deployments omit anchors, coordinates, and the active flag.
#[derive(Debug, Deserialize)]
struct ZoneRecord {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    coordinates: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    is_active: Option<bool>,
}

/// The list endpoint answers either `{"flials": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZoneListResponse {
    Envelope { flials: Vec<ZoneRecord> },
    Bare(Vec<ZoneRecord>),
}

/// Decode the zone list payload.
///
/// Missing active flags are resolved through the local override map in
/// `store` (default `true`); rings are normalized on the way in.
pub fn decode_zone_list(json: &str, store: &dyn KvStore) -> Result<Vec<Zone>, serde_json::Error> {
    let response: ZoneListResponse = serde_json::from_str(json)?;
    let records = match response {
        ZoneListResponse::Envelope { flials } => flials,
        ZoneListResponse::Bare(records) => records,
    };

    Ok(records
        .into_iter()
        .map(|r| {
            let anchor = match (r.latitude, r.longitude) {
                (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
                _ => None,
            };
            let raw_ring: Vec<GeoPoint> = r
                .coordinates
                .unwrap_or_default()
                .into_iter()
                .map(GeoPoint::from)
                .collect();
            Zone {
                id: r.id,
                name: r.name.unwrap_or_else(|| format!("Zone #{}", r.id)),
                anchor,
                is_active: ActiveOverrides::resolve(store, r.id, r.is_active),
                ring: geometry::normalize(&raw_ring),
            }
        })
        .collect())
}

//! The REST backend boundary.
//!
//! The dashboard's backend owns all business logic; this crate only
//! consumes it. `ZoneBackend` is the seam a real HTTP client implements
//! and tests fake. Wire shapes follow the dashboard API: the zone list
//! endpoint, `POST /flials/polygon` for saving a ring, and
//! `PATCH /flials/active/` for the active flag.

use serde::Serialize;
use thiserror::Error;

use crate::geometry::{self, GeoPoint};
use crate::model::Zone;
use crate::store::{ActiveOverrides, KvStore};

/// Errors surfaced by backend calls.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The server answered with a failure status.
    #[error("Backend returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport failure before any response arrived.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    /// Whether this error means the endpoint is not deployed yet
    /// (missing route rather than a genuine failure).
    pub fn is_unsupported_endpoint(&self) -> bool {
        matches!(self, BackendError::Http { status: 404 | 405 | 501, .. })
    }
}

/// Body of the save-polygon call: `{flial_id, coordinates: [[lat,lng],...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavePolygonRequest {
    pub flial_id: u64,
    pub coordinates: Vec<[f64; 2]>,
}

impl SavePolygonRequest {
    /// Build a payload from a working ring, normalizing on the way out.
    pub fn new(zone_id: u64, ring: &[GeoPoint]) -> Self {
        Self {
            flial_id: zone_id,
            coordinates: geometry::normalize(ring)
                .into_iter()
                .map(<[f64; 2]>::from)
                .collect(),
        }
    }
}

/// The remote persistence collaborator.
pub trait ZoneBackend {
    /// Fetch the full zone list.
    fn fetch_zones(&mut self) -> Result<Vec<Zone>, BackendError>;

    /// Persist a zone's polygon.
    fn save_polygon(&mut self, request: &SavePolygonRequest) -> Result<(), BackendError>;

    /// Update a zone's active flag.
    fn patch_active(&mut self, zone_id: u64, is_active: bool) -> Result<(), BackendError>;
}

/// Outcome of an active-flag update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveUpdate {
    /// The backend accepted the change.
    Remote,
    /// The endpoint is not deployed; the flag went to the local
    /// override map instead.
    LocalFallback,
}

/// Set a zone's active flag, falling back to the local override map when
/// the backend does not serve the endpoint yet. Real failures (anything
/// other than a missing route) propagate.
pub fn set_active_with_fallback(
    backend: &mut dyn ZoneBackend,
    store: &mut dyn KvStore,
    zone_id: u64,
    is_active: bool,
) -> Result<ActiveUpdate, BackendError> {
    match backend.patch_active(zone_id, is_active) {
        Ok(()) => Ok(ActiveUpdate::Remote),
        Err(e) if e.is_unsupported_endpoint() => {
            log::info!(
                "Active endpoint unavailable ({}); storing flag for zone {} locally",
                e,
                zone_id
            );
            ActiveOverrides::set(store, zone_id, is_active);
            Ok(ActiveUpdate::LocalFallback)
        }
        Err(e) => Err(e),
    }
}

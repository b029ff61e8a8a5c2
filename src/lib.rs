//! zoneedit - delivery-zone polygon editing core
//!
//! The algorithmic heart of the dispatch dashboard's zone map: ring
//! normalization and fingerprinting, dirty-state tracking against an
//! interactive drawing surface, ray-casting point-in-zone tests,
//! deterministic per-zone styling with local overrides, the edit-session
//! state machine, and overlay render planning. Map rendering, HTTP, and
//! UI chrome stay in the host; they plug in through the `EditSurface`,
//! `ZoneBackend`, and `KvStore` seams.

pub mod backend;
pub mod constants;
pub mod geometry;
pub mod model;
pub mod overlay;
pub mod session;
pub mod signature;
pub mod store;
pub mod style;

pub use backend::{BackendError, SavePolygonRequest, ZoneBackend};
pub use geometry::{Bounds, GeoPoint};
pub use model::Zone;
pub use overlay::{OverlayPlan, ViewportFitter, build_plan};
pub use session::{
    EditSurface, PendingSave, SaveError, SaveOutcome, SessionState, SurfaceEvent, ZoneEditor,
};
pub use signature::{DirtyTracker, signature};
pub use store::{KvStore, MemoryStore};
pub use style::{PathStyle, StyleConfig};

#[cfg(not(target_arch = "wasm32"))]
pub use store::JsonFileStore;

//! Deterministic zone styling.
//!
//! Every zone gets a stable default color derived from its id, so a map
//! with a dozen overlapping delivery zones stays readable without anyone
//! hand-picking colors. Users can still override color, stroke weight,
//! and fill opacity per zone; overrides live in the local store (see
//! `crate::store`), never on the backend.

use serde::{Deserialize, Serialize};

use crate::store::KvStore;

/// Vivid palette for per-zone default colors, version 1
/// (`crate::constants::PALETTE_VERSION`). Order matters: the id hash
/// indexes into this array, so reordering changes every zone's color.
pub const DISTINCT_COLORS: [&str; 24] = [
    "#FF1744", "#FF3D00", "#FF6D00", "#FFAB00", "#FFD600", "#C6FF00", "#76FF03", "#00E676",
    "#1DE9B6", "#00E5FF", "#00B0FF", "#2979FF", "#3F51FF", "#651FFF", "#AA00FF", "#D500F9",
    "#F50057", "#FF4081", "#FF8A80", "#FF6E40", "#FDD835", "#64DD17", "#00C853", "#00BFA5",
];

/// Dash patterns for unselected zone outlines, picked per id so adjacent
/// zones with similar hues still read as distinct.
pub const DASH_PATTERNS: [&str; 8] = ["6 4", "8 3", "4 3", "2 2", "10 4", "12 3", "5 2", "7 5"];

/// FNV-1a over the byte form of a string. Stable across runs and
/// platforms; deliberately not a cryptographic hash.
fn fnv1a(s: &str) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for byte in s.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// Stable default color for a zone id.
pub fn default_color(zone_id: u64) -> &'static str {
    let idx = fnv1a(&zone_id.to_string()) as usize % DISTINCT_COLORS.len();
    DISTINCT_COLORS[idx]
}

/// Stable dash pattern for a zone id.
///
/// Hashes a salted form of the id so the dash choice does not simply
/// track the color choice.
pub fn dash_for(zone_id: u64) -> &'static str {
    let idx = fnv1a(&format!("dash:{zone_id}")) as usize % DASH_PATTERNS.len();
    DASH_PATTERNS[idx]
}

/// Parse a `#rrggbb` or `#rgb` hex color. Falls back to black on
/// malformed input rather than failing; styling must never abort an
/// edit session.
pub fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let s = hex.trim_start_matches('#');
    let expanded: String = if s.len() == 3 {
        s.chars().flat_map(|c| [c, c]).collect()
    } else {
        s.to_string()
    };
    match u32::from_str_radix(&expanded, 16) {
        Ok(v) if expanded.len() == 6 => (((v >> 16) & 255) as u8, ((v >> 8) & 255) as u8, (v & 255) as u8),
        _ => (0, 0, 0),
    }
}

/// Darken a hex color by multiplying its RGB channels down.
/// `amount` is clamped to `0.0..=1.0`.
pub fn darken(hex: &str, amount: f64) -> String {
    let (r, g, b) = hex_to_rgb(hex);
    let k = (1.0 - amount).clamp(0.0, 1.0);
    let scale = |c: u8| (f64::from(c) * k).round() as u8;
    format!("#{:02x}{:02x}{:02x}", scale(r), scale(g), scale(b))
}

/// Per-zone style settings: stroke/fill color, stroke weight, fill opacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub color: String,
    pub weight: f64,
    pub fill_opacity: f64,
}

impl StyleConfig {
    /// Default style for a zone that has no saved override.
    ///
    /// Color comes from the zone's id; inactive zones keep their color
    /// but render thinner and more transparent.
    pub fn default_for(zone_id: u64, is_active: bool) -> Self {
        Self {
            color: default_color(zone_id).to_string(),
            weight: if is_active { 2.5 } else { 2.0 },
            fill_opacity: if is_active { 0.25 } else { 0.15 },
        }
    }
}

/// Resolved rendering style for one polygon, in map-library terms.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    /// Stroke color.
    pub color: String,
    pub weight: f64,
    /// Dash pattern, `None` for a solid outline.
    pub dash_array: Option<&'static str>,
    pub fill_color: String,
    pub fill_opacity: f64,
}

/// Style for the currently selected zone's stored ring: solid outline in
/// a darkened stroke of the base color, more opaque fill.
pub fn selected_style(base: &StyleConfig) -> PathStyle {
    PathStyle {
        color: darken(&base.color, 0.22),
        weight: 3.0,
        dash_array: None,
        fill_color: base.color.clone(),
        fill_opacity: 0.32,
    }
}

/// Muted style for unselected zones: darker dashed outline, faint fill.
/// The dash pattern is derived from the id so overlapping zones stay
/// tellable apart.
pub fn muted_style(zone_id: u64, base: &StyleConfig) -> PathStyle {
    PathStyle {
        color: darken(&base.color, 0.22),
        weight: 1.8,
        dash_array: Some(dash_for(zone_id)),
        fill_color: base.color.clone(),
        fill_opacity: 0.18,
    }
}

/// Live style for the ring under edit, straight from the session's
/// `StyleConfig`.
pub fn editing_style(cfg: &StyleConfig) -> PathStyle {
    PathStyle {
        color: cfg.color.clone(),
        weight: cfg.weight,
        dash_array: None,
        fill_color: cfg.color.clone(),
        fill_opacity: cfg.fill_opacity,
    }
}

/// Effective style for a zone: the saved override verbatim if one
/// exists, otherwise the deterministic default.
pub fn effective_style(zone_id: u64, is_active: bool, overrides: &dyn KvStore) -> StyleConfig {
    crate::store::StyleOverrides::load(overrides, zone_id)
        .unwrap_or_else(|| StyleConfig::default_for(zone_id, is_active))
}

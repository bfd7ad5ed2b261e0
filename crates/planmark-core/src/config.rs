//! Editor tuning knobs.
//!
//! All pointer tolerances are expressed in screen pixels and converted to
//! model units by dividing by the current view scale, so hit targets keep a
//! constant on-screen size at every zoom level.

use serde::{Deserialize, Serialize};

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Runtime configuration for the editor core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Radius around a handle that counts as a hit (screen px).
    pub handle_radius: f64,
    /// Radius around the first vertex that closes a multi-point shape (screen px).
    pub close_radius: f64,
    /// Distance tolerance for line-like shapes (screen px).
    pub hit_tolerance: f64,
    /// Minimum width/height or length for a drawn shape (screen px).
    pub min_draw_size: f64,
    /// Minimum symbol size on commit (screen px).
    pub min_symbol_size: f64,
    /// Minimum box size while resizing (model units).
    pub min_box_size: f64,
    /// Size of a freshly placed text box (screen px).
    pub text_default_size: (f64, f64),
    /// Default font size for new text shapes (model units).
    pub text_font_size: f64,
    /// Offset of the rotation handle above a symbol's top edge (screen px).
    pub rotate_handle_offset: f64,
    /// Offset of polyline extend/retract affordances from the end vertex (screen px).
    pub polyline_affordance_offset: f64,
    /// Multiplicative zoom step for one wheel notch.
    pub zoom_step: f64,
    /// Lower scale clamp.
    pub min_scale: f64,
    /// Upper scale clamp.
    pub max_scale: f64,
    /// Fraction of the container used by fit-to-content.
    pub fit_margin: f64,
    /// Undo stack depth.
    pub history_depth: usize,
    /// Minimum interval between two view-state writes (milliseconds).
    pub persist_debounce_ms: u64,
    /// Offset applied to pasted shapes (model units).
    pub paste_offset: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_radius: 8.0,
            close_radius: 10.0,
            hit_tolerance: 6.0,
            min_draw_size: 5.0,
            min_symbol_size: 16.0,
            min_box_size: 5.0,
            text_default_size: (160.0, 40.0),
            text_font_size: 16.0,
            rotate_handle_offset: 30.0,
            polyline_affordance_offset: 18.0,
            zoom_step: 1.1,
            min_scale: 0.1,
            max_scale: 5.0,
            fit_margin: 0.9,
            history_depth: MAX_UNDO_HISTORY,
            persist_debounce_ms: 500,
            paste_offset: 20.0,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(r#"{ "close_radius": 14.0 }"#).unwrap();
        assert!((config.close_radius - 14.0).abs() < f64::EPSILON);
        assert_eq!(config.history_depth, MAX_UNDO_HISTORY);
        assert!((config.max_scale - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip() {
        let config = EditorConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json(&json).unwrap(), config);
    }
}

//! Calibrated real-world measurement.

use crate::error::{EditorError, EditorResult};
use crate::geometry::{polygon_area, polyline_length};
use crate::shapes::{Geometry, Shape, ShapeKind};
use serde::{Deserialize, Serialize};

/// Default unit label for new calibrations.
pub const DEFAULT_UNIT: &str = "m";

/// Pixels per real-world unit for a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub pixels_per_unit: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

impl Calibration {
    /// Derive a calibration from a reference line of `pixels` model units
    /// that the user says measures `real_length` units.
    pub fn from_reference(pixels: f64, real_length: f64, unit: impl Into<String>) -> EditorResult<Self> {
        if !(pixels.is_finite() && pixels > 0.0) {
            return Err(EditorError::InvalidCalibration(format!(
                "reference line has length {pixels}"
            )));
        }
        if !(real_length.is_finite() && real_length > 0.0) {
            return Err(EditorError::InvalidCalibration(format!(
                "real length must be positive, got {real_length}"
            )));
        }
        Ok(Self {
            pixels_per_unit: pixels / real_length,
            unit: unit.into(),
        })
    }

    /// Convert a model-space length to real units.
    pub fn to_units(&self, pixels: f64) -> f64 {
        pixels / self.pixels_per_unit
    }

    /// Convert a model-space area to real square units.
    pub fn to_square_units(&self, square_pixels: f64) -> f64 {
        square_pixels / (self.pixels_per_unit * self.pixels_per_unit)
    }
}

/// Format a length, in calibrated units when available.
pub fn format_length(pixels: f64, calibration: Option<&Calibration>) -> String {
    match calibration {
        Some(cal) => format!("{:.2} {}", cal.to_units(pixels), cal.unit),
        None => format!("{pixels:.0} px"),
    }
}

/// Format an area, in calibrated square units when available.
pub fn format_area(square_pixels: f64, calibration: Option<&Calibration>) -> String {
    match calibration {
        Some(cal) => format!("{:.2} {}²", cal.to_square_units(square_pixels), cal.unit),
        None => format!("{square_pixels:.0} px²"),
    }
}

/// Raw model-space measurement of a shape: length for segment and
/// polyline kinds, area for closed kinds.
pub fn raw_measure(shape: &Shape) -> Option<f64> {
    match &shape.geometry {
        Geometry::Segment(segment) => Some(segment.length()),
        Geometry::Path(path) if shape.kind().is_open_path() => Some(polyline_length(&path.points)),
        Geometry::Path(path) => Some(polygon_area(&path.points)),
        _ => None,
    }
}

/// Label for measurement kinds (`measure-length`, `measure-area`).
pub fn measurement_label(shape: &Shape, calibration: Option<&Calibration>) -> Option<String> {
    if !shape.kind().is_measurement() {
        return None;
    }
    let value = raw_measure(shape)?;
    Some(match shape.kind() {
        ShapeKind::MeasureArea => format_area(value, calibration),
        _ => format_length(value, calibration),
    })
}

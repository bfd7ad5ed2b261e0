//! Error types for the editor core.

use crate::layout::LayoutId;
use crate::shapes::{ShapeId, ShapeKind};
use thiserror::Error;

/// Errors raised by store, layout and calibration operations.
///
/// None of these are fatal to an editing session: the interaction loop logs
/// them and carries on.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Unknown shape: {0}")]
    UnknownShape(ShapeId),
    #[error("Unknown layout: {0}")]
    UnknownLayout(LayoutId),
    #[error("Shape {id} has geometry that does not match kind {kind:?}")]
    GeometryMismatch { id: ShapeId, kind: ShapeKind },
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),
    #[error("Cannot remove the last layout")]
    LastLayout,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

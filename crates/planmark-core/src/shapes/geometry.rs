//! Per-kind geometry payloads.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Geometry representation family. Every [`super::ShapeKind`] maps to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryClass {
    Box,
    Path,
    Segment,
    Text,
    Symbol,
}

/// Axis-aligned box anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxGeometry {
    /// Build from any rect, normalizing negative extents.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// Vertex list with cached bounds.
///
/// `points` is authoritative; `bounds` is recomputed whenever the points
/// change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGeometry {
    pub points: Vec<Point>,
    #[serde(default = "empty_rect")]
    pub bounds: Rect,
}

fn empty_rect() -> Rect {
    Rect::ZERO
}

impl PathGeometry {
    pub fn new(points: Vec<Point>) -> Self {
        let bounds = points_bounds(&points);
        Self { points, bounds }
    }

    pub fn refresh_bounds(&mut self) {
        self.bounds = points_bounds(&self.points);
    }

    pub fn set_points(&mut self, points: Vec<Point>) {
        self.points = points;
        self.refresh_bounds();
    }
}

/// Bounding rect of a point list (zero rect when empty).
pub(crate) fn points_bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |rect, p| rect.union_pt(*p))
}

/// Two-point segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentGeometry {
    pub start: Point,
    pub end: Point,
}

impl SegmentGeometry {
    pub fn length(&self) -> f64 {
        (self.end - self.start).hypot()
    }

    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }
}

/// Text box with content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGeometry {
    #[serde(flatten)]
    pub frame: BoxGeometry,
    #[serde(default)]
    pub content: String,
    pub font_size: f64,
}

/// Placed library symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolGeometry {
    #[serde(flatten)]
    pub frame: BoxGeometry,
    pub symbol_id: String,
    /// Rotation about the box center, in degrees.
    #[serde(default)]
    pub rotation: f64,
}

/// Kind-specific geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Box(BoxGeometry),
    Path(PathGeometry),
    Segment(SegmentGeometry),
    Text(TextGeometry),
    Symbol(SymbolGeometry),
}

impl Geometry {
    pub fn class(&self) -> GeometryClass {
        match self {
            Geometry::Box(_) => GeometryClass::Box,
            Geometry::Path(_) => GeometryClass::Path,
            Geometry::Segment(_) => GeometryClass::Segment,
            Geometry::Text(_) => GeometryClass::Text,
            Geometry::Symbol(_) => GeometryClass::Symbol,
        }
    }

    /// The box frame for box, text and symbol geometry.
    pub fn frame(&self) -> Option<&BoxGeometry> {
        match self {
            Geometry::Box(frame) => Some(frame),
            Geometry::Text(text) => Some(&text.frame),
            Geometry::Symbol(symbol) => Some(&symbol.frame),
            Geometry::Path(_) | Geometry::Segment(_) => None,
        }
    }

    pub fn frame_mut(&mut self) -> Option<&mut BoxGeometry> {
        match self {
            Geometry::Box(frame) => Some(frame),
            Geometry::Text(text) => Some(&mut text.frame),
            Geometry::Symbol(symbol) => Some(&mut symbol.frame),
            Geometry::Path(_) | Geometry::Segment(_) => None,
        }
    }
}

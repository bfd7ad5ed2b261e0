//! Shape (zone) definitions.
//!
//! A shape is a single tagged-union record: a [`ShapeKind`] tag, one
//! [`Geometry`] variant, and the metadata every zone carries. Geometry
//! operations dispatch on the variant in free functions (see
//! [`crate::geometry`] and [`path`]).

mod geometry;
mod meta;
pub mod path;

pub use geometry::{BoxGeometry, Geometry, GeometryClass, PathGeometry, SegmentGeometry, SymbolGeometry, TextGeometry};
pub use meta::{LinkedActivity, ZoneMeta};

use crate::error::{EditorError, EditorResult};
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Anything else yields `None`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => Some(Self::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
                255,
            )),
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb` (alpha dropped).
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Multiply the alpha channel by `opacity` (clamped to 0..=1).
    pub fn with_opacity(self, opacity: f64) -> Self {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a: alpha, ..self }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    /// Cycle to the next line style.
    pub fn next(self) -> Self {
        match self {
            LineStyle::Solid => LineStyle::Dashed,
            LineStyle::Dashed => LineStyle::Dotted,
            LineStyle::Dotted => LineStyle::Solid,
        }
    }
}

/// Hatch pattern drawn over a shape's fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPattern {
    #[default]
    None,
    /// Parallel diagonal lines.
    Diagonal,
    /// Two crossing diagonal families.
    Cross,
    /// Horizontal plus vertical lines.
    Grid,
    Horizontal,
    Vertical,
}

impl FillPattern {
    /// Cycle to the next fill pattern.
    pub fn next(self) -> Self {
        match self {
            FillPattern::None => FillPattern::Diagonal,
            FillPattern::Diagonal => FillPattern::Cross,
            FillPattern::Cross => FillPattern::Grid,
            FillPattern::Grid => FillPattern::Horizontal,
            FillPattern::Horizontal => FillPattern::Vertical,
            FillPattern::Vertical => FillPattern::None,
        }
    }
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Interior color.
    pub fill_color: SerializableColor,
    /// Border color.
    pub border_color: SerializableColor,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Border width in screen pixels at 100% zoom.
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default)]
    pub line_style: LineStyle,
    #[serde(default)]
    pub fill_pattern: FillPattern,
}

fn default_opacity() -> f64 {
    0.5
}

fn default_stroke_width() -> f64 {
    2.0
}

impl ShapeStyle {
    /// Fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Color {
        self.fill_color.with_opacity(self.opacity).into()
    }

    /// Border color. Borders stay opaque so faint zones remain readable.
    pub fn border(&self) -> Color {
        self.border_color.into()
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill_color: SerializableColor::new(59, 130, 246, 255),
            border_color: SerializableColor::new(30, 64, 175, 255),
            opacity: default_opacity(),
            stroke_width: default_stroke_width(),
            line_style: LineStyle::default(),
            fill_pattern: FillPattern::default(),
        }
    }
}

/// Shape kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    Rect,
    DrawRect,
    Ellipse,
    Polygon,
    Cloud,
    MeasureArea,
    DrawPoly,
    MeasureLength,
    Line,
    Arrow,
    CalibrationLine,
    Text,
    Symbol,
}

impl ShapeKind {
    /// Which geometry representation this kind must carry.
    pub fn geometry_class(self) -> GeometryClass {
        match self {
            ShapeKind::Rect | ShapeKind::DrawRect | ShapeKind::Ellipse => GeometryClass::Box,
            ShapeKind::Polygon | ShapeKind::Cloud | ShapeKind::MeasureArea | ShapeKind::DrawPoly => {
                GeometryClass::Path
            }
            ShapeKind::MeasureLength | ShapeKind::Line | ShapeKind::Arrow | ShapeKind::CalibrationLine => {
                GeometryClass::Segment
            }
            ShapeKind::Text => GeometryClass::Text,
            ShapeKind::Symbol => GeometryClass::Symbol,
        }
    }

    /// Closed multi-vertex kinds (hit-tested by ray casting).
    pub fn is_closed_path(self) -> bool {
        matches!(self, ShapeKind::Polygon | ShapeKind::Cloud | ShapeKind::MeasureArea)
    }

    /// Open polyline kind.
    pub fn is_open_path(self) -> bool {
        self == ShapeKind::DrawPoly
    }

    /// Kinds whose label shows a calibrated measurement.
    pub fn is_measurement(self) -> bool {
        matches!(self, ShapeKind::MeasureLength | ShapeKind::MeasureArea)
    }

    /// Kinds that are stroked only (no interior fill).
    pub fn is_stroke_only(self) -> bool {
        matches!(
            self,
            ShapeKind::DrawPoly
                | ShapeKind::MeasureLength
                | ShapeKind::Line
                | ShapeKind::Arrow
                | ShapeKind::CalibrationLine
        )
    }
}

/// A drawable, selectable annotation on a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    kind: ShapeKind,
    /// Kind-specific geometry. Always matches `kind` for shapes built through
    /// the constructors; deserialized shapes are checked with
    /// [`Shape::validate`].
    pub geometry: Geometry,
    #[serde(default)]
    pub style: ShapeStyle,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub meta: ZoneMeta,
}

impl Shape {
    /// Build a shape, rejecting a geometry that does not fit the kind.
    pub fn new(kind: ShapeKind, geometry: Geometry) -> EditorResult<Self> {
        let mut shape = Self::with_geometry(kind, geometry);
        shape.validate()?;
        shape.refresh_bounds();
        Ok(shape)
    }

    fn with_geometry(kind: ShapeKind, geometry: Geometry) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            geometry,
            style: ShapeStyle::default(),
            hidden: false,
            meta: ZoneMeta::default(),
        }
    }

    fn boxed(kind: ShapeKind, rect: Rect) -> Self {
        Self::with_geometry(kind, Geometry::Box(BoxGeometry::from_rect(rect)))
    }

    fn vertices(kind: ShapeKind, points: Vec<Point>) -> Self {
        Self::with_geometry(kind, Geometry::Path(PathGeometry::new(points)))
    }

    fn segment(kind: ShapeKind, start: Point, end: Point) -> Self {
        Self::with_geometry(kind, Geometry::Segment(SegmentGeometry { start, end }))
    }

    pub fn rectangle(rect: Rect) -> Self {
        Self::boxed(ShapeKind::Rect, rect)
    }

    pub fn draw_rect(rect: Rect) -> Self {
        Self::boxed(ShapeKind::DrawRect, rect)
    }

    pub fn ellipse(rect: Rect) -> Self {
        Self::boxed(ShapeKind::Ellipse, rect)
    }

    pub fn polygon(points: Vec<Point>) -> Self {
        Self::vertices(ShapeKind::Polygon, points)
    }

    pub fn cloud(points: Vec<Point>) -> Self {
        Self::vertices(ShapeKind::Cloud, points)
    }

    pub fn measure_area(points: Vec<Point>) -> Self {
        Self::vertices(ShapeKind::MeasureArea, points)
    }

    /// Open polyline (`draw-poly`).
    pub fn polyline(points: Vec<Point>) -> Self {
        Self::vertices(ShapeKind::DrawPoly, points)
    }

    pub fn line(start: Point, end: Point) -> Self {
        Self::segment(ShapeKind::Line, start, end)
    }

    pub fn arrow(start: Point, end: Point) -> Self {
        Self::segment(ShapeKind::Arrow, start, end)
    }

    pub fn measure_length(start: Point, end: Point) -> Self {
        Self::segment(ShapeKind::MeasureLength, start, end)
    }

    pub fn calibration_line(start: Point, end: Point) -> Self {
        Self::segment(ShapeKind::CalibrationLine, start, end)
    }

    pub fn text(rect: Rect, content: impl Into<String>, font_size: f64) -> Self {
        Self::with_geometry(
            ShapeKind::Text,
            Geometry::Text(TextGeometry {
                frame: BoxGeometry::from_rect(rect),
                content: content.into(),
                font_size,
            }),
        )
    }

    pub fn symbol(rect: Rect, symbol_id: impl Into<String>) -> Self {
        Self::with_geometry(
            ShapeKind::Symbol,
            Geometry::Symbol(SymbolGeometry {
                frame: BoxGeometry::from_rect(rect),
                symbol_id: symbol_id.into(),
                rotation: 0.0,
            }),
        )
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Check that the geometry variant fits the kind tag.
    pub fn validate(&self) -> EditorResult<()> {
        if self.geometry.class() == self.kind.geometry_class() {
            Ok(())
        } else {
            Err(EditorError::GeometryMismatch {
                id: self.id,
                kind: self.kind,
            })
        }
    }

    /// Bounding box in model coordinates.
    pub fn bounds(&self) -> Rect {
        crate::geometry::bounding_box(self)
    }

    /// Recompute derived bounds after the authoritative geometry changed.
    pub fn refresh_bounds(&mut self) {
        if let Geometry::Path(path) = &mut self.geometry {
            path.refresh_bounds();
        }
    }

    /// Move the whole shape by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        match &mut self.geometry {
            Geometry::Box(frame) => frame.translate(delta),
            Geometry::Path(path) => {
                for point in &mut path.points {
                    *point += delta;
                }
                path.refresh_bounds();
            }
            Geometry::Segment(segment) => {
                segment.start += delta;
                segment.end += delta;
            }
            Geometry::Text(text) => text.frame.translate(delta),
            Geometry::Symbol(symbol) => symbol.frame.translate(delta),
        }
    }

    /// Vertex list for path kinds.
    pub fn points(&self) -> Option<&[Point]> {
        match &self.geometry {
            Geometry::Path(path) => Some(&path.points),
            _ => None,
        }
    }

    /// Endpoints for segment kinds.
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        match &self.geometry {
            Geometry::Segment(segment) => Some((segment.start, segment.end)),
            _ => None,
        }
    }

    /// Rotation in degrees (symbols only, 0 otherwise).
    pub fn rotation(&self) -> f64 {
        match &self.geometry {
            Geometry::Symbol(symbol) => symbol.rotation,
            _ => 0.0,
        }
    }

    /// Whether any schedule activity is linked to this shape.
    pub fn is_connected(&self) -> bool {
        !self.meta.activities.is_empty()
    }

    /// Give the shape a fresh identifier (used for paste/duplicate).
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.meta.name = name.into();
        self
    }
}

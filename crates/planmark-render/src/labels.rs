//! Label text, label placement and scale-aware sizes.
//!
//! Every size here is in model units. Screen metrics divide pixel sizes by
//! the view scale so text and hairlines keep their on-screen size at any
//! zoom. Export metrics derive them from the drawing width instead.

use crate::renderer::RenderMode;
use kurbo::{Cap, Point, Stroke, Vec2};
use planmark_core::geometry::{bounding_box, polygon_centroid};
use planmark_core::measure::{Calibration, format_length, measurement_label};
use planmark_core::shapes::{Geometry, LineStyle, Shape, ShapeKind, ShapeStyle};
use std::f64::consts::{FRAC_PI_2, PI};

/// Label height on screen, in pixels.
pub const SCREEN_LABEL_PX: f64 = 12.0;
/// Export label height as a fraction of the drawing width.
pub const EXPORT_LABEL_RATIO: f64 = 0.012;
pub const EXPORT_LABEL_MIN: f64 = 10.0;
pub const EXPORT_LABEL_MAX: f64 = 72.0;
/// Gap between fill-pattern lines on screen, in pixels.
pub const SCREEN_PATTERN_SPACING_PX: f64 = 10.0;

/// Sizes for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelMetrics {
    pub font_size: f64,
    /// One output pixel; the thinnest stroke drawn.
    pub hairline: f64,
    pub pattern_spacing: f64,
}

impl LabelMetrics {
    pub fn screen(view_scale: f64) -> Self {
        let scale = if view_scale.is_finite() && view_scale > 0.0 {
            view_scale
        } else {
            1.0
        };
        Self {
            font_size: SCREEN_LABEL_PX / scale,
            hairline: 1.0 / scale,
            pattern_spacing: SCREEN_PATTERN_SPACING_PX / scale,
        }
    }

    /// Export renders one model unit per output pixel.
    pub fn export(reference_width: f64) -> Self {
        let font_size = if reference_width.is_finite() {
            (reference_width * EXPORT_LABEL_RATIO).clamp(EXPORT_LABEL_MIN, EXPORT_LABEL_MAX)
        } else {
            EXPORT_LABEL_MIN
        };
        Self {
            font_size,
            hairline: 1.0,
            pattern_spacing: SCREEN_PATTERN_SPACING_PX * font_size / SCREEN_LABEL_PX,
        }
    }

    pub fn for_mode(mode: RenderMode, view_scale: f64, reference_width: f64) -> Self {
        match mode {
            RenderMode::Screen => Self::screen(view_scale),
            RenderMode::Export => Self::export(reference_width),
        }
    }

    /// Border width for a style width, never thinner than a hairline.
    pub fn stroke_width(&self, style_width: f64) -> f64 {
        if style_width.is_finite() {
            style_width.max(self.hairline)
        } else {
            self.hairline
        }
    }

    /// Border stroke with the dash pattern of the style's line style.
    pub fn border_stroke(&self, style: &ShapeStyle) -> Stroke {
        let width = self.stroke_width(style.stroke_width);
        match style.line_style {
            LineStyle::Solid => Stroke::new(width),
            LineStyle::Dashed => Stroke::new(width).with_dashes(0.0, [width * 4.0, width * 3.0]),
            LineStyle::Dotted => Stroke::new(width)
                .with_caps(Cap::Round)
                .with_dashes(0.0, [width, width * 2.0]),
        }
    }
}

/// Where a label's center sits and how it is turned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub center: Point,
    /// Radians, kept within ±π/2 so text never reads upside down.
    pub angle: f64,
}

/// Label text: the measurement for measurement kinds, the reference length
/// for calibration lines, otherwise the zone name. Text shapes draw their
/// content instead.
pub fn label_text(shape: &Shape, calibration: Option<&Calibration>) -> Option<String> {
    if let Some(measure) = measurement_label(shape, calibration) {
        return Some(measure);
    }
    match shape.kind() {
        ShapeKind::Text => None,
        ShapeKind::CalibrationLine => shape
            .endpoints()
            .map(|(start, end)| format_length(start.distance(end), calibration)),
        _ => (!shape.meta.name.trim().is_empty()).then(|| shape.meta.name.clone()),
    }
}

/// Placement of a shape's label for the given font size.
pub fn label_placement(shape: &Shape, font_size: f64) -> Option<LabelPlacement> {
    let gap = font_size * 0.9;
    match &shape.geometry {
        Geometry::Segment(segment) => Some(along_segment(segment.start, segment.end, gap)),
        Geometry::Path(path) if shape.kind().is_open_path() => halfway_along(&path.points, gap),
        Geometry::Path(path) => polygon_centroid(&path.points).map(|center| LabelPlacement { center, angle: 0.0 }),
        Geometry::Box(frame) => Some(LabelPlacement {
            center: frame.center(),
            angle: 0.0,
        }),
        Geometry::Text(_) => None,
        Geometry::Symbol(_) => {
            let bounds = bounding_box(shape);
            Some(LabelPlacement {
                center: Point::new(bounds.center().x, bounds.y1 + gap),
                angle: 0.0,
            })
        }
    }
}

/// Midpoint of a segment, lifted by `gap` along the normal that points up
/// relative to the label.
fn along_segment(start: Point, end: Point, gap: f64) -> LabelPlacement {
    let delta = end - start;
    let length = delta.hypot();
    if length < f64::EPSILON {
        return LabelPlacement {
            center: start - Vec2::new(0.0, gap),
            angle: 0.0,
        };
    }
    let angle = upright(delta.y.atan2(delta.x));
    let up = Vec2::new(angle.sin(), -angle.cos());
    LabelPlacement {
        center: start.midpoint(end) + up * gap,
        angle,
    }
}

fn halfway_along(points: &[Point], gap: f64) -> Option<LabelPlacement> {
    let (first, _) = points.split_first()?;
    let total: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    let mut remaining = total / 2.0;
    for w in points.windows(2) {
        let length = w[0].distance(w[1]);
        if remaining <= length && length > f64::EPSILON {
            let at = w[0].lerp(w[1], remaining / length);
            let mut placement = along_segment(w[0], w[1], gap);
            placement.center = at + (placement.center - w[0].midpoint(w[1]));
            return Some(placement);
        }
        remaining -= length;
    }
    Some(along_segment(*first, *first, gap))
}

fn upright(angle: f64) -> f64 {
    if angle > FRAC_PI_2 {
        angle - PI
    } else if angle < -FRAC_PI_2 {
        angle + PI
    } else {
        angle
    }
}

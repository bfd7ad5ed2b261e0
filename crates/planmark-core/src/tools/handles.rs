//! Manipulation handles of the selected shape.
//!
//! Handle positions are in model coordinates. Offsets that should stay a
//! constant size on screen are divided by the view scale.

use crate::config::EditorConfig;
use crate::shapes::{Geometry, Shape, ShapeKind};
use kurbo::{Affine, Point, Rect, Vec2};

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::TopLeft, Corner::TopRight, Corner::BottomLeft, Corner::BottomRight];

    pub fn of(self, rect: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.x0, rect.y0),
            Corner::TopRight => Point::new(rect.x1, rect.y0),
            Corner::BottomLeft => Point::new(rect.x0, rect.y1),
            Corner::BottomRight => Point::new(rect.x1, rect.y1),
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// Which end of a segment or polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum End {
    Start,
    End,
}

/// Vertical edges of a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEdge {
    Top,
    Bottom,
}

/// Type of manipulation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Box corner (rect, draw-rect, ellipse, symbol).
    Corner(Corner),
    /// Segment endpoint.
    Endpoint(End),
    /// Vertex of a polygon, cloud, area or polyline.
    Vertex(usize),
    /// Symbol rotation knob.
    Rotate,
    /// Continue drawing a polyline from this end.
    Extend(End),
    /// Drop the terminal vertex at this end.
    Retract(End),
    /// Text box top or bottom edge.
    TextEdge(TextEdge),
}

/// A handle with its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a model-space point hits this handle. `tolerance` must
    /// already be divided by the view scale.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Handles of a shape at the given view scale.
pub fn handles_for(shape: &Shape, scale: f64, config: &EditorConfig) -> Vec<Handle> {
    let scale = scale.max(f64::EPSILON);
    match &shape.geometry {
        Geometry::Box(frame) => Corner::ALL
            .iter()
            .map(|c| Handle::new(c.of(frame.rect()), HandleKind::Corner(*c)))
            .collect(),
        Geometry::Segment(segment) => vec![
            Handle::new(segment.start, HandleKind::Endpoint(End::Start)),
            Handle::new(segment.end, HandleKind::Endpoint(End::End)),
        ],
        Geometry::Path(path) => {
            let mut handles: Vec<Handle> = path
                .points
                .iter()
                .enumerate()
                .map(|(i, p)| Handle::new(*p, HandleKind::Vertex(i)))
                .collect();
            if shape.kind() == ShapeKind::DrawPoly {
                handles.extend(polyline_affordances(&path.points, config.polyline_affordance_offset / scale));
            }
            handles
        }
        Geometry::Text(text) => {
            let rect = text.frame.rect();
            let mid_x = rect.center().x;
            vec![
                Handle::new(Point::new(mid_x, rect.y0), HandleKind::TextEdge(TextEdge::Top)),
                Handle::new(Point::new(mid_x, rect.y1), HandleKind::TextEdge(TextEdge::Bottom)),
            ]
        }
        Geometry::Symbol(symbol) => {
            let rect = symbol.frame.rect();
            let rotate = Affine::rotate_about(symbol.rotation.to_radians(), rect.center());
            let mut handles: Vec<Handle> = Corner::ALL
                .iter()
                .map(|c| Handle::new(rotate * c.of(rect), HandleKind::Corner(*c)))
                .collect();
            let knob = Point::new(rect.center().x, rect.y0 - config.rotate_handle_offset / scale);
            handles.push(Handle::new(rotate * knob, HandleKind::Rotate));
            handles
        }
    }
}

/// Extend/retract affordances placed beyond each end of a polyline, along
/// the direction of its terminal segment.
fn polyline_affordances(points: &[Point], offset: f64) -> Vec<Handle> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let outward = |tip: Point, neighbour: Option<&Point>| -> Vec2 {
        let dir = neighbour.map(|n| tip - *n).unwrap_or(Vec2::new(1.0, 0.0));
        let len = dir.hypot();
        if len < f64::EPSILON { Vec2::new(1.0, 0.0) } else { dir / len }
    };
    let start_dir = outward(first, points.get(1));
    let end_dir = outward(last, points.len().checked_sub(2).and_then(|i| points.get(i)));
    let perp = |d: Vec2| Vec2::new(-d.y, d.x);
    vec![
        Handle::new(first + start_dir * offset, HandleKind::Extend(End::Start)),
        Handle::new(first + perp(start_dir) * offset, HandleKind::Retract(End::Start)),
        Handle::new(last + end_dir * offset, HandleKind::Extend(End::End)),
        Handle::new(last + perp(end_dir) * offset, HandleKind::Retract(End::End)),
    ]
}

/// First handle within `handle_radius` screen pixels of a model-space point.
pub fn hit_test_handles(shape: &Shape, point: Point, scale: f64, config: &EditorConfig) -> Option<HandleKind> {
    let tolerance = config.handle_radius / scale.max(f64::EPSILON);
    handles_for(shape, scale, config)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

//! Outline path construction for rendering.

use super::{Geometry, Shape, ShapeKind};
use crate::geometry::signed_area;
use kurbo::{Affine, BezPath, Ellipse, Point, Shape as _, Vec2};

/// Length of the perpendicular ticks on measurement and calibration lines.
const TICK_SIZE: f64 = 8.0;

/// Build the outline path of a shape in model coordinates.
pub fn shape_path(shape: &Shape) -> BezPath {
    match &shape.geometry {
        Geometry::Box(frame) => match shape.kind() {
            ShapeKind::Ellipse => Ellipse::from_rect(frame.rect()).to_path(0.1),
            _ => frame.rect().to_path(0.1),
        },
        Geometry::Path(path) => match shape.kind() {
            ShapeKind::Cloud => cloud_path(&path.points),
            ShapeKind::DrawPoly => polyline_path(&path.points, false),
            _ => polyline_path(&path.points, true),
        },
        Geometry::Segment(segment) => {
            let mut path = polyline_path(&[segment.start, segment.end], false);
            match shape.kind() {
                ShapeKind::Arrow => {
                    let head_size = (shape.style.stroke_width * 4.0).max(12.0);
                    append_arrow_head(&mut path, segment.start, segment.end, head_size);
                }
                ShapeKind::MeasureLength | ShapeKind::CalibrationLine => {
                    append_end_ticks(&mut path, segment.start, segment.end);
                }
                _ => {}
            }
            path
        }
        Geometry::Text(text) => text.frame.rect().to_path(0.1),
        Geometry::Symbol(symbol) => {
            let rect = symbol.frame.rect();
            let rotate = Affine::rotate_about(symbol.rotation.to_radians(), rect.center());
            rotate * rect.to_path(0.1)
        }
    }
}

/// Straight-edged path through `points`, closed when requested.
pub fn polyline_path(points: &[Point], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let Some((first, rest)) = points.split_first() else {
        return path;
    };
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    if closed && points.len() > 2 {
        path.close_path();
    }
    path
}

/// Scalloped "revision cloud" outline: every edge is split into arcs that
/// bulge away from the polygon interior.
pub fn cloud_path(points: &[Point]) -> BezPath {
    if points.len() < 3 {
        return polyline_path(points, true);
    }
    let bounds = super::geometry::points_bounds(points);
    let arc_size = (bounds.width().min(bounds.height()) / 6.0).clamp(4.0, 40.0);
    // Outward normal side depends on winding.
    let orientation = signed_area(points).signum();
    let orientation = if orientation == 0.0 { 1.0 } else { orientation };

    let mut path = BezPath::new();
    path.move_to(points[0]);
    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        let edge = b - a;
        let length = edge.hypot();
        if length < f64::EPSILON {
            continue;
        }
        let count = (length / arc_size).round().max(1.0) as usize;
        let step = edge / count as f64;
        let normal = Vec2::new(step.y, -step.x) * orientation;
        for k in 0..count {
            let from = a + step * k as f64;
            let to = from + step;
            let control = from.midpoint(to) + normal * 0.6;
            path.quad_to(control, to);
        }
    }
    path.close_path();
    path
}

fn append_arrow_head(path: &mut BezPath, start: Point, end: Point, head_size: f64) {
    let shaft = end - start;
    let length = shaft.hypot();
    if length < f64::EPSILON {
        return;
    }
    let dir = shaft / length;
    let perp = Vec2::new(-dir.y, dir.x);
    let back = end - dir * head_size;
    path.move_to(end);
    path.line_to(back + perp * head_size * 0.5);
    path.move_to(end);
    path.line_to(back - perp * head_size * 0.5);
}

fn append_end_ticks(path: &mut BezPath, start: Point, end: Point) {
    let shaft = end - start;
    let length = shaft.hypot();
    if length < f64::EPSILON {
        return;
    }
    let perp = Vec2::new(-shaft.y, shaft.x) / length * (TICK_SIZE / 2.0);
    for p in [start, end] {
        path.move_to(p + perp);
        path.line_to(p - perp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{PathEl, Rect};

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]
    }

    #[test]
    fn test_polygon_path_is_closed() {
        let path = shape_path(&Shape::polygon(square()));
        assert!(matches!(path.elements().last(), Some(PathEl::ClosePath)));
    }

    #[test]
    fn test_polyline_path_is_open() {
        let path = shape_path(&Shape::polyline(square()));
        assert!(!path.elements().iter().any(|el| matches!(el, PathEl::ClosePath)));
    }

    #[test]
    fn test_cloud_bulges_outward() {
        let path = cloud_path(&square());
        let bounds = path.bounding_box();
        assert!(bounds.x0 < 0.0);
        assert!(bounds.y1 > 100.0);
    }

    #[test]
    fn test_degenerate_arrow_has_no_head() {
        let p = Point::new(5.0, 5.0);
        let path = shape_path(&Shape::arrow(p, p));
        assert_eq!(path.elements().len(), 2);
    }

    #[test]
    fn test_rotated_symbol_outline() {
        let mut shape = Shape::symbol(Rect::new(0.0, 0.0, 20.0, 10.0), "crane");
        if let Geometry::Symbol(symbol) = &mut shape.geometry {
            symbol.rotation = 90.0;
        }
        let bounds = shape_path(&shape).bounding_box();
        assert!((bounds.width() - 10.0).abs() < 1e-9);
        assert!((bounds.height() - 20.0).abs() < 1e-9);
    }
}

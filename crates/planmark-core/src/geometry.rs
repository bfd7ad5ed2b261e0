//! Geometry kernel: hit testing, bounds, areas and lengths.
//!
//! All functions take model coordinates. Tolerances passed in screen pixels
//! are divided by the view scale so they stay constant on screen.

use crate::shapes::{Geometry, Shape, ShapeKind};
use kurbo::{Affine, Point, Rect, Shape as _};

/// Whether `point` hits `shape`.
///
/// `scale` is the current view scale and `tolerance_px` the on-screen slop
/// used for line-like shapes.
pub fn contains_point(shape: &Shape, point: Point, scale: f64, tolerance_px: f64) -> bool {
    let tolerance = tolerance_px / scale.max(f64::EPSILON);
    match &shape.geometry {
        Geometry::Box(frame) => match shape.kind() {
            ShapeKind::Ellipse => ellipse_contains(frame.rect(), point, tolerance),
            _ => rect_contains(frame.rect(), point),
        },
        Geometry::Path(path) => {
            if shape.kind().is_open_path() {
                point_to_polyline_dist(point, &path.points) <= tolerance
            } else {
                point_in_polygon(point, &path.points)
            }
        }
        Geometry::Segment(segment) => point_to_segment_dist(point, segment.start, segment.end) <= tolerance,
        Geometry::Text(text) => rect_contains(text.frame.rect(), point),
        Geometry::Symbol(symbol) => {
            let rect = symbol.frame.rect();
            let unrotate = Affine::rotate_about(-symbol.rotation.to_radians(), rect.center());
            rect_contains(rect, unrotate * point)
        }
    }
}

/// Topmost shape under `point` among those accepted by `visible`.
///
/// Shapes later in the slice are drawn on top, so the search runs back to
/// front.
pub fn topmost_at<'a>(
    shapes: &'a [Shape],
    point: Point,
    scale: f64,
    tolerance_px: f64,
    visible: impl Fn(&Shape) -> bool,
) -> Option<&'a Shape> {
    shapes
        .iter()
        .rev()
        .find(|shape| visible(shape) && contains_point(shape, point, scale, tolerance_px))
}

/// Axis-aligned bounds in model coordinates.
pub fn bounding_box(shape: &Shape) -> Rect {
    match &shape.geometry {
        Geometry::Box(frame) => frame.rect(),
        Geometry::Path(path) => path.bounds,
        Geometry::Segment(segment) => Rect::from_points(segment.start, segment.end),
        Geometry::Text(text) => text.frame.rect(),
        Geometry::Symbol(symbol) => {
            let rect = symbol.frame.rect();
            if symbol.rotation == 0.0 {
                return rect;
            }
            let rotate = Affine::rotate_about(symbol.rotation.to_radians(), rect.center());
            (rotate * rect.to_path(0.1)).bounding_box()
        }
    }
}

/// Union of the bounds of all shapes, `None` when there are none.
pub fn union_bounds<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Option<Rect> {
    shapes
        .into_iter()
        .map(bounding_box)
        .reduce(|acc, rect| acc.union(rect))
}

/// Absolute polygon area (shoelace). Fewer than three points yields zero.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    signed_area(points).abs()
}

/// Shoelace area, positive for counter-clockwise vertices in a y-up frame.
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

/// Area-weighted polygon centroid, falling back to the vertex mean for
/// degenerate (zero-area) input. `None` for an empty list.
pub fn polygon_centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let area = signed_area(points);
    if points.len() < 3 || area.abs() < f64::EPSILON {
        let n = points.len() as f64;
        let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Some(Point::new(sx / n, sy / n));
    }
    let n = points.len();
    let (cx, cy) = (0..n).fold((0.0, 0.0), |(cx, cy), i| {
        let a = points[i];
        let b = points[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        (cx + (a.x + b.x) * cross, cy + (a.y + b.y) * cross)
    });
    Some(Point::new(cx / (6.0 * area), cy / (6.0 * area)))
}

/// Even-odd ray cast. Fewer than three vertices never contain a point.
pub fn point_in_polygon(point: Point, points: &[Point]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = pj.x + (point.y - pj.y) / (pi.y - pj.y) * (pi.x - pj.x);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Sum of segment lengths along an open polyline.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).hypot()).sum()
}

/// Distance from a point to a line segment.
pub fn point_to_segment_dist(point: Point, start: Point, end: Point) -> f64 {
    let line_vec = end - start;
    let point_vec = point - start;
    let line_len_sq = line_vec.hypot2();
    if line_len_sq < f64::EPSILON {
        return point_vec.hypot();
    }
    let t = (point_vec.dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
    (point - (start + line_vec * t)).hypot()
}

/// Distance from a point to the nearest segment of a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

fn ellipse_contains(rect: Rect, point: Point, tolerance: f64) -> bool {
    let center = rect.center();
    let rx = rect.width() / 2.0;
    let ry = rect.height() / 2.0;
    if rx < f64::EPSILON || ry < f64::EPSILON {
        // Collapsed to a line or point.
        let (a, b) = if rx < f64::EPSILON {
            (Point::new(center.x, rect.y0), Point::new(center.x, rect.y1))
        } else {
            (Point::new(rect.x0, center.y), Point::new(rect.x1, center.y))
        };
        return point_to_segment_dist(point, a, b) <= tolerance;
    }
    let dx = (point.x - center.x) / rx;
    let dy = (point.y - center.y) / ry;
    dx * dx + dy * dy <= 1.0
}

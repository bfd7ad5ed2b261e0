//! Fill-pattern hatching clipped to shape outlines.

use kurbo::{Ellipse, Line, PathEl, Point, Shape as _, Vec2};
use planmark_core::shapes::{FillPattern, Geometry, Shape, ShapeKind};

/// Upper bound on hatch lines per direction; tiny spacings on huge shapes
/// are capped rather than allowed to flood the scene.
const MAX_HATCH_LINES: usize = 4096;

const FLATTEN_TOLERANCE: f64 = 0.25;

/// Hatch directions in degrees for a pattern.
pub fn pattern_angles(pattern: FillPattern) -> &'static [f64] {
    match pattern {
        FillPattern::None => &[],
        FillPattern::Diagonal => &[45.0],
        FillPattern::Cross => &[45.0, -45.0],
        FillPattern::Grid => &[0.0, 90.0],
        FillPattern::Horizontal => &[0.0],
        FillPattern::Vertical => &[90.0],
    }
}

/// Closed outline of a fillable shape as a vertex loop. Stroke-only kinds,
/// text and symbols have none.
pub fn outline_polygon(shape: &Shape) -> Option<Vec<Point>> {
    match &shape.geometry {
        Geometry::Box(frame) if shape.kind() == ShapeKind::Ellipse => {
            let mut points = Vec::new();
            kurbo::flatten(
                Ellipse::from_rect(frame.rect()).path_elements(0.1),
                FLATTEN_TOLERANCE,
                |el| match el {
                    PathEl::MoveTo(p) | PathEl::LineTo(p) => points.push(p),
                    _ => {}
                },
            );
            Some(points)
        }
        Geometry::Box(frame) => {
            let rect = frame.rect();
            Some(vec![
                Point::new(rect.x0, rect.y0),
                Point::new(rect.x1, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ])
        }
        Geometry::Path(path) if shape.kind().is_closed_path() => Some(path.points.clone()),
        _ => None,
    }
}

/// Pattern line segments for a shape, `spacing` model units apart.
pub fn pattern_segments(shape: &Shape, spacing: f64) -> Vec<Line> {
    let angles = pattern_angles(shape.style.fill_pattern);
    if angles.is_empty() {
        return Vec::new();
    }
    let Some(polygon) = outline_polygon(shape) else {
        return Vec::new();
    };
    angles
        .iter()
        .flat_map(|&angle| hatch_segments(&polygon, angle, spacing))
        .collect()
}

/// Parallel lines at `angle_deg` clipped to `polygon` with the even-odd
/// rule. Lines sit on multiples of `spacing` measured from the origin, so
/// neighbouring shapes line up.
pub fn hatch_segments(polygon: &[Point], angle_deg: f64, spacing: f64) -> Vec<Line> {
    if polygon.len() < 3 || !(spacing.is_finite() && spacing > 0.0) {
        return Vec::new();
    }
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let dir = Vec2::new(cos, sin);
    let normal = Vec2::new(-sin, cos);

    let offsets = polygon.iter().map(|p| p.to_vec2().dot(normal));
    let (min, max) = offsets.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), o| (lo.min(o), hi.max(o)));
    // Lines grazing the outline within rounding noise are skipped.
    let eps = spacing * 1e-9;
    let first = ((min + eps) / spacing).floor() + 1.0;
    let count = (((max / spacing).ceil() - first).max(0.0) as usize).min(MAX_HATCH_LINES);

    let mut segments = Vec::new();
    let mut crossings: Vec<(f64, Point)> = Vec::new();
    for i in 0..count {
        let offset = (first + i as f64) * spacing;
        if offset >= max - eps {
            break;
        }
        crossings.clear();
        for (k, &a) in polygon.iter().enumerate() {
            let b = polygon[(k + 1) % polygon.len()];
            let da = a.to_vec2().dot(normal) - offset;
            let db = b.to_vec2().dot(normal) - offset;
            // Half-open test so a vertex on the line counts once.
            if (da < 0.0) != (db < 0.0) {
                let p = a.lerp(b, da / (da - db));
                crossings.push((p.to_vec2().dot(dir), p));
            }
        }
        crossings.sort_by(|x, y| x.0.total_cmp(&y.0));
        segments.extend(crossings.chunks_exact(2).map(|pair| Line::new(pair[0].1, pair[1].1)));
    }
    segments
}

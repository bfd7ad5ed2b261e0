//! Geometry changes driven by handles.
//!
//! Every function takes the shape as it was when the gesture began plus the
//! pointer delta since then, so repeated moves never accumulate drift.

use super::handles::{Corner, End, HandleKind, TextEdge};
use crate::shapes::{Geometry, Shape};
use kurbo::{Affine, Point, Rect, Vec2};

/// Apply a handle drag. Handles that do not move geometry (rotate,
/// extend, retract) return the shape unchanged.
pub fn apply_handle(original: &Shape, handle: HandleKind, delta: Vec2, min_size: f64) -> Shape {
    let mut shape = original.clone();
    match (handle, &mut shape.geometry) {
        (HandleKind::Corner(corner), Geometry::Box(frame)) => {
            *frame = crate::shapes::BoxGeometry::from_rect(resize_corner(frame.rect(), corner, delta, min_size));
        }
        (HandleKind::Corner(corner), Geometry::Symbol(symbol)) => {
            let rect = symbol.frame.rect();
            let angle = symbol.rotation.to_radians();
            // Resize in the symbol's own frame, then shift so the opposite
            // corner stays put on screen.
            let local_delta = Affine::rotate(-angle) * delta.to_point();
            let resized = resize_corner(rect, corner, local_delta.to_vec2(), min_size);
            let anchor = corner.opposite();
            let before = Affine::rotate_about(angle, rect.center()) * anchor.of(rect);
            let after = Affine::rotate_about(angle, resized.center()) * anchor.of(resized);
            symbol.frame = crate::shapes::BoxGeometry::from_rect(resized + (before - after));
        }
        (HandleKind::Endpoint(end), Geometry::Segment(segment)) => match end {
            End::Start => segment.start += delta,
            End::End => segment.end += delta,
        },
        (HandleKind::Vertex(index), Geometry::Path(path)) => {
            if let Some(point) = path.points.get_mut(index) {
                *point += delta;
            }
            path.refresh_bounds();
        }
        (HandleKind::TextEdge(edge), Geometry::Text(text)) => {
            let rect = text.frame.rect();
            let (y0, y1) = match edge {
                TextEdge::Top => ((rect.y0 + delta.y).min(rect.y1 - min_size), rect.y1),
                TextEdge::Bottom => (rect.y0, (rect.y1 + delta.y).max(rect.y0 + min_size)),
            };
            text.frame.y = y0;
            text.frame.height = y1 - y0;
        }
        _ => {}
    }
    shape
}

/// Move one corner, keeping the opposite corner fixed. The box never gets
/// smaller than `min_size` on either axis and never inverts.
pub fn resize_corner(rect: Rect, corner: Corner, delta: Vec2, min_size: f64) -> Rect {
    let mut r = rect;
    match corner {
        Corner::TopLeft => {
            r.x0 = (rect.x0 + delta.x).min(rect.x1 - min_size);
            r.y0 = (rect.y0 + delta.y).min(rect.y1 - min_size);
        }
        Corner::TopRight => {
            r.x1 = (rect.x1 + delta.x).max(rect.x0 + min_size);
            r.y0 = (rect.y0 + delta.y).min(rect.y1 - min_size);
        }
        Corner::BottomLeft => {
            r.x0 = (rect.x0 + delta.x).min(rect.x1 - min_size);
            r.y1 = (rect.y1 + delta.y).max(rect.y0 + min_size);
        }
        Corner::BottomRight => {
            r.x1 = (rect.x1 + delta.x).max(rect.x0 + min_size);
            r.y1 = (rect.y1 + delta.y).max(rect.y0 + min_size);
        }
    }
    r
}

/// Angle of the rotation knob at rest (straight above the center), in
/// degrees.
pub const ROTATE_REST_ANGLE: f64 = -90.0;

/// Symbol rotation in degrees for a pointer at `pointer`, normalized to
/// `[0, 360)`.
pub fn rotation_for_pointer(center: Point, pointer: Point) -> Option<f64> {
    let offset = pointer - center;
    if offset.hypot2() < f64::EPSILON {
        return None;
    }
    let angle = offset.y.atan2(offset.x).to_degrees() - ROTATE_REST_ANGLE;
    Some(angle.rem_euclid(360.0))
}

/// Set the rotation of a symbol shape. Other kinds are left alone.
pub fn apply_rotation(shape: &mut Shape, degrees: f64) {
    if let Geometry::Symbol(symbol) = &mut shape.geometry {
        symbol.rotation = degrees;
    }
}

/// Remove the terminal vertex at `end`. Returns `false` when fewer than two
/// vertices would remain, in which case the shape should be deleted.
pub fn retract(shape: &mut Shape, end: End) -> bool {
    let Geometry::Path(path) = &mut shape.geometry else {
        return true;
    };
    if path.points.len() <= 2 {
        return false;
    }
    match end {
        End::Start => {
            path.points.remove(0);
        }
        End::End => {
            path.points.pop();
        }
    }
    path.refresh_bounds();
    true
}

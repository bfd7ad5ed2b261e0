//! Property tests for the geometry kernel, view transform and history.

use kurbo::{Point, Rect, Vec2};
use planmark_core::geometry::{bounding_box, contains_point, polygon_area, polygon_centroid};
use planmark_core::shapes::Geometry;
use planmark_core::tools::handles_for;
use planmark_core::{
    Editor, EditorConfig, History, KeyAction, PointerEvent, ReorderDirection, Shape, ShapeStore, ToolKind,
    ViewTransform, ZoomDirection,
};
use proptest::prelude::*;

fn point() -> impl Strategy<Value = Point> {
    (-1000.0f64..1000.0, -1000.0f64..1000.0).prop_map(|(x, y)| Point::new(x, y))
}

fn polygon() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec(point(), 3..12)
}

/// An editing action, with positions in model coordinates.
#[derive(Debug, Clone)]
enum Op {
    DrawRect(Point, Point),
    DrawPolygon([Point; 3]),
    /// Press inside shape `usize` (or on empty space) and drag by the vector.
    Drag(usize, Vec2),
    /// Select shape `usize`, then drag handle `usize` by the vector.
    Resize(usize, usize, Vec2),
    Delete(usize),
    Reorder(usize, bool),
}

fn small_point() -> impl Strategy<Value = Point> {
    (-300.0f64..300.0, -300.0f64..300.0).prop_map(|(x, y)| Point::new(x, y))
}

fn delta() -> impl Strategy<Value = Vec2> {
    (-80.0f64..80.0, -80.0f64..80.0).prop_map(|(x, y)| Vec2::new(x, y))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (small_point(), small_point()).prop_map(|(a, b)| Op::DrawRect(a, b)),
        (small_point(), small_point(), small_point()).prop_map(|(a, b, c)| Op::DrawPolygon([a, b, c])),
        (0usize..8, delta()).prop_map(|(i, d)| Op::Drag(i, d)),
        (0usize..8, 0usize..4, delta()).prop_map(|(i, h, d)| Op::Resize(i, h, d)),
        (0usize..8).prop_map(Op::Delete),
        (0usize..8, any::<bool>()).prop_map(|(i, front)| Op::Reorder(i, front)),
    ]
}

fn screen(editor: &Editor, model: Point) -> Point {
    editor.view().to_screen(model)
}

fn click(editor: &mut Editor, model: Point) {
    let at = screen(editor, model);
    editor.handle_pointer(PointerEvent::down(at));
    editor.handle_pointer(PointerEvent::up(at));
}

fn drag(editor: &mut Editor, from: Point, to: Point) {
    let (from, to) = (screen(editor, from), screen(editor, to));
    editor.handle_pointer(PointerEvent::down(from));
    editor.handle_pointer(PointerEvent::moved(to));
    editor.handle_pointer(PointerEvent::up(to));
}

/// A point that hits the shape: the centroid of vertex shapes, otherwise the
/// bounds center.
fn inside(shape: &Shape) -> Point {
    match &shape.geometry {
        Geometry::Path(path) => polygon_centroid(&path.points).unwrap_or_else(|| shape.bounds().center()),
        _ => shape.bounds().center(),
    }
}

fn target(editor: &Editor, index: usize) -> Option<Shape> {
    let shapes = editor.shapes();
    if shapes.is_empty() {
        return None;
    }
    Some(shapes[index % shapes.len()].clone())
}

fn apply(editor: &mut Editor, op: &Op) {
    match op {
        Op::DrawRect(a, b) => {
            editor.set_tool(ToolKind::ZoneRect);
            drag(editor, *a, *b);
        }
        Op::DrawPolygon(points) => {
            editor.set_tool(ToolKind::DrawPolygon);
            for p in points {
                click(editor, *p);
            }
            editor.handle_key(KeyAction::Finish);
        }
        Op::Drag(index, by) => {
            editor.set_tool(ToolKind::Select);
            let from = target(editor, *index).map_or(Point::new(500.0, 500.0), |s| inside(&s));
            drag(editor, from, from + *by);
        }
        Op::Resize(index, handle, by) => {
            editor.set_tool(ToolKind::Select);
            let Some(shape) = target(editor, *index) else {
                return;
            };
            click(editor, inside(&shape));
            let Some(selected) = editor.selection().single().and_then(|id| editor.shape(id)).cloned() else {
                return;
            };
            let handles = handles_for(&selected, editor.view().scale(), editor.config());
            if let Some(h) = handles.get(*handle % handles.len().max(1)) {
                drag(editor, h.position, h.position + *by);
            }
        }
        Op::Delete(index) => {
            editor.set_tool(ToolKind::Select);
            if let Some(shape) = target(editor, *index) {
                click(editor, inside(&shape));
                editor.handle_key(KeyAction::Delete);
            }
        }
        Op::Reorder(index, front) => {
            editor.set_tool(ToolKind::Select);
            if let Some(shape) = target(editor, *index) {
                click(editor, inside(&shape));
                let direction = if *front { ReorderDirection::ToFront } else { ReorderDirection::ToBack };
                editor.reorder_selected(direction);
            }
        }
    }
    editor.set_tool(ToolKind::Select);
}

/// Stored bounds of vertex shapes must match their vertices exactly.
fn assert_bounds_fresh(shapes: &[Shape]) -> Result<(), TestCaseError> {
    for shape in shapes {
        if let Geometry::Path(path) = &shape.geometry {
            let Some(first) = path.points.first() else {
                continue;
            };
            let expected = path
                .points
                .iter()
                .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p));
            prop_assert_eq!(path.bounds, expected);
            prop_assert_eq!(bounding_box(shape), expected);
        }
    }
    Ok(())
}

fn dedup(states: Vec<Vec<Shape>>) -> Vec<Vec<Shape>> {
    let mut out: Vec<Vec<Shape>> = Vec::new();
    for state in states {
        if out.last() != Some(&state) {
            out.push(state);
        }
    }
    out
}

fn view_with(scale: f64, pan: Vec2) -> ViewTransform {
    let mut view = ViewTransform::new(&EditorConfig::default());
    view.set_scale(scale);
    view.pan = pan;
    view
}

proptest! {
    #[test]
    fn area_ignores_vertex_rotation_and_reversal(points in polygon(), shift in 0usize..12) {
        let area = polygon_area(&points);
        prop_assert!(area >= 0.0);

        let mut rotated = points.clone();
        rotated.rotate_left(shift % points.len());
        prop_assert!((polygon_area(&rotated) - area).abs() <= 1e-6 * area.max(1.0));

        let mut reversed = points.clone();
        reversed.reverse();
        prop_assert!((polygon_area(&reversed) - area).abs() <= 1e-6 * area.max(1.0));
    }

    #[test]
    fn centroid_translates_with_polygon(points in polygon(), dx in -100.0f64..100.0, dy in -100.0f64..100.0) {
        let offset = Vec2::new(dx, dy);
        let moved: Vec<Point> = points.iter().map(|p| *p + offset).collect();
        // Near-degenerate polygons lose precision in the area-weighted form.
        prop_assume!(polygon_area(&points) > 100.0);
        let before = polygon_centroid(&points).unwrap();
        let after = polygon_centroid(&moved).unwrap();
        prop_assert!(((after - before) - offset).hypot() < 1e-3);
    }

    #[test]
    fn zoom_keeps_point_under_pointer(
        scale in 0.1f64..5.0,
        px in -500.0f64..500.0,
        py in -500.0f64..500.0,
        screen in point(),
        zoom_in in any::<bool>(),
    ) {
        let mut view = view_with(scale, Vec2::new(px, py));
        let before = view.to_model(screen);
        view.zoom_at(screen, if zoom_in { ZoomDirection::In } else { ZoomDirection::Out });
        let after = view.to_model(screen);
        prop_assert!((after - before).hypot() < 1e-6);
        prop_assert!(view.scale() >= 0.1 && view.scale() <= 5.0);
    }

    #[test]
    fn screen_model_round_trip(scale in 0.1f64..5.0, px in -500.0f64..500.0, py in -500.0f64..500.0, p in point()) {
        let view = view_with(scale, Vec2::new(px, py));
        let back = view.to_model(view.to_screen(p));
        prop_assert!((back - p).hypot() < 1e-6);
    }

    #[test]
    fn box_contains_interior_points(a in point(), b in point(), tx in 0.0f64..1.0, ty in 0.0f64..1.0, scale in 0.1f64..5.0) {
        let shape = Shape::rectangle(Rect::from_points(a, b));
        let rect = bounding_box(&shape);
        let inside = Point::new(
            (rect.x0 + rect.width() * tx).min(rect.x1),
            (rect.y0 + rect.height() * ty).min(rect.y1),
        );
        prop_assert!(contains_point(&shape, inside, scale, 6.0));
    }

    #[test]
    fn undo_all_then_redo_all_restores_state(rects in prop::collection::vec((point(), point()), 1..8)) {
        let mut store = ShapeStore::default();
        let mut history = History::new(50);
        for (a, b) in &rects {
            history.save(&store);
            store.add(Shape::rectangle(Rect::from_points(*a, *b)));
        }
        let finished = store.shapes().to_vec();

        while history.undo(&mut store) {}
        prop_assert!(store.shapes().is_empty());
        while history.redo(&mut store) {}
        prop_assert_eq!(store.shapes(), finished.as_slice());
    }

    #[test]
    fn editing_sequence_undoes_and_redoes_exactly(ops in prop::collection::vec(op(), 1..12)) {
        let mut editor = Editor::default();
        let mut states = vec![editor.shapes().to_vec()];
        for op in &ops {
            apply(&mut editor, op);
            states.push(editor.shapes().to_vec());
        }
        let finished = editor.shapes().to_vec();

        // Undo walks back through every distinct state to the empty store.
        let mut trace = vec![editor.shapes().to_vec()];
        while editor.undo() {
            trace.push(editor.shapes().to_vec());
        }
        let mut expected = dedup(states);
        expected.reverse();
        prop_assert_eq!(dedup(trace), expected);
        prop_assert!(editor.shapes().is_empty());

        while editor.redo() {}
        prop_assert_eq!(editor.shapes(), finished.as_slice());
    }

    #[test]
    fn vertex_edits_and_drags_keep_bounds_fresh(
        points in (small_point(), small_point(), small_point()),
        edits in prop::collection::vec((0usize..4, 0usize..4, delta(), any::<bool>()), 1..8),
    ) {
        let mut editor = Editor::default();
        apply(&mut editor, &Op::DrawPolygon([points.0, points.1, points.2]));
        for (index, handle, by, vertex) in edits {
            let op = if vertex { Op::Resize(index, handle, by) } else { Op::Drag(index, by) };
            apply(&mut editor, &op);
            assert_bounds_fresh(editor.shapes())?;
        }
    }
}

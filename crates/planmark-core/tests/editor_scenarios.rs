//! End-to-end editing scenarios driven through pointer and key events.

use kurbo::{Point, Rect};
use planmark_core::shapes::Geometry;
use planmark_core::tools::{End, HandleKind, handles_for};
use planmark_core::{
    Editor, EditorConfig, FilterCriteria, Interaction, KeyAction, Layout, Modifiers, MouseButton, PointerEvent,
    Project, Shape, ShapeKind, SymbolDef, ToolKind, ToolOutcome, measurement_label,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn click(editor: &mut Editor, x: f64, y: f64) -> ToolOutcome {
    let down = editor.handle_pointer(PointerEvent::down(Point::new(x, y)));
    let up = editor.handle_pointer(PointerEvent::up(Point::new(x, y)));
    if down == ToolOutcome::None { up } else { down }
}

fn drag(editor: &mut Editor, from: (f64, f64), to: (f64, f64)) -> ToolOutcome {
    editor.handle_pointer(PointerEvent::down(from.into()));
    editor.handle_pointer(PointerEvent::moved(to.into()));
    editor.handle_pointer(PointerEvent::up(to.into()))
}

fn committed(outcome: ToolOutcome) -> planmark_core::ShapeId {
    match outcome {
        ToolOutcome::Committed(id) => id,
        other => panic!("expected a committed shape, got {other:?}"),
    }
}

#[test]
fn test_scenario_a_draw_rectangle() {
    init_logging();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawRect);
    let id = committed(drag(&mut editor, (10.0, 10.0), (110.0, 60.0)));

    let shape = editor.shape(id).unwrap();
    let Geometry::Box(frame) = &shape.geometry else {
        panic!("rectangle without a box geometry");
    };
    assert_eq!((frame.x, frame.y, frame.width, frame.height), (10.0, 10.0, 100.0, 50.0));
    assert_eq!(editor.tool(), ToolKind::Select);
}

#[test]
fn test_scenario_b_polygon_closes_near_first_vertex() {
    init_logging();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawPolygon);
    assert_eq!(click(&mut editor, 0.0, 0.0), ToolOutcome::None);
    assert_eq!(click(&mut editor, 100.0, 0.0), ToolOutcome::None);
    assert_eq!(click(&mut editor, 50.0, 100.0), ToolOutcome::None);
    let id = committed(click(&mut editor, 3.0, 4.0));

    let shape = editor.shape(id).unwrap();
    assert_eq!(shape.kind(), ShapeKind::Polygon);
    assert_eq!(shape.points().map(<[Point]>::len), Some(3));
    assert_eq!(shape.bounds(), Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(editor.tool(), ToolKind::Select);
}

#[test]
fn test_scenario_c_undo_without_history_is_noop() {
    init_logging();
    let mut layout = Layout::new("Ground");
    layout.shapes.push(Shape::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
    let mut editor = Editor::with_project(Project::with_layout(layout), EditorConfig::default());
    click(&mut editor, 25.0, 25.0);
    assert_eq!(editor.selection().len(), 1);

    let before = editor.project().clone();
    let undo = KeyAction::from_key("z", Modifiers { ctrl: true, ..Modifiers::NONE }).unwrap();
    assert_eq!(editor.handle_key(undo), ToolOutcome::None);
    assert!(!editor.can_undo());
    assert_eq!(editor.project(), &before);
    assert_eq!(editor.selection().len(), 1);
}

#[test]
fn test_scenario_d_drag_then_undo_restores_position() {
    init_logging();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawRect);
    let id = committed(drag(&mut editor, (10.0, 10.0), (110.0, 60.0)));

    let outcome = drag(&mut editor, (60.0, 35.0), (80.0, 55.0));
    assert_eq!(outcome, ToolOutcome::Modified(vec![id]));
    assert_eq!(editor.shape(id).unwrap().bounds(), Rect::new(30.0, 30.0, 130.0, 80.0));

    assert!(editor.undo());
    assert_eq!(editor.shape(id).unwrap().bounds(), Rect::new(10.0, 10.0, 110.0, 60.0));
    assert!(editor.redo());
    assert_eq!(editor.shape(id).unwrap().bounds(), Rect::new(30.0, 30.0, 130.0, 80.0));
}

#[test]
fn test_scenario_e_calibrated_length() {
    init_logging();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::Calibrate);
    let outcome = drag(&mut editor, (0.0, 0.0), (200.0, 0.0));
    assert_eq!(outcome, ToolOutcome::CalibrationRequested { pixels: 200.0 });
    editor.complete_calibration(2.0, "m").unwrap();

    let calibration = editor.active_layout().calibration.clone().unwrap();
    assert!((calibration.pixels_per_unit - 100.0).abs() < 1e-9);

    editor.set_tool(ToolKind::MeasureLength);
    let id = committed(drag(&mut editor, (0.0, 100.0), (50.0, 100.0)));
    assert!((calibration.to_units(50.0) - 0.5).abs() < 1e-9);
    assert_eq!(editor.measurement_label(id).as_deref(), Some("0.50 m"));
}

#[test]
fn test_tiny_drag_is_discarded() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawEllipse);
    assert_eq!(drag(&mut editor, (10.0, 10.0), (12.0, 40.0)), ToolOutcome::None);
    assert!(editor.shapes().is_empty());
    assert!(!editor.can_undo());
}

#[test]
fn test_polygon_with_two_vertices_is_discarded_on_finish() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::MeasureArea);
    click(&mut editor, 0.0, 0.0);
    click(&mut editor, 100.0, 0.0);
    assert_eq!(editor.handle_key(KeyAction::Finish), ToolOutcome::None);
    assert!(editor.shapes().is_empty());
    assert_eq!(editor.interaction(), &Interaction::Idle);
}

#[test]
fn test_shift_click_builds_group_drag() {
    init_logging();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::ZoneRect);
    let a = committed(drag(&mut editor, (0.0, 0.0), (50.0, 50.0)));
    editor.set_tool(ToolKind::ZoneRect);
    let b = committed(drag(&mut editor, (100.0, 0.0), (150.0, 50.0)));

    click(&mut editor, 25.0, 25.0);
    editor.handle_pointer(PointerEvent::Down {
        position: Point::new(125.0, 25.0),
        button: MouseButton::Left,
        modifiers: Modifiers::SHIFT,
    });
    editor.handle_pointer(PointerEvent::up(Point::new(125.0, 25.0)));
    assert_eq!(editor.selection().len(), 2);

    drag(&mut editor, (25.0, 25.0), (25.0, 75.0));
    assert_eq!(editor.shape(a).unwrap().bounds(), Rect::new(0.0, 50.0, 50.0, 100.0));
    assert_eq!(editor.shape(b).unwrap().bounds(), Rect::new(100.0, 50.0, 150.0, 100.0));

    // One undo reverts the whole group move.
    assert!(editor.undo());
    assert_eq!(editor.shape(a).unwrap().bounds(), Rect::new(0.0, 0.0, 50.0, 50.0));
    assert_eq!(editor.shape(b).unwrap().bounds(), Rect::new(100.0, 0.0, 150.0, 50.0));
}

#[test]
fn test_plain_click_on_empty_space_clears_and_pans() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::ZoneRect);
    drag(&mut editor, (0.0, 0.0), (50.0, 50.0));
    assert_eq!(editor.selection().len(), 1);

    let outcome = drag(&mut editor, (300.0, 300.0), (320.0, 310.0));
    assert_eq!(outcome, ToolOutcome::ViewChanged);
    assert!(editor.selection().is_empty());
    assert_eq!(editor.view().pan, kurbo::Vec2::new(20.0, 10.0));
    assert_eq!(editor.active_layout().view.pan, kurbo::Vec2::new(20.0, 10.0));
}

#[test]
fn test_corner_resize_is_one_history_step() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::ZoneRect);
    let id = committed(drag(&mut editor, (0.0, 0.0), (100.0, 50.0)));

    editor.handle_pointer(PointerEvent::down(Point::new(100.0, 50.0)));
    editor.handle_pointer(PointerEvent::moved(Point::new(110.0, 60.0)));
    editor.handle_pointer(PointerEvent::moved(Point::new(120.0, 70.0)));
    editor.handle_pointer(PointerEvent::up(Point::new(120.0, 70.0)));
    assert_eq!(editor.shape(id).unwrap().bounds(), Rect::new(0.0, 0.0, 120.0, 70.0));

    assert!(editor.undo());
    assert_eq!(editor.shape(id).unwrap().bounds(), Rect::new(0.0, 0.0, 100.0, 50.0));
}

#[test]
fn test_symbol_placement_and_rotation() {
    init_logging();
    let mut editor = Editor::default();
    editor
        .symbols_mut()
        .insert(SymbolDef::vector("crane", "Tower crane", "<svg/>", 1.0));
    editor.begin_symbol_placement("crane", Point::new(100.0, 100.0));
    editor.handle_pointer(PointerEvent::moved(Point::new(140.0, 140.0)));
    assert!(editor.preview().is_some());
    let id = committed(click(&mut editor, 140.0, 140.0));
    assert_eq!(editor.shape(id).unwrap().bounds(), Rect::new(100.0, 100.0, 140.0, 140.0));

    // Knob sits 30 px above the top edge.
    editor.handle_pointer(PointerEvent::down(Point::new(120.0, 70.0)));
    assert!(matches!(editor.interaction(), Interaction::Rotating { .. }));
    editor.handle_pointer(PointerEvent::moved(Point::new(150.0, 120.0)));
    editor.handle_pointer(PointerEvent::up(Point::new(150.0, 120.0)));

    let Geometry::Symbol(symbol) = &editor.shape(id).unwrap().geometry else {
        panic!("symbol without symbol geometry");
    };
    assert!((symbol.rotation - 90.0).abs() < 1e-9);
}

#[test]
fn test_polyline_extend_and_retract() {
    init_logging();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawPolyline);
    click(&mut editor, 0.0, 0.0);
    click(&mut editor, 100.0, 0.0);
    let id = committed(editor.handle_key(KeyAction::Finish));

    // Extend affordance past the end vertex.
    click(&mut editor, 118.0, 0.0);
    assert_eq!(editor.tool(), ToolKind::DrawPolyline);
    click(&mut editor, 150.0, 50.0);
    assert_eq!(editor.handle_key(KeyAction::Finish), ToolOutcome::Committed(id));
    assert_eq!(
        editor.shape(id).unwrap().points().unwrap(),
        &[Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(150.0, 50.0)]
    );

    let retract = handles_for(editor.shape(id).unwrap(), 1.0, editor.config())
        .into_iter()
        .find(|h| h.kind == HandleKind::Retract(End::End))
        .unwrap();
    click(&mut editor, retract.position.x, retract.position.y);
    assert_eq!(editor.shape(id).unwrap().points().map(<[Point]>::len), Some(2));

    let retract = handles_for(editor.shape(id).unwrap(), 1.0, editor.config())
        .into_iter()
        .find(|h| h.kind == HandleKind::Retract(End::Start))
        .unwrap();
    assert_eq!(
        click(&mut editor, retract.position.x, retract.position.y),
        ToolOutcome::Removed(vec![id])
    );
    assert!(editor.shapes().is_empty());
}

#[test]
fn test_extend_from_start_keeps_vertex_order() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawPolyline);
    click(&mut editor, 0.0, 0.0);
    click(&mut editor, 100.0, 0.0);
    let id = committed(editor.handle_key(KeyAction::Finish));

    click(&mut editor, -18.0, 0.0);
    click(&mut editor, -50.0, 0.0);
    editor.handle_key(KeyAction::Finish);
    assert_eq!(
        editor.shape(id).unwrap().points().unwrap(),
        &[Point::new(-50.0, 0.0), Point::new(0.0, 0.0), Point::new(100.0, 0.0)]
    );
}

#[test]
fn test_filtered_shapes_cannot_be_selected() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::ZoneRect);
    let id = committed(drag(&mut editor, (0.0, 0.0), (50.0, 50.0)));
    editor.edit_shape(id, |s| s.meta.name = "Stair core".to_string()).unwrap();

    editor.set_filter(FilterCriteria {
        text: "lift".to_string(),
        ..FilterCriteria::default()
    });
    assert!(editor.selection().is_empty());
    click(&mut editor, 25.0, 25.0);
    assert!(editor.selection().is_empty());
    assert_eq!(editor.visible_shapes().count(), 0);
}

#[test]
fn test_line_hit_tolerance_is_constant_on_screen() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawLine);
    let id = committed(drag(&mut editor, (0.0, 0.0), (100.0, 0.0)));
    editor.clear_selection();

    // 5 model units off the line at 1x is within the 6 px tolerance.
    click(&mut editor, 50.0, 5.0);
    assert!(editor.selection().contains(id));
    editor.clear_selection();

    // Zoomed in, the tolerance shrinks in model units.
    editor.handle_pointer(PointerEvent::Wheel {
        position: Point::ZERO,
        delta_y: -1.0,
    });
    let scale = editor.view().scale();
    let screen = editor.view().to_screen(Point::new(50.0, 6.0 / scale + 1.0));
    click(&mut editor, screen.x, screen.y);
    assert!(editor.selection().is_empty());
}

#[test]
fn test_measurement_label_without_calibration_uses_pixels() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::MeasureArea);
    click(&mut editor, 0.0, 0.0);
    click(&mut editor, 100.0, 0.0);
    click(&mut editor, 100.0, 50.0);
    let id = committed(editor.handle_key(KeyAction::Finish));
    let shape = editor.shape(id).unwrap();
    assert_eq!(measurement_label(shape, None).as_deref(), Some("2500 px²"));
}

#[test]
fn test_escape_discards_vertex_buffer() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawCloud);
    click(&mut editor, 0.0, 0.0);
    click(&mut editor, 100.0, 0.0);
    editor.handle_key(KeyAction::Escape);
    assert_eq!(editor.interaction(), &Interaction::Idle);
    assert!(editor.preview().is_none());
    assert!(editor.shapes().is_empty());
}

#[test]
fn test_polyline_finishes_near_first_vertex() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawPolyline);
    click(&mut editor, 0.0, 0.0);
    click(&mut editor, 100.0, 0.0);
    click(&mut editor, 100.0, 100.0);

    let id = committed(click(&mut editor, 3.0, 4.0));
    let shape = editor.shape(id).unwrap();
    assert_eq!(shape.kind(), ShapeKind::DrawPoly);
    assert_eq!(
        shape.points().unwrap(),
        &[Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)]
    );
    assert_eq!(editor.tool(), ToolKind::Select);
}

#[test]
fn test_polyline_vertex_near_previous_one_is_kept() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawPolyline);
    click(&mut editor, 0.0, 0.0);
    click(&mut editor, 100.0, 0.0);
    assert_eq!(click(&mut editor, 106.0, 0.0), ToolOutcome::None);
    assert!(editor.shapes().is_empty());

    let id = committed(editor.handle_key(KeyAction::Finish));
    assert_eq!(editor.shape(id).unwrap().points().map(<[Point]>::len), Some(3));
}

#[test]
fn test_two_vertex_polyline_does_not_close_on_first_vertex() {
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::DrawPolyline);
    click(&mut editor, 0.0, 0.0);
    click(&mut editor, 100.0, 0.0);
    assert_eq!(click(&mut editor, 2.0, 0.0), ToolOutcome::None);
    assert!(editor.shapes().is_empty());
}

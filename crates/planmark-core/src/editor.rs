//! The editor: one object the host feeds input to and reads state from.

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::filter::{FilterCriteria, is_visible};
use crate::history::History;
use crate::input::{KeyAction, PointerEvent};
use crate::layout::{Background, Layout, LayoutId, Project, ViewState};
use crate::measure::{Calibration, measurement_label};
use crate::persistence::{Instant, ViewPersistence, ViewStateSaver};
use crate::selection::Selection;
use crate::shapes::{Geometry, LinkedActivity, Shape, ShapeId, ShapeKind};
use crate::store::{ReorderDirection, ShapeStore, StoreEvent};
use crate::symbols::SymbolLibrary;
use crate::tools::{CursorHint, Interaction, ToolContext, ToolKind, ToolMachine, ToolOutcome, hover_hint};
use crate::view::{ViewTransform, ZoomDirection};
use kurbo::{Point, Size, Vec2};

/// Editing session over a [`Project`].
pub struct Editor {
    store: ShapeStore,
    history: History,
    view: ViewTransform,
    selection: Selection,
    tools: ToolMachine,
    filter: FilterCriteria,
    config: EditorConfig,
    symbols: SymbolLibrary,
    /// Copied shapes, already offset for the next paste.
    clipboard: Vec<Shape>,
    /// Size of the drawing surface in screen pixels.
    viewport_size: Size,
    view_saver: ViewStateSaver,
    persistence: Option<Box<dyn ViewPersistence>>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("store", &self.store)
            .field("view", &self.view)
            .field("selection", &self.selection)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// A session over a fresh single-layout project.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_project(Project::new(), config)
    }

    pub fn with_project(project: Project, config: EditorConfig) -> Self {
        let mut view = ViewTransform::new(&config);
        view.restore(project.active().view);
        Self {
            store: ShapeStore::new(project),
            history: History::new(config.history_depth),
            view,
            selection: Selection::default(),
            tools: ToolMachine::new(),
            filter: FilterCriteria::default(),
            view_saver: ViewStateSaver::new(config.persist_debounce_ms),
            config,
            symbols: SymbolLibrary::new(),
            clipboard: Vec::new(),
            viewport_size: Size::new(800.0, 600.0),
            persistence: None,
        }
    }

    pub fn set_persistence(&mut self, persistence: impl ViewPersistence + 'static) {
        self.persistence = Some(Box::new(persistence));
    }

    /// Register a store observer (renderer invalidation, metadata panels).
    pub fn subscribe(&mut self, observer: impl FnMut(&StoreEvent) + 'static) {
        self.store.subscribe(observer);
    }

    // --- Accessors ---

    pub fn store(&self) -> &ShapeStore {
        &self.store
    }

    pub fn project(&self) -> &Project {
        self.store.project()
    }

    pub fn active_layout(&self) -> &Layout {
        self.store.active_layout()
    }

    pub fn shapes(&self) -> &[Shape] {
        self.store.shapes()
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.store.get(id)
    }

    /// Shapes passing the current filter, back to front.
    pub fn visible_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.store.shapes().iter().filter(|s| is_visible(s, &self.filter))
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.tool()
    }

    pub fn interaction(&self) -> &Interaction {
        self.tools.interaction()
    }

    pub fn tools_mut(&mut self) -> &mut ToolMachine {
        &mut self.tools
    }

    pub fn filter(&self) -> &FilterCriteria {
        &self.filter
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolLibrary {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolLibrary {
        &mut self.symbols
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Shape for the gesture in progress, drawn above the stored shapes.
    pub fn preview(&self) -> Option<Shape> {
        self.tools.preview(&self.symbols)
    }

    /// Measurement label of a shape using the active layout's calibration.
    pub fn measurement_label(&self, id: ShapeId) -> Option<String> {
        let shape = self.store.get(id)?;
        measurement_label(shape, self.active_layout().calibration.as_ref())
    }

    pub fn hover_hint(&self, screen: Point) -> CursorHint {
        hover_hint(
            &self.tools,
            &self.store,
            &self.view,
            &self.selection,
            &self.filter,
            &self.config,
            screen,
        )
    }

    // --- Input ---

    fn with_tools<R>(&mut self, f: impl FnOnce(&mut ToolMachine, &mut ToolContext) -> R) -> R {
        let mut ctx = ToolContext {
            store: &mut self.store,
            history: &mut self.history,
            view: &mut self.view,
            selection: &mut self.selection,
            filter: &self.filter,
            config: &self.config,
            symbols: &self.symbols,
        };
        f(&mut self.tools, &mut ctx)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> ToolOutcome {
        let outcome = match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.with_tools(|tools, ctx| tools.pointer_down(ctx, position, button, modifiers)),
            PointerEvent::Move { position, .. } => self.with_tools(|tools, ctx| tools.pointer_move(ctx, position)),
            PointerEvent::Up { position, .. } => self.with_tools(|tools, ctx| tools.pointer_up(ctx, position)),
            PointerEvent::Wheel { position, delta_y } => {
                if delta_y == 0.0 {
                    return ToolOutcome::None;
                }
                let direction = if delta_y < 0.0 { ZoomDirection::In } else { ZoomDirection::Out };
                self.view.zoom_at(position, direction);
                ToolOutcome::ViewChanged
            }
        };
        if outcome == ToolOutcome::ViewChanged {
            self.view_changed();
        }
        outcome
    }

    pub fn handle_key(&mut self, action: KeyAction) -> ToolOutcome {
        match action {
            KeyAction::Escape | KeyAction::Finish => self.with_tools(|tools, ctx| tools.key(ctx, action)),
            KeyAction::Undo => {
                self.undo();
                ToolOutcome::None
            }
            KeyAction::Redo => {
                self.redo();
                ToolOutcome::None
            }
            // Commands below only apply between gestures.
            _ if self.tools.interaction() != &Interaction::Idle => ToolOutcome::None,
            KeyAction::Delete => self.delete_selected(),
            KeyAction::SelectAll => {
                self.select_all();
                ToolOutcome::None
            }
            KeyAction::BringToFront => self.reorder_selected(ReorderDirection::ToFront),
            KeyAction::SendToBack => self.reorder_selected(ReorderDirection::ToBack),
            KeyAction::Copy => {
                self.copy_selection();
                ToolOutcome::None
            }
            KeyAction::Paste => self.paste(),
            KeyAction::Duplicate => self.duplicate_selection(),
        }
    }

    /// Switch tools, discarding any in-progress gesture.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool);
    }

    /// Start placing a symbol dropped at a screen position.
    pub fn begin_symbol_placement(&mut self, symbol_id: impl Into<String>, screen: Point) {
        let model = self.view.to_model(screen);
        self.tools.begin_symbol_placement(symbol_id, model);
    }

    // --- History ---

    /// Undo the last change. Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        self.step_history(|history, store| history.undo(store))
    }

    /// Redo the last undone change. Returns false when there was nothing to
    /// redo.
    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        self.step_history(|history, store| history.redo(store))
    }

    fn step_history(&mut self, step: impl FnOnce(&mut History, &mut ShapeStore) -> bool) -> bool {
        self.tools.cancel();
        let before = self.store.active_layout_id();
        let before_view = self.view.state();
        if !step(&mut self.history, &mut self.store) {
            return false;
        }
        let after = self.store.active_layout_id();
        if after != before {
            self.store_view_state(before, before_view);
            self.view.restore(self.store.active_layout().view);
            self.selection.clear();
        }
        let store = &self.store;
        self.selection.retain(|id| store.get(id).is_some());
        true
    }

    // --- Selection commands ---

    /// Select every shape that passes the filter.
    pub fn select_all(&mut self) {
        let ids: Vec<ShapeId> = self.visible_shapes().map(Shape::id).collect();
        self.selection.select_many(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Replace the filter. Selected shapes that become hidden are deselected.
    pub fn set_filter(&mut self, filter: FilterCriteria) {
        self.filter = filter;
        let store = &self.store;
        let filter = &self.filter;
        self.selection
            .retain(|id| store.get(id).is_some_and(|s| is_visible(s, filter)));
    }

    pub fn delete_selected(&mut self) -> ToolOutcome {
        if self.selection.is_empty() {
            return ToolOutcome::None;
        }
        self.history.save(&self.store);
        let removed: Vec<ShapeId> = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| self.store.remove(*id).ok().map(|s| s.id()))
            .collect();
        self.selection.clear();
        log::debug!("Deleted {} shape(s)", removed.len());
        ToolOutcome::Removed(removed)
    }

    pub fn reorder_selected(&mut self, direction: ReorderDirection) -> ToolOutcome {
        if self.selection.is_empty() {
            return ToolOutcome::None;
        }
        let ids = self.selection.ids().to_vec();
        let layout = self.store.active_layout_id();
        let before = self.store.shapes().to_vec();
        match self.store.reorder(&ids, direction) {
            Ok(()) => {
                let unchanged = before.iter().map(Shape::id).eq(self.store.shapes().iter().map(Shape::id));
                if unchanged {
                    return ToolOutcome::None;
                }
                self.history.record(layout, before);
                ToolOutcome::Modified(ids)
            }
            Err(err) => {
                log::warn!("Reorder failed: {err}");
                ToolOutcome::None
            }
        }
    }

    // --- Clipboard ---

    /// Copy the selected shapes in z-order.
    pub fn copy_selection(&mut self) {
        let offset = Vec2::new(self.config.paste_offset, self.config.paste_offset);
        self.clipboard = self
            .store
            .shapes()
            .iter()
            .filter(|s| self.selection.contains(s.id()))
            .map(|s| {
                let mut copy = s.clone();
                copy.translate(offset);
                copy
            })
            .collect();
    }

    /// Insert the clipboard with fresh ids and select it. Each paste lands
    /// one offset further than the last.
    pub fn paste(&mut self) -> ToolOutcome {
        if self.clipboard.is_empty() {
            return ToolOutcome::None;
        }
        let shapes = self.clipboard.clone();
        let offset = Vec2::new(self.config.paste_offset, self.config.paste_offset);
        for shape in &mut self.clipboard {
            shape.translate(offset);
        }
        self.insert_copies(shapes)
    }

    /// Copy-and-paste the selection in one step without touching the
    /// clipboard.
    pub fn duplicate_selection(&mut self) -> ToolOutcome {
        let offset = Vec2::new(self.config.paste_offset, self.config.paste_offset);
        let shapes: Vec<Shape> = self
            .store
            .shapes()
            .iter()
            .filter(|s| self.selection.contains(s.id()))
            .map(|s| {
                let mut copy = s.clone();
                copy.translate(offset);
                copy
            })
            .collect();
        if shapes.is_empty() {
            return ToolOutcome::None;
        }
        self.insert_copies(shapes)
    }

    fn insert_copies(&mut self, shapes: Vec<Shape>) -> ToolOutcome {
        self.history.save(&self.store);
        let ids: Vec<ShapeId> = shapes
            .into_iter()
            .map(|mut shape| {
                shape.regenerate_id();
                self.store.add(shape)
            })
            .collect();
        self.selection.select_many(ids.iter().copied());
        log::debug!("Pasted {} shape(s)", ids.len());
        ToolOutcome::Pasted(ids)
    }

    // --- Shape edits from panels ---

    /// Apply an edit to one shape as a single undoable step.
    pub fn edit_shape(&mut self, id: ShapeId, edit: impl FnOnce(&mut Shape)) -> EditorResult<()> {
        if self.store.get(id).is_none() {
            log::warn!("Edit for unknown shape {id}");
            return Err(EditorError::UnknownShape(id));
        }
        self.history.save(&self.store);
        self.store.modify(id, true, edit)
    }

    pub fn set_text(&mut self, id: ShapeId, content: impl Into<String>) -> EditorResult<()> {
        let content = content.into();
        self.edit_shape(id, |shape| {
            if let Geometry::Text(text) = &mut shape.geometry {
                text.content = content;
            }
        })
    }

    /// Attach a schedule activity; the shape's date range follows its links.
    pub fn link_activity(&mut self, id: ShapeId, activity: LinkedActivity) -> EditorResult<()> {
        self.edit_shape(id, |shape| shape.meta.link_activity(activity))
    }

    pub fn unlink_activity(&mut self, id: ShapeId, code: &str) -> EditorResult<Option<LinkedActivity>> {
        let mut removed = None;
        self.edit_shape(id, |shape| removed = shape.meta.unlink_activity(code))?;
        Ok(removed)
    }

    // --- Calibration ---

    /// Answer a pending calibration line with its real length.
    ///
    /// Sets the active layout's calibration, replaces any previous
    /// calibration line with the new one and returns to `select`. Without a
    /// pending line, or with an invalid length, nothing changes.
    pub fn complete_calibration(&mut self, real_length: f64, unit: impl Into<String>) -> EditorResult<ShapeId> {
        let Some((start, end)) = self.tools.pending_calibration() else {
            return Err(EditorError::InvalidCalibration("no calibration line drawn".to_string()));
        };
        let pixels = (end - start).hypot();
        let calibration = Calibration::from_reference(pixels, real_length, unit)?;
        self.tools.take_pending_calibration();

        self.history.save(&self.store);
        let stale: Vec<ShapeId> = self
            .store
            .shapes()
            .iter()
            .filter(|s| s.kind() == ShapeKind::CalibrationLine)
            .map(Shape::id)
            .collect();
        for id in stale {
            self.selection.remove(id);
            let _ = self.store.remove(id);
        }
        let shape = Shape::calibration_line(start, end).with_style(self.tools.style.clone());
        let id = self.store.add(shape);

        let layout = self.store.active_layout_id();
        log::info!(
            "Calibrated layout {layout}: {:.3} px per {}",
            calibration.pixels_per_unit,
            calibration.unit
        );
        self.store.set_calibration(layout, calibration)?;
        self.tools.set_tool(ToolKind::Select);
        self.selection.select(id);
        Ok(id)
    }

    /// Drop a pending calibration line without calibrating.
    pub fn cancel_calibration(&mut self) {
        self.tools.set_tool(ToolKind::Select);
    }

    // --- Layouts ---

    /// Add an empty layout after the existing ones. The active layout is
    /// unchanged.
    pub fn add_layout(&mut self, name: impl Into<String>) -> LayoutId {
        self.store.add_layout(Layout::new(name))
    }

    /// Make another layout active, saving this layout's view and restoring
    /// the target's.
    pub fn switch_layout(&mut self, layout: LayoutId) -> EditorResult<()> {
        let current = self.store.active_layout_id();
        if current == layout {
            return Ok(());
        }
        if self.project().layout(layout).is_none() {
            return Err(EditorError::UnknownLayout(layout));
        }
        self.store_view_state(current, self.view.state());
        self.tools.cancel();
        self.selection.clear();
        self.store.set_active_layout(layout)?;
        self.view.restore(self.store.active_layout().view);
        Ok(())
    }

    /// Remove a layout and its history. The last layout cannot be removed.
    pub fn remove_layout(&mut self, layout: LayoutId) -> EditorResult<()> {
        let was_active = self.store.active_layout_id() == layout;
        self.store.remove_layout(layout)?;
        self.history.forget_layout(layout);
        if was_active {
            self.tools.cancel();
            self.selection.clear();
            self.view.restore(self.store.active_layout().view);
        }
        Ok(())
    }

    pub fn rename_layout(&mut self, layout: LayoutId, name: impl Into<String>) -> EditorResult<()> {
        self.store.rename_layout(layout, name)
    }

    pub fn set_background(&mut self, background: Option<Background>) -> EditorResult<()> {
        let layout = self.store.active_layout_id();
        self.store.set_background(layout, background)
    }

    /// Replace the whole project, e.g. after a load. History and selection
    /// start empty.
    pub fn load_project(&mut self, project: Project) {
        self.tools.set_tool(ToolKind::Select);
        self.selection.clear();
        self.history.clear();
        self.clipboard.clear();
        self.view_saver.flush();
        self.view.restore(project.active().view);
        self.store.replace_project(project);
    }

    // --- View ---

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    /// Fit the background (or all shapes) into the viewport.
    pub fn fit_to_content(&mut self) {
        let Some(content) = self.active_layout().content_bounds() else {
            return;
        };
        self.view.fit_to_content(content, self.viewport_size);
        self.view_changed();
    }

    /// Zoom one step around the viewport center.
    pub fn zoom(&mut self, direction: ZoomDirection) {
        let center = Point::new(self.viewport_size.width / 2.0, self.viewport_size.height / 2.0);
        self.view.zoom_at(center, direction);
        self.view_changed();
    }

    fn view_changed(&mut self) {
        let layout = self.store.active_layout_id();
        self.store_view_state(layout, self.view.state());
    }

    fn store_view_state(&mut self, layout: LayoutId, state: ViewState) {
        if let Err(err) = self.store.set_view_state(layout, state) {
            log::warn!("View state not recorded: {err}");
            return;
        }
        self.view_saver.request(layout, state, Instant::now());
    }

    /// Hand settled view states to the persistence collaborator. Call
    /// periodically (e.g. once per frame).
    pub fn poll_persistence(&mut self, now: Instant) {
        let due = self.view_saver.poll(now);
        self.persist(due);
    }

    /// Hand every pending view state over immediately.
    pub fn flush_persistence(&mut self) {
        let due = self.view_saver.flush();
        self.persist(due);
    }

    fn persist(&mut self, due: Vec<(LayoutId, ViewState)>) {
        let Some(persistence) = self.persistence.as_mut() else {
            return;
        };
        for (layout, state) in due {
            persistence.persist(layout, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Modifiers, MouseButton};
    use kurbo::Rect;

    fn drag(editor: &mut Editor, from: (f64, f64), to: (f64, f64)) -> ToolOutcome {
        editor.handle_pointer(PointerEvent::down(from.into()));
        editor.handle_pointer(PointerEvent::moved(to.into()));
        editor.handle_pointer(PointerEvent::up(to.into()))
    }

    #[test]
    fn test_draw_then_delete_and_undo() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::DrawRect);
        let ToolOutcome::Committed(id) = drag(&mut editor, (10.0, 10.0), (110.0, 60.0)) else {
            panic!("rectangle not committed");
        };
        assert_eq!(editor.tool(), ToolKind::Select);
        assert!(editor.selection().contains(id));

        assert_eq!(editor.handle_key(KeyAction::Delete), ToolOutcome::Removed(vec![id]));
        assert!(editor.shapes().is_empty());
        assert!(editor.undo());
        assert!(editor.shape(id).is_some());
    }

    #[test]
    fn test_paste_cascades_with_fresh_ids() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::DrawEllipse);
        let ToolOutcome::Committed(id) = drag(&mut editor, (0.0, 0.0), (40.0, 40.0)) else {
            panic!("ellipse not committed");
        };
        editor.handle_key(KeyAction::Copy);
        let ToolOutcome::Pasted(first) = editor.handle_key(KeyAction::Paste) else {
            panic!("nothing pasted");
        };
        let ToolOutcome::Pasted(second) = editor.handle_key(KeyAction::Paste) else {
            panic!("nothing pasted");
        };
        assert_ne!(first[0], id);
        assert_ne!(first[0], second[0]);
        assert_eq!(editor.shape(first[0]).unwrap().bounds().origin(), Point::new(20.0, 20.0));
        assert_eq!(editor.shape(second[0]).unwrap().bounds().origin(), Point::new(40.0, 40.0));
        assert_eq!(editor.shapes().len(), 3);
    }

    #[test]
    fn test_wheel_zoom_requests_persist() {
        let mut editor = Editor::default();
        let written = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&written);
        editor.set_persistence(move |layout: LayoutId, state: ViewState| sink.borrow_mut().push((layout, state)));

        let outcome = editor.handle_pointer(PointerEvent::Wheel {
            position: Point::new(100.0, 100.0),
            delta_y: -1.0,
        });
        assert_eq!(outcome, ToolOutcome::ViewChanged);
        assert!((editor.view().scale() - 1.1).abs() < 1e-9);
        assert!((editor.active_layout().view.scale - 1.1).abs() < 1e-9);

        editor.poll_persistence(Instant::now());
        assert!(written.borrow().is_empty());
        editor.flush_persistence();
        assert_eq!(written.borrow().len(), 1);
    }

    #[test]
    fn test_layout_switch_restores_view() {
        let mut editor = Editor::default();
        let first = editor.active_layout().id;
        editor.zoom(ZoomDirection::In);
        let zoomed = editor.view().scale();

        let second = editor.add_layout("Level 2");
        editor.switch_layout(second).unwrap();
        assert!((editor.view().scale() - 1.0).abs() < 1e-9);

        editor.switch_layout(first).unwrap();
        assert!((editor.view().scale() - zoomed).abs() < 1e-9);
    }

    #[test]
    fn test_undo_switches_back_to_edited_layout() {
        let mut editor = Editor::default();
        let first = editor.active_layout().id;
        editor.set_tool(ToolKind::DrawRect);
        drag(&mut editor, (0.0, 0.0), (50.0, 50.0));

        let second = editor.add_layout("Level 2");
        editor.switch_layout(second).unwrap();
        assert!(editor.undo());
        assert_eq!(editor.active_layout().id, first);
        assert!(editor.shapes().is_empty());
    }

    #[test]
    fn test_select_all_skips_filtered_shapes() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::ZoneRect);
        let ToolOutcome::Committed(hidden) = drag(&mut editor, (0.0, 0.0), (50.0, 50.0)) else {
            panic!("zone not committed");
        };
        editor.set_tool(ToolKind::ZoneRect);
        drag(&mut editor, (100.0, 0.0), (150.0, 50.0));
        editor.edit_shape(hidden, |s| s.hidden = true).unwrap();

        editor.handle_key(KeyAction::SelectAll);
        assert_eq!(editor.selection().len(), 1);
        assert!(!editor.selection().contains(hidden));
    }

    #[test]
    fn test_complete_calibration_replaces_previous_line() {
        let mut editor = Editor::default();
        for _ in 0..2 {
            editor.set_tool(ToolKind::Calibrate);
            let outcome = drag(&mut editor, (0.0, 0.0), (200.0, 0.0));
            assert_eq!(outcome, ToolOutcome::CalibrationRequested { pixels: 200.0 });
            editor.complete_calibration(2.0, "m").unwrap();
        }
        let lines = editor
            .shapes()
            .iter()
            .filter(|s| s.kind() == ShapeKind::CalibrationLine)
            .count();
        assert_eq!(lines, 1);
        assert_eq!(editor.tool(), ToolKind::Select);
        let calibration = editor.active_layout().calibration.as_ref().unwrap();
        assert!((calibration.pixels_per_unit - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_calibration_keeps_pending_line() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::Calibrate);
        drag(&mut editor, (0.0, 0.0), (200.0, 0.0));
        assert!(editor.complete_calibration(0.0, "m").is_err());
        assert!(editor.tools_mut().pending_calibration().is_some());
        assert!(editor.active_layout().calibration.is_none());
    }

    #[test]
    fn test_layout_switch_drops_pending_calibration() {
        let mut editor = Editor::default();
        let first = editor.project().active_id();
        let second = editor.add_layout("Level 2");

        editor.set_tool(ToolKind::Calibrate);
        drag(&mut editor, (0.0, 0.0), (200.0, 0.0));
        editor.switch_layout(second).unwrap();

        assert!(editor.complete_calibration(2.0, "m").is_err());
        assert!(editor.active_layout().calibration.is_none());
        assert!(editor.shapes().is_empty());
        assert!(editor.project().layout(first).unwrap().calibration.is_none());
    }

    #[test]
    fn test_removing_active_layout_drops_pending_calibration() {
        let mut editor = Editor::default();
        let first = editor.project().active_id();
        editor.add_layout("Level 2");

        editor.set_tool(ToolKind::Calibrate);
        drag(&mut editor, (0.0, 0.0), (200.0, 0.0));
        editor.remove_layout(first).unwrap();

        assert!(editor.tools_mut().pending_calibration().is_none());
        assert!(editor.complete_calibration(2.0, "m").is_err());
        assert!(editor.active_layout().calibration.is_none());
    }

    #[test]
    fn test_undo_without_history_keeps_vertex_buffer() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::DrawPolygon);
        for (x, y) in [(0.0, 0.0), (100.0, 0.0)] {
            editor.handle_pointer(PointerEvent::down(Point::new(x, y)));
            editor.handle_pointer(PointerEvent::up(Point::new(x, y)));
        }
        assert_eq!(editor.handle_key(KeyAction::Undo), ToolOutcome::None);
        assert!(!editor.redo());
        let Interaction::Vertices { points, .. } = editor.interaction() else {
            panic!("vertex buffer was discarded");
        };
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_reorder_without_change_adds_no_history() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::ZoneRect);
        let ToolOutcome::Committed(below) = drag(&mut editor, (0.0, 0.0), (50.0, 50.0)) else {
            panic!("rectangle not committed");
        };
        editor.set_tool(ToolKind::ZoneRect);
        let ToolOutcome::Committed(top) = drag(&mut editor, (100.0, 0.0), (150.0, 50.0)) else {
            panic!("rectangle not committed");
        };

        // Already on top.
        assert_eq!(editor.reorder_selected(ReorderDirection::ToFront), ToolOutcome::None);
        assert!(editor.undo());
        assert!(editor.shape(top).is_none());
        assert!(editor.shape(below).is_some());
    }

    #[test]
    fn test_reorder_is_one_undo_step() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::ZoneRect);
        let ToolOutcome::Committed(below) = drag(&mut editor, (0.0, 0.0), (50.0, 50.0)) else {
            panic!("rectangle not committed");
        };
        editor.set_tool(ToolKind::ZoneRect);
        let ToolOutcome::Committed(top) = drag(&mut editor, (100.0, 0.0), (150.0, 50.0)) else {
            panic!("rectangle not committed");
        };

        assert_eq!(
            editor.reorder_selected(ReorderDirection::ToBack),
            ToolOutcome::Modified(vec![top])
        );
        assert_eq!(editor.shapes()[0].id(), top);
        assert!(editor.undo());
        let order: Vec<ShapeId> = editor.shapes().iter().map(Shape::id).collect();
        assert_eq!(order, vec![below, top]);
    }

    #[test]
    fn test_link_and_unlink_activity_are_undoable() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::ZoneRect);
        let ToolOutcome::Committed(id) = drag(&mut editor, (0.0, 0.0), (50.0, 50.0)) else {
            panic!("zone not committed");
        };
        let activity = LinkedActivity {
            code: "A100".to_string(),
            title: "Pour slab".to_string(),
            start: chrono::NaiveDate::from_ymd_opt(2024, 3, 4),
            end: chrono::NaiveDate::from_ymd_opt(2024, 3, 8),
        };
        editor.link_activity(id, activity).unwrap();
        assert!(editor.shape(id).unwrap().is_connected());

        let removed = editor.unlink_activity(id, "A100").unwrap();
        assert_eq!(removed.map(|a| a.code), Some("A100".to_string()));
        assert!(editor.undo());
        assert!(editor.shape(id).unwrap().is_connected());
    }

    #[test]
    fn test_commands_ignored_mid_gesture() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::DrawPolygon);
        editor.handle_pointer(PointerEvent::down(Point::new(0.0, 0.0)));
        editor.handle_pointer(PointerEvent::Down {
            position: Point::new(50.0, 0.0),
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        });
        assert_eq!(editor.handle_key(KeyAction::SelectAll), ToolOutcome::None);
        assert!(matches!(editor.interaction(), Interaction::Vertices { .. }));
        editor.handle_key(KeyAction::Escape);
        assert_eq!(editor.interaction(), &Interaction::Idle);
    }

    #[test]
    fn test_fit_to_content_uses_background() {
        let mut editor = Editor::default();
        editor.set_viewport_size(1000.0, 500.0);
        editor
            .set_background(Some(Background {
                reference: "plan.png".to_string(),
                width: 2000.0,
                height: 1000.0,
            }))
            .unwrap();
        editor.fit_to_content();
        assert!((editor.view().scale() - 0.45).abs() < 1e-9);
        let center = editor.view().to_screen(Rect::new(0.0, 0.0, 2000.0, 1000.0).center());
        assert!((center - Point::new(500.0, 250.0)).hypot() < 1e-9);
    }
}

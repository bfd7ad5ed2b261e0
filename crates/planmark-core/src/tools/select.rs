//! The select tool: handles, hit testing, drag, resize, rotate and pan.

use super::handles::{HandleKind, hit_test_handles};
use super::manipulate::{apply_handle, apply_rotation, retract, rotation_for_pointer};
use super::{CursorHint, Interaction, ToolContext, ToolKind, ToolMachine, ToolOutcome};
use crate::config::EditorConfig;
use crate::filter::{FilterCriteria, is_visible};
use crate::geometry::topmost_at;
use crate::input::Modifiers;
use crate::selection::Selection;
use crate::shapes::Shape;
use crate::store::ShapeStore;
use crate::view::ViewTransform;
use kurbo::Point;

impl ToolMachine {
    /// Press priority: handles of the single selected shape, then the
    /// topmost visible shape, then empty space (pan).
    pub(super) fn select_down(
        &mut self,
        ctx: &mut ToolContext,
        model: Point,
        screen: Point,
        modifiers: Modifiers,
    ) -> ToolOutcome {
        let scale = ctx.view.scale();

        if let Some(shape) = single_selected(ctx.store, ctx.selection, ctx.filter) {
            if let Some(handle) = hit_test_handles(shape, model, scale, ctx.config) {
                let shape = shape.clone();
                return self.engage_handle(ctx, shape, handle, model);
            }
        }

        let hit = topmost_at(ctx.store.shapes(), model, scale, ctx.config.hit_tolerance, |s| {
            is_visible(s, ctx.filter)
        })
        .map(Shape::id);

        let Some(id) = hit else {
            if !modifiers.shift {
                ctx.selection.clear();
            }
            self.interaction = Interaction::Panning {
                last: screen,
                moved: false,
            };
            return ToolOutcome::None;
        };

        if modifiers.shift {
            ctx.selection.toggle(id);
            if !ctx.selection.contains(id) {
                return ToolOutcome::None;
            }
        } else if !ctx.selection.contains(id) {
            ctx.selection.select(id);
        }

        let originals: Vec<Shape> = ctx
            .selection
            .ids()
            .iter()
            .filter_map(|id| ctx.store.get(*id).cloned())
            .collect();
        self.interaction = Interaction::Dragging {
            originals,
            start: model,
            saved: false,
        };
        ToolOutcome::None
    }

    fn engage_handle(&mut self, ctx: &mut ToolContext, shape: Shape, handle: HandleKind, model: Point) -> ToolOutcome {
        match handle {
            HandleKind::Rotate => {
                self.interaction = Interaction::Rotating {
                    center: shape.bounds().center(),
                    original: shape,
                    saved: false,
                };
                ToolOutcome::None
            }
            HandleKind::Extend(end) => {
                self.begin_extension(&shape, end);
                ToolOutcome::None
            }
            HandleKind::Retract(end) => {
                let id = shape.id();
                let mut retracted = shape;
                ctx.history.save(ctx.store);
                if retract(&mut retracted, end) {
                    match ctx.store.update(retracted, true) {
                        Ok(()) => ToolOutcome::Modified(vec![id]),
                        Err(_) => ToolOutcome::None,
                    }
                } else {
                    ctx.selection.remove(id);
                    match ctx.store.remove(id) {
                        Ok(_) => ToolOutcome::Removed(vec![id]),
                        Err(_) => ToolOutcome::None,
                    }
                }
            }
            HandleKind::Corner(_) | HandleKind::Endpoint(_) | HandleKind::Vertex(_) | HandleKind::TextEdge(_) => {
                self.interaction = Interaction::Resizing {
                    original: shape,
                    handle,
                    start: model,
                    saved: false,
                };
                ToolOutcome::None
            }
        }
    }

    /// Apply the current drag, resize or rotate frame. The history entry is
    /// taken on the first frame that actually changes geometry.
    pub(super) fn manipulate_move(&mut self, ctx: &mut ToolContext, model: Point) -> ToolOutcome {
        let min_size = ctx.config.min_box_size;
        let updated: Vec<Shape> = match &mut self.interaction {
            Interaction::Dragging {
                originals,
                start,
                saved,
            } => {
                let delta = model - *start;
                if delta.hypot2() < f64::EPSILON && !*saved {
                    return ToolOutcome::None;
                }
                ensure_saved(ctx, saved);
                originals
                    .iter()
                    .map(|original| {
                        let mut shape = original.clone();
                        shape.translate(delta);
                        shape
                    })
                    .collect()
            }
            Interaction::Resizing {
                original,
                handle,
                start,
                saved,
            } => {
                let delta = model - *start;
                if delta.hypot2() < f64::EPSILON && !*saved {
                    return ToolOutcome::None;
                }
                ensure_saved(ctx, saved);
                vec![apply_handle(original, *handle, delta, min_size)]
            }
            Interaction::Rotating {
                original,
                center,
                saved,
            } => {
                let Some(degrees) = rotation_for_pointer(*center, model) else {
                    return ToolOutcome::None;
                };
                ensure_saved(ctx, saved);
                let mut shape = original.clone();
                apply_rotation(&mut shape, degrees);
                vec![shape]
            }
            _ => return ToolOutcome::None,
        };

        let ids = updated.iter().map(Shape::id).collect();
        for shape in updated {
            // A concurrent delete is absorbed; the store already logged it.
            let _ = ctx.store.update(shape, false);
        }
        ToolOutcome::Modified(ids)
    }

    /// End a drag/resize/rotate. Re-emits the final state with
    /// `record_history` so observers can persist it.
    pub(super) fn manipulate_up(&mut self, ctx: &mut ToolContext) -> ToolOutcome {
        let interaction = std::mem::take(&mut self.interaction);
        let (ids, saved) = match interaction {
            Interaction::Dragging { originals, saved, .. } => (originals.iter().map(Shape::id).collect::<Vec<_>>(), saved),
            Interaction::Resizing { original, saved, .. } | Interaction::Rotating { original, saved, .. } => {
                (vec![original.id()], saved)
            }
            _ => return ToolOutcome::None,
        };
        if !saved {
            return ToolOutcome::None;
        }
        for id in &ids {
            if let Some(shape) = ctx.store.get(*id).cloned() {
                let _ = ctx.store.update(shape, true);
            }
        }
        log::debug!("Manipulated {} shape(s)", ids.len());
        ToolOutcome::Modified(ids)
    }
}

fn ensure_saved(ctx: &mut ToolContext, saved: &mut bool) {
    if !*saved {
        ctx.history.save(ctx.store);
        *saved = true;
    }
}

/// The single selected shape, if it is present and visible.
fn single_selected<'a>(store: &'a ShapeStore, selection: &Selection, filter: &FilterCriteria) -> Option<&'a Shape> {
    let id = selection.single()?;
    store.get(id).filter(|s| is_visible(s, filter))
}

/// Cursor for a pointer hovering at `screen` with no button pressed (or the
/// current gesture's cursor while one is active).
pub fn hover_hint(
    machine: &ToolMachine,
    store: &ShapeStore,
    view: &ViewTransform,
    selection: &Selection,
    filter: &FilterCriteria,
    config: &EditorConfig,
    screen: Point,
) -> CursorHint {
    match machine.interaction() {
        Interaction::Panning { .. } => return CursorHint::Grabbing,
        Interaction::Dragging { .. } => return CursorHint::Move,
        Interaction::Resizing { .. } => return CursorHint::Resize,
        Interaction::Rotating { .. } => return CursorHint::Rotate,
        Interaction::Drawing { .. } | Interaction::Vertices { .. } | Interaction::PlacingSymbol { .. } => {
            return CursorHint::Crosshair;
        }
        Interaction::Idle => {}
    }
    if machine.tool() != ToolKind::Select {
        return CursorHint::Crosshair;
    }

    let model = view.to_model(screen);
    let scale = view.scale();
    if let Some(shape) = single_selected(store, selection, filter) {
        match hit_test_handles(shape, model, scale, config) {
            Some(HandleKind::Rotate) => return CursorHint::Rotate,
            Some(HandleKind::Extend(_) | HandleKind::Retract(_)) => return CursorHint::Pointer,
            Some(_) => return CursorHint::Resize,
            None => {}
        }
    }
    match topmost_at(store.shapes(), model, scale, config.hit_tolerance, |s| is_visible(s, filter)) {
        Some(shape) if selection.contains(shape.id()) => CursorHint::Move,
        Some(_) => CursorHint::Pointer,
        None => CursorHint::Grab,
    }
}

//! Shape store: the project plus change notification.
//!
//! All shape mutations go through [`ShapeStore`]. Every successful mutation
//! emits a [`StoreEvent`] to the registered observers.

use crate::error::{EditorError, EditorResult};
use crate::layout::{Layout, LayoutId, Project, ViewState};
use crate::measure::Calibration;
use crate::shapes::{Shape, ShapeId};
use std::fmt;

/// Z-order move direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderDirection {
    ToFront,
    ToBack,
}

/// Change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Added(ShapeId),
    /// `record_history` mirrors the flag passed to [`ShapeStore::update`].
    Updated { id: ShapeId, record_history: bool },
    Removed(ShapeId),
    Reordered(Vec<ShapeId>),
    /// A layout's whole shape list was swapped (undo/redo, load).
    Replaced(LayoutId),
    ActiveLayoutChanged(LayoutId),
    /// Layout added, removed, renamed or re-calibrated.
    LayoutChanged(LayoutId),
}

type Observer = Box<dyn FnMut(&StoreEvent)>;

/// Owns the project and notifies observers on mutation.
#[derive(Default)]
pub struct ShapeStore {
    project: Project,
    observers: Vec<Observer>,
}

impl fmt::Debug for ShapeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeStore")
            .field("project", &self.project)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ShapeStore {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            observers: Vec::new(),
        }
    }

    /// Register an observer called after every mutation.
    pub fn subscribe(&mut self, observer: impl FnMut(&StoreEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&mut self, event: StoreEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn active_layout(&self) -> &Layout {
        self.project.active()
    }

    pub fn active_layout_id(&self) -> LayoutId {
        self.project.active_id()
    }

    /// Shapes of the active layout, back to front.
    pub fn shapes(&self) -> &[Shape] {
        &self.project.active().shapes
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.project.active().shape(id)
    }

    /// Append a shape on top of the active layout.
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.project.active_mut().shapes.push(shape);
        self.notify(StoreEvent::Added(id));
        id
    }

    /// Replace a stored shape with the same id.
    ///
    /// `record_history` is false for intermediate gesture frames; history
    /// itself is recorded by the caller, the flag only travels with the
    /// event so observers can skip transient updates.
    pub fn update(&mut self, mut shape: Shape, record_history: bool) -> EditorResult<()> {
        let id = shape.id();
        let Some(slot) = self.project.active_mut().shape_mut(id) else {
            log::warn!("Update for unknown shape {id}");
            return Err(EditorError::UnknownShape(id));
        };
        shape.refresh_bounds();
        *slot = shape;
        self.notify(StoreEvent::Updated { id, record_history });
        Ok(())
    }

    /// Apply `f` to a stored shape in place, refreshing its bounds after.
    pub fn modify(&mut self, id: ShapeId, record_history: bool, f: impl FnOnce(&mut Shape)) -> EditorResult<()> {
        let Some(shape) = self.project.active_mut().shape_mut(id) else {
            log::warn!("Modify for unknown shape {id}");
            return Err(EditorError::UnknownShape(id));
        };
        f(shape);
        shape.refresh_bounds();
        self.notify(StoreEvent::Updated { id, record_history });
        Ok(())
    }

    pub fn remove(&mut self, id: ShapeId) -> EditorResult<Shape> {
        let layout = self.project.active_mut();
        let Some(index) = layout.index_of(id) else {
            log::warn!("Remove for unknown shape {id}");
            return Err(EditorError::UnknownShape(id));
        };
        let removed = layout.shapes.remove(index);
        self.notify(StoreEvent::Removed(id));
        Ok(removed)
    }

    /// Move shapes to the top or bottom of the z-order, keeping their
    /// relative order. Unknown ids are skipped with a warning.
    pub fn reorder(&mut self, ids: &[ShapeId], direction: ReorderDirection) -> EditorResult<()> {
        let Some(&first) = ids.first() else {
            return Ok(());
        };
        let layout = self.project.active_mut();
        let (mut moved, rest): (Vec<Shape>, Vec<Shape>) =
            std::mem::take(&mut layout.shapes).into_iter().partition(|s| ids.contains(&s.id()));
        // Keep the caller's order out of the partition.
        moved.sort_by_key(|s| ids.iter().position(|id| *id == s.id()));
        let found: Vec<ShapeId> = moved.iter().map(Shape::id).collect();
        layout.shapes = match direction {
            ReorderDirection::ToFront => rest.into_iter().chain(moved).collect(),
            ReorderDirection::ToBack => moved.into_iter().chain(rest).collect(),
        };
        if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
            log::warn!("Reorder skipped unknown shape {missing}");
        }
        if found.is_empty() {
            return Err(EditorError::UnknownShape(first));
        }
        self.notify(StoreEvent::Reordered(found));
        Ok(())
    }

    /// Swap the shape list of a layout wholesale.
    pub fn replace_shapes(&mut self, layout: LayoutId, shapes: Vec<Shape>) -> EditorResult<()> {
        self.project.layout_mut(layout)?.shapes = shapes;
        self.notify(StoreEvent::Replaced(layout));
        Ok(())
    }

    /// Snapshot of a layout's shape list.
    pub fn layout_shapes(&self, layout: LayoutId) -> EditorResult<Vec<Shape>> {
        self.project
            .layout(layout)
            .map(|l| l.shapes.clone())
            .ok_or(EditorError::UnknownLayout(layout))
    }

    pub fn set_active_layout(&mut self, layout: LayoutId) -> EditorResult<()> {
        if self.project.active_id() == layout {
            return Ok(());
        }
        self.project.set_active(layout)?;
        log::info!("Switched to layout {layout}");
        self.notify(StoreEvent::ActiveLayoutChanged(layout));
        Ok(())
    }

    pub fn add_layout(&mut self, layout: Layout) -> LayoutId {
        let id = self.project.push_layout(layout);
        self.notify(StoreEvent::LayoutChanged(id));
        id
    }

    pub fn remove_layout(&mut self, layout: LayoutId) -> EditorResult<Layout> {
        let previous_active = self.project.active_id();
        let removed = self.project.remove_layout(layout)?;
        self.notify(StoreEvent::LayoutChanged(layout));
        if self.project.active_id() != previous_active {
            let active = self.project.active_id();
            self.notify(StoreEvent::ActiveLayoutChanged(active));
        }
        Ok(removed)
    }

    pub fn rename_layout(&mut self, layout: LayoutId, name: impl Into<String>) -> EditorResult<()> {
        self.project.layout_mut(layout)?.name = name.into();
        self.notify(StoreEvent::LayoutChanged(layout));
        Ok(())
    }

    pub fn set_calibration(&mut self, layout: LayoutId, calibration: Calibration) -> EditorResult<()> {
        self.project.layout_mut(layout)?.calibration = Some(calibration);
        self.notify(StoreEvent::LayoutChanged(layout));
        Ok(())
    }

    pub fn set_background(&mut self, layout: LayoutId, background: Option<crate::layout::Background>) -> EditorResult<()> {
        self.project.layout_mut(layout)?.background = background;
        self.notify(StoreEvent::LayoutChanged(layout));
        Ok(())
    }

    /// Record a layout's view state. Not an observable change.
    pub(crate) fn set_view_state(&mut self, layout: LayoutId, view: ViewState) -> EditorResult<()> {
        self.project.layout_mut(layout)?.view = view;
        Ok(())
    }

    /// Replace the whole project (load).
    pub fn replace_project(&mut self, project: Project) {
        self.project = project;
        let active = self.project.active_id();
        self.notify(StoreEvent::Replaced(active));
        self.notify(StoreEvent::ActiveLayoutChanged(active));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use std::cell::RefCell;
    use std::rc::Rc;
    use uuid::Uuid;

    fn square(x: f64) -> Shape {
        Shape::rectangle(Rect::new(x, 0.0, x + 10.0, 10.0))
    }

    #[test]
    fn test_add_get_remove() {
        let mut store = ShapeStore::default();
        let id = store.add(square(0.0));
        assert!(store.get(id).is_some());
        store.remove(id).unwrap();
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let mut store = ShapeStore::default();
        let missing = Uuid::new_v4();
        assert!(matches!(store.remove(missing), Err(EditorError::UnknownShape(_))));
        let stray = square(0.0);
        assert!(store.update(stray, true).is_err());
        assert!(store.shapes().is_empty());
    }

    #[test]
    fn test_reorder() {
        let mut store = ShapeStore::default();
        let a = store.add(square(0.0));
        let b = store.add(square(20.0));
        let c = store.add(square(40.0));

        store.reorder(&[a], ReorderDirection::ToFront).unwrap();
        let order: Vec<_> = store.shapes().iter().map(Shape::id).collect();
        assert_eq!(order, vec![b, c, a]);

        store.reorder(&[c, a], ReorderDirection::ToBack).unwrap();
        let order: Vec<_> = store.shapes().iter().map(Shape::id).collect();
        assert_eq!(order, vec![c, a, b]);

        assert!(store.reorder(&[Uuid::new_v4()], ReorderDirection::ToBack).is_err());
    }

    #[test]
    fn test_observers_receive_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut store = ShapeStore::default();
        store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let id = store.add(square(0.0));
        store.modify(id, false, |s| s.hidden = true).unwrap();
        store.remove(id).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], StoreEvent::Added(id));
        assert_eq!(
            events[1],
            StoreEvent::Updated {
                id,
                record_history: false
            }
        );
        assert_eq!(events[2], StoreEvent::Removed(id));
    }

    #[test]
    fn test_replace_shapes_unknown_layout() {
        let mut store = ShapeStore::default();
        assert!(matches!(
            store.replace_shapes(Uuid::new_v4(), Vec::new()),
            Err(EditorError::UnknownLayout(_))
        ));
    }
}

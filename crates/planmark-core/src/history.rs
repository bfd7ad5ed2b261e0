//! Snapshot undo/redo across layouts.

use crate::config::MAX_UNDO_HISTORY;
use crate::layout::LayoutId;
use crate::shapes::Shape;
use crate::store::ShapeStore;

/// A deep copy of one layout's shape list.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub layout_id: LayoutId,
    pub shapes: Vec<Shape>,
}

/// Bounded undo/redo stacks of layout snapshots.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Push the active layout's current shapes (call before making changes).
    pub fn save(&mut self, store: &ShapeStore) {
        self.record(store.active_layout_id(), store.shapes().to_vec());
    }

    /// Push a snapshot taken before a change that has since been applied.
    pub fn record(&mut self, layout_id: LayoutId, shapes: Vec<Shape>) {
        self.undo_stack.push(HistoryEntry { layout_id, shapes });
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last change. Returns false when there is nothing to undo.
    pub fn undo(&mut self, store: &mut ShapeStore) -> bool {
        Self::step(&mut self.undo_stack, &mut self.redo_stack, store)
    }

    /// Redo the last undone change. Returns false when there is nothing to redo.
    pub fn redo(&mut self, store: &mut ShapeStore) -> bool {
        Self::step(&mut self.redo_stack, &mut self.undo_stack, store)
    }

    /// Pop from `from`, push the target layout's current list to `to`, then
    /// restore the popped snapshot and activate its layout.
    fn step(from: &mut Vec<HistoryEntry>, to: &mut Vec<HistoryEntry>, store: &mut ShapeStore) -> bool {
        let Some(entry) = from.pop() else {
            return false;
        };
        let current = match store.layout_shapes(entry.layout_id) {
            Ok(shapes) => shapes,
            Err(err) => {
                // The layout was removed since the snapshot; drop the entry.
                log::warn!("Discarding history entry: {err}");
                return false;
            }
        };
        to.push(HistoryEntry {
            layout_id: entry.layout_id,
            shapes: current,
        });
        if let Err(err) = store.set_active_layout(entry.layout_id) {
            log::warn!("History could not activate layout: {err}");
        }
        if let Err(err) = store.replace_shapes(entry.layout_id, entry.shapes) {
            log::warn!("History could not restore shapes: {err}");
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Drop entries that target a removed layout.
    pub fn forget_layout(&mut self, layout: LayoutId) {
        self.undo_stack.retain(|e| e.layout_id != layout);
        self.redo_stack.retain(|e| e.layout_id != layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use kurbo::Rect;

    fn square() -> Shape {
        Shape::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_undo_redo() {
        let mut store = ShapeStore::default();
        let mut history = History::default();
        assert!(!history.can_undo());

        history.save(&store);
        store.add(square());
        assert_eq!(store.shapes().len(), 1);

        assert!(history.undo(&mut store));
        assert!(store.shapes().is_empty());
        assert!(history.can_redo());

        assert!(history.redo(&mut store));
        assert_eq!(store.shapes().len(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut store = ShapeStore::default();
        store.add(square());
        let before = store.shapes().to_vec();
        let mut history = History::default();
        assert!(!history.undo(&mut store));
        assert!(!history.redo(&mut store));
        assert_eq!(store.shapes(), before.as_slice());
    }

    #[test]
    fn test_save_clears_redo() {
        let mut store = ShapeStore::default();
        let mut history = History::default();
        history.save(&store);
        store.add(square());
        history.undo(&mut store);
        history.save(&store);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_depth_is_bounded() {
        let store = ShapeStore::default();
        let mut history = History::new(3);
        for _ in 0..10 {
            history.save(&store);
        }
        assert_eq!(history.undo_stack.len(), 3);
    }

    #[test]
    fn test_undo_switches_layout() {
        let mut store = ShapeStore::default();
        let mut history = History::default();
        let first = store.active_layout_id();

        history.save(&store);
        store.add(square());

        let second = store.add_layout(Layout::new("Level 2"));
        store.set_active_layout(second).unwrap();

        assert!(history.undo(&mut store));
        assert_eq!(store.active_layout_id(), first);
        assert!(store.shapes().is_empty());

        assert!(history.redo(&mut store));
        assert_eq!(store.shapes().len(), 1);
    }
}

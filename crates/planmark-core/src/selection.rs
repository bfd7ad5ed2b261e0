//! Ordered selection set with a primary member.

use crate::shapes::ShapeId;

/// Selected shape ids in selection order. The primary member is the one
/// whose handles are shown when the selection holds a single shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ShapeId>,
    primary: Option<ShapeId>,
}

impl Selection {
    pub fn ids(&self) -> &[ShapeId] {
        &self.ids
    }

    pub fn primary(&self) -> Option<ShapeId> {
        self.primary
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.ids.contains(&id)
    }

    /// The single selected shape, if exactly one is selected.
    pub fn single(&self) -> Option<ShapeId> {
        match self.ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Replace the selection with one shape.
    pub fn select(&mut self, id: ShapeId) {
        self.ids.clear();
        self.ids.push(id);
        self.primary = Some(id);
    }

    /// Replace the selection with many shapes; the last becomes primary.
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
        self.primary = self.ids.last().copied();
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle(&mut self, id: ShapeId) {
        if let Some(index) = self.ids.iter().position(|s| *s == id) {
            self.ids.remove(index);
            if self.primary == Some(id) {
                self.primary = self.ids.last().copied();
            }
        } else {
            self.ids.push(id);
            self.primary = Some(id);
        }
    }

    pub fn remove(&mut self, id: ShapeId) {
        self.ids.retain(|s| *s != id);
        if self.primary == Some(id) {
            self.primary = self.ids.last().copied();
        }
    }

    /// Drop ids for which `exists` is false.
    pub fn retain(&mut self, exists: impl Fn(ShapeId) -> bool) {
        self.ids.retain(|id| exists(*id));
        if self.primary.is_some_and(|p| !self.ids.contains(&p)) {
            self.primary = self.ids.last().copied();
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.primary = None;
    }
}

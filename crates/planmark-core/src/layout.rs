//! Layouts and the project that holds them.

use crate::error::{EditorError, EditorResult};
use crate::measure::Calibration;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for layouts.
pub type LayoutId = Uuid;

/// Reference to the raster drawing a layout annotates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// Host-defined reference (file name, URL, storage key).
    pub reference: String,
    /// Width in pixels (model units).
    pub width: f64,
    /// Height in pixels (model units).
    pub height: f64,
}

impl Background {
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Persisted pan/zoom of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub scale: f64,
    pub pan: Vec2,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

/// One background plus its shapes, view and calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub id: LayoutId,
    pub name: String,
    /// Shapes back to front.
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub background: Option<Background>,
    #[serde(default)]
    pub view: ViewState,
    #[serde(default)]
    pub calibration: Option<Calibration>,
}

impl Layout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            shapes: Vec::new(),
            background: None,
            view: ViewState::default(),
            calibration: None,
        }
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub(crate) fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id() == id)
    }

    pub(crate) fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| s.id() == id)
    }

    /// Extent used by fit-to-content: the background if present, otherwise
    /// the union of the shape bounds.
    pub fn content_bounds(&self) -> Option<Rect> {
        match &self.background {
            Some(bg) if bg.width > 0.0 && bg.height > 0.0 => Some(bg.rect()),
            _ => crate::geometry::union_bounds(&self.shapes),
        }
    }
}

/// Ordered layouts with exactly one active.
///
/// The layout list is never empty; deserialization rejects an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProjectRepr")]
pub struct Project {
    layouts: Vec<Layout>,
    active: LayoutId,
}

#[derive(Deserialize)]
struct ProjectRepr {
    layouts: Vec<Layout>,
    #[serde(default)]
    active: Option<LayoutId>,
}

impl TryFrom<ProjectRepr> for Project {
    type Error = String;

    fn try_from(repr: ProjectRepr) -> Result<Self, Self::Error> {
        Project::from_layouts(repr.layouts, repr.active).ok_or_else(|| "project has no layouts".to_string())
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    /// A project with a single empty layout.
    pub fn new() -> Self {
        Self::with_layout(Layout::new("Layout 1"))
    }

    pub fn with_layout(layout: Layout) -> Self {
        Self {
            active: layout.id,
            layouts: vec![layout],
        }
    }

    /// Build from a layout list. `None` when the list is empty; an unknown
    /// `active` falls back to the first layout.
    pub fn from_layouts(layouts: Vec<Layout>, active: Option<LayoutId>) -> Option<Self> {
        let first = layouts.first()?.id;
        let active = active
            .filter(|id| layouts.iter().any(|l| l.id == *id))
            .unwrap_or(first);
        Some(Self { layouts, active })
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn active_id(&self) -> LayoutId {
        self.active
    }

    pub fn active(&self) -> &Layout {
        self.layouts
            .iter()
            .find(|l| l.id == self.active)
            .unwrap_or(&self.layouts[0])
    }

    pub(crate) fn active_mut(&mut self) -> &mut Layout {
        let index = self.layouts.iter().position(|l| l.id == self.active).unwrap_or(0);
        &mut self.layouts[index]
    }

    pub fn layout(&self, id: LayoutId) -> Option<&Layout> {
        self.layouts.iter().find(|l| l.id == id)
    }

    pub(crate) fn layout_mut(&mut self, id: LayoutId) -> EditorResult<&mut Layout> {
        self.layouts
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(EditorError::UnknownLayout(id))
    }

    pub(crate) fn set_active(&mut self, id: LayoutId) -> EditorResult<()> {
        if self.layout(id).is_none() {
            return Err(EditorError::UnknownLayout(id));
        }
        self.active = id;
        Ok(())
    }

    pub(crate) fn push_layout(&mut self, layout: Layout) -> LayoutId {
        let id = layout.id;
        self.layouts.push(layout);
        id
    }

    /// Remove a layout. The last layout cannot be removed; removing the
    /// active one activates its neighbour.
    pub(crate) fn remove_layout(&mut self, id: LayoutId) -> EditorResult<Layout> {
        let index = self
            .layouts
            .iter()
            .position(|l| l.id == id)
            .ok_or(EditorError::UnknownLayout(id))?;
        if self.layouts.len() == 1 {
            return Err(EditorError::LastLayout);
        }
        let removed = self.layouts.remove(index);
        if self.active == id {
            self.active = self.layouts[index.min(self.layouts.len() - 1)].id;
        }
        Ok(removed)
    }

    /// Find which layout holds a shape.
    pub fn layout_of(&self, shape: ShapeId) -> Option<LayoutId> {
        self.layouts
            .iter()
            .find(|l| l.shape(shape).is_some())
            .map(|l| l.id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

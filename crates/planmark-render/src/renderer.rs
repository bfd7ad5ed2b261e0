//! Renderer trait abstraction.

use kurbo::{Affine, Size};
use peniko::Color;
use planmark_core::filter::{FilterCriteria, is_visible};
use planmark_core::layout::Layout;
use planmark_core::selection::Selection;
use planmark_core::shapes::Shape;
use planmark_core::symbols::SymbolLibrary;
use planmark_core::tools::Interaction;
use planmark_core::{Editor, EditorConfig, ViewTransform};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Symbol could not be rasterized: {0}")]
    Symbol(String),
    #[error("Image could not be decoded: {0}")]
    Image(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// What the frame is for.
///
/// Screen frames size labels and hairlines from the view scale. Export
/// frames size them from the drawing width so the output reads the same
/// whatever zoom the user was at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Screen,
    Export,
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// Layout whose background and shapes are drawn.
    pub layout: &'a Layout,
    pub view: &'a ViewTransform,
    pub selection: &'a Selection,
    pub filter: &'a FilterCriteria,
    pub symbols: &'a SymbolLibrary,
    pub config: &'a EditorConfig,
    pub interaction: &'a Interaction,
    /// In-progress shape drawn above the stored ones.
    pub preview: Option<Shape>,
    /// Viewport size in logical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    pub background_color: Color,
    /// Selection highlight color.
    pub selection_color: Color,
    pub mode: RenderMode,
}

impl<'a> RenderContext<'a> {
    /// Capture everything needed to draw the editor's active layout.
    pub fn new(editor: &'a Editor) -> Self {
        Self {
            layout: editor.active_layout(),
            view: editor.view(),
            selection: editor.selection(),
            filter: editor.filter(),
            symbols: editor.symbols(),
            config: editor.config(),
            interaction: editor.interaction(),
            preview: editor.preview(),
            viewport_size: editor.viewport_size(),
            scale_factor: 1.0,
            background_color: Color::from_rgba8(240, 240, 240, 255),
            selection_color: Color::from_rgba8(59, 130, 246, 255),
            mode: RenderMode::Screen,
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Model → device-pixel transform.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale_factor) * self.view.transform()
    }

    /// Device pixels per model unit.
    pub fn device_scale(&self) -> f64 {
        self.view.scale() * self.scale_factor
    }

    /// Width export labels are sized against: the background when there is
    /// one, otherwise the viewport expressed in model units.
    pub fn reference_width(&self) -> f64 {
        match &self.layout.background {
            Some(background) if background.width > 0.0 => background.width,
            _ => self.viewport_size.width / self.view.scale(),
        }
    }

    /// Shapes that pass the active filter, back to front.
    pub fn visible_shapes(&self) -> impl Iterator<Item = &'a Shape> {
        let filter = self.filter;
        self.layout.shapes.iter().filter(move |shape| is_visible(shape, filter))
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Build the scene for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Color to clear the surface with.
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

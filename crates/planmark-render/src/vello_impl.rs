//! Vello-based renderer implementation.

use crate::labels::{LabelMetrics, LabelPlacement, label_placement, label_text};
use crate::patterns::pattern_segments;
use crate::renderer::{RenderContext, RenderResult, Renderer};
use crate::symbol_cache::{SymbolCache, decode_image, outline_mode};
use kurbo::{Affine, BezPath, Circle, Line, Point, Rect, Size, Stroke, Vec2};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext, StyleProperty};
use peniko::{Blob, Brush, Color, Fill, ImageData};
use planmark_core::filter::{FilterCriteria, is_visible};
use planmark_core::geometry::bounding_box;
use planmark_core::layout::Layout;
use planmark_core::measure::Calibration;
use planmark_core::shapes::path::shape_path;
use planmark_core::shapes::{Geometry, Shape, SymbolGeometry, TextGeometry};
use planmark_core::symbols::SymbolLibrary;
use planmark_core::tools::{Handle, HandleKind, Interaction, handles_for};
use planmark_core::EditorConfig;
use std::collections::HashSet;
use std::sync::Arc;
use vello::Scene;

/// Padding around the content when exporting a layout without a background.
const EXPORT_PADDING: f64 = 20.0;

const LABEL_TEXT: Color = Color::from_rgba8(17, 24, 39, 255);
const LABEL_BACKDROP: Color = Color::from_rgba8(255, 255, 255, 210);
const BADGE_COLOR: Color = Color::from_rgba8(234, 88, 12, 255);
const PLACEHOLDER_FILL: Color = Color::from_rgba8(200, 200, 200, 255);
const PLACEHOLDER_STROKE: Color = Color::from_rgba8(150, 150, 150, 255);

/// Per-frame borrowed state shared by the shape routines.
struct Frame<'a> {
    transform: Affine,
    calibration: Option<&'a Calibration>,
    symbols: &'a SymbolLibrary,
}

/// Vello-based renderer.
///
/// Fonts are not bundled; hosts register them with
/// [`VelloRenderer::register_font`]. Without fonts labels still get their
/// backdrop so their position stays visible.
pub struct VelloRenderer {
    scene: Scene,
    selection_color: Color,
    /// Font context for text rendering (cached to avoid re-registering fonts).
    font_cx: FontContext,
    layout_cx: LayoutContext<Brush>,
    /// CSS-style font stack used for labels and text shapes.
    font_stack: String,
    metrics: LabelMetrics,
    /// Decoded raster for the active layout's background.
    background: Option<ImageData>,
    symbol_cache: SymbolCache,
    /// Symbol ids already reported missing.
    missing_symbols: HashSet<String>,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            selection_color: Color::from_rgba8(59, 130, 246, 255),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            font_stack: "sans-serif".to_string(),
            metrics: LabelMetrics::screen(1.0),
            background: None,
            symbol_cache: SymbolCache::default(),
            missing_symbols: HashSet::new(),
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Register font data (TTF/OTF bytes) for labels and text shapes.
    pub fn register_font(&mut self, data: Vec<u8>) {
        self.font_cx.collection.register_fonts(Blob::new(Arc::new(data)), None);
    }

    pub fn set_font_stack(&mut self, stack: impl Into<String>) {
        self.font_stack = stack.into();
    }

    /// Use already-decoded pixels for the active layout's background.
    pub fn set_background_image(&mut self, image: Option<ImageData>) {
        self.background = image;
    }

    /// Decode encoded image bytes and use them as the background.
    pub fn set_background_bytes(&mut self, bytes: &[u8]) -> RenderResult<()> {
        self.background = Some(decode_image(bytes)?);
        Ok(())
    }

    /// Forget cached rasters of a symbol whose definition changed.
    pub fn invalidate_symbol(&mut self, symbol_id: &str) {
        self.symbol_cache.invalidate(symbol_id);
        self.missing_symbols.remove(symbol_id);
    }

    /// Metrics used by the last built frame.
    pub fn metrics(&self) -> LabelMetrics {
        self.metrics
    }

    /// Build a scene for export: background and visible shapes at one model
    /// unit per output pixel, without selection or in-progress shapes.
    ///
    /// The output covers the background when the layout has one, otherwise
    /// the padded content bounds. Returns `None` for the size when there is
    /// nothing to export.
    pub fn build_export_scene(
        &mut self,
        layout: &Layout,
        symbols: &SymbolLibrary,
        filter: &FilterCriteria,
    ) -> (Scene, Option<Size>) {
        self.scene.reset();

        let region = match &layout.background {
            Some(background) if background.width > 0.0 && background.height > 0.0 => Some(background.rect()),
            _ => layout
                .content_bounds()
                .map(|bounds| bounds.inflate(EXPORT_PADDING, EXPORT_PADDING)),
        };
        let Some(region) = region else {
            return (std::mem::take(&mut self.scene), None);
        };

        self.metrics = LabelMetrics::export(region.width());
        let transform = Affine::translate((-region.x0, -region.y0));
        let size = region.size();

        self.scene.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            Color::WHITE,
            None,
            &Rect::from_origin_size(Point::ORIGIN, size),
        );
        self.render_background(layout, transform);

        let frame = Frame {
            transform,
            calibration: layout.calibration.as_ref(),
            symbols,
        };
        for shape in layout.shapes.iter().filter(|shape| is_visible(shape, filter)) {
            self.render_shape(shape, &frame);
        }

        (std::mem::take(&mut self.scene), Some(size))
    }

    fn render_background(&mut self, layout: &Layout, transform: Affine) {
        let Some(background) = &layout.background else {
            return;
        };
        let rect = background.rect();
        match &self.background {
            Some(image) if image.width > 0 && image.height > 0 => {
                let image_transform = transform
                    * Affine::translate((rect.x0, rect.y0))
                    * Affine::scale_non_uniform(
                        rect.width() / image.width as f64,
                        rect.height() / image.height as f64,
                    );
                self.scene.draw_image(&image.clone().into(), image_transform);
            }
            _ => {
                self.scene.fill(Fill::NonZero, transform, Color::WHITE, None, &rect);
                let stroke = Stroke::new(self.metrics.hairline);
                self.scene.stroke(&stroke, transform, PLACEHOLDER_STROKE, None, &rect);
            }
        }
    }

    fn render_shape(&mut self, shape: &Shape, frame: &Frame) {
        match &shape.geometry {
            Geometry::Text(text) => self.render_text(shape, text, frame.transform),
            Geometry::Symbol(symbol) => self.render_symbol(shape, symbol, frame),
            _ => self.render_outline(shape, frame.transform),
        }
        if let Some(text) = label_text(shape, frame.calibration) {
            if let Some(placement) = label_placement(shape, self.metrics.font_size) {
                self.render_label(&text, placement, frame.transform);
            }
        }
        if shape.is_connected() {
            self.render_badge(shape, frame.transform);
        }
    }

    /// Fill, pattern and border of every path-backed kind.
    fn render_outline(&mut self, shape: &Shape, transform: Affine) {
        let path = shape_path(shape);
        let style = &shape.style;

        if !shape.kind().is_stroke_only() {
            self.scene
                .fill(Fill::NonZero, transform, style.fill_with_opacity(), None, &path);

            let segments = pattern_segments(shape, self.metrics.pattern_spacing);
            if !segments.is_empty() {
                let mut hatch = BezPath::new();
                for segment in segments {
                    hatch.move_to(segment.p0);
                    hatch.line_to(segment.p1);
                }
                let color: Color = style.border_color.with_opacity(0.6).into();
                self.scene
                    .stroke(&Stroke::new(self.metrics.hairline), transform, color, None, &hatch);
            }
        }

        let stroke = self.metrics.border_stroke(style);
        self.scene.stroke(&stroke, transform, style.border(), None, &path);
    }

    fn render_text(&mut self, shape: &Shape, text: &TextGeometry, transform: Affine) {
        let rect = text.frame.rect();
        if text.content.is_empty() {
            // Caret where typing would start.
            let caret = Line::new(rect.origin(), rect.origin() + Vec2::new(0.0, text.font_size * 1.2));
            let stroke = Stroke::new(2.0 * self.metrics.hairline);
            self.scene
                .stroke(&stroke, transform, Color::from_rgba8(100, 100, 100, 200), None, &caret);
            return;
        }

        let brush = Brush::Solid(shape.style.border());
        let layout = self.build_layout(&text.content, text.font_size as f32, &brush, Some(rect.width() as f32));
        let drawn = self.draw_layout(&layout, &brush, transform * Affine::translate(rect.origin().to_vec2()));

        // No glyphs means no usable font: mark the text box instead.
        if drawn == 0 {
            self.scene.fill(
                Fill::NonZero,
                transform,
                Color::from_rgba8(255, 100, 100, 100),
                None,
                &rect,
            );
        }
    }

    fn render_symbol(&mut self, shape: &Shape, symbol: &SymbolGeometry, frame: &Frame) {
        let rect = symbol.frame.rect();
        let transform = frame.transform * Affine::rotate_about(symbol.rotation.to_radians(), rect.center());

        let image = match frame.symbols.get(&symbol.symbol_id) {
            Some(def) => self
                .symbol_cache
                .get_or_render(def, shape.style.border_color, outline_mode(&shape.style))
                .cloned(),
            None => {
                if self.missing_symbols.insert(symbol.symbol_id.clone()) {
                    log::warn!("Shape {} references unknown symbol {}", shape.id(), symbol.symbol_id);
                }
                None
            }
        };

        match image {
            Some(image) if image.width > 0 && image.height > 0 => {
                let image_transform = transform
                    * Affine::translate(rect.origin().to_vec2())
                    * Affine::scale_non_uniform(
                        rect.width() / image.width as f64,
                        rect.height() / image.height as f64,
                    );
                self.scene.draw_image(&image.into(), image_transform);
            }
            _ => {
                self.render_placeholder(rect, transform);
                let placement = LabelPlacement {
                    center: rect.center(),
                    angle: 0.0,
                };
                self.render_label(&symbol.symbol_id, placement, frame.transform);
            }
        }
    }

    /// Grey box with a cross, for symbols that cannot be drawn.
    fn render_placeholder(&mut self, rect: Rect, transform: Affine) {
        self.scene
            .fill(Fill::NonZero, transform, PLACEHOLDER_FILL.with_alpha(0.5), None, &rect);

        let hairline = self.metrics.hairline;
        let dashed = Stroke::new(1.5 * hairline).with_dashes(0.0, [4.0 * hairline, 3.0 * hairline]);
        let mut cross = BezPath::new();
        cross.move_to(Point::new(rect.x0, rect.y0));
        cross.line_to(Point::new(rect.x1, rect.y1));
        cross.move_to(Point::new(rect.x1, rect.y0));
        cross.line_to(Point::new(rect.x0, rect.y1));
        self.scene.stroke(&dashed, transform, PLACEHOLDER_STROKE, None, &cross);
        self.scene.stroke(&dashed, transform, PLACEHOLDER_STROKE, None, &rect);
    }

    /// Label on a translucent backdrop, centered on `placement`.
    fn render_label(&mut self, text: &str, placement: LabelPlacement, transform: Affine) {
        let font_size = self.metrics.font_size;
        let brush = Brush::Solid(LABEL_TEXT);
        let layout = self.build_layout(text, font_size as f32, &brush, None);

        let (mut width, mut height) = (layout.width() as f64, layout.height() as f64);
        if width <= 0.0 {
            // Estimate from the character count when no font is available.
            width = text.chars().count() as f64 * font_size * 0.6;
            height = font_size * 1.2;
        }

        let local = transform * Affine::translate(placement.center.to_vec2()) * Affine::rotate(placement.angle);
        let padding = font_size * 0.25;
        let backdrop = Rect::new(
            -width / 2.0 - padding,
            -height / 2.0 - padding,
            width / 2.0 + padding,
            height / 2.0 + padding,
        );
        self.scene
            .fill(Fill::NonZero, local, LABEL_BACKDROP, None, &backdrop.to_rounded_rect(padding));
        self.draw_layout(&layout, &brush, local * Affine::translate((-width / 2.0, -height / 2.0)));
    }

    /// Connection badge at the top-right corner of a shape with linked
    /// activities.
    fn render_badge(&mut self, shape: &Shape, transform: Affine) {
        let bounds = bounding_box(shape);
        let radius = self.metrics.font_size * 0.6;
        let center = Point::new(bounds.x1, bounds.y0);
        let badge = Circle::new(center, radius);
        let hairline = self.metrics.hairline;

        self.scene.fill(Fill::NonZero, transform, BADGE_COLOR, None, &badge);
        self.scene
            .stroke(&Stroke::new(1.5 * hairline), transform, Color::WHITE, None, &badge);

        // Two interlocking rings.
        let ring = Stroke::new(1.2 * hairline);
        for dx in [-0.22, 0.22] {
            let link = Circle::new(center + Vec2::new(radius * dx, 0.0), radius * 0.35);
            self.scene.stroke(&ring, transform, Color::WHITE, None, &link);
        }
    }

    /// Selection outline, plus handles when `with_handles`.
    fn render_selection(
        &mut self,
        shape: &Shape,
        with_handles: bool,
        view_scale: f64,
        config: &EditorConfig,
        transform: Affine,
    ) {
        let hairline = self.metrics.hairline;
        let dashed = Stroke::new(hairline).with_dashes(0.0, [4.0 * hairline, 4.0 * hairline]);
        match &shape.geometry {
            // Endpoint handles are enough for segments.
            Geometry::Segment(_) => {}
            Geometry::Symbol(_) => {
                let outline = shape_path(shape);
                self.scene
                    .stroke(&dashed, transform, self.selection_color, None, &outline);
            }
            _ => {
                let bounds = bounding_box(shape);
                self.scene.stroke(&dashed, transform, self.selection_color, None, &bounds);
            }
        }

        if !with_handles {
            return;
        }
        if let Geometry::Symbol(symbol) = &shape.geometry {
            self.render_rotate_connector(symbol, view_scale, config, transform);
        }
        let size = config.handle_radius * 0.75 / view_scale.max(f64::EPSILON);
        for handle in handles_for(shape, view_scale, config) {
            self.render_handle(&handle, size, transform);
        }
    }

    fn render_rotate_connector(
        &mut self,
        symbol: &SymbolGeometry,
        view_scale: f64,
        config: &EditorConfig,
        transform: Affine,
    ) {
        let rect = symbol.frame.rect();
        let rotate = Affine::rotate_about(symbol.rotation.to_radians(), rect.center());
        let top = Point::new(rect.center().x, rect.y0);
        let knob = Point::new(top.x, rect.y0 - config.rotate_handle_offset / view_scale.max(f64::EPSILON));
        let line = Line::new(rotate * top, rotate * knob);
        self.scene.stroke(
            &Stroke::new(self.metrics.hairline),
            transform,
            self.selection_color,
            None,
            &line,
        );
    }

    /// Render a single handle.
    /// Sizes are in model units already divided by the view scale.
    fn render_handle(&mut self, handle: &Handle, size: f64, transform: Affine) {
        let pos = handle.position;
        let thick = Stroke::new(2.0 * self.metrics.hairline);
        let half = size / 2.0;

        match handle.kind {
            HandleKind::Endpoint(_) | HandleKind::Rotate => {
                let circle = Circle::new(pos, half);
                self.scene.fill(Fill::NonZero, transform, Color::WHITE, None, &circle);
                self.scene
                    .stroke(&thick, transform, self.selection_color, None, &circle);
            }
            HandleKind::Corner(_) | HandleKind::Vertex(_) | HandleKind::TextEdge(_) => {
                let rect = Rect::new(pos.x - half, pos.y - half, pos.x + half, pos.y + half);
                self.scene.fill(Fill::NonZero, transform, Color::WHITE, None, &rect);
                self.scene.stroke(
                    &Stroke::new(1.5 * self.metrics.hairline),
                    transform,
                    self.selection_color,
                    None,
                    &rect,
                );
            }
            HandleKind::Extend(_) | HandleKind::Retract(_) => {
                let circle = Circle::new(pos, half);
                self.scene
                    .fill(Fill::NonZero, transform, self.selection_color, None, &circle);
                // Plus for extend, minus for retract.
                let arm = half * 0.55;
                let mut glyph = BezPath::new();
                glyph.move_to(pos - Vec2::new(arm, 0.0));
                glyph.line_to(pos + Vec2::new(arm, 0.0));
                if matches!(handle.kind, HandleKind::Extend(_)) {
                    glyph.move_to(pos - Vec2::new(0.0, arm));
                    glyph.line_to(pos + Vec2::new(0.0, arm));
                }
                self.scene.stroke(&thick, transform, Color::WHITE, None, &glyph);
            }
        }
    }

    /// Ring around the first vertex of a multi-point draw: releasing inside
    /// it closes the shape.
    fn render_close_target(&mut self, first: Point, radius: f64, transform: Affine) {
        let ring = Circle::new(first, radius);
        let fill = self.selection_color.with_alpha(0.15);
        self.scene.fill(Fill::NonZero, transform, fill, None, &ring);
        self.scene.stroke(
            &Stroke::new(self.metrics.hairline),
            transform,
            self.selection_color,
            None,
            &ring,
        );
    }

    fn build_layout(
        &mut self,
        content: &str,
        font_size: f32,
        brush: &Brush,
        max_width: Option<f32>,
    ) -> parley::Layout<Brush> {
        let mut builder = self.layout_cx.ranged_builder(&mut self.font_cx, content, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font_size));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Source(
            self.font_stack.as_str().into(),
        )));
        let mut layout = builder.build(content);
        layout.break_all_lines(max_width);
        layout.align(max_width, parley::Alignment::Start, parley::AlignmentOptions::default());
        layout
    }

    /// Draw a computed layout with its top-left corner at the origin of
    /// `transform`. Returns the number of glyphs drawn.
    fn draw_layout(&mut self, layout: &parley::Layout<Brush>, brush: &Brush, transform: Affine) -> usize {
        let mut glyph_count = 0;
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let font = run.font();
                let font_size = run.font_size();
                let synthesis = run.synthesis();
                let glyph_xform = synthesis
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();
                glyph_count += glyphs.len();

                if !glyphs.is_empty() {
                    self.scene
                        .draw_glyphs(font)
                        .brush(brush)
                        .transform(transform)
                        .glyph_transform(glyph_xform)
                        .font_size(font_size)
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }
        glyph_count
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();
        self.selection_color = ctx.selection_color;
        self.metrics = LabelMetrics::for_mode(ctx.mode, ctx.device_scale(), ctx.reference_width());

        let transform = ctx.transform();
        self.render_background(ctx.layout, transform);

        let frame = Frame {
            transform,
            calibration: ctx.layout.calibration.as_ref(),
            symbols: ctx.symbols,
        };
        for shape in ctx.visible_shapes() {
            self.render_shape(shape, &frame);
        }

        if let Some(preview) = &ctx.preview {
            self.render_shape(preview, &frame);
        }

        if let Interaction::Vertices {
            points,
            extending: None,
            ..
        } = ctx.interaction
        {
            if let Some(first) = points.first().filter(|_| points.len() >= 3) {
                let radius = ctx.config.close_radius / ctx.view.scale().max(f64::EPSILON);
                self.render_close_target(*first, radius, transform);
            }
        }

        let single = ctx.selection.single();
        for shape in ctx.visible_shapes().filter(|shape| ctx.selection.contains(shape.id())) {
            let with_handles = single == Some(shape.id());
            self.render_selection(shape, with_handles, ctx.view.scale(), ctx.config, transform);
        }
    }
}

//! Rasterized symbol instances, one per (symbol, color, outline mode).

use crate::renderer::{RenderResult, RendererError};
use peniko::{Blob, ImageAlphaType, ImageData, ImageFormat};
use planmark_core::shapes::{SerializableColor, ShapeStyle};
use planmark_core::symbols::{SymbolDef, SymbolKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Long edge of a rasterized vector symbol, in pixels.
pub const SYMBOL_RASTER_SIZE: u32 = 256;

/// Cache key. Raster symbols ignore color, so their key carries a fixed one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolKey {
    pub symbol_id: String,
    pub color: SerializableColor,
    pub outline: bool,
}

impl SymbolKey {
    pub fn new(symbol: &SymbolDef, color: SerializableColor, outline: bool) -> Self {
        match symbol.kind {
            SymbolKind::Vector => Self {
                symbol_id: symbol.id.clone(),
                color,
                outline,
            },
            SymbolKind::Raster => Self {
                symbol_id: symbol.id.clone(),
                color: SerializableColor::transparent(),
                outline: false,
            },
        }
    }
}

/// Symbols with a transparent fill are drawn as outlines.
pub fn outline_mode(style: &ShapeStyle) -> bool {
    style.fill_color.a == 0 || style.opacity <= 0.0
}

/// Decoded symbol images. Failures are cached too, so a broken symbol is
/// reported once instead of every frame.
pub struct SymbolCache {
    entries: HashMap<SymbolKey, Option<ImageData>>,
    raster_size: u32,
}

impl Default for SymbolCache {
    fn default() -> Self {
        Self::new(SYMBOL_RASTER_SIZE)
    }
}

impl std::fmt::Debug for SymbolCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolCache")
            .field("entries", &self.entries.len())
            .field("raster_size", &self.raster_size)
            .finish()
    }
}

impl SymbolCache {
    pub fn new(raster_size: u32) -> Self {
        Self {
            entries: HashMap::new(),
            raster_size: raster_size.max(1),
        }
    }

    /// Image for a symbol in the given color, rendering it on first use.
    pub fn get_or_render(&mut self, symbol: &SymbolDef, color: SerializableColor, outline: bool) -> Option<&ImageData> {
        let size = self.raster_size;
        self.entries
            .entry(SymbolKey::new(symbol, color, outline))
            .or_insert_with(|| match rasterize(symbol, color, outline, size) {
                Ok(image) => Some(image),
                Err(err) => {
                    log::warn!("Symbol {} cannot be drawn: {err}", symbol.id);
                    None
                }
            })
            .as_ref()
    }

    /// Drop every cached instance of a symbol (after its definition changed).
    pub fn invalidate(&mut self, symbol_id: &str) {
        self.entries.retain(|key, _| key.symbol_id != symbol_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Render a symbol definition to RGBA pixels.
pub fn rasterize(symbol: &SymbolDef, color: SerializableColor, outline: bool, size: u32) -> RenderResult<ImageData> {
    match symbol.kind {
        SymbolKind::Vector => {
            let markup = symbol
                .recolored_markup(color, outline)
                .ok_or_else(|| RendererError::Symbol(format!("{} has no markup", symbol.id)))?;
            rasterize_svg(&markup, size)
        }
        SymbolKind::Raster => decode_image(&symbol.source),
    }
}

/// Rasterize SVG markup so its long edge is `size` pixels.
pub fn rasterize_svg(markup: &str, size: u32) -> RenderResult<ImageData> {
    let options = resvg::usvg::Options::default();
    let tree =
        resvg::usvg::Tree::from_str(markup, &options).map_err(|err| RendererError::Symbol(err.to_string()))?;

    let svg_size = tree.size();
    let scale = size as f32 / svg_size.width().max(svg_size.height());
    let width = ((svg_size.width() * scale).ceil() as u32).max(1);
    let height = ((svg_size.height() * scale).ceil() as u32).max(1);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RendererError::Symbol(format!("cannot allocate {width}x{height} pixmap")))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    Ok(rgba_image(pixmap.take(), width, height, ImageAlphaType::AlphaPremultiplied))
}

/// Decode PNG/JPEG/WebP bytes.
pub fn decode_image(bytes: &[u8]) -> RenderResult<ImageData> {
    let decoded = image::load_from_memory(bytes).map_err(|err| RendererError::Image(err.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(rgba_image(rgba.into_vec(), width, height, ImageAlphaType::Alpha))
}

/// Wrap RGBA8 pixels for drawing.
pub fn rgba_image(pixels: Vec<u8>, width: u32, height: u32, alpha_type: ImageAlphaType) -> ImageData {
    ImageData {
        data: Blob::new(Arc::new(pixels)),
        format: ImageFormat::Rgba8,
        width,
        height,
        alpha_type,
    }
}

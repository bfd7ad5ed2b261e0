//! Symbol definitions placed on layouts.

use crate::shapes::SerializableColor;
use serde::{Deserialize, Serialize};

/// How a symbol's `source` is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// SVG markup, recolorable through tokens.
    Vector,
    /// Encoded raster bytes (PNG/JPEG/WebP).
    Raster,
}

/// A symbol library entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    pub id: String,
    pub kind: SymbolKind,
    /// SVG markup for vector symbols, raw encoded bytes for raster ones.
    pub source: Vec<u8>,
    pub name: String,
    /// Width / height used when growing a placement.
    #[serde(default = "default_aspect")]
    pub aspect: f64,
}

fn default_aspect() -> f64 {
    1.0
}

impl SymbolDef {
    pub fn vector(id: impl Into<String>, name: impl Into<String>, markup: impl Into<String>, aspect: f64) -> Self {
        Self {
            id: id.into(),
            kind: SymbolKind::Vector,
            source: markup.into().into_bytes(),
            name: name.into(),
            aspect,
        }
    }

    pub fn raster(id: impl Into<String>, name: impl Into<String>, bytes: Vec<u8>, aspect: f64) -> Self {
        Self {
            id: id.into(),
            kind: SymbolKind::Raster,
            source: bytes,
            name: name.into(),
            aspect,
        }
    }

    /// Usable aspect ratio (non-positive or non-finite values fall back to 1).
    pub fn aspect(&self) -> f64 {
        if self.aspect.is_finite() && self.aspect > 0.0 {
            self.aspect
        } else {
            1.0
        }
    }

    /// Vector markup with color tokens substituted. `outline` leaves the
    /// fill transparent so only strokes take the color.
    pub fn recolored_markup(&self, color: SerializableColor, outline: bool) -> Option<String> {
        if self.kind != SymbolKind::Vector {
            return None;
        }
        let markup = String::from_utf8_lossy(&self.source);
        Some(recolor(&markup, color, outline))
    }
}

/// Substitute `currentColor`, `{{fill}}` and `{{stroke}}` tokens.
pub fn recolor(markup: &str, color: SerializableColor, outline: bool) -> String {
    let hex = color.to_hex();
    let fill = if outline { "none".to_string() } else { hex.clone() };
    markup
        .replace("{{fill}}", &fill)
        .replace("{{stroke}}", &hex)
        .replace("currentColor", &hex)
}

/// Symbol definitions by id, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SymbolLibrary {
    symbols: Vec<SymbolDef>,
}

impl SymbolLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition.
    pub fn insert(&mut self, symbol: SymbolDef) {
        match self.symbols.iter_mut().find(|s| s.id == symbol.id) {
            Some(existing) => *existing = symbol,
            None => self.symbols.push(symbol),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<SymbolDef> {
        let index = self.symbols.iter().position(|s| s.id == id)?;
        Some(self.symbols.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&SymbolDef> {
        self.symbols.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolDef> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKUP: &str = r#"<svg><rect fill="{{fill}}" stroke="{{stroke}}"/><path fill="currentColor"/></svg>"#;

    #[test]
    fn test_recolor_tokens() {
        let red = SerializableColor::new(255, 0, 0, 255);
        let solid = recolor(MARKUP, red, false);
        assert_eq!(
            solid,
            r##"<svg><rect fill="#ff0000" stroke="#ff0000"/><path fill="#ff0000"/></svg>"##
        );
        let outline = recolor(MARKUP, red, true);
        assert!(outline.contains(r#"fill="none""#));
        assert!(outline.contains(r##"stroke="#ff0000""##));
    }

    #[test]
    fn test_library_replace_and_remove() {
        let mut library = SymbolLibrary::new();
        library.insert(SymbolDef::vector("crane", "Crane", MARKUP, 2.0));
        library.insert(SymbolDef::vector("crane", "Tower crane", MARKUP, 2.0));
        assert_eq!(library.len(), 1);
        assert_eq!(library.get("crane").map(|s| s.name.as_str()), Some("Tower crane"));
        assert!(library.remove("crane").is_some());
        assert!(library.is_empty());
    }

    #[test]
    fn test_raster_has_no_markup() {
        let symbol = SymbolDef::raster("photo", "Photo", vec![1, 2, 3], 0.0);
        assert!(symbol.recolored_markup(SerializableColor::black(), false).is_none());
        assert!((symbol.aspect() - 1.0).abs() < f64::EPSILON);
    }
}

//! Video collaborator traits - font glyphs come from outside the runtime.
//!
//! These traits are defined in `abi` so that:
//! - `video` can render text through a trait object
//! - the embedding application supplies the font store
//! - tests can plug in a fixed fixture font

use crate::bitmap::Bitmap;
use crate::error::OplResult;
use crate::geometry::Size;

/// Identifies a font known to the glyph provider
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontDescriptor {
    /// Platform font UID
    pub uid: u32,
}

impl FontDescriptor {
    pub const fn new(uid: u32) -> Self {
        Self { uid }
    }
}

/// Vertical and horizontal metrics of a font
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FontMetrics {
    pub height: i32,
    pub ascent: i32,
    pub descent: i32,
    pub max_width: i32,
}

/// Font handle plus metrics, returned to the interpreter after a load
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FontInfo {
    pub font: FontDescriptor,
    pub metrics: FontMetrics,
}

/// A pre-rasterized character.
///
/// `bitmap` spans the full font height with its top row on the line's top
/// (baseline minus ascent). Black samples are ink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Glyph {
    pub bitmap: Bitmap,
    pub advance: i32,
}

/// Glyph image source.
pub trait GlyphProvider: Send + Sync {
    /// Metrics for a font, `None` if the font is unknown.
    fn metrics(&self, font: &FontDescriptor) -> Option<FontMetrics>;

    /// Glyph for `ch`, `None` when the font has no such character.
    fn glyph(&self, font: &FontDescriptor, ch: char) -> Option<Glyph>;

    /// Load a font file, returning its descriptor.
    fn load_font(&self, path: &str) -> OplResult<FontDescriptor>;

    /// Aggregate pixel size of a string.
    fn text_size(&self, font: &FontDescriptor, text: &str) -> Size {
        let height = self.metrics(font).map(|m| m.height).unwrap_or(0);
        let width = text
            .chars()
            .filter_map(|ch| self.glyph(font, ch))
            .map(|g| g.advance)
            .sum();
        Size::new(width, height)
    }
}

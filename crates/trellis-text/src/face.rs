// crates/trellis-text/src/face.rs
//! Seams to the font, shaping and GPU services.

use std::path::Path;

use glam::Vec2;
use trellis_core::FontSize;

use crate::error::TextResult;

/// ISO 15924 script tag, e.g. `*b"Latn"`.
pub type ScriptTag = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeDirection {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl ShapeDirection {
    /// Clusters of backward directions decrease along the glyph sequence.
    pub fn is_backward(self) -> bool {
        matches!(self, ShapeDirection::RightToLeft | ShapeDirection::BottomToTop)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, ShapeDirection::TopToBottom | ShapeDirection::BottomToTop)
    }
}

/// OpenType feature toggle applied to a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontFeature {
    pub tag: [u8; 4],
    pub value: u32,
}

impl FontFeature {
    pub const LIGATURE_ON: FontFeature = FontFeature::new(*b"liga", 1);
    pub const LIGATURE_OFF: FontFeature = FontFeature::new(*b"liga", 0);
    pub const KERNING_ON: FontFeature = FontFeature::new(*b"kern", 1);
    pub const KERNING_OFF: FontFeature = FontFeature::new(*b"kern", 0);
    pub const CLIG_ON: FontFeature = FontFeature::new(*b"clig", 1);
    pub const CLIG_OFF: FontFeature = FontFeature::new(*b"clig", 0);

    pub const fn new(tag: [u8; 4], value: u32) -> Self {
        Self { tag, value }
    }
}

pub struct ShapeRequest<'a> {
    pub text: &'a str,
    pub direction: ShapeDirection,
    pub script: ScriptTag,
    pub language: &'a str,
    pub features: &'a [FontFeature],
}

/// Glyph as returned by the shaping backend, in visual order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawGlyph {
    /// 0 means the font has no glyph for this cluster.
    pub glyph_id: u32,
    /// Byte offset into the shaped text.
    pub cluster: usize,
    /// Pixels, y pointing up.
    pub advance: Vec2,
    pub offset: Vec2,
}

/// 8-bit coverage bitmap, `width * height` bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterizedGlyph {
    pub width: u16,
    pub height: u16,
    pub bearing_x: i32,
    pub bearing_y: i32,
    pub bitmap: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeMetrics {
    pub ascender: f32,
    /// Negative below the baseline.
    pub descender: f32,
    pub line_height: f32,
}

impl SizeMetrics {
    pub fn region_up(&self) -> f32 {
        let extent = self.ascender - self.descender;
        if extent > f32::EPSILON {
            self.ascender / extent
        } else {
            1.0
        }
    }
}

/// An opened font at a configurable size.
pub trait FontFace {
    fn set_char_size(&mut self, size: FontSize, dpi: u32) -> TextResult<()>;
    fn shape(&mut self, request: &ShapeRequest<'_>) -> TextResult<Vec<RawGlyph>>;
    fn rasterize(&mut self, glyph_id: u32) -> TextResult<RasterizedGlyph>;
    fn size_metrics(&self) -> SizeMetrics;
}

pub trait FontBackend {
    fn open_face(&self, path: &Path) -> TextResult<Box<dyn FontFace>>;
}

/// GPU-visible mirror of the atlas.
pub trait AtlasUploader {
    fn capacity(&self) -> usize;
    fn reallocate(&mut self, capacity: usize);
    fn upload(&mut self, offset: usize, bytes: &[u8]);
}

// crates/trellis-text/src/error.rs
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("Could not open font {path}: {reason}")]
    FaceOpen { path: PathBuf, reason: String },

    #[error("Could not set font size to {size}pt: {reason}")]
    CharSize { size: f32, reason: String },

    #[error("Could not rasterize glyph {glyph}: {reason}")]
    GlyphRaster { glyph: u32, reason: String },

    #[error("Shaping failed: {0}")]
    Shaping(String),

    #[error("Bidi analysis failed: {0}")]
    Bidi(String),

    #[error("Font index {requested} out of range ({installed} fonts installed)")]
    FontIndexOutOfRange { requested: u16, installed: usize },

    #[error("Shaper has no usable font face")]
    FaceUnavailable,
}

pub type TextResult<T> = std::result::Result<T, TextError>;

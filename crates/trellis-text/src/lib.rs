// crates/trellis-text/src/lib.rs
//! Text shaping for trellis: bidi analysis, font fallback and the shared glyph atlas.
//!
//! Fonts are registered on a [`ShaperManager`], which splits each rich text run into visual
//! runs, shapes them and caches the rasterized glyphs in a [`GlyphAtlas`]. Font access goes
//! through the [`FontFace`] and [`FontBackend`] traits; the `native` feature provides an
//! implementation backed by `rustybuzz` and `fontdue`.

pub mod atlas;
pub mod bidi;
pub mod error;
pub mod face;
pub mod free_list;
pub mod glyph;
pub mod manager;
#[cfg(feature = "native")]
pub mod native;
pub mod script;
pub mod shaper;

pub use atlas::{GlyphAtlas, DEFAULT_ATLAS_CAPACITY};
pub use bidi::VisualRun;
pub use error::{TextError, TextResult};
pub use face::{
    AtlasUploader, FontBackend, FontFace, FontFeature, RasterizedGlyph, RawGlyph, ScriptTag, ShapeDirection,
    ShapeRequest, SizeMetrics,
};
pub use free_list::{FreeList, FreeRange};
pub use glyph::{is_private_use, CachedGlyph, GlyphFlags, GlyphKey, ShapedGlyph, ShapedText};
pub use manager::{ShaperConfig, ShaperManager};
#[cfg(feature = "native")]
pub use native::{NativeFace, NativeFontBackend};
pub use shaper::{Shaper, ShapingContext};

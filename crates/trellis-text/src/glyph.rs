// crates/trellis-text/src/glyph.rs
use bitflags::bitflags;
use glam::Vec2;
use trellis_core::FontSize;

/// Unicode private use area. Glyphs from these codepoints are drawn by an icon path and
/// take no space in the atlas.
pub const PRIVATE_USE_AREA: std::ops::RangeInclusive<u32> = 0xE000..=0xF8FF;

pub fn is_private_use(codepoint: u32) -> bool {
    PRIVATE_USE_AREA.contains(&codepoint)
}

/// Identifies a rasterized glyph in the atlas.
///
/// `codepoint` is the glyph index produced by the shaper, not a Unicode scalar.
/// `font` is 1-based; 0 never names a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphKey {
    pub codepoint: u32,
    pub pt_size: FontSize,
    pub font: u16,
}

impl GlyphKey {
    pub fn new(codepoint: u32, pt_size: FontSize, font: u16) -> Self {
        Self {
            codepoint,
            pt_size,
            font,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedGlyph {
    pub key: GlyphKey,
    /// Byte offset of the bitmap in the atlas. 0 for glyphs without a bitmap.
    pub offset: usize,
    pub width: u16,
    pub height: u16,
    pub bearing: Vec2,
    /// Distance between baselines for the font and size this glyph was made with.
    pub newline_size: f32,
    /// Ascender / (ascender - descender).
    pub region_up: f32,
    pub private_area: bool,
    pub ref_count: u32,
}

impl CachedGlyph {
    pub fn size_bytes(&self) -> usize {
        if self.private_area {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.size_bytes()
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GlyphFlags: u8 {
        const NEWLINE = 1 << 0;
        const WORD_BREAKER = 1 << 1;
        const RTL = 1 << 2;
        const TAB = 1 << 3;
        const PRIVATE_AREA = 1 << 4;
    }
}

/// One glyph instance produced by shaping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
    /// Pen movement after this glyph, y pointing down.
    pub advance: Vec2,
    pub offset: Vec2,
    /// Filled in by text layout.
    pub caret_pos: Vec2,
    pub flags: GlyphFlags,
    pub rich_text_index: usize,
    /// Byte offset of the glyph's cluster in the label text.
    pub cluster_start: usize,
    pub cluster_length: usize,
    /// Look up with [`crate::GlyphAtlas::glyph`].
    pub glyph: GlyphKey,
}

impl ShapedGlyph {
    pub fn is_newline(&self) -> bool {
        self.flags.contains(GlyphFlags::NEWLINE)
    }

    pub fn is_word_breaker(&self) -> bool {
        self.flags.contains(GlyphFlags::WORD_BREAKER)
    }

    pub fn is_rtl(&self) -> bool {
        self.flags.contains(GlyphFlags::RTL)
    }

    pub fn is_tab(&self) -> bool {
        self.flags.contains(GlyphFlags::TAB)
    }
}

/// Output of shaping one label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedText {
    pub glyphs: Vec<ShapedGlyph>,
    /// Set when any glyph comes from the private use area and needs the icon path.
    pub has_private_use: bool,
}

impl ShapedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.glyphs.clear();
        self.has_private_use = false;
    }
}

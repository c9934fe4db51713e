// crates/trellis-core/src/text.rs
//! Text attributes shared by the shaping pipeline and its callers.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use glam::Vec4;

use crate::{Result, TrellisError};

/// Point size stored as 26.6 fixed point, which is what font backends expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FontSize(pub u32);

impl FontSize {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn from_pt(pt: f32) -> Self {
        Self((pt.max(0.0) * 64.0).round() as u32)
    }

    pub fn try_from_pt(pt: f32) -> Result<Self> {
        if !pt.is_finite() || pt <= 0.0 {
            return Err(TrellisError::InvalidFontSize(pt));
        }
        Ok(Self::from_pt(pt))
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn as_pt(self) -> f32 {
        self.0 as f32 / 64.0
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}pt", self.as_pt())
    }
}

/// Horizontal reading direction hint handed to bidi analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizReadingDir {
    /// Use whatever the shaper manager is configured with.
    #[default]
    Default,
    /// Detect from the text, falling back to left-to-right.
    AutoLTR,
    /// Detect from the text, falling back to right-to-left.
    AutoRTL,
    LTR,
    RTL,
}

impl HorizReadingDir {
    /// Whether the hint leans left-to-right when nothing else decides it.
    pub fn prefers_ltr(self) -> bool {
        matches!(self, HorizReadingDir::Default | HorizReadingDir::AutoLTR | HorizReadingDir::LTR)
    }
}

impl FromStr for HorizReadingDir {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(HorizReadingDir::Default),
            "auto" | "auto-ltr" | "autoltr" => Ok(HorizReadingDir::AutoLTR),
            "auto-rtl" | "autortl" => Ok(HorizReadingDir::AutoRTL),
            "ltr" => Ok(HorizReadingDir::LTR),
            "rtl" => Ok(HorizReadingDir::RTL),
            _ => Err(TrellisError::InvalidReadingDirection(s.to_string())),
        }
    }
}

/// Vertical layout preference for scripts that support top-to-bottom text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertReadingDir {
    #[default]
    Disabled,
    /// Top to bottom only when the manager enables vertical layout.
    IfNeededTTB,
    ForceTTB,
    /// Top to bottom, with embedded horizontal runs kept left to right.
    ForceTTBLTR,
}

impl VertReadingDir {
    pub fn wants_vertical(self, vertical_layout_enabled: bool) -> bool {
        match self {
            VertReadingDir::Disabled => false,
            VertReadingDir::IfNeededTTB => vertical_layout_enabled,
            VertReadingDir::ForceTTB | VertReadingDir::ForceTTBLTR => true,
        }
    }
}

/// Alignment that results from shaping a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextHorizAlignment {
    /// Runs disagree on direction; each line follows its own.
    #[default]
    Mixed,
    Left,
    Center,
    Right,
}

/// One styled run over a byte range of the label's text.
#[derive(Debug, Clone, PartialEq)]
pub struct RichText {
    pub pt_size: FontSize,
    /// Byte offset into the text.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
    pub reading_dir: HorizReadingDir,
    pub color: Vec4,
    pub background: Option<Vec4>,
    /// Index of the font to shape with; 0 selects the default shaper.
    pub font: u16,
    /// Range of shaped glyphs produced for this run, filled in by the shaper manager.
    pub glyph_start: usize,
    pub glyph_end: usize,
}

impl Default for RichText {
    fn default() -> Self {
        Self {
            pt_size: FontSize::from_pt(16.0),
            offset: 0,
            length: 0,
            reading_dir: HorizReadingDir::Default,
            color: Vec4::ONE,
            background: None,
            font: 0,
            glyph_start: 0,
            glyph_end: 0,
        }
    }
}

impl RichText {
    /// A run that covers all of `text`.
    pub fn covering(text: &str) -> Self {
        Self {
            length: text.len(),
            ..Self::default()
        }
    }

    pub fn with_range(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }

    pub fn with_pt_size(mut self, pt_size: FontSize) -> Self {
        self.pt_size = pt_size;
        self
    }

    pub fn with_reading_dir(mut self, reading_dir: HorizReadingDir) -> Self {
        self.reading_dir = reading_dir;
        self
    }

    pub fn with_font(mut self, font: u16) -> Self {
        self.font = font;
        self
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_background(mut self, background: Vec4) -> Self {
        self.background = Some(background);
        self
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    /// The slice of `text` this run covers, or an error if the range is not valid UTF-8
    /// boundaries inside `text`.
    pub fn slice<'a>(&self, text: &'a str) -> Result<&'a str> {
        text.get(self.byte_range())
            .ok_or(TrellisError::TextRangeOutOfBounds {
                offset: self.offset,
                end: self.offset + self.length,
                len: text.len(),
            })
    }
}

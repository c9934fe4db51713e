// crates/trellis-text/src/manager.rs
use std::path::Path;

use tracing::{debug, info, warn};
use trellis_core::{HorizReadingDir, LogSeverity, RichText, TextHorizAlignment, VertReadingDir};

use crate::atlas::GlyphAtlas;
use crate::bidi;
use crate::error::TextError;
use crate::face::{AtlasUploader, FontBackend, FontFace, ScriptTag, ShapeDirection};
use crate::glyph::{GlyphFlags, ShapedText};
use crate::shaper::{Shaper, ShapingContext, DEFAULT_DPI};

#[derive(Debug, Clone, PartialEq)]
pub struct ShaperConfig {
    pub dpi: u32,
    /// 1-based index of the shaper used for `RichText::font == 0` and bad indices.
    pub default_font: u16,
    pub default_reading_dir: HorizReadingDir,
    pub use_vertical_layout_when_available: bool,
    pub preferred_vert_reading_dir: VertReadingDir,
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            default_font: 1,
            default_reading_dir: HorizReadingDir::AutoLTR,
            use_vertical_layout_when_available: false,
            preferred_vert_reading_dir: VertReadingDir::Disabled,
        }
    }
}

/// Owns the registered fonts and the glyph atlas they share.
pub struct ShaperManager {
    shapers: Vec<Shaper>,
    atlas: GlyphAtlas,
    config: ShaperConfig,
}

impl ShaperManager {
    pub fn new() -> Self {
        Self {
            shapers: Vec::new(),
            atlas: GlyphAtlas::new(),
            config: ShaperConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ShaperConfig) -> Self {
        self.set_dpi(config.dpi);
        self.config = ShaperConfig {
            dpi: self.config.dpi,
            ..config
        };
        self
    }

    pub fn with_atlas(mut self, atlas: GlyphAtlas) -> Self {
        self.atlas = atlas;
        self
    }

    pub fn config(&self) -> &ShaperConfig {
        &self.config
    }

    /// Opens a font and registers it. Returns its 1-based index.
    pub fn add_shaper(&mut self, backend: &dyn FontBackend, path: &Path, script: ScriptTag, language: &str) -> u16 {
        let shaper = Shaper::open(backend, path, script, language);
        self.register(shaper)
    }

    pub fn add_shaper_with_face(
        &mut self,
        face: Box<dyn FontFace>,
        script: ScriptTag,
        language: &str,
        name: &str,
    ) -> u16 {
        self.register(Shaper::new(face, script, language, name))
    }

    fn register(&mut self, mut shaper: Shaper) -> u16 {
        shaper.set_dpi(self.config.dpi);
        info!("Registered font {} as #{}", shaper.name(), self.shapers.len() + 1);
        self.shapers.push(shaper);
        self.shapers.len() as u16
    }

    pub fn shapers(&self) -> &[Shaper] {
        &self.shapers
    }

    /// Shaper by 1-based font index.
    pub fn shaper_mut(&mut self, font: u16) -> Option<&mut Shaper> {
        let index = usize::from(font).checked_sub(1)?;
        self.shapers.get_mut(index)
    }

    pub fn set_default_shaper(&mut self, font: u16, reading_dir: HorizReadingDir, use_vertical_layout: bool) {
        if font == 0 || usize::from(font) > self.shapers.len() {
            LogSeverity::Error.emit(
                &TextError::FontIndexOutOfRange {
                    requested: font,
                    installed: self.shapers.len(),
                }
                .to_string(),
            );
        } else {
            self.config.default_font = font;
        }

        // The default cannot defer to itself
        self.config.default_reading_dir = match reading_dir {
            HorizReadingDir::Default => HorizReadingDir::AutoLTR,
            other => other,
        };
        self.config.use_vertical_layout_when_available = use_vertical_layout;
    }

    pub fn set_preferred_vert_reading_dir(&mut self, dir: VertReadingDir) {
        self.config.preferred_vert_reading_dir = dir;
    }

    pub fn preferred_vert_reading_dir(&self) -> VertReadingDir {
        self.config.preferred_vert_reading_dir
    }

    pub fn default_text_direction(&self) -> TextHorizAlignment {
        if self.config.default_reading_dir.prefers_ltr() {
            TextHorizAlignment::Left
        } else {
            TextHorizAlignment::Right
        }
    }

    pub fn set_dpi(&mut self, dpi: u32) {
        let dpi = if dpi == 0 {
            LogSeverity::Error.emit("DPI must be positive, using 96");
            DEFAULT_DPI
        } else {
            dpi
        };
        self.config.dpi = dpi;
        for shaper in &mut self.shapers {
            shaper.set_dpi(dpi);
        }
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn atlas_mut(&mut self) -> &mut GlyphAtlas {
        &mut self.atlas
    }

    pub fn update_gpu_buffers(&mut self, uploader: &mut dyn AtlasUploader) {
        self.atlas.update_gpu_buffers(uploader);
    }

    /// Releases every glyph referenced by `shaped` and empties it.
    pub fn release_glyphs(&mut self, shaped: &mut ShapedText) {
        for glyph in &shaped.glyphs {
            self.atlas.release(&glyph.glyph);
        }
        shaped.clear();
    }

    /// Shapes the part of `text` covered by `rich` and appends the glyphs to `out`.
    ///
    /// Returns the alignment implied by the directions found. Failures are logged and leave
    /// `out` untouched.
    pub fn render_string(
        &mut self,
        text: &str,
        rich: &mut RichText,
        rich_text_index: usize,
        vert_reading_dir: VertReadingDir,
        out: &mut ShapedText,
    ) -> TextHorizAlignment {
        rich.glyph_start = out.glyphs.len();
        rich.glyph_end = out.glyphs.len();

        let hint = match rich.reading_dir {
            HorizReadingDir::Default => self.config.default_reading_dir,
            other => other,
        };

        let runs = match bidi::analyze(text, rich.byte_range(), hint) {
            Ok(runs) => runs,
            Err(err) => {
                LogSeverity::Warning.emit(&err.to_string());
                return self.default_text_direction();
            }
        };

        let Some(index) = self.resolve_font(rich.font) else {
            warn!("No fonts registered, cannot shape {:?}", text);
            return self.default_text_direction();
        };

        let vertical = vert_reading_dir.wants_vertical(self.config.use_vertical_layout_when_available);
        let mut ltr = false;
        let mut rtl = false;

        self.shapers[index].set_font_size(rich.pt_size);
        let mut ctx = ShapingContext::new(&mut self.shapers, &mut self.atlas);
        for run in &runs {
            let Some(segment) = text.get(run.range.clone()) else {
                continue;
            };
            let direction = if vertical {
                ShapeDirection::TopToBottom
            } else if run.rtl {
                ShapeDirection::RightToLeft
            } else {
                ShapeDirection::LeftToRight
            };
            if run.rtl {
                rtl = true;
            } else {
                ltr = true;
            }

            let first_new = out.glyphs.len();
            ctx.render(
                index,
                segment,
                direction,
                rich_text_index,
                run.range.start,
                &mut out.glyphs,
                true,
            );
            out.has_private_use |= out.glyphs[first_new..]
                .iter()
                .any(|g| g.flags.contains(GlyphFlags::PRIVATE_AREA));
        }

        rich.glyph_end = out.glyphs.len();
        debug!(
            "Shaped {} runs into {} glyphs with font #{}",
            runs.len(),
            rich.glyph_end - rich.glyph_start,
            index + 1
        );

        match (ltr, rtl) {
            (false, false) => self.default_text_direction(),
            (true, false) => TextHorizAlignment::Left,
            (false, true) => TextHorizAlignment::Right,
            (true, true) => TextHorizAlignment::Mixed,
        }
    }

    /// 0-based shaper index for a rich text font, falling back to the default font.
    fn resolve_font(&self, font: u16) -> Option<usize> {
        if self.shapers.is_empty() {
            return None;
        }
        let fallback = usize::from(self.config.default_font)
            .clamp(1, self.shapers.len())
            - 1;
        match usize::from(font) {
            0 => Some(fallback),
            requested if requested <= self.shapers.len() => Some(requested - 1),
            _ => {
                LogSeverity::Error.emit(
                    &TextError::FontIndexOutOfRange {
                        requested: font,
                        installed: self.shapers.len(),
                    }
                    .to_string(),
                );
                Some(fallback)
            }
        }
    }
}

impl Default for ShaperManager {
    fn default() -> Self {
        Self::new()
    }
}

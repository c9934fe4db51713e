// crates/trellis-text/src/shaper.rs
use std::path::Path;

use glam::Vec2;
use tracing::{debug, warn};
use trellis_core::{FontSize, LogSeverity};

use crate::atlas::GlyphAtlas;
use crate::error::{TextError, TextResult};
use crate::face::{FontBackend, FontFace, FontFeature, RawGlyph, ScriptTag, ShapeDirection, ShapeRequest};
use crate::glyph::{is_private_use, GlyphFlags, GlyphKey, ShapedGlyph};
use crate::script::{breaks_between_letters, is_word_separator};

pub const DEFAULT_PT_SIZE: f32 = 24.0;
pub const DEFAULT_DPI: u32 = 96;

/// One font, tagged with the script and language it shapes.
pub struct Shaper {
    face: Option<Box<dyn FontFace>>,
    name: String,
    script: ScriptTag,
    language: String,
    features: Vec<FontFeature>,
    pt_size: FontSize,
    dpi: u32,
}

impl Shaper {
    pub fn new(face: Box<dyn FontFace>, script: ScriptTag, language: &str, name: impl Into<String>) -> Self {
        let mut shaper = Self::unopened(name.into(), script, language);
        shaper.face = Some(face);
        shaper.set_font_size(FontSize::from_pt(DEFAULT_PT_SIZE));
        shaper
    }

    /// Opens `path` through `backend`. A face that fails to open is fatal for this font: the
    /// shaper stays registered but never produces glyphs.
    pub fn open(backend: &dyn FontBackend, path: &Path, script: ScriptTag, language: &str) -> Self {
        let name = path.display().to_string();
        match backend.open_face(path) {
            Ok(face) => Self::new(face, script, language, name),
            Err(err) => {
                LogSeverity::Fatal.emit(&err.to_string());
                Self::unopened(name, script, language)
            }
        }
    }

    fn unopened(name: String, script: ScriptTag, language: &str) -> Self {
        Self {
            face: None,
            name,
            script,
            language: language.to_string(),
            features: Vec::new(),
            pt_size: FontSize(0),
            dpi: DEFAULT_DPI,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script(&self) -> ScriptTag {
        self.script
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_usable(&self) -> bool {
        self.face.is_some()
    }

    pub fn features(&self) -> &[FontFeature] {
        &self.features
    }

    pub fn set_features(&mut self, features: Vec<FontFeature>) {
        self.features = features;
    }

    pub fn add_feature(&mut self, feature: FontFeature) {
        self.features.push(feature);
    }

    pub fn font_size(&self) -> FontSize {
        self.pt_size
    }

    /// Resizes the face. Does nothing if `size` is already current.
    pub fn set_font_size(&mut self, size: FontSize) {
        if self.pt_size == size {
            return;
        }
        self.pt_size = size;
        self.apply_char_size();
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn set_dpi(&mut self, dpi: u32) {
        if self.dpi == dpi {
            return;
        }
        self.dpi = dpi;
        self.apply_char_size();
    }

    fn apply_char_size(&mut self) {
        if let Some(face) = self.face.as_deref_mut() {
            if let Err(err) = face.set_char_size(self.pt_size, self.dpi) {
                LogSeverity::Error.emit(&format!("{}: {}", self.name, err));
            }
        }
    }

    pub fn shape(&mut self, text: &str, direction: ShapeDirection) -> TextResult<Vec<RawGlyph>> {
        let face = self.face.as_deref_mut().ok_or(TextError::FaceUnavailable)?;
        face.shape(&ShapeRequest {
            text,
            direction,
            script: self.script,
            language: &self.language,
            features: &self.features,
        })
    }
}

/// Shapes text through one registered shaper, borrowing the others as substitutes.
pub struct ShapingContext<'a> {
    pub shapers: &'a mut [Shaper],
    pub atlas: &'a mut GlyphAtlas,
}

impl<'a> ShapingContext<'a> {
    pub fn new(shapers: &'a mut [Shaper], atlas: &'a mut GlyphAtlas) -> Self {
        Self { shapers, atlas }
    }

    /// Appends the glyphs for `text` shaped by `shapers[index]` and returns how many bytes
    /// were rendered.
    ///
    /// With `substitute_if_missing`, clusters this font has no glyph for are handed to the
    /// other shapers and the whole text is always accounted for. Without it, rendering stops
    /// at the first missing glyph; the count is then the rendered prefix for forward
    /// directions and the rendered suffix for backward ones.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        index: usize,
        text: &str,
        direction: ShapeDirection,
        rich_text_index: usize,
        cluster_offset: usize,
        out: &mut Vec<ShapedGlyph>,
        substitute_if_missing: bool,
    ) -> usize {
        if text.is_empty() {
            return 0;
        }
        let Some(shaper) = self.shapers.get_mut(index) else {
            return 0;
        };

        let raw = match shaper.shape(text, direction) {
            Ok(raw) => raw,
            Err(err) if substitute_if_missing => {
                debug!("{}: {}, using substitute fonts", shaper.name, err);
                return self.render_with_substitutes(index, text, direction, rich_text_index, cluster_offset, out);
            }
            Err(err) => {
                debug!("{}: {}", shaper.name, err);
                return 0;
            }
        };

        let backward = direction.is_backward();
        let len = text.len();
        let mut i = 0;

        while i < raw.len() {
            if raw[i].glyph_id != 0 {
                self.push_glyph(index, text, &raw, i, direction, rich_text_index, cluster_offset, out);
                i += 1;
                continue;
            }

            if !substitute_if_missing {
                return match (backward, i) {
                    (true, 0) => 0,
                    (true, _) => len - raw[i - 1].cluster,
                    (false, _) => raw[i].cluster,
                };
            }

            let mut unknown = 1;
            while i + unknown < raw.len() && raw[i + unknown].glyph_id == 0 {
                unknown += 1;
            }

            let (first, end) = if backward {
                let end = if i > 0 { raw[i - 1].cluster } else { len };
                (raw[i + unknown - 1].cluster, end)
            } else {
                (raw[i].cluster, raw.get(i + unknown).map_or(len, |g| g.cluster))
            };

            let Some(segment) = text.get(first..end).filter(|s| !s.is_empty()) else {
                i += unknown;
                continue;
            };

            let replaced =
                self.render_with_substitutes(index, segment, direction, rich_text_index, cluster_offset + first, out);

            if replaced >= segment.len() {
                i += unknown;
            } else if replaced == 0 {
                debug!("No font has a glyph for {:?}", segment);
                i += 1;
            } else if backward {
                let boundary = end - replaced;
                i = (i + 1..i + unknown)
                    .find(|&j| raw[j].cluster < boundary)
                    .unwrap_or(i + unknown);
            } else {
                let boundary = first + replaced;
                i = (i + 1..i + unknown)
                    .find(|&j| raw[j].cluster >= boundary)
                    .unwrap_or(i + unknown);
            }
        }

        len
    }

    /// Tries every other shaper in registration order, at the size of `shapers[index]`,
    /// until one of them produces glyphs.
    pub fn render_with_substitutes(
        &mut self,
        index: usize,
        text: &str,
        direction: ShapeDirection,
        rich_text_index: usize,
        cluster_offset: usize,
        out: &mut Vec<ShapedGlyph>,
    ) -> usize {
        let Some(pt_size) = self.shapers.get(index).map(|s| s.pt_size) else {
            return 0;
        };

        let initial_len = out.len();
        let mut written = 0;
        for other in 0..self.shapers.len() {
            if out.len() != initial_len {
                break;
            }
            if other == index {
                continue;
            }
            self.shapers[other].set_font_size(pt_size);
            written = self.render(other, text, direction, rich_text_index, cluster_offset, out, false);
        }
        written
    }

    #[allow(clippy::too_many_arguments)]
    fn push_glyph(
        &mut self,
        index: usize,
        text: &str,
        raw: &[RawGlyph],
        i: usize,
        direction: ShapeDirection,
        rich_text_index: usize,
        cluster_offset: usize,
        out: &mut Vec<ShapedGlyph>,
    ) {
        let glyph = raw[i];
        let len = text.len();
        let cluster_end = if direction.is_backward() {
            if i > 0 { raw[i - 1].cluster } else { len }
        } else {
            raw.get(i + 1).map_or(len, |g| g.cluster)
        };
        let ch = text.get(glyph.cluster..).and_then(|s| s.chars().next()).unwrap_or('\0');

        let mut flags = GlyphFlags::empty();
        flags.set(GlyphFlags::NEWLINE, ch == '\n');
        flags.set(GlyphFlags::TAB, ch == '\t');
        flags.set(GlyphFlags::WORD_BREAKER, is_word_separator(ch) || breaks_between_letters(ch));
        flags.set(GlyphFlags::RTL, direction == ShapeDirection::RightToLeft);
        flags.set(GlyphFlags::PRIVATE_AREA, is_private_use(ch as u32));

        let mut offset = Vec2::new(glyph.offset.x, -glyph.offset.y);
        if ch == ' ' || ch == '\t' {
            offset = Vec2::ZERO;
        }

        let shaper = &mut self.shapers[index];
        let key = GlyphKey::new(glyph.glyph_id, shaper.pt_size, (index + 1) as u16);
        let Some(face) = shaper.face.as_deref_mut() else {
            warn!("{}: face closed while shaping", shaper.name);
            return;
        };
        self.atlas.acquire(face, key, flags.contains(GlyphFlags::PRIVATE_AREA));

        out.push(ShapedGlyph {
            advance: Vec2::new(glyph.advance.x, -glyph.advance.y),
            offset,
            caret_pos: Vec2::ZERO,
            flags,
            rich_text_index,
            cluster_start: glyph.cluster + cluster_offset,
            cluster_length: cluster_end.saturating_sub(glyph.cluster),
            glyph: key,
        });
    }
}

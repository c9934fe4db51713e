// crates/trellis-text/src/native.rs
//! Font backend on top of `rustybuzz` for shaping and `fontdue` for rasterization.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use glam::Vec2;
use rustybuzz::ttf_parser::Tag;
use rustybuzz::{Face, Feature, Language, UnicodeBuffer};
use tracing::debug;
use trellis_core::FontSize;

use crate::error::{TextError, TextResult};
use crate::face::{FontBackend, FontFace, RasterizedGlyph, RawGlyph, ShapeDirection, ShapeRequest, SizeMetrics};

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFontBackend;

impl FontBackend for NativeFontBackend {
    fn open_face(&self, path: &Path) -> TextResult<Box<dyn FontFace>> {
        let data = fs::read(path).map_err(|e| TextError::FaceOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let face = NativeFace::from_bytes(data).map_err(|reason| TextError::FaceOpen {
            path: path.to_path_buf(),
            reason,
        })?;
        debug!("Opened font {}", path.display());
        Ok(Box::new(face))
    }
}

pub struct NativeFace {
    // Borrows from `data`; declared first so it drops first.
    face: Face<'static>,
    data: Arc<Vec<u8>>,
    font: Font,
    px: f32,
}

impl NativeFace {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, String> {
        let data = Arc::new(data);
        // SAFETY: the Arc is owned by this face and outlives the parsed `face`, and the
        // buffer is never mutated or reallocated.
        let bytes: &'static [u8] = unsafe { std::mem::transmute::<&[u8], &'static [u8]>(data.as_slice()) };
        let face = Face::from_slice(bytes, 0).ok_or_else(|| "not a font the shaper can read".to_string())?;
        let font = Font::from_bytes(data.as_slice(), FontSettings::default()).map_err(|e| e.to_string())?;
        Ok(Self {
            face,
            data,
            font,
            px: 0.0,
        })
    }

    pub fn pixel_size(&self) -> f32 {
        self.px
    }

    /// Raw font file contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn units_per_em(&self) -> u16 {
        rustybuzz::ttf_parser::Face::units_per_em(&self.face)
    }
}

fn direction(direction: ShapeDirection) -> rustybuzz::Direction {
    match direction {
        ShapeDirection::LeftToRight => rustybuzz::Direction::LeftToRight,
        ShapeDirection::RightToLeft => rustybuzz::Direction::RightToLeft,
        ShapeDirection::TopToBottom => rustybuzz::Direction::TopToBottom,
        ShapeDirection::BottomToTop => rustybuzz::Direction::BottomToTop,
    }
}

impl FontFace for NativeFace {
    fn set_char_size(&mut self, size: FontSize, dpi: u32) -> TextResult<()> {
        let px = size.as_pt() * dpi as f32 / 72.0;
        if !px.is_finite() || px <= 0.0 {
            return Err(TextError::CharSize {
                size: size.as_pt(),
                reason: format!("{} px at {} dpi", px, dpi),
            });
        }
        self.px = px;
        Ok(())
    }

    fn shape(&mut self, request: &ShapeRequest<'_>) -> TextResult<Vec<RawGlyph>> {
        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(request.text);
        buffer.set_direction(direction(request.direction));
        if let Some(script) = rustybuzz::Script::from_iso15924_tag(Tag::from_bytes(&request.script)) {
            buffer.set_script(script);
        }
        if let Ok(language) = Language::from_str(request.language) {
            buffer.set_language(language);
        }

        let features: Vec<Feature> = request
            .features
            .iter()
            .map(|f| Feature::new(Tag::from_bytes(&f.tag), f.value, ..))
            .collect();

        let output = rustybuzz::shape(&self.face, &features, buffer);
        let scale = self.px / self.face.units_per_em() as f32;

        Ok(output
            .glyph_infos()
            .iter()
            .zip(output.glyph_positions())
            .map(|(info, pos)| RawGlyph {
                glyph_id: info.glyph_id,
                cluster: info.cluster as usize,
                advance: Vec2::new(pos.x_advance as f32, pos.y_advance as f32) * scale,
                offset: Vec2::new(pos.x_offset as f32, pos.y_offset as f32) * scale,
            })
            .collect())
    }

    fn rasterize(&mut self, glyph_id: u32) -> TextResult<RasterizedGlyph> {
        let index = u16::try_from(glyph_id).map_err(|_| TextError::GlyphRaster {
            glyph: glyph_id,
            reason: "glyph index exceeds 16 bits".to_string(),
        })?;
        let (metrics, bitmap) = self.font.rasterize_indexed(index, self.px);

        let dimension = |value: usize| {
            u16::try_from(value).map_err(|_| TextError::GlyphRaster {
                glyph: glyph_id,
                reason: format!("bitmap dimension {} too large", value),
            })
        };

        Ok(RasterizedGlyph {
            width: dimension(metrics.width)?,
            height: dimension(metrics.height)?,
            bearing_x: metrics.xmin,
            bearing_y: metrics.ymin + metrics.height as i32,
            bitmap,
        })
    }

    fn size_metrics(&self) -> SizeMetrics {
        match self.font.horizontal_line_metrics(self.px) {
            Some(lines) => SizeMetrics {
                ascender: lines.ascent,
                descender: lines.descent,
                line_height: lines.new_line_size,
            },
            None => SizeMetrics {
                ascender: self.px,
                descender: 0.0,
                line_height: self.px,
            },
        }
    }
}

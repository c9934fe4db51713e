// tests/shaping_scenarios.rs
use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use trellis_core::{FontSize, HorizReadingDir, RichText, TextHorizAlignment, VertReadingDir};
use trellis_layout::{CellProps, Layout, LayoutBox, LayoutLine};
use trellis_text::{
    AtlasUploader, FontFace, GlyphAtlas, RasterizedGlyph, RawGlyph, ShapeRequest, ShapedText, ShaperManager,
    SizeMetrics, TextResult,
};

/// Covers a fixed set of characters. The glyph id is the scalar value, every glyph is
/// `advance` pixels wide and its bitmap size depends on the id.
struct CoverageFace {
    covered: fn(char) -> bool,
    advance: f32,
    px: f32,
}

impl CoverageFace {
    fn boxed(covered: fn(char) -> bool, advance: f32) -> Box<dyn FontFace> {
        Box::new(Self {
            covered,
            advance,
            px: 0.0,
        })
    }
}

impl FontFace for CoverageFace {
    fn set_char_size(&mut self, size: FontSize, dpi: u32) -> TextResult<()> {
        self.px = size.as_pt() * dpi as f32 / 72.0;
        Ok(())
    }

    fn shape(&mut self, request: &ShapeRequest<'_>) -> TextResult<Vec<RawGlyph>> {
        let mut glyphs: Vec<RawGlyph> = request
            .text
            .char_indices()
            .map(|(cluster, ch)| RawGlyph {
                glyph_id: if (self.covered)(ch) { ch as u32 } else { 0 },
                cluster,
                advance: Vec2::new(self.advance, 0.0),
                offset: Vec2::ZERO,
            })
            .collect();
        if request.direction.is_backward() {
            glyphs.reverse();
        }
        Ok(glyphs)
    }

    fn rasterize(&mut self, glyph_id: u32) -> TextResult<RasterizedGlyph> {
        let width = (glyph_id % 7 + 1) as u16;
        let height = (self.px as u16).clamp(1, 8);
        Ok(RasterizedGlyph {
            width,
            height,
            bearing_x: 0,
            bearing_y: height as i32,
            bitmap: vec![0xAA; width as usize * height as usize],
        })
    }

    fn size_metrics(&self) -> SizeMetrics {
        SizeMetrics {
            ascender: self.px * 0.8,
            descender: -self.px * 0.2,
            line_height: self.px * 1.25,
        }
    }
}

#[derive(Default)]
struct MirrorBuffer {
    bytes: Vec<u8>,
    reallocations: u32,
}

impl AtlasUploader for MirrorBuffer {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn reallocate(&mut self, capacity: usize) {
        self.bytes = vec![0; capacity];
        self.reallocations += 1;
    }

    fn upload(&mut self, offset: usize, bytes: &[u8]) {
        self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

fn render(manager: &mut ShaperManager, text: &str, dir: HorizReadingDir) -> (TextHorizAlignment, ShapedText) {
    let mut rich = RichText::covering(text).with_reading_dir(dir);
    let mut out = ShapedText::new();
    let alignment = manager.render_string(text, &mut rich, 0, VertReadingDir::Disabled, &mut out);
    (alignment, out)
}

fn assert_atlas_consistent(atlas: &GlyphAtlas) {
    let mut ranges: Vec<_> = atlas
        .glyphs()
        .filter(|g| g.size_bytes() > 0)
        .map(|g| g.byte_range())
        .collect();
    ranges.sort_by_key(|r| r.start);
    for pair in ranges.windows(2) {
        assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
    assert!(ranges.iter().all(|r| r.start >= 1 && r.end <= atlas.frontier()));
    for free in atlas.free_list().ranges() {
        assert!(ranges.iter().all(|r| r.end <= free.offset || r.start >= free.end()));
    }
    assert_eq!(atlas.bytes()[0], 0xFF);
}

#[test]
fn test_missing_letter_comes_from_fallback_font() {
    let mut manager = ShaperManager::new();
    manager.add_shaper_with_face(CoverageFace::boxed(|c| c == 'a' || c == 'c', 10.0), *b"Latn", "en", "primary");
    let fallback = manager.add_shaper_with_face(CoverageFace::boxed(|c| c == 'b', 12.0), *b"Latn", "en", "fallback");

    let (alignment, out) = render(&mut manager, "abc", HorizReadingDir::Default);

    assert_eq!(alignment, TextHorizAlignment::Left);
    assert_eq!(out.glyphs.len(), 3);
    assert_eq!(out.glyphs[1].glyph.font, fallback);
    assert_eq!(out.glyphs[1].advance.x, 12.0);
    assert_eq!(out.glyphs[0].glyph.font, 1);
    assert_eq!(out.glyphs[2].glyph.font, 1);
    // Fallback glyph is rendered at the caller's size
    assert_eq!(out.glyphs[1].glyph.pt_size, RichText::default().pt_size);
    assert!(manager.atlas().glyph(&out.glyphs[1].glyph).is_some());
}

#[test]
fn test_bidi_paragraph_reports_mixed_alignment() {
    let mut manager = ShaperManager::new();
    manager.add_shaper_with_face(CoverageFace::boxed(|_| true, 8.0), *b"Latn", "en", "any");

    let text = "one שתיים";
    let (alignment, out) = render(&mut manager, text, HorizReadingDir::AutoLTR);
    assert_eq!(alignment, TextHorizAlignment::Mixed);

    let rtl: Vec<usize> = out.glyphs.iter().filter(|g| g.is_rtl()).map(|g| g.cluster_start).collect();
    assert_eq!(rtl.len(), 5);
    assert!(rtl.windows(2).all(|w| w[0] > w[1]));
    assert!(out.glyphs[..4].iter().all(|g| !g.is_rtl()));

    let (alignment, _) = render(&mut manager, "שתיים", HorizReadingDir::AutoLTR);
    assert_eq!(alignment, TextHorizAlignment::Right);
}

#[test]
fn test_logographic_text_breaks_anywhere() {
    let mut manager = ShaperManager::new();
    manager.add_shaper_with_face(CoverageFace::boxed(|_| true, 16.0), *b"Hani", "zh", "cjk");

    let (_, out) = render(&mut manager, "你好世界", HorizReadingDir::Default);
    assert_eq!(out.glyphs.len(), 4);
    assert!(out.glyphs.iter().all(|g| g.is_word_breaker()));

    let (_, out) = render(&mut manager, "hello", HorizReadingDir::Default);
    assert!(out.glyphs.iter().all(|g| !g.is_word_breaker()));
}

#[test]
fn test_shaped_words_drive_line_layout() {
    let mut manager = ShaperManager::new();
    manager.add_shaper_with_face(CoverageFace::boxed(|_| true, 10.0), *b"Latn", "en", "any");

    let text = "ab cdef g";
    let mut shaped = ShapedText::new();
    let mut line = LayoutLine::horizontal();
    let mut cells = Vec::new();

    for (index, (offset, len)) in [(0, 2), (3, 4), (8, 1)].into_iter().enumerate() {
        let mut rich = RichText::covering(text).with_range(offset, len);
        manager.render_string(text, &mut rich, index, VertReadingDir::Disabled, &mut shaped);
        let width: f32 = shaped.glyphs[rich.glyph_start..rich.glyph_end]
            .iter()
            .map(|g| g.advance.x)
            .sum();

        let cell = LayoutBox::new(Vec2::new(width, 20.0))
            .with_props(CellProps::new().with_margin(Vec2::new(4.0, 0.0)))
            .shared();
        line.add_cell(cell.clone());
        cells.push(cell);
    }
    line.layout();

    let layout: Vec<(f32, f32)> = cells
        .iter()
        .map(|c: &Rc<RefCell<LayoutBox>>| (c.borrow().offset.x, c.borrow().size.x))
        .collect();
    // Full margins at the edges, two half margins between words
    assert_eq!(layout, vec![(4.0, 20.0), (28.0, 40.0), (72.0, 10.0)]);
    assert_eq!(line.base.current_size, Vec2::new(86.0, 20.0));
    assert_eq!(shaped.glyphs.iter().map(|g| g.rich_text_index).max(), Some(2));
}

#[test]
fn test_atlas_survives_churn_and_mirrors_to_gpu() {
    let mut manager = ShaperManager::new().with_atlas(GlyphAtlas::with_capacity(64));
    manager.add_shaper_with_face(CoverageFace::boxed(|_| true, 8.0), *b"Latn", "en", "any");
    let mut gpu = MirrorBuffer::default();

    let words = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta"];
    let mut live: Vec<ShapedText> = Vec::new();

    for (round, word) in words.iter().enumerate() {
        let mut rich = RichText::covering(word).with_pt_size(FontSize::from_pt(4.0 + round as f32));
        let mut out = ShapedText::new();
        manager.render_string(word, &mut rich, 0, VertReadingDir::Disabled, &mut out);
        live.push(out);

        // Keep only the two most recent labels alive
        if live.len() > 2 {
            let mut oldest = live.remove(0);
            manager.release_glyphs(&mut oldest);
        }
        manager.update_gpu_buffers(&mut gpu);
        assert_atlas_consistent(manager.atlas());
    }

    assert_eq!(gpu.capacity(), manager.atlas().capacity());
    let frontier = manager.atlas().frontier();
    assert_eq!(&gpu.bytes[..frontier], &manager.atlas().bytes()[..frontier]);

    for shaped in &live {
        for glyph in &shaped.glyphs {
            assert!(manager.atlas().glyph(&glyph.glyph).map_or(false, |g| g.ref_count > 0));
        }
    }

    for mut shaped in live {
        manager.release_glyphs(&mut shaped);
    }
    manager.atlas_mut().flush_released_glyphs();
    assert_eq!(manager.atlas().live_glyphs(), 0);
    assert_eq!(manager.atlas().frontier(), 1);
    assert!(manager.atlas().free_list().is_empty());
}

// crates/trellis-text/src/atlas.rs
use std::collections::BTreeMap;
use std::ops::Range;

use glam::Vec2;
use tracing::{debug, trace, warn};

use crate::face::{AtlasUploader, FontFace, RasterizedGlyph};
use crate::free_list::FreeList;
use crate::glyph::{CachedGlyph, GlyphKey};

pub const DEFAULT_ATLAS_CAPACITY: usize = 64 * 1024;

/// Byte 0 is a solid texel used for untextured quads. Nothing is ever allocated there.
const RESERVED_BYTES: usize = 1;
const RESERVED_VALUE: u8 = 0xFF;

/// Reference-counted cache of rasterized glyphs packed into one growable byte buffer.
pub struct GlyphAtlas {
    buffer: Vec<u8>,
    frontier: usize,
    free_list: FreeList,
    glyphs: BTreeMap<GlyphKey, CachedGlyph>,
    dirty: Vec<Range<usize>>,
}

impl GlyphAtlas {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ATLAS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = vec![0u8; capacity.max(RESERVED_BYTES)];
        buffer[0] = RESERVED_VALUE;
        Self {
            buffer,
            frontier: RESERVED_BYTES,
            free_list: FreeList::new(),
            glyphs: BTreeMap::new(),
            dirty: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn frontier(&self) -> usize {
        self.frontier
    }

    pub fn free_bytes(&self) -> usize {
        self.free_list.total()
    }

    pub fn free_list(&self) -> &FreeList {
        &self.free_list
    }

    pub fn live_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn dirty_ranges(&self) -> &[Range<usize>] {
        &self.dirty
    }

    pub fn glyph(&self, key: &GlyphKey) -> Option<&CachedGlyph> {
        self.glyphs.get(key)
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &CachedGlyph> {
        self.glyphs.values()
    }

    pub fn bitmap(&self, key: &GlyphKey) -> Option<&[u8]> {
        self.glyphs
            .get(key)
            .and_then(|glyph| self.buffer.get(glyph.byte_range()))
    }

    /// Returns the cached glyph for `key`, rasterizing it through `face` on a miss, and takes
    /// a reference to it.
    pub fn acquire(&mut self, face: &mut dyn FontFace, key: GlyphKey, private_area: bool) -> GlyphKey {
        if !self.glyphs.contains_key(&key) {
            self.create_glyph(face, key, private_area);
        }
        if let Some(glyph) = self.glyphs.get_mut(&key) {
            glyph.ref_count += 1;
        }
        key
    }

    pub fn add_ref(&mut self, key: &GlyphKey) {
        match self.glyphs.get_mut(key) {
            Some(glyph) => glyph.ref_count += 1,
            None => warn!("add_ref on glyph {:?} that is not cached", key),
        }
    }

    /// Drops a reference. Glyphs at zero stay cached until space is needed or
    /// [`GlyphAtlas::flush_released_glyphs`] runs.
    pub fn release(&mut self, key: &GlyphKey) {
        match self.glyphs.get_mut(key) {
            Some(glyph) if glyph.ref_count > 0 => glyph.ref_count -= 1,
            Some(_) => warn!("release on glyph {:?} with no references", key),
            None => warn!("release on glyph {:?} that is not cached", key),
        }
    }

    /// Frees every unreferenced glyph.
    pub fn flush_released_glyphs(&mut self) {
        let released: Vec<GlyphKey> = self
            .glyphs
            .values()
            .filter(|glyph| glyph.ref_count == 0)
            .map(|glyph| glyph.key)
            .collect();

        if !released.is_empty() {
            debug!("Flushing {} released glyphs", released.len());
        }
        for key in released {
            self.destroy_glyph(&key);
        }
    }

    /// Sends pending changes to the GPU mirror. A capacity mismatch triggers a full upload.
    pub fn update_gpu_buffers(&mut self, uploader: &mut dyn AtlasUploader) {
        let capacity = self.capacity();
        if uploader.capacity() != capacity && capacity > 0 {
            uploader.reallocate(capacity);
            self.buffer[0] = RESERVED_VALUE;
            uploader.upload(0, &self.buffer[..self.frontier]);
        } else {
            for range in &self.dirty {
                if let Some(bytes) = self.buffer.get(range.clone()) {
                    uploader.upload(range.start, bytes);
                }
            }
        }
        self.dirty.clear();
    }

    fn create_glyph(&mut self, face: &mut dyn FontFace, key: GlyphKey, private_area: bool) {
        let raster = match face.rasterize(key.codepoint) {
            Ok(raster) => raster,
            Err(err) => {
                warn!("{}", err);
                RasterizedGlyph::default()
            }
        };
        let metrics = face.size_metrics();

        let mut glyph = CachedGlyph {
            key,
            offset: 0,
            width: raster.width,
            height: raster.height,
            bearing: Vec2::new(raster.bearing_x as f32, raster.bearing_y as f32),
            newline_size: metrics.line_height,
            region_up: metrics.region_up(),
            private_area,
            ref_count: 0,
        };

        let size = glyph.size_bytes();
        if size > 0 {
            glyph.offset = self.allocate(size);
            let target = &mut self.buffer[glyph.offset..glyph.offset + size];
            let copied = raster.bitmap.len().min(size);
            target[..copied].copy_from_slice(&raster.bitmap[..copied]);
            target[copied..].fill(0);
            self.dirty.push(glyph.byte_range());
        }

        trace!("Cached glyph {:?} at {} ({} bytes)", key, glyph.offset, size);
        self.glyphs.insert(key, glyph);
    }

    fn destroy_glyph(&mut self, key: &GlyphKey) {
        let Some(glyph) = self.glyphs.remove(key) else {
            return;
        };
        let size = glyph.size_bytes();
        if size == 0 {
            return;
        }

        if glyph.offset + size == self.frontier {
            self.frontier -= size;
            while let Some(range) = self.free_list.pop_ending_at(self.frontier) {
                self.frontier = range.offset;
            }
        } else {
            self.free_list.insert(glyph.offset, size);
        }
    }

    /// Smallest unreferenced glyph whose bytes can hold `size`.
    fn reclaim_candidate(&self, size: usize) -> Option<GlyphKey> {
        self.glyphs
            .values()
            .filter(|glyph| glyph.ref_count == 0 && glyph.size_bytes() >= size)
            .min_by_key(|glyph| glyph.size_bytes())
            .map(|glyph| glyph.key)
    }

    fn allocate(&mut self, size: usize) -> usize {
        loop {
            if let Some(offset) = self.free_list.take_best_fit(size) {
                return offset;
            }
            if self.frontier + size <= self.capacity() {
                break;
            }

            // Evicting one glyph that is large enough on its own is cheaper than freeing all
            // of them; only when none exists are released neighbours merged together.
            if let Some(victim) = self.reclaim_candidate(size) {
                debug!("Atlas full, evicting glyph {:?}", victim);
                self.destroy_glyph(&victim);
                continue;
            }
            if self.glyphs.values().any(|glyph| glyph.ref_count == 0 && glyph.size_bytes() > 0) {
                self.flush_released_glyphs();
                continue;
            }

            self.grow(size);
            break;
        }

        let offset = self.frontier;
        self.frontier += size;
        offset
    }

    fn grow(&mut self, size: usize) {
        let capacity = self.capacity();
        let new_capacity = (self.frontier + size).max(capacity + capacity / 2 + 1);
        debug!("Growing glyph atlas from {} to {} bytes", capacity, new_capacity);
        self.buffer.resize(new_capacity, 0);
    }
}

impl Default for GlyphAtlas {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TextResult;
    use crate::face::{RawGlyph, ShapeRequest, SizeMetrics};
    use trellis_core::FontSize;

    /// Rasterizes glyph `n` as an n x 1 bitmap filled with `n`.
    struct StripFace;

    impl StripFace {
        fn new() -> Self {
            StripFace
        }
    }

    impl FontFace for StripFace {
        fn set_char_size(&mut self, _size: FontSize, _dpi: u32) -> TextResult<()> {
            Ok(())
        }

        fn shape(&mut self, _request: &ShapeRequest<'_>) -> TextResult<Vec<RawGlyph>> {
            Ok(Vec::new())
        }

        fn rasterize(&mut self, glyph_id: u32) -> TextResult<RasterizedGlyph> {
            Ok(RasterizedGlyph {
                width: glyph_id as u16,
                height: 1,
                bearing_x: 1,
                bearing_y: 2,
                bitmap: vec![glyph_id as u8; glyph_id as usize],
            })
        }

        fn size_metrics(&self) -> SizeMetrics {
            SizeMetrics {
                ascender: 12.0,
                descender: -4.0,
                line_height: 20.0,
            }
        }
    }

    #[derive(Default)]
    struct RecordingUploader {
        capacity: usize,
        uploads: Vec<(usize, usize)>,
        reallocations: u32,
    }

    impl AtlasUploader for RecordingUploader {
        fn capacity(&self) -> usize {
            self.capacity
        }
        fn reallocate(&mut self, capacity: usize) {
            self.capacity = capacity;
            self.reallocations += 1;
        }
        fn upload(&mut self, offset: usize, bytes: &[u8]) {
            self.uploads.push((offset, bytes.len()));
        }
    }

    fn key(codepoint: u32) -> GlyphKey {
        GlyphKey::new(codepoint, FontSize::from_pt(12.0), 1)
    }

    fn assert_no_overlap(atlas: &GlyphAtlas) {
        let mut ranges: Vec<_> = atlas
            .glyphs()
            .filter(|g| g.size_bytes() > 0)
            .map(|g| g.byte_range())
            .collect();
        ranges.sort_by_key(|r| r.start);
        for pair in ranges.windows(2) {
            assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
        for range in &ranges {
            assert!(range.start >= 1);
        }
    }

    #[test]
    fn test_acquire_caches_and_counts() {
        let mut atlas = GlyphAtlas::with_capacity(64);
        let mut face = StripFace::new();

        let a = atlas.acquire(&mut face, key(4), false);
        atlas.acquire(&mut face, key(4), false);

        let glyph = atlas.glyph(&a).unwrap();
        assert_eq!(glyph.offset, 1);
        assert_eq!(glyph.ref_count, 2);
        assert_eq!(glyph.bearing, Vec2::new(1.0, 2.0));
        assert_eq!(glyph.newline_size, 20.0);
        assert_eq!(glyph.region_up, 0.75);
        assert_eq!(atlas.bitmap(&a).unwrap(), &[4, 4, 4, 4]);
        assert_eq!(atlas.frontier(), 5);
        assert_eq!(atlas.bytes()[0], 0xFF);
    }

    #[test]
    fn test_release_keeps_glyph_until_flush() {
        let mut atlas = GlyphAtlas::with_capacity(64);
        let mut face = StripFace::new();

        for _ in 0..5 {
            atlas.acquire(&mut face, key(6), false);
            atlas.release(&key(6));
        }
        assert_eq!(atlas.glyph(&key(6)).unwrap().ref_count, 0);
        assert_eq!(atlas.live_glyphs(), 1);

        atlas.flush_released_glyphs();
        assert_eq!(atlas.live_glyphs(), 0);
        assert_eq!(atlas.frontier(), 1);
    }

    #[test]
    fn test_flush_reclaims_exact_range() {
        let mut atlas = GlyphAtlas::with_capacity(64);
        let mut face = StripFace::new();

        atlas.acquire(&mut face, key(3), false);
        atlas.acquire(&mut face, key(5), false);
        atlas.acquire(&mut face, key(2), false);
        atlas.release(&key(5));
        atlas.flush_released_glyphs();

        // Glyph 5 lived at 4..9, between two live glyphs
        assert_eq!(atlas.free_list().ranges().len(), 1);
        assert_eq!(atlas.free_list().ranges()[0].offset, 4);
        assert_eq!(atlas.free_bytes(), 5);

        // A smaller glyph is placed in the hole
        atlas.acquire(&mut face, key(4), false);
        assert_eq!(atlas.glyph(&key(4)).unwrap().offset, 4);
        assert_eq!(atlas.free_bytes(), 1);
        assert_no_overlap(&atlas);
    }

    #[test]
    fn test_lifo_release_retracts_frontier() {
        let mut atlas = GlyphAtlas::with_capacity(64);
        let mut face = StripFace::new();

        atlas.acquire(&mut face, key(3), false);
        atlas.acquire(&mut face, key(4), false);
        atlas.acquire(&mut face, key(5), false);
        atlas.release(&key(4));
        atlas.release(&key(5));
        atlas.flush_released_glyphs();

        assert_eq!(atlas.frontier(), 4);
        assert!(atlas.free_list().is_empty());
    }

    #[test]
    fn test_full_atlas_evicts_smallest_fitting_unreferenced_glyph() {
        let mut atlas = GlyphAtlas::with_capacity(21);
        let mut face = StripFace::new();

        atlas.acquire(&mut face, key(8), false);
        atlas.acquire(&mut face, key(6), false);
        atlas.acquire(&mut face, key(5), false);
        assert_eq!(atlas.frontier(), 20);
        atlas.release(&key(8));
        atlas.release(&key(6));

        atlas.acquire(&mut face, key(4), false);

        // 6 is the smallest released glyph that fits 4 bytes; 8 survives
        assert!(atlas.glyph(&key(6)).is_none());
        assert!(atlas.glyph(&key(8)).is_some());
        assert_eq!(atlas.glyph(&key(4)).unwrap().offset, 9);
        assert_eq!(atlas.capacity(), 21);
        assert_no_overlap(&atlas);
    }

    #[test]
    fn test_merges_adjacent_released_glyphs_before_growing() {
        let mut atlas = GlyphAtlas::with_capacity(16);
        let mut face = StripFace::new();

        atlas.acquire(&mut face, key(4), false);
        atlas.acquire(&mut face, key(3), false);
        atlas.acquire(&mut face, key(7), false);
        assert_eq!(atlas.frontier(), 15);
        atlas.release(&key(4));
        atlas.release(&key(3));

        // Neither 4 nor 3 bytes fit 6, together they do
        atlas.acquire(&mut face, key(6), false);

        assert_eq!(atlas.glyph(&key(6)).unwrap().offset, 1);
        assert_eq!(atlas.capacity(), 16);
        assert_eq!(atlas.free_bytes(), 1);
        assert_no_overlap(&atlas);
    }

    #[test]
    fn test_grows_when_nothing_can_be_reclaimed() {
        let mut atlas = GlyphAtlas::with_capacity(10);
        let mut face = StripFace::new();

        atlas.acquire(&mut face, key(8), false);
        atlas.acquire(&mut face, key(4), false);

        // max(9 + 4, 10 + 5 + 1)
        assert_eq!(atlas.capacity(), 16);
        assert_eq!(atlas.glyph(&key(4)).unwrap().offset, 9);

        atlas.acquire(&mut face, key(20), false);
        assert_eq!(atlas.capacity(), 33);
        assert_no_overlap(&atlas);
    }

    #[test]
    fn test_private_area_takes_no_space() {
        let mut atlas = GlyphAtlas::with_capacity(16);
        let mut face = StripFace::new();

        let icon = atlas.acquire(&mut face, key(9), true);
        let glyph = atlas.glyph(&icon).unwrap();
        assert_eq!(glyph.size_bytes(), 0);
        assert_eq!(glyph.width, 9);
        assert_eq!(atlas.frontier(), 1);
    }

    #[test]
    fn test_rasterization_failure_degrades_to_empty_glyph() {
        struct BrokenFace;
        impl FontFace for BrokenFace {
            fn set_char_size(&mut self, _size: FontSize, _dpi: u32) -> TextResult<()> {
                Ok(())
            }
            fn shape(&mut self, _request: &ShapeRequest<'_>) -> TextResult<Vec<RawGlyph>> {
                Ok(Vec::new())
            }
            fn rasterize(&mut self, glyph_id: u32) -> TextResult<RasterizedGlyph> {
                Err(crate::error::TextError::GlyphRaster {
                    glyph: glyph_id,
                    reason: "corrupt outline".to_string(),
                })
            }
            fn size_metrics(&self) -> SizeMetrics {
                SizeMetrics {
                    ascender: 0.0,
                    descender: 0.0,
                    line_height: 0.0,
                }
            }
        }

        let mut atlas = GlyphAtlas::with_capacity(16);
        let glyph = atlas.acquire(&mut BrokenFace, key(7), false);
        assert_eq!(atlas.glyph(&glyph).unwrap().size_bytes(), 0);
        assert_eq!(atlas.glyph(&glyph).unwrap().region_up, 1.0);
    }

    #[test]
    fn test_gpu_upload_batches_dirty_ranges() {
        let mut atlas = GlyphAtlas::with_capacity(32);
        let mut face = StripFace::new();
        let mut uploader = RecordingUploader::default();

        atlas.acquire(&mut face, key(3), false);
        atlas.update_gpu_buffers(&mut uploader);
        // First upload reallocates and sends everything up to the frontier
        assert_eq!(uploader.reallocations, 1);
        assert_eq!(uploader.uploads, vec![(0, 4)]);

        atlas.acquire(&mut face, key(2), false);
        atlas.acquire(&mut face, key(5), false);
        assert_eq!(atlas.dirty_ranges().len(), 2);
        atlas.update_gpu_buffers(&mut uploader);
        assert_eq!(uploader.uploads[1..], [(4, 2), (6, 5)]);
        assert!(atlas.dirty_ranges().is_empty());
    }
}

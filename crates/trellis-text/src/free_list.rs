// crates/trellis-text/src/free_list.rs
//! Free byte ranges of the glyph atlas, sorted by offset and always coalesced.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeRange {
    pub offset: usize,
    pub size: usize,
}

impl FreeRange {
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

#[derive(Debug, Clone, Default)]
pub struct FreeList {
    ranges: Vec<FreeRange>,
}

impl FreeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[FreeRange] {
        &self.ranges
    }

    pub fn total(&self) -> usize {
        self.ranges.iter().map(|r| r.size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Adds a range, merging it with byte-contiguous neighbours.
    pub fn insert(&mut self, offset: usize, size: usize) {
        if size == 0 {
            return;
        }

        let index = self.ranges.partition_point(|r| r.offset < offset);
        let merges_prev = index > 0 && self.ranges[index - 1].end() == offset;
        let merges_next = index < self.ranges.len() && self.ranges[index].offset == offset + size;

        match (merges_prev, merges_next) {
            (true, true) => {
                let next = self.ranges.remove(index);
                self.ranges[index - 1].size += size + next.size;
            }
            (true, false) => self.ranges[index - 1].size += size,
            (false, true) => {
                let next = &mut self.ranges[index];
                next.offset = offset;
                next.size += size;
            }
            (false, false) => self.ranges.insert(index, FreeRange { offset, size }),
        }
    }

    /// Carves `size` bytes out of the smallest range that can hold them.
    pub fn take_best_fit(&mut self, size: usize) -> Option<usize> {
        let (index, _) = self
            .ranges
            .iter()
            .enumerate()
            .filter(|(_, r)| r.size >= size)
            .min_by_key(|(_, r)| r.size)?;

        let range = &mut self.ranges[index];
        let offset = range.offset;
        range.offset += size;
        range.size -= size;
        if range.size == 0 {
            self.ranges.remove(index);
        }
        Some(offset)
    }

    /// Removes the last range if it ends exactly at `end`.
    pub fn pop_ending_at(&mut self, end: usize) -> Option<FreeRange> {
        match self.ranges.last() {
            Some(last) if last.end() == end => self.ranges.pop(),
            _ => None,
        }
    }
}

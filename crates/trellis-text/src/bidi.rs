// crates/trellis-text/src/bidi.rs
//! Splits text into direction-homogeneous runs in visual order.

use std::ops::Range;

use trellis_core::HorizReadingDir;
use unicode_bidi::{bidi_class, BidiClass, BidiInfo, Level};

use crate::error::{TextError, TextResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualRun {
    /// Byte range into the full text.
    pub range: Range<usize>,
    pub rtl: bool,
}

/// Runs over `text[range]`, paragraph by paragraph, each paragraph's runs in visual order.
///
/// `hint` must already be resolved; `Default` is treated like `AutoLTR`.
pub fn analyze(text: &str, range: Range<usize>, hint: HorizReadingDir) -> TextResult<Vec<VisualRun>> {
    let slice = text.get(range.clone()).ok_or_else(|| {
        TextError::Bidi(format!(
            "range {}..{} is not a valid slice of {} bytes",
            range.start,
            range.end,
            text.len()
        ))
    })?;
    if slice.is_empty() {
        return Ok(Vec::new());
    }

    let level = paragraph_level(slice, hint);
    let info = BidiInfo::new(slice, Some(level));

    let mut runs = Vec::new();
    for paragraph in &info.paragraphs {
        let (levels, level_runs) = info.visual_runs(paragraph, paragraph.range.clone());
        for run in level_runs {
            let rtl = levels[run.start].is_rtl();
            runs.push(VisualRun {
                range: run.start + range.start..run.end + range.start,
                rtl,
            });
        }
    }
    Ok(runs)
}

fn paragraph_level(text: &str, hint: HorizReadingDir) -> Level {
    match hint {
        HorizReadingDir::LTR => Level::ltr(),
        HorizReadingDir::RTL => Level::rtl(),
        HorizReadingDir::Default | HorizReadingDir::AutoLTR | HorizReadingDir::AutoRTL => {
            match first_strong_is_rtl(text) {
                Some(true) => Level::rtl(),
                Some(false) => Level::ltr(),
                None if hint.prefers_ltr() => Level::ltr(),
                None => Level::rtl(),
            }
        }
    }
}

fn first_strong_is_rtl(text: &str) -> Option<bool> {
    text.chars().find_map(|ch| match bidi_class(ch) {
        BidiClass::L => Some(false),
        BidiClass::R | BidiClass::AL => Some(true),
        _ => None,
    })
}

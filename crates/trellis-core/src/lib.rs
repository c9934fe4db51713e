// crates/trellis-core/src/lib.rs
pub mod grid;
pub mod log;
pub mod text;

pub use grid::*;
pub use log::*;
pub use text::*;

pub use glam::Vec2;

#[derive(Debug, thiserror::Error)]
pub enum TrellisError {
    #[error("Invalid grid location: {0}")]
    InvalidGridLocation(String),

    #[error("Invalid reading direction: {0}")]
    InvalidReadingDirection(String),

    #[error("Invalid font size: {0}")]
    InvalidFontSize(f32),

    #[error("Text range {offset}..{end} is outside a string of {len} bytes")]
    TextRangeOutOfBounds { offset: usize, end: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, TrellisError>;

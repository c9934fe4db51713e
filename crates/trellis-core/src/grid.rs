// crates/trellis-core/src/grid.rs
use std::fmt;
use std::str::FromStr;

use crate::{Result, TrellisError};

/// Nine-way placement of a cell inside the slot a layout reserved for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GridLocation {
    #[default]
    TopLeft,
    Top,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    Bottom,
    BottomRight,
}

/// Per-axis interpretation of a [`GridLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisAnchor {
    Start,
    Center,
    End,
}

impl GridLocation {
    pub const ALL: [GridLocation; 9] = [
        GridLocation::TopLeft,
        GridLocation::Top,
        GridLocation::TopRight,
        GridLocation::CenterLeft,
        GridLocation::Center,
        GridLocation::CenterRight,
        GridLocation::BottomLeft,
        GridLocation::Bottom,
        GridLocation::BottomRight,
    ];

    pub fn from_index(index: u8) -> Result<Self> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or_else(|| TrellisError::InvalidGridLocation(index.to_string()))
    }

    /// Anchor along the horizontal axis (Left / center / Right column).
    pub fn horizontal(self) -> AxisAnchor {
        match self {
            GridLocation::TopLeft | GridLocation::CenterLeft | GridLocation::BottomLeft => {
                AxisAnchor::Start
            }
            GridLocation::Top | GridLocation::Center | GridLocation::Bottom => AxisAnchor::Center,
            GridLocation::TopRight | GridLocation::CenterRight | GridLocation::BottomRight => {
                AxisAnchor::End
            }
        }
    }

    /// Anchor along the vertical axis (Top / center / Bottom row).
    pub fn vertical(self) -> AxisAnchor {
        match self {
            GridLocation::TopLeft | GridLocation::Top | GridLocation::TopRight => AxisAnchor::Start,
            GridLocation::CenterLeft | GridLocation::Center | GridLocation::CenterRight => {
                AxisAnchor::Center
            }
            GridLocation::BottomLeft | GridLocation::Bottom | GridLocation::BottomRight => {
                AxisAnchor::End
            }
        }
    }

    /// Anchor for axis 0 (x) or 1 (y).
    pub fn anchor(self, axis: usize) -> AxisAnchor {
        if axis == 0 {
            self.horizontal()
        } else {
            self.vertical()
        }
    }

    /// Left and Right swapped, for right-to-left user interfaces.
    pub fn mirrored(self) -> Self {
        match self {
            GridLocation::TopLeft => GridLocation::TopRight,
            GridLocation::TopRight => GridLocation::TopLeft,
            GridLocation::CenterLeft => GridLocation::CenterRight,
            GridLocation::CenterRight => GridLocation::CenterLeft,
            GridLocation::BottomLeft => GridLocation::BottomRight,
            GridLocation::BottomRight => GridLocation::BottomLeft,
            other => other,
        }
    }

    pub fn swapped_if(self, swap: bool) -> Self {
        if swap {
            self.mirrored()
        } else {
            self
        }
    }
}

impl fmt::Display for GridLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GridLocation::TopLeft => "top-left",
            GridLocation::Top => "top",
            GridLocation::TopRight => "top-right",
            GridLocation::CenterLeft => "center-left",
            GridLocation::Center => "center",
            GridLocation::CenterRight => "center-right",
            GridLocation::BottomLeft => "bottom-left",
            GridLocation::Bottom => "bottom",
            GridLocation::BottomRight => "bottom-right",
        };
        f.write_str(name)
    }
}

impl FromStr for GridLocation {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|loc| loc.to_string() == normalized)
            .ok_or_else(|| TrellisError::InvalidGridLocation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_anchors() {
        assert_eq!(GridLocation::BottomRight.horizontal(), AxisAnchor::End);
        assert_eq!(GridLocation::BottomRight.vertical(), AxisAnchor::End);
        assert_eq!(GridLocation::CenterLeft.anchor(0), AxisAnchor::Start);
        assert_eq!(GridLocation::CenterLeft.anchor(1), AxisAnchor::Center);
        assert_eq!(GridLocation::Top.anchor(0), AxisAnchor::Center);
    }

    #[test]
    fn test_mirroring_only_touches_columns() {
        assert_eq!(GridLocation::TopLeft.mirrored(), GridLocation::TopRight);
        assert_eq!(GridLocation::CenterRight.mirrored(), GridLocation::CenterLeft);
        assert_eq!(GridLocation::Bottom.mirrored(), GridLocation::Bottom);
        assert_eq!(GridLocation::Center.swapped_if(true), GridLocation::Center);
        assert_eq!(GridLocation::TopLeft.swapped_if(false), GridLocation::TopLeft);
    }

    #[test]
    fn test_parse_grid_location() {
        assert_eq!("bottom_left".parse::<GridLocation>().unwrap(), GridLocation::BottomLeft);
        assert_eq!("Center".parse::<GridLocation>().unwrap(), GridLocation::Center);
        assert!("middle".parse::<GridLocation>().is_err());
        assert_eq!(GridLocation::from_index(4).unwrap(), GridLocation::Center);
        assert!(GridLocation::from_index(9).is_err());
    }
}

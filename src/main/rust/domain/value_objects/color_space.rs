use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::errors::DomainError;
use crate::domain::value_objects::Resolution;

/// Pixel layouts a bridge can publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorSpace {
    #[default]
    Rgba,
    Bgra,
    /// Packed 4:2:2, two pixels per four bytes
    Uyvy,
}

impl ColorSpace {
    pub const ALL: [ColorSpace; 3] = [Self::Rgba, Self::Bgra, Self::Uyvy];

    /// Format name as understood by GStreamer raw video caps
    pub fn caps_format(&self) -> &'static str {
        match self {
            Self::Rgba => "RGBA",
            Self::Bgra => "BGRA",
            Self::Uyvy => "UYVY",
        }
    }

    /// Whether this layout stores one pixel in four bytes
    pub fn is_four_byte(&self) -> bool {
        matches!(self, Self::Rgba | Self::Bgra)
    }

    /// Number of bytes one frame occupies in this layout
    pub fn frame_size(&self, resolution: Resolution) -> usize {
        let width = resolution.width() as usize;
        let height = resolution.height() as usize;
        match self {
            Self::Rgba | Self::Bgra => width * height * 4,
            // odd widths pad the last macropixel
            Self::Uyvy => width.div_ceil(2) * 4 * height,
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caps_format())
    }
}

impl FromStr for ColorSpace {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RGBA" => Ok(Self::Rgba),
            "BGRA" => Ok(Self::Bgra),
            "UYVY" => Ok(Self::Uyvy),
            _ => Err(DomainError::UnknownColorSpace(s.to_string())),
        }
    }
}

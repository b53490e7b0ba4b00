//! Channel layouts for headerless raw bitmaps.
//!
//! A raw input is declared as `WIDTHxHEIGHT:FORMAT`, e.g. `640x480:bgra`.
//! The format name fixes how many bytes each pixel occupies and where the
//! red, green and blue bytes sit inside it; alpha and other channels are
//! skipped on ingest.

use std::fmt;
use std::str::FromStr;

use crate::buffer::storage_len;
use crate::config::ConfigError;

/// Byte layout of a single raw pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    /// Bytes per pixel.
    pub channels: usize,
    /// Byte offsets of R, G and B within a pixel.
    pub offsets: [usize; 3],
}

/// Supported raw pixel formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgb,
    Rgba,
    Argb,
    Bgr,
    Bgra,
    Abgr,
}

impl PixelFormat {
    /// Every supported format, in declaration order.
    pub const ALL: [PixelFormat; 6] = [
        PixelFormat::Rgb,
        PixelFormat::Rgba,
        PixelFormat::Argb,
        PixelFormat::Bgr,
        PixelFormat::Bgra,
        PixelFormat::Abgr,
    ];

    /// Channel count and RGB offsets for this format.
    pub const fn layout(self) -> PixelLayout {
        let (channels, offsets) = match self {
            PixelFormat::Rgb => (3, [0, 1, 2]),
            PixelFormat::Rgba => (4, [0, 1, 2]),
            PixelFormat::Argb => (4, [1, 2, 3]),
            PixelFormat::Bgr => (3, [2, 1, 0]),
            PixelFormat::Bgra => (4, [2, 1, 0]),
            PixelFormat::Abgr => (4, [3, 2, 1]),
        };
        PixelLayout { channels, offsets }
    }

    /// Lowercase name as accepted on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgb => "rgb",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Argb => "argb",
            PixelFormat::Bgr => "bgr",
            PixelFormat::Bgra => "bgra",
            PixelFormat::Abgr => "abgr",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::InvalidRawFormat(s.to_string()))
    }
}

/// Geometry and layout of a headerless raw bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawImageFormat {
    pub format: PixelFormat,
    pub width: usize,
    pub height: usize,
}

impl RawImageFormat {
    /// Number of bytes a complete image of this format occupies, or `None`
    /// when that overflows `usize`.
    pub fn byte_len(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.format.layout().channels)
    }
}

impl fmt::Display for RawImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}:{}", self.width, self.height, self.format)
    }
}

impl FromStr for RawImageFormat {
    type Err = ConfigError;

    /// Parse `WIDTHxHEIGHT:FORMAT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRawFormat(s.to_string());

        let (dims, format) = s.split_once(':').ok_or_else(invalid)?;
        let (width, height) = dims.split_once('x').ok_or_else(invalid)?;
        let width: usize = width.parse().map_err(|_| invalid())?;
        let height: usize = height.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 || storage_len(width, height).is_none() {
            return Err(invalid());
        }
        let raw = RawImageFormat {
            format: format.parse().map_err(|_| invalid())?,
            width,
            height,
        };
        raw.byte_len().ok_or_else(invalid)?;

        Ok(raw)
    }
}

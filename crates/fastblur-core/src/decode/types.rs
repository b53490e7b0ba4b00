//! Core types for loading images.

use std::path::PathBuf;

use thiserror::Error;

use crate::format::RawImageFormat;

/// Errors raised while loading an input image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not an image the codec understands.
    #[error("cannot decode image: {0}")]
    InvalidFormat(String),

    /// A raw stream ended before the declared geometry was filled.
    #[error("raw input truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// The declared raw geometry does not fit in memory.
    #[error("raw image {0} is too large")]
    TooLarge(RawImageFormat),
}

/// Where the pipeline reads its input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A PNG or JPEG file.
    Encoded(PathBuf),
    /// Headerless interleaved bytes. A path of `-` reads standard input.
    Raw {
        path: PathBuf,
        format: RawImageFormat,
    },
}

impl InputSource {
    /// The path this source reads from.
    pub fn path(&self) -> &std::path::Path {
        match self {
            InputSource::Encoded(path) => path,
            InputSource::Raw { path, .. } => path,
        }
    }

    /// Whether this source reads standard input.
    pub fn is_stdin(&self) -> bool {
        matches!(self, InputSource::Raw { path, .. } if path.as_os_str() == "-")
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

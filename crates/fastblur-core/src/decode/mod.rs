//! Image loading for the blur pipeline.
//!
//! This module provides functionality for:
//! - Decoding PNG and JPEG files via the `image` crate
//! - Ingesting headerless raw bitmaps with a declared channel layout
//! - Converting every channel to linear light on the way in
//!
//! Whatever the source, the result is an [`ImageBuffer`](crate::buffer::ImageBuffer)
//! of linear RGB floats.

mod codec;
mod raw;
mod types;

pub use codec::{decode_image, load_image};
pub use raw::{decode_raw, load_raw};
pub use types::{DecodeError, InputSource, Orientation};

use crate::buffer::ImageBuffer;
use crate::gamma::GammaMode;

/// Load `source` into a linear image.
pub fn load(source: &InputSource, mode: GammaMode) -> Result<ImageBuffer, DecodeError> {
    match source {
        InputSource::Encoded(path) => load_image(path, mode),
        InputSource::Raw { path, format } => load_raw(path, format, mode),
    }
}

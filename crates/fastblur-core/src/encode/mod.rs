//! Image encoding for the blur pipeline.
//!
//! This module provides functionality for:
//! - Converting linear RGB floats back to gamma-encoded bytes
//! - Writing the result as PNG, or JPEG with configurable quality
//!
//! The container is chosen from the output path's extension.

mod codec;

pub use codec::{encode_rgb8_bytes, write_rgb8, EncodeError, OutputFormat, DEFAULT_JPEG_QUALITY};

use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::buffer::PixelRows;
use crate::gamma::{self, GammaMode};

/// Gamma encode `image` and write it to `path`.
///
/// `jpeg_quality` only applies when the extension selects JPEG.
pub fn save<I: PixelRows + ?Sized>(
    image: &I,
    path: &Path,
    mode: GammaMode,
    jpeg_quality: u8,
) -> Result<(), EncodeError> {
    let start = Instant::now();
    let pixels = gamma::encode_rgb8(image, mode);
    info!(
        "gamma encoding took: {:.1}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    let format = OutputFormat::from_path(path, jpeg_quality);
    debug!(
        "writing {}x{} {} to {}",
        image.width(),
        image.height(),
        format,
        path.display()
    );
    write_rgb8(path, &pixels, image.width(), image.height(), format)
}

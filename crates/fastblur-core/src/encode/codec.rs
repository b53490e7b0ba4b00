//! PNG and JPEG encoding of 8-bit RGB pixels.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

/// Default JPEG quality when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Errors that can occur while encoding or writing the output image.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero or does not fit the container
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// The codec rejected the image
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: OutputFormat,
        message: String,
    },

    /// The encoded bytes could not be written
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Container format of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    /// JPEG with quality 1-100.
    Jpeg { quality: u8 },
}

impl OutputFormat {
    /// Pick the format from the path extension; anything but `.jpg`/`.jpeg`
    /// is written as PNG.
    pub fn from_path(path: &Path, jpeg_quality: u8) -> Self {
        let is_jpeg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));
        if is_jpeg {
            OutputFormat::Jpeg {
                quality: jpeg_quality,
            }
        } else {
            OutputFormat::Png
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Png => f.write_str("PNG"),
            OutputFormat::Jpeg { .. } => f.write_str("JPEG"),
        }
    }
}

/// Encode packed RGB pixel data (3 bytes per pixel, row-major).
///
/// JPEG quality is clamped to 1-100.
pub fn encode_rgb8_bytes(
    pixels: &[u8],
    width: usize,
    height: usize,
    format: OutputFormat,
) -> Result<Vec<u8>, EncodeError> {
    let invalid_dims = || EncodeError::InvalidDimensions { width, height };
    if width == 0 || height == 0 {
        return Err(invalid_dims());
    }
    let w = u32::try_from(width).map_err(|_| invalid_dims())?;
    let h = u32::try_from(height).map_err(|_| invalid_dims())?;

    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(invalid_dims)?;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Png => {
            PngEncoder::new(&mut buffer).write_image(pixels, w, h, ExtendedColorType::Rgb8)
        }
        OutputFormat::Jpeg { quality } => {
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).write_image(
                pixels,
                w,
                h,
                ExtendedColorType::Rgb8,
            )
        }
    };
    result.map_err(|e| EncodeError::EncodingFailed {
        format,
        message: e.to_string(),
    })?;

    Ok(buffer.into_inner())
}

/// Encode and write packed RGB pixel data to `path`.
pub fn write_rgb8(
    path: &Path,
    pixels: &[u8],
    width: usize,
    height: usize,
    format: OutputFormat,
) -> Result<(), EncodeError> {
    let bytes = encode_rgb8_bytes(pixels, width, height, format)?;
    std::fs::write(path, bytes).map_err(|source| EncodeError::Io {
        path: path.to_path_buf(),
        source,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: PNG output decodes back to the exact input bytes.
        #[test]
        fn prop_png_is_lossless(
            (width, height) in (1usize..=24, 1usize..=24),
            seed in any::<u8>(),
        ) {
            let pixels: Vec<u8> = (0..width * height * 3)
                .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
                .collect();

            let png = encode_rgb8_bytes(&pixels, width, height, OutputFormat::Png).unwrap();
            let decoded = image::load_from_memory(&png).unwrap().into_rgb8();

            prop_assert_eq!(decoded.width() as usize, width);
            prop_assert_eq!(decoded.height() as usize, height);
            prop_assert_eq!(decoded.into_raw(), pixels);
        }

        /// Property: mismatched pixel data is always rejected.
        #[test]
        fn prop_invalid_pixel_length_returns_error(
            (width, height) in (1usize..=20, 1usize..=20),
            delta in 1usize..=10,
            longer in any::<bool>(),
        ) {
            let expected = width * height * 3;
            let actual = if longer { expected + delta } else { expected.saturating_sub(delta) };
            let pixels = vec![128u8; actual];

            let result = encode_rgb8_bytes(&pixels, width, height, OutputFormat::Png);
            prop_assert!(
                matches!(result, Err(EncodeError::InvalidPixelData { .. })),
                "{} bytes accepted for {}x{}",
                actual,
                width,
                height
            );
        }
    }
}

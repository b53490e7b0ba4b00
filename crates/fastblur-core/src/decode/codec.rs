//! Encoded image decoding (PNG, JPEG) with EXIF orientation handling.

use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};
use log::{debug, info};

use super::{DecodeError, Orientation};
use crate::buffer::ImageBuffer;
use crate::gamma::{self, GammaMode};

/// Decode an encoded image from memory into linear light.
///
/// The container format is sniffed from the bytes. EXIF orientation, when
/// present, is applied before the pixels are gamma decoded so the result is
/// upright. Alpha is discarded.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are not a supported or
/// intact image.
pub fn decode_image(bytes: &[u8], mode: GammaMode) -> Result<ImageBuffer, DecodeError> {
    let orientation = extract_orientation(bytes);

    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::InvalidFormat(e.to_string()))?
        .decode()
        .map_err(|e| DecodeError::InvalidFormat(e.to_string()))?;

    if orientation != Orientation::Normal {
        debug!("applying EXIF orientation {:?}", orientation);
    }
    let rgb = apply_orientation(img, orientation).into_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);

    let start = Instant::now();
    let image = gamma::decode_rgb8(rgb.as_raw(), width, height, mode);
    info!(
        "gamma decoding took: {:.1}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(image)
}

/// Read and decode an encoded image file.
pub fn load_image(path: &Path, mode: GammaMode) -> Result<ImageBuffer, DecodeError> {
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_image(&bytes, mode)
}

/// Extract EXIF orientation, falling back to `Normal` when absent.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from)
        .unwrap_or_default()
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

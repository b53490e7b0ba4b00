//! Headerless raw bitmap ingest.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use log::{info, warn};

use super::DecodeError;
use crate::buffer::{storage_len, ImageBuffer};
use crate::format::RawImageFormat;
use crate::gamma::{self, GammaMode};

/// Decode raw interleaved bytes laid out as `format` into linear light.
///
/// Only the R, G and B bytes of each pixel are read; alpha and padding
/// channels are skipped. Bytes beyond the declared size are ignored.
///
/// # Errors
///
/// Returns `DecodeError::TooLarge` if the declared geometry overflows, and
/// `DecodeError::Truncated` if `bytes` is shorter than it requires.
pub fn decode_raw(
    bytes: &[u8],
    format: &RawImageFormat,
    mode: GammaMode,
) -> Result<ImageBuffer, DecodeError> {
    let expected = format
        .byte_len()
        .filter(|_| storage_len(format.width, format.height).is_some())
        .ok_or(DecodeError::TooLarge(*format))?;
    if bytes.len() < expected {
        return Err(DecodeError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected {
        warn!(
            "ignoring {} trailing bytes after {} raw image",
            bytes.len() - expected,
            format
        );
    }

    let layout = format.format.layout();
    let [r, g, b] = layout.offsets;

    let start = Instant::now();
    let mut image = ImageBuffer::new(format.width, format.height);
    for (dst, src) in image
        .as_mut_slice()
        .chunks_exact_mut(3)
        .zip(bytes[..expected].chunks_exact(layout.channels))
    {
        dst[0] = gamma::decode(src[r], mode);
        dst[1] = gamma::decode(src[g], mode);
        dst[2] = gamma::decode(src[b], mode);
    }
    info!(
        "gamma decoding took: {:.1}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(image)
}

/// Read a raw bitmap from `path`, or from standard input when `path` is `-`.
pub fn load_raw(
    path: &Path,
    format: &RawImageFormat,
    mode: GammaMode,
) -> Result<ImageBuffer, DecodeError> {
    let io_err = |source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let bytes = if path.as_os_str() == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().lock().read_to_end(&mut bytes).map_err(io_err)?;
        bytes
    } else {
        std::fs::read(path).map_err(io_err)?
    };

    decode_raw(&bytes, format, mode)
}

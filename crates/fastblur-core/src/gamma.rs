//! Gamma decoding and encoding between 8-bit channel values and linear light.
//!
//! Filtering must happen in linear light: averaging gamma-compressed values
//! darkens edges and mid-tones. Every pixel is decoded once on load and
//! encoded once on save.
//!
//! Two modes are provided:
//! - **Exact**: power law with γ = 2.2. Decoding goes through a 256-entry
//!   lookup table built once per process.
//! - **Fast**: γ ≈ 2, so decoding is a square and encoding a square root.

use std::sync::LazyLock;

use crate::buffer::{ImageBuffer, PixelRows};

/// Gamma exponent used by the exact codec.
pub const GAMMA: f32 = 2.2;

static DECODE_TABLE: LazyLock<[f32; 256]> = LazyLock::new(build_decode_table);

/// Which transfer curve to use when converting to and from linear light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GammaMode {
    /// γ = 2.2, table-driven decode, `powf` encode.
    #[default]
    Exact,
    /// γ ≈ 2, decode by squaring, encode by `sqrt`.
    Fast,
}

fn build_decode_table() -> [f32; 256] {
    std::array::from_fn(|i| (i as f32 / 255.0).powf(GAMMA))
}

/// Force construction of the exact decode table.
///
/// The table is built lazily on first use anyway; calling this during setup
/// keeps the construction cost out of timed stages.
pub fn init_decode_table() {
    LazyLock::force(&DECODE_TABLE);
}

/// Decode an 8-bit channel value to linear light in [0, 1].
#[inline]
pub fn decode(v: u8, mode: GammaMode) -> f32 {
    match mode {
        GammaMode::Exact => DECODE_TABLE[v as usize],
        GammaMode::Fast => {
            let x = v as f32 / 255.0;
            x * x
        }
    }
}

/// Encode a linear value to an 8-bit channel value.
///
/// Values are clamped to [0, 1] first; NaN encodes to 0.
#[inline]
pub fn encode(v: f32, mode: GammaMode) -> u8 {
    // `max` discards NaN in favour of the other operand
    let v = v.max(0.0).min(1.0);
    let encoded = match mode {
        GammaMode::Exact => 255.0 * v.powf(1.0 / GAMMA),
        GammaMode::Fast => 255.0 * v.sqrt(),
    };
    (encoded + 0.5) as u8
}

/// Decode packed interleaved RGB bytes into a linear image.
///
/// `pixels.len()` must be `width * height * 3`.
pub fn decode_rgb8(pixels: &[u8], width: usize, height: usize, mode: GammaMode) -> ImageBuffer {
    debug_assert_eq!(pixels.len(), width * height * 3, "RGB buffer size mismatch");

    let mut image = ImageBuffer::new(width, height);
    for (dst, &src) in image.as_mut_slice().iter_mut().zip(pixels) {
        *dst = decode(src, mode);
    }
    image
}

/// Encode a linear image into packed interleaved RGB bytes.
///
/// Row padding of views is dropped; the output stride is always `3 * width`.
pub fn encode_rgb8<I: PixelRows + ?Sized>(image: &I, mode: GammaMode) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.width() * image.height() * 3);
    for y in 0..image.height() {
        out.extend(image.row(y).iter().map(|&v| encode(v, mode)));
    }
    out
}

//! Pixel matrix transpose.
//!
//! Rows become columns and columns become rows. The separable blur uses this
//! to turn a strided column pass into a contiguous row pass.
//!
//! The copy walks the source in square tiles so that both the rows being
//! read and the rows being written stay resident in cache; a naive
//! row-by-row walk touches a new destination cache line for every pixel.

use crate::buffer::{ImageBuffer, PixelRows, CHANNELS};

/// Tile edge in pixels.
const TILE: usize = 32;

/// Transpose `src` into `dst`, resizing `dst` to `height x width`.
pub fn transpose_into<I: PixelRows + ?Sized>(src: &I, dst: &mut ImageBuffer) {
    let (width, height) = (src.width(), src.height());
    dst.set_size(height, width);

    for ty in (0..height).step_by(TILE) {
        let y_end = (ty + TILE).min(height);
        for tx in (0..width).step_by(TILE) {
            let x_end = (tx + TILE).min(width);
            for y in ty..y_end {
                let src_row = src.row(y);
                for x in tx..x_end {
                    let s = x * CHANNELS;
                    let d = y * CHANNELS;
                    dst.row_mut(x)[d..d + CHANNELS].copy_from_slice(&src_row[s..s + CHANNELS]);
                }
            }
        }
    }
}

/// Transpose `src` into a newly allocated buffer.
pub fn transpose<I: PixelRows + ?Sized>(src: &I) -> ImageBuffer {
    let mut dst = ImageBuffer::default();
    transpose_into(src, &mut dst);
    dst
}

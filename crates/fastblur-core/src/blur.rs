//! Recursive box filter.
//!
//! A moving average of width `n` is computed along each row in O(width)
//! regardless of `n`: each output reuses its left neighbour, adding the
//! sample entering the window and subtracting the one leaving it.
//!
//! ```text
//! y[x] = y[x - 1] + a * s[x + p] - a * s[x - q]     a = 1/n, p = (n-1)/2, q = p+1
//! ```
//!
//! Edges replicate the first/last sample. No renormalization is done; the
//! accumulated rounding error is bounded by the window length.
//!
//! Vertical filtering reuses the row filter on a transposed image, and
//! several passes of the box filter approximate a Gaussian.

use crate::buffer::{DoubleBuffer, ImageBuffer, PixelRows, CHANNELS};
use crate::config::BlurParams;
use crate::transform::transpose_into;

/// Filter one interleaved RGB row of `src` into `dst` with the window of
/// `params`. Both slices hold `width * 3` floats.
pub fn box_filter_row(src: &[f32], dst: &mut [f32], params: BlurParams) {
    debug_assert_eq!(src.len(), dst.len());

    let width = src.len() / CHANNELS;
    if width == 0 {
        return;
    }

    let a = 1.0 / params.window() as f32;
    let p = params.left_radius();
    let q = params.right_radius();
    let last = width - 1;

    // First output by direct summation. Everything left of x = 0 is a
    // replica of the first sample, which together with x = 0 is q copies.
    for c in 0..CHANNELS {
        let mut acc = src[c] * q as f32 * a;
        for x in 1..q {
            acc += a * src[x.min(last) * CHANNELS + c];
        }
        dst[c] = acc;
    }

    for x in 1..width {
        let enter = (x + p).min(last) * CHANNELS;
        let leave = x.saturating_sub(q) * CHANNELS;
        let (prev, cur) = dst.split_at_mut(x * CHANNELS);
        let prev = &prev[(x - 1) * CHANNELS..];
        for c in 0..CHANNELS {
            cur[c] = prev[c] + a * src[enter + c] - a * src[leave + c];
        }
    }
}

/// Apply the row filter once to every row of `src`, writing into `dst`.
///
/// `dst` is resized to match `src`.
pub fn blur_rows<I: PixelRows + ?Sized>(src: &I, dst: &mut ImageBuffer, params: BlurParams) {
    dst.set_size(src.width(), src.height());
    for y in 0..src.height() {
        box_filter_row(src.row(y), dst.row_mut(y), params);
    }
}

/// Run `params.passes()` horizontal passes through a double buffer.
///
/// The filtered image ends up as the active buffer.
pub fn horizontal_passes(buffers: &mut DoubleBuffer, params: BlurParams) {
    for _ in 0..params.passes() {
        buffers.step(|src, dst| blur_rows(src, dst, params));
    }
}

/// Separable multi-pass box blur of the active buffer.
///
/// Horizontal passes run first, then the image is transposed so the vertical
/// passes also run along contiguous rows, then it is transposed back.
pub fn separable_blur(buffers: &mut DoubleBuffer, params: BlurParams) {
    horizontal_passes(buffers, params);
    buffers.step(|src, dst| transpose_into(src, dst));
    horizontal_passes(buffers, params);
    buffers.step(|src, dst| transpose_into(src, dst));
}

/// Blur a copy of `src` with the given parameters.
pub fn blur<I: PixelRows + ?Sized>(src: &I, params: BlurParams) -> ImageBuffer {
    let mut image = ImageBuffer::new(src.width(), src.height());
    for y in 0..src.height() {
        image.row_mut(y).copy_from_slice(src.row(y));
    }

    let mut buffers = DoubleBuffer::new(image);
    separable_blur(&mut buffers, params);
    buffers.into_active()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(n: usize) -> BlurParams {
        BlurParams::new(n, 1).unwrap()
    }

    /// Clamped-window convolution, the definition the recursive filter must match.
    fn brute_force_row(src: &[f32], window: usize) -> Vec<f32> {
        let width = src.len() / CHANNELS;
        let p = (window - 1) as isize / 2;
        let mut out = vec![0.0f32; src.len()];
        for x in 0..width as isize {
            for c in 0..CHANNELS {
                let mut sum = 0.0f64;
                for k in -p..=p {
                    let i = (x + k).clamp(0, width as isize - 1) as usize;
                    sum += src[i * CHANNELS + c] as f64;
                }
                out[x as usize * CHANNELS + c] = (sum / window as f64) as f32;
            }
        }
        out
    }

    fn assert_close(actual: &[f32], expected: &[f32], tol: f32) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            let scale = e.abs().max(1.0);
            assert!((a - e).abs() <= tol * scale, "index {}: {} vs {}", i, a, e);
        }
    }

    #[test]
    fn test_window_one_is_identity() {
        let src: Vec<f32> = (0..30).map(|i| i as f32 * 0.1).collect();
        let mut dst = vec![0.0; 30];
        box_filter_row(&src, &mut dst, window(1));
        assert_close(&dst, &src, 1e-6);
    }

    #[test]
    fn test_window_three_by_hand() {
        // Single channel of interest: 0, 3, 6, 9 in the red slot
        let src = [0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 6.0, 0.0, 0.0, 9.0, 0.0, 0.0];
        let mut dst = [0.0; 12];
        box_filter_row(&src, &mut dst, window(3));
        // (0+0+3)/3, (0+3+6)/3, (3+6+9)/3, (6+9+9)/3
        let red: Vec<f32> = dst.iter().step_by(3).copied().collect();
        assert_close(&red, &[1.0, 3.0, 6.0, 8.0], 1e-6);
    }

    #[test]
    fn test_window_wider_than_row() {
        let src = [0.2, 0.4, 0.6, 0.8, 1.0, 0.0];
        let mut dst = [0.0; 6];
        box_filter_row(&src, &mut dst, window(9));
        assert_close(&dst, &brute_force_row(&src, 9), 1e-5);
    }

    #[test]
    fn test_single_pixel_row() {
        let src = [0.3, 0.6, 0.9];
        let mut dst = [0.0; 3];
        box_filter_row(&src, &mut dst, window(7));
        assert_close(&dst, &src, 1e-6);
    }

    #[test]
    fn test_empty_row() {
        let mut dst: [f32; 0] = [];
        box_filter_row(&[], &mut dst, window(5));
    }

    #[test]
    fn test_blur_rows_handles_views() {
        let mut image = ImageBuffer::new(8, 3);
        for (i, v) in image.as_mut_slice().iter_mut().enumerate() {
            *v = (i % 11) as f32;
        }
        let view = image.crop(5, 2, 2, 1).unwrap();
        let mut out = ImageBuffer::default();
        blur_rows(&view, &mut out, window(3));

        assert_eq!(out.width(), 5);
        assert_eq!(out.height(), 2);
        assert_close(out.row(1), &brute_force_row(view.row(1), 3), 1e-5);
    }

    #[test]
    fn test_uniform_image_unchanged() {
        let image = ImageBuffer::filled(9, 6, [0.25, 0.5, 0.75]);
        let image = blur(&image, BlurParams::new(5, 3).unwrap());

        assert_eq!(image.width(), 9);
        assert_eq!(image.height(), 6);
        for px in image.as_slice().chunks_exact(3) {
            assert_close(px, &[0.25, 0.5, 0.75], 1e-5);
        }
    }

    #[test]
    fn test_blur_spreads_impulse_both_ways() {
        let mut image = ImageBuffer::new(9, 9);
        image.set_pixel(4, 4, [1.0, 1.0, 1.0]);
        let image = blur(&image, BlurParams::new(3, 1).unwrap());

        // A 3x3 box spreads the impulse evenly over its neighbourhood
        for (x, y) in [(3, 3), (4, 3), (5, 5), (4, 4)] {
            assert!((image.pixel(x, y)[0] - 1.0 / 9.0).abs() < 1e-6);
        }
        assert_eq!(image.pixel(2, 4)[0], 0.0);
        assert_eq!(image.pixel(4, 6)[1], 0.0);
    }

    #[test]
    fn test_blur_preserves_energy_in_interior() {
        let mut image = ImageBuffer::new(21, 21);
        image.set_pixel(10, 10, [1.0, 0.0, 0.0]);
        let image = blur(&image, BlurParams::new(3, 2).unwrap());

        let total: f32 = image.as_slice().iter().step_by(3).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_blur_of_view_only_sees_view() {
        let mut image = ImageBuffer::filled(10, 10, [0.5; 3]);
        for y in 0..10 {
            image.set_pixel(0, y, [1.0; 3]);
        }
        let view = image.crop(6, 6, 2, 2).unwrap();
        let blurred = blur(&view, BlurParams::new(5, 2).unwrap());

        assert_eq!(blurred.width(), 6);
        assert_eq!(blurred.height(), 6);
        for v in blurred.as_slice() {
            assert!((v - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_separable_blur_matches_two_pass_definition() {
        let mut image = ImageBuffer::new(12, 7);
        for (i, v) in image.as_mut_slice().iter_mut().enumerate() {
            *v = ((i * 37) % 101) as f32 / 100.0;
        }

        // One pass each way, filtering columns directly instead of transposing
        let mut rows = ImageBuffer::default();
        blur_rows(&image, &mut rows, window(5));
        let mut expected = rows.clone();
        for x in 0..12 {
            let column: Vec<f32> = (0..7).flat_map(|y| rows.pixel(x, y)).collect();
            let mut filtered = vec![0.0; column.len()];
            box_filter_row(&column, &mut filtered, window(5));
            for y in 0..7 {
                let i = y * CHANNELS;
                expected.set_pixel(x, y, [filtered[i], filtered[i + 1], filtered[i + 2]]);
            }
        }

        let actual = blur(&image, BlurParams::new(5, 1).unwrap());
        assert_close(actual.as_slice(), expected.as_slice(), 1e-6);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn brute_force(src: &[f32], window: usize) -> Vec<f32> {
        let width = src.len() / CHANNELS;
        let p = (window as isize - 1) / 2;
        (0..src.len())
            .map(|i| {
                let (x, c) = ((i / CHANNELS) as isize, i % CHANNELS);
                let sum: f64 = (-p..=p)
                    .map(|k| {
                        let j = (x + k).clamp(0, width as isize - 1) as usize;
                        src[j * CHANNELS + c] as f64
                    })
                    .sum();
                (sum / window as f64) as f32
            })
            .collect()
    }

    proptest! {
        /// Property: recursive filter equals clamped-window convolution.
        #[test]
        fn prop_recursive_matches_brute_force(
            row in prop::collection::vec(0.0f32..=1.0, 3..=300),
            half in 0usize..=40,
        ) {
            let len = row.len() / CHANNELS * CHANNELS;
            let src = &row[..len];
            let window = 2 * half + 1;

            let mut dst = vec![0.0; len];
            box_filter_row(src, &mut dst, BlurParams::new(window, 1).unwrap());
            let expected = brute_force(src, window);

            for (a, e) in dst.iter().zip(&expected) {
                prop_assert!((a - e).abs() <= 1e-4 * e.abs().max(1.0), "{} vs {}", a, e);
            }
        }

        /// Property: a uniform image is a fixed point of the blur.
        #[test]
        fn prop_uniform_image_fixed_point(
            width in 1usize..=24,
            height in 1usize..=24,
            half in 0usize..=12,
            passes in 1usize..=4,
            value in 0.0f32..=1.0,
        ) {
            let image = ImageBuffer::filled(width, height, [value; 3]);
            let image = blur(&image, BlurParams::new(2 * half + 1, passes).unwrap());

            for v in image.as_slice() {
                prop_assert!((v - value).abs() <= 1e-4, "{} drifted to {}", value, v);
            }
        }
    }
}

//! Aspect-fill cropping, nearest-neighbor resizing and box decimation.
//!
//! # Resize Order
//!
//! Resizing to a [`Geometry`] happens in two steps:
//! 1. Crop the largest rectangle of the source that has the target aspect
//!    ratio. The anchor decides which part of the discarded axis survives.
//! 2. Scale the crop to the exact target size by nearest-neighbor sampling.
//!
//! The crop is a borrowed view, so step 1 copies nothing.

use crate::buffer::{storage_len, DoubleBuffer, ImageBuffer, ImageError, PixelRows, CHANNELS};
use crate::config::Geometry;

/// Pixel rectangle within a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Largest rectangle of a `src_width x src_height` image with the aspect ratio
/// of `geometry`.
///
/// When the target is wider than the source the crop keeps the full width and
/// loses height; otherwise it keeps the full height and loses width. The
/// offset along the shortened axis is `round(anchor * slack)`.
pub fn aspect_fill_crop(src_width: usize, src_height: usize, geometry: &Geometry) -> CropRect {
    if src_width == 0 || src_height == 0 {
        return CropRect {
            x: 0,
            y: 0,
            width: src_width,
            height: src_height,
        };
    }

    let target_aspect = geometry.aspect();
    let src_aspect = src_width as f64 / src_height as f64;

    if target_aspect > src_aspect {
        let height = ((src_width as f64 / target_aspect).round() as usize).clamp(1, src_height);
        let y = (geometry.anchor() * (src_height - height) as f64).round() as usize;
        CropRect {
            x: 0,
            y,
            width: src_width,
            height,
        }
    } else {
        let width = ((src_height as f64 * target_aspect).round() as usize).clamp(1, src_width);
        let x = (geometry.anchor() * (src_width - width) as f64).round() as usize;
        CropRect {
            x,
            y: 0,
            width,
            height: src_height,
        }
    }
}

/// Nearest-neighbor resize of `src` into `dst` at `width x height`.
///
/// Destination pixel `(x, y)` samples source pixel
/// `(round(x * sw / dw), round(y * sh / dh))`, clamped to the last column and
/// row.
pub fn resize_nearest_into<I: PixelRows + ?Sized>(
    src: &I,
    dst: &mut ImageBuffer,
    width: usize,
    height: usize,
) -> Result<(), ImageError> {
    if src.is_empty() {
        return Err(ImageError::Empty {
            width: src.width(),
            height: src.height(),
        });
    }
    if storage_len(width, height).is_none() {
        return Err(ImageError::TooLarge { width, height });
    }

    dst.set_size(width, height);
    if width == 0 || height == 0 {
        return Ok(());
    }

    let x_scale = src.width() as f64 / width as f64;
    let y_scale = src.height() as f64 / height as f64;
    let last_x = src.width() - 1;
    let last_y = src.height() - 1;

    let columns: Vec<usize> = (0..width)
        .map(|x| ((x as f64 * x_scale + 0.5) as usize).min(last_x) * CHANNELS)
        .collect();

    for y in 0..height {
        let src_y = ((y as f64 * y_scale + 0.5) as usize).min(last_y);
        let src_row = src.row(src_y);
        let dst_row = dst.row_mut(y);
        for (px, &sx) in dst_row.chunks_exact_mut(CHANNELS).zip(&columns) {
            px.copy_from_slice(&src_row[sx..sx + CHANNELS]);
        }
    }
    Ok(())
}

/// Nearest-neighbor resize into a newly allocated buffer.
pub fn resize_nearest<I: PixelRows + ?Sized>(
    src: &I,
    width: usize,
    height: usize,
) -> Result<ImageBuffer, ImageError> {
    let mut dst = ImageBuffer::default();
    resize_nearest_into(src, &mut dst, width, height)?;
    Ok(dst)
}

/// Aspect-fill crop `src` and resize the crop to exactly fit `geometry`.
pub fn resize_to_geometry_into(
    src: &ImageBuffer,
    dst: &mut ImageBuffer,
    geometry: &Geometry,
) -> Result<CropRect, ImageError> {
    let rect = aspect_fill_crop(src.width(), src.height(), geometry);
    let view = src.crop(rect.width, rect.height, rect.x, rect.y)?;
    resize_nearest_into(&view, dst, geometry.width(), geometry.height())?;
    Ok(rect)
}

/// Halve both dimensions by averaging each 2x2 block.
///
/// Odd dimensions are rejected rather than silently truncated.
pub fn decimate_into<I: PixelRows + ?Sized>(
    src: &I,
    dst: &mut ImageBuffer,
) -> Result<(), ImageError> {
    let (width, height) = (src.width(), src.height());
    if width % 2 != 0 || height % 2 != 0 {
        return Err(ImageError::OddDimensions { width, height });
    }
    if src.is_empty() {
        return Err(ImageError::Empty { width, height });
    }

    let (half_w, half_h) = (width / 2, height / 2);
    dst.set_size(half_w, half_h);

    for y in 0..half_h {
        let top = src.row(2 * y);
        let bottom = src.row(2 * y + 1);
        let out = dst.row_mut(y);
        for x in 0..half_w {
            let l = 2 * x * CHANNELS;
            let r = l + CHANNELS;
            for c in 0..CHANNELS {
                out[x * CHANNELS + c] =
                    0.25 * (top[l + c] + top[r + c] + bottom[l + c] + bottom[r + c]);
            }
        }
    }
    Ok(())
}

/// Halve `src` once into a newly allocated buffer.
pub fn decimate<I: PixelRows + ?Sized>(src: &I) -> Result<ImageBuffer, ImageError> {
    let mut dst = ImageBuffer::default();
    decimate_into(src, &mut dst)?;
    Ok(dst)
}

/// Halve the active image of `buffers` `levels` times.
///
/// Nothing is touched unless every level is well defined.
pub fn decimate_levels(buffers: &mut DoubleBuffer, levels: u32) -> Result<(), ImageError> {
    let (width, height) = (buffers.active().width(), buffers.active().height());
    if !can_decimate(width, height, levels) {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }
        return Err(ImageError::OddDimensions { width, height });
    }
    for _ in 0..levels {
        buffers.try_step(|src, dst| decimate_into(src, dst))?;
    }
    Ok(())
}

/// Whether `levels` successive halvings of a `width x height` image are all
/// well defined.
pub fn can_decimate(mut width: usize, mut height: usize, levels: u32) -> bool {
    for _ in 0..levels {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return false;
        }
        width /= 2;
        height /= 2;
    }
    true
}

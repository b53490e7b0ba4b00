//! Linear-light float image storage.
//!
//! Pixels are stored as interleaved `f32` triples (R, G, B) in row-major
//! order. Two types share the [`PixelRows`] read interface:
//!
//! - [`ImageBuffer`] owns its storage and is the only writable image. Its
//!   allocation only ever grows, so a buffer reused across pipeline stages
//!   settles at the largest size it has seen.
//! - [`ImageView`] borrows a rectangle of a parent buffer. It keeps the
//!   parent's stride and cannot outlive the parent.

use thiserror::Error;

/// Number of interleaved channels per pixel.
pub const CHANNELS: usize = 3;

/// Errors raised by image geometry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    /// The requested crop rectangle does not fit inside the parent image.
    #[error(
        "crop {width}x{height}+{x}+{y} exceeds image bounds {parent_width}x{parent_height}"
    )]
    CropOutOfBounds {
        width: usize,
        height: usize,
        x: usize,
        y: usize,
        parent_width: usize,
        parent_height: usize,
    },

    /// Box decimation needs both dimensions to be even.
    #[error("cannot halve a {width}x{height} image: dimensions must be even")]
    OddDimensions { width: usize, height: usize },

    /// The operation needs at least one pixel.
    #[error("image is empty ({width}x{height})")]
    Empty { width: usize, height: usize },

    /// The float storage for the requested size is not addressable.
    #[error("image size {width}x{height} is too large")]
    TooLarge { width: usize, height: usize },
}

/// Number of floats a packed `width x height` image needs, or `None` when
/// the storage would exceed `isize::MAX` bytes.
pub fn storage_len(width: usize, height: usize) -> Option<usize> {
    let floats = width.checked_mul(height)?.checked_mul(CHANNELS)?;
    let bytes = floats.checked_mul(std::mem::size_of::<f32>())?;
    (bytes <= isize::MAX as usize).then_some(floats)
}

/// Read access to a strided RGB float image.
pub trait PixelRows {
    /// Width in pixels.
    fn width(&self) -> usize;
    /// Height in pixels.
    fn height(&self) -> usize;
    /// Floats between the starts of consecutive rows (`>= 3 * width`).
    fn stride(&self) -> usize;
    /// Row `y` as `3 * width` interleaved floats, without padding.
    fn row(&self, y: usize) -> &[f32];

    /// Pixel `(x, y)` as `[r, g, b]`.
    #[inline]
    fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        let row = self.row(y);
        let i = x * CHANNELS;
        [row[i], row[i + 1], row[i + 2]]
    }

    /// Whether the image has no pixels.
    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Owned, growable RGB float image with a packed stride of `3 * width`.
#[derive(Debug, Clone, Default)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl ImageBuffer {
    /// Create a zero-filled image of `width x height` pixels.
    ///
    /// # Panics
    ///
    /// Panics if [`storage_len`] rejects the size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; checked_storage_len(width, height)],
        }
    }

    /// Create an image filled with a single linear colour.
    pub fn filled(width: usize, height: usize, rgb: [f32; 3]) -> Self {
        let mut image = Self::new(width, height);
        for px in image.data.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&rgb);
        }
        image
    }

    /// Change the logical size of the image.
    ///
    /// The backing store is reallocated only when `width * height` exceeds the
    /// current capacity; it never shrinks. Pixel contents are unspecified
    /// after a resize.
    ///
    /// # Panics
    ///
    /// Panics if [`storage_len`] rejects the size. Stages that take their
    /// output size from user input check it first.
    pub fn set_size(&mut self, width: usize, height: usize) {
        let needed = checked_storage_len(width, height);
        if needed > self.data.len() {
            self.data = vec![0.0; needed];
        }
        self.width = width;
        self.height = height;
    }

    /// Number of pixels the backing store can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.data.len() / CHANNELS
    }

    /// The active pixels as one packed slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.data[..self.width * self.height * CHANNELS]
    }

    /// The active pixels as one packed mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        let len = self.width * self.height * CHANNELS;
        &mut self.data[..len]
    }

    /// Mutable row `y`.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let stride = self.width * CHANNELS;
        let start = y * stride;
        &mut self.data[start..start + stride]
    }

    /// Overwrite pixel `(x, y)`.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [f32; 3]) {
        let i = (y * self.width + x) * CHANNELS;
        self.data[i..i + CHANNELS].copy_from_slice(&rgb);
    }

    /// Borrow a `width x height` rectangle whose top-left pixel is `(x, y)`.
    ///
    /// The view shares this buffer's storage and stride; nothing is copied.
    pub fn crop(
        &self,
        width: usize,
        height: usize,
        x: usize,
        y: usize,
    ) -> Result<ImageView<'_>, ImageError> {
        let fits = x
            .checked_add(width)
            .is_some_and(|right| right <= self.width)
            && y.checked_add(height)
                .is_some_and(|bottom| bottom <= self.height);
        if !fits {
            return Err(ImageError::CropOutOfBounds {
                width,
                height,
                x,
                y,
                parent_width: self.width,
                parent_height: self.height,
            });
        }

        Ok(ImageView {
            width,
            height,
            stride: self.stride(),
            offset: (y * self.width + x) * CHANNELS,
            data: &self.data,
        })
    }
}

fn checked_storage_len(width: usize, height: usize) -> usize {
    match storage_len(width, height) {
        Some(len) => len,
        None => panic!("image size {width}x{height} overflows addressable memory"),
    }
}

// Spare capacity beyond the logical size does not take part in equality.
impl PartialEq for ImageBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.as_slice() == other.as_slice()
    }
}

impl PixelRows for ImageBuffer {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }
    #[inline]
    fn height(&self) -> usize {
        self.height
    }
    #[inline]
    fn stride(&self) -> usize {
        self.width * CHANNELS
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let stride = self.width * CHANNELS;
        let start = y * stride;
        &self.data[start..start + stride]
    }
}

/// Borrowed rectangle of an [`ImageBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    width: usize,
    height: usize,
    stride: usize,
    offset: usize,
    data: &'a [f32],
}

impl ImageView<'_> {
    /// Copy the viewed pixels into a new packed buffer.
    pub fn to_buffer(&self) -> ImageBuffer {
        let mut out = ImageBuffer::new(self.width, self.height);
        for y in 0..self.height {
            out.row_mut(y).copy_from_slice(self.row(y));
        }
        out
    }
}

impl PixelRows for ImageView<'_> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }
    #[inline]
    fn height(&self) -> usize {
        self.height
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = self.offset + y * self.stride;
        &self.data[start..start + self.width * CHANNELS]
    }
}

/// Two ping-ponged buffers and the index of the one holding the current image.
///
/// Each [`step`](DoubleBuffer::step) reads the active buffer, writes the
/// inactive one, then makes the written buffer active. Allocations are reused
/// across steps, so a long chain of stages settles at two buffers of the
/// largest size seen.
#[derive(Debug, Default)]
pub struct DoubleBuffer {
    buffers: [ImageBuffer; 2],
    active: usize,
}

impl DoubleBuffer {
    /// Start with `image` as the active buffer and an empty spare.
    pub fn new(image: ImageBuffer) -> Self {
        Self {
            buffers: [image, ImageBuffer::default()],
            active: 0,
        }
    }

    /// The current image.
    pub fn active(&self) -> &ImageBuffer {
        &self.buffers[self.active]
    }

    /// Index of the active buffer (0 or 1).
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Run one stage from the active buffer into the spare, then swap roles.
    pub fn step<T>(&mut self, stage: impl FnOnce(&ImageBuffer, &mut ImageBuffer) -> T) -> T {
        let [first, second] = &mut self.buffers;
        let (src, dst) = if self.active == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        };
        let out = stage(src, dst);
        self.active ^= 1;
        out
    }

    /// Like [`step`](DoubleBuffer::step), but only swaps when the stage succeeds.
    pub fn try_step<E>(
        &mut self,
        stage: impl FnOnce(&ImageBuffer, &mut ImageBuffer) -> Result<(), E>,
    ) -> Result<(), E> {
        let [first, second] = &mut self.buffers;
        let (src, dst) = if self.active == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        };
        stage(src, dst)?;
        self.active ^= 1;
        Ok(())
    }

    /// Consume the pair, keeping only the active image.
    pub fn into_active(self) -> ImageBuffer {
        let [first, second] = self.buffers;
        if self.active == 0 {
            first
        } else {
            second
        }
    }
}

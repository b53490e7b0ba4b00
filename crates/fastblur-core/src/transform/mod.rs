//! Geometric image operations: transpose, crop and resample.
//!
//! Every operation reads any [`PixelRows`](crate::buffer::PixelRows) source,
//! so owned buffers and borrowed crop views are interchangeable inputs.
//! Operations ending in `_into` write into a caller-provided buffer and are
//! what the pipeline uses with its double buffer; the others allocate.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner
//! - Crop anchors run from 0.0 (top/left) to 1.0 (bottom/right)

mod resample;
mod transpose;

pub use resample::{
    aspect_fill_crop, can_decimate, decimate, decimate_into, decimate_levels, resize_nearest,
    resize_nearest_into, resize_to_geometry_into, CropRect,
};
pub use transpose::{transpose, transpose_into};

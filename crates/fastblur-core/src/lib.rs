//! Fastblur Core - Linear-light box blur library
//!
//! This crate loads an 8-bit RGB image, converts it to linear light, blurs
//! it with a multi-pass separable box filter that approximates a Gaussian,
//! and writes it back out. The image can optionally be cropped and resized
//! to a target geometry and halved a number of times before blurring.
//!
//! ```ignore
//! use fastblur_core::{InputSource, Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! pipeline.run_file(&InputSource::Encoded("in.jpg".into()), "out.png".as_ref())?;
//! ```

pub mod blur;
pub mod buffer;
pub mod config;
pub mod decode;
pub mod encode;
pub mod format;
pub mod gamma;
pub mod pipeline;
pub mod transform;

pub use buffer::{DoubleBuffer, ImageBuffer, ImageError, ImageView, PixelRows};
pub use config::{BlurParams, ConfigError, Geometry, PipelineConfig};
pub use decode::{DecodeError, InputSource};
pub use encode::{EncodeError, OutputFormat};
pub use format::{PixelFormat, RawImageFormat};
pub use gamma::GammaMode;
pub use pipeline::{Pipeline, PipelineError, PipelineStage};

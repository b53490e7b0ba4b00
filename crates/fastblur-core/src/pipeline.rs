//! End-to-end blur pipeline.
//!
//! A loaded linear image moves through these stages:
//!
//! ```text
//! Loaded -> [Resized] -> [Decimated xN] -> Horizontal xP -> Transposed
//!        -> Horizontal xP -> TransposedBack -> Encoded
//! ```
//!
//! All stages between load and save run on one [`DoubleBuffer`], so after
//! the first pass no further allocation happens unless a stage grows the
//! image.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use log::{debug, info};
use thiserror::Error;

use crate::blur::horizontal_passes;
use crate::buffer::{DoubleBuffer, ImageBuffer, ImageError, PixelRows};
use crate::config::{ConfigError, PipelineConfig};
use crate::decode::{self, DecodeError, InputSource};
use crate::encode::{self, EncodeError, DEFAULT_JPEG_QUALITY};
use crate::gamma;
use crate::transform::{decimate_levels, resize_to_geometry_into, transpose_into};

/// Any failure along the pipeline. All of them abort the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load input: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("failed to save output: {0}")]
    Encode(#[from] EncodeError),
}

/// Stages between load and save, used for timing logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Resize,
    Decimate,
    HorizontalBlur,
    Transpose,
    VerticalBlur,
    TransposeBack,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Resize => "resize",
            PipelineStage::Decimate => "decimate",
            PipelineStage::HorizontalBlur => "horizontal blur",
            PipelineStage::Transpose => "transpose",
            PipelineStage::VerticalBlur => "vertical blur",
            PipelineStage::TransposeBack => "transpose back",
        };
        f.write_str(name)
    }
}

/// Configured blur pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    jpeg_quality: u8,
}

impl Pipeline {
    /// Create a pipeline with the default JPEG quality.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Set the quality used when the output path selects JPEG.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Run every stage between load and save on a linear image.
    ///
    /// # Errors
    ///
    /// Fails when the image is empty, or when the requested halvings hit an
    /// odd dimension.
    pub fn process(&self, image: ImageBuffer) -> Result<ImageBuffer, PipelineError> {
        if image.is_empty() {
            return Err(ImageError::Empty {
                width: image.width(),
                height: image.height(),
            }
            .into());
        }

        let mut buffers = DoubleBuffer::new(image);

        if let Some(geometry) = &self.config.geometry {
            timed(PipelineStage::Resize, &mut buffers, |buffers| {
                buffers.try_step(|src, dst| {
                    let rect = resize_to_geometry_into(src, dst, geometry)?;
                    debug!(
                        "cropped {}x{}+{}+{} to {}",
                        rect.width, rect.height, rect.x, rect.y, geometry
                    );
                    Ok(())
                })
            })?;
        }

        if self.config.halvings > 0 {
            timed(PipelineStage::Decimate, &mut buffers, |buffers| {
                decimate_levels(buffers, self.config.halvings)
            })?;
        }

        let params = self.config.blur;
        timed(PipelineStage::HorizontalBlur, &mut buffers, |buffers| {
            horizontal_passes(buffers, params);
            Ok(())
        })?;
        timed(PipelineStage::Transpose, &mut buffers, transpose_stage)?;
        timed(PipelineStage::VerticalBlur, &mut buffers, |buffers| {
            horizontal_passes(buffers, params);
            Ok(())
        })?;
        timed(PipelineStage::TransposeBack, &mut buffers, transpose_stage)?;

        Ok(buffers.into_active())
    }

    /// Load `input`, process it and save the result to `output`.
    ///
    /// The output file is only written after every stage succeeded.
    pub fn run_file(&self, input: &InputSource, output: &Path) -> Result<(), PipelineError> {
        let start = Instant::now();
        gamma::init_decode_table();

        let image = decode::load(input, self.config.gamma)?;
        info!(
            "loaded {}x{} image from {}",
            image.width(),
            image.height(),
            input.path().display()
        );

        let result = self.process(image)?;
        encode::save(&result, output, self.config.gamma, self.jpeg_quality)?;

        info!(
            "wrote {}x{} image to {} in {:.1}ms",
            result.width(),
            result.height(),
            output.display(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

fn transpose_stage(buffers: &mut DoubleBuffer) -> Result<(), ImageError> {
    buffers.step(|src, dst| transpose_into(src, dst));
    Ok(())
}

/// Run one stage on the double buffer and log its duration and output size.
fn timed(
    stage: PipelineStage,
    buffers: &mut DoubleBuffer,
    run: impl FnOnce(&mut DoubleBuffer) -> Result<(), ImageError>,
) -> Result<(), ImageError> {
    let start = Instant::now();
    run(buffers)?;
    let image = buffers.active();
    debug!(
        "{} took {:.1}ms ({}x{} in buffer {})",
        stage,
        start.elapsed().as_secs_f64() * 1000.0,
        image.width(),
        image.height(),
        buffers.active_index()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlurParams, Geometry};
    use crate::format::{PixelFormat, RawImageFormat};
    use crate::gamma::GammaMode;

    fn config(window: usize, passes: usize) -> PipelineConfig {
        PipelineConfig {
            blur: BlurParams::new(window, passes).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_uniform_gray_survives_round_trip() {
        let pixels = vec![128u8; 4 * 4 * 3];
        let image = gamma::decode_rgb8(&pixels, 4, 4, GammaMode::Exact);

        let out = Pipeline::new(config(3, 1)).process(image).unwrap();
        let encoded = gamma::encode_rgb8(&out, GammaMode::Exact);

        assert_eq!(out.width(), 4);
        assert_eq!(out.height(), 4);
        for v in encoded {
            assert!((127..=129).contains(&v), "got {v}");
        }
    }

    #[test]
    fn test_process_preserves_non_square_shape() {
        let image = ImageBuffer::filled(9, 4, [0.3, 0.6, 0.9]);
        let out = Pipeline::new(config(5, 2)).process(image).unwrap();
        assert_eq!((out.width(), out.height()), (9, 4));
        assert!((out.pixel(8, 3)[2] - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_process_matches_standalone_blur() {
        let mut image = ImageBuffer::new(12, 7);
        image.set_pixel(6, 3, [1.0, 0.5, 0.25]);
        let params = BlurParams::new(3, 2).unwrap();

        let expected = crate::blur::blur(&image, params);
        let out = Pipeline::new(config(3, 2)).process(image).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_process_resize_then_halve() {
        let mut cfg = config(1, 1);
        cfg.geometry = Some(Geometry::new(40, 20, 0.5).unwrap());
        cfg.halvings = 2;

        let image = ImageBuffer::filled(300, 100, [0.5; 3]);
        let out = Pipeline::new(cfg).process(image).unwrap();
        assert_eq!((out.width(), out.height()), (10, 5));
    }

    #[test]
    fn test_process_rejects_odd_halving() {
        let mut cfg = config(3, 1);
        cfg.halvings = 1;
        let err = Pipeline::new(cfg)
            .process(ImageBuffer::new(5, 4))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Image(ImageError::OddDimensions { width: 5, height: 4 })
        ));
    }

    #[test]
    fn test_process_rejects_empty() {
        let err = Pipeline::default()
            .process(ImageBuffer::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Image(ImageError::Empty { .. })));
    }

    #[test]
    fn test_run_file_raw_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.raw");
        let output = dir.path().join("out.png");

        // 4x2 BGRA, every pixel pure blue with opaque alpha
        let bytes: Vec<u8> = [255u8, 0, 0, 255].repeat(8);
        std::fs::write(&input, bytes).unwrap();

        let source = InputSource::Raw {
            path: input,
            format: RawImageFormat {
                format: PixelFormat::Bgra,
                width: 4,
                height: 2,
            },
        };
        Pipeline::new(config(3, 2)).run_file(&source, &output).unwrap();

        let decoded = image::open(&output).unwrap().into_rgb8();
        assert_eq!(decoded.dimensions(), (4, 2));
        for pixel in decoded.pixels() {
            assert_eq!(pixel.0, [0, 0, 255]);
        }
    }

    #[test]
    fn test_run_file_encoded_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.jpeg");

        image::RgbImage::from_pixel(32, 16, image::Rgb([200, 100, 50]))
            .save(&input)
            .unwrap();

        let mut cfg = config(5, 1);
        cfg.halvings = 1;
        Pipeline::new(cfg)
            .with_jpeg_quality(95)
            .run_file(&InputSource::Encoded(input), &output)
            .unwrap();

        let decoded = image::open(&output).unwrap().into_rgb8();
        assert_eq!(decoded.dimensions(), (16, 8));
    }

    #[test]
    fn test_run_file_missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");

        let err = Pipeline::default()
            .run_file(
                &InputSource::Encoded(dir.path().join("missing.png")),
                &output,
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode(DecodeError::Io { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_run_file_failed_stage_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.raw");
        let output = dir.path().join("out.png");
        std::fs::write(&input, vec![0u8; 3 * 3 * 3]).unwrap();

        let mut cfg = PipelineConfig::default();
        cfg.halvings = 1;
        let source = InputSource::Raw {
            path: input,
            format: "3x3:rgb".parse().unwrap(),
        };
        let err = Pipeline::new(cfg).run_file(&source, &output).unwrap_err();
        assert!(matches!(err, PipelineError::Image(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_run_file_oversized_raw_geometry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.raw");
        let output = dir.path().join("out.png");
        std::fs::write(&input, [0u8; 16]).unwrap();

        let source = InputSource::Raw {
            path: input,
            format: RawImageFormat {
                format: PixelFormat::Rgba,
                width: usize::MAX / 2,
                height: 2,
            },
        };
        let err = Pipeline::default().run_file(&source, &output).unwrap_err();
        assert!(matches!(err, PipelineError::Decode(DecodeError::TooLarge(_))));
        assert!(err.to_string().contains("too large"));
        assert!(!output.exists());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::TransposeBack.to_string(), "transpose back");
        assert_eq!(PipelineStage::Decimate.to_string(), "decimate");
    }
}

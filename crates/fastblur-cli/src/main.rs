use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fastblur_core::config::{DEFAULT_PASSES, DEFAULT_WINDOW};
use fastblur_core::encode::DEFAULT_JPEG_QUALITY;
use fastblur_core::{
    BlurParams, ConfigError, GammaMode, Geometry, InputSource, Pipeline, PipelineConfig,
    PipelineError, RawImageFormat,
};
use log::debug;

#[derive(Parser, Debug)]
#[command(name = "fastblur")]
#[command(about = "Gaussian-like blur in linear light using a multi-pass box filter")]
#[command(long_about = "\
Gaussian-like blur in linear light using a multi-pass box filter

The input is decoded to linear RGB, optionally cropped and resized to a target
geometry, optionally halved, blurred with N passes of a box filter in each
direction, then gamma encoded and written out.

Examples:
  fastblur photo.jpg -o blurred.png
  fastblur photo.jpg -r 1920x1080@0.3 --halve 2 -n 25 -o bg.jpg
  cat frame.raw | fastblur - --raw 640x480:bgra -o frame.png

Set RUST_LOG=debug for per-stage timings.")]
#[command(version)]
struct Cli {
    /// Input image (PNG or JPEG), or a raw file with --raw ('-' reads stdin)
    input: PathBuf,

    /// Output path; a .jpg/.jpeg extension writes JPEG, anything else PNG
    #[arg(short, long, default_value = "out.png")]
    output: PathBuf,

    /// Use the γ≈2 square/square-root codec instead of γ=2.2
    #[arg(long)]
    fast_gamma: bool,

    /// Box filter window size (positive odd integer)
    #[arg(short = 'n', long, default_value_t = DEFAULT_WINDOW, value_parser = parse_window)]
    window: usize,

    /// Box filter passes per direction
    #[arg(short, long, default_value_t = DEFAULT_PASSES, value_parser = parse_passes)]
    passes: usize,

    /// Crop to the aspect ratio of WIDTHxHEIGHT and resize to it; ANCHOR in
    /// [0, 1] picks which part of the cropped axis is kept
    #[arg(short, long, value_name = "WxH[@ANCHOR]")]
    resize: Option<Geometry>,

    /// Treat the input as headerless raw pixels with this geometry and layout
    #[arg(long, value_name = "WxH:FORMAT")]
    raw: Option<RawImageFormat>,

    /// Halve the image N times after resizing (dimensions must stay even)
    #[arg(long, value_name = "N", default_value_t = 0)]
    halve: u32,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
}

fn parse_window(s: &str) -> Result<usize, String> {
    let window: usize = s.parse().map_err(|e| format!("{e}"))?;
    BlurParams::new(window, 1)
        .map(|params| params.window())
        .map_err(|e| e.to_string())
}

fn parse_passes(s: &str) -> Result<usize, String> {
    let passes: usize = s.parse().map_err(|e| format!("{e}"))?;
    BlurParams::new(1, passes)
        .map(|params| params.passes())
        .map_err(|e| e.to_string())
}

impl Cli {
    fn config(&self) -> Result<PipelineConfig, ConfigError> {
        Ok(PipelineConfig {
            gamma: if self.fast_gamma {
                GammaMode::Fast
            } else {
                GammaMode::Exact
            },
            blur: BlurParams::new(self.window, self.passes)?,
            geometry: self.resize,
            halvings: self.halve,
        })
    }

    fn input_source(&self) -> InputSource {
        match self.raw {
            Some(format) => InputSource::Raw {
                path: self.input.clone(),
                format,
            },
            None => InputSource::Encoded(self.input.clone()),
        }
    }
}

fn run(cli: &Cli) -> Result<(), PipelineError> {
    let config = cli.config()?;
    debug!("pipeline config: {:?}", config);

    Pipeline::new(config)
        .with_jpeg_quality(cli.quality)
        .run_file(&cli.input_source(), &cli.output)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fastblur: {err}");
            ExitCode::FAILURE
        }
    }
}

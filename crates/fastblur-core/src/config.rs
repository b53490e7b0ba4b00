//! Validated pipeline configuration.
//!
//! Every knob is checked when it is constructed or parsed, so a
//! [`PipelineConfig`] that exists is always runnable.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::buffer::storage_len;
use crate::gamma::GammaMode;

/// Default blur window size.
pub const DEFAULT_WINDOW: usize = 51;

/// Default number of blur passes per direction.
pub const DEFAULT_PASSES: usize = 4;

/// Default crop anchor (centered).
pub const DEFAULT_ANCHOR: f64 = 0.5;

/// Invalid configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The blur window must be a positive odd integer.
    #[error("invalid blur window size {0}: must be a positive odd integer")]
    InvalidWindow(usize),

    /// The pass count must be at least one.
    #[error("invalid pass count {0}: must be at least 1")]
    InvalidPasses(usize),

    /// Resize geometry is not `WIDTHxHEIGHT[@ANCHOR]`.
    #[error("invalid geometry '{0}': expected WIDTHxHEIGHT[@ANCHOR] with anchor in [0, 1]")]
    InvalidGeometry(String),

    /// Raw format is not `WIDTHxHEIGHT:FORMAT`.
    #[error("invalid raw format '{0}': expected WIDTHxHEIGHT:{{rgb,bgr,argb,abgr,rgba,bgra}}")]
    InvalidRawFormat(String),
}

/// Box filter window and pass count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurParams {
    window: usize,
    passes: usize,
}

impl BlurParams {
    /// Validate a window size (odd, >= 1) and pass count (>= 1).
    pub fn new(window: usize, passes: usize) -> Result<Self, ConfigError> {
        if window == 0 || window % 2 == 0 {
            return Err(ConfigError::InvalidWindow(window));
        }
        if passes == 0 {
            return Err(ConfigError::InvalidPasses(passes));
        }
        Ok(Self { window, passes })
    }

    /// Window size `n`.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of passes per direction.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Samples left of the centre: `p = (n - 1) / 2`.
    pub fn left_radius(&self) -> usize {
        (self.window - 1) / 2
    }

    /// `q = p + 1`, the distance of the sample leaving the window.
    pub fn right_radius(&self) -> usize {
        self.left_radius() + 1
    }
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            passes: DEFAULT_PASSES,
        }
    }
}

/// Resize target and crop bias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    width: usize,
    height: usize,
    anchor: f64,
}

impl Geometry {
    /// Validate a target size (both >= 1, storage addressable) and an anchor
    /// in [0, 1].
    pub fn new(width: usize, height: usize, anchor: f64) -> Result<Self, ConfigError> {
        if width == 0
            || height == 0
            || storage_len(width, height).is_none()
            || !(0.0..=1.0).contains(&anchor)
        {
            return Err(ConfigError::InvalidGeometry(format!(
                "{}x{}@{}",
                width, height, anchor
            )));
        }
        Ok(Self {
            width,
            height,
            anchor,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Crop bias: 0 keeps the top/left, 1 the bottom/right.
    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    /// Target width divided by target height.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.anchor)
    }
}

impl FromStr for Geometry {
    type Err = ConfigError;

    /// Parse `WIDTHxHEIGHT` or `WIDTHxHEIGHT@ANCHOR`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidGeometry(s.to_string());

        let (dims, anchor) = match s.split_once('@') {
            Some((dims, anchor)) => (dims, anchor.parse::<f64>().map_err(|_| invalid())?),
            None => (s, DEFAULT_ANCHOR),
        };
        let (width, height) = dims.split_once('x').ok_or_else(invalid)?;
        let width = width.parse().map_err(|_| invalid())?;
        let height = height.parse().map_err(|_| invalid())?;

        Geometry::new(width, height, anchor).map_err(|_| invalid())
    }
}

/// Everything the pipeline needs to know besides its input and output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    /// Transfer curve used on load and save.
    pub gamma: GammaMode,
    /// Blur window and passes.
    pub blur: BlurParams,
    /// Optional aspect-fill crop and resize before blurring.
    pub geometry: Option<Geometry>,
    /// Number of 2x box decimations applied after the resize.
    pub halvings: u32,
}

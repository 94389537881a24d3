//! Configuration types for quantization, encoding and pipeline runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{FrameSource, MAX_PALETTE_SIZE, MAX_SIDE, Repeat};

fn default_target_side() -> u32 {
    256
}

fn default_palette_size() -> u16 {
    256
}

fn default_delay_cs() -> u16 {
    4
}

fn default_output() -> PathBuf {
    PathBuf::from("out.gif")
}

/// How frames are resampled to the target side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    /// Average every source pixel covered by the output pixel.
    #[default]
    Area,
    /// Take the source pixel at the top-left of the covered span.
    Nearest,
}

/// Whether palettes are built per frame or once for the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteMode {
    /// Each frame gets its own palette (encoded as local color tables).
    #[default]
    PerFrame,
    /// One palette from the merged histogram of all frames.
    Global,
}

/// Quantizer parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantizeConfig {
    /// Output side length in pixels (frames become square).
    #[serde(default = "default_target_side")]
    pub target_side: u32,
    /// Maximum palette entries (1-256).
    #[serde(default = "default_palette_size")]
    pub palette_size: u16,
    /// Palette strategy.
    #[serde(default)]
    pub palette_mode: PaletteMode,
    /// Resampling filter.
    #[serde(default)]
    pub filter: ResampleFilter,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            target_side: default_target_side(),
            palette_size: default_palette_size(),
            palette_mode: PaletteMode::default(),
            filter: ResampleFilter::default(),
        }
    }
}

impl QuantizeConfig {
    /// Config with the given side and palette size and default strategies.
    pub fn new(target_side: u32, palette_size: u16) -> Self {
        Self {
            target_side,
            palette_size,
            ..Default::default()
        }
    }

    /// Validate quantizer parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_side == 0 || self.target_side > MAX_SIDE {
            return Err(ConfigError::InvalidSide(self.target_side));
        }
        if self.palette_size == 0 || self.palette_size as usize > MAX_PALETTE_SIZE {
            return Err(ConfigError::InvalidPaletteSize(self.palette_size as usize));
        }
        Ok(())
    }
}

/// Encoder parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Display time of each frame in centiseconds.
    #[serde(default = "default_delay_cs")]
    pub delay_cs: u16,
    /// Loop directive.
    #[serde(default)]
    pub repeat: Repeat,
    /// Palette index to render transparent.
    #[serde(default)]
    pub transparent: Option<u8>,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            delay_cs: default_delay_cs(),
            repeat: Repeat::Infinite,
            transparent: None,
        }
    }
}

impl EncodeConfig {
    /// Delay derived from a frame rate, as GIF players expect whole centiseconds.
    pub fn from_fps(fps: u16) -> Self {
        Self {
            delay_cs: 100 / fps.max(1),
            ..Default::default()
        }
    }
}

/// Top-level configuration of a `rgb2gif` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where frames come from.
    pub source: FrameSource,
    /// Quantizer parameters.
    #[serde(default)]
    pub quantize: QuantizeConfig,
    /// Encoder parameters.
    #[serde(default)]
    pub encode: EncodeConfig,
    /// Output GIF path.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Optional batch file to persist the raw frames into.
    #[serde(default)]
    pub archive: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: FrameSource::default(),
            quantize: QuantizeConfig::default(),
            encode: EncodeConfig::default(),
            output: default_output(),
            archive: None,
        }
    }
}

impl PipelineConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quantize.validate()?;
        self.source.validate()?;
        if let (Some(t), PaletteMode::Global) = (self.encode.transparent, self.quantize.palette_mode)
        {
            if t as u16 >= self.quantize.palette_size {
                return Err(ConfigError::InvalidTransparentIndex(t));
            }
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Target side must be in 1..=65535, got {0}")]
    InvalidSide(u32),
    #[error("Palette size must be in 1..=256, got {0}")]
    InvalidPaletteSize(usize),
    #[error("Frame dimensions must be non-zero")]
    InvalidDimensions,
    #[error("Frame count must be non-zero")]
    InvalidFrameCount,
    #[error("Transparent index {0} is outside the palette")]
    InvalidTransparentIndex(u8),
}

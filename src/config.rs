//! Options for palette extraction and banner derivation.
//!
//! Every struct carries the documented defaults through `Default` and
//! `#[serde(default)]`, so a JSON file only needs the fields it changes:
//!
//! ```json
//! { "palette": { "color_count": 6 }, "banner": { "prefer_dark": true } }
//! ```
//!
//! Values are checked with `validate()` at the public entry points; an
//! out-of-range value is reported as [`PaletteError::Configuration`] rather
//! than clamped.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::WCAG_AA_NORMAL;
use crate::error::{PaletteError, Result};
use crate::kmeans::DEFAULT_MAX_ITERATIONS;

/// Longest side, in pixels, images are reduced to before sampling.
pub const DEFAULT_MAX_DIMENSION: u32 = 200;

/// Palette extraction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteOptions {
    /// Requested number of colors (k).
    pub color_count: usize,
    /// Sampling coarseness multiplier; higher skips more pixels.
    pub quality: usize,
    /// Upper bound on Lloyd iterations.
    pub max_iterations: usize,
    /// Target number of samples before the quality multiplier.
    pub sample_size: usize,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            color_count: 5,
            quality: 10,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            sample_size: 10_000,
        }
    }
}

impl PaletteOptions {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("color_count", self.color_count),
            ("quality", self.quality),
            ("max_iterations", self.max_iterations),
            ("sample_size", self.sample_size),
        ] {
            if value == 0 {
                return Err(PaletteError::configuration(name, value));
            }
        }
        Ok(())
    }
}

/// Direction of the banner gradient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientDirection {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
    /// Top-left to bottom-right.
    Diagonal,
}

impl GradientDirection {
    /// CSS `linear-gradient` direction keyword.
    pub fn css(&self) -> &'static str {
        match self {
            GradientDirection::Horizontal => "to right",
            GradientDirection::Vertical => "to bottom",
            GradientDirection::Diagonal => "to bottom right",
        }
    }
}

impl fmt::Display for GradientDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GradientDirection::Horizontal => "horizontal",
            GradientDirection::Vertical => "vertical",
            GradientDirection::Diagonal => "diagonal",
        };
        f.write_str(name)
    }
}

impl FromStr for GradientDirection {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(GradientDirection::Horizontal),
            "vertical" => Ok(GradientDirection::Vertical),
            "diagonal" => Ok(GradientDirection::Diagonal),
            _ => Err(PaletteError::configuration("gradient_direction", s)),
        }
    }
}

/// Banner color derivation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerOptions {
    /// Favor dark backgrounds instead of mid-lightness ones.
    pub prefer_dark: bool,
    /// Attach a CSS gradient to the result.
    pub use_gradient: bool,
    pub gradient_direction: GradientDirection,
    /// Minimum WCAG contrast between text and background.
    pub min_contrast_ratio: f64,
}

impl Default for BannerOptions {
    fn default() -> Self {
        Self {
            prefer_dark: false,
            use_gradient: true,
            gradient_direction: GradientDirection::Horizontal,
            min_contrast_ratio: WCAG_AA_NORMAL,
        }
    }
}

impl BannerOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.min_contrast_ratio.is_finite() || self.min_contrast_ratio < 1.0 {
            return Err(PaletteError::configuration(
                "min_contrast_ratio",
                self.min_contrast_ratio,
            ));
        }
        Ok(())
    }
}

/// Complete configuration for the image-to-banner pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub palette: PaletteOptions,
    pub banner: BannerOptions,
    /// Longest side images are reduced to before sampling.
    pub max_dimension: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            palette: PaletteOptions::default(),
            banner: BannerOptions::default(),
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        self.palette.validate()?;
        self.banner.validate()?;
        if self.max_dimension == 0 {
            return Err(PaletteError::configuration("max_dimension", 0));
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| config_file_error(path, e))?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| config_file_error(path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| config_file_error(path, e))?;
        std::fs::write(path, json).map_err(|e| config_file_error(path, e))
    }
}

fn config_file_error(
    path: &Path,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> PaletteError {
    PaletteError::ConfigFile {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

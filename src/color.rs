//! Color value types and the WCAG color math used by the ranking and banner
//! stages.
//!
//! Everything here is a pure function of its arguments. HSL conversion goes
//! through the `palette` crate; luminance and contrast follow the WCAG 2.x
//! definitions exactly (including the historical `0.03928` linearization
//! threshold) so ratios match what browsers' accessibility tooling reports.

use std::fmt;
use std::str::FromStr;

use palette::{FromColor, Srgb};
use serde::{Deserialize, Serialize};

use crate::error::PaletteError;

type PaletteHsl = palette::Hsl<palette::encoding::Srgb, f64>;

/// Minimum contrast for normal-size body text (WCAG AA).
pub const WCAG_AA_NORMAL: f64 = 4.5;
/// Minimum contrast for large text (WCAG AA).
pub const WCAG_AA_LARGE: f64 = 3.0;
/// Minimum contrast for normal-size body text (WCAG AAA).
pub const WCAG_AAA_NORMAL: f64 = 7.0;

/// An 8-bit sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    /// Reset value for clusters that lose all their samples.
    pub const NEUTRAL_GRAY: Rgb = Rgb::new(128, 128, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from real-valued 0–255 channels, rounding to nearest and
    /// clamping into range.
    pub fn from_f64_channels(r: f64, g: f64, b: f64) -> Self {
        Self::new(round_channel(r), round_channel(g), round_channel(b))
    }

    /// Lowercase `#rrggbb`.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_hsl(self) -> Hsl {
        rgb_to_hsl(self)
    }

    /// Squared Euclidean distance with channels treated as reals.
    pub fn distance_squared(&self, other: &Rgb) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        dr * dr + dg * dg + db * db
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl FromStr for Rgb {
    type Err = PaletteError;

    /// Accepts `#rrggbb` or `rrggbb`, either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PaletteError::InvalidColor {
            value: s.to_string(),
        };
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| invalid())?;
        let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| invalid())?;
        let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| invalid())?;
        Ok(Rgb::new(r, g, b))
    }
}

/// Hue in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    pub fn to_rgb(self) -> Rgb {
        hsl_to_rgb(self)
    }
}

fn round_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Convert RGB to HSL. Achromatic colors get hue 0 and saturation 0.
pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let max = rgb.r.max(rgb.g).max(rgb.b);
    let min = rgb.r.min(rgb.g).min(rgb.b);
    if max == min {
        return Hsl::new(0.0, 0.0, max as f64 / 255.0);
    }

    let srgb: Srgb<f64> = Srgb::new(rgb.r, rgb.g, rgb.b).into_format();
    let hsl = PaletteHsl::from_color(srgb);

    let mut hue = hsl.hue.into_positive_degrees();
    if hue >= 360.0 {
        hue -= 360.0;
    }
    Hsl::new(
        hue,
        hsl.saturation.clamp(0.0, 1.0),
        hsl.lightness.clamp(0.0, 1.0),
    )
}

/// Convert HSL back to 8-bit RGB. Hue wraps; saturation and lightness are
/// clamped to `[0, 1]` first.
pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let hue = if hsl.h.is_finite() {
        hsl.h.rem_euclid(360.0)
    } else {
        0.0
    };
    let color = PaletteHsl::new(hue, hsl.s.clamp(0.0, 1.0), hsl.l.clamp(0.0, 1.0));
    let srgb = Srgb::<f64>::from_color(color);
    Rgb::from_f64_channels(srgb.red * 255.0, srgb.green * 255.0, srgb.blue * 255.0)
}

fn linearize(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG relative luminance: 0 for black, 1 for white.
pub fn relative_luminance(rgb: Rgb) -> f64 {
    0.2126 * linearize(rgb.r) + 0.7152 * linearize(rgb.g) + 0.0722 * linearize(rgb.b)
}

/// WCAG contrast ratio between two colors, in `[1, 21]`. Symmetric.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

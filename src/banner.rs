//! Banner colors: pick a background from a ranked palette, find text that is
//! readable on it, and optionally build a CSS gradient.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::color::{Hsl, Rgb, contrast_ratio, relative_luminance};
use crate::config::{BannerOptions, GradientDirection};
use crate::error::Result;
use crate::ranking::ExtractedColor;

/// Background used when the palette is empty.
pub const DEFAULT_BACKGROUND: Rgb = Rgb::new(0x1a, 0x1a, 0x1a);

/// Background/text pair for overlaying content on an image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerColors {
    pub background: String,
    pub background_rgb: Rgb,
    pub text: String,
    pub text_rgb: Rgb,
    /// CSS `linear-gradient(...)` value.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gradient: Option<String>,
    /// Hex of the second-ranked palette color.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub accent: Option<String>,
}

impl BannerColors {
    fn new(background: Rgb, text: Rgb) -> Self {
        Self {
            background: background.hex(),
            background_rgb: background,
            text: text.hex(),
            text_rgb: text,
            gradient: None,
            accent: None,
        }
    }

    /// Dark neutral background with white text and no gradient.
    pub fn fallback() -> Self {
        Self::new(DEFAULT_BACKGROUND, Rgb::WHITE)
    }

    /// Contrast between the text and background colors.
    pub fn contrast(&self) -> f64 {
        contrast_ratio(self.text_rgb, self.background_rgb)
    }
}

/// Derive banner colors from a ranked palette.
///
/// An empty palette gives [`BannerColors::fallback`].
pub fn derive_banner_colors(
    palette: &[ExtractedColor],
    options: &BannerOptions,
) -> Result<BannerColors> {
    options.validate()?;

    let Some(background) = select_background(palette, options.prefer_dark) else {
        debug!("empty palette, using default banner colors");
        return Ok(BannerColors::fallback());
    };

    let text = find_readable_text_color(background.rgb, options.min_contrast_ratio);
    let mut banner = BannerColors::new(background.rgb, text);

    if options.use_gradient {
        banner.gradient = Some(if palette.len() >= 2 {
            create_gradient(&palette[..palette.len().min(3)], options.gradient_direction)
        } else {
            soft_gradient(background.rgb, options.gradient_direction)
        });
    }
    banner.accent = palette.get(1).map(|c| c.hex.clone());

    debug!(
        "banner background {} text {} (contrast {:.2})",
        banner.background,
        banner.text,
        banner.contrast()
    );
    Ok(banner)
}

/// Heuristic suitability of a palette entry as banner background.
pub fn background_score(color: &ExtractedColor, prefer_dark: bool) -> f64 {
    let hsl = color.rgb.to_hsl();
    let mut score = color.percentage;

    if hsl.s > 0.2 && hsl.s < 0.8 {
        score *= 1.3;
    }
    if hsl.l < 0.15 || hsl.l > 0.85 {
        score *= 0.5;
    }
    let lightness_bonus = if prefer_dark {
        hsl.l < 0.5
    } else {
        hsl.l > 0.3 && hsl.l < 0.7
    };
    if lightness_bonus {
        score *= 1.2;
    }
    score
}

/// Highest-scoring background candidate; the earliest wins ties.
pub fn select_background(palette: &[ExtractedColor], prefer_dark: bool) -> Option<&ExtractedColor> {
    let mut best: Option<(&ExtractedColor, f64)> = None;
    for color in palette {
        let score = background_score(color, prefer_dark);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((color, score)),
        }
    }
    best.map(|(color, _)| color)
}

/// A text color with at least `min_contrast` against `background`, when one
/// can be found.
///
/// White and black are tried first and the stronger one wins (white on ties).
/// Failing both, a low-saturation tint of the background hue is scanned in
/// 0.05 lightness steps: from 1.0 down to 0.5 on dark backgrounds, from 0.0 up
/// to 0.5 on light ones.
///
/// If nothing in that range qualifies, white (dark background) or black
/// (light background) is returned even though it falls short of
/// `min_contrast`. Callers that must guarantee the ratio should check
/// [`contrast_ratio`] on the result.
pub fn find_readable_text_color(background: Rgb, min_contrast: f64) -> Rgb {
    let white = contrast_ratio(Rgb::WHITE, background);
    let black = contrast_ratio(Rgb::BLACK, background);
    if white >= min_contrast || black >= min_contrast {
        return if white >= black { Rgb::WHITE } else { Rgb::BLACK };
    }

    let hsl = background.to_hsl();
    let saturation = hsl.s.min(0.1);
    let dark = relative_luminance(background) < 0.5;

    for step in 0..=10 {
        let offset = step as f64 * 0.05;
        let lightness = if dark { 1.0 - offset } else { offset };
        let probe = Hsl::new(hsl.h, saturation, lightness).to_rgb();
        if contrast_ratio(probe, background) >= min_contrast {
            return probe;
        }
    }

    let fallback = if dark { Rgb::WHITE } else { Rgb::BLACK };
    warn!(
        "no text color reaches contrast {:.2} on {}; using {} ({:.2})",
        min_contrast,
        background,
        fallback,
        contrast_ratio(fallback, background)
    );
    fallback
}

/// CSS gradient through `colors` with evenly spaced stops.
///
/// A single color is returned as its plain hex; an empty slice gives the
/// default background hex.
pub fn create_gradient(colors: &[ExtractedColor], direction: GradientDirection) -> String {
    match colors {
        [] => DEFAULT_BACKGROUND.hex(),
        [only] => only.hex.clone(),
        _ => {
            let stops: Vec<&str> = colors.iter().map(|c| c.hex.as_str()).collect();
            linear_gradient(direction, &stops)
        }
    }
}

/// Three-stop gradient built from one color: a lighter, more saturated tint,
/// the color itself, then a darker shade with the hue shifted by 10°.
pub fn soft_gradient(base: Rgb, direction: GradientDirection) -> String {
    let hsl = base.to_hsl();
    let light = Hsl::new(hsl.h, (hsl.s + 0.1).min(1.0), (hsl.l + 0.15).min(1.0)).to_rgb();
    let dark = Hsl::new((hsl.h + 10.0) % 360.0, hsl.s, (hsl.l - 0.15).max(0.0)).to_rgb();

    let stops = [light.hex(), base.hex(), dark.hex()];
    let stops: Vec<&str> = stops.iter().map(String::as_str).collect();
    linear_gradient(direction, &stops)
}

fn linear_gradient(direction: GradientDirection, stops: &[&str]) -> String {
    let last = stops.len().saturating_sub(1).max(1) as f64;
    let stops: Vec<String> = stops
        .iter()
        .enumerate()
        .map(|(i, hex)| format!("{} {}%", hex, format_position(i as f64 / last * 100.0)))
        .collect();
    format!("linear-gradient({}, {})", direction.css(), stops.join(", "))
}

fn format_position(position: f64) -> String {
    if position.fract() == 0.0 {
        format!("{}", position as i64)
    } else {
        let text = format!("{:.2}", position);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

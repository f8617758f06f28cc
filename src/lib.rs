//! Extract a small palette from an image and derive accessible banner colors
//! from it.
//!
//! The pipeline runs strictly forward:
//!
//! 1. [`sampler`] keeps opaque, non-extreme pixels from an RGBA buffer.
//! 2. [`kmeans`] clusters the samples (k-means++ seeding, Lloyd iteration).
//! 3. [`ranking`] turns clusters into a ranked [`ExtractedColor`] list.
//! 4. [`banner`] picks a background and a WCAG-readable text color.
//!
//! Every step is a pure function. The only randomness is k-means++ seeding,
//! which takes its generator from the caller via [`extract_palette_with_rng`].
//!
//! The crate builds both as a native library (with an optional CLI and a
//! background [`worker`]) and as a WebAssembly module exposing the `*_js`
//! functions below.

use js_sys::{Array, Object, Reflect};
use rand::Rng;
use wasm_bindgen::prelude::*;

pub mod banner;
pub mod color;
pub mod config;
pub mod error;
pub mod kmeans;
pub mod loader;
pub mod ranking;
pub mod sampler;
#[cfg(not(target_arch = "wasm32"))]
pub mod worker;

pub use banner::{BannerColors, create_gradient, derive_banner_colors, find_readable_text_color};
pub use color::{Hsl, Rgb, contrast_ratio, relative_luminance};
pub use config::{BannerOptions, ExtractionConfig, GradientDirection, PaletteOptions};
pub use error::{PaletteError, Result};
pub use loader::RgbaBuffer;
pub use ranking::ExtractedColor;

/// Extract a ranked palette from a row-major RGBA buffer, seeding k-means++
/// from thread-local entropy.
///
/// An image whose pixels are all transparent, near-white or near-black yields
/// an empty palette, not an error.
pub fn extract_palette(
    pixels: &[u8],
    width: u32,
    height: u32,
    options: &PaletteOptions,
) -> Result<Vec<ExtractedColor>> {
    extract_palette_with_rng(pixels, width, height, options, &mut rand::rng())
}

/// [`extract_palette`] with a caller-supplied random source.
pub fn extract_palette_with_rng<R>(
    pixels: &[u8],
    width: u32,
    height: u32,
    options: &PaletteOptions,
    rng: &mut R,
) -> Result<Vec<ExtractedColor>>
where
    R: Rng + ?Sized,
{
    options.validate()?;
    loader::check_len(width, height, pixels.len())?;

    let samples = sampler::sample_pixels(pixels, options.quality, options.sample_size);
    let clusters = kmeans::kmeans(&samples, options.color_count, options.max_iterations, rng);
    let palette = ranking::rank_palette(&clusters);

    log::debug!(
        "{}x{} image: {} samples, {} palette colors",
        width,
        height,
        samples.len(),
        palette.len()
    );
    Ok(palette)
}

/// Decode an encoded image and extract its palette.
#[cfg(not(target_arch = "wasm32"))]
pub fn extract_palette_bytes(input: &[u8], config: &ExtractionConfig) -> Result<Vec<ExtractedColor>> {
    config.validate()?;
    let buffer = loader::load_from_memory(input, config.max_dimension)?;
    extract_palette(&buffer.pixels, buffer.width, buffer.height, &config.palette)
}

/// Decode an encoded image, extract its palette and derive banner colors.
#[cfg(not(target_arch = "wasm32"))]
pub fn banner_colors_bytes(
    input: &[u8],
    config: &ExtractionConfig,
) -> Result<(Vec<ExtractedColor>, BannerColors)> {
    let palette = extract_palette_bytes(input, config)?;
    let banner = derive_banner_colors(&palette, &config.banner)?;
    Ok((palette, banner))
}

// ------------------------------------------------------------
// WebAssembly surface
// ------------------------------------------------------------

type JsResult<T> = std::result::Result<T, JsValue>;

fn js_err(err: PaletteError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn rgb_to_js(rgb: Rgb) -> JsResult<Object> {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str("r"), &JsValue::from(rgb.r))?;
    Reflect::set(&obj, &JsValue::from_str("g"), &JsValue::from(rgb.g))?;
    Reflect::set(&obj, &JsValue::from_str("b"), &JsValue::from(rgb.b))?;
    Ok(obj)
}

fn extracted_to_js(color: &ExtractedColor) -> JsResult<Object> {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str("rgb"), &JsValue::from(rgb_to_js(color.rgb)?))?;
    Reflect::set(&obj, &JsValue::from_str("hex"), &JsValue::from_str(&color.hex))?;
    Reflect::set(
        &obj,
        &JsValue::from_str("population"),
        &JsValue::from_f64(color.population as f64),
    )?;
    Reflect::set(
        &obj,
        &JsValue::from_str("percentage"),
        &JsValue::from_f64(color.percentage),
    )?;
    Ok(obj)
}

fn banner_to_js(banner: &BannerColors) -> JsResult<Object> {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str("background"), &JsValue::from_str(&banner.background))?;
    Reflect::set(&obj, &JsValue::from_str("backgroundRgb"), &JsValue::from(rgb_to_js(banner.background_rgb)?))?;
    Reflect::set(&obj, &JsValue::from_str("text"), &JsValue::from_str(&banner.text))?;
    Reflect::set(&obj, &JsValue::from_str("textRgb"), &JsValue::from(rgb_to_js(banner.text_rgb)?))?;
    if let Some(gradient) = &banner.gradient {
        Reflect::set(&obj, &JsValue::from_str("gradient"), &JsValue::from_str(gradient))?;
    }
    if let Some(accent) = &banner.accent {
        Reflect::set(&obj, &JsValue::from_str("accent"), &JsValue::from_str(accent))?;
    }
    Ok(obj)
}

/// Extract a palette from raw RGBA pixels (e.g. `ImageData.data`).
///
/// Returns an array of `{ rgb: {r, g, b}, hex, population, percentage }`.
#[wasm_bindgen]
pub fn extract_palette_js(
    pixels: &[u8],
    width: u32,
    height: u32,
    color_count: usize,
    quality: usize,
) -> JsResult<Array> {
    let options = PaletteOptions {
        color_count,
        quality,
        ..Default::default()
    };
    let palette = extract_palette(pixels, width, height, &options).map_err(js_err)?;

    let out = Array::new();
    for color in &palette {
        out.push(&JsValue::from(extracted_to_js(color)?));
    }
    Ok(out)
}

/// Extract a palette from raw RGBA pixels and derive banner colors from it.
///
/// `direction` is `"horizontal"` (default), `"vertical"` or `"diagonal"`.
#[wasm_bindgen]
pub fn derive_banner_colors_js(
    pixels: &[u8],
    width: u32,
    height: u32,
    color_count: usize,
    prefer_dark: bool,
    use_gradient: bool,
    direction: Option<String>,
) -> JsResult<Object> {
    let gradient_direction = match direction {
        Some(d) => d.parse().map_err(js_err)?,
        None => GradientDirection::default(),
    };
    let palette_options = PaletteOptions {
        color_count,
        ..Default::default()
    };
    let banner_options = BannerOptions {
        prefer_dark,
        use_gradient,
        gradient_direction,
        ..Default::default()
    };

    let palette = extract_palette(pixels, width, height, &palette_options).map_err(js_err)?;
    let banner = derive_banner_colors(&palette, &banner_options).map_err(js_err)?;
    banner_to_js(&banner)
}

/// WCAG contrast ratio between two `#rrggbb` colors.
#[wasm_bindgen]
pub fn contrast_ratio_js(a: &str, b: &str) -> JsResult<f64> {
    let a: Rgb = a.parse().map_err(js_err)?;
    let b: Rgb = b.parse().map_err(js_err)?;
    Ok(contrast_ratio(a, b))
}

/// WCAG relative luminance of a `#rrggbb` color.
#[wasm_bindgen]
pub fn relative_luminance_js(hex: &str) -> JsResult<f64> {
    let rgb: Rgb = hex.parse().map_err(js_err)?;
    Ok(relative_luminance(rgb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn solid_red_gives_single_full_color() {
        let pixels: Vec<u8> = [255, 0, 0, 255].repeat(100);
        let options = PaletteOptions {
            color_count: 3,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let palette = extract_palette_with_rng(&pixels, 10, 10, &options, &mut rng).unwrap();
        assert_eq!(palette.len(), 1);
        assert_eq!(palette[0].rgb, Rgb::new(255, 0, 0));
        assert_eq!(palette[0].hex, "#ff0000");
        assert_eq!(palette[0].population, 100);
        assert_eq!(palette[0].percentage, 100.0);
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let err = extract_palette(&[0; 12], 2, 2, &PaletteOptions::default()).unwrap_err();
        assert!(matches!(err, PaletteError::InvalidBuffer { .. }));
    }

    #[test]
    fn zero_color_count_is_a_configuration_error() {
        let options = PaletteOptions {
            color_count: 0,
            ..Default::default()
        };
        let err = extract_palette(&[10, 20, 30, 255], 1, 1, &options).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn filtered_image_is_an_empty_palette() {
        let pixels: Vec<u8> = [255, 255, 255, 255].repeat(16);
        let palette = extract_palette(&pixels, 4, 4, &PaletteOptions::default()).unwrap();
        assert!(palette.is_empty());
        assert!(extract_palette(&[], 0, 0, &PaletteOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn huge_quality_still_samples_one_pixel() {
        let pixels: Vec<u8> = [20, 140, 60, 255].repeat(20_000);
        let options = PaletteOptions {
            quality: usize::MAX,
            ..Default::default()
        };
        let palette = extract_palette(&pixels, 200, 100, &options).unwrap();
        assert_eq!(palette.len(), 1);
        assert_eq!(palette[0].population, 1);
    }

    #[test]
    fn dyn_rng_can_be_injected() {
        let pixels: Vec<u8> = [255, 0, 0, 255].repeat(16);
        let mut rng: Box<dyn rand::RngCore> = Box::new(StdRng::seed_from_u64(3));
        let palette =
            extract_palette_with_rng(&pixels, 4, 4, &PaletteOptions::default(), rng.as_mut()).unwrap();
        assert_eq!(palette[0].rgb, Rgb::new(255, 0, 0));
    }

    #[test]
    fn same_seed_same_palette() {
        let mut pixels = Vec::new();
        for i in 0..400u32 {
            let v = (i * 37 % 240) as u8 + 8;
            pixels.extend_from_slice(&[v, 255 - v, (i % 200) as u8 + 20, 255]);
        }
        let options = PaletteOptions::default();
        let a = extract_palette_with_rng(&pixels, 20, 20, &options, &mut StdRng::seed_from_u64(5))
            .unwrap();
        let b = extract_palette_with_rng(&pixels, 20, 20, &options, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(a, b);
    }
}

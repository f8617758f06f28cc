//! Decode images into the RGBA buffers the extractor consumes.
//!
//! Decoding goes through the `image` crate. Every image is reduced with
//! nearest-neighbour sampling so its longest side is at most `max_dimension`;
//! a couple of hundred pixels is plenty for palette extraction and keeps the
//! clustering cheap.

use std::path::Path;

use image::{DynamicImage, GenericImageView, imageops::FilterType};
use log::debug;

use crate::error::{PaletteError, Result};

/// A row-major RGBA8 pixel buffer with known dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaBuffer {
    /// Wrap raw bytes, checking they hold exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        check_len(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Fail unless `len == width * height * 4`.
pub(crate) fn check_len(width: u32, height: u32, len: usize) -> Result<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| PaletteError::configuration("dimensions", format!("{width}x{height}")))?;
    if expected != len {
        return Err(PaletteError::InvalidBuffer {
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Decode an encoded image (PNG, JPEG, ...) held in memory.
pub fn load_from_memory(bytes: &[u8], max_dimension: u32) -> Result<RgbaBuffer> {
    check_max_dimension(max_dimension)?;
    let img = image::load_from_memory(bytes)
        .map_err(|e| PaletteError::image_load("Unable to decode image", e))?;
    Ok(into_buffer(img, max_dimension))
}

/// Open and decode an image file.
pub fn load_from_path(path: &Path, max_dimension: u32) -> Result<RgbaBuffer> {
    check_max_dimension(max_dimension)?;
    let img = image::open(path)
        .map_err(|e| PaletteError::image_load(format!("Unable to open {}", path.display()), e))?;
    Ok(into_buffer(img, max_dimension))
}

fn check_max_dimension(max_dimension: u32) -> Result<()> {
    if max_dimension == 0 {
        return Err(PaletteError::configuration("max_dimension", 0));
    }
    Ok(())
}

/// Dimensions after fitting the longest side into `max_dimension`, keeping
/// the aspect ratio. Images already small enough are left alone.
pub fn working_size(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_side = width.max(height);
    if max_side <= max_dimension {
        return (width, height);
    }
    let ratio = max_dimension as f32 / max_side as f32;
    let w = ((width as f32) * ratio).round().max(1.0) as u32;
    let h = ((height as f32) * ratio).round().max(1.0) as u32;
    (w.min(max_dimension), h.min(max_dimension))
}

fn into_buffer(img: DynamicImage, max_dimension: u32) -> RgbaBuffer {
    let (orig_w, orig_h) = img.dimensions();
    let (w, h) = working_size(orig_w, orig_h, max_dimension);

    let rgba = if (w, h) == (orig_w, orig_h) {
        img.to_rgba8()
    } else {
        image::imageops::resize(&img, w, h, FilterType::Nearest)
    };
    debug!("decoded {}x{} image, working size {}x{}", orig_w, orig_h, w, h);

    RgbaBuffer {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    }
}

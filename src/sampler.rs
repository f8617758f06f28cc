//! Pixel sampling: turn a raw RGBA buffer into a list of clusterable samples.

use crate::color::Rgb;

/// Pixels with alpha below this are treated as transparent and skipped.
pub const ALPHA_THRESHOLD: u8 = 125;
/// All three channels above this counts as a flat white background.
pub const NEAR_WHITE: u8 = 250;
/// All three channels below this counts as a flat black background.
pub const NEAR_BLACK: u8 = 5;

/// Pixel stride for a buffer of `pixel_count` pixels.
///
/// `max(1, floor(pixel_count / sample_size) * quality)`, saturating at
/// `usize::MAX` (which visits only the first pixel).
pub fn sample_step(pixel_count: usize, quality: usize, sample_size: usize) -> usize {
    let base = pixel_count / sample_size.max(1);
    base.saturating_mul(quality).max(1)
}

#[inline]
fn keep_pixel(r: u8, g: u8, b: u8, a: u8) -> bool {
    if a < ALPHA_THRESHOLD {
        return false;
    }
    let near_white = r > NEAR_WHITE && g > NEAR_WHITE && b > NEAR_WHITE;
    let near_black = r < NEAR_BLACK && g < NEAR_BLACK && b < NEAR_BLACK;
    !near_white && !near_black
}

/// Collect opaque, non-extreme pixels from a row-major RGBA buffer, visiting
/// every `step`-th pixel.
///
/// A trailing partial pixel (fewer than 4 bytes) is ignored. An empty or fully
/// filtered buffer gives an empty list.
pub fn sample_pixels(rgba: &[u8], quality: usize, sample_size: usize) -> Vec<Rgb> {
    let pixel_count = rgba.len() / 4;
    let step = sample_step(pixel_count, quality, sample_size);

    let mut samples = Vec::with_capacity(pixel_count / step + 1);
    for chunk in rgba.chunks_exact(4).step_by(step) {
        let (r, g, b, a) = (chunk[0], chunk[1], chunk[2], chunk[3]);
        if keep_pixel(r, g, b, a) {
            samples.push(Rgb::new(r, g, b));
        }
    }

    log::trace!(
        "sampled {} of {} pixels (step {})",
        samples.len(),
        pixel_count,
        step
    );
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(pixel: [u8; 4], count: usize) -> Vec<u8> {
        pixel.iter().copied().cycle().take(count * 4).collect()
    }

    #[test]
    fn step_never_drops_below_one() {
        assert_eq!(sample_step(100, 10, 10_000), 1);
        assert_eq!(sample_step(0, 10, 10_000), 1);
        assert_eq!(sample_step(40_000, 10, 10_000), 40);
        assert_eq!(sample_step(40_000, 1, 10_000), 4);
    }

    #[test]
    fn huge_quality_saturates_instead_of_overflowing() {
        assert_eq!(sample_step(20_000, usize::MAX, 10_000), usize::MAX);
        let buf = solid([40, 80, 120, 255], 20_000);
        assert_eq!(sample_pixels(&buf, usize::MAX, 10_000), vec![Rgb::new(40, 80, 120)]);
    }

    #[test]
    fn small_image_keeps_every_pixel() {
        let buf = solid([255, 0, 0, 255], 100);
        let samples = sample_pixels(&buf, 10, 10_000);
        assert_eq!(samples.len(), 100);
        assert!(samples.iter().all(|c| *c == Rgb::new(255, 0, 0)));
    }

    #[test]
    fn transparent_and_extreme_pixels_are_filtered() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[10, 20, 30, 124]); // too transparent
        buf.extend_from_slice(&[10, 20, 30, 125]); // just opaque enough
        buf.extend_from_slice(&[251, 251, 251, 255]); // near white
        buf.extend_from_slice(&[251, 250, 251, 255]); // one channel at the limit
        buf.extend_from_slice(&[4, 4, 4, 255]); // near black
        buf.extend_from_slice(&[4, 5, 4, 255]); // one channel at the limit

        let samples = sample_pixels(&buf, 10, 10_000);
        assert_eq!(
            samples,
            vec![
                Rgb::new(10, 20, 30),
                Rgb::new(251, 250, 251),
                Rgb::new(4, 5, 4)
            ]
        );
    }

    #[test]
    fn empty_buffer_gives_no_samples() {
        assert!(sample_pixels(&[], 10, 10_000).is_empty());
        assert!(sample_pixels(&solid([255, 255, 255, 255], 50), 10, 10_000).is_empty());
    }

    #[test]
    fn large_buffer_is_strided() {
        let buf = solid([40, 80, 120, 255], 2_000);
        // floor(2000 / 100) * 2 = 40
        let samples = sample_pixels(&buf, 2, 100);
        assert_eq!(samples.len(), 50);
    }
}

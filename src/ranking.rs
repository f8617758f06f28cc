//! Turn raw clusters into the ranked palette callers see.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::kmeans::Centroid;

/// One palette entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedColor {
    pub rgb: Rgb,
    /// Lowercase `#rrggbb`.
    pub hex: String,
    /// Samples assigned to this color.
    pub population: usize,
    /// Share of all assigned samples, 0–100.
    pub percentage: f64,
}

impl ExtractedColor {
    pub fn new(rgb: Rgb, population: usize, percentage: f64) -> Self {
        Self {
            hex: rgb.hex(),
            rgb,
            population,
            percentage,
        }
    }

    /// Frequency weighted toward vivid colors:
    /// `percentage * (0.7 + 0.3 * saturation)`.
    pub fn rank_score(&self) -> f64 {
        self.percentage * (0.7 + 0.3 * self.rgb.to_hsl().s)
    }
}

/// Rank clusters by saturation-weighted share, most prominent first.
///
/// Zero-population clusters are dropped. Equal scores keep cluster order.
pub fn rank_palette(centroids: &[Centroid]) -> Vec<ExtractedColor> {
    let total: usize = centroids.iter().map(|c| c.population).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f64, ExtractedColor)> = centroids
        .iter()
        .filter(|c| c.population > 0)
        .map(|c| {
            let percentage = c.population as f64 / total as f64 * 100.0;
            let color = ExtractedColor::new(c.color, c.population, percentage);
            (color.rank_score(), color)
        })
        .collect();

    scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));
    scored.into_iter().map(|(_, color)| color).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn centroid(r: u8, g: u8, b: u8, population: usize) -> Centroid {
        Centroid {
            color: Rgb::new(r, g, b),
            population,
        }
    }

    #[test]
    fn drops_empty_clusters_and_sums_to_hundred() {
        let palette = rank_palette(&[
            centroid(200, 30, 30, 3),
            centroid(128, 128, 128, 0),
            centroid(30, 30, 200, 1),
        ]);
        assert_eq!(palette.len(), 2);
        let sum: f64 = palette.iter().map(|c| c.percentage).sum();
        assert_relative_eq!(sum, 100.0, epsilon = 1e-9);
        assert_eq!(palette[0].hex, "#c81e1e");
        assert_relative_eq!(palette[0].percentage, 75.0);
    }

    #[test]
    fn vivid_color_outranks_slightly_more_frequent_gray() {
        // gray: 52% * 0.7 = 36.4; red: 48% * 1.0 = 48
        let palette = rank_palette(&[centroid(120, 120, 120, 52), centroid(255, 0, 0, 48)]);
        assert_eq!(palette[0].rgb, Rgb::new(255, 0, 0));
        assert_eq!(palette[1].rgb, Rgb::new(120, 120, 120));
    }

    #[test]
    fn equal_scores_keep_original_order() {
        let palette = rank_palette(&[centroid(90, 90, 90, 5), centroid(60, 60, 60, 5)]);
        assert_eq!(palette[0].rgb, Rgb::new(90, 90, 90));
        assert_eq!(palette[1].rgb, Rgb::new(60, 60, 60));
    }

    #[test]
    fn nothing_assigned_means_empty_palette() {
        assert!(rank_palette(&[]).is_empty());
        assert!(rank_palette(&[centroid(1, 2, 3, 0)]).is_empty());
    }
}

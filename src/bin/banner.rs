use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use image_banner_palette_wasm::loader::load_from_path;
use image_banner_palette_wasm::{
    ExtractionConfig, GradientDirection, derive_banner_colors, extract_palette_with_rng,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

/// Extract a color palette and accessible banner colors from images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of palette colors
    #[arg(short = 'k', long)]
    colors: Option<usize>,

    /// Sampling coarseness multiplier
    #[arg(short, long)]
    quality: Option<usize>,

    /// Upper bound on k-means iterations
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Target number of pixel samples
    #[arg(long)]
    sample_size: Option<usize>,

    /// Longest side images are reduced to before sampling
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Favor dark banner backgrounds
    #[arg(long)]
    prefer_dark: bool,

    /// Do not emit a gradient
    #[arg(long)]
    no_gradient: bool,

    /// Gradient direction: horizontal, vertical or diagonal
    #[arg(short, long)]
    direction: Option<GradientDirection>,

    /// Minimum text/background contrast ratio
    #[arg(long)]
    min_contrast: Option<f64>,

    /// Seed k-means++ for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn build_config(&self) -> Result<ExtractionConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractionConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ExtractionConfig::default(),
        };

        if let Some(k) = self.colors {
            config.palette.color_count = k;
        }
        if let Some(q) = self.quality {
            config.palette.quality = q;
        }
        if let Some(n) = self.max_iterations {
            config.palette.max_iterations = n;
        }
        if let Some(n) = self.sample_size {
            config.palette.sample_size = n;
        }
        if let Some(d) = self.max_dimension {
            config.max_dimension = d;
        }
        if self.prefer_dark {
            config.banner.prefer_dark = true;
        }
        if self.no_gradient {
            config.banner.use_gradient = false;
        }
        if let Some(d) = self.direction {
            config.banner.gradient_direction = d;
        }
        if let Some(c) = self.min_contrast {
            config.banner.min_contrast_ratio = c;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.build_config()?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    for input in &args.inputs {
        let buffer = load_from_path(input, config.max_dimension)
            .with_context(|| format!("reading {}", input.display()))?;
        let palette = extract_palette_with_rng(
            &buffer.pixels,
            buffer.width,
            buffer.height,
            &config.palette,
            &mut rng,
        )
        .context("palette extraction failed")?;
        let banner = derive_banner_colors(&palette, &config.banner)?;

        let contrast = banner.contrast();
        if contrast < config.banner.min_contrast_ratio {
            log::warn!(
                "{}: text contrast {:.2} is below the requested {:.2}",
                input.display(),
                contrast,
                config.banner.min_contrast_ratio
            );
        }

        let doc = json!({
            "input": input.display().to_string(),
            "width": buffer.width,
            "height": buffer.height,
            "palette": palette,
            "banner": banner,
            "contrast": contrast,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    }

    Ok(())
}

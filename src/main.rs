//! PixMix CLI
//!
//! Small command-line front-end for inspecting the augmentation pipeline:
//! render a before/after comparison for one image, or write a batch of
//! independently seeded variants.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use image::{imageops, DynamicImage, RgbImage};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use pixmix::logging::{init_logging, LogConfig};
use pixmix::{PixMix, PixMixConfig};

/// PixMix stochastic image augmentation
#[derive(Parser, Debug)]
#[command(name = "pixmix")]
#[command(version)]
#[command(about = "Mix training images with geometric distortions and an auxiliary corpus", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a side-by-side before/after comparison for one image
    Visualize {
        /// Input image path
        #[arg(short, long)]
        input: PathBuf,

        /// Directory of mixing images
        #[arg(short, long)]
        corpus: PathBuf,

        /// Maximum number of mixing rounds
        #[arg(short, long, default_value = "4")]
        k: u32,

        /// Blend strength in [0, 1]
        #[arg(short, long, default_value = "0.3")]
        beta: f32,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output path for the comparison image
        #[arg(short, long, default_value = "before_and_after.png")]
        output: PathBuf,
    },

    /// Write a batch of independently seeded variants of one image
    Sample {
        /// Input image path
        #[arg(short, long)]
        input: PathBuf,

        /// Directory of mixing images
        #[arg(short, long)]
        corpus: PathBuf,

        /// Maximum number of mixing rounds
        #[arg(short, long, default_value = "4")]
        k: u32,

        /// Blend strength in [0, 1]
        #[arg(short, long, default_value = "0.3")]
        beta: f32,

        /// Base RNG seed; variant i uses seed + i
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Number of variants to generate
        #[arg(short = 'n', long, default_value = "8")]
        count: u64,

        /// Output directory for the variants
        #[arg(short, long, default_value = "pixmix_samples")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config);

    match cli.command {
        Commands::Visualize {
            input,
            corpus,
            k,
            beta,
            seed,
            output,
        } => visualize(&input, &corpus, k, beta, seed, &output),
        Commands::Sample {
            input,
            corpus,
            k,
            beta,
            seed,
            count,
            output_dir,
        } => sample(&input, &corpus, k, beta, seed, count, &output_dir),
    }
}

fn build_pipeline(corpus: &PathBuf, k: u32, beta: f32) -> Result<PixMix> {
    let config = PixMixConfig::new(corpus).with_k(k).with_beta(beta);
    PixMix::new(config).context("failed to construct PixMix pipeline")
}

fn load_input(path: &PathBuf) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("failed to open input image {}", path.display()))
}

fn visualize(
    input: &PathBuf,
    corpus: &PathBuf,
    k: u32,
    beta: f32,
    seed: u64,
    output: &PathBuf,
) -> Result<()> {
    let pipeline = build_pipeline(corpus, k, beta)?;
    let img = load_input(input)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mixed = pipeline.apply(&img, &mut rng)?;

    // Original on the left, mixed variant on the right
    let original = img.to_rgb8();
    let (width, height) = original.dimensions();
    let mut canvas: RgbImage = RgbImage::new(width * 2, height);
    imageops::replace(&mut canvas, &original, 0, 0);
    imageops::replace(&mut canvas, &mixed, width as i64, 0);

    canvas
        .save(output)
        .with_context(|| format!("failed to save comparison to {}", output.display()))?;

    info!("Wrote comparison image to {:?}", output);
    println!(
        "{} {}",
        "Saved before/after comparison:".green().bold(),
        output.display()
    );
    Ok(())
}

fn sample(
    input: &PathBuf,
    corpus: &PathBuf,
    k: u32,
    beta: f32,
    seed: u64,
    count: u64,
    output_dir: &PathBuf,
) -> Result<()> {
    let pipeline = build_pipeline(corpus, k, beta)?;
    let img = load_input(input)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    for i in 0..count {
        let mut rng = ChaCha8Rng::seed_from_u64(seed + i);
        let mixed = pipeline.apply(&img, &mut rng)?;

        let path = output_dir.join(format!("variant_{:03}.png", i));
        mixed
            .save(&path)
            .with_context(|| format!("failed to save variant to {}", path.display()))?;
        info!("Wrote variant {} to {:?}", i, path);
    }

    println!(
        "{} {} variants in {}",
        "Generated".green().bold(),
        count,
        output_dir.display()
    );
    Ok(())
}

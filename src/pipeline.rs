//! PixMix Pipeline
//!
//! Orchestrates augmentation operators, blend operators, and the mixing
//! corpus into the PixMix compositing algorithm:
//!
//! 1. Start from either one fresh augmentation of the input or the input
//!    itself (50/50).
//! 2. Draw a round count `n` uniformly from [0, k].
//! 3. For each round, blend in either a fresh augmentation of the original
//!    or a freshly sampled corpus image (50/50), using a uniformly chosen
//!    blend operator at strength beta.
//!
//! A pipeline is constructed once and reused across many images; each call
//! is a pure function of the input image and the caller's RNG state, so
//! concurrent workers get independent streams by owning their own
//! `ChaCha8Rng`. The output always has the input's width and height and is
//! always 3-channel.

use image::{DynamicImage, RgbImage};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::PixMixConfig;
use crate::corpus::MixingCorpus;
use crate::error::{PixMixError, Result};

/// The PixMix augmentation pipeline
#[derive(Debug, Clone)]
pub struct PixMix {
    config: PixMixConfig,
    corpus: MixingCorpus,
}

impl PixMix {
    /// Build a pipeline from a validated configuration.
    ///
    /// The corpus directory is enumerated here, exactly once. When `k >= 1`
    /// a corpus draw is possible, so an empty corpus fails construction
    /// rather than surfacing mid-training.
    pub fn new(config: PixMixConfig) -> Result<Self> {
        config.validate()?;

        let corpus = MixingCorpus::new(&config.corpus_dir)?;
        if config.k >= 1 && corpus.is_empty() {
            return Err(PixMixError::CorpusEmpty(config.corpus_dir.clone()));
        }

        info!(
            "PixMix pipeline ready: k={}, beta={}, {} augment ops, {} mix ops, corpus of {} images",
            config.k,
            config.beta,
            config.augment_ops.len(),
            config.mix_ops.len(),
            corpus.len()
        );

        Ok(Self { config, corpus })
    }

    /// Convenience constructor with the default operator catalogs
    pub fn with_defaults<P: AsRef<std::path::Path>>(corpus_dir: P) -> Result<Self> {
        Self::new(PixMixConfig::new(corpus_dir))
    }

    /// The configuration this pipeline was built with
    pub fn config(&self) -> &PixMixConfig {
        &self.config
    }

    /// Apply one uniformly chosen augmentation operator to an image
    pub fn augment(&self, img: &RgbImage, rng: &mut ChaCha8Rng) -> RgbImage {
        let op = &self.config.augment_ops[rng.gen_range(0..self.config.augment_ops.len())];
        op.apply(img, rng)
    }

    /// Run the PixMix compositing algorithm on one input image.
    ///
    /// Accepts any supported raster mode; the output has identical width
    /// and height and a fixed 3-channel layout ready for tensor conversion.
    pub fn apply(&self, input: &DynamicImage, rng: &mut ChaCha8Rng) -> Result<RgbImage> {
        let xorig = input.to_rgb8();

        let mut xpixmix = if rng.gen_bool(0.5) {
            self.augment(&xorig, rng)
        } else {
            xorig.clone()
        };

        let rounds = rng.gen_range(0..=self.config.k);
        debug!("Mixing {} rounds", rounds);

        for _ in 0..rounds {
            let mix_source = if rng.gen_bool(0.5) {
                self.augment(&xorig, rng)
            } else {
                self.corpus.sample(rng)?
            };

            let op = self.config.mix_ops[rng.gen_range(0..self.config.mix_ops.len())];
            xpixmix = op.blend(&xpixmix, &mix_source, self.config.beta);
        }

        Ok(xpixmix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::AugmentOp;
    use image::{ImageBuffer, Rgb};
    use rand::SeedableRng;
    use std::path::Path;
    use tempfile::TempDir;

    fn gradient_input(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, 128])
        }))
    }

    fn write_solid(path: &Path, size: u32, value: u8) {
        let img: RgbImage = ImageBuffer::from_pixel(size, size, Rgb([value, value, value]));
        img.save(path).unwrap();
    }

    /// Corpus of one 32x32 black and one 32x32 white image
    fn black_white_corpus() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        write_solid(&temp_dir.path().join("black.png"), 32, 0);
        write_solid(&temp_dir.path().join("white.png"), 32, 255);
        temp_dir
    }

    #[test]
    fn test_shape_invariance() {
        let corpus = black_white_corpus();
        let pipeline = PixMix::with_defaults(corpus.path()).unwrap();

        for (w, h) in [(64, 64), (31, 47), (1, 1), (128, 16)] {
            let input = gradient_input(w, h);
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            let output = pipeline.apply(&input, &mut rng).unwrap();
            assert_eq!(output.dimensions(), (w, h));
        }
    }

    #[test]
    fn test_channel_invariance_for_alpha_inputs() {
        let corpus = black_white_corpus();
        let pipeline = PixMix::with_defaults(corpus.path()).unwrap();

        // RGBA input still comes out as 3-channel RGB of the same size
        let rgba = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
            24,
            24,
            image::Rgba([10, 20, 30, 128]),
        ));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let output = pipeline.apply(&rgba, &mut rng).unwrap();
        assert_eq!(output.dimensions(), (24, 24));
    }

    #[test]
    fn test_k_zero_never_touches_corpus() {
        // Empty corpus with k = 0 constructs fine and never errors on apply
        let temp_dir = TempDir::new().unwrap();
        let config = PixMixConfig::new(temp_dir.path()).with_k(0);
        let pipeline = PixMix::new(config).unwrap();

        let input = gradient_input(32, 32);
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let output = pipeline.apply(&input, &mut rng).unwrap();
            assert_eq!(output.dimensions(), (32, 32));
        }
    }

    #[test]
    fn test_empty_corpus_fails_construction_when_mixing_possible() {
        let temp_dir = TempDir::new().unwrap();

        for k in [1, 4] {
            let config = PixMixConfig::new(temp_dir.path()).with_k(k);
            let err = PixMix::new(config).unwrap_err();
            assert!(matches!(err, PixMixError::CorpusEmpty(_)));
        }
    }

    #[test]
    fn test_determinism_under_fixed_seed() {
        let corpus = black_white_corpus();
        let pipeline = PixMix::with_defaults(corpus.path()).unwrap();
        let input = gradient_input(48, 48);

        for seed in [0u64, 42, 1234] {
            let mut rng_a = ChaCha8Rng::seed_from_u64(seed);
            let mut rng_b = ChaCha8Rng::seed_from_u64(seed);

            let out_a = pipeline.apply(&input, &mut rng_a).unwrap();
            let out_b = pipeline.apply(&input, &mut rng_b).unwrap();

            assert_eq!(out_a.as_raw(), out_b.as_raw());
        }
    }

    #[test]
    fn test_identity_with_zero_probability_flips() {
        // Only flips at probability 0 and no mixing rounds: output must be
        // the unchanged input whichever branch step 1 takes
        let temp_dir = TempDir::new().unwrap();
        let config = PixMixConfig::new(temp_dir.path())
            .with_k(0)
            .with_augment_ops(vec![
                AugmentOp::HorizontalFlip { prob: 0.0 },
                AugmentOp::VerticalFlip { prob: 0.0 },
            ]);
        let pipeline = PixMix::new(config).unwrap();

        let input = gradient_input(20, 20);
        let expected = input.to_rgb8();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let output = pipeline.apply(&input, &mut rng).unwrap();
            assert_eq!(output.as_raw(), expected.as_raw());
        }
    }

    #[test]
    fn test_end_to_end_gradient_against_black_white_corpus() {
        let corpus = black_white_corpus();
        let config = PixMixConfig::new(corpus.path()).with_k(2).with_beta(0.5);
        let pipeline = PixMix::new(config).unwrap();

        let input = gradient_input(64, 64);
        for seed in 0..100 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let output = pipeline.apply(&input, &mut rng).unwrap();
            assert_eq!(output.dimensions(), (64, 64));
            // RgbImage is 3 bytes per pixel; u8 values are in [0, 255] by
            // construction
            assert_eq!(output.as_raw().len(), 64 * 64 * 3);
        }
    }

    #[test]
    fn test_pipeline_is_reusable_across_inputs() {
        let corpus = black_white_corpus();
        let pipeline = PixMix::with_defaults(corpus.path()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        let small = pipeline.apply(&gradient_input(16, 16), &mut rng).unwrap();
        let large = pipeline.apply(&gradient_input(80, 40), &mut rng).unwrap();

        assert_eq!(small.dimensions(), (16, 16));
        assert_eq!(large.dimensions(), (80, 40));
    }
}

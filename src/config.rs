//! Pipeline Configuration
//!
//! Holds the corpus location, mixing parameters, and the operator catalogs.
//! Configurations are serde-serializable so experiment setups can be stored
//! next to training runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::augment::AugmentOp;
use crate::blend::MixOp;
use crate::error::{PixMixError, Result};

/// Default maximum number of mixing rounds
pub const DEFAULT_K: u32 = 4;

/// Default blend strength
pub const DEFAULT_BETA: f32 = 0.3;

/// Configuration for the PixMix pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PixMixConfig {
    /// Directory of auxiliary images used for mixing
    pub corpus_dir: PathBuf,
    /// Maximum number of mixing rounds; each call draws uniformly from [0, k]
    pub k: u32,
    /// Blend strength, reused as the baseline alpha of every blend
    pub beta: f32,
    /// Augmentation operator catalog; one is drawn uniformly per augment
    pub augment_ops: Vec<AugmentOp>,
    /// Blend operator catalog; one is drawn uniformly per mixing round
    pub mix_ops: Vec<MixOp>,
}

impl PixMixConfig {
    /// Create a configuration with the default operator catalogs
    pub fn new<P: AsRef<Path>>(corpus_dir: P) -> Self {
        Self {
            corpus_dir: corpus_dir.as_ref().to_path_buf(),
            k: DEFAULT_K,
            beta: DEFAULT_BETA,
            augment_ops: Self::default_augment_ops(),
            mix_ops: Self::default_mix_ops(),
        }
    }

    /// Set the maximum number of mixing rounds
    pub fn with_k(mut self, k: u32) -> Self {
        self.k = k;
        self
    }

    /// Set the blend strength
    pub fn with_beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    /// Replace the augmentation operator catalog
    pub fn with_augment_ops(mut self, ops: Vec<AugmentOp>) -> Self {
        self.augment_ops = ops;
        self
    }

    /// Replace the blend operator catalog
    pub fn with_mix_ops(mut self, ops: Vec<MixOp>) -> Self {
        self.mix_ops = ops;
        self
    }

    /// Default augmentation catalog
    pub fn default_augment_ops() -> Vec<AugmentOp> {
        vec![
            AugmentOp::Rotate { max_degrees: 30.0 },
            AugmentOp::HorizontalFlip { prob: 0.5 },
            AugmentOp::VerticalFlip { prob: 0.5 },
            AugmentOp::Affine {
                max_degrees: 15.0,
                translate: (0.1, 0.1),
            },
            AugmentOp::Erase {
                prob: 0.5,
                ratio_range: (0.02, 0.33),
                fill: 0,
            },
            AugmentOp::Perspective { jitter: 0.25 },
        ]
    }

    /// Default blend catalog
    pub fn default_mix_ops() -> Vec<MixOp> {
        vec![MixOp::Alpha, MixOp::Adaptive]
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| PixMixError::Config(format!("invalid config JSON: {}", e)))
    }

    /// Check all construction-time invariants
    pub fn validate(&self) -> Result<()> {
        if self.augment_ops.is_empty() {
            return Err(PixMixError::Config(
                "augment_ops must not be empty".to_string(),
            ));
        }
        if self.mix_ops.is_empty() {
            return Err(PixMixError::Config("mix_ops must not be empty".to_string()));
        }
        if !self.beta.is_finite() || !(0.0..=1.0).contains(&self.beta) {
            return Err(PixMixError::Config(format!(
                "beta must be a finite value in [0, 1], got {}",
                self.beta
            )));
        }
        for op in &self.augment_ops {
            op.validate().map_err(PixMixError::Config)?;
        }
        if !self.corpus_dir.is_dir() {
            return Err(PixMixError::Config(format!(
                "corpus path is not a readable directory: {}",
                self.corpus_dir.display()
            )));
        }
        Ok(())
    }
}

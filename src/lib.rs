//! # PixMix
//!
//! A stochastic image-augmentation pipeline for enriching classifier
//! training data. PixMix composes geometric/occlusion distortions with
//! content-mixing against an auxiliary image corpus, producing diverse but
//! size-preserving variants of an input image.
//!
//! ## Modules
//!
//! - `augment`: geometry/occlusion operators (rotate, flips, affine, erase,
//!   perspective)
//! - `blend`: alpha and brightness-adaptive blend operators
//! - `corpus`: lazy provider over the auxiliary mixing-image directory
//! - `pipeline`: the randomized recursive mixing loop
//! - `config`: pipeline configuration and default operator catalogs
//! - `error`: error taxonomy
//! - `logging`: tracing-based logging setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pixmix::{PixMix, PixMixConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let pipeline = PixMix::new(PixMixConfig::new("data/fractals").with_k(4))?;
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//!
//! let input = image::open("data/sample.jpg")?;
//! let mixed = pipeline.apply(&input, &mut rng)?;
//! ```
//!
//! Every stochastic call takes an explicit `ChaCha8Rng`, so seeded runs are
//! byte-reproducible and concurrent workers own independent streams.

pub mod augment;
pub mod blend;
pub mod config;
pub mod corpus;
pub mod error;
pub mod logging;
pub mod pipeline;

// Re-export commonly used items for convenience
pub use augment::AugmentOp;
pub use blend::MixOp;
pub use config::{PixMixConfig, DEFAULT_BETA, DEFAULT_K};
pub use corpus::MixingCorpus;
pub use error::{PixMixError, Result};
pub use pipeline::PixMix;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

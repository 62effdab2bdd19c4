//! Mixing Corpus Provider
//!
//! Enumerates an auxiliary image directory once at construction, retaining
//! only file locations. Pixel data is decoded on demand when sampled and
//! never cached, so every sample is an independent copy safe to mutate and
//! memory stays bounded for large corpora.

use std::path::{Path, PathBuf};

use image::RgbImage;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{PixMixError, Result};

/// File extensions considered decodable corpus material
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Read-only collection of mixing-image locations
#[derive(Debug, Clone)]
pub struct MixingCorpus {
    /// Directory the corpus was enumerated from
    root_dir: PathBuf,
    /// Ordered list of image file locations, fixed for the corpus lifetime
    files: Vec<PathBuf>,
}

impl MixingCorpus {
    /// Enumerate a flat directory of raster files.
    ///
    /// The scan happens exactly once; only paths are retained. An empty
    /// result is not an error here — the pipeline decides whether a corpus
    /// draw can ever occur (`k >= 1`) and fails fast in that case.
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();

        if !root_dir.is_dir() {
            return Err(PixMixError::Config(format!(
                "corpus path is not a readable directory: {}",
                root_dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&root_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .filter(|p| is_image_file(p))
            .collect();
        files.sort();

        debug!("Enumerated {} corpus images in {:?}", files.len(), root_dir);

        Ok(Self { root_dir, files })
    }

    /// Number of enumerated image files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when the directory yielded no image files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Directory this corpus was built from
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Decode one uniformly chosen corpus image.
    ///
    /// Returns an owned 3-channel copy; nothing is cached across calls.
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> Result<RgbImage> {
        if self.files.is_empty() {
            return Err(PixMixError::CorpusEmpty(self.root_dir.clone()));
        }

        let path = &self.files[rng.gen_range(0..self.files.len())];
        let img = image::open(path)
            .map_err(|e| PixMixError::Decode(path.clone(), e.to_string()))?;

        Ok(img.to_rgb8())
    }
}

fn is_image_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use rand::SeedableRng;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_image(path: &Path, value: u8) {
        let img = ImageBuffer::from_pixel(10, 10, Rgb([value, value, value]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_enumeration_filters_non_images() {
        let temp_dir = TempDir::new().unwrap();
        create_test_image(&temp_dir.path().join("a.png"), 0);
        create_test_image(&temp_dir.path().join("b.jpg"), 255);
        fs::write(temp_dir.path().join("notes.txt"), "text").unwrap();

        let corpus = MixingCorpus::new(temp_dir.path()).unwrap();
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = MixingCorpus::new(temp_dir.path()).unwrap();
        assert!(corpus.is_empty());

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = corpus.sample(&mut rng).unwrap_err();
        assert!(matches!(err, PixMixError::CorpusEmpty(_)));
    }

    #[test]
    fn test_missing_directory_is_config_error() {
        let err = MixingCorpus::new("/nonexistent/corpus/dir").unwrap_err();
        assert!(matches!(err, PixMixError::Config(_)));
    }

    #[test]
    fn test_sample_returns_rgb_copy() {
        let temp_dir = TempDir::new().unwrap();
        create_test_image(&temp_dir.path().join("solid.png"), 42);

        let corpus = MixingCorpus::new(temp_dir.path()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let img = corpus.sample(&mut rng).unwrap();
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(img.get_pixel(5, 5).0, [42, 42, 42]);
    }

    #[test]
    fn test_undecodable_file_is_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("broken.png"), b"not a png").unwrap();

        let corpus = MixingCorpus::new(temp_dir.path()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let err = corpus.sample(&mut rng).unwrap_err();
        assert!(matches!(err, PixMixError::Decode(_, _)));
    }
}

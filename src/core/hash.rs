use clap::ValueEnum;
use image::{DynamicImage, ImageReader};
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Width and height of the hash grid; 8x8 gives a 64-bit hash.
pub const HASH_SIZE: u32 = 8;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to open {path}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// DCT-based perceptual hash
    #[default]
    #[value(name = "phash")]
    PHash,
    /// Average (mean) hash
    #[value(name = "ahash")]
    AHash,
    /// Difference (gradient) hash
    #[value(name = "dhash")]
    DHash,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::PHash => write!(f, "phash"),
            HashAlgorithm::AHash => write!(f, "ahash"),
            HashAlgorithm::DHash => write!(f, "dhash"),
        }
    }
}

/// Computes perceptual hashes of image files with a fixed algorithm.
pub struct PerceptualHasher {
    algorithm: HashAlgorithm,
    hasher: Hasher,
}

impl PerceptualHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let config = HasherConfig::new().hash_size(HASH_SIZE, HASH_SIZE);
        let config = match algorithm {
            HashAlgorithm::PHash => config.hash_alg(HashAlg::Mean).preproc_dct(),
            HashAlgorithm::AHash => config.hash_alg(HashAlg::Mean),
            HashAlgorithm::DHash => config.hash_alg(HashAlg::Gradient),
        };

        Self {
            algorithm,
            hasher: config.to_hasher(),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Open and decode `path`, then hash it.
    ///
    /// The format is sniffed from the file contents, so a PNG saved with a
    /// `.jpg` extension still decodes.
    pub fn hash_file(&self, path: &Path) -> Result<ImageHash, HashError> {
        let img = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| HashError::Open {
                path: path.display().to_string(),
                source,
            })?
            .decode()
            .map_err(|source| HashError::Decode {
                path: path.display().to_string(),
                source,
            })?;

        Ok(self.hash_image(&img))
    }

    pub fn hash_image(&self, img: &DynamicImage) -> ImageHash {
        self.hasher.hash_image(img)
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

/// Number of differing bits between two hashes.
pub fn distance(a: &ImageHash, b: &ImageHash) -> u32 {
    a.dist(b)
}

// src/fingerprint.rs

//! Asset fingerprinting
//!
//! A fingerprint is recomputed on demand and never cached: any mutation of
//! the file invalidates it, so callers re-fingerprint after every patch or
//! restore.

use crate::error::Result;
use crate::hash::{Hash, HashAlgorithm, hash_file};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Size and digest of a file at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetFingerprint {
    pub path: PathBuf,
    pub exists: bool,
    pub byte_size: u64,
    /// Absent when the file does not exist or digests are disabled
    pub content_digest: Option<Hash>,
}

impl AssetFingerprint {
    fn missing(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            exists: false,
            byte_size: 0,
            content_digest: None,
        }
    }
}

/// Computes fingerprints, optionally including a content digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprinter {
    digest: Option<HashAlgorithm>,
}

impl Fingerprinter {
    /// Fingerprint with a streamed digest
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            digest: Some(algorithm),
        }
    }

    /// Fingerprint with size only; classification never needs the digest
    pub fn size_only() -> Self {
        Self { digest: None }
    }

    /// Fingerprint `path`
    ///
    /// A missing path, or one that is not a regular file, yields
    /// `exists == false` rather than an error.
    pub fn fingerprint(&self, path: &Path) -> Result<AssetFingerprint> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(AssetFingerprint::missing(path));
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            debug!("{} is not a regular file", path.display());
            return Ok(AssetFingerprint::missing(path));
        }

        let content_digest = match self.digest {
            Some(algorithm) => Some(hash_file(algorithm, path)?),
            None => None,
        };

        Ok(AssetFingerprint {
            path: path.to_path_buf(),
            exists: true,
            byte_size: metadata.len(),
            content_digest,
        })
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

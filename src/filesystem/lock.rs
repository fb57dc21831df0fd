// src/filesystem/lock.rs

//! Per-asset advisory lock
//!
//! The patch engine assumes one transaction per asset at a time but does not
//! enforce it. Front ends take this lock around a patch or restore so two
//! processes cannot interleave on the same file.
//!
//! The lock lives in a sidecar file (`<asset>.lock`) held with
//! `flock(LOCK_EX)`. It is released when the guard is dropped.

use super::with_suffix;
use crate::error::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix of the lock sidecar
pub const LOCK_SUFFIX: &str = ".lock";

/// Exclusive lock on one asset path
pub struct AssetLock {
    file: File,
    path: PathBuf,
}

impl AssetLock {
    /// Try to lock `asset` without blocking
    ///
    /// Returns:
    /// - `Ok(Some(lock))` if the lock was acquired
    /// - `Ok(None)` if another process holds it
    /// - `Err` on I/O errors
    pub fn try_acquire(asset: &Path) -> Result<Option<Self>> {
        let path = with_suffix(asset, LOCK_SUFFIX);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired lock {}", path.display());
                Ok(Some(Self { file, path }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                debug!("Lock {} is held by another process", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the lock sidecar
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AssetLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("Released lock {}", self.path.display());
    }
}

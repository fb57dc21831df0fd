// src/filesystem/backup.rs

//! Sidecar backups of the asset
//!
//! Each asset has at most one backup, at the asset path with
//! [`BACKUP_SUFFIX`] appended. Overwriting an existing backup is never
//! silent: [`BackupManager::decide`] reports `NeedsAuthorization` and the
//! caller has to come back with [`BackupPolicy::OverwriteAuthorized`].

use super::{copy_atomic, with_suffix};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Suffix appended to the asset path to form the backup path
pub const BACKUP_SUFFIX: &str = ".backup";

/// What the caller permits when a backup already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupPolicy {
    /// Fail with `BackupAlreadyExists` if a backup is present
    #[default]
    RefuseOverwrite,
    /// The user confirmed replacing the existing backup
    OverwriteAuthorized,
}

/// Outcome of checking whether a backup may be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupDecision {
    /// No backup yet, or overwrite was authorized
    Proceed,
    /// A backup exists at this path; ask the user before overwriting
    NeedsAuthorization(PathBuf),
}

/// Creates, detects, and restores sidecar backups
#[derive(Debug, Clone, Copy, Default)]
pub struct BackupManager;

impl BackupManager {
    pub fn new() -> Self {
        Self
    }

    /// Backup location for `asset`
    pub fn backup_path(&self, asset: &Path) -> PathBuf {
        with_suffix(asset, BACKUP_SUFFIX)
    }

    /// Whether a backup exists for `asset`
    pub fn backup_exists(&self, asset: &Path) -> bool {
        self.backup_path(asset).is_file()
    }

    /// Decide whether a backup may be written; never blocks, never prompts
    pub fn decide(&self, asset: &Path, policy: BackupPolicy) -> BackupDecision {
        let backup = self.backup_path(asset);
        if backup.exists() && policy == BackupPolicy::RefuseOverwrite {
            BackupDecision::NeedsAuthorization(backup)
        } else {
            BackupDecision::Proceed
        }
    }

    /// Copy `asset` to its backup path
    ///
    /// Either the complete copy exists afterwards or the previous state
    /// (no backup, or the old backup) is left as it was.
    pub fn create_backup(&self, asset: &Path, policy: BackupPolicy) -> Result<PathBuf> {
        if let BackupDecision::NeedsAuthorization(existing) = self.decide(asset, policy) {
            return Err(Error::BackupAlreadyExists(existing));
        }

        if !asset.is_file() {
            return Err(Error::NotFound(asset.to_path_buf()));
        }

        let backup = self.backup_path(asset);
        info!("Creating backup: {}", backup.display());

        copy_atomic(asset, &backup).map_err(|e| {
            error!("Failed to create backup: {}", e);
            Error::BackupFailed {
                path: backup.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(backup)
    }

    /// Replace `asset` with the contents of its backup
    ///
    /// The backup is copied to a temp file beside the asset and renamed over
    /// it, so a failed copy never leaves the asset missing. The backup itself
    /// is kept; restore can be repeated.
    pub fn restore_backup(&self, asset: &Path) -> Result<u64> {
        let backup = self.backup_path(asset);
        if !backup.is_file() {
            return Err(Error::NoBackup(backup));
        }

        let restored = copy_atomic(&backup, asset).map_err(|e| {
            error!("Failed to restore backup: {}", e);
            Error::RestoreFailed {
                path: asset.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        info!("Restored from backup: {}", backup.display());
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn asset_with(temp: &TempDir, content: &[u8]) -> PathBuf {
        let path = temp.path().join("Fallout4.esm");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        let manager = BackupManager::new();
        assert_eq!(
            manager.backup_path(Path::new("Data/Fallout4.esm")),
            PathBuf::from("Data/Fallout4.esm.backup")
        );
    }

    #[test]
    fn test_create_backup_copies_asset() {
        let temp = TempDir::new().unwrap();
        let asset = asset_with(&temp, b"original esm bytes");
        let manager = BackupManager::new();

        assert!(!manager.backup_exists(&asset));
        let backup = manager
            .create_backup(&asset, BackupPolicy::RefuseOverwrite)
            .unwrap();

        assert!(manager.backup_exists(&asset));
        assert_eq!(fs::read(&backup).unwrap(), b"original esm bytes");
        assert_eq!(fs::read(&asset).unwrap(), b"original esm bytes");
    }

    #[test]
    fn test_existing_backup_needs_authorization() {
        let temp = TempDir::new().unwrap();
        let asset = asset_with(&temp, b"current");
        let manager = BackupManager::new();
        fs::write(manager.backup_path(&asset), b"older backup").unwrap();

        assert_eq!(
            manager.decide(&asset, BackupPolicy::RefuseOverwrite),
            BackupDecision::NeedsAuthorization(manager.backup_path(&asset))
        );
        let err = manager
            .create_backup(&asset, BackupPolicy::RefuseOverwrite)
            .unwrap_err();
        assert!(matches!(err, Error::BackupAlreadyExists(_)));

        // Neither file was touched
        assert_eq!(fs::read(&asset).unwrap(), b"current");
        assert_eq!(fs::read(manager.backup_path(&asset)).unwrap(), b"older backup");
    }

    #[test]
    fn test_authorized_overwrite_replaces_backup() {
        let temp = TempDir::new().unwrap();
        let asset = asset_with(&temp, b"current");
        let manager = BackupManager::new();
        fs::write(manager.backup_path(&asset), b"older backup").unwrap();

        assert_eq!(
            manager.decide(&asset, BackupPolicy::OverwriteAuthorized),
            BackupDecision::Proceed
        );
        manager
            .create_backup(&asset, BackupPolicy::OverwriteAuthorized)
            .unwrap();
        assert_eq!(fs::read(manager.backup_path(&asset)).unwrap(), b"current");
    }

    #[test]
    fn test_backup_of_missing_asset() {
        let temp = TempDir::new().unwrap();
        let asset = temp.path().join("Fallout4.esm");
        let err = BackupManager::new()
            .create_backup(&asset, BackupPolicy::RefuseOverwrite)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_restore_without_backup() {
        let temp = TempDir::new().unwrap();
        let asset = asset_with(&temp, b"current");

        let err = BackupManager::new().restore_backup(&asset).unwrap_err();
        assert!(matches!(err, Error::NoBackup(_)));
        assert_eq!(err.reason(), "no-backup");
        assert_eq!(fs::read(&asset).unwrap(), b"current");
    }

    #[test]
    fn test_restore_is_repeatable() {
        let temp = TempDir::new().unwrap();
        let asset = asset_with(&temp, b"pristine");
        let manager = BackupManager::new();
        manager
            .create_backup(&asset, BackupPolicy::RefuseOverwrite)
            .unwrap();

        fs::write(&asset, b"patched and broken").unwrap();
        manager.restore_backup(&asset).unwrap();
        assert_eq!(fs::read(&asset).unwrap(), b"pristine");
        assert!(manager.backup_exists(&asset));

        fs::write(&asset, b"broken again").unwrap();
        manager.restore_backup(&asset).unwrap();
        assert_eq!(fs::read(&asset).unwrap(), b"pristine");
        assert!(manager.backup_exists(&asset));
    }

    #[test]
    fn test_restore_recreates_deleted_asset() {
        let temp = TempDir::new().unwrap();
        let asset = asset_with(&temp, b"pristine");
        let manager = BackupManager::new();
        manager
            .create_backup(&asset, BackupPolicy::RefuseOverwrite)
            .unwrap();

        fs::remove_file(&asset).unwrap();
        assert_eq!(manager.restore_backup(&asset).unwrap(), 8);
        assert_eq!(fs::read(&asset).unwrap(), b"pristine");
    }
}

// src/commands/restore.rs
//! Restore command - put the sidecar backup back over the asset
//!
//! The backup is copied, not moved, so it survives the restore and can be
//! used again.

use super::{Context, Status, format_size, lock_asset};
use anyhow::Result;
use esmpatch::discovery::{ASSET_FILE_NAME, locate_in_folder};
use esmpatch::{BackupManager, VersionResolver};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn cmd_restore(_ctx: &Context, input: &Path) -> Result<Status> {
    let asset = restore_target(input);
    info!("Restoring {}", asset.display());

    let _lock = lock_asset(&asset)?;
    let restored = BackupManager::new().restore_backup(&asset)?;

    let version = VersionResolver::default().resolve_version(&asset)?;
    println!("Restored {} from backup.", asset.display());
    println!("Version: {}", version.display_label);
    println!("Size: {}", format_size(restored));
    Ok(Status::Done)
}

/// Asset path to restore, even when the asset itself is gone
///
/// A folder whose asset was deleted is still restorable if the backup sits
/// where the asset would be.
fn restore_target(input: &Path) -> PathBuf {
    if !input.is_dir() {
        return input.to_path_buf();
    }
    if let Some(found) = locate_in_folder(input) {
        return found;
    }

    let backups = BackupManager::new();
    [input.join(ASSET_FILE_NAME), input.join("Data").join(ASSET_FILE_NAME)]
        .into_iter()
        .find(|candidate| backups.backup_exists(candidate))
        .unwrap_or_else(|| input.join(ASSET_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_restore_target_finds_orphaned_backup() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("Data");
        fs::create_dir(&data).unwrap();
        fs::write(data.join("Fallout4.esm.backup"), b"original").unwrap();

        assert_eq!(restore_target(temp.path()), data.join(ASSET_FILE_NAME));
    }

    #[test]
    fn test_restore_target_prefers_existing_asset() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(ASSET_FILE_NAME), b"current").unwrap();

        assert_eq!(
            restore_target(temp.path()),
            temp.path().join(ASSET_FILE_NAME)
        );
        let file = temp.path().join(ASSET_FILE_NAME);
        assert_eq!(restore_target(&file), file);
    }
}

// src/filesystem/mod.rs

//! Filesystem operations for asset patching
//!
//! This module provides:
//! - Sidecar backups of the asset (create, detect, restore)
//! - Atomic copy: write to a temp file next to the destination, then rename
//! - Atomic move with a copy fallback for cross-filesystem renames
//! - An advisory per-asset lock for front ends

mod backup;
mod lock;

pub use backup::{BACKUP_SUFFIX, BackupDecision, BackupManager, BackupPolicy};
pub use lock::{AssetLock, LOCK_SUFFIX};

use filetime::FileTime;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Copy `src` to `dst` so that `dst` is either the complete copy or untouched
///
/// The content is streamed into a temp file in `dst`'s directory, given
/// `src`'s timestamps and permissions, synced, and renamed over `dst`.
/// Returns bytes copied.
pub fn copy_atomic(src: &Path, dst: &Path) -> io::Result<u64> {
    let parent = match dst.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let metadata = fs::metadata(src)?;
    let mut reader = File::open(src)?;

    let temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name))
        .suffix(".tmp")
        .tempfile_in(parent)?;

    let copied = {
        let mut writer = BufWriter::new(temp.as_file());
        let n = io::copy(&mut reader, &mut writer)?;
        writer.flush()?;
        n
    };
    let atime = FileTime::from_last_access_time(&metadata);
    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_handle_times(temp.as_file(), Some(atime), Some(mtime))?;
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), metadata.permissions())?;

    // Nothing after the rename may fail the copy
    persist(temp, dst)?;
    sync_parent(dst);
    debug!("Copied {} -> {} ({} bytes)", src.display(), dst.display(), copied);
    Ok(copied)
}

fn persist(temp: NamedTempFile, dst: &Path) -> io::Result<()> {
    temp.persist(dst).map(|_| ()).map_err(|e| e.error)
}

/// Move a file atomically, falling back to copy+sync+delete for cross-filesystem moves.
///
/// Renaming replaces `dst` if it exists, so the destination is never absent
/// on the same-filesystem path.
pub fn move_file_atomic(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => {
            sync_parent(dst);
            Ok(())
        }
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            debug!(
                "Cross-filesystem move detected ({} -> {}), using copy fallback",
                src.display(),
                dst.display()
            );
            copy_atomic(src, dst)?;
            fs::remove_file(src)?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Remove a file if present; absence is success
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Append a suffix to the final path component ("a.esm" + ".backup")
pub fn with_suffix(path: &Path, suffix: &str) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    os.into()
}

fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        // Not all platforms allow fsync on a directory handle
        let _ = dir.sync_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_atomic_preserves_content_and_mtime() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("source.bin");
        let dst = temp.path().join("dest.bin");

        let content: Vec<u8> = (0..=255).cycle().take(200_000).collect();
        fs::write(&src, &content).unwrap();
        let old = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, old).unwrap();

        let copied = copy_atomic(&src, &dst).unwrap();

        assert_eq!(copied, content.len() as u64);
        assert_eq!(fs::read(&dst).unwrap(), content);
        let meta = fs::metadata(&dst).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), old);
        assert!(src.exists());
    }

    #[test]
    fn test_copy_atomic_lands_with_source_times() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("Fallout4.esm");
        let dst = temp.path().join("Fallout4.esm.backup");
        fs::write(&src, b"esm").unwrap();
        let atime = FileTime::from_unix_time(1_500_000_000, 0);
        let mtime = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_times(&src, atime, mtime).unwrap();

        copy_atomic(&src, &dst).unwrap();

        // Checked before reading dst, which could bump its atime
        let meta = fs::metadata(&dst).unwrap();
        assert_eq!(FileTime::from_last_access_time(&meta), atime);
        assert_eq!(FileTime::from_last_modification_time(&meta), mtime);
        // Only the source and the copy; no temp file
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_copy_atomic_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("new");
        let dst = temp.path().join("old");
        fs::write(&src, b"replacement").unwrap();
        fs::write(&dst, b"original content").unwrap();

        copy_atomic(&src, &dst).unwrap();

        assert_eq!(fs::read(&dst).unwrap(), b"replacement");
        // No temp files left behind
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_copy_atomic_missing_source_leaves_destination() {
        let temp = TempDir::new().unwrap();
        let dst = temp.path().join("dest");
        fs::write(&dst, b"keep me").unwrap();

        assert!(copy_atomic(&temp.path().join("nope"), &dst).is_err());
        assert_eq!(fs::read(&dst).unwrap(), b"keep me");
    }

    #[test]
    fn test_move_file_atomic_same_fs() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("source.txt");
        let dst = temp.path().join("dest.txt");
        fs::write(&src, "new").unwrap();
        fs::write(&dst, "old").unwrap();

        move_file_atomic(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "new");
    }

    #[test]
    fn test_remove_if_exists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file");
        assert!(!remove_if_exists(&path).unwrap());
        fs::write(&path, b"x").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("/games/Data/Fallout4.esm"), ".backup"),
            Path::new("/games/Data/Fallout4.esm.backup")
        );
    }
}

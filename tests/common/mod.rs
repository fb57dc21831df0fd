// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use esmpatch::{AssetStore, DeltaTool, Error, PatcherConfig, Result, VersionRegistry};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Exact sizes from the version registry
pub const NEXTGEN_SIZE: u64 = 330_777_465;
pub const VR_SIZE: u64 = 330_553_163;
pub const OLDGEN_SIZE: u64 = 330_745_373;

/// Create a sparse file of `size` bytes; nothing is written to disk
pub fn sized_file(dir: &Path, name: &str, size: u64) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    file.set_len(size).unwrap();
    path
}

/// Create a file with the given content
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Assets directory holding every registry patch file and a tool placeholder
///
/// Returns (TempDir, store) - keep the TempDir alive to prevent cleanup.
pub fn populated_assets() -> (TempDir, AssetStore) {
    let temp = tempfile::tempdir().unwrap();
    let tool = write_file(temp.path(), "xdelta3", b"");
    for artifact in VersionRegistry::builtin().artifacts() {
        write_file(temp.path(), artifact.file_name(), b"+delta");
    }
    let store = AssetStore::new(temp.path(), tool);
    (temp, store)
}

/// Config with a small output threshold so tests can use tiny files
pub fn test_config(assets: &AssetStore, min_output_size: u64) -> PatcherConfig {
    PatcherConfig {
        assets_dir: assets.root().to_path_buf(),
        min_output_size,
        ..PatcherConfig::default()
    }
}

/// In-process delta tool
///
/// Writes `source ++ patch` to the output, or fails after writing a partial
/// output, the way a crashing tool would.
pub struct ConcatTool {
    pub exit_code: Option<i32>,
}

impl ConcatTool {
    pub fn succeeding() -> Self {
        Self { exit_code: None }
    }

    pub fn failing(code: i32) -> Self {
        Self {
            exit_code: Some(code),
        }
    }
}

impl DeltaTool for ConcatTool {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(&self, source: &Path, patch: &Path, output: &Path, _timeout: Duration) -> Result<()> {
        if let Some(code) = self.exit_code {
            fs::write(output, b"partial")?;
            return Err(Error::ExternalToolFailed {
                tool: "concat".to_string(),
                code: Some(code),
                diagnostics: "xdelta3: checksum mismatch".to_string(),
            });
        }
        let mut content = fs::read(source)?;
        content.extend(fs::read(patch)?);
        fs::write(output, content)?;
        Ok(())
    }
}

/// Executable shell script standing in for xdelta3
#[cfg(unix)]
pub fn fake_xdelta3(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("xdelta3");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Files in `dir` whose names end with `suffix`
pub fn files_with_suffix(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.to_string_lossy().ends_with(suffix))
        .collect()
}

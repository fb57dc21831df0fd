// src/version/resolver.rs

//! Version resolution for asset paths
//!
//! Every call re-fingerprints the file. The asset can be replaced between
//! analysis and patching (a user copying in a different build, a mod manager
//! restoring a file), so results are never cached.

use super::{PatchArtifactRef, VersionIdentity, VersionRegistry, group_digits, mebibytes};
use crate::error::{Error, Result};
use crate::fingerprint::{AssetFingerprint, Fingerprinter};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// How a file was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Exact registry match
    Known,
    /// Near a migrated reference size; nothing left to do
    Migrated,
    /// Matches nothing; no targets
    Unknown,
    /// The path does not exist
    Missing,
}

/// Everything a caller needs to render a file's version state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub fingerprint: AssetFingerprint,
    pub classification: Classification,
    /// `None` for unknown or missing files
    pub identity: Option<VersionIdentity>,
    pub display_label: String,
    pub available_targets: Vec<VersionIdentity>,
    pub transitions: BTreeMap<VersionIdentity, PatchArtifactRef>,
}

impl VersionInfo {
    pub fn exists(&self) -> bool {
        self.fingerprint.exists
    }

    pub fn byte_size(&self) -> u64 {
        self.fingerprint.byte_size
    }

    /// True when the file is present but no patch applies to it
    pub fn nothing_to_do(&self) -> bool {
        self.exists() && self.available_targets.is_empty()
    }

    /// The single available target, when there is exactly one
    pub fn sole_target(&self) -> Option<VersionIdentity> {
        match self.available_targets.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

/// A resolved source -> target transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchPlan {
    pub source: VersionIdentity,
    pub target: VersionIdentity,
    pub artifact: PatchArtifactRef,
    /// e.g. "Next-Gen → 1.10.163"
    pub description: String,
}

/// Resolves file versions against the built-in registry
#[derive(Debug, Clone, Copy)]
pub struct VersionResolver {
    registry: &'static VersionRegistry,
    fingerprinter: Fingerprinter,
}

impl VersionResolver {
    /// Resolver using `fingerprinter` for every lookup
    pub fn new(fingerprinter: Fingerprinter) -> Self {
        Self {
            registry: VersionRegistry::builtin(),
            fingerprinter,
        }
    }

    /// Classify the file at `path`
    pub fn resolve_version(&self, path: &Path) -> Result<VersionInfo> {
        let fingerprint = self.fingerprinter.fingerprint(path)?;
        Ok(self.classify(fingerprint))
    }

    /// Classify an already computed fingerprint
    pub fn classify(&self, fingerprint: AssetFingerprint) -> VersionInfo {
        if !fingerprint.exists {
            return VersionInfo {
                fingerprint,
                classification: Classification::Missing,
                identity: None,
                display_label: "File does not exist".to_string(),
                available_targets: Vec::new(),
                transitions: BTreeMap::new(),
            };
        }

        let size = fingerprint.byte_size;

        if let Some(record) = self.registry.lookup(size) {
            debug!("{} bytes matches {}", size, record.identity);
            return VersionInfo {
                fingerprint,
                classification: Classification::Known,
                identity: Some(record.identity),
                display_label: record.display_label.to_string(),
                available_targets: record.targets(),
                transitions: record.transitions.clone(),
            };
        }

        if let Some(label) = self.registry.migrated_label(size) {
            debug!("{} bytes is within tolerance of a migrated size", size);
            return VersionInfo {
                fingerprint,
                classification: Classification::Migrated,
                identity: Some(VersionIdentity::Patched),
                display_label: label.to_string(),
                available_targets: Vec::new(),
                transitions: BTreeMap::new(),
            };
        }

        debug!("{} bytes matches no known version", size);
        VersionInfo {
            fingerprint,
            classification: Classification::Unknown,
            identity: None,
            display_label: format!(
                "Unknown version ({} bytes / {:.2} MB)",
                group_digits(size),
                mebibytes(size)
            ),
            available_targets: Vec::new(),
            transitions: BTreeMap::new(),
        }
    }

    /// Patch artifact converting the current file to `target`
    ///
    /// Re-resolves the file first. `None` means `target` is not a transition
    /// of whatever is on disk right now.
    pub fn resolve_patch_for(
        &self,
        path: &Path,
        target: VersionIdentity,
    ) -> Result<Option<PatchPlan>> {
        let info = self.resolve_version(path)?;
        Ok(plan_from(&info, target))
    }

    /// Like [`resolve_patch_for`](Self::resolve_patch_for), but absence is an error
    pub fn require_patch_for(&self, path: &Path, target: VersionIdentity) -> Result<PatchPlan> {
        let info = self.resolve_version(path)?;
        if !info.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        plan_from(&info, target).ok_or_else(|| Error::NoTransitionAvailable {
            from: info.display_label.clone(),
            target: target.to_string(),
        })
    }
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new(Fingerprinter::size_only())
    }
}

fn plan_from(info: &VersionInfo, target: VersionIdentity) -> Option<PatchPlan> {
    let source = info.identity?;
    let artifact = info.transitions.get(&target)?.clone();
    Some(PatchPlan {
        source,
        target,
        artifact,
        description: format!("{} → {}", info.display_label, target),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Sparse file of the given size; no data is written
    fn sized_file(dir: &TempDir, size: u64) -> PathBuf {
        let path = dir.path().join("Fallout4.esm");
        let file = File::create(&path).unwrap();
        file.set_len(size).unwrap();
        path
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let info = VersionResolver::default()
            .resolve_version(&temp.path().join("Fallout4.esm"))
            .unwrap();

        assert_eq!(info.classification, Classification::Missing);
        assert_eq!(info.display_label, "File does not exist");
        assert!(!info.exists());
        assert!(!info.nothing_to_do());
        assert!(info.available_targets.is_empty());
    }

    #[test]
    fn test_unknown_label_carries_size() {
        let temp = TempDir::new().unwrap();
        let path = sized_file(&temp, 1_234_567);

        let info = VersionResolver::default().resolve_version(&path).unwrap();
        assert_eq!(info.classification, Classification::Unknown);
        assert_eq!(info.identity, None);
        assert_eq!(info.display_label, "Unknown version (1,234,567 bytes / 1.18 MB)");
        assert!(info.nothing_to_do());
    }

    #[test]
    fn test_plan_description() {
        let temp = TempDir::new().unwrap();
        let path = sized_file(&temp, 330_777_465);

        let plan = VersionResolver::default()
            .resolve_patch_for(&path, VersionIdentity::OldGen)
            .unwrap()
            .unwrap();
        assert_eq!(plan.source, VersionIdentity::NextGen);
        assert_eq!(plan.artifact.file_name(), "fallout4_323025.xdelta");
        assert_eq!(plan.description, "Next-Gen → 1.10.163");
    }

    #[test]
    fn test_resolution_follows_file_changes() {
        let temp = TempDir::new().unwrap();
        let path = sized_file(&temp, 330_777_465);
        let resolver = VersionResolver::default();

        assert!(resolver
            .resolve_patch_for(&path, VersionIdentity::OldGen)
            .unwrap()
            .is_some());

        // Swap in the Old-Gen build behind the resolver's back
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(330_745_373)
            .unwrap();

        assert!(resolver
            .resolve_patch_for(&path, VersionIdentity::OldGen)
            .unwrap()
            .is_none());
        assert!(resolver
            .resolve_patch_for(&path, VersionIdentity::NextGen)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_require_patch_errors() {
        let temp = TempDir::new().unwrap();
        let resolver = VersionResolver::default();

        let missing = temp.path().join("missing.esm");
        assert!(matches!(
            resolver.require_patch_for(&missing, VersionIdentity::NextGen),
            Err(Error::NotFound(_))
        ));

        let path = sized_file(&temp, 330_745_373);
        match resolver.require_patch_for(&path, VersionIdentity::OldGen) {
            Err(Error::NoTransitionAvailable { from, target }) => {
                assert_eq!(from, "1.10.163 (Old-Gen)");
                assert_eq!(target, "1.10.163");
            }
            other => panic!("Expected NoTransitionAvailable, got {:?}", other),
        }
    }
}

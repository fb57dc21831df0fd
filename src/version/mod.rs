// src/version/mod.rs

//! Version registry for Fallout4.esm builds
//!
//! Builds of the master file are identified purely by their exact byte size.
//! The registry is the compatibility matrix: it maps each known size to a
//! version identity and the patch artifacts that convert it to other
//! versions. It is built once per process and never mutated.
//!
//! Two different files of identical size are indistinguishable here. That is
//! an accepted limitation; the post-patch size check is the only backstop.

mod resolver;

pub use resolver::{Classification, PatchPlan, VersionInfo, VersionResolver};

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Which build of the asset is present
///
/// Declaration order is the order targets are listed in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
)]
pub enum VersionIdentity {
    /// Pre Next-Gen release, compatible with VR-era plugins
    #[strum(serialize = "1.10.163")]
    #[serde(rename = "1.10.163")]
    OldGen,
    /// Next-Gen update
    #[strum(serialize = "nextgen")]
    #[serde(rename = "nextgen")]
    NextGen,
    /// Fallout 4 VR
    #[strum(serialize = "vr")]
    #[serde(rename = "vr")]
    Vr,
    /// Already converted by a previous patch
    #[strum(serialize = "patched")]
    #[serde(rename = "patched")]
    Patched,
}

impl VersionIdentity {
    /// Stable tag used on the command line and in JSON output
    pub fn tag(&self) -> &'static str {
        self.into()
    }
}

/// Name of a patch file in the assets directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PatchArtifactRef(String);

impl PatchArtifactRef {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self(file_name.into())
    }

    /// File name relative to the assets directory
    pub fn file_name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatchArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    pub byte_size: u64,
    pub identity: VersionIdentity,
    pub display_label: &'static str,
    pub transitions: BTreeMap<VersionIdentity, PatchArtifactRef>,
}

impl VersionRecord {
    /// Targets this version can be patched to
    pub fn targets(&self) -> Vec<VersionIdentity> {
        self.transitions.keys().copied().collect()
    }

    /// Patch artifact for `target`, if that transition exists
    pub fn patch_for(&self, target: VersionIdentity) -> Option<&PatchArtifactRef> {
        self.transitions.get(&target)
    }
}

/// Sizes within this many bytes of a migrated reference size get its label
pub const MIGRATED_TOLERANCE: u64 = 1000;

/// Reference sizes of files already converted by a patch
pub const MIGRATED_SIZES: &[(u64, &str)] = &[
    (61_741_779, "VR-compatible version (58.9 MB)"),
    (61_598_851, "VR-compatible version (58.7 MB)"),
];

/// Exact-size table: (size, identity, label, [(target, patch file)])
const KNOWN_VERSIONS: &[(u64, VersionIdentity, &str, &[(VersionIdentity, &str)])] = &[
    (
        330_777_465,
        VersionIdentity::NextGen,
        "Next-Gen",
        &[(VersionIdentity::OldGen, "fallout4_323025.xdelta")],
    ),
    (
        330_553_163,
        VersionIdentity::Vr,
        "Fallout 4 VR",
        &[
            (VersionIdentity::OldGen, "fallout4_322806.xdelta"),
            (VersionIdentity::NextGen, "fallout4_vr_to_ng.xdelta"),
        ],
    ),
    (
        330_745_373,
        VersionIdentity::OldGen,
        "1.10.163 (Old-Gen)",
        &[(VersionIdentity::NextGen, "fallout4_old_to_ng.xdelta")],
    ),
];

static REGISTRY: LazyLock<VersionRegistry> = LazyLock::new(|| {
    let records = KNOWN_VERSIONS
        .iter()
        .map(|&(byte_size, identity, display_label, transitions)| {
            let transitions = transitions
                .iter()
                .map(|&(target, file)| (target, PatchArtifactRef::new(file)))
                .collect();
            (
                byte_size,
                VersionRecord {
                    byte_size,
                    identity,
                    display_label,
                    transitions,
                },
            )
        })
        .collect();
    VersionRegistry { records }
});

/// Size-keyed table of known asset versions
#[derive(Debug)]
pub struct VersionRegistry {
    records: HashMap<u64, VersionRecord>,
}

impl VersionRegistry {
    /// The process-wide registry
    pub fn builtin() -> &'static VersionRegistry {
        &REGISTRY
    }

    /// Exact-size lookup; `None` means an unknown version, not a failure
    pub fn lookup(&self, byte_size: u64) -> Option<&VersionRecord> {
        self.records.get(&byte_size)
    }

    /// Label of the migrated reference size `byte_size` falls near, if any
    pub fn migrated_label(&self, byte_size: u64) -> Option<&'static str> {
        MIGRATED_SIZES
            .iter()
            .find(|(size, _)| byte_size.abs_diff(*size) < MIGRATED_TOLERANCE)
            .map(|(_, label)| *label)
    }

    /// All records, ordered by size
    pub fn records(&self) -> Vec<&VersionRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by_key(|r| r.byte_size);
        records
    }

    /// Every distinct patch file referenced by the registry, sorted
    pub fn artifacts(&self) -> Vec<&PatchArtifactRef> {
        let mut artifacts: Vec<_> = self
            .records
            .values()
            .flat_map(|r| r.transitions.values())
            .collect();
        artifacts.sort_by(|a, b| a.file_name().cmp(b.file_name()));
        artifacts.dedup();
        artifacts
    }
}

/// Render a byte count with thousands separators ("330,777,465")
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Bytes to mebibytes
pub fn mebibytes(n: u64) -> f64 {
    n as f64 / (1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_lookup_exact_sizes() {
        let registry = VersionRegistry::builtin();

        let ng = registry.lookup(330_777_465).unwrap();
        assert_eq!(ng.identity, VersionIdentity::NextGen);
        assert_eq!(ng.display_label, "Next-Gen");
        assert_eq!(
            ng.patch_for(VersionIdentity::OldGen).unwrap().file_name(),
            "fallout4_323025.xdelta"
        );

        assert!(registry.lookup(330_777_466).is_none());
        assert!(registry.lookup(0).is_none());
    }

    #[test]
    fn test_vr_targets_are_ordered() {
        let vr = VersionRegistry::builtin().lookup(330_553_163).unwrap();
        assert_eq!(
            vr.targets(),
            vec![VersionIdentity::OldGen, VersionIdentity::NextGen]
        );
    }

    #[test]
    fn test_no_version_transitions_to_itself() {
        for record in VersionRegistry::builtin().records() {
            assert!(!record.transitions.contains_key(&record.identity));
        }
    }

    #[test]
    fn test_migrated_tolerance_is_exclusive() {
        let registry = VersionRegistry::builtin();
        assert_eq!(
            registry.migrated_label(61_741_779),
            Some("VR-compatible version (58.9 MB)")
        );
        assert_eq!(
            registry.migrated_label(61_741_779 + 999),
            Some("VR-compatible version (58.9 MB)")
        );
        assert_eq!(
            registry.migrated_label(61_598_851 - 999),
            Some("VR-compatible version (58.7 MB)")
        );
        assert_eq!(registry.migrated_label(61_741_779 + 1000), None);
        assert_eq!(registry.migrated_label(61_598_851 - 1000), None);
    }

    #[test]
    fn test_artifacts_are_distinct() {
        let names: Vec<_> = VersionRegistry::builtin()
            .artifacts()
            .into_iter()
            .map(|a| a.file_name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "fallout4_322806.xdelta",
                "fallout4_323025.xdelta",
                "fallout4_old_to_ng.xdelta",
                "fallout4_vr_to_ng.xdelta",
            ]
        );
    }

    #[test]
    fn test_identity_tags_round_trip() {
        for identity in VersionIdentity::iter() {
            let parsed: VersionIdentity = identity.tag().parse().unwrap();
            assert_eq!(parsed, identity);
            assert_eq!(identity.to_string(), identity.tag());
        }
        assert!("1.10.162".parse::<VersionIdentity>().is_err());
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(330_777_465), "330,777,465");
    }
}

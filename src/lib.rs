// src/lib.rs

//! esmpatch: Fallout4.esm version resolver and patch engine
//!
//! Converts the game's master file between the Next-Gen, Old-Gen (1.10.163)
//! and VR builds by applying xdelta3 patches.
//!
//! # Architecture
//!
//! - Registry: static size-keyed table of known builds and their transitions
//! - Resolver: fingerprint a file, classify it, pick a patch artifact
//! - Transactions: backup -> apply -> verify -> commit, with the asset never
//!   left half-written
//! - Delta tool: xdelta3 behind a trait, run as a subprocess with a timeout

pub mod config;
pub mod delta;
pub mod discovery;
mod error;
pub mod filesystem;
pub mod fingerprint;
pub mod hash;
pub mod progress;
pub mod transaction;
pub mod version;

pub use config::{AssetStore, PatcherConfig};
pub use delta::{DeltaTool, Xdelta3Tool};
pub use error::{Error, ErrorKind, Result};
pub use filesystem::{BackupDecision, BackupManager, BackupPolicy};
pub use fingerprint::{AssetFingerprint, Fingerprinter};
pub use hash::{Hash, HashAlgorithm, Hasher};
pub use progress::{CallbackProgress, LogProgress, ProgressEvent, ProgressTracker, SilentProgress};
pub use transaction::{PatchCoordinator, PatchOptions, PatchOutcome, PatchPhase, PatchTransaction};
pub use version::{
    Classification, PatchArtifactRef, PatchPlan, VersionIdentity, VersionInfo, VersionRecord,
    VersionRegistry, VersionResolver,
};

// src/transaction/mod.rs

//! Transactional patch application
//!
//! A patch transaction replaces the asset with its patched version such that
//! the asset is either the untouched original or the complete, verified
//! patched file. There is no window where a half-written asset sits at the
//! asset path.
//!
//! # Transaction Lifecycle
//!
//! ```text
//! IDLE -> BACKING_UP -> APPLYING -> VERIFYING -> COMMITTING -> SUCCEEDED
//!             |             |            |             |
//!             +-------------+------------+-------------+--> FAILED / ROLLED_BACK
//! ```
//!
//! Every failure before `COMMITTING` leaves the asset byte-identical to the
//! original. A failure during `COMMITTING` is a `ReplacementFailed` error,
//! the only outcome that calls for an immediate restore. Restore is never
//! performed automatically.
//!
//! Cancellation is cooperative: the cancel flag is checked before each phase
//! starts, and a cancelled transaction ends `RolledBack` with the asset
//! untouched and any temp output removed.

mod coordinator;

pub use coordinator::PatchCoordinator;

use crate::error::Result;
use crate::filesystem::with_suffix;
use crate::fingerprint::AssetFingerprint;
use crate::progress::ProgressTracker;
use crate::version::{PatchArtifactRef, PatchPlan};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use strum_macros::{Display, IntoStaticStr};
use tracing::debug;

/// Suffix of the temp output written by the delta tool
pub const PATCHED_SUFFIX: &str = ".patched";

/// Transaction state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PatchPhase {
    /// Created, nothing touched
    Idle,
    /// Copying the asset to its backup
    BackingUp,
    /// Delta tool running into the temp output
    Applying,
    /// Checking the temp output
    Verifying,
    /// Renaming the temp output over the asset
    Committing,
    /// Asset replaced with the verified output
    Succeeded,
    /// Cancelled at a checkpoint; asset untouched
    RolledBack,
    /// Stopped on an error
    Failed,
}

impl PatchPhase {
    /// Advisory progress percentage reported on entering this phase
    pub fn progress_percent(&self) -> Option<u64> {
        match self {
            Self::Idle => Some(0),
            Self::BackingUp => Some(10),
            Self::Applying => Some(30),
            Self::Verifying => Some(70),
            Self::Committing => Some(90),
            Self::Succeeded => Some(100),
            Self::RolledBack | Self::Failed => None,
        }
    }

    /// Human-readable status line for this phase
    pub fn message(&self) -> &'static str {
        match self {
            Self::Idle => "Preparing...",
            Self::BackingUp => "Creating backup...",
            Self::Applying => "Applying patch...",
            Self::Verifying => "Verifying patched file...",
            Self::Committing => "Replacing original file...",
            Self::Succeeded => "Complete!",
            Self::RolledBack => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::RolledBack | Self::Failed)
    }
}

/// Transient state of one patch application
///
/// Lives for the duration of a single apply call and is never persisted.
#[derive(Debug, Clone)]
pub struct PatchTransaction {
    asset_path: PathBuf,
    backup_path: PathBuf,
    temp_path: PathBuf,
    artifact: PatchArtifactRef,
    phase: PatchPhase,
}

impl PatchTransaction {
    pub fn new(asset_path: &Path, artifact: PatchArtifactRef) -> Self {
        Self {
            asset_path: asset_path.to_path_buf(),
            backup_path: with_suffix(asset_path, crate::filesystem::BACKUP_SUFFIX),
            temp_path: with_suffix(asset_path, PATCHED_SUFFIX),
            artifact,
            phase: PatchPhase::Idle,
        }
    }

    pub fn asset_path(&self) -> &Path {
        &self.asset_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Where the delta tool writes before the output is verified
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn artifact(&self) -> &PatchArtifactRef {
        &self.artifact
    }

    /// Current phase; terminal once the coordinator returns
    pub fn phase(&self) -> PatchPhase {
        self.phase
    }

    fn enter(&mut self, phase: PatchPhase) {
        debug!("Patch transaction: {} -> {}", self.phase, phase);
        self.phase = phase;
    }
}

/// Options for controlling transaction execution
#[derive(Default, Clone)]
pub struct PatchOptions {
    /// Cancel token - set to true to request cancellation
    pub cancel: Option<Arc<AtomicBool>>,
    /// Progress tracker for reporting checkpoints
    pub progress: Option<Arc<dyn ProgressTracker>>,
}

impl PatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cancel token
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Set the progress tracker
    pub fn with_progress(mut self, progress: Arc<dyn ProgressTracker>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Return Cancelled error if cancellation requested
    fn check_cancelled(&self, next: PatchPhase) -> Result<()> {
        if self.is_cancelled() {
            Err(crate::Error::Cancelled(next.to_string()))
        } else {
            Ok(())
        }
    }

    fn report_phase(&self, phase: PatchPhase) {
        if let Some(ref progress) = self.progress
            && let Some(percent) = phase.progress_percent()
        {
            progress.checkpoint(percent, phase.message());
        }
    }

    fn report_finished(&self, result: &Result<PatchOutcome>) {
        if let Some(ref progress) = self.progress {
            match result {
                Ok(_) => progress.finish_with_message(PatchPhase::Succeeded.message()),
                Err(e) => progress.finish_with_error(&e.to_string()),
            }
        }
    }
}

impl std::fmt::Debug for PatchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchOptions")
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Result of a successful patch
#[derive(Debug, Clone, Serialize)]
pub struct PatchOutcome {
    pub asset_path: PathBuf,
    pub backup_path: PathBuf,
    pub artifact: PatchArtifactRef,
    /// Present when the patch was planned from a target version
    pub plan: Option<PatchPlan>,
    /// Fingerprint of the asset after replacement
    pub fingerprint: AssetFingerprint,
    pub duration_ms: u64,
}

// src/transaction/coordinator.rs

//! Drives a [`PatchTransaction`] through its phases

use super::{PatchOptions, PatchOutcome, PatchPhase, PatchTransaction};
use crate::config::{AssetStore, PatcherConfig};
use crate::delta::DeltaTool;
use crate::error::{Error, Result};
use crate::filesystem::{BackupManager, BackupPolicy, move_file_atomic, remove_if_exists};
use crate::fingerprint::{AssetFingerprint, Fingerprinter};
use crate::version::{PatchArtifactRef, VersionIdentity, VersionResolver};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

/// Owns write access to the asset and its backup while a patch runs
///
/// The coordinator holds no lock. Callers must ensure only one transaction
/// runs per asset path at a time.
pub struct PatchCoordinator<T: DeltaTool> {
    tool: T,
    assets: AssetStore,
    config: PatcherConfig,
    backups: BackupManager,
    fingerprinter: Fingerprinter,
    options: PatchOptions,
}

impl<T: DeltaTool> PatchCoordinator<T> {
    pub fn new(tool: T, assets: AssetStore, config: PatcherConfig) -> Self {
        Self {
            tool,
            assets,
            config,
            backups: BackupManager::new(),
            fingerprinter: Fingerprinter::size_only(),
            options: PatchOptions::default(),
        }
    }

    /// Fingerprinter used to report the patched asset
    pub fn with_fingerprinter(mut self, fingerprinter: Fingerprinter) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    /// Set execution options (cancel token, progress tracker)
    pub fn set_options(&mut self, options: PatchOptions) {
        self.options = options;
    }

    /// Resolve the current version of `asset` and patch it to `target`
    ///
    /// The file is re-resolved here even if the caller resolved it moments
    /// ago; whatever is on disk now decides the artifact.
    pub fn patch_to(
        &self,
        resolver: &VersionResolver,
        asset: &Path,
        target: VersionIdentity,
        policy: BackupPolicy,
    ) -> Result<PatchOutcome> {
        let plan = resolver.require_patch_for(asset, target)?;
        info!("Patching {}: {}", asset.display(), plan.description);

        let mut txn = PatchTransaction::new(asset, plan.artifact.clone());
        let mut outcome = self.run(&mut txn, policy)?;
        outcome.plan = Some(plan);
        Ok(outcome)
    }

    /// Apply `artifact` to `asset` as a single transaction
    pub fn apply(
        &self,
        asset: &Path,
        artifact: &PatchArtifactRef,
        policy: BackupPolicy,
    ) -> Result<PatchOutcome> {
        let mut txn = PatchTransaction::new(asset, artifact.clone());
        self.run(&mut txn, policy)
    }

    /// Run `txn` to a terminal phase
    ///
    /// On return `txn.phase()` is `Succeeded`, `RolledBack` or `Failed`.
    pub fn run(&self, txn: &mut PatchTransaction, policy: BackupPolicy) -> Result<PatchOutcome> {
        let started = Instant::now();
        let result = self.drive(txn, policy, started);

        match &result {
            Ok(_) => {
                txn.enter(PatchPhase::Succeeded);
                self.options.report_phase(PatchPhase::Succeeded);
            }
            Err(e) => {
                // Output from an earlier run is not ours to remove, and a
                // failed rename keeps the verified output for manual recovery
                if wrote_output(txn.phase()) && !matches!(e, Error::ReplacementFailed { .. }) {
                    self.discard_temp(txn);
                }
                if matches!(e, Error::Cancelled(_)) {
                    warn!("Patch of {} cancelled", txn.asset_path().display());
                    txn.enter(PatchPhase::RolledBack);
                } else {
                    error!("Patch of {} failed: {}", txn.asset_path().display(), e);
                    txn.enter(PatchPhase::Failed);
                }
            }
        }

        self.options.report_finished(&result);
        result
    }

    fn drive(
        &self,
        txn: &mut PatchTransaction,
        policy: BackupPolicy,
        started: Instant,
    ) -> Result<PatchOutcome> {
        let asset = txn.asset_path().to_path_buf();
        if !asset.is_file() {
            return Err(Error::NotFound(asset));
        }
        let patch = self.assets.require_artifact(txn.artifact())?;

        self.advance(txn, PatchPhase::BackingUp)?;
        let backup = self.backups.create_backup(&asset, policy)?;

        self.advance(txn, PatchPhase::Applying)?;
        if remove_if_exists(txn.temp_path())? {
            info!("Removed stale output {}", txn.temp_path().display());
        }
        let source_size = fs::metadata(&asset)?.len();
        let timeout = self.config.timeout_for(source_size);
        info!(
            "Running {} with {} (timeout {}s)",
            self.tool.name(),
            txn.artifact(),
            timeout.as_secs()
        );
        self.tool.apply(&asset, &patch, txn.temp_path(), timeout)?;

        self.advance(txn, PatchPhase::Verifying)?;
        let output_size = self.verify_output(txn.temp_path())?;
        info!("Patched output is {} bytes", output_size);

        self.advance(txn, PatchPhase::Committing)?;
        move_file_atomic(txn.temp_path(), &asset).map_err(|e| Error::ReplacementFailed {
            path: asset.clone(),
            reason: e.to_string(),
            asset_present: asset.is_file(),
        })?;

        // Committed: from here on nothing may fail the transaction
        let fingerprint =
            committed_fingerprint(self.fingerprinter.fingerprint(&asset), &asset, output_size);
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Patched {} in {}ms ({} bytes)",
            asset.display(),
            duration_ms,
            fingerprint.byte_size
        );

        Ok(PatchOutcome {
            asset_path: asset,
            backup_path: backup,
            artifact: txn.artifact().clone(),
            plan: None,
            fingerprint,
            duration_ms,
        })
    }

    /// Checkpoint: honor cancellation, then enter `phase` and report it
    fn advance(&self, txn: &mut PatchTransaction, phase: PatchPhase) -> Result<()> {
        self.options.check_cancelled(phase)?;
        txn.enter(phase);
        self.options.report_phase(phase);
        Ok(())
    }

    fn verify_output(&self, output: &Path) -> Result<u64> {
        let minimum = self.config.min_output_size;
        let size = match fs::metadata(output) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                return Err(Error::OutputImplausible {
                    path: output.to_path_buf(),
                    size: None,
                    minimum,
                });
            }
        };

        if size < minimum {
            return Err(Error::OutputImplausible {
                path: output.to_path_buf(),
                size: Some(size),
                minimum,
            });
        }
        Ok(size)
    }

    fn discard_temp(&self, txn: &PatchTransaction) {
        match remove_if_exists(txn.temp_path()) {
            Ok(true) => info!("Discarded {}", txn.temp_path().display()),
            Ok(false) => {}
            Err(e) => warn!("Failed to remove {}: {}", txn.temp_path().display(), e),
        }
    }
}

/// Whether `phase` is at or past the point where the tool writes the temp output
fn wrote_output(phase: PatchPhase) -> bool {
    matches!(phase, PatchPhase::Applying | PatchPhase::Verifying | PatchPhase::Committing)
}

/// Fingerprint of a committed asset, falling back to the verified size
fn committed_fingerprint(
    result: Result<AssetFingerprint>,
    asset: &Path,
    output_size: u64,
) -> AssetFingerprint {
    result.unwrap_or_else(|e| {
        warn!("Patched {} but could not fingerprint it: {}", asset.display(), e);
        AssetFingerprint {
            path: asset.to_path_buf(),
            exists: true,
            byte_size: output_size,
            content_digest: None,
        }
    })
}

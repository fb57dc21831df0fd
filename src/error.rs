// src/error.rs

//! Error types for version resolution and patch transactions
//!
//! Every I/O or subprocess failure inside the library is converted into one
//! of these variants before it reaches the caller. Each variant maps to a
//! stable [`ErrorKind`] reason code that presentation layers can match on.

use std::path::PathBuf;
use strum_macros::{Display, IntoStaticStr};
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the patch engine
#[derive(Error, Debug)]
pub enum Error {
    /// The asset path does not exist
    #[error("Asset not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The requested target is not a transition of the current version
    #[error("Cannot patch to '{target}' from {from}")]
    NoTransitionAvailable { from: String, target: String },

    /// A backup is already present and overwriting it was not authorized
    #[error("A backup already exists at {}", .0.display())]
    BackupAlreadyExists(PathBuf),

    /// Restore was requested but there is no backup
    #[error("No backup file found at {}", .0.display())]
    NoBackup(PathBuf),

    /// Copying the asset to its backup failed
    #[error("Failed to create backup {}: {reason}", .path.display())]
    BackupFailed { path: PathBuf, reason: String },

    /// Copying the backup over the asset failed
    #[error("Failed to restore {} from backup: {reason}", .path.display())]
    RestoreFailed { path: PathBuf, reason: String },

    /// The delta tool exited unsuccessfully or could not be run
    #[error("{tool} failed with {}{}", exit_description(.code), diagnostics_suffix(.diagnostics))]
    ExternalToolFailed {
        tool: String,
        code: Option<i32>,
        diagnostics: String,
    },

    /// The delta tool did not finish within its time budget
    #[error("{tool} timed out after {secs} seconds")]
    ExternalToolTimeout { tool: String, secs: u64 },

    /// The patched output is missing or too small to be a real asset
    #[error("Patched file {} is implausible: {}", .path.display(), implausible_description(.size, .minimum))]
    OutputImplausible {
        path: PathBuf,
        size: Option<u64>,
        minimum: u64,
    },

    /// Swapping the patched output into place failed
    #[error(
        "Failed to replace {} with patched output: {reason}. {}",
        .path.display(),
        replacement_advice(.asset_present)
    )]
    ReplacementFailed {
        path: PathBuf,
        reason: String,
        asset_present: bool,
    },

    /// A patch artifact named by the registry is not in the assets directory
    #[error("Patch file not found: {}", .0.display())]
    PatchArtifactMissing(PathBuf),

    /// The input is neither an `.esm` file nor a folder to search
    #[error("Not a folder or .esm file: {}", .0.display())]
    UnsupportedInput(PathBuf),

    /// Required tool or patch files are missing from the assets directory
    #[error("Missing required files: {}", .0.join(", "))]
    MissingDependencies(Vec<String>),

    /// The caller cancelled the transaction at a checkpoint
    #[error("Cancelled before {0}")]
    Cancelled(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unclassified I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable reason codes for [`Error`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    NotFound,
    NoTransitionAvailable,
    BackupAlreadyExists,
    NoBackup,
    BackupFailed,
    RestoreFailed,
    ExternalToolFailed,
    ExternalToolTimeout,
    OutputImplausible,
    ReplacementFailed,
    PatchArtifactMissing,
    UnsupportedInput,
    MissingDependencies,
    Cancelled,
    Config,
    Io,
}

impl Error {
    /// Reason code for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NoTransitionAvailable { .. } => ErrorKind::NoTransitionAvailable,
            Self::BackupAlreadyExists(_) => ErrorKind::BackupAlreadyExists,
            Self::NoBackup(_) => ErrorKind::NoBackup,
            Self::BackupFailed { .. } => ErrorKind::BackupFailed,
            Self::RestoreFailed { .. } => ErrorKind::RestoreFailed,
            Self::ExternalToolFailed { .. } => ErrorKind::ExternalToolFailed,
            Self::ExternalToolTimeout { .. } => ErrorKind::ExternalToolTimeout,
            Self::OutputImplausible { .. } => ErrorKind::OutputImplausible,
            Self::ReplacementFailed { .. } => ErrorKind::ReplacementFailed,
            Self::PatchArtifactMissing(_) => ErrorKind::PatchArtifactMissing,
            Self::UnsupportedInput(_) => ErrorKind::UnsupportedInput,
            Self::MissingDependencies(_) => ErrorKind::MissingDependencies,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Stable kebab-case reason string
    pub fn reason(&self) -> &'static str {
        self.kind().into()
    }

    /// True when the on-disk asset may be inconsistent and should be
    /// restored from backup right away
    pub fn requires_restore(&self) -> bool {
        matches!(self, Self::ReplacementFailed { .. })
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("return code {}", code),
        None => "no exit code (terminated by signal or failed to start)".to_string(),
    }
}

fn diagnostics_suffix(diagnostics: &str) -> String {
    let trimmed = diagnostics.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\nError: {}", trimmed)
    }
}

fn replacement_advice(asset_present: &bool) -> &'static str {
    if *asset_present {
        "Restore from backup immediately."
    } else {
        "The asset is MISSING; restore from backup immediately."
    }
}

fn implausible_description(size: &Option<u64>, minimum: &u64) -> String {
    match size {
        Some(size) => format!("too small ({} bytes, expected at least {})", size, minimum),
        None => "file was not created".to_string(),
    }
}

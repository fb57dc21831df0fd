// src/delta/mod.rs

//! Binary delta application
//!
//! The patch engine never decodes deltas itself. It hands a source file and a
//! patch file to an external [`DeltaTool`] and gets back an output file, an
//! error, or a timeout.
//!
//! # Architecture
//!
//! - **DeltaTool**: the seam between the transaction and the process that
//!   does the work; tests substitute an in-process implementation
//! - **Xdelta3Tool**: runs `xdelta3 -f -d -s <source> <patch> <output>`
//!   with a hard timeout

mod xdelta;

pub use xdelta::Xdelta3Tool;

use crate::error::Result;
use std::path::Path;
use std::time::Duration;

/// Something that can reconstruct a target file from a source and a delta
pub trait DeltaTool: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &str;

    /// Write the result of applying `patch` to `source` into `output`
    ///
    /// `output` is overwritten if present. On failure the caller owns
    /// cleaning up whatever partial output was left.
    ///
    /// # Errors
    ///
    /// `ExternalToolFailed` with the tool's diagnostics when it exits
    /// unsuccessfully or cannot be started, `ExternalToolTimeout` when it
    /// runs past `timeout`.
    fn apply(&self, source: &Path, patch: &Path, output: &Path, timeout: Duration) -> Result<()>;
}

impl<T: DeltaTool + ?Sized> DeltaTool for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn apply(&self, source: &Path, patch: &Path, output: &Path, timeout: Duration) -> Result<()> {
        (**self).apply(source, patch, output, timeout)
    }
}

impl<T: DeltaTool + ?Sized> DeltaTool for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn apply(&self, source: &Path, patch: &Path, output: &Path, timeout: Duration) -> Result<()> {
        (**self).apply(source, patch, output, timeout)
    }
}

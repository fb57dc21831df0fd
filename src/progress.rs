// src/progress.rs

//! Progress tracking for patch transactions
//!
//! The transaction reports coarse checkpoints (a percentage plus a phase
//! message) through the `ProgressTracker` trait. Reports are advisory: a
//! tracker can ignore them and nothing about the transaction changes.
//!
//! Implementations:
//! - `SilentProgress`: no-op for scripted/quiet modes and tests
//! - `LogProgress`: logs each checkpoint to tracing
//! - `CallbackProgress`: forwards events to a closure
//!
//! The CLI adds an indicatif progress bar on top of the same trait.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::info;

/// Scale used by percentage-based trackers
pub const PERCENT_SCALE: u64 = 100;

/// Core trait for progress tracking
///
/// Implementations must be thread-safe (Send + Sync); the transaction is
/// free to report from whatever thread it runs on.
pub trait ProgressTracker: Send + Sync {
    /// Set the current status message
    fn set_message(&self, message: &str);

    /// Set progress to a specific position
    fn set_position(&self, position: u64);

    /// Get current position
    fn position(&self) -> u64;

    /// Get total length
    fn length(&self) -> u64;

    /// Finish progress successfully with a message
    fn finish_with_message(&self, message: &str);

    /// Finish progress with an error/abandonment message
    fn finish_with_error(&self, message: &str);

    /// Check if progress is finished
    fn is_finished(&self) -> bool;

    /// Report a checkpoint: position and message together
    fn checkpoint(&self, percent: u64, message: &str) {
        self.set_position(percent.min(self.length()));
        self.set_message(message);
    }
}

/// Silent progress tracker (no-op)
#[derive(Debug)]
pub struct SilentProgress {
    position: AtomicU64,
    finished: AtomicBool,
}

impl SilentProgress {
    pub fn new() -> Self {
        Self {
            position: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }
}

impl Default for SilentProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker for SilentProgress {
    fn set_message(&self, _message: &str) {}

    fn set_position(&self, position: u64) {
        self.position.store(position, Ordering::Relaxed);
    }

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        PERCENT_SCALE
    }

    fn finish_with_message(&self, _message: &str) {
        self.finished.store(true, Ordering::Relaxed);
    }

    fn finish_with_error(&self, _message: &str) {
        self.finished.store(true, Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Logging progress tracker
///
/// Logs each checkpoint at info level. Useful for non-interactive runs where
/// a progress bar would only clutter the log file.
#[derive(Debug)]
pub struct LogProgress {
    name: String,
    position: AtomicU64,
    finished: AtomicBool,
}

impl LogProgress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }
}

impl ProgressTracker for LogProgress {
    fn set_message(&self, message: &str) {
        info!(
            "{}: {}% {}",
            self.name,
            self.position.load(Ordering::Relaxed),
            message
        );
    }

    fn set_position(&self, position: u64) {
        self.position.store(position, Ordering::Relaxed);
    }

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        PERCENT_SCALE
    }

    fn finish_with_message(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        info!("{}: {}", self.name, message);
    }

    fn finish_with_error(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        info!("{}: ERROR - {}", self.name, message);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Events emitted by callback progress tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Message updated
    Message(String),
    /// Position changed
    Position { current: u64, total: u64 },
    /// Progress finished successfully
    Finished(String),
    /// Progress finished with error
    Error(String),
}

/// Callback-based progress tracker
///
/// Calls a user-provided function on progress updates. Useful for embedding
/// the patch engine in a GUI front end.
pub struct CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    callback: F,
    position: AtomicU64,
    finished: AtomicBool,
}

impl<F> CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            position: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }
}

impl<F> ProgressTracker for CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn set_message(&self, message: &str) {
        (self.callback)(ProgressEvent::Message(message.to_string()));
    }

    fn set_position(&self, position: u64) {
        self.position.store(position, Ordering::Relaxed);
        (self.callback)(ProgressEvent::Position {
            current: position,
            total: PERCENT_SCALE,
        });
    }

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        PERCENT_SCALE
    }

    fn finish_with_message(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        (self.callback)(ProgressEvent::Finished(message.to_string()));
    }

    fn finish_with_error(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        (self.callback)(ProgressEvent::Error(message.to_string()));
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

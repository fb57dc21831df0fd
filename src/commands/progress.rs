// src/commands/progress.rs
//! Terminal progress bar for patch transactions
//!
//! Bridges the library's `ProgressTracker` checkpoints to an indicatif bar.
//! Only used when stderr is a terminal; redirected runs log checkpoints
//! through `LogProgress` instead.

use esmpatch::progress::{PERCENT_SCALE, ProgressTracker};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Single progress bar showing the patch phase and percentage
pub struct PatchProgress {
    bar: ProgressBar,
}

impl PatchProgress {
    /// Create a bar labelled with the patch description
    pub fn new(description: &str) -> Self {
        let bar = ProgressBar::new(PERCENT_SCALE);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix} [{bar:40.green/dim}] {percent:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar.set_prefix(description.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressTracker for PatchProgress {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn set_position(&self, position: u64) {
        self.bar.set_position(position);
    }

    fn position(&self) -> u64 {
        self.bar.position()
    }

    fn length(&self) -> u64 {
        self.bar.length().unwrap_or(PERCENT_SCALE)
    }

    fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn finish_with_error(&self, message: &str) {
        self.bar.abandon_with_message(format!("[FAILED: {}]", message));
    }

    fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

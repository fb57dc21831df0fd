// src/commands/mod.rs
//! Command handlers for the esmpatch CLI

mod info;
mod patch;
pub mod progress;
mod restore;
mod system;

pub use info::cmd_info;
pub use patch::{PatchArgs, cmd_patch};
pub use restore::cmd_restore;
pub use system::{cmd_check, cmd_completions, cmd_detect};

use anyhow::Result;
use esmpatch::filesystem::AssetLock;
use esmpatch::version::{group_digits, mebibytes};
use esmpatch::{AssetStore, PatcherConfig};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// How a command finished, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Work was done (or information was shown)
    Done,
    /// Nothing to do: already patched, unknown version, or a choice is needed
    NoAction,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Done => ExitCode::SUCCESS,
            Status::NoAction => ExitCode::from(2),
        }
    }
}

/// Settings shared by every command
pub struct Context {
    pub config: PatcherConfig,
    pub assets: AssetStore,
}

impl Context {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = PatcherConfig::load(config_path)?;
        let assets = AssetStore::resolve(&config);
        Ok(Self { config, assets })
    }
}

/// "330,777,465 bytes (315.45 MB)"
pub(crate) fn format_size(bytes: u64) -> String {
    format!("{} bytes ({:.2} MB)", group_digits(bytes), mebibytes(bytes))
}

/// Take the per-asset lock or fail with a readable message
pub(crate) fn lock_asset(asset: &Path) -> Result<AssetLock> {
    AssetLock::try_acquire(asset)?.ok_or_else(|| {
        anyhow::anyhow!(
            "Another esmpatch process is working on {}",
            asset.display()
        )
    })
}

/// Ask a yes/no question on stdin; default is no
///
/// Returns false without prompting when stdin is not a terminal.
pub(crate) fn confirm(question: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    let mut stdout = io::stdout();
    write!(stdout, "{} [y/N] ", question)?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(parse_yes(&input))
}

fn parse_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Resolve the user's path argument to the asset, printing where it was found
pub(crate) fn resolve_asset(input: &Path) -> Result<PathBuf> {
    let asset = esmpatch::discovery::resolve_input(input)?;
    if asset != input {
        println!("Found {} at: {}", esmpatch::discovery::ASSET_FILE_NAME, asset.display());
    }
    Ok(asset)
}

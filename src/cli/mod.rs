// src/cli/mod.rs
//! CLI definitions for esmpatch
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! - `info` - Show the version of a Fallout4.esm and its patch targets
//! - `patch` - Convert the file to another version
//! - `restore` - Put the backup back in place
//! - `detect` - Look for installations in common folders
//! - `check` - Verify the patch tool and patch files are present
//! - `completions` - Shell completion scripts

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use esmpatch::VersionIdentity;
use std::path::PathBuf;
use strum::IntoEnumIterator;

#[derive(Parser)]
#[command(name = "esmpatch")]
#[command(author = "esmpatch contributors")]
#[command(version)]
#[command(about = "Convert Fallout4.esm between Next-Gen, Old-Gen and VR versions", long_about = None)]
pub struct Cli {
    /// Configuration file (default: <config dir>/esmpatch/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Also write a timestamped log file to the current directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the version of a Fallout4.esm and the available patches
    Info {
        /// Path to Fallout4.esm or the game folder
        path: PathBuf,

        /// Also compute the content digest
        #[arg(long)]
        digest: bool,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Patch Fallout4.esm to another version
    Patch {
        /// Path to Fallout4.esm or the game folder
        path: PathBuf,

        /// Target version (1.10.163, nextgen); optional when only one exists
        #[arg(short, long, value_name = "ID", value_parser = parse_target)]
        target: Option<VersionIdentity>,

        /// Replace an existing backup without asking
        #[arg(long)]
        overwrite_backup: bool,

        /// Answer yes to confirmation prompts
        #[arg(short, long)]
        yes: bool,

        /// Minimum timeout for the patch tool, in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Restore Fallout4.esm from its backup
    Restore {
        /// Path to Fallout4.esm or the game folder
        path: PathBuf,
    },

    /// Search common install folders for Fallout4.esm
    Detect,

    /// Check that xdelta3 and all patch files are available
    Check,

    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse a patch target tag; `patched` is a classification, not a target
fn parse_target(tag: &str) -> Result<VersionIdentity, String> {
    let valid = || {
        VersionIdentity::iter()
            .filter(|id| *id != VersionIdentity::Patched)
            .map(|id| id.tag())
            .collect::<Vec<_>>()
            .join(", ")
    };
    match tag.parse::<VersionIdentity>() {
        Ok(VersionIdentity::Patched) | Err(_) => {
            Err(format!("unknown target '{}' (valid: {})", tag, valid()))
        }
        Ok(id) => Ok(id),
    }
}

// src/commands/system.rs
//! Environment commands: installation detection, dependency check, completions

use super::{Context, Status, format_size};
use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use esmpatch::discovery::{scan_installs, well_known_installs};
use esmpatch::{Error, VersionResolver};
use std::io;
use tracing::info;

/// Scan the usual install folders and report each asset found
pub fn cmd_detect(_ctx: &Context) -> Result<Status> {
    println!("Searching for Fallout 4 installations...");
    let found = scan_installs(&well_known_installs());

    if found.is_empty() {
        println!();
        println!("No Fallout 4 installations found.");
        println!("Pass the game folder or the path to Fallout4.esm explicitly.");
        return Ok(Status::NoAction);
    }

    let resolver = VersionResolver::default();
    for asset in &found {
        let version = resolver.resolve_version(asset)?;
        println!();
        println!("Found: {}", asset.display());
        println!("  Version: {}", version.display_label);
        println!("  Size: {}", format_size(version.byte_size()));
        if !version.available_targets.is_empty() {
            let targets: Vec<String> = version
                .available_targets
                .iter()
                .map(|t| t.to_string())
                .collect();
            println!("  Targets: {}", targets.join(", "));
        }
    }

    println!();
    println!("Found {} installation(s)", found.len());
    Ok(Status::Done)
}

/// Verify the delta tool and every patch file are present
pub fn cmd_check(ctx: &Context) -> Result<Status> {
    println!("Assets directory: {}", ctx.assets.root().display());
    println!("Patch tool: {}", ctx.assets.tool_path().display());

    let missing = ctx.assets.missing_files();
    if missing.is_empty() {
        info!("All dependencies present");
        println!("All required files are present.");
        return Ok(Status::Done);
    }

    println!();
    println!("Missing required files:");
    for file in &missing {
        println!("  - {}", file);
    }
    println!();
    println!("Place them in the assets directory or set ESMPATCH_ASSETS_DIR.");
    Err(Error::MissingDependencies(missing).into())
}

/// Write a completion script for `shell` to stdout
pub fn cmd_completions(shell: Shell) -> Result<Status> {
    let mut cmd = crate::cli::Cli::command();
    generate(shell, &mut cmd, "esmpatch", &mut io::stdout());
    Ok(Status::Done)
}

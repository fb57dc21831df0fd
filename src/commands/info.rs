// src/commands/info.rs
//! Info command - show the version of an asset and its patch targets

use super::{Context, Status, format_size, resolve_asset};
use anyhow::Result;
use esmpatch::{BackupManager, Classification, Fingerprinter, VersionInfo, VersionResolver};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct InfoReport<'a> {
    #[serde(flatten)]
    version: &'a VersionInfo,
    backup_path: PathBuf,
    backup_exists: bool,
}

pub fn cmd_info(ctx: &Context, input: &Path, digest: bool, json: bool) -> Result<Status> {
    let asset = resolve_asset(input)?;
    info!("Analyzing {}", asset.display());

    let fingerprinter = if digest {
        Fingerprinter::new(ctx.config.digest)
    } else {
        Fingerprinter::size_only()
    };
    let version = VersionResolver::new(fingerprinter).resolve_version(&asset)?;

    let backups = BackupManager::new();
    let report = InfoReport {
        version: &version,
        backup_path: backups.backup_path(&asset),
        backup_exists: backups.backup_exists(&asset),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&asset, &report);
    }

    Ok(if version.nothing_to_do() {
        Status::NoAction
    } else {
        Status::Done
    })
}

fn print_report(asset: &Path, report: &InfoReport<'_>) {
    let version = report.version;

    println!("File: {}", asset.display());
    println!("Version: {}", version.display_label);
    if version.exists() {
        println!("Size: {}", format_size(version.byte_size()));
    }
    if let Some(hash) = &version.fingerprint.content_digest {
        println!("{}: {}", hash.algorithm.name().to_uppercase(), hash.value);
    }

    match version.classification {
        Classification::Known if !version.available_targets.is_empty() => {
            println!();
            println!("Available patches:");
            for (target, artifact) in &version.transitions {
                println!("  {} -> {} ({})", version.display_label, target, artifact);
            }
        }
        Classification::Migrated => {
            println!();
            println!("This file appears to be already patched.");
        }
        Classification::Unknown => {
            println!();
            println!("No patches are available for this version.");
        }
        _ => {}
    }

    if report.backup_exists {
        println!();
        println!("Backup: {}", report.backup_path.display());
    }
}

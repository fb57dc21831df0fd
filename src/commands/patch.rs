// src/commands/patch.rs
//! Patch command - convert an asset to another version

use super::progress::PatchProgress;
use super::{Context, Status, confirm, format_size, lock_asset, resolve_asset};
use anyhow::{Context as _, Result};
use esmpatch::{
    BackupDecision, BackupManager, BackupPolicy, Classification, Error, LogProgress,
    PatchCoordinator, PatchOptions, ProgressTracker, VersionIdentity, VersionResolver, Xdelta3Tool,
};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Options for the patch command
pub struct PatchArgs<'a> {
    pub input: &'a Path,
    pub target: Option<VersionIdentity>,
    pub overwrite_backup: bool,
    pub yes: bool,
    pub timeout: Option<u64>,
}

pub fn cmd_patch(ctx: &Context, args: PatchArgs<'_>) -> Result<Status> {
    let asset = resolve_asset(args.input)?;
    let resolver = VersionResolver::default();
    let version = resolver.resolve_version(&asset)?;

    if !version.exists() {
        return Err(Error::NotFound(asset).into());
    }

    println!("Current version: {}", version.display_label);
    println!("Size: {}", format_size(version.byte_size()));

    if version.available_targets.is_empty() {
        match version.classification {
            Classification::Migrated => println!("This file is already patched."),
            _ => println!("No patches are available for this version."),
        }
        return Ok(Status::NoAction);
    }

    let target = match args.target {
        Some(target) => target,
        None => match version.sole_target() {
            Some(only) => {
                println!("Auto-selected target: {}", only);
                only
            }
            None => {
                println!("Multiple targets are available; choose one with --target:");
                for target in &version.available_targets {
                    println!("  {}", target);
                }
                return Ok(Status::NoAction);
            }
        },
    };

    let tool = ctx.assets.tool_path();
    if !tool.is_file() {
        return Err(Error::MissingDependencies(vec![tool.display().to_string()]).into());
    }

    let _lock = lock_asset(&asset)?;

    let backups = BackupManager::new();
    let mut policy = if args.overwrite_backup {
        BackupPolicy::OverwriteAuthorized
    } else {
        BackupPolicy::RefuseOverwrite
    };
    if let BackupDecision::NeedsAuthorization(existing) = backups.decide(&asset, policy) {
        let question = format!(
            "A backup already exists at {}. Overwrite it?",
            existing.display()
        );
        if args.yes || confirm(&question)? {
            policy = BackupPolicy::OverwriteAuthorized;
        } else {
            println!("Patch cancelled; the existing backup was kept.");
            println!("Use --overwrite-backup to replace it.");
            return Ok(Status::NoAction);
        }
    }

    let plan = resolver.require_patch_for(&asset, target)?;
    println!("Patch: {}", plan.description);

    let mut config = ctx.config.clone();
    if let Some(secs) = args.timeout {
        config.timeout_secs = secs;
    }

    // A bar on a terminal, log lines when output is redirected
    let progress: Arc<dyn ProgressTracker> = if std::io::stderr().is_terminal() {
        Arc::new(PatchProgress::new(&plan.description))
    } else {
        Arc::new(LogProgress::new(plan.description.clone()))
    };

    let mut coordinator = PatchCoordinator::new(Xdelta3Tool::new(tool), ctx.assets.clone(), config);
    coordinator.set_options(PatchOptions::new().with_progress(progress));

    match coordinator.patch_to(&resolver, &asset, target, policy) {
        Ok(outcome) => {
            info!("Patch completed in {}ms", outcome.duration_ms);
            let patched = resolver.resolve_version(&asset)?;
            println!();
            println!("Patch applied successfully.");
            println!("New version: {}", patched.display_label);
            println!("New size: {}", format_size(outcome.fingerprint.byte_size));
            println!("Backup: {}", outcome.backup_path.display());
            Ok(Status::Done)
        }
        Err(e) => {
            if e.requires_restore() {
                warn!("Asset may be inconsistent: {}", asset.display());
                eprintln!();
                eprintln!("CRITICAL: {}", e);
                eprintln!(
                    "Run `esmpatch restore \"{}\"` to put the original back.",
                    asset.display()
                );
            } else {
                eprintln!("The original file was not modified.");
            }
            Err(e).with_context(|| format!("Failed to patch {}", asset.display()))
        }
    }
}

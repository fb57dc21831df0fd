// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::{Context, PatchArgs, Status};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_path = match init_logging(cli.verbose, cli.log_file) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Fatal error: failed to set up logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = &log_path {
        info!("Logging to {}", path.display());
    }

    match run(cli) {
        Ok(status) => status.into(),
        Err(e) => {
            match e.downcast_ref::<esmpatch::Error>() {
                Some(classified) => {
                    debug!("Failed with reason {}", classified.reason());
                    eprintln!("Error: {:#}", e);
                }
                None => eprintln!("Fatal error: {:#}", e),
            }
            if let Some(path) = &log_path {
                eprintln!("See {} for details.", path.display());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Status> {
    let context = || Context::load(cli.config.as_deref());

    match cli.command {
        Commands::Info { path, digest, json } => {
            commands::cmd_info(&context()?, &path, digest, json)
        }
        Commands::Patch {
            path,
            target,
            overwrite_backup,
            yes,
            timeout,
        } => commands::cmd_patch(
            &context()?,
            PatchArgs {
                input: &path,
                target,
                overwrite_backup,
                yes,
                timeout,
            },
        ),
        Commands::Restore { path } => commands::cmd_restore(&context()?, &path),
        Commands::Detect => commands::cmd_detect(&context()?),
        Commands::Check => commands::cmd_check(&context()?),
        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}

/// Install the stderr subscriber and, if requested, a file layer
///
/// `RUST_LOG` wins over `-v`. The log file always records at debug level.
fn init_logging(verbose: u8, log_file: bool) -> Result<Option<PathBuf>> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, path) = if log_file {
        let path = PathBuf::from(format!(
            "esmpatch_{}.log",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ));
        let file = File::create(&path)?;
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(LevelFilter::DEBUG);
        (Some(layer), Some(path))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(stderr_filter),
        )
        .with(file_layer)
        .init();

    Ok(path)
}

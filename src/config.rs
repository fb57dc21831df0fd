// src/config.rs

//! Patcher configuration and the read-only assets location
//!
//! Configuration is optional. Lookup order:
//! 1. An explicit `--config` path (must exist)
//! 2. `<config dir>/esmpatch/config.toml` if present
//! 3. Built-in defaults
//!
//! `ESMPATCH_ASSETS_DIR` and `ESMPATCH_TOOL` override the file.
//!
//! ```toml
//! assets_dir = "/opt/esmpatch/assets"
//! tool = "/usr/bin/xdelta3"
//! timeout_secs = 300
//! min_output_size = 50000000
//! digest = "sha256"
//! ```

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use crate::version::{PatchArtifactRef, VersionRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment override for the assets directory
pub const ASSETS_DIR_ENV: &str = "ESMPATCH_ASSETS_DIR";
/// Environment override for the delta tool binary
pub const TOOL_ENV: &str = "ESMPATCH_TOOL";

/// Name of the delta tool binary
#[cfg(windows)]
pub const TOOL_BINARY: &str = "xdelta3.exe";
#[cfg(not(windows))]
pub const TOOL_BINARY: &str = "xdelta3";

/// Patched output below this size is definitely wrong
pub const DEFAULT_MIN_OUTPUT_SIZE: u64 = 50_000_000;
/// Floor for the delta tool timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Timeout grows by one second per this many source bytes past the floor
const BYTES_PER_TIMEOUT_SEC: u64 = 4 * 1024 * 1024;

/// User-tunable settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatcherConfig {
    /// Directory holding the patch files (and usually the tool)
    pub assets_dir: PathBuf,
    /// Explicit delta tool path
    pub tool: Option<PathBuf>,
    /// Minimum delta tool timeout, in seconds
    pub timeout_secs: u64,
    /// Output size sanity threshold, in bytes
    pub min_output_size: u64,
    /// Digest shown by `info --digest`
    pub digest: HashAlgorithm,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            tool: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_output_size: DEFAULT_MIN_OUTPUT_SIZE,
            digest: HashAlgorithm::default(),
        }
    }
}

impl PatcherConfig {
    /// Load configuration following the lookup order above
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var_os(key));
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text; missing keys take their defaults
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<std::ffi::OsString>,
    {
        if let Some(dir) = lookup(ASSETS_DIR_ENV).filter(|v| !v.is_empty()) {
            debug!("{} overrides assets_dir", ASSETS_DIR_ENV);
            self.assets_dir = PathBuf::from(dir);
        }
        if let Some(tool) = lookup(TOOL_ENV).filter(|v| !v.is_empty()) {
            debug!("{} overrides tool", TOOL_ENV);
            self.tool = Some(PathBuf::from(tool));
        }
    }

    /// Delta tool timeout for a source of `source_size` bytes
    pub fn timeout_for(&self, source_size: u64) -> Duration {
        let scaled = source_size / BYTES_PER_TIMEOUT_SEC;
        Duration::from_secs(self.timeout_secs.max(scaled))
    }
}

/// `<exe dir>/assets`, falling back to `./assets`
pub fn default_assets_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("assets")))
        .unwrap_or_else(|| PathBuf::from("assets"))
}

/// `<config dir>/esmpatch/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("esmpatch").join("config.toml"))
}

/// The read-only assets location, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStore {
    root: PathBuf,
    tool: PathBuf,
}

impl AssetStore {
    /// Store with an explicit root and tool path
    pub fn new(root: impl Into<PathBuf>, tool: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tool: tool.into(),
        }
    }

    /// Resolve the tool: configured path, then the assets directory, then `PATH`
    pub fn resolve(config: &PatcherConfig) -> Self {
        let root = config.assets_dir.clone();
        let bundled = root.join(TOOL_BINARY);
        let tool = match &config.tool {
            Some(tool) => tool.clone(),
            None if bundled.is_file() => bundled,
            None => which::which(TOOL_BINARY).unwrap_or(bundled),
        };
        debug!("Assets: {}, tool: {}", root.display(), tool.display());
        Self { root, tool }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool
    }

    /// Location of a patch artifact
    pub fn artifact_path(&self, artifact: &PatchArtifactRef) -> PathBuf {
        self.root.join(artifact.file_name())
    }

    /// Location of an artifact that must exist
    pub fn require_artifact(&self, artifact: &PatchArtifactRef) -> Result<PathBuf> {
        let path = self.artifact_path(artifact);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::PatchArtifactMissing(path))
        }
    }

    /// Tool and registry patch files that are not present
    pub fn missing_files(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if !self.tool.is_file() {
            missing.push(
                self.tool
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| TOOL_BINARY.to_string()),
            );
        }
        for artifact in VersionRegistry::builtin().artifacts() {
            if !self.artifact_path(artifact).is_file() {
                missing.push(artifact.file_name().to_string());
            }
        }
        missing
    }

    /// Error listing every missing dependency, if any
    pub fn verify(&self) -> Result<()> {
        let missing = self.missing_files();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingDependencies(missing))
        }
    }
}

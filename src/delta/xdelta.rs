// src/delta/xdelta.rs

//! xdelta3 subprocess driver

use super::DeltaTool;
use crate::error::{Error, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Runs the xdelta3 binary in decode mode
#[derive(Debug, Clone)]
pub struct Xdelta3Tool {
    binary: PathBuf,
}

impl Xdelta3Tool {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn display_name(&self) -> String {
        self.binary
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "xdelta3".to_string())
    }
}

impl DeltaTool for Xdelta3Tool {
    fn name(&self) -> &str {
        "xdelta3"
    }

    fn apply(&self, source: &Path, patch: &Path, output: &Path, timeout: Duration) -> Result<()> {
        let tool = self.display_name();
        debug!(
            "Executing: {} -f -d -s {} {} {}",
            self.binary.display(),
            source.display(),
            patch.display(),
            output.display()
        );

        let started = Instant::now();
        let mut child = Command::new(&self.binary)
            .arg("-f")
            .arg("-d")
            .arg("-s")
            .arg(source)
            .arg(patch)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::ExternalToolFailed {
                tool: tool.clone(),
                code: None,
                diagnostics: format!("Failed to start {}: {}", self.binary.display(), e),
            })?;

        // Drain both pipes while waiting so a chatty tool cannot block on a full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match child.wait_timeout(timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                warn!("{} killed after {} seconds", tool, timeout.as_secs());
                return Err(Error::ExternalToolTimeout {
                    tool,
                    secs: timeout.as_secs(),
                });
            }
        };

        let stdout = stdout.map(collect).unwrap_or_default();
        let stderr = stderr.map(collect).unwrap_or_default();

        for line in stdout.lines() {
            debug!("[{}] {}", tool, line);
        }
        for line in stderr.lines() {
            warn!("[{}] {}", tool, line);
        }

        if status.success() {
            info!(
                "{} completed in {:.1}s",
                tool,
                started.elapsed().as_secs_f64()
            );
            Ok(())
        } else {
            Err(Error::ExternalToolFailed {
                tool,
                code: status.code(),
                diagnostics: stderr,
            })
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("xdelta3");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_arguments_are_passed_in_order() {
        let temp = TempDir::new().unwrap();
        // $4 = source, $5 = patch, $6 = output
        let tool = fake_tool(
            temp.path(),
            r#"[ "$1 $2 $3" = "-f -d -s" ] || exit 9
cat "$4" "$5" > "$6""#,
        );
        let source = temp.path().join("src");
        let patch = temp.path().join("patch");
        let output = temp.path().join("out");
        fs::write(&source, b"abc").unwrap();
        fs::write(&patch, b"def").unwrap();

        Xdelta3Tool::new(&tool)
            .apply(&source, &patch, &output, Duration::from_secs(10))
            .unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"abcdef");
    }

    #[test]
    fn test_nonzero_exit_carries_stderr() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(
            temp.path(),
            "echo 'xdelta3: target window checksum mismatch' >&2\nexit 1",
        );

        let err = Xdelta3Tool::new(&tool)
            .apply(
                &temp.path().join("a"),
                &temp.path().join("b"),
                &temp.path().join("c"),
                Duration::from_secs(10),
            )
            .unwrap_err();

        match err {
            Error::ExternalToolFailed {
                code, diagnostics, ..
            } => {
                assert_eq!(code, Some(1));
                assert!(diagnostics.contains("checksum mismatch"));
            }
            other => panic!("Expected ExternalToolFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_timeout_kills_tool() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "exec sleep 30");

        let started = Instant::now();
        let err = Xdelta3Tool::new(&tool)
            .apply(
                &temp.path().join("a"),
                &temp.path().join("b"),
                &temp.path().join("c"),
                Duration::from_millis(300),
            )
            .unwrap_err();

        assert!(matches!(err, Error::ExternalToolTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_binary() {
        let temp = TempDir::new().unwrap();
        let err = Xdelta3Tool::new(temp.path().join("no-such-xdelta3"))
            .apply(
                &temp.path().join("a"),
                &temp.path().join("b"),
                &temp.path().join("c"),
                Duration::from_secs(1),
            )
            .unwrap_err();

        assert!(matches!(err, Error::ExternalToolFailed { code: None, .. }));
    }
}

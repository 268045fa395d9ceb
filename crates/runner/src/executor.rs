//! Runs the analysis script for one job.
//!
//! The contents of the script directory are copied into the job's working
//! directory next to the downloaded inputs, then `sh ./script.sh` runs there.
//! The script must leave one zip archive per result tier behind.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use predictcr_core::results::ResultTier;
use tokio::process::Command;

/// Entry point the script directory must contain.
pub const SCRIPT_NAME: &str = "script.sh";

/// Number of stderr lines kept for failure reports.
const STDERR_TAIL_LINES: usize = 20;

/// Errors from preparing or running the script.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to prepare working directory: {0}")]
    Prepare(std::io::Error),

    #[error("failed to start {SCRIPT_NAME}: {0}")]
    Spawn(std::io::Error),

    #[error("{SCRIPT_NAME} did not finish within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("{SCRIPT_NAME} exited with {status}: {stderr_tail}")]
    Failed { status: String, stderr_tail: String },

    #[error("{SCRIPT_NAME} did not produce {0}")]
    MissingArchive(&'static str),
}

/// Copies the script directory into a working directory and runs it.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    script_dir: PathBuf,
    timeout: Duration,
}

impl ScriptExecutor {
    pub fn new(script_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            script_dir: script_dir.into(),
            timeout,
        }
    }

    /// Run the script in `work_dir` and return the produced archives.
    pub async fn run(&self, work_dir: &Path) -> Result<Vec<(ResultTier, PathBuf)>, ExecError> {
        let source = self.script_dir.clone();
        let dest = work_dir.to_path_buf();
        tokio::task::spawn_blocking(move || copy_dir_contents(&source, &dest))
            .await
            .map_err(|e| ExecError::Prepare(std::io::Error::other(e)))?
            .map_err(ExecError::Prepare)?;

        tracing::debug!(work_dir = %work_dir.display(), "Running {SCRIPT_NAME}");
        let child = Command::new("sh")
            .arg(format!("./{SCRIPT_NAME}"))
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ExecError::Spawn)?;

        // Dropping the output future on timeout kills the child.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecError::Timeout(self.timeout))?
            .map_err(ExecError::Spawn)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(stdout = %stdout.trim(), "{SCRIPT_NAME} output");
        }
        if !output.status.success() {
            return Err(ExecError::Failed {
                status: output.status.to_string(),
                stderr_tail: stderr_tail(&output.stderr),
            });
        }

        collect_archives(work_dir)
    }
}

/// The archive for every tier, or the first one missing.
fn collect_archives(work_dir: &Path) -> Result<Vec<(ResultTier, PathBuf)>, ExecError> {
    ResultTier::ALL
        .into_iter()
        .map(|tier| {
            let path = work_dir.join(tier.file_name());
            if path.is_file() {
                Ok((tier, path))
            } else {
                Err(ExecError::MissingArchive(tier.file_name()))
            }
        })
        .collect()
}

/// Last [`STDERR_TAIL_LINES`] non-empty lines of `stderr`.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Recursively copy the contents of `source` into `dest`.
fn copy_dir_contents(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_contents(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

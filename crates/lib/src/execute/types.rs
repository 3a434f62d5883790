//! Types for plan execution.
//!
//! Error, configuration and report types shared by the executor, the command
//! runner and the individual actions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::ImageConfig;

/// Errors that abort a build. The first one is returned as is; nothing is rolled back.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// A shell command exited unsuccessfully. Produced by command runners.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  /// A run step exited unsuccessfully. Permission steps fail with `Group` or `Io`.
  #[error("step {position} failed with exit code {code:?}: {summary}")]
  StepFailed {
    position: usize,
    summary: String,
    code: Option<i32>,
  },

  /// The fail-fast sub-step of a vendor step failed.
  #[error("step {position}: vendoring into missing '{guard}' failed with exit code {code:?}")]
  GuardedStepFailed {
    position: usize,
    guard: String,
    code: Option<i32>,
  },

  /// Copying into the build root failed.
  #[error("copy {src} -> {dst} failed: {message}")]
  Copy { src: String, dst: String, message: String },

  /// A group directive conflicts with `/etc/group` in the build root.
  #[error("group error: {message}")]
  Group { message: String },

  /// The build root could not be prepared, or is a non-empty directory no build created.
  #[error("invalid build root {path}: {message}")]
  InvalidRoot { path: PathBuf, message: String },

  /// I/O error during execution.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Writing the run configuration failed.
  #[error("serialization error: {0}")]
  Serialize(#[from] serde_json::Error),
}

/// Where and how a plan is executed.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Directory standing in for the container filesystem root.
  pub root: PathBuf,
  /// Directory relative `copy` sources are resolved against.
  pub source_dir: PathBuf,
  /// Shell override for run steps (defaults to `/bin/sh`).
  pub shell: Option<String>,
  /// Report what would run without touching the filesystem.
  pub dry_run: bool,
}

impl ExecuteConfig {
  pub fn new(root: impl Into<PathBuf>, source_dir: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      source_dir: source_dir.into(),
      shell: None,
      dry_run: false,
    }
  }
}

/// What happened to a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
  Executed,
  /// A vendor step whose guard directory already existed.
  Skipped,
  /// Dry run: nothing was done.
  Planned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
  /// 1-based index into the plan's instructions.
  pub position: usize,
  pub summary: String,
  pub outcome: StepOutcome,
}

/// Result of executing a whole plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
  pub root: PathBuf,
  /// One entry per instruction, in execution order.
  pub steps: Vec<StepReport>,
  pub config: ImageConfig,
  /// Digest of the build root contents, absent for dry runs.
  pub root_digest: Option<String>,
}

impl BuildReport {
  pub fn count(&self, outcome: StepOutcome) -> usize {
    self.steps.iter().filter(|s| s.outcome == outcome).count()
  }
}

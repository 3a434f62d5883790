//! The seam between the executor and process spawning.

use std::collections::BTreeMap;
use std::path::Path;

use crate::execute::actions::execute_cmd;
use crate::execute::types::ExecuteError;

/// A shell script to run, with its working directory and extra environment.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
  pub script: &'a str,
  pub cwd: &'a Path,
  pub env: &'a BTreeMap<String, String>,
}

/// Runs the shell scripts of run and vendor steps.
///
/// Implementations report failure with [`ExecuteError::CmdFailed`]; the
/// executor turns that into a step-level error.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
  async fn run(&mut self, invocation: Invocation<'_>) -> Result<String, ExecuteError>;
}

/// Runs scripts with a real shell.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
  pub shell: Option<String>,
}

impl ShellRunner {
  pub fn new(shell: Option<String>) -> Self {
    Self { shell }
  }
}

impl CommandRunner for ShellRunner {
  async fn run(&mut self, invocation: Invocation<'_>) -> Result<String, ExecuteError> {
    execute_cmd(invocation.script, invocation.env, invocation.cwd, self.shell.as_deref()).await
  }
}

//! Shell command execution for run and vendor steps.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::execute::types::ExecuteError;

/// Run `script` through a shell in `cwd`.
///
/// The host environment is inherited; `env` (the manifest's accumulated
/// variables) is layered on top of it. stdout is returned trimmed.
///
/// # Errors
///
/// Returns [`ExecuteError::CmdFailed`] with the exit code when the shell
/// exits unsuccessfully.
pub async fn execute_cmd(
  script: &str,
  env: &BTreeMap<String, String>,
  cwd: &Path,
  shell: Option<&str>,
) -> Result<String, ExecuteError> {
  info!(cmd = %script.trim(), cwd = %cwd.display(), "executing command");

  let (shell_cmd, shell_args) = get_shell(shell);

  let mut command = Command::new(&shell_cmd);
  command.args(&shell_args).arg(script).current_dir(cwd).envs(env);

  debug!(shell = %shell_cmd, "spawning process");

  let output = command.output().await?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }

    return Err(ExecuteError::CmdFailed {
      cmd: script.trim().to_string(),
      code: output.status.code(),
    });
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(stdout)
}

/// Shell binary and the arguments preceding the script.
///
/// Manifests contain POSIX shell, so the default is `/bin/sh` rather than
/// `$SHELL`, which may source user profiles.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    ("cmd.exe".to_string(), vec!["/C".to_string()])
  }
}

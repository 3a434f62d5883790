use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::manifest::{ExecSpec, PermissionOp};
use crate::util::hash::Hashable;

/// A validated build step with every path made absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
  /// Copy a path from the source directory to `dst` in the build context.
  Copy { src: String, dst: String },
  /// Run a shell script in `cwd`.
  Run { command: String, cwd: String },
  /// Set the working directory.
  Workdir { path: String },
  /// Add environment variables.
  Env { vars: BTreeMap<String, String> },
  /// Set the image user.
  User { name: String },
  /// Run `commands` in `cwd` unless `cwd/guard` already exists.
  Vendor {
    guard: String,
    commands: Vec<String>,
    cwd: String,
  },
  /// Permission or group change. `Chmod` paths are absolute.
  Permission(PermissionOp),
}

impl Instruction {
  /// One-line description used in reports and logs.
  pub fn summary(&self) -> String {
    match self {
      Instruction::Copy { src, dst } => format!("copy {} -> {}", src, dst),
      Instruction::Run { command, cwd } => {
        let first = command.trim().lines().next().unwrap_or_default().trim();
        let more = if command.trim().lines().count() > 1 { " ..." } else { "" };
        format!("run ({}) {}{}", cwd, first, more)
      }
      Instruction::Workdir { path } => format!("workdir {}", path),
      Instruction::Env { vars } => {
        let keys: Vec<&str> = vars.keys().map(String::as_str).collect();
        format!("env {}", keys.join(", "))
      }
      Instruction::User { name } => format!("user {}", name),
      Instruction::Vendor { guard, cwd, .. } => format!("vendor ({}) unless {} exists", cwd, guard),
      Instruction::Permission(op) => op.shell_command(),
    }
  }
}

/// Script executed for a vendor step once its guard is found missing.
pub fn vendor_script(commands: &[String]) -> String {
  let mut script = String::from("set -e\n");
  for command in commands {
    script.push_str(command);
    script.push('\n');
  }
  script
}

/// The output of manifest evaluation: ordered instructions plus the run configuration.
///
/// Serialization is deterministic, so the plan hash identifies a manifest's
/// meaning rather than a particular evaluation of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
  pub base_image: String,
  pub instructions: Vec<Instruction>,
  pub exec: ExecSpec,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tags: Vec<String>,
}

impl Hashable for BuildPlan {}

impl BuildPlan {
  /// The configuration a container runtime needs to run the built image.
  pub fn image_config(&self) -> ImageConfig {
    let mut config = ImageConfig {
      base_image: self.base_image.clone(),
      entrypoint: self.exec.entrypoint.clone(),
      cmd: self.exec.cmd.clone(),
      env: BTreeMap::new(),
      user: None,
      working_dir: "/".to_string(),
      tags: self.tags.clone(),
    };

    for instruction in &self.instructions {
      match instruction {
        Instruction::Env { vars } => config.env.extend(vars.clone()),
        Instruction::User { name } => config.user = Some(name.clone()),
        Instruction::Workdir { path } => config.working_dir = path.clone(),
        _ => {}
      }
    }

    config
  }
}

/// Final run configuration of a built image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
  pub base_image: String,
  pub entrypoint: Vec<String>,
  pub cmd: Vec<String>,
  pub env: BTreeMap<String, String>,
  pub user: Option<String>,
  pub working_dir: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tags: Vec<String>,
}

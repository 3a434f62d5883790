//! Plan execution.
//!
//! Runs a [`BuildPlan`] against a build root: a local directory standing in
//! for the container filesystem, where container path `/a/b` is
//! `<root>/a/b`. Instructions run strictly in order and the first failure
//! aborts the build. Nothing is retried or rolled back.
//!
//! The vendor step is the only decision made here rather than at plan time:
//! its guard directory is looked up in the build root when the step is
//! reached.
//!
//! Every build starts from an empty root. A root left by an earlier build
//! (recognised by its `.boxwright` directory) is cleared first; any other
//! non-empty directory is refused.

pub mod actions;
pub mod runner;
pub mod types;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::consts::{IMAGE_CONFIG_FILE, META_DIR, ROOT_ENV};
use crate::manifest::PermissionOp;
use crate::plan::{BuildPlan, Instruction, resolve, vendor_script};
use crate::util::hash::digest_tree;

pub use runner::{CommandRunner, Invocation, ShellRunner};
pub use types::{BuildReport, ExecuteConfig, ExecuteError, StepOutcome, StepReport};

/// Map an absolute container path into the build root.
pub fn host_path(root: &Path, container_path: &str) -> PathBuf {
  let rel = container_path.trim_start_matches('/');
  if rel.is_empty() {
    root.to_path_buf()
  } else {
    root.join(rel)
  }
}

/// Empty the build root and mark it as ours.
fn prepare_root(root: &Path) -> Result<PathBuf, ExecuteError> {
  let invalid = |message: String| ExecuteError::InvalidRoot {
    path: root.to_path_buf(),
    message,
  };

  if root.exists() {
    let occupied = std::fs::read_dir(root)
      .map_err(|e| invalid(e.to_string()))?
      .next()
      .is_some();
    if occupied {
      if !root.join(META_DIR).is_dir() {
        return Err(invalid("directory is not empty and was not created by a build".to_string()));
      }
      debug!(root = %root.display(), "clearing previous build root");
      std::fs::remove_dir_all(root)?;
    }
  }

  std::fs::create_dir_all(root.join(META_DIR))?;
  dunce::canonicalize(root).map_err(|e| invalid(e.to_string()))
}

/// Execute `plan` with a real shell.
pub async fn build(plan: &BuildPlan, config: &ExecuteConfig) -> Result<BuildReport, ExecuteError> {
  let mut runner = ShellRunner::new(config.shell.clone());
  build_with(plan, config, &mut runner).await
}

/// Execute `plan`, sending every shell script through `runner`.
pub async fn build_with<R: CommandRunner>(
  plan: &BuildPlan,
  config: &ExecuteConfig,
  runner: &mut R,
) -> Result<BuildReport, ExecuteError> {
  let total = plan.instructions.len();
  info!(base_image = %plan.base_image, steps = total, root = %config.root.display(), "starting build");

  if config.dry_run {
    let steps = plan
      .instructions
      .iter()
      .enumerate()
      .map(|(index, instruction)| StepReport {
        position: index + 1,
        summary: instruction.summary(),
        outcome: StepOutcome::Planned,
      })
      .collect();
    return Ok(BuildReport {
      root: config.root.clone(),
      steps,
      config: plan.image_config(),
      root_digest: None,
    });
  }

  let root = prepare_root(&config.root)?;

  let mut env: BTreeMap<String, String> = BTreeMap::new();
  env.insert(ROOT_ENV.to_string(), root.display().to_string());

  let mut steps = Vec::with_capacity(total);

  for (index, instruction) in plan.instructions.iter().enumerate() {
    let position = index + 1;
    let summary = instruction.summary();
    info!(step = position, of = total, "{}", summary);

    let outcome = match instruction {
      Instruction::Copy { src, dst } => {
        let source = config.source_dir.join(src);
        let source = dunce::canonicalize(&source).map_err(|e| ExecuteError::Copy {
          src: source.display().to_string(),
          dst: dst.clone(),
          message: e.to_string(),
        })?;
        actions::copy_into(&source, &host_path(&root, dst), &root)?;
        StepOutcome::Executed
      }

      Instruction::Run { command, cwd } => {
        let dir = host_path(&root, cwd);
        std::fs::create_dir_all(&dir)?;
        let invocation = Invocation {
          script: command,
          cwd: &dir,
          env: &env,
        };
        runner.run(invocation).await.map_err(|e| match e {
          ExecuteError::CmdFailed { code, .. } => ExecuteError::StepFailed {
            position,
            summary: summary.clone(),
            code,
          },
          other => other,
        })?;
        StepOutcome::Executed
      }

      Instruction::Workdir { path } => {
        std::fs::create_dir_all(host_path(&root, path))?;
        StepOutcome::Executed
      }

      Instruction::Env { vars } => {
        env.extend(vars.clone());
        StepOutcome::Executed
      }

      Instruction::User { name } => {
        debug!(user = %name, "user recorded for the run configuration");
        StepOutcome::Executed
      }

      Instruction::Vendor { guard, commands, cwd } => {
        let dir = host_path(&root, cwd);
        if host_path(&root, &resolve(cwd, guard)).is_dir() {
          info!(guard = %guard, cwd = %cwd, "guard directory present, skipping vendor step");
          StepOutcome::Skipped
        } else {
          std::fs::create_dir_all(&dir)?;
          let script = vendor_script(commands);
          let invocation = Invocation {
            script: &script,
            cwd: &dir,
            env: &env,
          };
          runner.run(invocation).await.map_err(|e| match e {
            ExecuteError::CmdFailed { code, .. } => ExecuteError::GuardedStepFailed {
              position,
              guard: guard.clone(),
              code,
            },
            other => other,
          })?;
          StepOutcome::Executed
        }
      }

      Instruction::Permission(op) => {
        match op {
          PermissionOp::CreateGroup { name, gid } => actions::create_group(&root, name, *gid)?,
          PermissionOp::AddUserToGroup { user, group } => actions::add_user_to_group(&root, user, group)?,
          PermissionOp::Chmod { path, mode, recursive } => {
            actions::chmod(&host_path(&root, path), *mode, *recursive)?;
          }
        }
        StepOutcome::Executed
      }
    };

    steps.push(StepReport {
      position,
      summary,
      outcome,
    });
  }

  let image_config = plan.image_config();
  std::fs::write(
    root.join(META_DIR).join(IMAGE_CONFIG_FILE),
    serde_json::to_string_pretty(&image_config)?,
  )?;

  let root_digest = digest_tree(&root, &[META_DIR])?;
  info!(digest = %root_digest, "build complete");

  Ok(BuildReport {
    root,
    steps,
    config: image_config,
    root_digest: Some(root_digest),
  })
}

use tracing::{debug, info};

use super::path::{is_established, resolve};
use super::types::{BuildPlan, Instruction};
use crate::manifest::{Directive, ExecSpec, Manifest, PermissionOp};

/// A manifest that cannot be turned into a build plan.
///
/// Positions are 1-based indexes into the manifest's directive list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
  #[error("manifest does not declare a base image")]
  MissingBaseImage,

  #[error("directive {position}: base image already declared")]
  DuplicateBaseImage { position: usize },

  #[error("directive {position}: '{directive}' appears before the base image declaration")]
  DirectiveBeforeBaseImage { position: usize, directive: &'static str },

  #[error("manifest does not declare set_exec")]
  MissingExecSpec,

  #[error("directive {position}: set_exec already declared")]
  DuplicateExecSpec { position: usize },

  #[error("directive {position}: '{directive}' follows set_exec")]
  DirectiveAfterExec { position: usize, directive: &'static str },

  #[error("directive {position}: '{directive}' references {path}, which no prior copy establishes")]
  UnestablishedPath {
    position: usize,
    directive: &'static str,
    path: String,
  },

  #[error("directive {position}: invalid '{directive}': {reason}")]
  Invalid {
    position: usize,
    directive: &'static str,
    reason: String,
  },
}

/// Build state threaded through evaluation.
struct State {
  base_image: Option<String>,
  exec: Option<ExecSpec>,
  copies: Vec<String>,
  workdir: String,
  instructions: Vec<Instruction>,
}

impl State {
  /// Resolve a scoped directory (from `inside`) or fall back to the workdir.
  fn scoped_dir(&self, position: usize, directive: &'static str, cwd: Option<&str>) -> Result<String, ManifestError> {
    match cwd {
      None => Ok(self.workdir.clone()),
      Some(dir) => self.established(position, directive, resolve(&self.workdir, dir)),
    }
  }

  fn established(&self, position: usize, directive: &'static str, path: String) -> Result<String, ManifestError> {
    if is_established(&path, &self.copies) {
      Ok(path)
    } else {
      Err(ManifestError::UnestablishedPath {
        position,
        directive,
        path,
      })
    }
  }
}

fn invalid(position: usize, directive: &'static str, reason: &str) -> ManifestError {
  ManifestError::Invalid {
    position,
    directive,
    reason: reason.to_string(),
  }
}

/// Translate a manifest into a build plan.
///
/// The directives are checked in declaration order against the state built up
/// by the ones before them. Exactly one `from` must come first and exactly one
/// `set_exec` must come last; `workdir`, and `run`/`vendor` scoped by `inside`,
/// may only name paths a prior `copy` established. The first violation is
/// returned and no plan is produced.
pub fn evaluate(manifest: &Manifest) -> Result<BuildPlan, ManifestError> {
  if !manifest.directives.iter().any(|d| matches!(d, Directive::From { .. })) {
    return Err(ManifestError::MissingBaseImage);
  }

  let mut state = State {
    base_image: None,
    exec: None,
    copies: Vec::new(),
    workdir: "/".to_string(),
    instructions: Vec::new(),
  };

  for (index, directive) in manifest.directives.iter().enumerate() {
    let position = index + 1;
    let name = directive.name();

    if state.exec.is_some() {
      return Err(match directive {
        Directive::SetExec(_) => ManifestError::DuplicateExecSpec { position },
        _ => ManifestError::DirectiveAfterExec {
          position,
          directive: name,
        },
      });
    }

    if state.base_image.is_none() && !matches!(directive, Directive::From { .. }) {
      return Err(ManifestError::DirectiveBeforeBaseImage {
        position,
        directive: name,
      });
    }

    debug!(position, directive = name, "evaluating directive");

    match directive {
      Directive::From { image } => {
        if state.base_image.is_some() {
          return Err(ManifestError::DuplicateBaseImage { position });
        }
        if image.trim().is_empty() {
          return Err(invalid(position, name, "image name is empty"));
        }
        state.base_image = Some(image.trim().to_string());
      }

      Directive::Copy { src, dst } => {
        if src.is_empty() || dst.is_empty() {
          return Err(invalid(position, name, "source and destination are required"));
        }
        let dst = resolve(&state.workdir, dst);
        state.copies.push(dst.clone());
        state.instructions.push(Instruction::Copy { src: src.clone(), dst });
      }

      Directive::Run { command, cwd } => {
        if command.trim().is_empty() {
          return Err(invalid(position, name, "command is empty"));
        }
        let cwd = state.scoped_dir(position, name, cwd.as_deref())?;
        state.instructions.push(Instruction::Run {
          command: command.clone(),
          cwd,
        });
      }

      Directive::Workdir { path } => {
        if path.is_empty() {
          return Err(invalid(position, name, "path is empty"));
        }
        let path = state.established(position, name, resolve(&state.workdir, path))?;
        state.workdir = path.clone();
        state.instructions.push(Instruction::Workdir { path });
      }

      Directive::Env { vars } => {
        if vars.is_empty() {
          return Err(invalid(position, name, "no variables given"));
        }
        if let Some(key) = vars.keys().find(|k| k.is_empty() || k.contains('=') || k.contains(char::is_whitespace)) {
          return Err(invalid(position, name, &format!("invalid variable name '{}'", key)));
        }
        state.instructions.push(Instruction::Env { vars: vars.clone() });
      }

      Directive::User { name: user } => {
        if user.trim().is_empty() {
          return Err(invalid(position, name, "user name is empty"));
        }
        state.instructions.push(Instruction::User {
          name: user.trim().to_string(),
        });
      }

      Directive::Vendor { guard, commands, cwd } => {
        if guard.is_empty() {
          return Err(invalid(position, name, "guard directory is empty"));
        }
        if guard.starts_with('/') || guard.split('/').any(|part| part == "..") {
          return Err(invalid(
            position,
            name,
            &format!("guard '{}' must be relative to the step directory", guard),
          ));
        }
        if commands.is_empty() || commands.iter().any(|c| c.trim().is_empty()) {
          return Err(invalid(position, name, "commands must be non-empty"));
        }
        let cwd = state.scoped_dir(position, name, cwd.as_deref())?;
        state.instructions.push(Instruction::Vendor {
          guard: guard.clone(),
          commands: commands.clone(),
          cwd,
        });
      }

      Directive::Permission(op) => {
        let op = match op {
          PermissionOp::CreateGroup { name: group, .. } if group.is_empty() => {
            return Err(invalid(position, name, "group name is empty"));
          }
          PermissionOp::AddUserToGroup { user, group } if user.is_empty() || group.is_empty() => {
            return Err(invalid(position, name, "user and group are required"));
          }
          PermissionOp::Chmod { mode, .. } if *mode > 0o7777 => {
            return Err(invalid(position, name, &format!("mode {:o} out of range", mode)));
          }
          PermissionOp::Chmod { path, mode, recursive } => PermissionOp::Chmod {
            path: resolve(&state.workdir, path),
            mode: *mode,
            recursive: *recursive,
          },
          other => other.clone(),
        };
        state.instructions.push(Instruction::Permission(op));
      }

      Directive::SetExec(spec) => {
        if spec.entrypoint.is_empty() && spec.cmd.is_empty() {
          return Err(invalid(position, name, "entrypoint and cmd are both empty"));
        }
        state.exec = Some(spec.clone());
      }
    }
  }

  let (Some(base_image), Some(exec)) = (state.base_image, state.exec) else {
    return Err(ManifestError::MissingExecSpec);
  };

  info!(
    base_image = %base_image,
    instructions = state.instructions.len(),
    "manifest evaluated"
  );

  Ok(BuildPlan {
    base_image,
    instructions: state.instructions,
    exec,
    tags: manifest.tags.clone(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::hash::Hashable;
  use crate::util::testutil::*;

  const TEST_CMD: &str = "cd /go/src/x && go test -v ./... -check.v";

  fn scenario() -> Manifest {
    manifest(vec![
      from("golang"),
      copy(".", "/go/src/x"),
      workdir("/go/src/x"),
      run("go get -t -v ./..."),
      set_exec(&[], &["/bin/sh", "-c", TEST_CMD]),
    ])
  }

  #[test]
  fn concrete_scenario_produces_exec_spec() {
    let plan = evaluate(&scenario()).unwrap();

    assert_eq!(plan.base_image, "golang");
    assert_eq!(
      plan.exec,
      ExecSpec {
        entrypoint: vec![],
        cmd: vec!["/bin/sh".to_string(), "-c".to_string(), TEST_CMD.to_string()],
      }
    );
    assert_eq!(plan.instructions.len(), 3);
    assert_eq!(
      plan.instructions[2],
      Instruction::Run {
        command: "go get -t -v ./...".to_string(),
        cwd: "/go/src/x".to_string(),
      }
    );
  }

  #[test]
  fn evaluation_is_byte_identical() {
    let first = evaluate(&scenario()).unwrap();
    let second = evaluate(&scenario()).unwrap();

    assert_eq!(
      serde_json::to_vec(&first).unwrap(),
      serde_json::to_vec(&second).unwrap()
    );
    assert_eq!(first.compute_hash().unwrap(), second.compute_hash().unwrap());
  }

  #[test]
  fn instructions_keep_declaration_order() {
    let commands = ["echo 1", "echo 2", "echo 3", "echo 4"];
    let mut directives = vec![from("scratch")];
    directives.extend(commands.iter().map(|c| run(c)));
    directives.push(set_exec(&[], &["true"]));

    let plan = evaluate(&manifest(directives)).unwrap();
    let trace: Vec<&str> = plan
      .instructions
      .iter()
      .map(|i| match i {
        Instruction::Run { command, .. } => command.as_str(),
        _ => "",
      })
      .collect();

    assert_eq!(trace, commands);
  }

  mod base_image {
    use super::*;

    #[test]
    fn missing_base_image_fails() {
      let result = evaluate(&manifest(vec![copy(".", "/src"), set_exec(&[], &["true"])]));
      assert_eq!(result, Err(ManifestError::MissingBaseImage));
    }

    #[test]
    fn empty_manifest_fails() {
      assert_eq!(evaluate(&Manifest::new()), Err(ManifestError::MissingBaseImage));
    }

    #[test]
    fn duplicate_base_image_fails() {
      let result = evaluate(&manifest(vec![from("golang"), from("alpine"), set_exec(&[], &["true"])]));
      assert_eq!(result, Err(ManifestError::DuplicateBaseImage { position: 2 }));
    }

    #[test]
    fn directive_before_base_image_fails() {
      let result = evaluate(&manifest(vec![run("true"), from("golang"), set_exec(&[], &["true"])]));
      assert_eq!(
        result,
        Err(ManifestError::DirectiveBeforeBaseImage {
          position: 1,
          directive: "run",
        })
      );
    }

    #[test]
    fn blank_image_fails() {
      let result = evaluate(&manifest(vec![from("  "), set_exec(&[], &["true"])]));
      assert!(matches!(result, Err(ManifestError::Invalid { position: 1, .. })));
    }
  }

  mod exec_spec {
    use super::*;

    #[test]
    fn missing_exec_fails() {
      let result = evaluate(&manifest(vec![from("golang"), run("true")]));
      assert_eq!(result, Err(ManifestError::MissingExecSpec));
    }

    #[test]
    fn duplicate_exec_fails() {
      let result = evaluate(&manifest(vec![
        from("golang"),
        set_exec(&[], &["true"]),
        set_exec(&[], &["false"]),
      ]));
      assert_eq!(result, Err(ManifestError::DuplicateExecSpec { position: 3 }));
    }

    #[test]
    fn directive_after_exec_fails() {
      let result = evaluate(&manifest(vec![from("golang"), set_exec(&[], &["true"]), run("true")]));
      assert_eq!(
        result,
        Err(ManifestError::DirectiveAfterExec {
          position: 3,
          directive: "run",
        })
      );
    }

    #[test]
    fn empty_exec_fails() {
      let result = evaluate(&manifest(vec![from("golang"), set_exec(&[], &[])]));
      assert!(matches!(result, Err(ManifestError::Invalid { position: 2, .. })));
    }
  }

  mod paths {
    use super::*;

    #[test]
    fn workdir_before_copy_fails() {
      let result = evaluate(&manifest(vec![
        from("golang"),
        workdir("/go/src/x"),
        copy(".", "/go/src/x"),
        set_exec(&[], &["true"]),
      ]));
      assert_eq!(
        result,
        Err(ManifestError::UnestablishedPath {
          position: 2,
          directive: "workdir",
          path: "/go/src/x".to_string(),
        })
      );
    }

    #[test]
    fn scoped_run_outside_copy_fails() {
      let result = evaluate(&manifest(vec![
        from("golang"),
        copy(".", "/go/src/x"),
        run_in("/opt", "ls"),
        set_exec(&[], &["true"]),
      ]));
      assert!(matches!(
        result,
        Err(ManifestError::UnestablishedPath { position: 3, directive: "run", .. })
      ));
    }

    #[test]
    fn relative_paths_resolve_against_workdir() {
      let plan = evaluate(&manifest(vec![
        from("golang"),
        copy(".", "/go/src/x"),
        workdir("/go/src/x"),
        copy("extra", "vendor/extra"),
        run_in("vendor", "ls"),
        set_exec(&[], &["true"]),
      ]))
      .unwrap();

      assert_eq!(
        plan.instructions[2],
        Instruction::Copy {
          src: "extra".to_string(),
          dst: "/go/src/x/vendor/extra".to_string(),
        }
      );
      assert_eq!(
        plan.instructions[3],
        Instruction::Run {
          command: "ls".to_string(),
          cwd: "/go/src/x/vendor".to_string(),
        }
      );
    }

    #[test]
    fn ancestor_of_copy_is_usable() {
      let plan = evaluate(&manifest(vec![
        from("golang"),
        copy(".", "/go/src/x"),
        workdir("/go"),
        set_exec(&[], &["true"]),
      ]))
      .unwrap();
      assert_eq!(plan.image_config().working_dir, "/go");
    }

    #[test]
    fn chmod_path_is_resolved() {
      let plan = evaluate(&manifest(vec![
        from("golang"),
        copy(".", "/src"),
        workdir("/src"),
        Directive::Permission(PermissionOp::Chmod {
          path: ".".to_string(),
          mode: 0o777,
          recursive: false,
        }),
        set_exec(&[], &["true"]),
      ]))
      .unwrap();

      assert_eq!(
        plan.instructions[2],
        Instruction::Permission(PermissionOp::Chmod {
          path: "/src".to_string(),
          mode: 0o777,
          recursive: false,
        })
      );
    }
  }

  mod vendor {
    use super::*;

    #[test]
    fn vendor_step_is_planned_in_scope() {
      let plan = evaluate(&manifest(vec![
        from("golang"),
        copy(".", "/go/src/x"),
        vendor("/go/src/x", "vendor", &["go get github.com/LK4D4/vndr", "vndr"]),
        set_exec(&[], &["true"]),
      ]))
      .unwrap();

      assert_eq!(
        plan.instructions[1],
        Instruction::Vendor {
          guard: "vendor".to_string(),
          commands: vec!["go get github.com/LK4D4/vndr".to_string(), "vndr".to_string()],
          cwd: "/go/src/x".to_string(),
        }
      );
    }

    #[test]
    fn vendor_without_commands_fails() {
      let result = evaluate(&manifest(vec![
        from("golang"),
        copy(".", "/go/src/x"),
        vendor("/go/src/x", "vendor", &[]),
        set_exec(&[], &["true"]),
      ]));
      assert!(matches!(result, Err(ManifestError::Invalid { position: 3, .. })));
    }

    #[test]
    fn guard_outside_step_dir_fails() {
      for guard in ["/tmp", "../../../../../../../../../etc", "vendor/../../x"] {
        let result = evaluate(&manifest(vec![
          from("golang"),
          copy(".", "/go/src/x"),
          vendor("/go/src/x", guard, &["vndr"]),
          set_exec(&[], &["true"]),
        ]));
        assert!(
          matches!(result, Err(ManifestError::Invalid { position: 3, directive: "vendor", .. })),
          "guard {:?} was accepted",
          guard
        );
      }
    }

    #[test]
    fn nested_guard_is_accepted() {
      let plan = evaluate(&manifest(vec![
        from("golang"),
        copy(".", "/go/src/x"),
        vendor("/go/src/x", "third_party/vendor", &["vndr"]),
        set_exec(&[], &["true"]),
      ]))
      .unwrap();
      assert!(matches!(&plan.instructions[1], Instruction::Vendor { guard, .. } if guard == "third_party/vendor"));
    }
  }

  #[test]
  fn invalid_env_key_fails() {
    let mut vars = std::collections::BTreeMap::new();
    vars.insert("BAD KEY".to_string(), "x".to_string());
    let result = evaluate(&manifest(vec![
      from("golang"),
      Directive::Env { vars },
      set_exec(&[], &["true"]),
    ]));
    assert!(matches!(result, Err(ManifestError::Invalid { directive: "env", .. })));
  }

  #[test]
  fn tags_are_carried_over() {
    let mut m = scenario();
    m.tags.push("overmount:test".to_string());
    let plan = evaluate(&m).unwrap();
    assert_eq!(plan.tags, vec!["overmount:test"]);
  }
}

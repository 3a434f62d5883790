//! Test helpers for boxwright-lib.

use crate::manifest::{Directive, ExecSpec, Manifest};

/// Builds a manifest from directives.
pub fn manifest(directives: Vec<Directive>) -> Manifest {
  Manifest {
    directives,
    tags: Vec::new(),
  }
}

pub fn from(image: &str) -> Directive {
  Directive::From {
    image: image.to_string(),
  }
}

pub fn copy(src: &str, dst: &str) -> Directive {
  Directive::Copy {
    src: src.to_string(),
    dst: dst.to_string(),
  }
}

pub fn run(command: &str) -> Directive {
  Directive::Run {
    command: command.to_string(),
    cwd: None,
  }
}

pub fn run_in(cwd: &str, command: &str) -> Directive {
  Directive::Run {
    command: command.to_string(),
    cwd: Some(cwd.to_string()),
  }
}

pub fn workdir(path: &str) -> Directive {
  Directive::Workdir { path: path.to_string() }
}

pub fn vendor(cwd: &str, guard: &str, commands: &[&str]) -> Directive {
  Directive::Vendor {
    guard: guard.to_string(),
    commands: commands.iter().map(|c| c.to_string()).collect(),
    cwd: Some(cwd.to_string()),
  }
}

pub fn set_exec(entrypoint: &[&str], cmd: &[&str]) -> Directive {
  Directive::SetExec(ExecSpec {
    entrypoint: entrypoint.iter().map(|s| s.to_string()).collect(),
    cmd: cmd.iter().map(|s| s.to_string()).collect(),
  })
}

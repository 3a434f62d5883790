//! Manifest types for boxwright.
//!
//! The manifest captures what a build script declared, in declaration order.
//! Nothing here is validated: a manifest may lack a base image or carry two
//! `set_exec` directives. [`crate::plan::evaluate`] is responsible for turning
//! it into a checked [`crate::plan::BuildPlan`].
//!
//! # Example
//!
//! ```json
//! {
//!   "directives": [
//!     { "kind": "from", "image": "golang" },
//!     { "kind": "copy", "src": ".", "dst": "/go/src/x" },
//!     { "kind": "workdir", "path": "/go/src/x" },
//!     { "kind": "set_exec", "entrypoint": [], "cmd": ["make", "test"] }
//!   ],
//!   "tags": []
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The entrypoint/command pair the resulting image is invoked with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecSpec {
  pub entrypoint: Vec<String>,
  pub cmd: Vec<String>,
}

/// Declarative filesystem permission and group changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PermissionOp {
  /// Create a group with a fixed gid.
  CreateGroup { name: String, gid: u32 },
  /// Append a user to an existing group's member list.
  AddUserToGroup { user: String, group: String },
  /// Change the mode of a path, optionally for the whole tree below it.
  Chmod { path: String, mode: u32, recursive: bool },
}

impl PermissionOp {
  /// Shell equivalent of this operation, used when rendering Dockerfiles.
  pub fn shell_command(&self) -> String {
    match self {
      PermissionOp::CreateGroup { name, gid } => format!("groupadd -g {} {}", gid, name),
      PermissionOp::AddUserToGroup { user, group } => format!("usermod -aG {} {}", group, user),
      PermissionOp::Chmod { path, mode, recursive } => {
        if *recursive {
          format!("chmod -R {:o} {}", mode, path)
        } else {
          format!("chmod {:o} {}", mode, path)
        }
      }
    }
  }
}

/// A single declared step of a build script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
  /// Base image selection.
  From { image: String },
  /// Copy a local path into the build context.
  Copy { src: String, dst: String },
  /// Opaque shell script. `cwd` is set when declared inside an `inside` block.
  Run { command: String, cwd: Option<String> },
  /// Change the working directory for later steps and the final image.
  Workdir { path: String },
  /// Environment variables for later steps and the final image.
  Env { vars: BTreeMap<String, String> },
  /// User for the final image.
  User { name: String },
  /// Run `commands` only if `guard` does not exist below the working directory.
  Vendor {
    guard: String,
    commands: Vec<String>,
    cwd: Option<String>,
  },
  /// Permission or group change applied to the build filesystem.
  Permission(PermissionOp),
  /// Final run configuration.
  SetExec(ExecSpec),
}

impl Directive {
  /// Short name of the directive as written in a build script.
  pub fn name(&self) -> &'static str {
    match self {
      Directive::From { .. } => "from",
      Directive::Copy { .. } => "copy",
      Directive::Run { .. } => "run",
      Directive::Workdir { .. } => "workdir",
      Directive::Env { .. } => "env",
      Directive::User { .. } => "user",
      Directive::Vendor { .. } => "vendor",
      Directive::Permission(PermissionOp::CreateGroup { .. }) => "group",
      Directive::Permission(PermissionOp::AddUserToGroup { .. }) => "add_to_group",
      Directive::Permission(PermissionOp::Chmod { .. }) => "chmod",
      Directive::SetExec(_) => "set_exec",
    }
  }
}

/// Ordered directives plus image metadata, as declared by a build script.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
  pub directives: Vec<Directive>,
  pub tags: Vec<String>,
}

impl Manifest {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a directive, keeping declaration order.
  pub fn push(&mut self, directive: Directive) {
    self.directives.push(directive);
  }
}

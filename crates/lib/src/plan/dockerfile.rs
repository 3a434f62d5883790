//! Dockerfile rendering of a build plan.
//!
//! Scoped runs become `cd <dir> && ...` so the rendered file keeps the same
//! working directory semantics without extra `WORKDIR` lines. The vendor step
//! renders as a shell `if` block, which is where its guard is decided when a
//! container builder runs the file.
//!
//! `COPY` sources are written relative to the build context, the directory
//! holding the manifest.

use std::path::{Component, Path, PathBuf};

use super::types::{BuildPlan, Instruction};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
  /// A `copy` source that a Dockerfile cannot reach from the build context.
  #[error("copy source '{src}' is outside the build context {}", .context.display())]
  SourceOutsideContext { src: String, context: PathBuf },
}

const HEREDOC_MARKER: &str = "BOXWRIGHT";

/// Quote a word for POSIX sh unless it is made of safe characters only.
pub fn sh_quote(word: &str) -> String {
  let safe = !word.is_empty()
    && word
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || "/._-+:=@%,".contains(c));
  if safe {
    word.to_string()
  } else {
    format!("'{}'", word.replace('\'', r"'\''"))
  }
}

fn json_array(items: &[String]) -> String {
  serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn json_string(value: &str) -> String {
  serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

/// Script lines without surrounding blank lines and without the indent they
/// all share. Deeper indentation is kept.
fn dedent(script: &str) -> Vec<&str> {
  let lines: Vec<&str> = script.lines().map(str::trim_end).collect();
  let Some(first) = lines.iter().position(|l| !l.is_empty()) else {
    return Vec::new();
  };
  let last = lines.iter().rposition(|l| !l.is_empty()).unwrap_or(first);
  let lines = &lines[first..=last];

  let indent = lines
    .iter()
    .filter(|l| !l.is_empty())
    .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
    .min()
    .unwrap_or(0);

  lines.iter().map(|l| l.get(indent..).unwrap_or("")).collect()
}

/// Body of a `RUN` line. Multi-line scripts become a heredoc.
fn run_body(script: &str, cwd: &str, workdir: &str) -> String {
  let lines = dedent(script);

  if lines.len() > 1 {
    let mut body = Vec::new();
    if cwd != workdir {
      body.push(format!("cd {}", sh_quote(cwd)));
    }
    body.extend(lines.iter().map(|l| l.to_string()));
    return format!("<<'{marker}'\n{}\n{marker}", body.join("\n"), marker = HEREDOC_MARKER);
  }

  let script = lines.first().map(|l| l.trim()).unwrap_or_default();

  if cwd == workdir {
    script.to_string()
  } else {
    format!("cd {} && {}", sh_quote(cwd), script)
  }
}

fn vendor_body(guard: &str, commands: &[String]) -> String {
  format!("if [ ! -d {} ]; then set -e; {}; fi", sh_quote(guard), commands.join("; "))
}

/// `src` as a path relative to `context`, `/`-separated.
fn context_source(src: &str, context: &Path) -> Result<String, RenderError> {
  let outside = || RenderError::SourceOutsideContext {
    src: src.to_string(),
    context: context.to_path_buf(),
  };

  let path = Path::new(src);
  let rel = if path.is_absolute() {
    path.strip_prefix(context).map_err(|_| outside())?
  } else {
    path
  };

  let mut parts = Vec::new();
  for component in rel.components() {
    match component {
      Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
      Component::CurDir => {}
      _ => return Err(outside()),
    }
  }

  Ok(if parts.is_empty() { ".".to_string() } else { parts.join("/") })
}

/// Render `plan` as a Dockerfile whose build context is `context`.
///
/// The base image's own `WORKDIR` is reset to `/`, which is where unscoped
/// steps run during a local build.
pub fn render(plan: &BuildPlan, context: &Path) -> Result<String, RenderError> {
  let mut out = Vec::new();
  let mut workdir = "/".to_string();

  out.push(format!("FROM {}", plan.base_image));
  out.push(format!("WORKDIR {}", workdir));

  for instruction in &plan.instructions {
    match instruction {
      Instruction::Copy { src, dst } => out.push(format!("COPY {} {}", context_source(src, context)?, dst)),
      Instruction::Run { command, cwd } => out.push(format!("RUN {}", run_body(command, cwd, &workdir))),
      Instruction::Workdir { path } => {
        workdir = path.clone();
        out.push(format!("WORKDIR {}", path));
      }
      Instruction::Env { vars } => {
        let pairs: Vec<String> = vars.iter().map(|(k, v)| format!("{}={}", k, json_string(v))).collect();
        out.push(format!("ENV {}", pairs.join(" ")));
      }
      Instruction::User { name } => out.push(format!("USER {}", name)),
      Instruction::Vendor { guard, commands, cwd } => {
        out.push(format!("RUN {}", run_body(&vendor_body(guard, commands), cwd, &workdir)));
      }
      Instruction::Permission(op) => out.push(format!("RUN {}", op.shell_command())),
    }
  }

  out.push(format!("ENTRYPOINT {}", json_array(&plan.exec.entrypoint)));
  out.push(format!("CMD {}", json_array(&plan.exec.cmd)));

  let mut rendered = out.join("\n");
  rendered.push('\n');
  Ok(rendered)
}

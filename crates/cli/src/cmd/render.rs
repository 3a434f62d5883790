//! Implementation of the `boxw render` command.
//!
//! The manifest's directory is the build context of the rendered Dockerfile.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use boxwright_lib::eval::evaluate_plan;
use boxwright_lib::plan::dockerfile;

use crate::output::print_success;

pub fn cmd_render(file: &Path, output: Option<&Path>) -> Result<()> {
  let plan = evaluate_plan(file).with_context(|| format!("Failed to evaluate manifest: {}", file.display()))?;

  let manifest_path =
    dunce::canonicalize(file).with_context(|| format!("Failed to resolve manifest path: {}", file.display()))?;
  let context = manifest_path.parent().context("Manifest has no parent directory")?;

  let rendered = dockerfile::render(&plan, context).context("Failed to render Dockerfile")?;

  match output {
    Some(path) => {
      fs::write(path, &rendered).with_context(|| format!("Failed to write {}", path.display()))?;
      print_success(&format!("Wrote {}", path.display()));
    }
    None => print!("{}", rendered),
  }
  Ok(())
}

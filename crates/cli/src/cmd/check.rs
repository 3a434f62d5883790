//! Implementation of the `boxw check` command.

use std::path::Path;

use anyhow::{Context, Result};

use boxwright_lib::eval::evaluate_plan;

use crate::output::print_success;

pub fn cmd_check(file: &Path) -> Result<()> {
  let plan = evaluate_plan(file).with_context(|| format!("Failed to evaluate manifest: {}", file.display()))?;

  print_success(&format!(
    "{} is valid ({} steps on {})",
    file.display(),
    plan.instructions.len(),
    plan.base_image
  ));
  Ok(())
}

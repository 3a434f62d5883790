//! Implementation of the `boxw plan` command.
//!
//! Evaluates a build manifest and writes the resulting plan to
//! `<data dir>/plans/<hash>/plan.json`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use boxwright_lib::eval::evaluate_plan;
use boxwright_lib::util::hash::Hashable;
use boxwright_lib::util::paths::plans_dir;

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

pub fn cmd_plan(file: &Path, format: OutputFormat) -> Result<()> {
  let plan = evaluate_plan(file).with_context(|| format!("Failed to evaluate manifest: {}", file.display()))?;

  let hash = plan.compute_hash().context("Failed to compute plan hash")?;

  let plan_dir = plans_dir().join(&hash.0);
  fs::create_dir_all(&plan_dir).with_context(|| format!("Failed to create plan directory: {}", plan_dir.display()))?;

  let plan_path = plan_dir.join("plan.json");
  let plan_json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
  fs::write(&plan_path, &plan_json).with_context(|| format!("Failed to write plan: {}", plan_path.display()))?;

  if format.is_json() {
    return print_json(&serde_json::json!({
      "hash": hash.0,
      "path": plan_path,
      "plan": plan,
    }));
  }

  print_success(&format!("Plan: {}", hash));
  print_stat("Base image", &plan.base_image);
  print_stat("Steps", &plan.instructions.len().to_string());
  print_stat("Path", &plan_path.display().to_string());
  println!();
  for (index, instruction) in plan.instructions.iter().enumerate() {
    println!("  {:>3}. {}", index + 1, instruction.summary());
  }
  println!();
  print_info(&format!(
    "exec: entrypoint {:?} cmd {:?}",
    plan.exec.entrypoint, plan.exec.cmd
  ));

  Ok(())
}

//! Implementation of the `boxw build` command.
//!
//! Evaluates a build manifest and executes the plan against a local build
//! root. Relative `copy` sources resolve against the manifest's directory.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use boxwright_lib::eval::evaluate_plan;
use boxwright_lib::execute::{ExecuteConfig, StepOutcome, build};
use boxwright_lib::util::hash::Hashable;
use boxwright_lib::util::paths;

use crate::output::{OutputFormat, format_duration, print_json, print_stat, print_step, print_success, truncate_hash};

pub struct BuildArgs {
  pub root: Option<PathBuf>,
  pub shell: Option<String>,
  pub dry_run: bool,
  pub format: OutputFormat,
}

pub fn cmd_build(file: &Path, args: BuildArgs) -> Result<()> {
  let started = Instant::now();

  let plan = evaluate_plan(file).with_context(|| format!("Failed to evaluate manifest: {}", file.display()))?;
  let hash = plan.compute_hash().context("Failed to compute plan hash")?;

  let manifest_path =
    dunce::canonicalize(file).with_context(|| format!("Failed to resolve manifest path: {}", file.display()))?;
  let source_dir = manifest_path
    .parent()
    .map(Path::to_path_buf)
    .context("Manifest has no parent directory")?;

  let root = args.root.unwrap_or_else(|| paths::build_root(&hash));

  let mut config = ExecuteConfig::new(&root, source_dir);
  config.shell = args.shell.or_else(paths::shell_override);
  config.dry_run = args.dry_run;

  info!(plan = %hash, root = %root.display(), "building");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(build(&plan, &config)).context("Build failed")?;

  if args.format.is_json() {
    return print_json(&report);
  }

  for step in &report.steps {
    print_step(step.position, &step.summary, step.outcome);
  }
  println!();

  if args.dry_run {
    print_success(&format!("Dry run: {} steps planned", report.count(StepOutcome::Planned)));
  } else {
    print_success(&format!("Build complete in {}", format_duration(started.elapsed())));
  }
  print_stat("Plan", truncate_hash(&hash.0));
  print_stat("Root", &report.root.display().to_string());
  print_stat("Executed", &report.count(StepOutcome::Executed).to_string());
  print_stat("Skipped", &report.count(StepOutcome::Skipped).to_string());
  if let Some(digest) = &report.root_digest {
    print_stat("Digest", truncate_hash(digest));
  }

  Ok(())
}

//! CLI output formatting.
//!
//! Colored status lines, step symbols and duration formatting.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use boxwright_lib::execute::StepOutcome;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
}

pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

/// Human-readable duration, rounded to milliseconds.
pub fn format_duration(duration: Duration) -> String {
  let millis = Duration::from_millis(duration.as_millis() as u64);
  humantime::format_duration(millis).to_string()
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// One line per build step: `✓` executed, `→` skipped, `•` planned.
pub fn print_step(position: usize, summary: &str, outcome: StepOutcome) {
  let index = format!("{:>3}.", position);
  match outcome {
    StepOutcome::Executed => println!(
      "{} {} {}",
      symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
      index,
      summary
    ),
    StepOutcome::Skipped => println!(
      "{} {} {} {}",
      symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.yellow()),
      index,
      summary,
      "(skipped)".if_supports_color(Stream::Stdout, |s| s.dimmed())
    ),
    StepOutcome::Planned => println!(
      "{} {} {}",
      symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
      index,
      summary
    ),
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

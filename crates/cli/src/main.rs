mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use boxwright_lib::consts::DEFAULT_MANIFEST;

use crate::output::{OutputFormat, print_error};

/// boxwright - evaluate and run container build manifests
#[derive(Parser)]
#[command(name = "boxw")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate a build manifest
  Check {
    /// Path to the build manifest
    #[arg(default_value = DEFAULT_MANIFEST)]
    file: PathBuf,
  },

  /// Evaluate a build manifest and store the resulting plan
  Plan {
    /// Path to the build manifest
    #[arg(default_value = DEFAULT_MANIFEST)]
    file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Render the plan as a Dockerfile
  Render {
    /// Path to the build manifest
    #[arg(default_value = DEFAULT_MANIFEST)]
    file: PathBuf,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Execute the plan against a local build root
  Build {
    /// Path to the build manifest
    #[arg(default_value = DEFAULT_MANIFEST)]
    file: PathBuf,

    /// Build root directory (default: $BOXWRIGHT_ROOT or the cache dir)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Shell used for run steps (default: $BOXWRIGHT_SHELL or /bin/sh)
    #[arg(long)]
    shell: Option<String>,

    /// Show the steps without executing them
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Show version, platform and directories
  Info,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Check { file } => cmd::cmd_check(&file),
    Commands::Plan { file, format } => cmd::cmd_plan(&file, format),
    Commands::Render { file, output } => cmd::cmd_render(&file, output.as_deref()),
    Commands::Build {
      file,
      root,
      shell,
      dry_run,
      format,
    } => cmd::cmd_build(
      &file,
      cmd::BuildArgs {
        root,
        shell,
        dry_run,
        format,
      },
    ),
    Commands::Info => {
      cmd::cmd_info();
      Ok(())
    }
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}

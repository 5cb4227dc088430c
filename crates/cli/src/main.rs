mod cmd;
mod output;

use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use promote_lib::consts::{CHARTS_ENV, DEFAULT_KUSTOMIZE_BIN, DEPLOYMENT_DIR_ENV, IMAGES_ENV, KUSTOMIZE_BIN_ENV};
use promote_lib::input::ChangeSet;
use promote_lib::promote::PromoteError;

/// Promote container images and helm charts between kustomize overlays
#[derive(Parser)]
#[command(name = "promote")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Directory containing one subdirectory per overlay
  #[arg(long, global = true, env = DEPLOYMENT_DIR_ENV, default_value = ".")]
  deployment_dir: PathBuf,

  /// JSON list of image changes
  #[arg(long, global = true, env = IMAGES_ENV)]
  images: Option<String>,

  /// JSON list of helm chart changes
  #[arg(long, global = true, env = CHARTS_ENV)]
  charts: Option<String>,

  /// The kustomize binary to run
  #[arg(long, global = true, env = KUSTOMIZE_BIN_ENV, default_value = DEFAULT_KUSTOMIZE_BIN)]
  kustomize: PathBuf,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Update the target overlays and print the promotion manifest (default)
  Apply,

  /// Validate and resolve the change-set, printing what apply would do
  Plan,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      match err.downcast_ref::<PromoteError>() {
        Some(PromoteError::NoChanges) => error!("{}", promote_lib::input::USAGE),
        Some(promote_err) => error!(category = promote_err.category(), "{:#}", err),
        None => error!("{:#}", err),
      }
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  let stdin = read_stdin(&cli)?;
  let change_set = ChangeSet::from_inputs(cli.images.as_deref(), cli.charts.as_deref(), stdin.as_deref())?;
  if change_set.is_empty() {
    return Err(PromoteError::NoChanges.into());
  }

  match cli.command.unwrap_or(Commands::Apply) {
    Commands::Apply => cmd::cmd_apply(&change_set, &cli.deployment_dir, &cli.kustomize),
    Commands::Plan => cmd::cmd_plan(&change_set, &cli.deployment_dir),
  }
}

/// Read stdin only when no change-set was passed and something is piped in.
fn read_stdin(cli: &Cli) -> Result<Option<String>> {
  let given = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
  if given(&cli.images) || given(&cli.charts) {
    return Ok(None);
  }

  let mut stdin = std::io::stdin();
  if stdin.is_terminal() {
    return Ok(None);
  }

  let mut buffer = String::new();
  stdin.read_to_string(&mut buffer).context("Failed to read stdin")?;
  Ok(Some(buffer))
}

fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(std::io::stderr().is_terminal())
    .with_target(false)
    .without_time()
    .init();
}

//! External command invocation.
//!
//! Every kustomize call goes through [`CommandRunner`] with an explicit working
//! directory. The process-wide current directory is never changed.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, error, info};

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
  /// The program could not be started (not installed, not executable, ...).
  #[error("failed to run '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// The program exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {command}")]
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  pub stdout: String,
  pub stderr: String,
}

/// Runs the configuration tool.
///
/// Implementations receive the tool's arguments (without the program name) and
/// the directory to run in.
pub trait CommandRunner {
  fn run(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
  fn run(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, CommandError> {
    (**self).run(args, cwd)
  }
}

/// Runs the real `kustomize` binary.
#[derive(Debug, Clone)]
pub struct Kustomize {
  binary: PathBuf,
}

impl Kustomize {
  pub fn new(binary: impl Into<PathBuf>) -> Self {
    Self { binary: binary.into() }
  }

  pub fn binary(&self) -> &Path {
    &self.binary
  }
}

impl CommandRunner for Kustomize {
  fn run(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, CommandError> {
    let program = self.binary.display().to_string();
    let command_line = render(&program, args);
    debug!(command = %command_line, cwd = %cwd.display(), "running command");

    let output = Command::new(&self.binary)
      .args(args)
      .current_dir(cwd)
      .output()
      .map_err(|source| CommandError::Spawn {
        program: program.clone(),
        source,
      })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !stderr.is_empty() {
      error!(command = %program, "{}", stderr);
    }
    if !stdout.is_empty() {
      info!(command = %program, "{}", stdout);
    }

    if !output.status.success() {
      return Err(CommandError::Failed {
        command: command_line,
        code: output.status.code(),
        stderr,
      });
    }

    Ok(CommandOutput { stdout, stderr })
  }
}

/// Check that the tool can be executed at all.
pub fn check_available(runner: &impl CommandRunner, cwd: &Path) -> Result<(), CommandError> {
  debug!("checking that kustomize is available");
  runner.run(&["version".to_string()], cwd).map(|_| ())
}

fn render(program: &str, args: &[String]) -> String {
  std::iter::once(program).chain(args.iter().map(String::as_str)).collect::<Vec<_>>().join(" ")
}

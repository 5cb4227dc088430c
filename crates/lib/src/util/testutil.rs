//! Test utilities for promote-lib.
//!
//! Helpers for laying out overlays on disk and for observing the commands a
//! promotion would run.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::mutate::{CommandError, CommandOutput, CommandRunner};

/// Write `content` to `<root>/<overlay>/kustomization.yaml`, creating the directory.
pub fn write_overlay(root: &Path, overlay: &str, content: &str) -> PathBuf {
  let dir = root.join(overlay);
  fs::create_dir_all(&dir).unwrap();
  let path = dir.join("kustomization.yaml");
  fs::write(&path, content).unwrap();
  path
}

/// Write an executable `/bin/sh` script and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
  fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// One call observed by [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
  pub args: Vec<String>,
  pub cwd: PathBuf,
}

/// A [`CommandRunner`] that records calls instead of spawning anything.
#[derive(Debug, Default)]
pub struct RecordingRunner {
  calls: RefCell<Vec<RecordedCall>>,
  fail: bool,
}

impl RecordingRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// A runner whose every call fails with a non-zero exit.
  pub fn failing() -> Self {
    Self {
      fail: true,
      ..Self::default()
    }
  }

  pub fn calls(&self) -> Vec<RecordedCall> {
    self.calls.borrow().clone()
  }
}

impl CommandRunner for RecordingRunner {
  fn run(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, CommandError> {
    self.calls.borrow_mut().push(RecordedCall {
      args: args.to_vec(),
      cwd: cwd.to_path_buf(),
    });

    if self.fail {
      return Err(CommandError::Failed {
        command: format!("kustomize {}", args.join(" ")),
        code: Some(1),
        stderr: "simulated failure".to_string(),
      });
    }

    Ok(CommandOutput::default())
  }
}

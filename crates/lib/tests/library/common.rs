//! Shared helpers for library integration tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use promote_lib::mutate::{CommandError, CommandOutput, CommandRunner};
use tempfile::TempDir;

/// A deployment root in a temporary directory.
pub struct Deployment {
  pub temp: TempDir,
}

impl Deployment {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Write `<overlay>/kustomization.yaml`.
  pub fn overlay(&self, name: &str, content: &str) -> &Self {
    let dir = self.root().join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("kustomization.yaml"), content).unwrap();
    self
  }

  pub fn read(&self, overlay: &str) -> String {
    std::fs::read_to_string(self.root().join(overlay).join("kustomization.yaml")).unwrap()
  }
}

/// Records kustomize invocations as `(cwd, args)` pairs.
#[derive(Default)]
pub struct Recorder {
  pub calls: RefCell<Vec<(PathBuf, Vec<String>)>>,
}

impl CommandRunner for Recorder {
  fn run(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, CommandError> {
    self.calls.borrow_mut().push((cwd.to_path_buf(), args.to_vec()));
    Ok(CommandOutput::default())
  }
}

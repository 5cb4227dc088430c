//! Kustomization document handling.
//!
//! The document is kept as a generic YAML mapping so that edits touch only the
//! keys they mean to change. Formatting is not preserved by `serde_yaml`; the
//! chart mutator runs `kustomize cfg fmt` after every write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::OverlayError;
use crate::consts::KUSTOMIZATION_FILENAMES;

/// A parsed kustomization file belonging to one overlay.
#[derive(Debug, Clone)]
pub struct Kustomization {
  overlay: String,
  path: PathBuf,
  document: Mapping,
}

impl Kustomization {
  /// The kustomization file for an overlay directory.
  ///
  /// Returns the first of `kustomization.yaml`, `kustomization.yml` and
  /// `Kustomization` that exists, or the first candidate if none do.
  pub fn locate(overlay_dir: &Path) -> PathBuf {
    KUSTOMIZATION_FILENAMES
      .iter()
      .map(|name| overlay_dir.join(name))
      .find(|path| path.is_file())
      .unwrap_or_else(|| overlay_dir.join(KUSTOMIZATION_FILENAMES[0]))
  }

  /// Load and parse the kustomization in `overlay_dir`.
  ///
  /// # Errors
  ///
  /// - [`OverlayError::NotFound`] if no kustomization file exists
  /// - [`OverlayError::Read`] if the file cannot be read
  /// - [`OverlayError::Malformed`] if it is not a YAML mapping
  pub fn load(overlay: &str, overlay_dir: &Path) -> Result<Self, OverlayError> {
    let path = Self::locate(overlay_dir);

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(OverlayError::NotFound {
          overlay: overlay.to_string(),
          path,
        });
      }
      Err(source) => return Err(OverlayError::Read { path, source }),
    };

    let document: Mapping =
      serde_yaml::from_str(&content).map_err(|source| OverlayError::Malformed { path: path.clone(), source })?;

    debug!(overlay = %overlay, path = %path.display(), "loaded kustomization");

    Ok(Self {
      overlay: overlay.to_string(),
      path,
      document,
    })
  }

  pub fn overlay(&self) -> &str {
    &self.overlay
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Deserialize the list stored under `section`.
  ///
  /// # Errors
  ///
  /// [`OverlayError::MissingSection`] if the key is absent and
  /// [`OverlayError::Malformed`] if its value is not a list of `T`.
  pub fn section<T: DeserializeOwned>(&self, section: &'static str) -> Result<Vec<T>, OverlayError> {
    let value = self.document.get(section).ok_or_else(|| self.missing_section(section))?;

    serde_yaml::from_value(value.clone()).map_err(|source| OverlayError::Malformed {
      path: self.path.clone(),
      source,
    })
  }

  /// Mutable access to the sequence stored under `section`.
  ///
  /// # Errors
  ///
  /// [`OverlayError::MissingSection`] if the key is absent or is not a sequence.
  pub fn section_mut(&mut self, section: &'static str) -> Result<&mut Vec<Value>, OverlayError> {
    let missing = self.missing_section(section);
    self
      .document
      .get_mut(section)
      .and_then(Value::as_sequence_mut)
      .ok_or(missing)
  }

  /// Write the document back to its file.
  pub fn save(&self) -> Result<(), OverlayError> {
    let content = serde_yaml::to_string(&self.document).map_err(|source| OverlayError::Serialize {
      path: self.path.clone(),
      source,
    })?;

    fs::write(&self.path, content).map_err(|source| OverlayError::Write {
      path: self.path.clone(),
      source,
    })?;

    debug!(overlay = %self.overlay, path = %self.path.display(), "wrote kustomization");
    Ok(())
  }

  fn missing_section(&self, section: &'static str) -> OverlayError {
    OverlayError::MissingSection {
      overlay: self.overlay.clone(),
      path: self.path.clone(),
      section,
    }
  }
}

//! Overlay reading.
//!
//! An overlay is a directory under the deployment root holding a kustomization
//! file. This module loads the images and charts an overlay currently declares,
//! so that `fromOverlay` requests can copy them into other overlays.
//!
//! Declared entries go through the same validator as caller input (with
//! [`ChangeOrigin::Overlay`]). Anything it rejects, including two entries with
//! the same `name`, is a pre-existing misconfiguration and is fatal.

mod kustomization;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::change::{
  ChangeKind, ChangeOrigin, ChartChange, ChartSource, ImageChange, ImageSource, ValidationErrors, validate_charts,
  validate_images,
};
use crate::consts::{CHARTS_SECTION, IMAGES_SECTION};

pub use kustomization::Kustomization;

/// Errors that can occur while reading or writing an overlay's kustomization.
#[derive(Debug, Error)]
pub enum OverlayError {
  /// No kustomization file in the overlay directory.
  #[error("kustomization file {} for overlay '{overlay}' does not exist", .path.display())]
  NotFound { overlay: String, path: PathBuf },

  /// The kustomization file could not be read.
  #[error("failed to read {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The kustomization file is not valid YAML of the expected shape.
  #[error("kustomization file {} is invalid: {source}", .path.display())]
  Malformed {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  /// The kustomization does not declare the requested section.
  #[error("overlay '{overlay}' ({}) does not declare '{section}'", .path.display())]
  MissingSection {
    overlay: String,
    path: PathBuf,
    section: &'static str,
  },

  /// Declared entries failed validation.
  #[error("overlay '{overlay}' ({}) has invalid {kind}s: {errors}", .path.display())]
  Invalid {
    overlay: String,
    path: PathBuf,
    kind: ChangeKind,
    errors: ValidationErrors,
  },

  /// The rewritten document could not be serialized.
  #[error("failed to serialize {}: {source}", .path.display())]
  Serialize {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  /// The rewritten document could not be written.
  #[error("failed to write {}: {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// An image as currently declared by an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredImage {
  pub name: String,
  pub new_name: Option<String>,
  pub new_tag: Option<String>,
}

/// A helm chart as currently declared by an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredChart {
  pub name: String,
  pub version: String,
  pub release_name: Option<String>,
}

/// Name-keyed entries declared by one overlay.
#[derive(Debug, Clone)]
pub struct OverlayState<T> {
  overlay: String,
  entries: BTreeMap<String, T>,
}

impl<T> OverlayState<T> {
  pub fn overlay(&self) -> &str {
    &self.overlay
  }

  pub fn get(&self, name: &str) -> Option<&T> {
    self.entries.get(name)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }
}

/// Directory of `overlay` under the deployment root.
pub fn overlay_dir(deployment_dir: &Path, overlay: &str) -> PathBuf {
  deployment_dir.join(overlay)
}

/// Read the images declared by `overlay`.
///
/// # Errors
///
/// Returns [`OverlayError`] if the kustomization is missing, unparsable, has no
/// `images` section, or declares invalid images.
pub fn read_overlay_images(overlay: &str, deployment_dir: &Path) -> Result<OverlayState<DeclaredImage>, OverlayError> {
  let kustomization = Kustomization::load(overlay, &overlay_dir(deployment_dir, overlay))?;
  let declared: Vec<ImageChange> = kustomization.section(IMAGES_SECTION)?;

  let requests = validate_images(&declared, ChangeOrigin::Overlay)
    .map_err(|errors| invalid(&kustomization, ChangeKind::Image, errors))?;

  let entries: BTreeMap<_, _> = requests
    .into_iter()
    .filter_map(|request| match request.source {
      ImageSource::Literal { new_name, new_tag } => Some((
        request.name.clone(),
        DeclaredImage {
          name: request.name,
          new_name,
          new_tag,
        },
      )),
      ImageSource::FromOverlay(_) => None,
    })
    .collect();

  debug!(overlay = %overlay, count = entries.len(), "read overlay images");

  Ok(OverlayState {
    overlay: overlay.to_string(),
    entries,
  })
}

/// Read the helm charts declared by `overlay`.
///
/// # Errors
///
/// Returns [`OverlayError`] if the kustomization is missing, unparsable, has no
/// `helmCharts` section, or declares invalid charts.
pub fn read_overlay_charts(overlay: &str, deployment_dir: &Path) -> Result<OverlayState<DeclaredChart>, OverlayError> {
  let kustomization = Kustomization::load(overlay, &overlay_dir(deployment_dir, overlay))?;
  let declared: Vec<ChartChange> = kustomization.section(CHARTS_SECTION)?;

  let requests = validate_charts(&declared, ChangeOrigin::Overlay)
    .map_err(|errors| invalid(&kustomization, ChangeKind::Chart, errors))?;

  let entries: BTreeMap<_, _> = requests
    .into_iter()
    .filter_map(|request| match request.source {
      ChartSource::Literal { version } => Some((
        request.name.clone(),
        DeclaredChart {
          name: request.name,
          version,
          release_name: request.release_name,
        },
      )),
      ChartSource::FromOverlay(_) => None,
    })
    .collect();

  debug!(overlay = %overlay, count = entries.len(), "read overlay charts");

  Ok(OverlayState {
    overlay: overlay.to_string(),
    entries,
  })
}

fn invalid(kustomization: &Kustomization, kind: ChangeKind, errors: ValidationErrors) -> OverlayError {
  OverlayError::Invalid {
    overlay: kustomization.overlay().to_string(),
    path: kustomization.path().to_path_buf(),
    kind,
    errors,
  }
}

//! Overlay mutation.
//!
//! # Modules
//!
//! - [`command`] - The [`CommandRunner`] seam and the real kustomize runner
//! - [`images`] - One batched `kustomize edit set image` call per overlay
//! - [`charts`] - In-place `helmCharts` edits followed by `kustomize cfg fmt`

pub mod charts;
pub mod command;
pub mod images;

use std::path::PathBuf;

use thiserror::Error;

use crate::overlay::OverlayError;

pub use charts::apply_charts;
pub use command::{CommandError, CommandOutput, CommandRunner, Kustomize, check_available};
pub use images::{apply_images, image_argument};

/// Errors that can occur while mutating an overlay.
#[derive(Debug, Error)]
pub enum MutateError {
  /// The overlay's directory does not exist under the deployment root.
  #[error("kustomize directory for overlay '{overlay}' does not exist ({})", .path.display())]
  OverlayDirectoryMissing { overlay: String, path: PathBuf },

  /// `kustomize edit set image` failed.
  #[error("failed to update images in overlay '{overlay}': {source}")]
  ImagesCommand {
    overlay: String,
    #[source]
    source: CommandError,
  },

  /// A requested chart is not declared by the overlay.
  #[error("chart '{chart}' not found in {} (overlay '{overlay}')", .path.display())]
  ChartNotFound {
    overlay: String,
    chart: String,
    path: PathBuf,
  },

  /// `kustomize cfg fmt` failed after rewriting the kustomization.
  #[error("failed to format kustomization for overlay '{overlay}': {source}")]
  FormatCommand {
    overlay: String,
    #[source]
    source: CommandError,
  },

  /// The kustomization could not be loaded or written.
  #[error(transparent)]
  Overlay(#[from] OverlayError),
}

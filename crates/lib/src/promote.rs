//! Promotion orchestration.
//!
//! A promotion runs in two phases:
//!
//! 1. [`plan`] validates the change-set, resolves `fromOverlay` references and
//!    confirms every target overlay exists. Nothing is written.
//! 2. [`apply`] runs one batched image update per overlay, then edits charts
//!    overlay by overlay, recording what was applied.
//!
//! [`promote`] chains a tool check, [`plan`] and [`apply`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::change::{ChangeOrigin, ResolvedChart, ResolvedImage, ValidationErrors, validate_charts, validate_images};
use crate::input::ChangeSet;
use crate::manifest::PromotionManifest;
use crate::mutate::charts::applied_chart;
use crate::mutate::images::applied_image;
use crate::mutate::{CommandError, CommandRunner, MutateError, apply_charts, apply_images, check_available};
use crate::overlay::{OverlayError, overlay_dir};
use crate::resolve::{OverlayBuckets, ResolveError, resolve_charts, resolve_images};

/// Errors that can stop a promotion.
#[derive(Debug, Error)]
pub enum PromoteError {
  /// Neither images nor charts were supplied.
  #[error("no images or charts to update")]
  NoChanges,

  /// The deployment root is not a directory.
  #[error("deployment directory {} does not exist", .path.display())]
  DeploymentDirMissing { path: PathBuf },

  /// The change-set failed validation.
  #[error("invalid change-set: {0}")]
  Validation(ValidationErrors),

  #[error(transparent)]
  Resolution(#[from] ResolveError),

  #[error(transparent)]
  Mutation(#[from] MutateError),

  /// The configuration tool cannot be run.
  #[error("kustomize is not available: {0}")]
  ToolUnavailable(#[source] CommandError),
}

impl PromoteError {
  /// A stable name for the failure class, used in diagnostics.
  pub fn category(&self) -> &'static str {
    match self {
      PromoteError::NoChanges => "UsageError",
      PromoteError::DeploymentDirMissing { .. } => "NotFoundError",
      PromoteError::Validation(_) => "ValidationError",
      PromoteError::Resolution(ResolveError::DuplicateNewName { .. }) => "ValidationError",
      PromoteError::Resolution(ResolveError::SourceOverlay {
        source: OverlayError::Malformed { .. } | OverlayError::Invalid { .. },
        ..
      }) => "ConfigFormatError",
      PromoteError::Resolution(_) => "ResolutionError",
      PromoteError::Mutation(MutateError::OverlayDirectoryMissing { .. } | MutateError::ChartNotFound { .. }) => {
        "NotFoundError"
      }
      PromoteError::Mutation(MutateError::ImagesCommand { .. } | MutateError::FormatCommand { .. }) => {
        "ExternalCommandError"
      }
      PromoteError::Mutation(MutateError::Overlay(source)) => overlay_category(source),
      PromoteError::ToolUnavailable(_) => "ExternalCommandError",
    }
  }
}

fn overlay_category(error: &OverlayError) -> &'static str {
  match error {
    OverlayError::NotFound { .. } | OverlayError::MissingSection { .. } => "NotFoundError",
    OverlayError::Malformed { .. } | OverlayError::Invalid { .. } => "ConfigFormatError",
    OverlayError::Read { .. } | OverlayError::Serialize { .. } | OverlayError::Write { .. } => "IoError",
  }
}

/// Resolved changes grouped by overlay, ready to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionPlan {
  pub images: OverlayBuckets<ResolvedImage>,
  pub charts: OverlayBuckets<ResolvedChart>,
}

impl PromotionPlan {
  /// Every overlay the plan touches, sorted.
  pub fn overlays(&self) -> BTreeSet<&str> {
    self.images.keys().chain(self.charts.keys()).map(String::as_str).collect()
  }

  /// The manifest [`apply`] would produce if every step succeeded.
  pub fn preview(&self) -> PromotionManifest {
    let mut manifest = PromotionManifest::new();
    for (overlay, images) in &self.images {
      manifest.record_images(overlay, images.iter().map(applied_image).collect());
    }
    for (overlay, charts) in &self.charts {
      manifest.record_charts(overlay, charts.iter().map(applied_chart).collect());
    }
    manifest
  }
}

/// Check that `path` is a directory and return its canonical form.
pub fn resolve_deployment_dir(path: &Path) -> Result<PathBuf, PromoteError> {
  if !path.is_dir() {
    return Err(PromoteError::DeploymentDirMissing {
      path: path.to_path_buf(),
    });
  }
  dunce::canonicalize(path).map_err(|_| PromoteError::DeploymentDirMissing {
    path: path.to_path_buf(),
  })
}

/// Validate and resolve a change-set without touching any overlay.
///
/// Image and chart validation errors are reported together.
///
/// # Errors
///
/// - [`PromoteError::NoChanges`] if the change-set is empty
/// - [`PromoteError::Validation`] with every validation error found
/// - [`PromoteError::Resolution`] if a `fromOverlay` reference cannot be resolved
/// - [`PromoteError::Mutation`] if a target overlay directory is missing
pub fn plan(change_set: &ChangeSet, deployment_dir: &Path) -> Result<PromotionPlan, PromoteError> {
  if change_set.is_empty() {
    return Err(PromoteError::NoChanges);
  }

  let mut errors = ValidationErrors::new();
  let images = validate_images(&change_set.images, ChangeOrigin::Request).unwrap_or_else(|e| {
    errors.extend(e);
    Vec::new()
  });
  let charts = validate_charts(&change_set.charts, ChangeOrigin::Request).unwrap_or_else(|e| {
    errors.extend(e);
    Vec::new()
  });
  if !errors.is_empty() {
    return Err(PromoteError::Validation(errors));
  }
  debug!(images = images.len(), charts = charts.len(), "change-set is valid");

  let plan = PromotionPlan {
    images: resolve_images(&images, deployment_dir)?,
    charts: resolve_charts(&charts, deployment_dir)?,
  };

  for overlay in plan.overlays() {
    let dir = overlay_dir(deployment_dir, overlay);
    if !dir.is_dir() {
      return Err(MutateError::OverlayDirectoryMissing {
        overlay: overlay.to_string(),
        path: dir,
      }
      .into());
    }
  }

  Ok(plan)
}

/// Apply a plan: images for every overlay first, then charts.
///
/// The first failure stops the run. Overlays already updated stay updated.
pub fn apply(
  plan: &PromotionPlan,
  deployment_dir: &Path,
  runner: &impl CommandRunner,
) -> Result<PromotionManifest, PromoteError> {
  let mut manifest = PromotionManifest::new();

  for (overlay, images) in &plan.images {
    let applied = apply_images(overlay, images, deployment_dir, runner)?;
    info!(overlay = %overlay, count = applied.len(), "images updated");
    manifest.record_images(overlay, applied);
  }

  for (overlay, charts) in &plan.charts {
    let applied = apply_charts(overlay, charts, deployment_dir, runner)?;
    info!(overlay = %overlay, count = applied.len(), "charts updated");
    manifest.record_charts(overlay, applied);
  }

  Ok(manifest)
}

/// Check the tool, plan, and apply.
pub fn promote(
  change_set: &ChangeSet,
  deployment_dir: &Path,
  runner: &impl CommandRunner,
) -> Result<PromotionManifest, PromoteError> {
  check_available(runner, deployment_dir).map_err(PromoteError::ToolUnavailable)?;
  let plan = plan(change_set, deployment_dir)?;
  apply(&plan, deployment_dir, runner)
}

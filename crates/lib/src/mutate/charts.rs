//! Helm chart updates.
//!
//! Charts are edited directly in the overlay's `helmCharts` list. Only charts
//! the overlay already declares can be updated; every requested chart is
//! located before anything is written, so a missing chart leaves the file
//! untouched.

use std::path::Path;

use serde_yaml::Value;
use tracing::{debug, info};

use super::MutateError;
use super::command::CommandRunner;
use crate::change::ResolvedChart;
use crate::consts::CHARTS_SECTION;
use crate::manifest::AppliedChart;
use crate::overlay::{Kustomization, overlay_dir};

/// The manifest record for one chart.
pub fn applied_chart(chart: &ResolvedChart) -> AppliedChart {
  AppliedChart {
    name: chart.name.clone(),
    version: chart.version.clone(),
    release_name: chart.release_name.clone(),
  }
}

/// Update every chart change for `overlay`, then rewrite and format the file.
///
/// The matched declaration gets the new `version` (and `releaseName` when one
/// was requested); its other keys are left as they are.
///
/// # Errors
///
/// - [`MutateError::OverlayDirectoryMissing`] if the overlay directory is absent
/// - [`MutateError::Overlay`] if the kustomization cannot be loaded, has no
///   `helmCharts` section, or cannot be written
/// - [`MutateError::ChartNotFound`] if a requested chart is not declared
/// - [`MutateError::FormatCommand`] if `kustomize cfg fmt` fails
pub fn apply_charts(
  overlay: &str,
  charts: &[ResolvedChart],
  deployment_dir: &Path,
  runner: &impl CommandRunner,
) -> Result<Vec<AppliedChart>, MutateError> {
  let dir = overlay_dir(deployment_dir, overlay);
  if !dir.is_dir() {
    return Err(MutateError::OverlayDirectoryMissing {
      overlay: overlay.to_string(),
      path: dir,
    });
  }

  if charts.is_empty() {
    info!(overlay = %overlay, "no charts to update");
    return Ok(Vec::new());
  }

  info!(overlay = %overlay, count = charts.len(), "updating charts");

  let mut kustomization = Kustomization::load(overlay, &dir)?;
  let path = kustomization.path().to_path_buf();
  let declared = kustomization.section_mut(CHARTS_SECTION)?;

  for chart in charts {
    let mut found = false;
    for entry in declared.iter_mut().filter(|entry| declares(entry, &chart.name)) {
      if let Value::Mapping(mapping) = entry {
        mapping.insert("version".into(), chart.version.clone().into());
        if let Some(release_name) = &chart.release_name {
          mapping.insert("releaseName".into(), release_name.clone().into());
        }
        found = true;
      }
    }

    if !found {
      return Err(MutateError::ChartNotFound {
        overlay: overlay.to_string(),
        chart: chart.name.clone(),
        path,
      });
    }
    debug!(overlay = %overlay, chart = %chart.name, version = %chart.version, "updated chart declaration");
  }

  kustomization.save()?;

  // serde_yaml drops the original layout; let kustomize restore its canonical form.
  let file_name = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  runner
    .run(&["cfg".to_string(), "fmt".to_string(), file_name], &dir)
    .map_err(|source| MutateError::FormatCommand {
      overlay: overlay.to_string(),
      source,
    })?;

  Ok(charts.iter().map(applied_chart).collect())
}

fn declares(entry: &Value, name: &str) -> bool {
  entry.get("name").and_then(Value::as_str) == Some(name)
}

//! Overlay resolution.
//!
//! Expands validated requests into per-overlay buckets of concrete changes:
//! 1. For each request, in the order supplied
//! 2. For each target overlay it lists
//! 3. Take the literal values, or look the entry up in its `fromOverlay` source
//! 4. Append the resolved entry to the target overlay's bucket
//!
//! Bucket order follows request order, which fixes the order of the batched
//! kustomize arguments. Resolution never touches the filesystem beyond reading
//! source overlays, and any failure stops the run before mutation begins.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::change::{
  ChangeKind, ChartRequest, ChartSource, ImageRequest, ImageSource, ResolvedChart, ResolvedImage, find_duplicates,
};
use crate::overlay::{OverlayError, read_overlay_charts, read_overlay_images};

/// Resolved entries grouped by target overlay.
pub type OverlayBuckets<T> = BTreeMap<String, Vec<T>>;

/// Errors that can occur during resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// The `fromOverlay` source could not be read.
  #[error("failed to read {kind}s from overlay '{overlay}' (requested by '{name}'): {source}")]
  SourceOverlay {
    kind: ChangeKind,
    name: String,
    overlay: String,
    #[source]
    source: OverlayError,
  },

  /// The `fromOverlay` source does not declare the requested entry.
  #[error("{kind} '{name}' not found in overlay '{overlay}'")]
  SourceEntryNotFound {
    kind: ChangeKind,
    name: String,
    overlay: String,
  },

  /// Two image requests resolve to the same `newName`.
  #[error("found duplicate image newNames after resolving fromOverlay: {}. image newNames must be unique", .names.join(" "))]
  DuplicateNewName { names: Vec<String> },
}

/// Resolve image requests into per-overlay buckets.
///
/// # Errors
///
/// - [`ResolveError::SourceOverlay`] if a `fromOverlay` source cannot be read
/// - [`ResolveError::SourceEntryNotFound`] if the source lacks the image
/// - [`ResolveError::DuplicateNewName`] if two requests end up with the same
///   explicit `newName`, whichever overlays they target
pub fn resolve_images(
  requests: &[ImageRequest],
  deployment_dir: &Path,
) -> Result<OverlayBuckets<ResolvedImage>, ResolveError> {
  let mut buckets: OverlayBuckets<ResolvedImage> = BTreeMap::new();
  // One newName per request; fanning a request out to several overlays is not a collision.
  let mut new_names: Vec<String> = Vec::with_capacity(requests.len());

  for request in requests {
    let mut request_new_name = None;
    for overlay in unique_targets(&request.name, &request.overlays) {
      let resolved = match &request.source {
        ImageSource::Literal { new_name, new_tag } => ResolvedImage {
          name: request.name.clone(),
          new_name: new_name.clone(),
          new_tag: new_tag.clone(),
        },
        ImageSource::FromOverlay(source) => {
          let state = read_overlay_images(source, deployment_dir).map_err(|e| ResolveError::SourceOverlay {
            kind: ChangeKind::Image,
            name: request.name.clone(),
            overlay: source.clone(),
            source: e,
          })?;
          let declared = state.get(&request.name).ok_or_else(|| ResolveError::SourceEntryNotFound {
            kind: ChangeKind::Image,
            name: request.name.clone(),
            overlay: source.clone(),
          })?;
          debug!(image = %request.name, from = %source, to = %overlay, "resolved image from overlay");
          ResolvedImage {
            name: declared.name.clone(),
            new_name: declared.new_name.clone(),
            new_tag: declared.new_tag.clone(),
          }
        }
      };

      if request_new_name.is_none() {
        request_new_name = resolved.new_name.clone();
      }
      buckets.entry(overlay.to_string()).or_default().push(resolved);
    }
    new_names.extend(request_new_name);
  }

  let duplicates = find_duplicates(new_names.iter().map(String::as_str));
  if !duplicates.is_empty() {
    return Err(ResolveError::DuplicateNewName {
      names: duplicates.into_iter().collect(),
    });
  }

  Ok(buckets)
}

/// Resolve chart requests into per-overlay buckets.
///
/// A `fromOverlay` request copies the source chart's `version`. The
/// `releaseName` always comes from the request itself.
///
/// # Errors
///
/// - [`ResolveError::SourceOverlay`] if a `fromOverlay` source cannot be read
/// - [`ResolveError::SourceEntryNotFound`] if the source lacks the chart
pub fn resolve_charts(
  requests: &[ChartRequest],
  deployment_dir: &Path,
) -> Result<OverlayBuckets<ResolvedChart>, ResolveError> {
  let mut buckets: OverlayBuckets<ResolvedChart> = BTreeMap::new();

  for request in requests {
    for overlay in unique_targets(&request.name, &request.overlays) {
      let version = match &request.source {
        ChartSource::Literal { version } => version.clone(),
        ChartSource::FromOverlay(source) => {
          let state = read_overlay_charts(source, deployment_dir).map_err(|e| ResolveError::SourceOverlay {
            kind: ChangeKind::Chart,
            name: request.name.clone(),
            overlay: source.clone(),
            source: e,
          })?;
          let declared = state.get(&request.name).ok_or_else(|| ResolveError::SourceEntryNotFound {
            kind: ChangeKind::Chart,
            name: request.name.clone(),
            overlay: source.clone(),
          })?;
          debug!(chart = %request.name, from = %source, to = %overlay, "resolved chart from overlay");
          declared.version.clone()
        }
      };

      buckets.entry(overlay.to_string()).or_default().push(ResolvedChart {
        name: request.name.clone(),
        version,
        release_name: request.release_name.clone(),
      });
    }
  }

  Ok(buckets)
}

/// Target overlays in order, each at most once.
fn unique_targets<'a>(name: &str, overlays: &'a [String]) -> Vec<&'a str> {
  let mut seen = HashSet::new();
  let mut targets = Vec::with_capacity(overlays.len());
  for overlay in overlays {
    if seen.insert(overlay.as_str()) {
      targets.push(overlay.as_str());
    } else {
      warn!(entry = %name, overlay = %overlay, "overlay listed more than once; ignoring repeat");
    }
  }
  targets
}

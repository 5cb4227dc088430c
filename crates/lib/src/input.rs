//! Change-set input decoding.
//!
//! Image and chart change-sets arrive as JSON lists, normally through the
//! `IMAGES_TO_UPDATE` and `CHARTS_TO_UPDATE` environment variables. When
//! neither is set, stdin may carry either an image list or an object with
//! `images` and/or `charts` lists:
//!
//! ```json
//! { "images": [{ "name": "app", "newTag": "v3", "overlays": ["prod"] }] }
//! ```
//!
//! Blank inputs count as absent.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::change::{ChangeKind, ChartChange, ImageChange};

/// Usage text listing the accepted input shapes.
pub const USAGE: &str = r#"No images or charts to update. Please provide either (or both):
- A JSON list of images to update via the IMAGES_TO_UPDATE env var or via stdin in the following format:
    [
        {
            "name": "image-name",
            # Either newTag or newName is required
            "newName": "new-image-name",
            "newTag": "new-image-tag",
            # ... or fromOverlay is required
            "fromOverlay": "overlay-name",
            "overlays": ["target-env", "target-env2"]
        }
    ]
- A JSON list of charts to update via the CHARTS_TO_UPDATE env var or via stdin in the following format:
    [
        {
            "name": "chart-name",
            # Either version is required
            "version": "new-chart-version",
            # ... or fromOverlay is required
            "fromOverlay": "overlay-name",
            # Optionally, update the release name
            "releaseName": "new-release-name",
            "overlays": ["target-env", "target-env2"]
        }
    ]"#;

/// Errors that can occur while decoding input.
#[derive(Debug, Error)]
pub enum InputError {
  /// A change-set list is not valid JSON of the expected shape.
  #[error("provided {kind}s JSON failed to parse. Please provide a valid JSON list. Error: {source}. The input received was: {input}")]
  Parse {
    kind: ChangeKind,
    input: String,
    #[source]
    source: serde_json::Error,
  },

  /// The stdin document is neither a list nor an `{images, charts}` object.
  #[error("stdin JSON failed to parse. Please provide a JSON list of images or an object with 'images' and/or 'charts'. Error: {source}. The input received was: {input}")]
  Stdin {
    input: String,
    #[source]
    source: serde_json::Error,
  },
}

/// The caller's requested changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChangeSet {
  #[serde(default)]
  pub images: Vec<ImageChange>,
  #[serde(default)]
  pub charts: Vec<ChartChange>,
}

impl ChangeSet {
  /// Build a change-set from the raw inputs.
  ///
  /// `stdin` is consulted only when neither `images` nor `charts` is present.
  pub fn from_inputs(images: Option<&str>, charts: Option<&str>, stdin: Option<&str>) -> Result<Self, InputError> {
    let images = present(images);
    let charts = present(charts);

    if images.is_none() && charts.is_none() {
      if let Some(raw) = present(stdin) {
        debug!("reading change-set from stdin");
        return Self::parse_stdin(raw);
      }
    }

    let change_set = Self {
      images: images.map(parse_images).transpose()?.unwrap_or_default(),
      charts: charts.map(parse_charts).transpose()?.unwrap_or_default(),
    };

    if change_set.images.is_empty() {
      info!("no images to update");
    }
    if change_set.charts.is_empty() {
      info!("no charts to update");
    }

    Ok(change_set)
  }

  /// Parse a stdin document: an image list or an `{images, charts}` object.
  ///
  /// A document starting with `[` is an image list and fails the same way
  /// `IMAGES_TO_UPDATE` would; anything else must be a change-set object.
  pub fn parse_stdin(raw: &str) -> Result<Self, InputError> {
    if raw.trim_start().starts_with('[') {
      return Ok(Self {
        images: parse_images(raw)?,
        charts: Vec::new(),
      });
    }

    serde_json::from_str(raw).map_err(|source| InputError::Stdin {
      input: raw.to_string(),
      source,
    })
  }

  pub fn is_empty(&self) -> bool {
    self.images.is_empty() && self.charts.is_empty()
  }
}

/// Parse an image change-set list.
pub fn parse_images(raw: &str) -> Result<Vec<ImageChange>, InputError> {
  serde_json::from_str(raw).map_err(|source| InputError::Parse {
    kind: ChangeKind::Image,
    input: raw.to_string(),
    source,
  })
}

/// Parse a chart change-set list.
pub fn parse_charts(raw: &str) -> Result<Vec<ChartChange>, InputError> {
  serde_json::from_str(raw).map_err(|source| InputError::Parse {
    kind: ChangeKind::Chart,
    input: raw.to_string(),
    source,
  })
}

fn present(raw: Option<&str>) -> Option<&str> {
  raw.filter(|value| !value.trim().is_empty())
}

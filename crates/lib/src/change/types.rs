//! Change-set types.
//!
//! Raw change entries ([`ImageChange`], [`ChartChange`]) mirror the JSON
//! documents callers supply and the entries kustomization files declare. Every
//! field is optional at this level so that the validator can report all missing
//! fields at once instead of failing on the first deserialization error.
//!
//! Validation turns raw entries into requests ([`ImageRequest`],
//! [`ChartRequest`]) whose [`ImageSource`]/[`ChartSource`] encode the
//! "literal values XOR `fromOverlay`" rule in the type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Which kind of change an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
  Image,
  Chart,
}

impl ChangeKind {
  pub fn as_str(self) -> &'static str {
    match self {
      ChangeKind::Image => "image",
      ChangeKind::Chart => "chart",
    }
  }
}

impl fmt::Display for ChangeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Where a change-set came from.
///
/// Caller-supplied change-sets must name their target overlays; entries read
/// back out of a kustomization file have no targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
  /// Supplied by the caller through the environment or stdin.
  Request,
  /// Read from an overlay's persisted kustomization.
  Overlay,
}

/// A raw image change as supplied by the caller or declared in a kustomization.
///
/// ```json
/// { "name": "app", "newName": "registry/app", "newTag": "v3", "overlays": ["prod"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageChange {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  pub new_name: Option<String>,
  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  pub new_tag: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub from_overlay: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub overlays: Option<Vec<String>>,
}

/// A raw chart change as supplied by the caller or declared under `helmCharts`.
///
/// ```json
/// { "name": "lighthouse", "version": "1.0.0", "releaseName": "tillamook", "overlays": ["prod"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartChange {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub from_overlay: Option<String>,
  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  pub release_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub overlays: Option<Vec<String>>,
}

/// Accept any YAML/JSON scalar as a string.
///
/// Kustomizations routinely carry unquoted tags and versions (`newTag: 1.4`)
/// that YAML parses as numbers.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Scalar {
    String(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
  }

  Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
    Scalar::String(s) => s,
    Scalar::Unsigned(n) => n.to_string(),
    Scalar::Signed(n) => n.to_string(),
    Scalar::Float(n) => {
      warn!(value = n, "unquoted numeric value read as a float; quote it to keep trailing zeros");
      n.to_string()
    }
    Scalar::Bool(b) => b.to_string(),
  }))
}

impl ImageChange {
  /// Compact JSON rendering used in diagnostics.
  pub fn describe(&self) -> String {
    serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
  }
}

impl ChartChange {
  /// Compact JSON rendering used in diagnostics.
  pub fn describe(&self) -> String {
    serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
  }
}

/// Where a validated image request takes its new values from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
  /// Values given directly. At least one of the two is set.
  Literal {
    new_name: Option<String>,
    new_tag: Option<String>,
  },
  /// Copy the image's current declaration from another overlay.
  FromOverlay(String),
}

/// A validated image change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
  pub name: String,
  pub source: ImageSource,
  /// Target overlays, in the order supplied. Empty for overlay-declared entries.
  pub overlays: Vec<String>,
}

/// Where a validated chart request takes its version from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSource {
  Literal { version: String },
  /// Copy the chart's current version from another overlay.
  FromOverlay(String),
}

/// A validated chart change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
  pub name: String,
  pub source: ChartSource,
  pub release_name: Option<String>,
  pub overlays: Vec<String>,
}

/// An image change with `fromOverlay` expanded, bound to a single overlay bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
  pub name: String,
  pub new_name: Option<String>,
  pub new_tag: Option<String>,
}

impl ResolvedImage {
  /// The new image name, falling back to the image's own name.
  pub fn effective_new_name(&self) -> &str {
    self.new_name.as_deref().unwrap_or(&self.name)
  }
}

/// A chart change with `fromOverlay` expanded, bound to a single overlay bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChart {
  pub name: String,
  pub version: String,
  pub release_name: Option<String>,
}

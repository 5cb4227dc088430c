//! Promotion manifest types.
//!
//! # Structure
//!
//! The manifest maps overlay names to the changes applied there:
//!
//! ```json
//! {
//!   "prod": {
//!     "images": [{ "name": "app", "newName": "app", "newTag": "v3" }],
//!     "charts": [{ "name": "lighthouse", "version": "1.1.0" }]
//!   }
//! }
//! ```
//!
//! # Ordering
//!
//! Overlays are kept in a [`BTreeMap`] so the serialized output is
//! deterministic. Within an overlay, records keep the order in which the
//! changes were supplied.
//!
//! Empty image or chart lists are omitted, and an overlay with no records at
//! all does not appear.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An image override applied to an overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedImage {
  pub name: String,
  pub new_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub new_tag: Option<String>,
}

/// A helm chart update applied to an overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedChart {
  pub name: String,
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub release_name: Option<String>,
}

/// Everything applied to one overlay.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayPromotion {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub images: Vec<AppliedImage>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub charts: Vec<AppliedChart>,
}

impl OverlayPromotion {
  pub fn is_empty(&self) -> bool {
    self.images.is_empty() && self.charts.is_empty()
  }
}

/// The record of a promotion, keyed by overlay name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromotionManifest {
  overlays: BTreeMap<String, OverlayPromotion>,
}

impl PromotionManifest {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append applied images for `overlay`. Nothing is recorded for an empty list.
  pub fn record_images(&mut self, overlay: &str, images: Vec<AppliedImage>) {
    if images.is_empty() {
      return;
    }
    self.overlays.entry(overlay.to_string()).or_default().images.extend(images);
  }

  /// Append applied charts for `overlay`. Nothing is recorded for an empty list.
  pub fn record_charts(&mut self, overlay: &str, charts: Vec<AppliedChart>) {
    if charts.is_empty() {
      return;
    }
    self.overlays.entry(overlay.to_string()).or_default().charts.extend(charts);
  }

  /// Fold `other` into this manifest, concatenating per-overlay records.
  pub fn merge(&mut self, other: PromotionManifest) {
    for (overlay, promotion) in other.overlays {
      self.record_images(&overlay, promotion.images);
      self.record_charts(&overlay, promotion.charts);
    }
  }

  pub fn get(&self, overlay: &str) -> Option<&OverlayPromotion> {
    self.overlays.get(overlay)
  }

  pub fn overlays(&self) -> impl Iterator<Item = (&str, &OverlayPromotion)> {
    self.overlays.iter().map(|(name, promotion)| (name.as_str(), promotion))
  }

  pub fn len(&self) -> usize {
    self.overlays.len()
  }

  pub fn is_empty(&self) -> bool {
    self.overlays.is_empty()
  }

  /// Total number of image and chart records.
  pub fn change_count(&self) -> usize {
    self.overlays.values().map(|p| p.images.len() + p.charts.len()).sum()
  }

  /// Compact single-line JSON, as written to stdout.
  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }
}

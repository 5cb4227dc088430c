//! promote-lib: GitOps promotion of container images and helm charts
//!
//! This crate moves image and chart versions between kustomize overlays:
//! - `change`: change-set types and validation
//! - `input`: decoding change-sets from JSON
//! - `overlay`: reading and rewriting an overlay's kustomization
//! - `resolve`: expanding `fromOverlay` references into per-overlay buckets
//! - `mutate`: batched kustomize calls and in-place chart edits
//! - `manifest`: the record of what was promoted where
//! - `promote`: planning and applying a promotion

pub mod change;
pub mod consts;
pub mod input;
pub mod manifest;
pub mod mutate;
pub mod overlay;
pub mod promote;
pub mod resolve;
#[cfg(test)]
pub(crate) mod util;

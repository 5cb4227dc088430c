//! Batched image updates.
//!
//! All image changes for an overlay go into a single
//! `kustomize edit set image` call, so an overlay either gets every change or
//! none of them.

use std::path::Path;

use tracing::info;

use super::MutateError;
use super::command::CommandRunner;
use crate::change::ResolvedImage;
use crate::manifest::AppliedImage;
use crate::overlay::overlay_dir;

/// The `name=newName[:newTag]` argument for one image.
///
/// A missing `newName` falls back to the image's own name, so a tag-only change
/// renders as `name=name:tag`.
pub fn image_argument(image: &ResolvedImage) -> String {
  let new_name = image.effective_new_name();
  match &image.new_tag {
    Some(tag) => format!("{}={}:{}", image.name, new_name, tag),
    None => format!("{}={}", image.name, new_name),
  }
}

/// The full argument list for one overlay's batched call.
pub fn set_image_args(images: &[ResolvedImage]) -> Vec<String> {
  ["edit", "set", "image"]
    .into_iter()
    .map(String::from)
    .chain(images.iter().map(image_argument))
    .collect()
}

/// The manifest record for one image.
pub fn applied_image(image: &ResolvedImage) -> AppliedImage {
  AppliedImage {
    name: image.name.clone(),
    new_name: image.effective_new_name().to_string(),
    new_tag: image.new_tag.clone(),
  }
}

/// Apply every image change for `overlay` in one kustomize call.
///
/// Re-applying identical values succeeds and reports the same records;
/// kustomize overwrites an existing override instead of failing on it.
///
/// # Errors
///
/// - [`MutateError::OverlayDirectoryMissing`] if the overlay directory is absent
/// - [`MutateError::ImagesCommand`] if kustomize fails
pub fn apply_images(
  overlay: &str,
  images: &[ResolvedImage],
  deployment_dir: &Path,
  runner: &impl CommandRunner,
) -> Result<Vec<AppliedImage>, MutateError> {
  let dir = overlay_dir(deployment_dir, overlay);
  if !dir.is_dir() {
    return Err(MutateError::OverlayDirectoryMissing {
      overlay: overlay.to_string(),
      path: dir,
    });
  }

  if images.is_empty() {
    info!(overlay = %overlay, "no images to update");
    return Ok(Vec::new());
  }

  info!(overlay = %overlay, count = images.len(), "updating images");

  runner
    .run(&set_image_args(images), &dir)
    .map_err(|source| MutateError::ImagesCommand {
      overlay: overlay.to_string(),
      source,
    })?;

  Ok(images.iter().map(applied_image).collect())
}

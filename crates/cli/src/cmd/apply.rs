//! Implementation of the `promote apply` command.
//!
//! Runs the full promotion against the deployment directory and prints the
//! promotion manifest as a single line of JSON on stdout.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use promote_lib::input::ChangeSet;
use promote_lib::mutate::Kustomize;
use promote_lib::promote::{promote, resolve_deployment_dir};

use crate::output::print_manifest;

/// Execute the apply command.
///
/// # Errors
///
/// Returns an error if the deployment directory is missing, kustomize cannot
/// be run, or any step of the promotion fails. Overlays updated before the
/// failure keep their changes.
pub fn cmd_apply(change_set: &ChangeSet, deployment_dir: &Path, kustomize: &Path) -> Result<()> {
  let deployment_dir = resolve_deployment_dir(deployment_dir)?;
  info!(path = %deployment_dir.display(), "using deployment directory");

  let runner = Kustomize::new(kustomize);
  debug!(kustomize = %runner.binary().display(), "using kustomize binary");
  let manifest = promote(change_set, &deployment_dir, &runner)?;

  info!(
    overlays = manifest.len(),
    changes = manifest.change_count(),
    "promotion complete"
  );
  print_manifest(&manifest)
}

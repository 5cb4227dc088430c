//! CLI output formatting utilities.
//!
//! Stdout carries only the promotion manifest; everything human-facing goes
//! to stderr.

use anyhow::Context;

use promote_lib::manifest::PromotionManifest;

pub mod symbols {
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const MODIFY: &str = "~";
}

/// Print the manifest as compact JSON on stdout.
pub fn print_manifest(manifest: &PromotionManifest) -> anyhow::Result<()> {
  let json = manifest.to_json().context("Failed to serialize promotion manifest")?;
  println!("{}", json);
  Ok(())
}

//! Implementation of the `promote plan` command.
//!
//! Validates and resolves the change-set without running kustomize or writing
//! any file. The manifest that `apply` would produce goes to stdout; a
//! readable summary goes to stderr.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use promote_lib::input::ChangeSet;
use promote_lib::promote::{plan, resolve_deployment_dir};

use crate::output::{print_manifest, symbols};

pub fn cmd_plan(change_set: &ChangeSet, deployment_dir: &Path) -> Result<()> {
  let deployment_dir = resolve_deployment_dir(deployment_dir)?;
  let preview = plan(change_set, &deployment_dir)?.preview();

  for (overlay, promotion) in preview.overlays() {
    eprintln!("{}", overlay.if_supports_color(Stream::Stderr, |s| s.cyan()));
    for image in &promotion.images {
      let target = match &image.new_tag {
        Some(tag) => format!("{}:{}", image.new_name, tag),
        None => image.new_name.clone(),
      };
      eprintln!(
        "  {} image {} {} {}",
        symbols::MODIFY.if_supports_color(Stream::Stderr, |s| s.yellow()),
        image.name,
        symbols::ARROW.if_supports_color(Stream::Stderr, |s| s.dimmed()),
        target.if_supports_color(Stream::Stderr, |s| s.green())
      );
    }
    for chart in &promotion.charts {
      eprintln!(
        "  {} chart {} {} {}",
        symbols::MODIFY.if_supports_color(Stream::Stderr, |s| s.yellow()),
        chart.name,
        symbols::ARROW.if_supports_color(Stream::Stderr, |s| s.dimmed()),
        chart.version.if_supports_color(Stream::Stderr, |s| s.green())
      );
    }
  }
  eprintln!(
    "{} Would apply {} change(s) to {} overlay(s)",
    symbols::INFO.if_supports_color(Stream::Stderr, |s| s.blue()),
    preview.change_count(),
    preview.len()
  );

  print_manifest(&preview)
}

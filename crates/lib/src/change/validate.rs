//! Change-set validation.
//!
//! Validation runs over a complete change-set before anything is resolved or
//! mutated. Every violation is collected so that callers get the full list in
//! one pass. Inputs are never modified; valid entries come back as typed
//! requests.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::types::{
  ChangeKind, ChangeOrigin, ChartChange, ChartRequest, ChartSource, ImageChange, ImageRequest, ImageSource,
};

/// A single validation violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  /// Two or more entries share a `name`.
  #[error("found duplicate {kind} names: {}. {kind} names must be unique", .names.join(" "))]
  DuplicateName { kind: ChangeKind, names: Vec<String> },

  /// Two or more image entries share a `newName`.
  #[error("found duplicate image newNames: {}. image newNames must be unique", .names.join(" "))]
  DuplicateNewName { names: Vec<String> },

  /// A required field is absent.
  #[error("{kind} {entry} is missing the required '{field}' field")]
  MissingField {
    kind: ChangeKind,
    entry: String,
    field: &'static str,
  },

  /// A literal value was given alongside `fromOverlay`.
  #[error("{kind} {entry} cannot set {field} when fromOverlay is set")]
  ConflictingField {
    kind: ChangeKind,
    entry: String,
    field: &'static str,
  },

  /// A field that has no meaning for this origin, e.g. `fromOverlay` inside a kustomization.
  #[error("{kind} {entry} sets '{field}', which is not allowed here")]
  UnsupportedField {
    kind: ChangeKind,
    entry: String,
    field: &'static str,
  },
}

/// All violations found in a change-set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
  pub fn new() -> Self {
    Self(Vec::new())
  }

  pub fn push(&mut self, error: ValidationError) {
    self.0.push(error);
  }

  pub fn extend(&mut self, other: ValidationErrors) {
    self.0.extend(other.0);
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
    self.0.iter()
  }

  /// `Ok(value)` if no violations were recorded.
  pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
    if self.is_empty() { Ok(value) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} validation error(s)", self.0.len())?;
    for error in &self.0 {
      write!(f, "\n  - {}", error)?;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
  fn from(error: ValidationError) -> Self {
    Self(vec![error])
  }
}

/// Find every value that appears more than once.
///
/// Each duplicate is reported once, in sorted order.
pub fn find_duplicates<'a, I>(values: I) -> BTreeSet<String>
where
  I: IntoIterator<Item = &'a str>,
{
  let mut seen = HashSet::new();
  let mut duplicates = BTreeSet::new();
  for value in values {
    if !seen.insert(value) {
      duplicates.insert(value.to_string());
    }
  }
  duplicates
}

/// Validate an image change-set.
///
/// Checks, over the whole set:
/// - `name` values are unique
/// - literal `newName` values are unique
///
/// and per entry:
/// - `name` is present
/// - `fromOverlay` is not combined with `newName` or `newTag`
/// - without `fromOverlay`, at least one of `newName`/`newTag` is set
/// - caller-supplied entries name at least one target overlay
pub fn validate_images(changes: &[ImageChange], origin: ChangeOrigin) -> Result<Vec<ImageRequest>, ValidationErrors> {
  let mut errors = ValidationErrors::new();

  let names = find_duplicates(changes.iter().filter_map(|c| c.name.as_deref()));
  if !names.is_empty() {
    errors.push(ValidationError::DuplicateName {
      kind: ChangeKind::Image,
      names: names.into_iter().collect(),
    });
  }

  let new_names = find_duplicates(changes.iter().filter_map(|c| c.new_name.as_deref()));
  if !new_names.is_empty() {
    errors.push(ValidationError::DuplicateNewName {
      names: new_names.into_iter().collect(),
    });
  }

  let mut requests = Vec::with_capacity(changes.len());
  for change in changes {
    if let Some(request) = validate_image(change, origin, &mut errors) {
      requests.push(request);
    }
  }

  debug!(count = changes.len(), violations = errors.len(), "validated image change-set");
  errors.into_result(requests)
}

fn validate_image(change: &ImageChange, origin: ChangeOrigin, errors: &mut ValidationErrors) -> Option<ImageRequest> {
  let kind = ChangeKind::Image;
  let before = errors.len();

  if change.name.is_none() {
    errors.push(missing(kind, change.describe(), "name"));
  }

  if origin == ChangeOrigin::Overlay && change.from_overlay.is_some() {
    errors.push(unsupported(kind, change.describe(), "fromOverlay"));
  } else if change.from_overlay.is_some() {
    if change.new_name.is_some() {
      errors.push(conflicting(kind, change.describe(), "newName"));
    }
    if change.new_tag.is_some() {
      errors.push(conflicting(kind, change.describe(), "newTag"));
    }
  } else if change.new_name.is_none() && change.new_tag.is_none() {
    errors.push(missing(kind, change.describe(), "newName or newTag"));
  }

  let overlays = targets(change.overlays.as_deref(), origin, || change.describe(), kind, errors);

  if errors.len() > before {
    return None;
  }

  let source = match &change.from_overlay {
    Some(overlay) => ImageSource::FromOverlay(overlay.clone()),
    None => ImageSource::Literal {
      new_name: change.new_name.clone(),
      new_tag: change.new_tag.clone(),
    },
  };

  Some(ImageRequest {
    name: change.name.clone()?,
    source,
    overlays,
  })
}

/// Validate a chart change-set.
///
/// Checks that `name` values are unique and, per entry, that `name` is present,
/// that exactly one of `version`/`fromOverlay` is set, and that caller-supplied
/// entries name at least one target overlay.
pub fn validate_charts(changes: &[ChartChange], origin: ChangeOrigin) -> Result<Vec<ChartRequest>, ValidationErrors> {
  let mut errors = ValidationErrors::new();

  let names = find_duplicates(changes.iter().filter_map(|c| c.name.as_deref()));
  if !names.is_empty() {
    errors.push(ValidationError::DuplicateName {
      kind: ChangeKind::Chart,
      names: names.into_iter().collect(),
    });
  }

  let mut requests = Vec::with_capacity(changes.len());
  for change in changes {
    if let Some(request) = validate_chart(change, origin, &mut errors) {
      requests.push(request);
    }
  }

  debug!(count = changes.len(), violations = errors.len(), "validated chart change-set");
  errors.into_result(requests)
}

fn validate_chart(change: &ChartChange, origin: ChangeOrigin, errors: &mut ValidationErrors) -> Option<ChartRequest> {
  let kind = ChangeKind::Chart;
  let before = errors.len();

  if change.name.is_none() {
    errors.push(missing(kind, change.describe(), "name"));
  }

  match (&change.from_overlay, &change.version) {
    (Some(_), _) if origin == ChangeOrigin::Overlay => errors.push(unsupported(kind, change.describe(), "fromOverlay")),
    (Some(_), Some(_)) => errors.push(conflicting(kind, change.describe(), "version")),
    (None, None) => errors.push(missing(kind, change.describe(), "version")),
    _ => {}
  }

  let overlays = targets(change.overlays.as_deref(), origin, || change.describe(), kind, errors);

  if errors.len() > before {
    return None;
  }

  let source = match (&change.from_overlay, &change.version) {
    (Some(overlay), _) => ChartSource::FromOverlay(overlay.clone()),
    (None, Some(version)) => ChartSource::Literal {
      version: version.clone(),
    },
    (None, None) => return None,
  };

  Some(ChartRequest {
    name: change.name.clone()?,
    source,
    release_name: change.release_name.clone(),
    overlays,
  })
}

fn targets(
  overlays: Option<&[String]>,
  origin: ChangeOrigin,
  describe: impl FnOnce() -> String,
  kind: ChangeKind,
  errors: &mut ValidationErrors,
) -> Vec<String> {
  match (overlays, origin) {
    (Some(overlays), _) if !overlays.is_empty() => overlays.to_vec(),
    (_, ChangeOrigin::Request) => {
      errors.push(missing(kind, describe(), "overlays"));
      Vec::new()
    }
    (_, ChangeOrigin::Overlay) => Vec::new(),
  }
}

fn missing(kind: ChangeKind, entry: String, field: &'static str) -> ValidationError {
  ValidationError::MissingField { kind, entry, field }
}

fn conflicting(kind: ChangeKind, entry: String, field: &'static str) -> ValidationError {
  ValidationError::ConflictingField { kind, entry, field }
}

fn unsupported(kind: ChangeKind, entry: String, field: &'static str) -> ValidationError {
  ValidationError::UnsupportedField { kind, entry, field }
}

//! Change-set types and validation.
//!
//! # Modules
//!
//! - [`validate`] - Structural and uniqueness checks over a whole change-set
//! - [`types`] - Raw entries, validated requests, and resolved entries

mod types;
pub mod validate;

pub use types::*;
pub use validate::{ValidationError, ValidationErrors, find_duplicates, validate_charts, validate_images};

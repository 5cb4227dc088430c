//! Promotion manifest.
//!
//! The manifest records exactly which images and charts were applied to each
//! overlay. It is the program's only structured output.

mod types;

pub use types::*;

//! mtb-shared: Shared types for the microtab crates
//!
//! This crate contains the value model and the error taxonomy used across
//! the microtab workspace, so that the expression layer and the tabulation
//! layer agree on a single representation of scalars, columns and failures.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod error;
pub mod value;

pub use error::{Error, Result};
pub use value::{LabelKey, Value};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

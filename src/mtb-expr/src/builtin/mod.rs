//! Built-in vectorized functions
//!
//! One function per module. Each module registers itself with
//! `inventory::submit!`; the binding layer in [`crate::functions`] handles
//! argument binding, filters and missing-value semantics, so the bodies
//! here only implement the raw computation.

pub mod clip;
pub mod count;
pub mod max;
pub mod min;
pub mod round;
pub mod sum;
pub mod uniform;
pub mod zeros;

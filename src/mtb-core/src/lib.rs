//! mtb-core: N-dimensional partitioning and the group-by operator
//!
//! Builds on [`mtb_expr`]'s contexts and expression trees:
//!
//! - [`partition_nd`] - split row indices into groups keyed by the
//!   cross-product of per-column label sequences
//! - [`Axis`] / [`LabeledArray`] - the labeled N-dimensional result type,
//!   with optional row/column/grand totals kept as parallel vectors
//! - [`GroupBy`] - the operator itself: key expressions, an aggregation
//!   expression, filtering, explicit labels or axes, totals and percent
//!   normalization

pub mod array;
pub mod groupby;
pub mod partition;

pub use array::{Axis, LabeledArray};
pub use groupby::GroupBy;
pub use partition::partition_nd;

pub use mtb_expr::{Context, Expr};
pub use mtb_shared::{Error, Result, Value};

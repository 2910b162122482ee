//! mtb-expr: Lazy expression evaluation for microtab
//!
//! This crate provides the expression side of the microtab core:
//!
//! - [`Context`] - an immutable view over named, equal-length columns with
//!   an optional ambient row filter and restriction operations
//! - [`Expr`] - polymorphic expression trees (variables, literals,
//!   elementwise operators, vectorized function calls, lazily-built
//!   compound expressions)
//! - [`evaluate`] / [`collect_variables`] - tree-walking evaluation against
//!   a context, and transitive variable collection
//! - [`FunctionRegistry`] - the vectorized-function binding layer: declared
//!   signatures, keyword binding, and the four calling conventions
//!   (create, transform, aggregate, sampling) with their filter-aware
//!   missing-value semantics
//! - [`random`] - the process-wide seedable generator consumed by sampling
//!   functions
//!
//! Expression trees and contexts are immutable once built; evaluation never
//! mutates the context it is given.

pub mod builtin;
pub mod context;
pub mod eval;
pub mod expr;
pub mod functions;
pub mod random;

mod ops;

pub use context::Context;
pub use eval::{collect_variables, evaluate};
pub use expr::{BinaryOp, Compound, CompoundDef, Expr, FnCall, UnaryOp};
pub use functions::{ArgList, FuncKind, FunctionRegistry};

pub use mtb_shared::{Error, Result, Value};

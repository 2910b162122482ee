//! microtab: lazy tabular expression evaluation and N-dimensional group-by
//!
//! The workspace splits into three member crates, re-exported here:
//!
//! - `mtb-shared` - the [`Value`] model, missing-value sentinels and the
//!   [`Error`] taxonomy
//! - `mtb-expr` - [`Context`], [`Expr`] trees, evaluation and the
//!   vectorized-function binding layer with its four calling conventions
//! - `mtb-core` - [`partition_nd`], [`Axis`]/[`LabeledArray`] and the
//!   [`GroupBy`] operator with totals and percent normalization
//!
//! ```
//! use mtb::{Context, Expr, GroupBy, Value};
//!
//! let ctx = Context::new([
//!     ("age".to_string(), Value::from_ints(vec![25, 35, 45, 55])),
//!     ("income".to_string(), Value::from_floats(vec![20.0, 30.0, 40.0, 50.0])),
//! ])?;
//!
//! let result = GroupBy::new(vec![Expr::var("age").ge(Expr::lit(Value::Int(40)))])
//!     .aggregate(Expr::call("sum", vec![Expr::var("income")]))
//!     .compute(&ctx)?;
//!
//! assert_eq!(result.data, vec![Value::Float(50.0), Value::Float(90.0)]);
//! assert_eq!(result.grand_total(), Some(&Value::Float(140.0)));
//! # Ok::<(), mtb::Error>(())
//! ```

pub use mtb_shared::{Error, LabelKey, Result, Value};

pub use mtb_expr::{
    collect_variables, evaluate, random, ArgList, BinaryOp, Compound, CompoundDef, Context, Expr,
    FnCall, FuncKind, FunctionRegistry, UnaryOp,
};

pub use mtb_core::{partition_nd, Axis, GroupBy, LabeledArray};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

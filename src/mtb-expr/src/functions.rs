//! Vectorized-function binding layer
//!
//! Every built-in function declares an ordered positional parameter list
//! and one of four calling conventions:
//!
//! - *create*: produces a new array; filtered-out cells are replaced by the
//!   type's missing-value sentinel
//! - *transform*: first argument is the array to work on; filtered-out
//!   cells keep the original input value
//! - *aggregate*: reduces an array to a scalar; by default missing values
//!   are skipped, either via a missing-aware reduction variant or by
//!   narrowing the effective filter with `is_present`
//! - *sampling*: create-like, draws from the process-wide generator and
//!   defaults a declared `size` parameter to the context's row count
//!
//! All conventions recognize a `filter` keyword; aggregates additionally
//! recognize `skip_na`. The effective filter is the logical AND of the
//! per-call filter and the context's ambient filter, and must type-check
//! as boolean.
//!
//! Functions register themselves with `inventory::submit!` from the
//! modules under [`crate::builtin`] and are collected into the global
//! [`FunctionRegistry`].

use std::collections::{BTreeSet, HashMap};

use log::debug;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;

use mtb_shared::{Error, Result, Value};

use crate::context::Context;
use crate::eval::evaluate;
use crate::expr::{Expr, FnCall};
use crate::random;

/// The four calling conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    /// Produces a new array from its arguments
    Create,
    /// Takes an array and produces a new one of the same shape
    Transform,
    /// Reduces an array to a scalar
    Aggregate,
    /// Create-like, draws from the random generator
    Sampling,
}

/// Evaluated arguments bound to a function's declared parameter slots
pub struct ArgList {
    slots: Vec<Option<Value>>,
}

impl ArgList {
    /// Build an argument list from bound slots
    #[must_use]
    pub fn new(slots: Vec<Option<Value>>) -> Self {
        Self { slots }
    }

    /// The value bound to parameter slot `i`, if any
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&Value> {
        self.slots.get(i).and_then(Option::as_ref)
    }

    /// The value bound to parameter slot `i`, or an arity error naming the
    /// missing parameter
    pub fn require(&self, i: usize, func: &str, param: &str) -> Result<&Value> {
        self.get(i)
            .ok_or_else(|| Error::missing_args(format!("{func}() missing required argument '{param}'")))
    }
}

/// Implementation of a plain (non-sampling) function over bound arguments
pub type PlainFn = fn(&ArgList) -> Result<Value>;

/// Implementation of a sampling function; borrows the generator explicitly
pub type RandomFn = fn(&mut StdRng, &ArgList) -> Result<Value>;

/// Function body, split by whether it consumes the random generator
pub enum FuncImpl {
    /// Deterministic function
    Plain(PlainFn),
    /// Sampling function
    Random(RandomFn),
}

/// A registered vectorized function: name, declared signature, calling
/// convention, optional missing-aware reduction variant, and body
pub struct FuncRegistration {
    /// Function name as written in expressions
    pub name: &'static str,
    /// Ordered positional parameter names
    pub params: &'static [&'static str],
    /// Calling convention
    pub kind: FuncKind,
    /// Missing-aware reduction variant (aggregates only)
    pub nan_variant: Option<PlainFn>,
    /// Function body
    pub imp: FuncImpl,
}

inventory::collect!(FuncRegistration);

/// Registry of built-in vectorized functions
pub struct FunctionRegistry {
    functions: HashMap<&'static str, &'static FuncRegistration>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FunctionRegistry {{ {} functions }}", self.functions.len())
    }
}

impl FunctionRegistry {
    /// Create a registry holding every function registered via inventory
    #[must_use]
    pub fn new() -> Self {
        let mut functions = HashMap::new();
        for func in inventory::iter::<FuncRegistration> {
            functions.insert(func.name, func);
        }
        Self { functions }
    }

    /// Look up a function by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static FuncRegistration> {
        self.functions.get(name).copied()
    }

    /// Check if a function exists
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of registered functions
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

/// The process-wide registry
#[must_use]
pub fn global() -> &'static FunctionRegistry {
    &GLOBAL
}

pub(crate) fn kind_of(name: &str) -> Option<FuncKind> {
    global().get(name).map(|f| f.kind)
}

/// Bind a call's arguments against the function's declared signature and
/// apply the convention-specific filter semantics.
pub(crate) fn call_function(call: &FnCall, ctx: &Context) -> Result<Value> {
    let func = global()
        .get(&call.name)
        .ok_or_else(|| Error::operation(format!("unknown function '{}'", call.name)))?;
    let params = func.params;

    if call.args.len() > params.len() {
        return Err(Error::too_many_args(params.len(), call.args.len()));
    }

    let is_aggregate = func.kind == FuncKind::Aggregate;
    for key in call.kwargs.keys() {
        let recognized = params.contains(&key.as_str())
            || key == "filter"
            || (is_aggregate && key == "skip_na");
        if !recognized {
            return Err(Error::UnknownArgument(key.clone()));
        }
    }

    let own_filter: Option<&Expr> = match (&call.filter, call.kwargs.get("filter")) {
        (Some(_), Some(_)) => {
            return Err(Error::operation(format!(
                "{}() got multiple values for argument 'filter'",
                func.name
            )))
        }
        (Some(f), None) => Some(f.as_ref()),
        (None, Some(e)) => Some(e),
        (None, None) => None,
    };

    // move as many keyword arguments as possible into positional slots,
    // stopping at the first missing one
    let mut positional: Vec<&Expr> = call.args.iter().collect();
    let mut promoted: BTreeSet<&str> = BTreeSet::new();
    for name in &params[call.args.len()..] {
        if let Some(e) = call.kwargs.get(*name) {
            positional.push(e);
            promoted.insert(*name);
        } else {
            break;
        }
    }

    let mut slots: Vec<Option<Value>> = params.iter().map(|_| None).collect();
    for (i, e) in positional.iter().enumerate() {
        slots[i] = Some(evaluate(e, ctx)?);
    }
    for (key, e) in &call.kwargs {
        if key == "filter" || key == "skip_na" || promoted.contains(key.as_str()) {
            continue;
        }
        if let Some(idx) = params.iter().position(|p| p == key) {
            if slots[idx].is_some() {
                return Err(Error::operation(format!(
                    "{}() got multiple values for argument '{key}'",
                    func.name
                )));
            }
            slots[idx] = Some(evaluate(e, ctx)?);
        }
    }

    let skip_na = match call.kwargs.get("skip_na") {
        Some(e) => match evaluate(e, ctx)? {
            Value::Bool(b) => b,
            other => {
                return Err(Error::TypeMismatch {
                    expected: "bool",
                    actual: other.type_name().to_string(),
                })
            }
        },
        None => true,
    };

    // ambient AND per-call filter
    let filter_expr = match (ctx.filter_expr(), own_filter) {
        (Some(ambient), Some(own)) => Some(ambient.clone().and(own.clone())),
        (Some(ambient), None) => Some(ambient.clone()),
        (None, Some(own)) => Some(own.clone()),
        (None, None) => None,
    };
    let filter_value = match &filter_expr {
        Some(e) => {
            let v = evaluate(e, ctx)?;
            check_boolean(&v)?;
            Some(v)
        }
        None => None,
    };

    debug!(
        "call {}: {} positional, filter={}, skip_na={skip_na}",
        func.name,
        positional.len(),
        filter_value.is_some()
    );

    let args = ArgList::new(slots);
    match func.kind {
        FuncKind::Create => apply_create(func, &args, filter_value.as_ref(), ctx),
        FuncKind::Transform => apply_transform(func, &args, filter_value.as_ref(), ctx),
        FuncKind::Aggregate => apply_aggregate(func, &args, filter_value.as_ref(), skip_na, ctx),
        FuncKind::Sampling => apply_sampling(func, args, filter_value.as_ref(), ctx),
    }
}

fn plain(func: &FuncRegistration) -> Result<PlainFn> {
    match func.imp {
        FuncImpl::Plain(f) => Ok(f),
        FuncImpl::Random(_) => Err(Error::operation(format!(
            "{}() is registered as a sampling function",
            func.name
        ))),
    }
}

fn check_boolean(value: &Value) -> Result<()> {
    let ok = match value {
        Value::Bool(_) => true,
        Value::Array(items) => items.iter().all(|v| matches!(v, Value::Bool(_))),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: "bool",
            actual: value.type_name().to_string(),
        })
    }
}

fn bool_mask(value: &Value, len: usize) -> Result<Vec<bool>> {
    match value {
        Value::Bool(b) => Ok(vec![*b; len]),
        Value::Array(items) => {
            if items.len() != len {
                return Err(Error::operation(format!(
                    "filter mask has {} elements, expected {len}",
                    items.len()
                )));
            }
            Ok(items
                .iter()
                .map(|v| matches!(v, Value::Bool(true)))
                .collect())
        }
        other => Err(Error::TypeMismatch {
            expected: "bool",
            actual: other.type_name().to_string(),
        }),
    }
}

fn select_rows(values: &Value, mask: &[bool]) -> Result<Value> {
    let items = values.as_slice()?;
    if items.len() != mask.len() {
        return Err(Error::operation(format!(
            "filter mask has {} elements, expected {}",
            mask.len(),
            items.len()
        )));
    }
    Ok(Value::Array(
        items
            .iter()
            .zip(mask)
            .filter_map(|(v, keep)| keep.then(|| v.clone()))
            .collect(),
    ))
}

fn mask_to_missing(computed: Value, filter_value: &Value, ctx: &Context) -> Result<Value> {
    let n = match computed.len() {
        Some(n) => n,
        None => filter_value.len().unwrap_or_else(|| ctx.len()),
    };
    let computed = computed.expand(n)?;
    let mask = bool_mask(filter_value, n)?;
    let cells = computed.as_slice()?;
    Ok(Value::Array(
        cells
            .iter()
            .zip(&mask)
            .map(|(cell, keep)| {
                if *keep {
                    cell.clone()
                } else {
                    cell.missing_value()
                }
            })
            .collect(),
    ))
}

fn apply_create(
    func: &FuncRegistration,
    args: &ArgList,
    filter_value: Option<&Value>,
    ctx: &Context,
) -> Result<Value> {
    let computed = plain(func)?(args)?;
    match filter_value {
        None => Ok(computed),
        Some(fv) => mask_to_missing(computed, fv, ctx),
    }
}

fn apply_transform(
    func: &FuncRegistration,
    args: &ArgList,
    filter_value: Option<&Value>,
    ctx: &Context,
) -> Result<Value> {
    let original = args
        .require(0, func.name, func.params.first().copied().unwrap_or("a"))?
        .clone();
    let computed = plain(func)?(args)?;
    match filter_value {
        None => Ok(computed),
        Some(fv) => {
            let n = match computed.len() {
                Some(n) => n,
                None => fv.len().unwrap_or_else(|| ctx.len()),
            };
            let computed = computed.expand(n)?;
            let original = original.expand(n)?;
            let mask = bool_mask(fv, n)?;
            let new_cells = computed.as_slice()?;
            let old_cells = original.as_slice()?;
            Ok(Value::Array(
                new_cells
                    .iter()
                    .zip(old_cells)
                    .zip(&mask)
                    .map(|((new, old), keep)| if *keep { new.clone() } else { old.clone() })
                    .collect(),
            ))
        }
    }
}

fn apply_aggregate(
    func: &FuncRegistration,
    args: &ArgList,
    filter_value: Option<&Value>,
    skip_na: bool,
    ctx: &Context,
) -> Result<Value> {
    // zero-parameter aggregates (count) reduce over the rows themselves
    let values = if func.params.is_empty() {
        Value::from_ints((0..ctx.len() as i64).collect())
    } else {
        args.require(0, func.name, func.params[0])?.clone()
    };

    if filter_value.is_some() && values.rank() > 1 {
        return Err(Error::UnsupportedFilterRank);
    }

    let rest: Vec<Option<Value>> = func
        .params
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, _)| args.get(i).cloned())
        .collect();

    if values.rank() == 1 {
        let items = values.as_slice()?;
        let n = items.len();
        let use_nan = skip_na && is_float_column(items) && func.nan_variant.is_some();

        let mut mask: Option<Vec<bool>> = match filter_value {
            Some(fv) => Some(bool_mask(fv, n)?),
            None => None,
        };
        if skip_na && !use_nan {
            let present: Vec<bool> = items.iter().map(Value::is_present).collect();
            mask = Some(match mask {
                Some(m) => m.iter().zip(&present).map(|(a, b)| *a && *b).collect(),
                None => present,
            });
        }
        let selected = match mask {
            Some(m) => select_rows(&values, &m)?,
            None => values,
        };

        let imp: PlainFn = match (use_nan, func.nan_variant) {
            (true, Some(f)) => f,
            _ => plain(func)?,
        };
        let mut slots = vec![Some(selected)];
        slots.extend(rest);
        imp(&ArgList::new(slots))
    } else {
        // scalar or higher-rank input passes through unfiltered
        let mut slots = vec![Some(values)];
        slots.extend(rest);
        plain(func)?(&ArgList::new(slots))
    }
}

fn apply_sampling(
    func: &FuncRegistration,
    mut args: ArgList,
    filter_value: Option<&Value>,
    ctx: &Context,
) -> Result<Value> {
    // one independent draw per row unless a size was given
    if let Some(idx) = func.params.iter().position(|p| *p == "size") {
        if args.slots[idx].is_none() {
            args.slots[idx] = Some(Value::Int(ctx.len() as i64));
        }
    }
    let imp = match func.imp {
        FuncImpl::Random(f) => f,
        FuncImpl::Plain(_) => {
            return Err(Error::operation(format!(
                "{}() is not registered as a sampling function",
                func.name
            )))
        }
    };
    let computed = random::with_generator(|rng| imp(rng, &args))?;
    match filter_value {
        None => Ok(computed),
        Some(fv) => mask_to_missing(computed, fv, ctx),
    }
}

fn is_float_column(items: &[Value]) -> bool {
    items.first().is_some_and(|v| matches!(v, Value::Float(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtb_shared::Value;
    use pretty_assertions::assert_eq;

    fn ctx() -> Context {
        Context::new([(
            "x".to_string(),
            Value::from_floats(vec![1.0, f64::NAN, 3.0]),
        )])
        .unwrap()
    }

    #[test]
    fn test_registry_has_builtins() {
        let registry = global();
        for name in ["count", "sum", "min", "max", "round", "clip", "zeros", "uniform"] {
            assert!(registry.has_function(name), "missing builtin {name}");
        }
    }

    #[test]
    fn test_arity_overflow_message() {
        let call = Expr::call(
            "clip",
            vec![
                Expr::var("x"),
                Expr::lit(Value::Float(0.0)),
                Expr::lit(Value::Float(1.0)),
                Expr::lit(Value::Float(2.0)),
            ],
        );
        let err = evaluate(&call, &ctx()).unwrap_err();
        assert_eq!(err.to_string(), "takes at most 3 arguments (4 given)");
    }

    #[test]
    fn test_unknown_keyword_argument() {
        let call = Expr::call("sum", vec![Expr::var("x")])
            .with_kwarg("frobnicate", Expr::lit(Value::Int(1)));
        let err = evaluate(&call, &ctx()).unwrap_err();
        assert!(matches!(err, Error::UnknownArgument(name) if name == "frobnicate"));
    }

    #[test]
    fn test_keyword_promotion() {
        // keywords given out of declaration order still bind to their slots
        let call = Expr::call("clip", vec![Expr::var("x")])
            .with_kwarg("a_max", Expr::lit(Value::Float(2.0)))
            .with_kwarg("a_min", Expr::lit(Value::Float(1.5)));
        let result = evaluate(&call, &ctx()).unwrap();
        let items = result.as_slice().unwrap();
        assert_eq!(items[0], Value::Float(1.5));
        assert_eq!(items[2], Value::Float(2.0));
    }

    #[test]
    fn test_aggregate_skips_missing_by_default() {
        let call = Expr::call("sum", vec![Expr::var("x")]);
        assert_eq!(evaluate(&call, &ctx()).unwrap(), Value::Float(4.0));
    }

    #[test]
    fn test_aggregate_skip_disabled() {
        let call = Expr::call("sum", vec![Expr::var("x")])
            .with_kwarg("skip_na", Expr::lit(Value::Bool(false)));
        let result = evaluate(&call, &ctx()).unwrap();
        match result {
            Value::Float(f) => assert!(f.is_nan()),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn test_filtered_reduction_rejects_matrices() {
        let matrix = Value::array(vec![
            Value::from_floats(vec![1.0, 2.0]),
            Value::from_floats(vec![3.0, 4.0]),
        ]);
        let call = Expr::call("sum", vec![Expr::lit(matrix)])
            .with_filter(Expr::lit(Value::Bool(true)));
        let err = evaluate(&call, &ctx()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFilterRank));
    }

    #[test]
    fn test_filter_must_be_boolean() {
        let call = Expr::call("sum", vec![Expr::var("x")]).with_filter(Expr::var("x"));
        let err = evaluate(&call, &ctx()).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_create_filter_inserts_missing() {
        let base = Context::new([(
            "keep".to_string(),
            Value::from_bools(vec![true, false, true]),
        )])
        .unwrap();
        let call = Expr::call("zeros", vec![Expr::lit(Value::Int(3))])
            .with_filter(Expr::var("keep"));
        let result = evaluate(&call, &base).unwrap();
        let items = result.as_slice().unwrap();
        assert_eq!(items[0], Value::Float(0.0));
        assert!(!items[1].is_present());
        assert_eq!(items[2], Value::Float(0.0));
    }

    #[test]
    fn test_transform_filter_keeps_original() {
        let base = Context::new([(
            "x".to_string(),
            Value::from_floats(vec![1.4, 2.6, 3.5]),
        )])
        .unwrap();
        let filter = Value::from_bools(vec![true, false, true]);
        let call = Expr::call("round", vec![Expr::var("x")]).with_filter(Expr::lit(filter));
        let result = evaluate(&call, &base).unwrap();
        assert_eq!(
            result,
            Value::from_floats(vec![1.0, 2.6, 4.0])
        );
    }

    #[test]
    fn test_sampling_defaults_size_to_context_length() {
        let _guard = crate::random::test_guard();
        crate::random::seed(42);
        let base = Context::new([(
            "x".to_string(),
            Value::from_floats(vec![0.0; 5]),
        )])
        .unwrap();
        let call = Expr::call("uniform", vec![]);
        let result = evaluate(&call, &base).unwrap();
        assert_eq!(result.len(), Some(5));
        for item in result.as_slice().unwrap() {
            let f = item.as_f64().unwrap();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn test_sampling_is_deterministic_given_seed() {
        let _guard = crate::random::test_guard();
        let base = Context::new([("x".to_string(), Value::from_floats(vec![0.0; 4]))]).unwrap();
        let call = Expr::call("uniform", vec![]);
        crate::random::seed(7);
        let first = evaluate(&call, &base).unwrap();
        crate::random::seed(7);
        let second = evaluate(&call, &base).unwrap();
        assert_eq!(first, second);
    }
}

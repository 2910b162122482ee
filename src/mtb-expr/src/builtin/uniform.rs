use rand::rngs::StdRng;
use rand::Rng;

use crate::functions::{ArgList, FuncImpl, FuncKind, FuncRegistration};
use mtb_shared::{Error, Result, Value};

inventory::submit! {
    FuncRegistration {
        name: "uniform",
        params: &["low", "high", "size"],
        kind: FuncKind::Sampling,
        nan_variant: None,
        imp: FuncImpl::Random(builtin_uniform),
    }
}

/// `size` independent draws from the half-open interval `[low, high)`.
/// Defaults to `[0, 1)`; the binding layer fills `size` with the context's
/// row count when omitted.
pub fn builtin_uniform(rng: &mut StdRng, args: &ArgList) -> Result<Value> {
    let low = numeric(args.get(0), 0.0)?;
    let high = numeric(args.get(1), 1.0)?;
    if high < low {
        return Err(Error::operation(format!(
            "uniform() requires low <= high, got {low} and {high}"
        )));
    }
    let size = match args.require(2, "uniform", "size")? {
        Value::Int(n) if *n >= 0 => *n as usize,
        other => {
            return Err(Error::TypeMismatch {
                expected: "non-negative int",
                actual: other.type_name().to_string(),
            })
        }
    };
    let draws = (0..size)
        .map(|_| {
            if high > low {
                Value::Float(rng.random_range(low..high))
            } else {
                Value::Float(low)
            }
        })
        .collect();
    Ok(Value::Array(draws))
}

fn numeric(value: Option<&Value>, default: f64) -> Result<f64> {
    match value {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v.as_f64().ok_or_else(|| Error::TypeMismatch {
            expected: "numeric",
            actual: v.type_name().to_string(),
        }),
    }
}

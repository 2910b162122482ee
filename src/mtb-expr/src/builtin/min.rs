use crate::functions::{ArgList, FuncImpl, FuncKind, FuncRegistration};
use mtb_shared::{Error, Result, Value};

inventory::submit! {
    FuncRegistration {
        name: "min",
        params: &["values"],
        kind: FuncKind::Aggregate,
        nan_variant: Some(builtin_nanmin),
        imp: FuncImpl::Plain(builtin_min),
    }
}

/// Smallest element of a numeric array. The original element is returned
/// unchanged, so an integer column yields an integer. NaN propagates; the
/// missing-aware variant skips NaN.
pub fn builtin_min(args: &ArgList) -> Result<Value> {
    extremum(args.require(0, "min", "values")?, "min", false, true)
}

pub fn builtin_nanmin(args: &ArgList) -> Result<Value> {
    extremum(args.require(0, "min", "values")?, "min", true, true)
}

pub(crate) fn extremum(values: &Value, name: &str, skip_nan: bool, want_min: bool) -> Result<Value> {
    let items = match values {
        Value::Array(items) => items.as_slice(),
        scalar if scalar.as_f64().is_some() => return Ok(scalar.clone()),
        other => {
            return Err(Error::TypeMismatch {
                expected: "numeric array",
                actual: other.type_name().to_string(),
            })
        }
    };
    let mut best: Option<(f64, &Value)> = None;
    for item in items {
        let key = item.as_f64().ok_or_else(|| Error::TypeMismatch {
            expected: "numeric array",
            actual: item.type_name().to_string(),
        })?;
        if key.is_nan() {
            if skip_nan {
                continue;
            }
            return Ok(Value::Float(f64::NAN));
        }
        let better = match best {
            None => true,
            Some((current, _)) => {
                if want_min {
                    key < current
                } else {
                    key > current
                }
            }
        };
        if better {
            best = Some((key, item));
        }
    }
    best.map(|(_, v)| v.clone())
        .ok_or_else(|| Error::operation(format!("{name}() arg is an empty sequence")))
}

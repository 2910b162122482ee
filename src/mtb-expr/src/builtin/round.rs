use crate::functions::{ArgList, FuncImpl, FuncKind, FuncRegistration};
use mtb_shared::{Error, Result, Value};

inventory::submit! {
    FuncRegistration {
        name: "round",
        params: &["a", "decimals"],
        kind: FuncKind::Transform,
        nan_variant: None,
        imp: FuncImpl::Plain(builtin_round),
    }
}

/// Round floats to `decimals` places (default 0), half away from zero.
/// Integers and booleans pass through unchanged; NaN stays NaN.
pub fn builtin_round(args: &ArgList) -> Result<Value> {
    let values = args.require(0, "round", "a")?;
    let decimals = match args.get(1) {
        Some(Value::Int(d)) => *d,
        Some(other) => {
            return Err(Error::TypeMismatch {
                expected: "int",
                actual: other.type_name().to_string(),
            })
        }
        None => 0,
    };
    let factor = 10f64.powi(decimals as i32);
    elementwise(values, &|cell| match cell {
        Value::Float(f) => Ok(Value::Float((f * factor).round() / factor)),
        Value::Int(_) | Value::Bool(_) | Value::Null => Ok(cell.clone()),
        other => Err(Error::TypeMismatch {
            expected: "numeric",
            actual: other.type_name().to_string(),
        }),
    })
}

pub(crate) fn elementwise(
    values: &Value,
    f: &dyn Fn(&Value) -> Result<Value>,
) -> Result<Value> {
    match values {
        Value::Array(items) => items
            .iter()
            .map(f)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        scalar => f(scalar),
    }
}

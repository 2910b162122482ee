use crate::functions::{ArgList, FuncImpl, FuncKind, FuncRegistration};
use mtb_shared::{Error, Result, Value};

inventory::submit! {
    FuncRegistration {
        name: "sum",
        params: &["values"],
        kind: FuncKind::Aggregate,
        nan_variant: Some(builtin_nansum),
        imp: FuncImpl::Plain(builtin_sum),
    }
}

/// Sum of a numeric array. Booleans count as 0/1, integer input stays
/// integral, any float makes the result a float. NaN propagates; the
/// missing-aware variant below drops NaN instead.
pub fn builtin_sum(args: &ArgList) -> Result<Value> {
    reduce(args.require(0, "sum", "values")?, false)
}

pub fn builtin_nansum(args: &ArgList) -> Result<Value> {
    reduce(args.require(0, "sum", "values")?, true)
}

fn reduce(values: &Value, skip_nan: bool) -> Result<Value> {
    match values {
        Value::Array(items) => {
            let mut int_sum: i64 = 0;
            let mut float_sum = 0.0;
            let mut saw_float = false;
            for item in items {
                match item {
                    Value::Bool(b) => int_sum += i64::from(*b),
                    Value::Int(i) => int_sum += i,
                    Value::Float(f) => {
                        saw_float = true;
                        if !(skip_nan && f.is_nan()) {
                            float_sum += f;
                        }
                    }
                    other => {
                        return Err(Error::TypeMismatch {
                            expected: "numeric array",
                            actual: other.type_name().to_string(),
                        })
                    }
                }
            }
            if saw_float {
                Ok(Value::Float(float_sum + int_sum as f64))
            } else {
                Ok(Value::Int(int_sum))
            }
        }
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) => Ok(Value::Float(*f)),
        other => Err(Error::TypeMismatch {
            expected: "numeric array",
            actual: other.type_name().to_string(),
        }),
    }
}

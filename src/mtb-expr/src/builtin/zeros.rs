use crate::functions::{ArgList, FuncImpl, FuncKind, FuncRegistration};
use mtb_shared::{Error, Result, Value};

inventory::submit! {
    FuncRegistration {
        name: "zeros",
        params: &["shape"],
        kind: FuncKind::Create,
        nan_variant: None,
        imp: FuncImpl::Plain(builtin_zeros),
    }
}

/// A fresh float array of `shape` zeros.
pub fn builtin_zeros(args: &ArgList) -> Result<Value> {
    match args.require(0, "zeros", "shape")? {
        Value::Int(n) if *n >= 0 => Ok(Value::from_floats(vec![0.0; *n as usize])),
        other => Err(Error::TypeMismatch {
            expected: "non-negative int",
            actual: other.type_name().to_string(),
        }),
    }
}

use crate::functions::{ArgList, FuncImpl, FuncKind, FuncRegistration};
use mtb_shared::{Result, Value};

inventory::submit! {
    FuncRegistration {
        name: "count",
        params: &[],
        kind: FuncKind::Aggregate,
        nan_variant: None,
        imp: FuncImpl::Plain(builtin_count),
    }
}

/// Number of rows surviving the effective filter. Declares no parameters;
/// the binding layer hands it the selected row indices.
pub fn builtin_count(args: &ArgList) -> Result<Value> {
    let rows = args.require(0, "count", "rows")?;
    match rows.len() {
        Some(n) => Ok(Value::Int(n as i64)),
        None => Ok(Value::Int(1)),
    }
}

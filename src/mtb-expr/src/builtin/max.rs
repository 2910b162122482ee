use crate::builtin::min::extremum;
use crate::functions::{ArgList, FuncImpl, FuncKind, FuncRegistration};
use mtb_shared::{Result, Value};

inventory::submit! {
    FuncRegistration {
        name: "max",
        params: &["values"],
        kind: FuncKind::Aggregate,
        nan_variant: Some(builtin_nanmax),
        imp: FuncImpl::Plain(builtin_max),
    }
}

/// Largest element of a numeric array. NaN propagates; the missing-aware
/// variant skips NaN.
pub fn builtin_max(args: &ArgList) -> Result<Value> {
    extremum(args.require(0, "max", "values")?, "max", false, false)
}

pub fn builtin_nanmax(args: &ArgList) -> Result<Value> {
    extremum(args.require(0, "max", "values")?, "max", true, false)
}

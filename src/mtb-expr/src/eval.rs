//! Tree-walking evaluation and variable collection

use std::collections::BTreeSet;

use mtb_shared::{Error, Result, Value};

use crate::context::Context;
use crate::expr::Expr;
use crate::functions::{self, FuncKind};
use crate::ops;

/// Evaluate an expression against a context.
///
/// Evaluation never mutates the context. Function-call results may be
/// cached inside a cacheable context, keyed by the call's display form;
/// sampling calls are never cached so draws stay independent.
pub fn evaluate(expr: &Expr, ctx: &Context) -> Result<Value> {
    match expr {
        Expr::Variable(name) => ctx
            .column(name)
            .cloned()
            .ok_or_else(|| Error::UnknownVariable(name.clone())),
        Expr::Literal(value) => Ok(value.clone()),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Expr::Unary { op, expr } => {
            let value = evaluate(expr, ctx)?;
            ops::unary(*op, &value)
        }
        Expr::Binary { op, lhs, rhs } => {
            let left = evaluate(lhs, ctx)?;
            let right = evaluate(rhs, ctx)?;
            ops::binary(*op, &left, &right)
        }
        Expr::Call(call) => {
            if ctx.is_cacheable() && functions::kind_of(&call.name) != Some(FuncKind::Sampling) {
                let key = expr.to_string();
                if let Some(cached) = ctx.cache_get(&key) {
                    return Ok(cached);
                }
                let value = functions::call_function(call, ctx)?;
                ctx.cache_put(key, value.clone());
                Ok(value)
            } else {
                functions::call_function(call, ctx)
            }
        }
        Expr::Compound(compound) => evaluate(compound.complete_expr()?, ctx),
    }
}

/// Collect the set of variable names an expression references, transitively
/// through compound and filtered nodes.
pub fn collect_variables(expr: &Expr) -> Result<BTreeSet<String>> {
    let mut vars = BTreeSet::new();
    collect_into(expr, &mut vars)?;
    Ok(vars)
}

fn collect_into(expr: &Expr, vars: &mut BTreeSet<String>) -> Result<()> {
    match expr {
        Expr::Variable(name) => {
            vars.insert(name.clone());
        }
        Expr::Literal(_) => {}
        Expr::List(items) => {
            for item in items {
                collect_into(item, vars)?;
            }
        }
        Expr::Unary { expr, .. } => collect_into(expr, vars)?,
        Expr::Binary { lhs, rhs, .. } => {
            collect_into(lhs, vars)?;
            collect_into(rhs, vars)?;
        }
        Expr::Call(call) => {
            for arg in &call.args {
                collect_into(arg, vars)?;
            }
            for value in call.kwargs.values() {
                collect_into(value, vars)?;
            }
            if let Some(filter) = &call.filter {
                collect_into(filter, vars)?;
            }
        }
        Expr::Compound(compound) => collect_into(compound.complete_expr()?, vars)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Compound, CompoundDef};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn ctx() -> Context {
        Context::new([
            ("age".to_string(), Value::from_ints(vec![10, 20, 30])),
            ("income".to_string(), Value::from_floats(vec![0.0, 1.5, 2.5])),
        ])
        .unwrap()
    }

    #[test]
    fn test_variable_lookup() {
        let value = evaluate(&Expr::var("age"), &ctx()).unwrap();
        assert_eq!(value, Value::from_ints(vec![10, 20, 30]));
    }

    #[test]
    fn test_unknown_variable() {
        let err = evaluate(&Expr::var("height"), &ctx()).unwrap_err();
        assert!(matches!(err, Error::UnknownVariable(name) if name == "height"));
    }

    #[test]
    fn test_binary_over_columns() {
        let expr = Expr::var("age").ge(Expr::lit(Value::Int(20)));
        let value = evaluate(&expr, &ctx()).unwrap();
        assert_eq!(value, Value::from_bools(vec![false, true, true]));
    }

    #[test]
    fn test_collect_variables_transitive() {
        struct Def;
        impl CompoundDef for Def {
            fn name(&self) -> &str {
                "mean_income"
            }
            fn build(&self) -> Result<Expr> {
                Ok(Expr::call("sum", vec![Expr::var("income")])
                    .div(Expr::call("count", vec![])))
            }
        }
        let expr = Expr::Compound(Compound::new(Arc::new(Def))).add(Expr::var("age").neg());
        let call = Expr::call("sum", vec![expr]).with_filter(Expr::var("employed"));
        let vars = collect_variables(&call).unwrap();
        let names: Vec<&str> = vars.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["age", "employed", "income"]);
    }

    #[test]
    fn test_filter_composition_is_and() {
        // a filtered call with ambient F1 and call filter F2 must equal the
        // same call, unfiltered, against a context restricted by F1 AND F2
        let base = Context::new([
            ("age".to_string(), Value::from_ints(vec![10, 20, 30, 40])),
            ("x".to_string(), Value::from_floats(vec![1.0, 2.0, 3.0, 4.0])),
        ])
        .unwrap();

        let f1 = Expr::var("age").ge(Expr::lit(Value::Int(20)));
        let f2 = Expr::var("age").lt(Expr::lit(Value::Int(40)));

        let ambient = base.clone().with_filter(f1.clone());
        let filtered_call = Expr::call("sum", vec![Expr::var("x")]).with_filter(f2.clone());
        let composed = evaluate(&filtered_call, &ambient).unwrap();

        let restricted = base
            .subset_filter(&f1.and(f2), &["x".to_string()])
            .unwrap();
        let plain_call = Expr::call("sum", vec![Expr::var("x")]);
        let direct = evaluate(&plain_call, &restricted).unwrap();

        assert_eq!(composed, direct);
        assert_eq!(direct, Value::Float(5.0));
    }
}

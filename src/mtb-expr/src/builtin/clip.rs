use crate::builtin::round::elementwise;
use crate::functions::{ArgList, FuncImpl, FuncKind, FuncRegistration};
use mtb_shared::{Error, Result, Value};

inventory::submit! {
    FuncRegistration {
        name: "clip",
        params: &["a", "a_min", "a_max"],
        kind: FuncKind::Transform,
        nan_variant: None,
        imp: FuncImpl::Plain(builtin_clip),
    }
}

/// Limit values to the `[a_min, a_max]` interval. Either bound may be
/// omitted. Cells inside the interval keep their original value and type;
/// clipped cells take the bound's value. NaN compares false against both
/// bounds and passes through.
pub fn builtin_clip(args: &ArgList) -> Result<Value> {
    let values = args.require(0, "clip", "a")?;
    let lo = bound(args.get(1))?;
    let hi = bound(args.get(2))?;
    if lo.is_none() && hi.is_none() {
        return Err(Error::missing_args(
            "clip() requires at least one of 'a_min' and 'a_max'".to_string(),
        ));
    }
    elementwise(values, &|cell| {
        let key = cell.as_f64().ok_or_else(|| Error::TypeMismatch {
            expected: "numeric",
            actual: cell.type_name().to_string(),
        })?;
        if let Some((limit, replacement)) = &lo {
            if key < *limit {
                return Ok(replacement.clone());
            }
        }
        if let Some((limit, replacement)) = &hi {
            if key > *limit {
                return Ok(replacement.clone());
            }
        }
        Ok(cell.clone())
    })
}

fn bound(value: Option<&Value>) -> Result<Option<(f64, Value)>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let key = v.as_f64().ok_or_else(|| Error::TypeMismatch {
                expected: "numeric",
                actual: v.type_name().to_string(),
            })?;
            Ok(Some((key, v.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clip_both_bounds() {
        let args = ArgList::new(vec![
            Some(Value::from_ints(vec![0, 5, 10])),
            Some(Value::Int(2)),
            Some(Value::Int(8)),
        ]);
        assert_eq!(
            builtin_clip(&args).unwrap(),
            Value::from_ints(vec![2, 5, 8])
        );
    }

    #[test]
    fn test_clip_single_bound() {
        let args = ArgList::new(vec![
            Some(Value::from_floats(vec![-1.0, 0.5])),
            Some(Value::Float(0.0)),
            None,
        ]);
        assert_eq!(
            builtin_clip(&args).unwrap(),
            Value::from_floats(vec![0.0, 0.5])
        );
    }

    #[test]
    fn test_clip_no_bounds_errors() {
        let args = ArgList::new(vec![Some(Value::from_ints(vec![1])), None, None]);
        assert!(builtin_clip(&args).is_err());
    }

    #[test]
    fn test_clip_nan_passes_through() {
        let args = ArgList::new(vec![
            Some(Value::from_floats(vec![f64::NAN])),
            Some(Value::Float(0.0)),
            Some(Value::Float(1.0)),
        ]);
        let result = builtin_clip(&args).unwrap();
        match &result.as_slice().unwrap()[0] {
            Value::Float(f) => assert!(f.is_nan()),
            other => panic!("expected float, got {other:?}"),
        }
    }
}

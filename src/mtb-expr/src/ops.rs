//! Elementwise operator semantics with scalar broadcasting
//!
//! Integer arithmetic stays integral except division, which always widens
//! to float (so percent-style ratios never raise on zero denominators).

use mtb_shared::{Error, Result, Value};

use crate::expr::{BinaryOp, UnaryOp};

pub(crate) fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Array(left), Value::Array(right)) => {
            if left.len() != right.len() {
                return Err(Error::operation(format!(
                    "operand length mismatch: {} vs {}",
                    left.len(),
                    right.len()
                )));
            }
            left.iter()
                .zip(right)
                .map(|(l, r)| scalar_binary(op, l, r))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        (Value::Array(left), scalar) => left
            .iter()
            .map(|l| scalar_binary(op, l, scalar))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        (scalar, Value::Array(right)) => right
            .iter()
            .map(|r| scalar_binary(op, scalar, r))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        (l, r) => scalar_binary(op, l, r),
    }
}

pub(crate) fn unary(op: UnaryOp, value: &Value) -> Result<Value> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| scalar_unary(op, v))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        scalar => scalar_unary(op, scalar),
    }
}

fn scalar_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    match op {
        BinaryOp::And | BinaryOp::Or => match (lhs, rhs) {
            (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(if op == BinaryOp::And {
                *l && *r
            } else {
                *l || *r
            })),
            _ => Err(type_error("bool", lhs, rhs)),
        },
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = match (lhs, rhs) {
                (Value::Bool(l), Value::Bool(r)) => l == r,
                (Value::Str(l), Value::Str(r)) => l == r,
                _ => match (lhs.as_f64(), rhs.as_f64()) {
                    (Some(l), Some(r)) => l == r,
                    _ => return Err(type_error("comparable operands", lhs, rhs)),
                },
            };
            Ok(Value::Bool(if op == BinaryOp::Eq { equal } else { !equal }))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering_holds = match (lhs, rhs) {
                (Value::Str(l), Value::Str(r)) => compare(op, l, r),
                _ => match (lhs.as_f64(), rhs.as_f64()) {
                    (Some(l), Some(r)) => compare(op, &l, &r),
                    _ => return Err(type_error("comparable operands", lhs, rhs)),
                },
            };
            Ok(Value::Bool(ordering_holds))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => match (lhs, rhs) {
            (Value::Int(l), Value::Int(r)) => Ok(Value::Int(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                _ => l * r,
            })),
            _ => match (lhs.as_f64(), rhs.as_f64()) {
                (Some(l), Some(r)) => Ok(Value::Float(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    _ => l * r,
                })),
                _ => Err(type_error("numeric operands", lhs, rhs)),
            },
        },
        BinaryOp::Div => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(l), Some(r)) => Ok(Value::Float(l / r)),
            _ => Err(type_error("numeric operands", lhs, rhs)),
        },
    }
}

fn scalar_unary(op: UnaryOp, value: &Value) -> Result<Value> {
    match op {
        UnaryOp::Not => match value {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(Error::TypeMismatch {
                expected: "bool",
                actual: other.type_name().to_string(),
            }),
        },
        UnaryOp::Neg => match value {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(Error::TypeMismatch {
                expected: "numeric operand",
                actual: other.type_name().to_string(),
            }),
        },
    }
}

fn compare<T: PartialOrd>(op: BinaryOp, l: &T, r: &T) -> bool {
    match op {
        BinaryOp::Lt => l < r,
        BinaryOp::Le => l <= r,
        BinaryOp::Gt => l > r,
        BinaryOp::Ge => l >= r,
        _ => unreachable!("not an ordering operator"),
    }
}

fn type_error(expected: &'static str, lhs: &Value, rhs: &Value) -> Error {
    Error::TypeMismatch {
        expected,
        actual: format!("{} and {}", lhs.type_name(), rhs.type_name()),
    }
}

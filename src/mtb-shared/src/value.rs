//! Value types for microtab data processing
//!
//! This module provides the core `Value` enum representing every datum the
//! evaluation layer handles: scalars, columns (rank-1 arrays) and nested
//! arrays. Columns in a context are `Value::Array` of scalars; stacking
//! per-group results can produce rank-2 data (arrays of arrays).
//!
//! Each scalar type has a canonical missing-value sentinel, distinct from
//! the typed error channel: `NaN` for floats, `i64::MIN` for integers,
//! `false` for booleans and the empty string for strings. `is_present`
//! is false exactly for the sentinel.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};

/// A scalar or array value processed by microtab
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value (no data of any type)
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64)
    Int(i64),
    /// Float value (f64)
    Float(f64),
    /// String value
    Str(String),
    /// Array of values; nesting gives rank > 1
    Array(Vec<Value>),
}

impl Value {
    /// Create a new boolean value
    #[must_use]
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create a new integer value
    #[must_use]
    pub fn int(i: i64) -> Self {
        Value::Int(i)
    }

    /// Create a new float value
    #[must_use]
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a new string value
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Create a new array value
    #[must_use]
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(values)
    }

    /// Build a boolean column
    #[must_use]
    pub fn from_bools(values: Vec<bool>) -> Self {
        Value::Array(values.into_iter().map(Value::Bool).collect())
    }

    /// Build an integer column
    #[must_use]
    pub fn from_ints(values: Vec<i64>) -> Self {
        Value::Array(values.into_iter().map(Value::Int).collect())
    }

    /// Build a float column
    #[must_use]
    pub fn from_floats(values: Vec<f64>) -> Self {
        Value::Array(values.into_iter().map(Value::Float).collect())
    }

    /// Build a string column
    #[must_use]
    pub fn from_strs(values: Vec<String>) -> Self {
        Value::Array(values.into_iter().map(Value::Str).collect())
    }

    /// Get the type name of this value
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
        }
    }

    /// Check if value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is an array
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Element count for arrays, `None` for scalars
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    /// True for a zero-length array
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Number of dimensions: 0 for scalars, 1 for arrays of scalars,
    /// 2 for arrays of arrays, and so on. An empty array has rank 1.
    #[must_use]
    pub fn rank(&self) -> usize {
        match self {
            Value::Array(items) => 1 + items.first().map_or(0, Value::rank),
            _ => 0,
        }
    }

    /// The canonical missing-value sentinel for this value's scalar type.
    ///
    /// For arrays, the sentinel of the first element's type (used when
    /// masking whole cells out of a computed column).
    #[must_use]
    pub fn missing_value(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Bool(_) => Value::Bool(false),
            Value::Int(_) => Value::Int(i64::MIN),
            Value::Float(_) => Value::Float(f64::NAN),
            Value::Str(_) => Value::Str(String::new()),
            Value::Array(items) => items.first().map_or(Value::Null, Value::missing_value),
        }
    }

    /// False exactly for the type's missing-value sentinel (and for null)
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(_) | Value::Str(_) => true,
            Value::Int(i) => *i != i64::MIN,
            Value::Float(f) => !f.is_nan(),
            Value::Array(_) => true,
        }
    }

    /// Broadcast a scalar to an n-element column; an array is passed through
    /// after its length is checked against `n`.
    pub fn expand(self, n: usize) -> Result<Value> {
        match self {
            Value::Array(items) => {
                if items.len() == n {
                    Ok(Value::Array(items))
                } else {
                    Err(Error::operation(format!(
                        "cannot expand array of length {} to {} rows",
                        items.len(),
                        n
                    )))
                }
            }
            scalar => Ok(Value::Array(vec![scalar; n])),
        }
    }

    /// Extract a boolean scalar
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract an integer scalar
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Widen a numeric scalar to f64 (booleans count as 0/1)
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow the elements of an array value
    pub fn as_slice(&self) -> Result<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(Error::TypeMismatch {
                expected: "array",
                actual: other.type_name().to_string(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(fl) => write!(f, "{fl}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Hashable wrapper over scalar values, used as a lookup key when locating
/// a row's position in an axis's label sequence.
///
/// Floats compare and hash by bit pattern, so `NaN` labels are usable as
/// ordinary partition keys.
#[derive(Debug, Clone)]
pub struct LabelKey(pub Value);

impl PartialEq for LabelKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl Eq for LabelKey {}

impl Hash for LabelKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            // Arrays are rejected as partition labels before keys are built
            Value::Array(items) => items.len().hash(state),
        }
    }
}

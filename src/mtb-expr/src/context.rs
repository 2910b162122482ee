//! Evaluation context: an immutable view over named, equal-length columns
//!
//! A context is created by the surrounding platform and never mutated;
//! everything downstream works on derived contexts produced by `subset_*`.
//! Derived contexts are non-cacheable because their row selection is
//! data-dependent and not stable across calls.

use std::cell::RefCell;
use std::collections::HashMap;

use indexmap::IndexMap;
use log::trace;

use mtb_shared::{Error, Result, Value};

use crate::eval::evaluate;
use crate::expr::Expr;

/// Immutable row-oriented view over named columns of equal length, plus an
/// optional ambient boolean filter applied to all evaluations performed
/// through it.
#[derive(Debug, Clone)]
pub struct Context {
    columns: IndexMap<String, Value>,
    len: usize,
    filter: Option<Expr>,
    cacheable: bool,
    // expression-result cache, keyed by the expression's display form;
    // consulted only when `cacheable` is true
    cache: RefCell<HashMap<String, Value>>,
}

impl Context {
    /// Create a context from named columns. Every column must be a rank-1
    /// array and all columns must share one length.
    pub fn new(columns: impl IntoIterator<Item = (String, Value)>) -> Result<Self> {
        let columns: IndexMap<String, Value> = columns.into_iter().collect();
        for (name, col) in &columns {
            if col.rank() != 1 {
                return Err(Error::TypeMismatch {
                    expected: "column (rank-1 array)",
                    actual: format!("{} '{}'", col.type_name(), name),
                });
            }
        }
        let mut len: Option<usize> = None;
        for (name, col) in &columns {
            let n = col.len().unwrap_or(0);
            match len {
                None => len = Some(n),
                Some(expected) if expected != n => {
                    return Err(Error::ColumnLength {
                        name: name.clone(),
                        expected,
                        actual: n,
                    })
                }
                Some(_) => {}
            }
        }
        let len = len.unwrap_or(0);
        Ok(Self {
            columns,
            len,
            filter: None,
            cacheable: false,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Attach an ambient filter expression; it composes (logical AND) with
    /// per-call filters during evaluation.
    #[must_use]
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Allow expression results evaluated through this context to be cached.
    /// Derived contexts are always non-cacheable regardless of this flag.
    #[must_use]
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Row count
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the context has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Look up a column by name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// Names of all columns, in insertion order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// The ambient filter expression, if any
    #[must_use]
    pub fn filter_expr(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    /// Whether expression results may be cached against this context
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    pub(crate) fn cache_get(&self, key: &str) -> Option<Value> {
        self.cache.borrow().get(key).cloned()
    }

    pub(crate) fn cache_put(&self, key: String, value: Value) {
        self.cache.borrow_mut().insert(key, value);
    }

    /// Derive a context restricted to the rows matching `filter`, keeping
    /// only the columns named in `keep`.
    pub fn subset_filter(&self, filter: &Expr, keep: &[String]) -> Result<Context> {
        let mask = evaluate(filter, self)?;
        let mask = match mask {
            Value::Bool(b) => vec![b; self.len],
            Value::Array(items) => {
                let mut bools = Vec::with_capacity(items.len());
                for item in &items {
                    match item {
                        Value::Bool(b) => bools.push(*b),
                        other => {
                            return Err(Error::TypeMismatch {
                                expected: "bool",
                                actual: other.type_name().to_string(),
                            })
                        }
                    }
                }
                if bools.len() != self.len {
                    return Err(Error::operation(format!(
                        "filter mask has {} rows, context has {}",
                        bools.len(),
                        self.len
                    )));
                }
                bools
            }
            other => {
                return Err(Error::TypeMismatch {
                    expected: "bool",
                    actual: other.type_name().to_string(),
                })
            }
        };
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.then_some(i))
            .collect();
        self.subset_indices(&indices, keep)
    }

    /// Derive a context restricted to the given row indices, keeping only
    /// the columns named in `keep`. Names in `keep` that are not present
    /// are skipped; referencing them later fails with `UnknownVariable`.
    pub fn subset_indices(&self, indices: &[usize], keep: &[String]) -> Result<Context> {
        trace!("subset: {} of {} rows, {} columns kept", indices.len(), self.len, keep.len());
        let mut columns = IndexMap::new();
        for name in keep {
            let Some(col) = self.columns.get(name) else {
                continue;
            };
            let items = col.as_slice()?;
            let mut selected = Vec::with_capacity(indices.len());
            for &i in indices {
                let item = items.get(i).ok_or_else(|| {
                    Error::operation(format!("row index {i} out of bounds for column '{name}'"))
                })?;
                selected.push(item.clone());
            }
            columns.insert(name.clone(), Value::Array(selected));
        }
        Ok(Context {
            columns,
            len: indices.len(),
            filter: None,
            cacheable: false,
            cache: RefCell::new(HashMap::new()),
        })
    }
}

//! Labeled N-dimensional result arrays

use std::collections::HashSet;

use itertools::Itertools;

use mtb_shared::{Error, LabelKey, Result, Value};

/// One dimension of a result: a name plus an ordered, deduplicated label
/// sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// Axis name, shown alongside the labels
    pub name: String,
    /// Distinct labels, in partition order
    pub labels: Vec<Value>,
}

impl Axis {
    /// Build an axis, dropping duplicate labels while preserving order
    pub fn new(name: impl Into<String>, labels: Vec<Value>) -> Self {
        let mut seen = HashSet::new();
        let labels = labels
            .into_iter()
            .filter(|v| seen.insert(LabelKey(v.clone())))
            .collect();
        Self {
            name: name.into(),
            labels,
        }
    }

    /// Number of labels
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the axis has no labels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// An N-dimensional grid of values with one [`Axis`] per dimension.
///
/// `data` is flat, row-major, last axis fastest; `shape` mirrors the axis
/// label counts. Row, column and grand totals live in the parallel
/// `row_totals` / `col_totals` vectors rather than as margin cells of the
/// grid itself; the grand total sits last in `col_totals`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray {
    /// One axis per dimension, in key order
    pub axes: Vec<Axis>,
    /// Label count per axis
    pub shape: Vec<usize>,
    /// Flat row-major cell values
    pub data: Vec<Value>,
    /// One total per combination of the outer axes' labels
    pub row_totals: Option<Vec<Value>>,
    /// One total per label of the last axis, then the grand total
    pub col_totals: Option<Vec<Value>>,
}

impl LabeledArray {
    /// Build an array from flat row-major data, checking it matches the
    /// axes' combined size
    pub fn from_flat(axes: Vec<Axis>, data: Vec<Value>) -> Result<Self> {
        let shape: Vec<usize> = axes.iter().map(Axis::len).collect();
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::operation(format!(
                "{} cells supplied for a {shape:?} grid ({expected} expected)",
                data.len()
            )));
        }
        Ok(Self {
            axes,
            shape,
            data,
            row_totals: None,
            col_totals: None,
        })
    }

    /// The degenerate no-data result
    #[must_use]
    pub fn empty(axes: Vec<Axis>) -> Self {
        let shape = axes.iter().map(Axis::len).collect();
        Self {
            axes,
            shape,
            data: Vec::new(),
            row_totals: None,
            col_totals: None,
        }
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid holds no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell at the given per-axis label indices
    #[must_use]
    pub fn get(&self, indices: &[usize]) -> Option<&Value> {
        if indices.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0;
        for (i, len) in indices.iter().zip(&self.shape) {
            if i >= len {
                return None;
            }
            flat = flat * len + i;
        }
        self.data.get(flat)
    }

    /// The grand total, when totals were computed
    #[must_use]
    pub fn grand_total(&self) -> Option<&Value> {
        self.col_totals.as_ref().and_then(|totals| totals.last())
    }

    /// Cells paired with their per-axis labels, in row-major order
    pub fn labeled_cells(&self) -> impl Iterator<Item = (Vec<&Value>, &Value)> {
        self.axes
            .iter()
            .map(|axis| axis.labels.iter())
            .multi_cartesian_product()
            .zip(&self.data)
    }
}

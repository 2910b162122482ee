//! The group-by operator
//!
//! Partitions a context's rows by one or more key expressions and
//! evaluates an aggregation expression over each group, the row/column
//! unions and the whole table. Cells come out as a flat row-major
//! sequence first and are only then shaped into the labeled grid, so
//! heterogeneous per-group results stack uniformly.

use std::collections::BTreeSet;

use log::debug;

use mtb_expr::{collect_variables, evaluate, Context, Expr};
use mtb_shared::{Error, Result, Value};

use crate::array::{Axis, LabeledArray};
use crate::partition::partition_nd;

/// Builder for a group-by computation.
///
/// Requires at least one key expression; key expressions must vary by row,
/// so constants and literal lists are rejected. The aggregation expression
/// defaults to `count()`. `explicit_labels` and `axes` are mutually
/// exclusive ways to pin the label sequences. Totals default to on;
/// percent normalization defaults to off and forces totals when enabled.
#[derive(Debug, Clone)]
pub struct GroupBy {
    keys: Vec<Expr>,
    aggregate: Option<Expr>,
    filter: Option<Expr>,
    explicit_labels: Option<Vec<Vec<Value>>>,
    axes: Option<Vec<Axis>>,
    totals: bool,
    percent: bool,
}

impl GroupBy {
    /// Start a group-by over the given key expressions
    #[must_use]
    pub fn new(keys: Vec<Expr>) -> Self {
        Self {
            keys,
            aggregate: None,
            filter: None,
            explicit_labels: None,
            axes: None,
            totals: true,
            percent: false,
        }
    }

    /// Aggregation expression evaluated per group (default: `count()`)
    #[must_use]
    pub fn aggregate(mut self, expr: Expr) -> Self {
        self.aggregate = Some(expr);
        self
    }

    /// Restrict the computation to rows matching `filter`
    #[must_use]
    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Pin each axis's label sequence; data values not listed are dropped
    #[must_use]
    pub fn explicit_labels(mut self, labels: Vec<Vec<Value>>) -> Self {
        self.explicit_labels = Some(labels);
        self
    }

    /// Supply fully-formed axes (names and label sequences)
    #[must_use]
    pub fn axes(mut self, axes: Vec<Axis>) -> Self {
        self.axes = Some(axes);
        self
    }

    /// Compute row, column and grand totals (default: true)
    #[must_use]
    pub fn totals(mut self, totals: bool) -> Self {
        self.totals = totals;
        self
    }

    /// Normalize cells and totals to percentages of the grand total;
    /// enabling this forces totals on
    #[must_use]
    pub fn percent(mut self, percent: bool) -> Self {
        self.percent = percent;
        if percent {
            self.totals = true;
        }
        self
    }

    /// Run the computation against a context
    pub fn compute(&self, ctx: &Context) -> Result<LabeledArray> {
        self.validate()?;
        let agg = self
            .aggregate
            .clone()
            .unwrap_or_else(|| Expr::call("count", vec![]));

        // restrict to the filtered rows and the columns actually used
        let effective_filter = match (ctx.filter_expr(), &self.filter) {
            (Some(ambient), Some(own)) => Some(ambient.clone().and(own.clone())),
            (Some(ambient), None) => Some(ambient.clone()),
            (None, Some(own)) => Some(own.clone()),
            (None, None) => None,
        };
        let fctx = match &effective_filter {
            Some(filter) => {
                let mut needed: BTreeSet<String> = collect_variables(&agg)?;
                for key in &self.keys {
                    needed.extend(collect_variables(key)?);
                }
                needed.extend(collect_variables(filter)?);
                let keep: Vec<String> = needed.into_iter().collect();
                ctx.subset_filter(filter, &keep)?
            }
            None => ctx.clone(),
        };

        // key columns, scalars broadcast to the filtered row count
        let rows = fctx.len();
        let mut key_values = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let value = evaluate(key, &fctx)?.expand(rows)?;
            if value.rank() != 1 {
                return Err(Error::InvalidKeyExpression(key.to_string()));
            }
            key_values.push(value);
        }
        let key_slices: Vec<&[Value]> = key_values
            .iter()
            .map(Value::as_slice)
            .collect::<Result<_>>()?;

        let explicit: Option<Vec<Vec<Value>>> = self.explicit_labels.clone().or_else(|| {
            self.axes
                .as_ref()
                .map(|axes| axes.iter().map(|a| a.labels.clone()).collect())
        });
        let (groups, label_seqs) = partition_nd(&key_slices, explicit.as_deref())?;

        let axes: Vec<Axis> = match &self.axes {
            Some(axes) => axes
                .iter()
                .zip(label_seqs)
                .map(|(axis, labels)| Axis::new(axis.name.clone(), labels))
                .collect(),
            None => self
                .keys
                .iter()
                .zip(label_seqs)
                .map(|(key, labels)| Axis::new(key.to_string(), labels))
                .collect(),
        };

        if groups.is_empty() {
            debug!("group-by over {rows} rows produced no groups");
            return Ok(LabeledArray::empty(axes));
        }
        debug!("group-by over {rows} rows: {} groups", groups.len());

        let agg_vars: Vec<String> = collect_variables(&agg)?.into_iter().collect();
        let eval_group = |indices: &[usize]| -> Result<Value> {
            let gctx = fctx.subset_indices(indices, &agg_vars)?;
            evaluate(&agg, &gctx)
        };

        let mut data = Vec::with_capacity(groups.len());
        for group in &groups {
            data.push(eval_group(group)?);
        }

        let mut row_totals = None;
        let mut col_totals = None;
        if self.totals {
            let width = axes[axes.len() - 1].len();
            let height: usize = axes[..axes.len() - 1].iter().map(Axis::len).product();

            let mut totals = Vec::with_capacity(height);
            for h in 0..height {
                let union: Vec<usize> = groups[h * width..(h + 1) * width]
                    .iter()
                    .flatten()
                    .copied()
                    .collect();
                totals.push(eval_group(&union)?);
            }
            row_totals = Some(totals);

            let mut totals = Vec::with_capacity(width + 1);
            let mut all_rows = Vec::new();
            for w in 0..width {
                let union: Vec<usize> = (0..height)
                    .flat_map(|h| groups[h * width + w].iter().copied())
                    .collect();
                all_rows.extend_from_slice(&union);
                totals.push(eval_group(&union)?);
            }
            totals.push(eval_group(&all_rows)?);
            col_totals = Some(totals);
        }

        if self.percent {
            // widen through f64 so a zero grand total divides to signed
            // infinity instead of failing
            let grand = col_totals
                .as_ref()
                .and_then(|totals| totals.last())
                .ok_or_else(|| Error::operation("percent mode requires totals".to_string()))?;
            let total = grand.as_f64().ok_or_else(|| Error::TypeMismatch {
                expected: "numeric grand total",
                actual: grand.type_name().to_string(),
            })?;
            for cell in &mut data {
                *cell = percent_of(cell, total)?;
            }
            if let Some(totals) = &mut row_totals {
                for cell in totals.iter_mut() {
                    *cell = percent_of(cell, total)?;
                }
            }
            if let Some(totals) = &mut col_totals {
                for cell in totals.iter_mut() {
                    *cell = percent_of(cell, total)?;
                }
            }
        }

        let mut result = LabeledArray::from_flat(axes, data)?;
        result.row_totals = row_totals;
        result.col_totals = col_totals;
        Ok(result)
    }

    fn validate(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(Error::missing_args(
                "group-by requires at least one key expression".to_string(),
            ));
        }
        for key in &self.keys {
            if matches!(key, Expr::Literal(_) | Expr::List(_)) {
                return Err(Error::InvalidKeyExpression(key.to_string()));
            }
        }
        if self.explicit_labels.is_some() && self.axes.is_some() {
            return Err(Error::ConflictingArguments("explicit_labels", "axes"));
        }
        if let Some(labels) = &self.explicit_labels {
            if labels.len() != self.keys.len() {
                return Err(Error::operation(format!(
                    "{} label sequences supplied for {} key expressions",
                    labels.len(),
                    self.keys.len()
                )));
            }
        }
        if let Some(axes) = &self.axes {
            if axes.len() != self.keys.len() {
                return Err(Error::operation(format!(
                    "{} axes supplied for {} key expressions",
                    axes.len(),
                    self.keys.len()
                )));
            }
        }
        Ok(())
    }
}

fn percent_of(value: &Value, total: f64) -> Result<Value> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| percent_of(item, total))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        scalar => {
            let f = scalar.as_f64().ok_or_else(|| Error::TypeMismatch {
                expected: "numeric cell",
                actual: scalar.type_name().to_string(),
            })?;
            Ok(Value::Float(f * 100.0 / total))
        }
    }
}

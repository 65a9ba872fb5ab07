//! Month-keyed data table holding raw and derived columns.

use crate::core::Month;
use crate::error::{ForecastError, Result};
use std::collections::HashMap;

/// Sentinel for a missing value inside a materialized column.
pub const MISSING: f64 = f64::NAN;

/// A table keyed by a contiguous monthly range.
///
/// Every column spans the same range; gaps are explicit NaN markers, not
/// absent keys. The table is owned exclusively by whoever mutates it: the
/// fit path adds derived columns, the forecast loop appends rows.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    start: Option<Month>,
    len: usize,
    columns: HashMap<String, Vec<f64>>,
}

impl Dataset {
    /// Create an empty dataset starting at `start`.
    pub fn new(start: Month) -> Self {
        Self {
            start: Some(start),
            len: 0,
            columns: HashMap::new(),
        }
    }

    /// Build a dataset from equally long columns starting at `start`.
    pub fn from_columns<I, S>(start: Month, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut data = Self::new(start);
        for (name, values) in columns {
            data.insert_column(name, values)?;
        }
        Ok(data)
    }

    /// Number of materialized months.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First materialized month.
    pub fn start(&self) -> Option<Month> {
        self.start
    }

    /// Last materialized month.
    pub fn end_month(&self) -> Option<Month> {
        match (self.start, self.len) {
            (Some(start), n) if n > 0 => Some(start.plus_months(n as u32 - 1)),
            _ => None,
        }
    }

    /// The materialized months in chronological order.
    pub fn months(&self) -> Vec<Month> {
        match self.start {
            Some(start) => Month::sequence(start, self.len),
            None => Vec::new(),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in sorted order.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Values of a column over the materialized range.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ForecastError::UnknownColumn(name.to_string()))
    }

    /// Insert a column spanning the materialized range, overwriting any
    /// column of the same name.
    ///
    /// The first column inserted into a dataset without rows fixes the
    /// range length.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        if self.columns.is_empty() && self.len == 0 {
            self.len = values.len();
        } else if values.len() != self.len {
            return Err(ForecastError::DimensionMismatch {
                expected: self.len,
                got: values.len(),
            });
        }
        self.columns.insert(name.into(), values);
        Ok(())
    }

    /// Insert a constant 1.0 column over the materialized range.
    pub fn push_constant(&mut self, name: impl Into<String>) -> Result<()> {
        self.insert_column(name, vec![1.0; self.len])
    }

    /// Look up one cell.
    ///
    /// An absent column is a hard [`ForecastError::UnknownColumn`] error; a
    /// month outside the materialized range or a NaN cell is `Ok(None)`.
    pub fn value(&self, name: &str, month: Month) -> Result<Option<f64>> {
        let column = self
            .columns
            .get(name)
            .ok_or_else(|| ForecastError::UnknownColumn(name.to_string()))?;
        Ok(self
            .index_of(month)
            .map(|i| column[i])
            .filter(|v| !v.is_nan()))
    }

    /// Write one cell, extending the materialized range forward if needed.
    ///
    /// Months before the dataset start cannot be materialized after the fact.
    pub fn set_value(&mut self, name: &str, month: Month, value: f64) -> Result<()> {
        if !self.has_column(name) {
            return Err(ForecastError::UnknownColumn(name.to_string()));
        }
        self.extend_to(month)?;
        let index = self
            .index_of(month)
            .ok_or_else(|| ForecastError::InvalidInput(format!("month {month} not materialized")))?;
        if let Some(column) = self.columns.get_mut(name) {
            column[index] = value;
        }
        Ok(())
    }

    /// Materialize rows through `month`, padding every column with NaN.
    ///
    /// No-op when `month` is already inside the range.
    pub fn extend_to(&mut self, month: Month) -> Result<()> {
        let start = self
            .start
            .ok_or_else(|| ForecastError::InvalidInput("dataset has no start month".to_string()))?;
        let offset = month.months_since(start);
        if offset < 0 {
            return Err(ForecastError::InvalidInput(format!(
                "month {month} precedes dataset start {start}"
            )));
        }
        let needed = offset as usize + 1;
        if needed > self.len {
            for column in self.columns.values_mut() {
                column.resize(needed, MISSING);
            }
            self.len = needed;
        }
        Ok(())
    }

    /// Position of `month` inside the materialized range.
    pub fn index_of(&self, month: Month) -> Option<usize> {
        let start = self.start?;
        let offset = month.months_since(start);
        if offset >= 0 && (offset as usize) < self.len {
            Some(offset as usize)
        } else {
            None
        }
    }
}

//! Factor output: a dense date × security matrix.

use crate::error::Result;
use asof_data::table::value_series;
use asof_data::{DATE_COLUMN, LongTable, Value};
use chrono::NaiveDate;
use polars::prelude::*;

/// Dense `dates × ids` matrix of optional values.
///
/// Built fresh by every query and owned by the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactorMatrix {
    dates: Vec<NaiveDate>,
    ids: Vec<String>,
    // Row-major: values[row * ids.len() + col]
    values: Vec<Option<Value>>,
}

impl FactorMatrix {
    /// Build a matrix by evaluating `cell(date, id)` for every row and column.
    pub fn from_fn<F>(dates: Vec<NaiveDate>, ids: Vec<String>, mut cell: F) -> Self
    where
        F: FnMut(NaiveDate, &str) -> Option<Value>,
    {
        let mut values = Vec::with_capacity(dates.len() * ids.len());
        for date in &dates {
            for id in &ids {
                values.push(cell(*date, id));
            }
        }
        Self { dates, ids, values }
    }

    /// Row labels.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column labels.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// `(rows, columns)`.
    pub const fn shape(&self) -> (usize, usize) {
        (self.dates.len(), self.ids.len())
    }

    /// Whether the matrix has no cells.
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cell at a row and column position.
    pub fn value_at(&self, row: usize, col: usize) -> Option<&Value> {
        if col >= self.ids.len() {
            return None;
        }
        self.values.get(row * self.ids.len() + col)?.as_ref()
    }

    /// Cell for `date` and `id`, `None` when missing or out of range.
    pub fn get(&self, date: NaiveDate, id: &str) -> Option<&Value> {
        let row = self.dates.iter().position(|d| *d == date)?;
        let col = self.ids.iter().position(|i| i == id)?;
        self.value_at(row, col)
    }

    /// Numeric cell for `date` and `id`.
    pub fn get_f64(&self, date: NaiveDate, id: &str) -> Option<f64> {
        self.get(date, id).and_then(Value::as_f64)
    }

    /// All cells of one row.
    pub fn row(&self, row: usize) -> &[Option<Value>] {
        let width = self.ids.len();
        self.values
            .get(row * width..(row + 1) * width)
            .unwrap_or_default()
    }

    /// All cells of one security, top to bottom. `None` if the id is not a column.
    pub fn column(&self, id: &str) -> Option<Vec<Option<&Value>>> {
        let col = self.ids.iter().position(|i| i == id)?;
        Some(
            (0..self.dates.len())
                .map(|row| self.value_at(row, col))
                .collect(),
        )
    }

    /// Re-order columns to `ids`; ids that are not present become empty columns.
    ///
    /// Used to align output to a security universe.
    pub fn align_columns(&self, ids: &[String]) -> Self {
        let positions: Vec<Option<usize>> = ids
            .iter()
            .map(|id| self.ids.iter().position(|i| i == id))
            .collect();
        let mut values = Vec::with_capacity(self.dates.len() * ids.len());
        for row in 0..self.dates.len() {
            for pos in &positions {
                values.push(pos.and_then(|col| self.value_at(row, col).cloned()));
            }
        }
        Self {
            dates: self.dates.clone(),
            ids: ids.to_vec(),
            values,
        }
    }

    /// Replace every present cell with `f(cell)`; `None` results become missing.
    pub fn map_values<F>(mut self, mut f: F) -> Self
    where
        F: FnMut(&Value) -> Option<Value>,
    {
        for cell in &mut self.values {
            *cell = cell.as_ref().and_then(&mut f);
        }
        self
    }

    /// Convert to a polars `DataFrame`: a `DateTime` column plus one column per id.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<String> = self.dates.iter().map(ToString::to_string).collect();
        let mut columns: Vec<Column> = vec![Series::new(DATE_COLUMN.into(), dates).into()];
        for (idx, id) in self.ids.iter().enumerate() {
            let cells = (0..self.dates.len()).map(|row| self.value_at(row, idx));
            columns.push(value_series(id, cells).into());
        }

        let df = DataFrame::new(columns)
            .and_then(|df| {
                df.lazy()
                    .with_column(col(DATE_COLUMN).cast(DataType::Date))
                    .collect()
            })
            .map_err(asof_data::DataError::from)?;
        Ok(df)
    }
}

/// Result of a factor query.
#[derive(Debug, Clone, PartialEq)]
pub enum FactorOutput {
    /// Wide `dates × ids` matrix
    Matrix(FactorMatrix),
    /// Long `(DateTime, ID, field...)` table, used for multi-field reads
    Long(LongTable),
}

impl FactorOutput {
    /// The matrix, if this output is wide.
    pub fn into_matrix(self) -> Option<FactorMatrix> {
        match self {
            Self::Matrix(m) => Some(m),
            Self::Long(_) => None,
        }
    }

    /// The long table, if this output is long.
    pub fn into_long(self) -> Option<LongTable> {
        match self {
            Self::Long(t) => Some(t),
            Self::Matrix(_) => None,
        }
    }

    /// Convert either shape to a polars `DataFrame`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        match self {
            Self::Matrix(m) => m.to_dataframe(),
            Self::Long(t) => Ok(t.to_dataframe()?),
        }
    }
}

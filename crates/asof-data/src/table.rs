//! Long-form tables returned by store reads.

use crate::{DATE_COLUMN, ID_COLUMN, REPORT_PERIOD_COLUMN, error::Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single non-missing cell read from the store.
///
/// Missing cells are represented by `Option::None` wherever a `Value` appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer cell
    Int(i64),
    /// Floating point cell
    Float(f64),
    /// Text cell (industry codes, names)
    Text(String),
}

impl Value {
    /// Numeric view of the cell, if it is numeric.
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Text view of the cell, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the cell holds a number.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Filter applied by a store read. Absent fields mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadFilter {
    /// Inclusive lower bound on the record date
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound on the record date
    pub end: Option<NaiveDate>,
    /// Exact record dates to keep
    pub dates: Option<Vec<NaiveDate>>,
    /// Security ids to keep
    pub ids: Option<Vec<String>>,
}

impl ReadFilter {
    /// A filter that keeps everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to records dated on or after `start`.
    pub const fn start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// Restrict to records dated on or before `end`.
    pub const fn end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    /// Restrict to records dated exactly on one of `dates`.
    pub fn dates(mut self, dates: Vec<NaiveDate>) -> Self {
        self.dates = Some(dates);
        self
    }

    /// Restrict to records of the given securities.
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }
}

/// One row of a long-form table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Record date (`DateTime` column)
    pub date: NaiveDate,
    /// Security id (`ID` column)
    pub id: String,
    /// Fiscal period, present only for financial-statement tables
    pub report_period: Option<NaiveDate>,
    /// One cell per requested field, in field order
    pub values: Vec<Option<Value>>,
}

/// Long-form read result: `(DateTime, ID, [ReportPeriod,] field...)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LongTable {
    fields: Vec<String>,
    records: Vec<Record>,
}

impl LongTable {
    /// Create a table from its field names and rows.
    pub const fn new(fields: Vec<String>, records: Vec<Record>) -> Self {
        Self { fields, records }
    }

    /// Field names, in the order cells appear in each record.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// All rows.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consume the table and return its rows.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of `field` among the value cells.
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Whether the rows carry a reporting period.
    pub fn has_report_period(&self) -> bool {
        self.records.iter().any(|r| r.report_period.is_some())
    }

    /// Convert to a polars `DataFrame` with `Date` typed key columns.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<String> = self.records.iter().map(|r| r.date.to_string()).collect();
        let ids: Vec<String> = self.records.iter().map(|r| r.id.clone()).collect();

        let mut columns: Vec<Column> = vec![
            Series::new(DATE_COLUMN.into(), dates).into(),
            Series::new(ID_COLUMN.into(), ids).into(),
        ];
        let mut date_columns = vec![DATE_COLUMN];

        if self.has_report_period() {
            let periods: Vec<Option<String>> = self
                .records
                .iter()
                .map(|r| r.report_period.map(|p| p.to_string()))
                .collect();
            columns.push(Series::new(REPORT_PERIOD_COLUMN.into(), periods).into());
            date_columns.push(REPORT_PERIOD_COLUMN);
        }

        for (idx, field) in self.fields.iter().enumerate() {
            let cells = self.records.iter().map(|r| r.values.get(idx).and_then(Option::as_ref));
            columns.push(value_series(field, cells).into());
        }

        let df = DataFrame::new(columns)?
            .lazy()
            .with_columns(
                date_columns
                    .into_iter()
                    .map(|c| col(c).cast(DataType::Date))
                    .collect::<Vec<_>>(),
            )
            .collect()?;

        Ok(df)
    }
}

/// Build a polars series from optional cells.
///
/// The column is `Float64` when every present cell is numeric and `String` otherwise.
pub fn value_series<'a>(name: &str, cells: impl Iterator<Item = Option<&'a Value>>) -> Series {
    let cells: Vec<Option<&Value>> = cells.collect();
    if cells.iter().flatten().all(|v| v.is_numeric()) {
        let values: Vec<Option<f64>> = cells.iter().map(|c| c.and_then(Value::as_f64)).collect();
        Series::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells.iter().map(|c| c.map(ToString::to_string)).collect();
        Series::new(name.into(), values)
    }
}

/// Parse a stored date. Accepts `YYYY-MM-DD` optionally followed by a time part.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| crate::DataError::Parse(format!("Invalid date {raw:?}: {e}")))
}

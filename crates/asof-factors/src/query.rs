//! Query filter shared by all factor types.

use crate::error::{FactorError, Result};
use asof_data::ReadFilter;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Which rows and columns a factor query should return.
///
/// `dates` selects exact output rows in the given order. `start`/`end`
/// bound the range when no explicit dates are given. `ids` selects columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    /// Exact output dates
    pub dates: Option<Vec<NaiveDate>>,
    /// Inclusive lower bound
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound
    pub end: Option<NaiveDate>,
    /// Securities to return
    pub ids: Option<Vec<String>>,
}

impl QueryFilter {
    /// A filter with no restrictions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Query exactly these dates.
    pub fn dates(mut self, dates: Vec<NaiveDate>) -> Self {
        self.dates = Some(dates);
        self
    }

    /// Drop rows before `start`.
    pub const fn start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// Drop rows after `end`.
    pub const fn end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    /// Restrict to these securities.
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Reject `start > end`.
    pub fn validate(&self) -> Result<()> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(FactorError::Range { start, end }),
            _ => Ok(()),
        }
    }

    /// Requested ids in order, keeping only the first occurrence of each.
    pub fn requested_ids(&self) -> Option<Vec<String>> {
        let ids = self.ids.as_ref()?;
        let mut seen = HashSet::with_capacity(ids.len());
        Some(
            ids.iter()
                .filter(|id| seen.insert(id.as_str()))
                .cloned()
                .collect(),
        )
    }

    /// Earliest and latest explicit date, if any dates were given.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.dates.as_ref()?;
        let min = dates.iter().min()?;
        let max = dates.iter().max()?;
        Some((*min, *max))
    }

    /// The equivalent store filter, passed through unchanged.
    pub fn to_read_filter(&self) -> ReadFilter {
        ReadFilter {
            start: self.start,
            end: self.end,
            dates: self.dates.clone(),
            ids: self.ids.clone(),
        }
    }
}

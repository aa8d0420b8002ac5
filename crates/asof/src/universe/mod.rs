//! Security universes.
//!
//! A universe answers which securities are listed as of a date. Factor
//! output can be aligned to it with
//! [`FactorMatrix::align_columns`](asof_factors::FactorMatrix::align_columns).

pub mod stocks;

pub use stocks::{LISTING_STATUS_COLUMN, LISTING_TABLE, StockTickers};

use crate::error::Result;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Trait for security universes.
pub trait Universe: Send + Sync + std::fmt::Debug {
    /// Securities listed on `as_of`.
    fn listed_securities(&self, as_of: NaiveDate) -> Result<BTreeSet<String>>;

    /// Check if a security is listed on `as_of`.
    fn contains(&self, id: &str, as_of: NaiveDate) -> Result<bool> {
        Ok(self.listed_securities(as_of)?.contains(id))
    }

    /// Get the number of listed securities on `as_of`.
    fn size(&self, as_of: NaiveDate) -> Result<usize> {
        Ok(self.listed_securities(as_of)?.len())
    }
}

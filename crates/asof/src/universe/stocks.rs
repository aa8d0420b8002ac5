//! Stock universe backed by listing events.

use super::Universe;
use crate::error::Result;
use asof_data::StorePort;
use asof_factors::{CompactFactor, TradingCalendar};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Table holding listing and delisting events.
pub const LISTING_TABLE: &str = "stock_listing";

/// Listing status column: 1 listed from the event date, 0 delisted.
pub const LISTING_STATUS_COLUMN: &str = "list_status";

/// Stocks and their listing history.
#[derive(Debug, Clone)]
pub struct StockTickers {
    listing: CompactFactor,
}

impl StockTickers {
    /// Load listing events from the store.
    pub fn new(store: &dyn StorePort, calendar: TradingCalendar) -> Result<Self> {
        let listing =
            CompactFactor::with_field(store, calendar, LISTING_TABLE, LISTING_STATUS_COLUMN)?;
        Ok(Self { listing })
    }

    /// Every stock that has ever had a listing event, sorted.
    pub fn all_tickers(&self) -> Vec<String> {
        self.listing.ids()
    }

    /// Stocks listed on `date`, sorted.
    pub fn ticker(&self, date: NaiveDate) -> Vec<String> {
        self.all_tickers()
            .into_iter()
            .filter(|id| self.is_listed(id, date))
            .collect()
    }

    /// Date of each stock's first listing event.
    pub fn list_dates(&self) -> BTreeMap<String, NaiveDate> {
        self.all_tickers()
            .into_iter()
            .filter_map(|id| {
                let first = self.listing.events(&id).first()?.0;
                Some((id, first))
            })
            .collect()
    }

    fn is_listed(&self, id: &str, date: NaiveDate) -> bool {
        self.listing
            .value_as_of(id, date)
            .and_then(|status| status.as_f64())
            .is_some_and(|status| status == 1.0)
    }
}

impl Universe for StockTickers {
    fn listed_securities(&self, as_of: NaiveDate) -> Result<BTreeSet<String>> {
        Ok(self.ticker(as_of).into_iter().collect())
    }
}

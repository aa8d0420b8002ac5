//! Daily (continuous) factors.

use super::{Factor, FactorIdentity};
use crate::calendar::TradingCalendar;
use crate::error::Result;
use crate::matrix::{FactorMatrix, FactorOutput};
use crate::query::QueryFilter;
use asof_data::{LongTable, StorePort, Value};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Factor backed by one record per trading day and security.
///
/// Records are passed through as stored. Missing records stay missing.
#[derive(Debug, Clone)]
pub struct ContinuousFactor {
    identity: FactorIdentity,
    store: Arc<dyn StorePort>,
    calendar: TradingCalendar,
}

impl ContinuousFactor {
    /// Daily factor reading `fields` from `table`.
    pub fn new<I, S>(
        store: Arc<dyn StorePort>,
        calendar: TradingCalendar,
        table: &str,
        fields: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identity = FactorIdentity::new(store.as_ref(), table, fields)?;
        identity.require_kind(false)?;
        Ok(Self {
            identity,
            store,
            calendar,
        })
    }

    /// Calendar this factor was built with.
    pub const fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// Read records for `filter`.
    ///
    /// With a single field and `unstack`, the records are pivoted into a
    /// matrix whose rows and columns are the sorted distinct dates and ids.
    /// Otherwise the long table is returned unchanged.
    pub fn query(&self, filter: &QueryFilter, unstack: bool) -> Result<FactorOutput> {
        filter.validate()?;
        let table = self.store.read_table(
            self.identity.table(),
            self.identity.fields(),
            &filter.to_read_filter(),
        )?;
        if unstack && self.identity.fields().len() == 1 {
            Ok(FactorOutput::Matrix(pivot(table)))
        } else {
            Ok(FactorOutput::Long(table))
        }
    }
}

fn pivot(table: LongTable) -> FactorMatrix {
    let records = table.into_records();
    let dates: BTreeSet<NaiveDate> = records.iter().map(|r| r.date).collect();
    let ids: BTreeSet<String> = records.iter().map(|r| r.id.clone()).collect();

    let mut cells: HashMap<(NaiveDate, String), Value> = HashMap::with_capacity(records.len());
    for record in records {
        if let Some(value) = record.values.into_iter().next().flatten() {
            cells.insert((record.date, record.id), value);
        }
    }

    FactorMatrix::from_fn(dates.into_iter().collect(), ids.into_iter().collect(), |date, id| {
        cells.remove(&(date, id.to_string()))
    })
}

impl Factor for ContinuousFactor {
    fn identity(&self) -> &FactorIdentity {
        &self.identity
    }

    fn get_data(&self, filter: &QueryFilter) -> Result<FactorOutput> {
        self.query(filter, true)
    }
}

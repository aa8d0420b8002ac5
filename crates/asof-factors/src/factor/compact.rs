//! Event (compact) factors.
//!
//! Event tables store a record only when a value changes. The value on a
//! trading day is the most recent event effective on or before that day.

use super::{Factor, FactorIdentity};
use crate::calendar::TradingCalendar;
use crate::error::Result;
use crate::matrix::{FactorMatrix, FactorOutput};
use crate::query::QueryFilter;
use asof_data::{ReadFilter, StorePort, Value};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Per-security events sorted by effective date.
type Snapshot = BTreeMap<String, Vec<(NaiveDate, Value)>>;

/// Forward-filled event factor.
///
/// All events are read once at construction into an immutable snapshot that
/// clones share. Build a new instance to pick up new events.
#[derive(Debug, Clone)]
pub struct CompactFactor {
    identity: FactorIdentity,
    calendar: TradingCalendar,
    events: Arc<Snapshot>,
}

impl CompactFactor {
    /// Event factor whose value column is named like its table.
    pub fn new(store: &dyn StorePort, calendar: TradingCalendar, table: &str) -> Result<Self> {
        Self::with_field(store, calendar, table, &table.to_lowercase())
    }

    /// Event factor reading `field` from `table`.
    pub fn with_field(
        store: &dyn StorePort,
        calendar: TradingCalendar,
        table: &str,
        field: &str,
    ) -> Result<Self> {
        let identity = FactorIdentity::new(store, table, [field])?;
        identity.require_kind(false)?;

        let records = store
            .read_table(identity.table(), identity.fields(), &ReadFilter::new())?
            .into_records();
        let total = records.len();

        let mut events = Snapshot::new();
        for record in records {
            if let Some(value) = record.values.into_iter().next().flatten() {
                events.entry(record.id).or_default().push((record.date, value));
            }
        }
        for series in events.values_mut() {
            series.sort_by_key(|(date, _)| *date);
        }
        debug!(
            factor = %identity,
            records = total,
            securities = events.len(),
            "loaded event snapshot"
        );

        Ok(Self {
            identity,
            calendar,
            events: Arc::new(events),
        })
    }

    /// Securities with at least one event, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.events.keys().cloned().collect()
    }

    /// Events of `id` in effective-date order.
    pub fn events(&self, id: &str) -> &[(NaiveDate, Value)] {
        self.events.get(id).map_or(&[], Vec::as_slice)
    }

    /// Value of `id` as of `date`: the last event effective on or before it.
    pub fn value_as_of(&self, id: &str, date: NaiveDate) -> Option<&Value> {
        let series = self.events.get(id)?;
        let idx = series.partition_point(|(effective, _)| *effective <= date);
        idx.checked_sub(1).map(|i| &series[i].1)
    }

    /// Forward-filled matrix for `filter`.
    pub fn matrix(&self, filter: &QueryFilter) -> Result<FactorMatrix> {
        filter.validate()?;
        let ids = filter.requested_ids().unwrap_or_else(|| self.ids());
        let rows = self.rows(filter)?;
        Ok(FactorMatrix::from_fn(rows, ids, |date, id| {
            self.value_as_of(id, date).cloned()
        }))
    }

    fn rows(&self, filter: &QueryFilter) -> Result<Vec<NaiveDate>> {
        if let Some(dates) = &filter.dates {
            return Ok(dates
                .iter()
                .copied()
                .filter(|d| filter.start.is_none_or(|start| *d >= start))
                .collect());
        }
        let end = filter.end.unwrap_or_else(|| Utc::now().date_naive());
        if filter.start.is_some_and(|start| start > end) {
            return Ok(Vec::new());
        }
        self.calendar.select_dates(filter.start, Some(end))
    }
}

impl Factor for CompactFactor {
    fn identity(&self) -> &FactorIdentity {
        &self.identity
    }

    fn get_data(&self, filter: &QueryFilter) -> Result<FactorOutput> {
        self.matrix(filter).map(FactorOutput::Matrix)
    }
}

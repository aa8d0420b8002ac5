//! Financial-statement factors.
//!
//! Statement records carry a disclosure date (`DateTime`) and the fiscal
//! period they describe (`ReportPeriod`). A period may be restated several
//! times. On any day only records disclosed on or before that day are
//! visible, which rules out look-ahead.

use super::{Factor, FactorIdentity};
use crate::calendar::TradingCalendar;
use crate::error::{FactorError, Result};
use crate::matrix::{FactorMatrix, FactorOutput};
use crate::query::QueryFilter;
use asof_data::{REPORT_PERIOD_COLUMN, ReadFilter, StorePort, Value};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Days of statements read before the first output day.
pub const LOOKBACK_BUFFER_DAYS: i64 = 730;

/// How statement records are aggregated into a daily value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialVariant {
    /// Latest known annual (December) figure
    #[default]
    Yearly,
    /// Trailing twelve months
    TrailingTwelveMonths,
    /// Latest known figure of any period
    Latest,
}

impl fmt::Display for FinancialVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Yearly => "yearly",
            Self::TrailingTwelveMonths => "trailing twelve months",
            Self::Latest => "latest",
        };
        f.write_str(name)
    }
}

/// One visible statement figure.
#[derive(Debug, Clone)]
struct Disclosure {
    disclosed: NaiveDate,
    period: NaiveDate,
    value: Value,
}

/// Disclosures of one security sorted by disclosure date, with the best
/// figure known after each of them.
#[derive(Debug, Default)]
struct DisclosureHistory {
    disclosed: Vec<NaiveDate>,
    best: Vec<Disclosure>,
}

impl DisclosureHistory {
    fn build(mut items: Vec<Disclosure>) -> Self {
        items.sort_by_key(|d| d.disclosed);
        let mut history = Self::default();
        for item in items {
            let keep_previous = history
                .best
                .last()
                .is_some_and(|b| (b.period, b.disclosed) > (item.period, item.disclosed));
            history.disclosed.push(item.disclosed);
            let best = match history.best.last() {
                Some(previous) if keep_previous => previous.clone(),
                _ => item,
            };
            history.best.push(best);
        }
        history
    }

    /// Greatest `(period, disclosure)` figure among those disclosed on or before `date`.
    fn as_of(&self, date: NaiveDate) -> Option<&Value> {
        let n = self.disclosed.partition_point(|d| *d <= date);
        n.checked_sub(1).map(|i| &self.best[i].value)
    }
}

/// A financial-statement line item evaluated as of each trading day.
#[derive(Debug, Clone)]
pub struct FinancialFactor {
    identity: FactorIdentity,
    store: Arc<dyn StorePort>,
    calendar: TradingCalendar,
    variant: FinancialVariant,
}

impl FinancialFactor {
    /// Line item `field` of the statement table `table`.
    ///
    /// The table must be a financial-statement table keyed by `ReportPeriod`.
    pub fn new(
        store: Arc<dyn StorePort>,
        calendar: TradingCalendar,
        table: &str,
        field: &str,
        variant: FinancialVariant,
    ) -> Result<Self> {
        let identity = FactorIdentity::new(store.as_ref(), table, [field])?;
        identity.require_kind(true)?;
        if !store
            .column_names(identity.table())?
            .iter()
            .any(|c| c == REPORT_PERIOD_COLUMN)
        {
            return Err(FactorError::Schema(format!(
                "table {} has no {REPORT_PERIOD_COLUMN} column",
                identity.table()
            )));
        }
        Ok(Self {
            identity,
            store,
            calendar,
            variant,
        })
    }

    /// Aggregation variant.
    pub const fn variant(&self) -> FinancialVariant {
        self.variant
    }

    /// Evaluate the factor for `filter`.
    pub fn matrix(&self, filter: &QueryFilter) -> Result<FactorMatrix> {
        match self.variant {
            FinancialVariant::Yearly => self.yearly(filter),
            other => Err(FactorError::Unsupported(format!(
                "{other} variant of financial factor {}",
                self.identity
            ))),
        }
    }

    fn yearly(&self, filter: &QueryFilter) -> Result<FactorMatrix> {
        filter.validate()?;
        let Some((span_start, span_end)) = self.span(filter)? else {
            return Ok(FactorMatrix::from_fn(
                Vec::new(),
                filter.requested_ids().unwrap_or_default(),
                |_, _| None,
            ));
        };
        let buffer_start = span_start
            .checked_sub_signed(Duration::days(LOOKBACK_BUFFER_DAYS))
            .unwrap_or(NaiveDate::MIN);

        let mut read = ReadFilter::new().start(buffer_start).end(span_end);
        let requested = filter.requested_ids();
        read.ids = requested.clone();
        let records = self
            .store
            .read_table(self.identity.table(), self.identity.fields(), &read)?
            .into_records();

        let mut seen = BTreeSet::new();
        let mut grouped: BTreeMap<String, Vec<Disclosure>> = BTreeMap::new();
        for record in records {
            seen.insert(record.id.clone());
            let (Some(period), Some(value)) =
                (record.report_period, record.values.into_iter().next().flatten())
            else {
                continue;
            };
            if period.month() != 12 {
                continue;
            }
            grouped.entry(record.id).or_default().push(Disclosure {
                disclosed: record.date,
                period,
                value,
            });
        }
        let histories: BTreeMap<String, DisclosureHistory> = grouped
            .into_iter()
            .map(|(id, items)| (id, DisclosureHistory::build(items)))
            .collect();
        debug!(
            factor = %self.identity,
            %buffer_start,
            %span_end,
            securities = histories.len(),
            "resolved annual statements"
        );

        let rows = match &filter.dates {
            Some(dates) => dates.clone(),
            None => self.calendar.select_dates(Some(span_start), Some(span_end))?,
        };
        let ids = requested.unwrap_or_else(|| seen.into_iter().collect());
        Ok(FactorMatrix::from_fn(rows, ids, |date, id| {
            histories.get(id)?.as_of(date).cloned()
        }))
    }

    /// Output span, or `None` when an explicit date list is empty.
    fn span(&self, filter: &QueryFilter) -> Result<Option<(NaiveDate, NaiveDate)>> {
        if filter.dates.is_some() {
            return Ok(filter.date_span());
        }
        let start = filter.start.unwrap_or_else(|| self.calendar.first());
        let end = filter.end.unwrap_or_else(|| Utc::now().date_naive());
        if start > end {
            return Err(FactorError::Range { start, end });
        }
        Ok(Some((start, end)))
    }
}

impl Factor for FinancialFactor {
    fn identity(&self) -> &FactorIdentity {
        &self.identity
    }

    fn get_data(&self, filter: &QueryFilter) -> Result<FactorOutput> {
        self.matrix(filter).map(FactorOutput::Matrix)
    }
}

//! Trading calendar.
//!
//! The calendar is the single source of truth for which dates are trading
//! days. Every factor resolves its output rows through it. It is immutable
//! after construction and cheap to clone, since clones share one sequence.

use crate::error::{FactorError, Result};
use asof_data::store::sqlite::CALENDAR_TABLE;
use asof_data::{ReadFilter, StorePort};
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tracing::debug;

/// Column flagging whether the exchange was open on a calendar row.
pub const IS_OPEN_COLUMN: &str = "is_open";

/// Ordered, duplicate-free sequence of trading days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingCalendar {
    days: Arc<[NaiveDate]>,
}

impl TradingCalendar {
    /// Load the calendar from the store's `trading_calendar` table.
    ///
    /// Rows whose `is_open` flag is zero or missing are skipped.
    pub fn load(store: &dyn StorePort) -> Result<Self> {
        if !store.table_exists(CALENDAR_TABLE)? {
            return Err(FactorError::Schema(format!(
                "table {CALENDAR_TABLE} does not exist"
            )));
        }
        let table = store.read_table(
            CALENDAR_TABLE,
            &[IS_OPEN_COLUMN.to_string()],
            &ReadFilter::new(),
        )?;
        let days = table
            .into_records()
            .into_iter()
            .filter(|r| {
                r.values
                    .first()
                    .and_then(Option::as_ref)
                    .and_then(|v| v.as_f64())
                    .is_some_and(|open| open != 0.0)
            })
            .map(|r| r.date);

        let calendar = Self::from_days(days)?;
        debug!(
            days = calendar.len(),
            first = %calendar.first(),
            last = %calendar.last(),
            "loaded trading calendar"
        );
        Ok(calendar)
    }

    /// Build a calendar from explicit days. Input order and duplicates do not matter.
    pub fn from_days<I: IntoIterator<Item = NaiveDate>>(days: I) -> Result<Self> {
        let mut days: Vec<NaiveDate> = days.into_iter().collect();
        days.sort_unstable();
        days.dedup();
        if days.is_empty() {
            return Err(FactorError::EmptyCalendar);
        }
        Ok(Self { days: days.into() })
    }

    /// All trading days in order.
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    /// Number of trading days.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Always false; an empty calendar cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First trading day.
    pub fn first(&self) -> NaiveDate {
        self.days[0]
    }

    /// Last trading day.
    pub fn last(&self) -> NaiveDate {
        self.days[self.days.len() - 1]
    }

    /// Whether `date` is a trading day.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.days.binary_search(&date).is_ok()
    }

    /// Number of trading days on or before `date`.
    fn upper(&self, date: NaiveDate) -> usize {
        self.days.partition_point(|d| *d <= date)
    }

    /// Number of trading days strictly before `date`.
    fn lower(&self, date: NaiveDate) -> usize {
        self.days.partition_point(|d| *d < date)
    }

    /// Signed number of trading days in `(start, end]`.
    ///
    /// `days_count(a, b) == -days_count(b, a)` and `days_count(d, d) == 0`.
    pub fn days_count(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        self.upper(end) as i64 - self.upper(start) as i64
    }

    /// Trading days in `[start, end]`. Missing bounds default to the calendar's own.
    pub fn select_dates(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<NaiveDate>> {
        let (lo, hi) = self.bounds(start, end)?;
        Ok(self.days[lo..hi].to_vec())
    }

    fn bounds(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(usize, usize)> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(FactorError::Range { start, end });
        }
        let lo = start.map_or(0, |s| self.lower(s));
        let hi = end.map_or(self.days.len(), |e| self.upper(e));
        Ok((lo, hi.max(lo)))
    }

    /// The trading day `n` trading days away from `date`.
    ///
    /// The result `r` satisfies `days_count(date, r) == n`, so `offset(d, 0)`
    /// is the last trading day on or before `d`. `None` when it falls outside
    /// the calendar.
    pub fn offset(&self, date: NaiveDate, n: i64) -> Option<NaiveDate> {
        let pos = i64::try_from(self.upper(date))
            .ok()?
            .checked_add(n)?
            .checked_sub(1)?;
        usize::try_from(pos).ok().and_then(|i| self.days.get(i).copied())
    }

    /// Last trading day on or before `date`.
    pub fn last_on_or_before(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.offset(date, 0)
    }

    /// First trading day of every month that falls in `[start, end]`.
    ///
    /// Month boundaries come from the full calendar, so the calendar's very
    /// first day is never reported: its month may have started earlier.
    pub fn first_day_of_month(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
        self.boundaries(start, end, |i| {
            i > 0 && month_key(self.days[i - 1]) != month_key(self.days[i])
        })
    }

    /// Last trading day of every month that falls in `[start, end]`.
    ///
    /// The calendar's final day is never reported: its month may not be over.
    pub fn last_day_of_month(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
        self.boundaries(start, end, |i| {
            i + 1 < self.days.len() && month_key(self.days[i]) != month_key(self.days[i + 1])
        })
    }

    /// Last trading day of every year that falls in `[start, end]`.
    pub fn last_day_of_year(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
        self.boundaries(start, end, |i| {
            i + 1 < self.days.len() && self.days[i].year() != self.days[i + 1].year()
        })
    }

    fn boundaries(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        is_boundary: impl Fn(usize) -> bool,
    ) -> Result<Vec<NaiveDate>> {
        let (lo, hi) = self.bounds(Some(start), Some(end))?;
        Ok((lo..hi)
            .filter(|&i| is_boundary(i))
            .map(|i| self.days[i])
            .collect())
    }
}

fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{day, weekday_calendar};
    use asof_data::SqliteStore;
    use rstest::rstest;

    #[test]
    fn test_days_count_scenario() {
        let calendar = TradingCalendar::from_days([day(2019, 1, 4), day(2019, 1, 7)]).unwrap();
        let start = day(2019, 1, 4);
        let end = day(2019, 1, 7);
        assert_eq!(calendar.days_count(start, end), 1);
        assert_eq!(calendar.days_count(end, start), -1);
        assert_eq!(calendar.days_count(start, start), 0);
    }

    #[rstest]
    #[case(day(2019, 1, 1), day(2019, 12, 31))]
    #[case(day(2019, 3, 2), day(2019, 3, 3))]
    #[case(day(2018, 6, 1), day(2019, 2, 14))]
    #[case(day(2019, 5, 5), day(2019, 5, 5))]
    fn test_days_count_antisymmetric(#[case] a: NaiveDate, #[case] b: NaiveDate) {
        let calendar = weekday_calendar(day(2018, 1, 1), day(2020, 12, 31));
        assert_eq!(calendar.days_count(a, b), -calendar.days_count(b, a));
        assert_eq!(calendar.days_count(a, a), 0);
    }

    #[test]
    fn test_days_count_skips_weekends() {
        let calendar = weekday_calendar(day(2019, 1, 1), day(2019, 1, 31));
        // Fri 2019-01-04 -> Mon 2019-01-07 is one trading day.
        assert_eq!(calendar.days_count(day(2019, 1, 4), day(2019, 1, 7)), 1);
        // Saturday to Sunday crosses no trading day.
        assert_eq!(calendar.days_count(day(2019, 1, 5), day(2019, 1, 6)), 0);
    }

    #[test]
    fn test_from_days_sorts_and_dedups() {
        let calendar = TradingCalendar::from_days([
            day(2019, 1, 7),
            day(2019, 1, 4),
            day(2019, 1, 7),
        ])
        .unwrap();
        assert_eq!(calendar.days(), &[day(2019, 1, 4), day(2019, 1, 7)]);
        assert!(matches!(
            TradingCalendar::from_days(Vec::new()),
            Err(FactorError::EmptyCalendar)
        ));
    }

    #[test]
    fn test_select_dates() {
        let calendar = weekday_calendar(day(2019, 8, 1), day(2019, 9, 30));
        let start = day(2019, 9, 2);
        let end = day(2019, 9, 3);
        assert_eq!(calendar.select_dates(Some(start), Some(end)).unwrap(), vec![start, end]);

        let dates = calendar
            .select_dates(Some(day(2019, 8, 3)), Some(day(2019, 9, 15)))
            .unwrap();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert!(dates.iter().all(|d| calendar.is_trading_day(*d)));
        assert!(dates[0] >= day(2019, 8, 3));
        assert!(*dates.last().unwrap() <= day(2019, 9, 15));

        // Open bounds fall back to the calendar's own.
        assert_eq!(calendar.select_dates(None, None).unwrap().len(), calendar.len());
        assert_eq!(calendar.select_dates(None, Some(day(2019, 8, 2))).unwrap().len(), 2);
    }

    #[test]
    fn test_select_dates_rejects_inverted_range() {
        let calendar = weekday_calendar(day(2019, 1, 1), day(2019, 1, 31));
        let result = calendar.select_dates(Some(day(2019, 1, 10)), Some(day(2019, 1, 9)));
        assert!(matches!(result, Err(FactorError::Range { .. })));
    }

    #[test]
    fn test_select_dates_outside_calendar_is_empty() {
        let calendar = weekday_calendar(day(2019, 1, 1), day(2019, 1, 31));
        assert!(calendar
            .select_dates(Some(day(2020, 1, 1)), Some(day(2020, 2, 1)))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_first_day_of_month() {
        let calendar = weekday_calendar(day(2019, 1, 1), day(2019, 12, 31));
        let days = calendar
            .first_day_of_month(day(2019, 3, 2), day(2019, 4, 2))
            .unwrap();
        assert_eq!(days, vec![day(2019, 4, 1)]);
    }

    #[test]
    fn test_last_day_of_month() {
        let calendar = weekday_calendar(day(2019, 1, 1), day(2019, 12, 31));
        let days = calendar
            .last_day_of_month(day(2019, 3, 2), day(2019, 4, 2))
            .unwrap();
        assert_eq!(days[0], day(2019, 3, 29));
        assert_eq!(days.len(), 1);
    }

    #[test]
    fn test_last_day_of_year() {
        let mut days: Vec<NaiveDate> = weekday_calendar(day(2018, 1, 1), day(2019, 12, 31))
            .days()
            .to_vec();
        // 2018-12-31 was an exchange holiday.
        days.retain(|d| *d != day(2018, 12, 31));
        let calendar = TradingCalendar::from_days(days).unwrap();

        let result = calendar
            .last_day_of_year(day(2018, 3, 2), day(2019, 4, 2))
            .unwrap();
        assert_eq!(result, vec![day(2018, 12, 28)]);
    }

    #[test]
    fn test_calendar_edges_are_not_boundaries() {
        let calendar = weekday_calendar(day(2019, 3, 4), day(2019, 3, 29));
        assert!(calendar
            .first_day_of_month(day(2019, 3, 1), day(2019, 3, 31))
            .unwrap()
            .is_empty());
        assert!(calendar
            .last_day_of_month(day(2019, 3, 1), day(2019, 3, 31))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_offset() {
        let calendar = weekday_calendar(day(2019, 1, 1), day(2019, 1, 31));
        assert_eq!(calendar.offset(day(2019, 1, 4), 1), Some(day(2019, 1, 7)));
        assert_eq!(calendar.offset(day(2019, 1, 7), -1), Some(day(2019, 1, 4)));
        assert_eq!(calendar.offset(day(2019, 1, 5), 0), Some(day(2019, 1, 4)));
        assert_eq!(calendar.offset(day(2019, 1, 5), 1), Some(day(2019, 1, 7)));
        assert_eq!(calendar.last_on_or_before(day(2019, 1, 6)), Some(day(2019, 1, 4)));
        assert_eq!(calendar.offset(day(2019, 1, 1), -1), None);
        assert_eq!(calendar.offset(day(2019, 1, 31), 1), None);
        assert_eq!(calendar.offset(day(2019, 1, 31), i64::MAX), None);
        assert_eq!(calendar.offset(day(2019, 1, 1), i64::MIN), None);

        let d = day(2019, 1, 9);
        for n in -5..5 {
            let r = calendar.offset(d, n).unwrap();
            assert_eq!(calendar.days_count(d, r), n);
        }
    }

    #[test]
    fn test_load_from_store() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .execute_batch(
                "CREATE TABLE trading_calendar (DateTime TEXT PRIMARY KEY, is_open INTEGER);
                 INSERT INTO trading_calendar VALUES ('2019-01-07', 1);
                 INSERT INTO trading_calendar VALUES ('2019-01-04', 1);
                 INSERT INTO trading_calendar VALUES ('2019-01-05', 0);",
            )
            .unwrap();
        let calendar = TradingCalendar::load(&store).unwrap();
        assert_eq!(calendar.days(), &[day(2019, 1, 4), day(2019, 1, 7)]);
    }

    #[test]
    fn test_load_requires_calendar_table() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(matches!(
            TradingCalendar::load(&store),
            Err(FactorError::Schema(_))
        ));

        store
            .execute_batch("CREATE TABLE trading_calendar (DateTime TEXT PRIMARY KEY, is_open INTEGER);")
            .unwrap();
        assert!(matches!(
            TradingCalendar::load(&store),
            Err(FactorError::EmptyCalendar)
        ));
    }
}

//! Shared fixtures for unit tests.

use crate::calendar::TradingCalendar;
use asof_data::SqliteStore;
use chrono::{Datelike, NaiveDate, Weekday};
use std::sync::Arc;

pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

pub(crate) fn weekday_calendar(start: NaiveDate, end: NaiveDate) -> TradingCalendar {
    TradingCalendar::from_days(weekdays(start, end)).unwrap()
}

/// Store with a 2016-2020 weekday calendar and one table per factor shape.
pub(crate) fn fixture_store() -> Arc<SqliteStore> {
    let store = SqliteStore::in_memory().unwrap();
    store
        .put_trading_days(&weekdays(day(2016, 1, 1), day(2020, 12, 31)))
        .unwrap();
    store
        .execute_batch(
            r#"
            CREATE TABLE adj_factor (
                DateTime TEXT NOT NULL,
                ID TEXT NOT NULL,
                adj_factor REAL,
                PRIMARY KEY (DateTime, ID)
            );
            INSERT INTO adj_factor VALUES ('2019-01-05', 'A', 10.0);
            INSERT INTO adj_factor VALUES ('2019-01-02', 'B', 1.0);
            INSERT INTO adj_factor VALUES ('2019-01-09', 'B', 1.5);
            INSERT INTO adj_factor VALUES ('2019-01-10', 'B', NULL);

            CREATE TABLE stock_daily (
                DateTime TEXT NOT NULL,
                ID TEXT NOT NULL,
                close REAL,
                volume REAL,
                PRIMARY KEY (DateTime, ID)
            );
            INSERT INTO stock_daily VALUES ('2019-01-04', 'A', 10.0, 1000);
            INSERT INTO stock_daily VALUES ('2019-01-04', 'B', 20.0, 2000);
            INSERT INTO stock_daily VALUES ('2019-01-07', 'A', 10.5, 1100);
            INSERT INTO stock_daily VALUES ('2019-01-08', 'B', 21.0, 2100);

            CREATE TABLE income_statement (
                DateTime TEXT NOT NULL,
                ID TEXT NOT NULL,
                ReportPeriod TEXT NOT NULL,
                net_income REAL,
                PRIMARY KEY (DateTime, ID, ReportPeriod)
            );
            INSERT INTO income_statement VALUES ('2019-04-30', 'A', '2018-12-31', 100.0);
            INSERT INTO income_statement VALUES ('2019-08-15', 'A', '2018-12-31', 105.0);
            INSERT INTO income_statement VALUES ('2019-08-15', 'A', '2019-06-30', 60.0);
            INSERT INTO income_statement VALUES ('2018-03-20', 'B', '2017-12-31', 50.0);
            INSERT INTO income_statement VALUES ('2019-03-20', 'B', '2018-12-31', NULL);

            CREATE TABLE sw_industry (
                DateTime TEXT NOT NULL,
                ID TEXT NOT NULL,
                sw_industry TEXT,
                PRIMARY KEY (DateTime, ID)
            );
            INSERT INTO sw_industry VALUES ('2015-06-01', 'A', 'Planting');
            INSERT INTO sw_industry VALUES ('2019-01-07', 'A', 'Coal Mining');
            INSERT INTO sw_industry VALUES ('2015-06-01', 'B', 'Fishery');
            INSERT INTO sw_industry VALUES ('2015-06-01', 'C', 'Unmapped');
            "#,
        )
        .unwrap();
    Arc::new(store)
}

pub(crate) fn fixture_calendar(store: &SqliteStore) -> TradingCalendar {
    TradingCalendar::load(store).unwrap()
}

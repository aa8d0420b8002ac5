//! SQLite implementation of the store read port.

use crate::error::{DataError, Result};
use crate::store::StorePort;
use crate::table::{LongTable, ReadFilter, Record, Value, parse_date};
use crate::{DATE_COLUMN, ID_COLUMN, REPORT_PERIOD_COLUMN};
use chrono::NaiveDate;
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, params, params_from_iter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Table holding the trading calendar.
pub const CALENDAR_TABLE: &str = "trading_calendar";

/// SQLite-backed factor store.
///
/// Dates are stored as ISO `YYYY-MM-DD` text. The connection sits behind a
/// mutex so one store can serve several readers.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at `path`.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DataError::LockPoisoned)
    }

    /// Run a batch of SQL statements (schema setup, fixtures, bulk loads).
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    /// Store trading days, creating the calendar table if needed.
    pub fn put_trading_days(&self, days: &[NaiveDate]) -> Result<()> {
        let mut conn = self.conn()?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {CALENDAR_TABLE} (
                    {DATE_COLUMN} TEXT PRIMARY KEY,
                    is_open INTEGER NOT NULL DEFAULT 1
                )"
            ),
            [],
        )?;

        let tx = conn.transaction()?;
        for day in days {
            tx.execute(
                &format!(
                    "INSERT OR REPLACE INTO {CALENDAR_TABLE} ({DATE_COLUMN}, is_open) VALUES (?1, 1)"
                ),
                params![day.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// `(name, primary key position)` for every column of `table`.
    fn table_info(&self, table: &str) -> Result<Vec<(String, i64)>> {
        if !self.table_exists(table)? {
            return Err(DataError::UnknownTable(table.to_string()));
        }
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(5)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

impl StorePort for SqliteStore {
    fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type IN ('table', 'view') AND lower(name) = lower(?1)",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn column_names(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .table_info(table)?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    fn primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut keys: Vec<(String, i64)> = self
            .table_info(table)?
            .into_iter()
            .filter(|(_, pk)| *pk > 0)
            .collect();
        keys.sort_by_key(|(_, pk)| *pk);
        Ok(keys.into_iter().map(|(name, _)| name).collect())
    }

    fn read_table(
        &self,
        table: &str,
        fields: &[String],
        filter: &ReadFilter,
    ) -> Result<LongTable> {
        let columns = self.column_names(table)?;
        let has_column = |name: &str| columns.iter().any(|c| c == name);

        let with_id = has_column(ID_COLUMN);
        let missing_key = if has_column(DATE_COLUMN) {
            (filter.ids.is_some() && !with_id).then_some(ID_COLUMN)
        } else {
            Some(DATE_COLUMN)
        };
        if let Some(column) = missing_key {
            return Err(DataError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }

        let fields: Vec<String> = if fields.is_empty() {
            columns
                .iter()
                .filter(|c| ![DATE_COLUMN, ID_COLUMN, REPORT_PERIOD_COLUMN].contains(&c.as_str()))
                .cloned()
                .collect()
        } else {
            if let Some(missing) = fields.iter().find(|f| !has_column(f.as_str())) {
                return Err(DataError::UnknownColumn {
                    table: table.to_string(),
                    column: missing.clone(),
                });
            }
            fields.to_vec()
        };

        if let (Some(start), Some(end)) = (filter.start, filter.end)
            && start > end
        {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if filter.dates.as_ref().is_some_and(Vec::is_empty)
            || filter.ids.as_ref().is_some_and(Vec::is_empty)
        {
            return Ok(LongTable::new(fields, Vec::new()));
        }

        let with_period = has_column(REPORT_PERIOD_COLUMN);
        let date_col = quote_ident(DATE_COLUMN);
        let id_col = quote_ident(ID_COLUMN);

        let mut select = vec![
            date_col.clone(),
            if with_id { id_col.clone() } else { "''".to_string() },
        ];
        if with_period {
            select.push(quote_ident(REPORT_PERIOD_COLUMN));
        }
        select.extend(fields.iter().map(|f| quote_ident(f)));

        let mut clauses = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(start) = filter.start {
            clauses.push(format!("date({date_col}) >= ?"));
            args.push(start.to_string());
        }
        if let Some(end) = filter.end {
            clauses.push(format!("date({date_col}) <= ?"));
            args.push(end.to_string());
        }
        if let Some(dates) = &filter.dates {
            clauses.push(format!("date({date_col}) IN ({})", placeholders(dates.len())));
            args.extend(dates.iter().map(ToString::to_string));
        }
        if let Some(ids) = &filter.ids {
            clauses.push(format!("{id_col} IN ({})", placeholders(ids.len())));
            args.extend(ids.iter().cloned());
        }

        let mut sql = format!("SELECT {} FROM {}", select.join(", "), quote_ident(table));
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY date({date_col})"));
        if with_id {
            sql.push_str(&format!(", {id_col}"));
        }
        if with_period {
            sql.push_str(&format!(", {}", quote_ident(REPORT_PERIOD_COLUMN)));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let value_offset = if with_period { 3 } else { 2 };
        let field_count = fields.len();

        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            let date: String = row.get(0)?;
            let id: String = row.get(1)?;
            let period: Option<String> = if with_period { row.get(2)? } else { None };
            let mut values = Vec::with_capacity(field_count);
            for idx in value_offset..value_offset + field_count {
                values.push(cell(row.get_ref(idx)?, idx)?);
            }
            Ok((date, id, period, values))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (date, id, period, values) = row?;
            records.push(Record {
                date: parse_date(&date)?,
                id,
                report_period: period.as_deref().map(parse_date).transpose()?,
                values,
            });
        }

        debug!(table, rows = records.len(), "read table");
        Ok(LongTable::new(fields, records))
    }
}

fn cell(value: ValueRef<'_>, idx: usize) -> rusqlite::Result<Option<Value>> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(v) => Ok(Some(Value::Int(v))),
        ValueRef::Real(v) => Ok(Some(Value::Float(v))),
        ValueRef::Text(bytes) => Ok(Some(Value::Text(
            String::from_utf8_lossy(bytes).into_owned(),
        ))),
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            format!("column {idx}"),
            Type::Blob,
        )),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store
            .execute_batch(
                r#"
                CREATE TABLE stock_daily (
                    DateTime TEXT NOT NULL,
                    ID TEXT NOT NULL,
                    close REAL,
                    volume INTEGER,
                    PRIMARY KEY (DateTime, ID)
                );
                INSERT INTO stock_daily VALUES ('2019-01-04', 'A', 10.0, 100);
                INSERT INTO stock_daily VALUES ('2019-01-04', 'B', 20.0, 200);
                INSERT INTO stock_daily VALUES ('2019-01-07', 'A', 10.5, NULL);
                INSERT INTO stock_daily VALUES ('2019-01-07 00:00:00', 'B', 19.5, 150);

                CREATE TABLE income_statement (
                    DateTime TEXT NOT NULL,
                    ID TEXT NOT NULL,
                    ReportPeriod TEXT NOT NULL,
                    net_income REAL,
                    PRIMARY KEY (DateTime, ID, ReportPeriod)
                );
                INSERT INTO income_statement VALUES ('2019-04-30', 'A', '2018-12-31', 100.0);
                "#,
            )
            .unwrap();
        store
    }

    #[test]
    fn test_store_initialization() {
        let store = SqliteStore::in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_introspection() {
        let store = fixture();
        assert!(store.table_exists("stock_daily").unwrap());
        assert!(store.table_exists("STOCK_DAILY").unwrap());
        assert!(!store.table_exists("missing").unwrap());

        assert_eq!(
            store.column_names("stock_daily").unwrap(),
            vec!["DateTime", "ID", "close", "volume"]
        );
        assert_eq!(
            store.primary_key_columns("income_statement").unwrap(),
            vec!["DateTime", "ID", "ReportPeriod"]
        );
        assert!(matches!(
            store.column_names("missing"),
            Err(DataError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_read_table_filters() {
        let store = fixture();
        let fields = vec!["close".to_string()];

        let all = store.read_table("stock_daily", &fields, &ReadFilter::new()).unwrap();
        assert_eq!(all.len(), 4);

        let by_id = store
            .read_table("stock_daily", &fields, &ReadFilter::new().ids(["B"]))
            .unwrap();
        assert_eq!(by_id.len(), 2);
        assert!(by_id.records().iter().all(|r| r.id == "B"));

        let by_end = store
            .read_table("stock_daily", &fields, &ReadFilter::new().end(day(2019, 1, 4)))
            .unwrap();
        assert_eq!(by_end.len(), 2);

        // Timestamped dates still match on the day.
        let by_date = store
            .read_table(
                "stock_daily",
                &fields,
                &ReadFilter::new().dates(vec![day(2019, 1, 7)]),
            )
            .unwrap();
        assert_eq!(by_date.len(), 2);
        assert_eq!(by_date.records()[1].date, day(2019, 1, 7));
    }

    #[test]
    fn test_read_table_null_and_all_fields() {
        let store = fixture();
        let table = store
            .read_table("stock_daily", &[], &ReadFilter::new().ids(["A"]))
            .unwrap();
        assert_eq!(table.fields(), &["close".to_string(), "volume".to_string()]);
        assert_eq!(table.records()[0].values[1], Some(Value::Int(100)));
        assert_eq!(table.records()[1].values[1], None);
    }

    #[test]
    fn test_read_table_report_period() {
        let store = fixture();
        let table = store
            .read_table("income_statement", &["net_income".to_string()], &ReadFilter::new())
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].report_period, Some(day(2018, 12, 31)));
    }

    #[test]
    fn test_read_table_without_id_column() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .put_trading_days(&[day(2019, 1, 7), day(2019, 1, 4)])
            .unwrap();
        let table = store
            .read_table(CALENDAR_TABLE, &["is_open".to_string()], &ReadFilter::new())
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].date, day(2019, 1, 4));
        assert!(table.records()[0].id.is_empty());

        let by_id = store.read_table(CALENDAR_TABLE, &[], &ReadFilter::new().ids(["A"]));
        assert!(matches!(by_id, Err(DataError::UnknownColumn { .. })));
    }

    #[test]
    fn test_read_table_rejects_unknown_column() {
        let store = fixture();
        let result = store.read_table("stock_daily", &["open".to_string()], &ReadFilter::new());
        assert!(matches!(result, Err(DataError::UnknownColumn { .. })));
    }

    #[test]
    fn test_read_table_rejects_inverted_range() {
        let store = fixture();
        let filter = ReadFilter::new().start(day(2019, 2, 1)).end(day(2019, 1, 1));
        let result = store.read_table("stock_daily", &[], &filter);
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_put_trading_days() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .put_trading_days(&[day(2019, 1, 4), day(2019, 1, 7)])
            .unwrap();
        assert!(store.table_exists(CALENDAR_TABLE).unwrap());
        let count: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM trading_calendar", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}

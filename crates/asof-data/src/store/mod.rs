//! Store read port and its SQLite implementation.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::table::{LongTable, ReadFilter};

/// Read contract every factor consumes from the relational store.
///
/// Implementations are shared across factors as `Arc<dyn StorePort>`, so they
/// must be safe to call from several threads. Connection management, retries
/// and timeouts belong to the implementation.
pub trait StorePort: Send + Sync + std::fmt::Debug {
    /// Whether a table (or view) named `name` exists. Matching is case-insensitive.
    fn table_exists(&self, name: &str) -> Result<bool>;

    /// Column names of `table`, in declaration order.
    fn column_names(&self, table: &str) -> Result<Vec<String>>;

    /// Primary key columns of `table`, in key order.
    fn primary_key_columns(&self, table: &str) -> Result<Vec<String>>;

    /// Read `fields` of `table` in long form, restricted by `filter`.
    ///
    /// An empty `fields` slice reads every non-key column. Rows come back
    /// ordered by date then id. Tables keyed by date alone yield an empty id.
    fn read_table(&self, table: &str, fields: &[String], filter: &ReadFilter)
    -> Result<LongTable>;
}

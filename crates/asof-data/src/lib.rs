#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/asof/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod store;
pub mod table;

pub use error::{DataError, Result};
pub use store::{SqliteStore, StorePort};
pub use table::{LongTable, ReadFilter, Record, Value};

/// Key column holding the record date (effective, observation or disclosure date).
pub const DATE_COLUMN: &str = "DateTime";

/// Key column holding the security id.
pub const ID_COLUMN: &str = "ID";

/// Key column holding the fiscal period of a financial-statement record.
pub const REPORT_PERIOD_COLUMN: &str = "ReportPeriod";

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

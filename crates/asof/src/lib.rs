#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/asof/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod error;
pub mod reader;
pub mod universe;

// Re-export main types from sub-crates
pub use asof_data as data;
pub use asof_factors as factors;

pub use cache::{BoundedCache, Memo};
pub use config::ReaderConfig;
pub use error::{ReaderError, Result};
pub use reader::DataReader;
pub use universe::{StockTickers, Universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/asof/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calendar;
pub mod error;
pub mod factor;
pub mod matrix;
pub mod provider;
pub mod query;
pub mod translation;

pub use calendar::TradingCalendar;
pub use error::{FactorError, Result};
pub use factor::{
    AnyFactor, CompactFactor, ContinuousFactor, Factor, FactorIdentity, FactorSpec,
    FinancialFactor, FinancialVariant, IndustryFactor, TableKind,
};
pub use matrix::{FactorMatrix, FactorOutput};
pub use provider::IndustryProvider;
pub use query::QueryFilter;
pub use translation::{IndustryTranslation, JsonTranslation, TranslationSource};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
pub(crate) mod testing;

//! Factor types.
//!
//! A factor is a `(table, fields)` identity bound to a trading calendar.
//! Concrete factors differ in how stored records become a dense
//! `trading day × security` matrix:
//!
//! - [`CompactFactor`]: sparse change events, forward filled
//! - [`IndustryFactor`]: industry classification events, optionally coarsened
//! - [`ContinuousFactor`]: dense daily records, reshaped only
//! - [`FinancialFactor`]: revisable statements, resolved as of disclosure

pub mod compact;
pub mod continuous;
pub mod financial;
pub mod industry;

pub use compact::CompactFactor;
pub use continuous::ContinuousFactor;
pub use financial::{FinancialFactor, FinancialVariant, LOOKBACK_BUFFER_DAYS};
pub use industry::IndustryFactor;

use crate::calendar::TradingCalendar;
use crate::error::{FactorError, Result};
use crate::matrix::FactorOutput;
use crate::provider::IndustryProvider;
use crate::query::QueryFilter;
use crate::translation::TranslationSource;
use asof_data::StorePort;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Table name fragments that mark a financial-statement table.
pub const FINANCIAL_STATEMENT_TYPES: [&str; 3] =
    ["balance_sheet", "income_statement", "cash_flow_statement"];

/// Common interface of all factor types.
pub trait Factor: Send + Sync + fmt::Debug {
    /// Source table and fields.
    fn identity(&self) -> &FactorIdentity;

    /// Display name of the factor.
    fn name(&self) -> String {
        self.identity().to_string()
    }

    /// Evaluate the factor for the rows and columns selected by `filter`.
    fn get_data(&self, filter: &QueryFilter) -> Result<FactorOutput>;
}

/// Whether a table holds financial statements or other records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Balance sheet, income statement or cash flow statement records
    Financial,
    /// Event or daily records
    Regular,
}

impl TableKind {
    /// Classify a table by its name.
    pub fn classify(table: &str) -> Self {
        let lower = table.to_lowercase();
        if FINANCIAL_STATEMENT_TYPES.iter().any(|t| lower.contains(t)) {
            Self::Financial
        } else {
            Self::Regular
        }
    }

    /// Whether this is a financial-statement table.
    pub const fn is_financial(self) -> bool {
        matches!(self, Self::Financial)
    }
}

/// Validated `(table, fields)` pair.
///
/// Construction checks the table and every field against the store schema,
/// so a factor with a bad identity can never be built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactorIdentity {
    table: String,
    fields: Vec<String>,
}

impl FactorIdentity {
    /// Validate `table` and `fields` against the store.
    ///
    /// The table name is lower-cased. At least one field is required.
    pub fn new<I, S>(store: &dyn StorePort, table: &str, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = table.to_lowercase();
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(FactorError::Schema(format!("no fields given for table {table}")));
        }
        if !store.table_exists(&table)? {
            return Err(FactorError::Schema(format!("table {table} does not exist")));
        }
        let columns = store.column_names(&table)?;
        if let Some(missing) = fields.iter().find(|f| !columns.contains(f)) {
            return Err(FactorError::Schema(format!(
                "field {missing} does not exist in table {table}"
            )));
        }
        Ok(Self { table, fields })
    }

    /// Source table (lower case).
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Source fields.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Kind of the source table.
    pub fn kind(&self) -> TableKind {
        TableKind::classify(&self.table)
    }

    pub(crate) fn require_kind(&self, financial: bool) -> Result<()> {
        if self.kind().is_financial() != financial {
            let expected = if financial { "a" } else { "not a" };
            return Err(FactorError::Schema(format!(
                "table {} is {expected} financial-statement table as required",
                self.table
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FactorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.fields.join(","))
    }
}

/// Any concrete factor.
#[derive(Debug, Clone)]
pub enum AnyFactor {
    /// Forward-filled events
    Compact(CompactFactor),
    /// Industry classification
    Industry(IndustryFactor),
    /// Dense daily records
    Continuous(ContinuousFactor),
    /// Financial statement line item
    Financial(FinancialFactor),
}

impl AnyFactor {
    fn inner(&self) -> &dyn Factor {
        match self {
            Self::Compact(f) => f,
            Self::Industry(f) => f,
            Self::Continuous(f) => f,
            Self::Financial(f) => f,
        }
    }
}

impl Factor for AnyFactor {
    fn identity(&self) -> &FactorIdentity {
        self.inner().identity()
    }

    fn name(&self) -> String {
        self.inner().name()
    }

    fn get_data(&self, filter: &QueryFilter) -> Result<FactorOutput> {
        self.inner().get_data(filter)
    }
}

/// Serializable description of a factor, used by configuration and the CLI.
///
/// ```json
/// {"kind": "financial", "table": "income_statement", "field": "net_income", "variant": "yearly"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactorSpec {
    /// Event table; `field` defaults to the table name
    Compact {
        /// Source table
        table: String,
        /// Value column
        #[serde(default)]
        field: Option<String>,
    },
    /// Industry classification at a level
    Industry {
        /// Classification provider
        provider: IndustryProvider,
        /// Requested level
        level: u8,
    },
    /// Daily table
    Continuous {
        /// Source table
        table: String,
        /// Value columns
        fields: Vec<String>,
    },
    /// Financial statement line item
    Financial {
        /// Source table
        table: String,
        /// Line item column
        field: String,
        /// Aggregation variant
        #[serde(default)]
        variant: FinancialVariant,
    },
}

impl FactorSpec {
    /// Construct the described factor.
    pub fn build(
        &self,
        store: Arc<dyn StorePort>,
        calendar: &TradingCalendar,
        translations: &dyn TranslationSource,
    ) -> Result<AnyFactor> {
        let calendar = calendar.clone();
        let factor = match self {
            Self::Compact { table, field } => AnyFactor::Compact(match field {
                Some(field) => CompactFactor::with_field(store.as_ref(), calendar, table, field)?,
                None => CompactFactor::new(store.as_ref(), calendar, table)?,
            }),
            Self::Industry { provider, level } => AnyFactor::Industry(IndustryFactor::new(
                store.as_ref(),
                calendar,
                *provider,
                *level,
                translations,
            )?),
            Self::Continuous { table, fields } => AnyFactor::Continuous(ContinuousFactor::new(
                store,
                calendar,
                table,
                fields.clone(),
            )?),
            Self::Financial {
                table,
                field,
                variant,
            } => AnyFactor::Financial(FinancialFactor::new(
                store, calendar, table, field, *variant,
            )?),
        };
        Ok(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{day, fixture_calendar, fixture_store};
    use crate::translation::JsonTranslation;
    use rstest::rstest;

    #[rstest]
    #[case("income_statement", TableKind::Financial)]
    #[case("AShare_Balance_Sheet", TableKind::Financial)]
    #[case("cash_flow_statement_q", TableKind::Financial)]
    #[case("adj_factor", TableKind::Regular)]
    #[case("stock_daily", TableKind::Regular)]
    fn test_classify(#[case] table: &str, #[case] expected: TableKind) {
        assert_eq!(TableKind::classify(table), expected);
    }

    #[test]
    fn test_identity_validation() {
        let store = fixture_store();
        let identity = FactorIdentity::new(store.as_ref(), "Stock_Daily", ["close"]).unwrap();
        assert_eq!(identity.table(), "stock_daily");
        assert_eq!(identity.fields(), &["close".to_string()]);
        assert_eq!(identity.to_string(), "stock_daily.close");

        let err = FactorIdentity::new(store.as_ref(), "nope", ["close"]).unwrap_err();
        assert!(matches!(err, FactorError::Schema(_)));
        let err = FactorIdentity::new(store.as_ref(), "stock_daily", ["close", "bid"]).unwrap_err();
        assert!(matches!(err, FactorError::Schema(_)));
        let err = FactorIdentity::new(store.as_ref(), "stock_daily", Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, FactorError::Schema(_)));
    }

    #[test]
    fn test_spec_from_json() {
        let spec: FactorSpec = serde_json::from_str(
            r#"{"kind": "financial", "table": "income_statement", "field": "net_income"}"#,
        )
        .unwrap();
        assert_eq!(
            spec,
            FactorSpec::Financial {
                table: "income_statement".into(),
                field: "net_income".into(),
                variant: FinancialVariant::Yearly,
            }
        );

        let spec: FactorSpec =
            serde_json::from_str(r#"{"kind": "industry", "provider": "sw", "level": 1}"#).unwrap();
        assert_eq!(
            spec,
            FactorSpec::Industry {
                provider: IndustryProvider::Sw,
                level: 1
            }
        );
    }

    #[test]
    fn test_spec_build_and_dispatch() {
        let store = fixture_store();
        let calendar = fixture_calendar(&store);
        let translations = JsonTranslation::packaged().unwrap();
        let spec = FactorSpec::Compact {
            table: "adj_factor".into(),
            field: None,
        };
        let factor = spec.build(store, &calendar, &translations).unwrap();
        assert!(matches!(factor, AnyFactor::Compact(_)));
        assert_eq!(factor.name(), "adj_factor.adj_factor");

        let matrix = factor
            .get_data(&QueryFilter::new().dates(vec![day(2019, 1, 7)]).ids(["A"]))
            .unwrap()
            .into_matrix()
            .unwrap();
        assert_eq!(matrix.get_f64(day(2019, 1, 7), "A"), Some(10.0));
    }

    #[test]
    fn test_spec_build_mixed_case_table() {
        let store = fixture_store();
        let calendar = fixture_calendar(&store);
        let translations = JsonTranslation::packaged().unwrap();
        let spec: FactorSpec =
            serde_json::from_str(r#"{"kind": "compact", "table": "Adj_Factor"}"#).unwrap();
        let factor = spec.build(store, &calendar, &translations).unwrap();
        assert_eq!(factor.name(), "adj_factor.adj_factor");
    }

    #[test]
    fn test_spec_build_rejects_wrong_kind() {
        let store = fixture_store();
        let calendar = fixture_calendar(&store);
        let translations = JsonTranslation::packaged().unwrap();
        let spec = FactorSpec::Financial {
            table: "stock_daily".into(),
            field: "close".into(),
            variant: FinancialVariant::Yearly,
        };
        assert!(matches!(
            spec.build(store, &calendar, &translations),
            Err(FactorError::Schema(_))
        ));
    }
}

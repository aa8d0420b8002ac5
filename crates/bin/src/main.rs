//! asof CLI binary.
//!
//! Provides command-line access to the trading calendar, factors, industry
//! classifications and the listed-stock universe.

mod output;

use asof::factors::{
    Factor, FactorSpec, FinancialVariant, IndustryProvider, QueryFilter, TradingCalendar,
};
use asof::{DataReader, ReaderConfig, Universe};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use output::{Format, print_dates, print_output};
use serde_json::json;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "asof")]
#[command(about = "asof: point-in-time factor access", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overrides the configured one
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List trading days or period boundaries
    Calendar {
        /// First date (inclusive)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date (inclusive)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Which days to list
        #[arg(long, value_enum, default_value = "day")]
        period: Period,
    },

    /// Evaluate a factor
    Factor {
        /// Factor description as JSON, e.g. '{"kind": "compact", "table": "adj_factor"}'
        #[arg(long, conflicts_with = "table")]
        spec: Option<String>,

        /// Source table
        #[arg(long)]
        table: Option<String>,

        /// Value column(s); defaults to the table name for event tables
        #[arg(long, value_delimiter = ',')]
        field: Vec<String>,

        /// Factor kind when building from --table
        #[arg(long, value_enum, default_value = "compact")]
        kind: Kind,

        /// Financial aggregation variant
        #[arg(long, value_enum, default_value = "yearly")]
        variant: Variant,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Industry classification at a level
    Industry {
        /// Classification provider (citic, sw, csi, wind, gics)
        #[arg(long)]
        provider: String,

        /// Classification level
        #[arg(long, default_value = "1")]
        level: u8,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Stocks listed on a date
    Universe {
        /// Reference date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print first listing dates instead
        #[arg(long)]
        list_dates: bool,
    },
}

#[derive(clap::Args)]
struct QueryArgs {
    /// Exact dates, comma separated
    #[arg(long, value_delimiter = ',')]
    dates: Vec<NaiveDate>,

    /// First date (inclusive)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date (inclusive)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Security ids, comma separated
    #[arg(long, value_delimiter = ',')]
    ids: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: Format,
}

impl QueryArgs {
    fn filter(&self) -> QueryFilter {
        QueryFilter {
            dates: (!self.dates.is_empty()).then(|| self.dates.clone()),
            start: self.start,
            end: self.end,
            ids: (!self.ids.is_empty()).then(|| self.ids.clone()),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Period {
    Day,
    MonthStart,
    MonthEnd,
    YearEnd,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Compact,
    Continuous,
    Financial,
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Yearly,
    Ttm,
    Latest,
}

impl From<Variant> for FinancialVariant {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Yearly => Self::Yearly,
            Variant::Ttm => Self::TrailingTwelveMonths,
            Variant::Latest => Self::Latest,
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("asof=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ReaderConfig::load(path)?,
        None => ReaderConfig::default(),
    };
    if let Some(database) = cli.database {
        config.database = database;
    }
    debug!(database = %config.database.display(), "resolved configuration");
    let reader = DataReader::from_config(&config)?;

    match cli.command {
        Commands::Calendar { start, end, period } => {
            let calendar = reader.calendar()?;
            let days = calendar_days(&calendar, start, end, period)?;
            print_dates(&days);
        }
        Commands::Factor {
            spec,
            table,
            field,
            kind,
            variant,
            query,
        } => {
            let spec: FactorSpec = match (spec, table) {
                (Some(json), _) => serde_json::from_str(&json)?,
                (None, Some(table)) => build_spec(table, field, kind, variant.into()),
                (None, None) => return Err("either --spec or --table is required".into()),
            };
            let calendar = reader.calendar()?;
            let factor = spec.build(
                Arc::clone(reader.store()),
                &calendar,
                reader.translations().as_ref(),
            )?;
            let data = factor.get_data(&query.filter())?;
            print_output(&factor.name(), &data, query.format)?;
        }
        Commands::Industry {
            provider,
            level,
            query,
        } => {
            let provider: IndustryProvider = provider.parse()?;
            let factor = reader.industry(provider, level)?;
            let data = factor.get_data(&query.filter())?;
            print_output(&factor.name(), &data, query.format)?;
        }
        Commands::Universe { date, list_dates } => {
            let stocks = reader.stocks()?;
            if list_dates {
                let dates: serde_json::Map<String, serde_json::Value> = stocks
                    .list_dates()
                    .into_iter()
                    .map(|(id, date)| (id, json!(date.to_string())))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&dates)?);
            } else {
                let date = date.unwrap_or_else(|| Utc::now().date_naive());
                let listed = stocks.listed_securities(date)?;
                println!("{}", serde_json::to_string_pretty(&json!({
                    "date": date.to_string(),
                    "count": listed.len(),
                    "ids": listed,
                }))?);
            }
        }
    }

    Ok(())
}

fn build_spec(table: String, mut fields: Vec<String>, kind: Kind, variant: FinancialVariant) -> FactorSpec {
    match kind {
        Kind::Compact => FactorSpec::Compact {
            table,
            field: fields.pop(),
        },
        Kind::Continuous => {
            if fields.is_empty() {
                fields.push(table.to_lowercase());
            }
            FactorSpec::Continuous { table, fields }
        }
        Kind::Financial => FactorSpec::Financial {
            field: fields.pop().unwrap_or_else(|| table.to_lowercase()),
            table,
            variant,
        },
    }
}

fn calendar_days(
    calendar: &TradingCalendar,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    period: Period,
) -> asof::factors::Result<Vec<NaiveDate>> {
    let (first, last) = (
        start.unwrap_or_else(|| calendar.first()),
        end.unwrap_or_else(|| calendar.last()),
    );
    // defaulted bounds clip rather than fail
    if first > last && (start.is_none() || end.is_none()) {
        return Ok(Vec::new());
    }
    match period {
        Period::Day => calendar.select_dates(start, end),
        Period::MonthStart => calendar.first_day_of_month(first, last),
        Period::MonthEnd => calendar.last_day_of_month(first, last),
        Period::YearEnd => calendar.last_day_of_year(first, last),
    }
}

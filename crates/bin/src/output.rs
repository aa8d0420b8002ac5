//! Printing factor output.

use asof::factors::{FactorMatrix, FactorOutput};
use chrono::NaiveDate;
use clap::ValueEnum;
use serde_json::{Value as Json, json};

/// Output format for factor data.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum Format {
    /// Polars table
    Table,
    /// JSON document
    Json,
}

pub(crate) fn print_output(
    name: &str,
    data: &FactorOutput,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        Format::Table => {
            println!("{name}");
            println!("{}", data.to_dataframe()?);
        }
        Format::Json => {
            let body = match data {
                FactorOutput::Matrix(matrix) => matrix_json(matrix),
                FactorOutput::Long(table) => json!({
                    "fields": table.fields(),
                    "records": table
                        .records()
                        .iter()
                        .map(|r| json!({
                            "date": r.date.to_string(),
                            "id": r.id,
                            "report_period": r.report_period.map(|p| p.to_string()),
                            "values": r.values,
                        }))
                        .collect::<Vec<_>>(),
                }),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "factor": name, "data": body }))?
            );
        }
    }
    Ok(())
}

pub(crate) fn print_dates(dates: &[NaiveDate]) {
    for date in dates {
        println!("{date}");
    }
}

fn matrix_json(matrix: &FactorMatrix) -> Json {
    let rows: Vec<Json> = (0..matrix.dates().len())
        .map(|row| json!(matrix.row(row)))
        .collect();
    json!({
        "dates": matrix.dates().iter().map(ToString::to_string).collect::<Vec<_>>(),
        "ids": matrix.ids(),
        "values": rows,
    })
}

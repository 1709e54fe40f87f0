use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::simulation::SimulationRecord;

/// Converts simulation records into a DataFrame, one row per record.
pub fn records_to_df(records: &[SimulationRecord]) -> Result<DataFrame> {
    let timestamps: Vec<String> = records.iter().map(|r| r.timestamp.to_string()).collect();
    let unit_prices: Vec<f64> = records.iter().map(|r| r.unit_price).collect();
    let units: Vec<f64> = records.iter().map(|r| r.units_held).collect();
    let invested: Vec<f64> = records.iter().map(|r| r.capital_invested).collect();
    let contributions: Vec<u32> = records.iter().map(|r| r.contributions).collect();
    let values: Vec<f64> = records.iter().map(|r| r.portfolio_value).collect();
    let gains: Vec<f64> = records.iter().map(|r| r.unrealized_gain).collect();
    let distributions: Vec<f64> = records
        .iter()
        .map(|r| r.distributions_received_cumulative)
        .collect();

    let df = df!(
        "timestamp" => timestamps,
        "unit_price" => unit_prices,
        "units_held" => units,
        "capital_invested" => invested,
        "contributions" => contributions,
        "portfolio_value" => values,
        "unrealized_gain" => gains,
        "distributions_received" => distributions,
    )?;
    Ok(df)
}

/// Writes the records as CSV to `path`, with a header row.
pub fn write_records_csv(records: &[SimulationRecord], path: impl AsRef<Path>) -> Result<()> {
    let mut df = records_to_df(records)?;
    let mut file = File::create(path.as_ref())?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    info!(path = %path.as_ref().display(), rows = df.height(), "wrote simulation records");
    Ok(())
}

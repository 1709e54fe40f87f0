//! Fetch, resample and simulate in one call.

use time::Date;
use tracing::info;

use crate::error::{DcaError, Result};
use crate::market_data::MarketDataSource;
use crate::resample::resample;
use crate::simulation::{ContributionCadence, DcaSimulator, SimulationRecord};
use crate::summary::SimulationSummary;

/// What to simulate.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub ticker: String,
    pub start: Date,
    pub end: Date,
    pub contribution_amount: f64,
    pub cadence: ContributionCadence,
}

/// A completed run and the name of the instrument it was run on.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub asset_name: String,
    pub records: Vec<SimulationRecord>,
    pub summary: SimulationSummary,
}

/// Loads history from `source`, resamples it for the request's cadence and runs the engine.
pub fn simulate_from_source(
    source: &dyn MarketDataSource,
    request: &SimulationRequest,
) -> Result<SimulationRun> {
    let simulator = DcaSimulator::new(request.contribution_amount, request.cadence)?;
    let quotes = source.fetch(&request.ticker, request.start, request.end)?;
    let observations = resample(&quotes, request.cadence.frequency());
    info!(
        ticker = %request.ticker,
        quotes = quotes.len(),
        periods = observations.len(),
        "resampled quotes"
    );

    let records = simulator.run(&observations)?;
    let summary = SimulationSummary::from_records(&records).ok_or(DcaError::EmptyInput)?;
    Ok(SimulationRun {
        asset_name: source.name(&request.ticker),
        records,
        summary,
    })
}

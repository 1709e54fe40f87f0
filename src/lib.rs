//! Dollar-cost averaging simulator.
//!
//! Turns a ticker's daily price and dividend history into a period-by-period record
//! of units held, capital invested and portfolio value for a fixed monthly
//! contribution with dividends reinvested.

pub mod config;
pub mod error;
pub mod input_handler;
pub mod market_data;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod resample;
pub mod simulation;
pub mod summary;

#[cfg(feature = "python")]
mod python;

pub use error::{DcaError, Result};
pub use market_data::{CsvMarketDataSource, MarketDataSource};
pub use pipeline::{simulate_from_source, SimulationRequest, SimulationRun};
pub use resample::{resample, DailyQuote, Frequency};
pub use simulation::{
    run, ContributionCadence, DcaSimulator, PeriodKey, PriceObservation, SimulationRecord,
    SimulationState,
};
pub use summary::SimulationSummary;

use std::path::PathBuf;

use clap::Parser;
use time::{Date, OffsetDateTime};

use crate::error::{DcaError, Result};
use crate::input_handler::parse_date;
use crate::simulation::ContributionCadence;

/// Simulate a dollar-cost averaging plan over a ticker's price history.
///
/// Every option can also be set through the listed environment variable or a `.env` file.
#[derive(Debug, Clone, Parser)]
#[command(name = "dca-simulator", version, about)]
pub struct Config {
    /// Ticker to simulate.
    #[arg(long, env = "DCA_TICKER", default_value = "^GSPC")]
    pub ticker: String,

    /// Display name used when the data directory has no long name for the ticker.
    #[arg(long, env = "DCA_NAME")]
    pub name: Option<String>,

    /// Directory holding `<TICKER>.csv` daily quote files.
    #[arg(long, env = "DCA_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// First day of the simulation (YYYY-MM-DD).
    #[arg(long, env = "DCA_START", default_value = "2000-01-01", value_parser = parse_date_arg)]
    pub start: Date,

    /// Last day of the simulation (YYYY-MM-DD), today when omitted.
    #[arg(long, env = "DCA_END", value_parser = parse_date_arg)]
    pub end: Option<Date>,

    /// Amount invested every month.
    #[arg(long, env = "DCA_AMOUNT", default_value_t = 100.0)]
    pub amount: f64,

    /// Observation frequency: `monthly` or `weekly` (contributions stay monthly).
    #[arg(long, env = "DCA_CADENCE", default_value = "monthly", value_parser = parse_cadence_arg)]
    pub cadence: ContributionCadence,

    /// CSV file receiving the simulation records, `dca_<ticker>.csv` when omitted.
    #[arg(long, env = "DCA_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Currency symbol used in the report.
    #[arg(long, env = "DCA_CURRENCY", default_value = "$")]
    pub currency: String,
}

impl Config {
    /// Loads `.env` (if any) and parses the command line.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Config::parse()
    }

    pub fn end_date(&self) -> Date {
        self.end
            .unwrap_or_else(|| OffsetDateTime::now_utc().date())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem: String = self
                .ticker
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();
            PathBuf::from(format!("dca_{}.csv", stem.to_lowercase()))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(DcaError::invalid_parameter(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        let end = self.end_date();
        if self.start > end {
            return Err(DcaError::invalid_parameter(format!(
                "start date {} is after end date {}",
                self.start, end
            )));
        }
        Ok(())
    }
}

fn parse_date_arg(value: &str) -> std::result::Result<Date, String> {
    parse_date(value).map_err(|e| e.to_string())
}

fn parse_cadence_arg(value: &str) -> std::result::Result<ContributionCadence, String> {
    value.parse().map_err(|e: DcaError| e.to_string())
}

use time::Date;

use crate::simulation::SimulationRecord;

/// Headline figures of a finished run, derived from its last record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSummary {
    pub final_timestamp: Date,
    pub periods: usize,
    pub contributions: u32,
    pub total_invested: f64,
    pub final_value: f64,
    pub unrealized_gain: f64,
    pub total_distributions: f64,
    /// Return on investment in percent, 0 when nothing was invested.
    pub roi_pct: f64,
}

impl SimulationSummary {
    /// Summarizes a single final record. `periods` is left at 1.
    pub fn from_record(record: &SimulationRecord) -> Self {
        let roi_pct = if record.capital_invested > 0.0 {
            record.unrealized_gain / record.capital_invested * 100.0
        } else {
            0.0
        };
        SimulationSummary {
            final_timestamp: record.timestamp,
            periods: 1,
            contributions: record.contributions,
            total_invested: record.capital_invested,
            final_value: record.portfolio_value,
            unrealized_gain: record.unrealized_gain,
            total_distributions: record.distributions_received_cumulative,
            roi_pct,
        }
    }

    /// Summarizes a full run. Returns `None` for an empty series.
    pub fn from_records(records: &[SimulationRecord]) -> Option<Self> {
        records.last().map(|last| SimulationSummary {
            periods: records.len(),
            ..Self::from_record(last)
        })
    }

    pub fn has_distributions(&self) -> bool {
        self.total_distributions > 0.0
    }
}

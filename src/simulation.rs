use std::fmt;
use std::str::FromStr;

use time::{Date, Month};
use tracing::{debug, info};

use crate::error::{DcaError, Result};
use crate::resample::Frequency;

/// The price of the tracked instrument for one period, plus any cash distribution
/// paid per held unit during that period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub timestamp: Date,
    pub unit_price: f64,
    /// Non-negative, 0.0 when nothing was paid.
    pub distribution_per_unit: f64,
}

impl PriceObservation {
    pub fn new(timestamp: Date, unit_price: f64) -> Self {
        Self {
            timestamp,
            unit_price,
            distribution_per_unit: 0.0,
        }
    }

    pub fn with_distribution(mut self, distribution_per_unit: f64) -> Self {
        self.distribution_per_unit = distribution_per_unit;
        self
    }
}

/// How often observations arrive and how contributions are scheduled against them.
///
/// Both cadences contribute at most once per calendar month; they differ in the
/// granularity of the price series the run is fed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContributionCadence {
    #[default]
    Monthly,
    /// Weekly observations, contribution on the first observation of each month.
    WeeklyWithMonthlyTrigger,
}

impl ContributionCadence {
    /// The resampling frequency that produces observations for this cadence.
    pub fn frequency(self) -> Frequency {
        match self {
            ContributionCadence::Monthly => Frequency::MonthEnd,
            ContributionCadence::WeeklyWithMonthlyTrigger => Frequency::WeekEnd,
        }
    }

    /// The contribution period an observation belongs to.
    pub fn period_key(self, timestamp: Date) -> PeriodKey {
        match self {
            ContributionCadence::Monthly | ContributionCadence::WeeklyWithMonthlyTrigger => {
                PeriodKey::month_of(timestamp)
            }
        }
    }
}

impl fmt::Display for ContributionCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContributionCadence::Monthly => write!(f, "monthly"),
            ContributionCadence::WeeklyWithMonthlyTrigger => write!(f, "weekly"),
        }
    }
}

impl FromStr for ContributionCadence {
    type Err = DcaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" | "m" => Ok(ContributionCadence::Monthly),
            "weekly" | "week" | "w" => Ok(ContributionCadence::WeeklyWithMonthlyTrigger),
            other => Err(DcaError::invalid_parameter(format!(
                "unknown cadence '{}', expected 'monthly' or 'weekly'",
                other
            ))),
        }
    }
}

/// Calendar bucket used to decide whether an observation triggers a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    pub year: i32,
    pub month: Month,
}

impl PeriodKey {
    pub fn month_of(date: Date) -> Self {
        PeriodKey {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Accumulators carried from one observation to the next during a single run.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    pub units_held: f64,
    pub capital_invested: f64,
    pub distributions_received_cumulative: f64,
    pub contributions: u32,
    pub last_contribution_period_key: Option<PeriodKey>,
}

impl SimulationState {
    /// Reinvests this period's distribution on the units already held, at the
    /// period's price. Returns the cash distributed, if any.
    pub fn reinvest_distribution(&mut self, observation: &PriceObservation) -> Option<f64> {
        if self.units_held <= 0.0 || observation.distribution_per_unit <= 0.0 {
            return None;
        }
        let distribution_cash = self.units_held * observation.distribution_per_unit;
        self.units_held += distribution_cash / observation.unit_price;
        self.distributions_received_cumulative += distribution_cash;
        Some(distribution_cash)
    }

    /// Buys `amount` worth of units unless a contribution was already made in `key`.
    /// Returns whether a contribution happened.
    pub fn contribute(&mut self, key: PeriodKey, amount: f64, unit_price: f64) -> bool {
        if self.last_contribution_period_key == Some(key) {
            return false;
        }
        self.units_held += amount / unit_price;
        self.capital_invested += amount;
        self.contributions += 1;
        self.last_contribution_period_key = Some(key);
        true
    }

    /// Values the holdings at the observation's price.
    pub fn snapshot(&self, observation: &PriceObservation) -> SimulationRecord {
        let portfolio_value = self.units_held * observation.unit_price;
        SimulationRecord {
            timestamp: observation.timestamp,
            unit_price: observation.unit_price,
            units_held: self.units_held,
            capital_invested: self.capital_invested,
            portfolio_value,
            unrealized_gain: portfolio_value - self.capital_invested,
            distributions_received_cumulative: self.distributions_received_cumulative,
            contributions: self.contributions,
        }
    }
}

/// Portfolio snapshot after one observation has been processed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationRecord {
    pub timestamp: Date,
    pub unit_price: f64,
    pub units_held: f64,
    pub capital_invested: f64,
    pub portfolio_value: f64,
    pub unrealized_gain: f64,
    pub distributions_received_cumulative: f64,
    /// Number of contributions made so far.
    pub contributions: u32,
}

/// Dollar-cost averaging simulator: a fixed amount is invested once per period and
/// distributions are reinvested as they are paid.
#[derive(Debug, Clone)]
pub struct DcaSimulator {
    /// Amount invested at each triggered contribution.
    pub contribution_amount: f64,
    pub cadence: ContributionCadence,
}

impl DcaSimulator {
    pub fn new(contribution_amount: f64, cadence: ContributionCadence) -> Result<Self> {
        if !contribution_amount.is_finite() || contribution_amount <= 0.0 {
            return Err(DcaError::invalid_parameter(format!(
                "contribution amount must be positive, got {}",
                contribution_amount
            )));
        }
        Ok(Self {
            contribution_amount,
            cadence,
        })
    }

    /// Runs the simulation over `observations`.
    ///
    /// Each observation first reinvests its distribution on the units held going in,
    /// then makes the period's contribution if this is the first observation of the
    /// period, and is finally valued at its own price. The whole series is validated
    /// before any state is touched, so an error never comes with partial output.
    pub fn run(&self, observations: &[PriceObservation]) -> Result<Vec<SimulationRecord>> {
        validate(observations)?;
        info!(
            periods = observations.len(),
            amount = self.contribution_amount,
            cadence = %self.cadence,
            "running DCA simulation"
        );

        let mut state = SimulationState::default();
        let mut records = Vec::with_capacity(observations.len());

        for observation in observations {
            if let Some(cash) = state.reinvest_distribution(observation) {
                debug!(date = %observation.timestamp, cash, "reinvested distribution");
            }

            let key = self.cadence.period_key(observation.timestamp);
            if state.contribute(key, self.contribution_amount, observation.unit_price) {
                debug!(date = %observation.timestamp, price = observation.unit_price, "contribution");
            }

            records.push(state.snapshot(observation));
        }

        if let Some(last) = records.last() {
            info!(
                invested = last.capital_invested,
                value = last.portfolio_value,
                "simulation finished"
            );
        }
        Ok(records)
    }
}

/// Convenience wrapper: build a simulator and run it once.
pub fn run(
    observations: &[PriceObservation],
    contribution_amount: f64,
    cadence: ContributionCadence,
) -> Result<Vec<SimulationRecord>> {
    DcaSimulator::new(contribution_amount, cadence)?.run(observations)
}

fn validate(observations: &[PriceObservation]) -> Result<()> {
    if observations.is_empty() {
        return Err(DcaError::EmptyInput);
    }
    let mut previous: Option<Date> = None;
    for (index, obs) in observations.iter().enumerate() {
        if !obs.unit_price.is_finite() || obs.unit_price <= 0.0 {
            return Err(DcaError::invalid_observation(
                index,
                obs.timestamp,
                format!("unit price must be positive, got {}", obs.unit_price),
            ));
        }
        if !obs.distribution_per_unit.is_finite() || obs.distribution_per_unit < 0.0 {
            return Err(DcaError::invalid_observation(
                index,
                obs.timestamp,
                format!(
                    "distribution per unit must be non-negative, got {}",
                    obs.distribution_per_unit
                ),
            ));
        }
        if let Some(prev) = previous {
            if obs.timestamp <= prev {
                return Err(DcaError::UnorderedObservations {
                    index,
                    previous: prev,
                    current: obs.timestamp,
                });
            }
        }
        previous = Some(obs.timestamp);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn monthly(prices: &[f64]) -> Vec<PriceObservation> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let month = Month::try_from(i as u8 + 1).unwrap();
                PriceObservation::new(Date::from_calendar_date(2020, month, 28).unwrap(), p)
            })
            .collect()
    }

    #[test]
    fn test_contribution_is_skipped_within_same_period() {
        let mut state = SimulationState::default();
        let key = PeriodKey::month_of(date!(2021 - 03 - 07));
        assert!(state.contribute(key, 100.0, 10.0));
        assert!(!state.contribute(key, 100.0, 5.0));
        assert!((state.units_held - 10.0).abs() < 1e-10);
        assert!((state.capital_invested - 100.0).abs() < 1e-10);
        assert_eq!(state.contributions, 1);
    }

    #[test]
    fn test_no_distribution_without_units() {
        let mut state = SimulationState::default();
        let obs = PriceObservation::new(date!(2021 - 01 - 31), 10.0).with_distribution(2.0);
        assert_eq!(state.reinvest_distribution(&obs), None);
        assert_eq!(state.distributions_received_cumulative, 0.0);
    }

    #[test]
    fn test_scenario_without_distributions() {
        // Prices 10, 20, 10 with 100 per month:
        // units 10 -> 15 -> 25, values 100 -> 300 -> 250.
        let records = run(&monthly(&[10.0, 20.0, 10.0]), 100.0, ContributionCadence::Monthly)
            .unwrap();
        let units: Vec<f64> = records.iter().map(|r| r.units_held).collect();
        let invested: Vec<f64> = records.iter().map(|r| r.capital_invested).collect();
        let values: Vec<f64> = records.iter().map(|r| r.portfolio_value).collect();
        for (got, want) in units.iter().zip([10.0, 15.0, 25.0]) {
            assert!((got - want).abs() < 1e-10);
        }
        for (got, want) in invested.iter().zip([100.0, 200.0, 300.0]) {
            assert!((got - want).abs() < 1e-10);
        }
        for (got, want) in values.iter().zip([100.0, 300.0, 250.0]) {
            assert!((got - want).abs() < 1e-10);
        }
        assert!((records[2].unrealized_gain + 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_distribution_reinvested_before_contribution() {
        let mut observations = monthly(&[10.0, 20.0, 10.0]);
        observations[1].distribution_per_unit = 1.0;
        let records = run(&observations, 100.0, ContributionCadence::Monthly).unwrap();

        // 10 units * 1.0 = 10 cash at price 20 -> +0.5 units, then +5 from the contribution.
        assert!((records[1].units_held - 15.5).abs() < 1e-10);
        assert!((records[1].distributions_received_cumulative - 10.0).abs() < 1e-10);
        assert!((records[2].distributions_received_cumulative - 10.0).abs() < 1e-10);
        assert!((records[1].capital_invested - 200.0).abs() < 1e-10);
    }

    #[test]
    fn test_weekly_observations_contribute_once_per_month() {
        let observations = vec![
            PriceObservation::new(date!(2023 - 01 - 01), 10.0),
            PriceObservation::new(date!(2023 - 01 - 08), 20.0),
            PriceObservation::new(date!(2023 - 01 - 15), 40.0),
            PriceObservation::new(date!(2023 - 02 - 05), 50.0),
            PriceObservation::new(date!(2023 - 02 - 12), 25.0),
        ];
        let records = run(
            &observations,
            100.0,
            ContributionCadence::WeeklyWithMonthlyTrigger,
        )
        .unwrap();

        let invested: Vec<f64> = records.iter().map(|r| r.capital_invested).collect();
        assert_eq!(invested, vec![100.0, 100.0, 100.0, 200.0, 200.0]);
        // First observation of each month buys: 100/10 in January, 100/50 in February.
        assert!((records[4].units_held - 12.0).abs() < 1e-10);
        assert!((records[4].portfolio_value - 300.0).abs() < 1e-10);
        assert_eq!(records[4].contributions, 2);
    }

    #[test]
    fn test_same_month_of_different_years_triggers_again() {
        let observations = vec![
            PriceObservation::new(date!(2020 - 05 - 31), 10.0),
            PriceObservation::new(date!(2021 - 05 - 31), 10.0),
        ];
        let records = run(&observations, 50.0, ContributionCadence::Monthly).unwrap();
        assert!((records[1].capital_invested - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_single_observation() {
        let observations = [PriceObservation::new(date!(2022 - 06 - 30), 4.0)];
        let records = run(&observations, 100.0, ContributionCadence::Monthly).unwrap();
        assert_eq!(records.len(), 1);
        assert!((records[0].capital_invested - 100.0).abs() < 1e-10);
        assert!((records[0].units_held - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_rejects_zero_price() {
        let mut observations = monthly(&[10.0, 20.0, 10.0]);
        observations[2].unit_price = 0.0;
        let err = run(&observations, 100.0, ContributionCadence::Monthly).unwrap_err();
        assert!(matches!(err, DcaError::InvalidObservation { index: 2, .. }));
    }

    #[test]
    fn test_rejects_negative_distribution() {
        let mut observations = monthly(&[10.0, 20.0]);
        observations[0].distribution_per_unit = -1.0;
        let err = run(&observations, 100.0, ContributionCadence::Monthly).unwrap_err();
        assert!(matches!(err, DcaError::InvalidObservation { index: 0, .. }));
    }

    #[test]
    fn test_rejects_empty_input_and_bad_amount() {
        assert!(matches!(
            run(&[], 100.0, ContributionCadence::Monthly),
            Err(DcaError::EmptyInput)
        ));
        for amount in [0.0, -5.0, f64::NAN] {
            assert!(matches!(
                DcaSimulator::new(amount, ContributionCadence::Monthly),
                Err(DcaError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_duplicate_timestamps() {
        let observations = vec![
            PriceObservation::new(date!(2020 - 01 - 31), 10.0),
            PriceObservation::new(date!(2020 - 01 - 31), 11.0),
        ];
        let err = run(&observations, 100.0, ContributionCadence::Monthly).unwrap_err();
        assert!(matches!(err, DcaError::UnorderedObservations { index: 1, .. }));
    }

    #[test]
    fn test_cadence_parsing() {
        assert_eq!(
            "Weekly".parse::<ContributionCadence>().unwrap(),
            ContributionCadence::WeeklyWithMonthlyTrigger
        );
        assert_eq!(
            "monthly".parse::<ContributionCadence>().unwrap(),
            ContributionCadence::Monthly
        );
        assert!("daily".parse::<ContributionCadence>().is_err());
    }
}

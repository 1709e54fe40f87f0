//! Aggregation of daily quotes into one observation per period.
//!
//! A period keeps the last available close and the sum of the dividends paid in it,
//! and is labelled with its last calendar day. Periods without any close are dropped.

use time::{Date, Duration};
use tracing::warn;

use crate::simulation::PriceObservation;

/// One trading day as delivered by a market-data source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyQuote {
    pub date: Date,
    /// Missing on days where only a dividend was recorded.
    pub close: Option<f64>,
    pub dividend: f64,
}

impl DailyQuote {
    pub fn new(date: Date, close: f64) -> Self {
        Self {
            date,
            close: Some(close),
            dividend: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Calendar months, labelled with the last day of the month.
    MonthEnd,
    /// Weeks ending on Sunday, labelled with that Sunday.
    WeekEnd,
}

impl Frequency {
    /// Label of the period `date` falls in.
    pub fn period_end(self, date: Date) -> Date {
        match self {
            Frequency::MonthEnd => month_end(date),
            Frequency::WeekEnd => {
                let offset = 6 - i64::from(date.weekday().number_days_from_monday());
                date.saturating_add(Duration::days(offset))
            }
        }
    }
}

fn month_end(date: Date) -> Date {
    let month = date.month();
    let year = if month == time::Month::December {
        date.year() + 1
    } else {
        date.year()
    };
    match Date::from_calendar_date(year, month.next(), 1) {
        Ok(first_of_next) => first_of_next.previous_day().unwrap_or(date),
        // Past the supported calendar range: the last representable day is the best label.
        Err(_) => Date::MAX,
    }
}

struct Bucket {
    end: Date,
    close: Option<f64>,
    dividends: f64,
}

impl Bucket {
    fn into_observation(self) -> Option<PriceObservation> {
        match self.close {
            Some(close) => Some(PriceObservation {
                timestamp: self.end,
                unit_price: close,
                distribution_per_unit: self.dividends,
            }),
            None => {
                warn!(period = %self.end, "dropping period without a close price");
                None
            }
        }
    }
}

/// Resamples `quotes` at `frequency`. Quotes need not be sorted.
pub fn resample(quotes: &[DailyQuote], frequency: Frequency) -> Vec<PriceObservation> {
    let mut sorted: Vec<&DailyQuote> = quotes.iter().collect();
    sorted.sort_by_key(|q| q.date);

    let mut observations = Vec::new();
    let mut current: Option<Bucket> = None;

    for quote in sorted {
        let end = frequency.period_end(quote.date);
        if current.as_ref().map_or(true, |bucket| bucket.end != end) {
            if let Some(done) = current.take().and_then(Bucket::into_observation) {
                observations.push(done);
            }
            current = Some(Bucket {
                end,
                close: None,
                dividends: 0.0,
            });
        }
        if let Some(bucket) = current.as_mut() {
            if let Some(close) = quote.close.filter(|c| c.is_finite()) {
                bucket.close = Some(close);
            }
            bucket.dividends += quote.dividend;
        }
    }
    if let Some(done) = current.and_then(Bucket::into_observation) {
        observations.push(done);
    }
    observations
}

use std::path::Path;

use polars::prelude::*;
use time::macros::format_description;
use time::Date;

use crate::error::{DcaError, Result};
use crate::resample::DailyQuote;

const DATE_COLUMNS: [&str; 3] = ["date", "Date", "timestamp"];
const CLOSE_COLUMNS: [&str; 2] = ["close", "Close"];
const DIVIDEND_COLUMNS: [&str; 3] = ["dividends", "Dividends", "dividend"];

/// Julian day number of 1970-01-01, the epoch of polars `Date` values.
const UNIX_EPOCH_JULIAN_DAY: i32 = 2_440_588;

/// Parses a quotes DataFrame into daily quotes sorted by date.
///
/// The input DF must include a date column (`date`, UTF8 in `YYYY-MM-DD` format or a
/// polars `Date`/`Datetime`) and a numeric `close` column. A `dividends` column is
/// optional; nulls in it count as 0. Null closes are kept as `None`.
///
/// # Errors
/// Returns an error if a required column is missing or a cell cannot be parsed.
pub fn parse_quotes_df(df: &DataFrame) -> Result<Vec<DailyQuote>> {
    let dates = find_column(df, &DATE_COLUMNS)
        .ok_or_else(|| DcaError::schema("missing date column"))?;
    let closes = find_column(df, &CLOSE_COLUMNS)
        .ok_or_else(|| DcaError::schema("missing close column"))?;
    let dividends = find_column(df, &DIVIDEND_COLUMNS);

    let mut quotes: Vec<DailyQuote> = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let date = cell_date(dates, i)?;
        let close = cell_f64(closes, i)?;
        let dividend = match dividends {
            Some(col) => cell_f64(col, i)?.unwrap_or(0.0),
            None => 0.0,
        };
        quotes.push(DailyQuote {
            date,
            close,
            dividend,
        });
    }

    // Stable sort, so the last row wins among duplicates.
    quotes.sort_by_key(|q| q.date);
    let mut deduped: Vec<DailyQuote> = Vec::with_capacity(quotes.len());
    for quote in quotes {
        match deduped.last_mut() {
            Some(last) if last.date == quote.date => *last = quote,
            _ => deduped.push(quote),
        }
    }
    Ok(deduped)
}

/// Reads a quotes CSV file (header row required) and parses it with [`parse_quotes_df`].
pub fn read_quotes_csv(path: impl AsRef<Path>) -> Result<Vec<DailyQuote>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    parse_quotes_df(&df)
}

/// Parses an ISO `YYYY-MM-DD` date; a trailing time part is ignored.
pub fn parse_date(value: &str) -> Result<Date> {
    let trimmed = value.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    Date::parse(day, format_description!("[year]-[month]-[day]"))
        .map_err(|e| DcaError::date_parse(value, e))
}

fn find_column<'a>(df: &'a DataFrame, candidates: &[&str]) -> Option<&'a Column> {
    candidates.iter().find_map(|name| df.column(name).ok())
}

fn cell_f64(col: &Column, i: usize) -> Result<Option<f64>> {
    let value = col.get(i)?;
    let parsed = match value {
        AnyValue::Null => return Ok(None),
        AnyValue::Float64(v) => Some(v),
        AnyValue::Int64(v) => Some(v as f64),
        ref other => other.extract::<f64>(),
    };
    match parsed {
        Some(v) => Ok(Some(v)),
        None => Err(DcaError::schema(format!(
            "column '{}' row {}: expected a number, got {}",
            col.name(),
            i,
            value
        ))),
    }
}

fn cell_date(col: &Column, i: usize) -> Result<Date> {
    let value = col.get(i)?;
    let days_since_epoch = match value {
        AnyValue::String(s) => return parse_date(s),
        AnyValue::StringOwned(ref s) => return parse_date(s.as_str()),
        AnyValue::Date(days) => days,
        AnyValue::Datetime(v, unit, _) => {
            let per_day: i64 = match unit {
                TimeUnit::Nanoseconds => 86_400_000_000_000,
                TimeUnit::Microseconds => 86_400_000_000,
                TimeUnit::Milliseconds => 86_400_000,
            };
            v.div_euclid(per_day) as i32
        }
        ref other => {
            return Err(DcaError::schema(format!(
                "column '{}' row {}: expected a date, got {}",
                col.name(),
                i,
                other
            )))
        }
    };
    Date::from_julian_day(UNIX_EPOCH_JULIAN_DAY + days_since_epoch)
        .map_err(|e| DcaError::date_parse(days_since_epoch.to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_parse_quotes_with_dividends() {
        let df = df!(
            "date" => ["2024-01-03", "2024-01-02", "2024-01-04"],
            "close" => [Some(11.0), Some(10.0), None],
            "dividends" => [Some(0.0), None, Some(0.5)],
        )
        .unwrap();
        let quotes = parse_quotes_df(&df).unwrap();
        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[0].date, date!(2024 - 01 - 02));
        assert_eq!(quotes[0].close, Some(10.0));
        assert_eq!(quotes[0].dividend, 0.0);
        assert_eq!(quotes[2].close, None);
        assert_eq!(quotes[2].dividend, 0.5);
    }

    #[test]
    fn test_dividends_column_is_optional() {
        let df = df!(
            "Date" => ["2024-01-02"],
            "Close" => [7i64],
        )
        .unwrap();
        let quotes = parse_quotes_df(&df).unwrap();
        assert_eq!(quotes, vec![DailyQuote::new(date!(2024 - 01 - 02), 7.0)]);
    }

    #[test]
    fn test_duplicate_dates_keep_last_row() {
        let df = df!(
            "date" => ["2024-01-02", "2024-01-02"],
            "close" => [1.0, 2.0],
        )
        .unwrap();
        let quotes = parse_quotes_df(&df).unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].close, Some(2.0));
    }

    #[test]
    fn test_missing_close_column() {
        let df = df!("date" => ["2024-01-02"], "open" => [1.0]).unwrap();
        assert!(matches!(parse_quotes_df(&df), Err(DcaError::Schema { .. })));
    }

    #[test]
    fn test_bad_date() {
        let df = df!("date" => ["02/01/2024"], "close" => [1.0]).unwrap();
        assert!(matches!(parse_quotes_df(&df), Err(DcaError::DateParse { .. })));
    }

    #[test]
    fn test_parse_date_ignores_time_part() {
        assert_eq!(
            parse_date("2023-07-14 00:00:00-04:00").unwrap(),
            date!(2023 - 07 - 14)
        );
    }
}

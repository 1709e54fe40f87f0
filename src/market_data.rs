//! Sources of daily price and dividend history for a ticker.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use time::Date;
use tracing::{debug, info};

use crate::error::{DcaError, Result};
use crate::input_handler::read_quotes_csv;
use crate::resample::DailyQuote;

/// Supplies the daily history a simulation is built from.
pub trait MarketDataSource {
    /// Display name of the instrument, falling back to the ticker itself.
    fn name(&self, ticker: &str) -> String;

    /// Daily quotes for `ticker` with `start <= date <= end`, sorted by date.
    ///
    /// # Errors
    /// [`DcaError::NoDataFound`] when no quote with a close price falls in the range.
    fn fetch(&self, ticker: &str, start: Date, end: Date) -> Result<Vec<DailyQuote>>;
}

/// Reads `<dir>/<TICKER>.csv` files, as exported from a market-data provider.
///
/// Characters outside `[A-Za-z0-9._-]` are stripped from the ticker to build the
/// file name, so `^GSPC` is read from `GSPC.csv`. Long names come from an optional
/// `<dir>/names.csv` with `ticker,name` columns.
#[derive(Debug, Clone)]
pub struct CsvMarketDataSource {
    dir: PathBuf,
}

impl CsvMarketDataSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", sanitize_ticker(ticker)))
    }

    fn lookup_name(&self, names_path: &Path, ticker: &str) -> Result<Option<String>> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(names_path.to_path_buf()))?
            .finish()?;
        let tickers = df.column("ticker")?.str()?;
        let names = df.column("name")?.str()?;
        for i in 0..df.height() {
            if tickers.get(i).map(str::trim) == Some(ticker) {
                return Ok(names.get(i).map(|n| n.trim().to_string()));
            }
        }
        Ok(None)
    }
}

impl MarketDataSource for CsvMarketDataSource {
    fn name(&self, ticker: &str) -> String {
        let names_path = self.dir.join("names.csv");
        if !names_path.exists() {
            return ticker.to_string();
        }
        match self.lookup_name(&names_path, ticker) {
            Ok(Some(name)) if !name.is_empty() => name,
            Ok(_) => ticker.to_string(),
            Err(e) => {
                debug!(error = %e, "could not read instrument names");
                ticker.to_string()
            }
        }
    }

    fn fetch(&self, ticker: &str, start: Date, end: Date) -> Result<Vec<DailyQuote>> {
        if start > end {
            return Err(DcaError::invalid_parameter(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        let path = self.path_for(ticker);
        info!(ticker, path = %path.display(), %start, %end, "loading quotes");
        let quotes = read_quotes_csv(&path)?;
        in_range(quotes, ticker, start, end)
    }
}

/// Keeps the quotes inside `[start, end]`, failing when none of them has a close.
pub fn in_range(
    quotes: Vec<DailyQuote>,
    ticker: &str,
    start: Date,
    end: Date,
) -> Result<Vec<DailyQuote>> {
    let selected: Vec<DailyQuote> = quotes
        .into_iter()
        .filter(|q| q.date >= start && q.date <= end)
        .collect();
    if !selected.iter().any(|q| q.close.is_some()) {
        return Err(DcaError::NoDataFound {
            ticker: ticker.to_string(),
            start,
            end,
        });
    }
    debug!(ticker, quotes = selected.len(), "quotes in range");
    Ok(selected)
}

fn sanitize_ticker(ticker: &str) -> String {
    ticker
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use time::macros::date;

    fn write(dir: &Path, file: &str, contents: &str) {
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_sanitize_ticker() {
        assert_eq!(sanitize_ticker("^GSPC"), "GSPC");
        assert_eq!(sanitize_ticker("BRK.B"), "BRK.B");
        assert_eq!(sanitize_ticker("../etc"), "..etc");
    }

    #[test]
    fn test_fetch_filters_inclusive_range() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "SPY.csv",
            "date,close,dividends\n2024-01-02,10.0,0\n2024-01-03,11.0,0\n2024-01-04,12.0,0.5\n2024-01-05,13.0,0\n",
        );
        let source = CsvMarketDataSource::new(dir.path());
        let quotes = source
            .fetch("SPY", date!(2024 - 01 - 03), date!(2024 - 01 - 04))
            .unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].close, Some(11.0));
        assert_eq!(quotes[1].dividend, 0.5);
    }

    #[test]
    fn test_fetch_empty_range_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "GSPC.csv", "date,close\n2024-01-02,10.0\n");
        let source = CsvMarketDataSource::new(dir.path());
        let err = source
            .fetch("^GSPC", date!(2025 - 01 - 01), date!(2025 - 12 - 31))
            .unwrap_err();
        assert!(matches!(err, DcaError::NoDataFound { .. }));
    }

    #[test]
    fn test_fetch_rejects_inverted_range() {
        let source = CsvMarketDataSource::new("unused");
        let err = source
            .fetch("SPY", date!(2025 - 01 - 01), date!(2024 - 01 - 01))
            .unwrap_err();
        assert!(matches!(err, DcaError::InvalidParameter { .. }));
    }

    #[test]
    fn test_dividend_only_range_is_no_data() {
        let quotes = vec![DailyQuote {
            date: date!(2024 - 01 - 02),
            close: None,
            dividend: 1.0,
        }];
        let err = in_range(quotes, "X", date!(2024 - 01 - 01), date!(2024 - 01 - 31)).unwrap_err();
        assert!(matches!(err, DcaError::NoDataFound { .. }));
    }

    #[test]
    fn test_name_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "names.csv",
            "ticker,name\n^GSPC,S&P 500\n^FCHI,CAC 40\n",
        );
        let source = CsvMarketDataSource::new(dir.path());
        assert_eq!(source.name("^FCHI"), "CAC 40");
        assert_eq!(source.name("AAPL"), "AAPL");
        assert_eq!(CsvMarketDataSource::new("missing-dir").name("QQQ"), "QQQ");
    }
}

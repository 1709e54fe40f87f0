use polars::prelude::*;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3_polars::PyDataFrame;

use crate::input_handler::parse_quotes_df;
use crate::output::records_to_df;
use crate::resample::resample;
use crate::simulation::{ContributionCadence, DcaSimulator};
use crate::summary::SimulationSummary;

/// Python wrapper for the Rust DCA simulator
#[pyclass]
struct PyDcaSimulator {
    inner: DcaSimulator,
}

#[pymethods]
impl PyDcaSimulator {
    /// Create a simulator investing `amount` every month, fed with `monthly` or `weekly` observations
    #[new]
    #[pyo3(signature = (amount, cadence = "monthly"))]
    fn new(amount: f64, cadence: &str) -> PyResult<Self> {
        let cadence: ContributionCadence = cadence.parse()?;
        Ok(PyDcaSimulator {
            inner: DcaSimulator::new(amount, cadence)?,
        })
    }

    /// Run the simulation over daily quotes from Python
    ///
    /// Args:
    ///     quotes_df: Polars DataFrame with a `date` column (YYYY-MM-DD), a `close`
    ///         column and an optional `dividends` column
    ///
    /// Returns:
    ///     Tuple containing:
    ///     - Polars DataFrame with one row per resampled period
    ///     - Dictionary with the final summary
    #[pyo3(text_signature = "(self, quotes_df)")]
    fn run<'py>(
        &self,
        py: Python<'py>,
        quotes_df: PyDataFrame,
    ) -> PyResult<(PyDataFrame, Py<PyDict>)> {
        let quotes_df: DataFrame = quotes_df.as_ref().clone();
        let quotes = parse_quotes_df(&quotes_df)?;
        let observations = resample(&quotes, self.inner.cadence.frequency());
        let records = self.inner.run(&observations)?;
        let results_df = records_to_df(&records)?;

        let summary_dict = PyDict::new(py);
        if let Some(summary) = SimulationSummary::from_records(&records) {
            summary_dict.set_item("final_date", summary.final_timestamp.to_string())?;
            summary_dict.set_item("periods", summary.periods)?;
            summary_dict.set_item("contributions", summary.contributions)?;
            summary_dict.set_item("total_invested", summary.total_invested)?;
            summary_dict.set_item("final_value", summary.final_value)?;
            summary_dict.set_item("unrealized_gain", summary.unrealized_gain)?;
            summary_dict.set_item("total_distributions", summary.total_distributions)?;
            summary_dict.set_item("roi_pct", summary.roi_pct)?;
        }

        Ok((PyDataFrame(results_df), summary_dict.into()))
    }
}

/// A Python module implemented in Rust using PyO3.
#[pymodule]
fn dca_simulator(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDcaSimulator>()?;
    Ok(())
}

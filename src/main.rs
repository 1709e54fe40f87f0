use dca_simulator::config::Config;
use dca_simulator::output::write_records_csv;
use dca_simulator::report::Report;
use dca_simulator::{simulate_from_source, CsvMarketDataSource, SimulationRequest};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() {
    let log_format = std::env::var("DCA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::load();
    init_tracing();
    config.validate()?;

    let source = CsvMarketDataSource::new(config.data_dir.clone());
    let request = SimulationRequest {
        ticker: config.ticker.clone(),
        start: config.start,
        end: config.end_date(),
        contribution_amount: config.amount,
        cadence: config.cadence,
    };
    tracing::info!(
        ticker = %request.ticker,
        start = %request.start,
        end = %request.end,
        "simulating {} {} contributions",
        request.cadence,
        config.amount
    );

    let mut run = simulate_from_source(&source, &request)?;
    if run.asset_name == config.ticker {
        if let Some(name) = &config.name {
            run.asset_name = name.clone();
        }
    }

    let output = config.output_path();
    write_records_csv(&run.records, &output)?;

    println!(
        "{}",
        Report {
            asset_name: &run.asset_name,
            currency: &config.currency,
            summary: &run.summary,
        }
    );
    Ok(())
}

//! PV-plus-battery simulator entry point: CLI wiring and config-driven runs.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pv_battery_sim::config::ScenarioConfig;
use pv_battery_sim::io::export::{export_sizing_csv, export_trace_csv};
use pv_battery_sim::io::import::read_series_from_path;
use pv_battery_sim::sim::dispatch::simulate;
use pv_battery_sim::sim::metrics::Metrics;
use pv_battery_sim::sim::monthly::monthly_breakdown;
use pv_battery_sim::sim::sizing::size_battery;

/// Simulate a PV-plus-battery system on an hourly PV/load series and size the battery.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Hourly CSV with `timestamp,pv_kw,load_kw` columns.
    #[arg(long)]
    input: PathBuf,

    /// Load scenario from a TOML file.
    #[arg(long, conflicts_with = "preset")]
    scenario: Option<PathBuf>,

    /// Use a built-in preset (reference, reserve, coarse).
    #[arg(long)]
    preset: Option<String>,

    /// Override the battery capacity (kWh).
    #[arg(long)]
    capacity: Option<f64>,

    /// Export the hourly battery trace to CSV.
    #[arg(long)]
    trace_out: Option<PathBuf>,

    /// Export the sizing evaluations to CSV.
    #[arg(long)]
    sizing_out: Option<PathBuf>,

    /// Run only the single-capacity simulation.
    #[arg(long)]
    skip_sizing: bool,

    /// Print the calendar-month breakdown.
    #[arg(long)]
    monthly: bool,
}

fn load_scenario(args: &Args) -> anyhow::Result<ScenarioConfig> {
    let mut scenario = match (&args.scenario, &args.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::reference(),
    };
    if let Some(capacity_kwh) = args.capacity {
        scenario.battery.capacity_kwh = capacity_kwh;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        bail!("scenario has {} invalid field(s)", errors.len());
    }
    Ok(scenario)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();

    let args = Args::parse();
    let scenario = load_scenario(&args)?;

    let series = read_series_from_path(&args.input)
        .with_context(|| format!("failed to load \"{}\"", args.input.display()))?;
    let params = scenario.battery_parameters()?;

    let trace = simulate(&series, &params);
    println!("{}", Metrics::from_trace(&series, &trace));

    if args.monthly {
        println!("\n--- Monthly Breakdown (kWh) ---");
        for month in monthly_breakdown(&series, &trace) {
            println!("{month}");
        }
    }

    if let Some(path) = &args.trace_out {
        export_trace_csv(&series, &trace, path)
            .with_context(|| format!("failed to write trace to \"{}\"", path.display()))?;
        info!(path = %path.display(), "trace written");
    }

    if args.skip_sizing {
        return Ok(());
    }

    let sizing = scenario.sizing_config()?;
    let report = size_battery(&series, &params, &sizing)?;
    println!("\n{report}");
    if report.is_exhausted() {
        println!("Consider a larger battery range or a hybrid supply.");
    }

    if let Some(path) = &args.sizing_out {
        export_sizing_csv(&report, path)
            .with_context(|| format!("failed to write sizing table to \"{}\"", path.display()))?;
        info!(path = %path.display(), "sizing table written");
    }

    Ok(())
}

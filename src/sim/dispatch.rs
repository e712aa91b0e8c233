//! Hour-by-hour battery dispatch over a PV/load series.

use crate::series::HourlyRecord;

use super::battery::BatteryState;
use super::types::{BatteryParameters, SimulationTrace};

/// Simulates the battery over `records` and returns the per-hour trace.
///
/// The run starts from an empty battery and carries the state of charge
/// from each hour into the next, so records must be in timestamp order. The
/// result has exactly one [`HourOutcome`](super::types::HourOutcome) per
/// record and depends only on the arguments.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDateTime;
/// use pv_battery_sim::series::HourlySeries;
/// use pv_battery_sim::sim::dispatch::simulate;
/// use pv_battery_sim::sim::types::BatteryParameters;
///
/// let start = NaiveDateTime::default();
/// let series = HourlySeries::from_pv_load(start, &[10.0, 0.0], &[0.0, 8.0]).expect("hourly series");
/// let params = BatteryParameters::new(50.0, 0.9, 0.8).expect("valid parameters");
///
/// let trace = simulate(&series, &params);
/// assert_eq!(trace.len(), 2);
/// assert!(trace.total_unmet_load_kwh() < 1e-9);
/// ```
pub fn simulate(records: &[HourlyRecord], params: &BatteryParameters) -> SimulationTrace {
    let hours = records
        .iter()
        .scan(BatteryState::empty(), |state, r| {
            Some(state.step(r.surplus_kw, r.deficit_kw, params))
        })
        .collect();
    SimulationTrace::new(params.capacity_kwh(), hours)
}

/// Simulates only to obtain the total unmet load (kWh).
///
/// Same transition as [`simulate`] without materialising the trace.
pub fn total_unmet_load_kwh(records: &[HourlyRecord], params: &BatteryParameters) -> f64 {
    let mut state = BatteryState::empty();
    records
        .iter()
        .map(|r| state.step(r.surplus_kw, r.deficit_kw, params).unmet_load_kwh)
        .sum()
}

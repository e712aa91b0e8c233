//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pv_battery_sim::series::HourlySeries;
use pv_battery_sim::sim::types::BatteryParameters;

/// Midnight, 1 January 2023.
pub fn year_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

/// Reference battery (90% efficiency, 80% usable) with the given capacity.
pub fn reference_params(capacity_kwh: f64) -> BatteryParameters {
    BatteryParameters::new(capacity_kwh, 0.9, 0.8).expect("reference parameters are valid")
}

/// Builds a series of consecutive hours from `(surplus, deficit)` pairs.
///
/// Each pair becomes one hour with `pv = surplus` and `load = deficit`, so
/// the derived surplus and deficit match the pair exactly.
pub fn surplus_deficit_series(hours: &[(f64, f64)]) -> HourlySeries {
    let pv: Vec<f64> = hours.iter().map(|&(s, _)| s).collect();
    let load: Vec<f64> = hours.iter().map(|&(_, d)| d).collect();
    HourlySeries::from_pv_load(year_start(), &pv, &load).expect("fixture series is valid")
}

/// A synthetic year (8760 hours) of seasonal PV and a household-style load.
///
/// PV follows a daylight bell scaled by season (10 kWp, summer peak);
/// load has a base, a morning and an evening bump, and seeded noise.
pub fn synthetic_year(seed: u64) -> HourlySeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let hours = 8760;
    let mut pv = Vec::with_capacity(hours);
    let mut load = Vec::with_capacity(hours);
    for t in 0..hours {
        let day = (t / 24) as f64;
        let hour = (t % 24) as f64;
        let season = 0.55 - 0.45 * (2.0 * std::f64::consts::PI * (day + 10.0) / 365.0).cos();
        let daylight = ((hour - 6.0) / 12.0 * std::f64::consts::PI).sin().max(0.0);
        let cloud = 0.6 + 0.4 * rng.random::<f64>();
        pv.push(10.0 * 0.75 * season * daylight * cloud);

        let morning = if (6.0..9.0).contains(&hour) { 1.0 } else { 0.0 };
        let evening = if (17.0..22.0).contains(&hour) { 2.0 } else { 0.0 };
        load.push(0.6 + morning + evening + 0.3 * rng.random::<f64>());
    }
    HourlySeries::from_pv_load(year_start(), &pv, &load).expect("synthetic year is valid")
}

/// Repeating days of midday surplus (30 kWh) and evening deficit (12 kWh).
pub fn daily_cycle(days: usize) -> HourlySeries {
    let mut hours = Vec::with_capacity(days * 24);
    for _ in 0..days {
        for h in 0..24 {
            let pair = if (9..15).contains(&h) {
                (5.0, 0.0)
            } else if (18..22).contains(&h) {
                (0.0, 3.0)
            } else {
                (0.0, 0.0)
            };
            hours.push(pair);
        }
    }
    surplus_deficit_series(&hours)
}

//! Post-hoc system metrics computed from a simulation trace.

use std::fmt;

use crate::series::HourlyRecord;

use super::types::SimulationTrace;

/// A ratio that may be undefined because its denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Defined(f64),
    /// Zero denominator (no PV or no load over the series).
    Undefined,
}

impl Ratio {
    /// `numerator / denominator`, or [`Ratio::Undefined`] when the denominator is zero.
    pub fn of(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            Self::Undefined
        } else {
            Self::Defined(numerator / denominator)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(v) => write!(f, "{:.1}%", v * 100.0),
            Self::Undefined => f.write_str("undefined"),
        }
    }
}

/// Energy totals and ratios for one simulated battery.
///
/// Computed from the source records and the trace without mutating either.
/// All energies are kWh over the whole series.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub capacity_kwh: f64,
    pub total_pv_kwh: f64,
    pub total_load_kwh: f64,
    /// PV consumed directly by the load.
    pub total_on_site_use_kwh: f64,
    /// Battery energy delivered to the load.
    pub total_battery_used_kwh: f64,
    pub total_unmet_load_kwh: f64,
    /// Charge energy discarded because the battery was full.
    pub total_curtailed_kwh: f64,
    /// `(on_site + battery) / pv`.
    pub self_consumption: Ratio,
    /// `(on_site + battery) / load`.
    pub self_sufficiency: Ratio,
    /// `on_site / pv`, i.e. without a battery.
    pub baseline_self_consumption: Ratio,
    /// `on_site / load`, i.e. without a battery.
    pub baseline_self_sufficiency: Ratio,
}

impl Metrics {
    /// Reduces the records and their trace into scalar metrics.
    ///
    /// Records and trace are paired index-for-index, so `trace` must come
    /// from simulating `records`. An empty series yields zero totals and
    /// undefined ratios.
    pub fn from_trace(records: &[HourlyRecord], trace: &SimulationTrace) -> Self {
        debug_assert_eq!(records.len(), trace.len(), "trace does not match records");
        let mut pv = 0.0;
        let mut load = 0.0;
        let mut on_site = 0.0;
        for r in records {
            pv += r.pv_kw;
            load += r.load_kw;
            on_site += r.on_site_use_kw();
        }
        let battery = trace.total_battery_used_kwh();
        let supplied = on_site + battery;

        Self {
            capacity_kwh: trace.capacity_kwh(),
            total_pv_kwh: pv,
            total_load_kwh: load,
            total_on_site_use_kwh: on_site,
            total_battery_used_kwh: battery,
            total_unmet_load_kwh: trace.total_unmet_load_kwh(),
            total_curtailed_kwh: trace.total_curtailed_kwh(),
            self_consumption: Ratio::of(supplied, pv),
            self_sufficiency: Ratio::of(supplied, load),
            baseline_self_consumption: Ratio::of(on_site, pv),
            baseline_self_sufficiency: Ratio::of(on_site, load),
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Battery & Storage Metrics ---")?;
        writeln!(f, "Battery capacity:      {:.1} kWh", self.capacity_kwh)?;
        writeln!(f, "PV production:         {:.2} kWh", self.total_pv_kwh)?;
        writeln!(f, "Load:                  {:.2} kWh", self.total_load_kwh)?;
        writeln!(f, "On-site PV use:        {:.2} kWh", self.total_on_site_use_kwh)?;
        writeln!(f, "Supplied by battery:   {:.2} kWh", self.total_battery_used_kwh)?;
        writeln!(f, "Unmet load:            {:.2} kWh", self.total_unmet_load_kwh)?;
        writeln!(f, "Curtailed charge:      {:.2} kWh", self.total_curtailed_kwh)?;
        writeln!(
            f,
            "Self-consumption:      {} (without battery: {})",
            self.self_consumption, self.baseline_self_consumption
        )?;
        write!(
            f,
            "Self-sufficiency:      {} (without battery: {})",
            self.self_sufficiency, self.baseline_self_sufficiency
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDateTime;

    use super::*;
    use crate::series::HourlySeries;
    use crate::sim::dispatch::simulate;
    use crate::sim::types::BatteryParameters;

    fn params(capacity_kwh: f64) -> BatteryParameters {
        BatteryParameters::new(capacity_kwh, 0.9, 0.8).unwrap_or_else(|e| panic!("{e}"))
    }

    fn series(pv: &[f64], load: &[f64]) -> HourlySeries {
        HourlySeries::from_pv_load(NaiveDateTime::default(), pv, load)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn ratio_of_zero_denominator_is_undefined() {
        assert_eq!(Ratio::of(1.0, 0.0), Ratio::Undefined);
        assert_eq!(Ratio::of(0.0, 0.0), Ratio::Undefined);
        assert_eq!(Ratio::of(1.0, 4.0), Ratio::Defined(0.25));
        assert_eq!(Ratio::Undefined.value(), None);
        assert_eq!(format!("{}", Ratio::Defined(0.5)), "50.0%");
        assert_eq!(format!("{}", Ratio::Undefined), "undefined");
    }

    #[test]
    fn totals_and_ratios() {
        // Hour 0: pv 10, load 2 -> on-site 2, surplus 8 -> stored 7.2
        // Hour 1: pv 1, load 5 -> on-site 1, deficit 4 -> battery 4
        let s = series(&[10.0, 1.0], &[2.0, 5.0]);
        let trace = simulate(&s, &params(50.0));
        let m = Metrics::from_trace(&s, &trace);

        assert_relative_eq!(m.total_pv_kwh, 11.0);
        assert_relative_eq!(m.total_load_kwh, 7.0);
        assert_relative_eq!(m.total_on_site_use_kwh, 3.0);
        assert_relative_eq!(m.total_battery_used_kwh, 4.0, epsilon = 1e-9);
        assert!(m.total_unmet_load_kwh.abs() < 1e-9);
        assert_relative_eq!(m.self_consumption.value().unwrap_or(f64::NAN), 7.0 / 11.0, epsilon = 1e-9);
        assert_relative_eq!(m.self_sufficiency.value().unwrap_or(f64::NAN), 1.0, epsilon = 1e-9);
        assert_relative_eq!(m.baseline_self_sufficiency.value().unwrap_or(f64::NAN), 3.0 / 7.0);
    }

    #[test]
    fn empty_series_gives_zeros_and_undefined_ratios() {
        let trace = simulate(&[], &params(50.0));
        let m = Metrics::from_trace(&[], &trace);
        assert_eq!(m.total_pv_kwh, 0.0);
        assert_eq!(m.total_unmet_load_kwh, 0.0);
        assert_eq!(m.self_consumption, Ratio::Undefined);
        assert_eq!(m.self_sufficiency, Ratio::Undefined);
    }

    #[test]
    fn no_pv_makes_self_consumption_undefined() {
        let s = series(&[0.0, 0.0], &[1.0, 2.0]);
        let trace = simulate(&s, &params(10.0));
        let m = Metrics::from_trace(&s, &trace);
        assert_eq!(m.self_consumption, Ratio::Undefined);
        assert_eq!(m.self_sufficiency, Ratio::Defined(0.0));
        assert_relative_eq!(m.total_unmet_load_kwh, 3.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "trace does not match records")]
    fn mismatched_trace_is_caught() {
        let s = series(&[10.0, 1.0], &[2.0, 5.0]);
        let other = series(&[10.0], &[2.0]);
        let trace = simulate(&other, &params(50.0));
        Metrics::from_trace(&s, &trace);
    }

    #[test]
    fn display_does_not_panic() {
        let s = series(&[3.0], &[1.0]);
        let trace = simulate(&s, &params(10.0));
        let text = format!("{}", Metrics::from_trace(&s, &trace));
        assert!(text.contains("Self-sufficiency:"));
    }
}

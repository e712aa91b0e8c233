//! Core simulation types: battery parameters, per-hour outcomes, and traces.

use std::fmt;
use std::ops::Deref;

use serde::Deserialize;
use thiserror::Error;

/// How the usable (depth-of-discharge) fraction shapes the dispatch window.
///
/// The per-hour transition only reads the SoC ceiling and floor derived from
/// this policy, so switching policies never touches the dispatch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsablePolicy {
    /// The fraction is carried but not applied: SoC spans `[0, capacity]`.
    #[default]
    Ignored,
    /// SoC is capped at `capacity * usable_fraction`.
    ChargeCeiling,
    /// Discharge stops at `capacity * (1 - usable_fraction)`.
    DischargeFloor,
}

impl fmt::Display for UsablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ignored => "ignored",
            Self::ChargeCeiling => "charge_ceiling",
            Self::DischargeFloor => "discharge_floor",
        };
        f.write_str(name)
    }
}

/// Battery parameters rejected before any simulation work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("round_trip_efficiency must be in (0, 1], got {0}")]
    Efficiency(f64),
    #[error("usable_fraction must be in (0, 1], got {0}")]
    UsableFraction(f64),
    #[error("capacity_kwh must be a finite number, got {0}")]
    Capacity(f64),
}

/// Validated battery parameters for one simulation run.
///
/// `round_trip_efficiency` is applied once on the charge path and once on the
/// discharge path, so the effective storage loss is `efficiency²`.
///
/// A capacity of zero (or below) is a supported degenerate battery that never
/// stores energy; negative values are normalised to zero.
///
/// # Examples
///
/// ```
/// use pv_battery_sim::sim::types::BatteryParameters;
///
/// let params = BatteryParameters::new(50.0, 0.9, 0.8);
/// assert!(params.is_ok());
/// assert!(BatteryParameters::new(50.0, 1.2, 0.8).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryParameters {
    capacity_kwh: f64,
    round_trip_efficiency: f64,
    usable_fraction: f64,
    usable_policy: UsablePolicy,
}

impl BatteryParameters {
    /// Creates parameters with the default [`UsablePolicy::Ignored`] policy.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] if the efficiency or usable fraction is
    /// outside `(0, 1]`, or the capacity is not finite.
    pub fn new(
        capacity_kwh: f64,
        round_trip_efficiency: f64,
        usable_fraction: f64,
    ) -> Result<Self, ParameterError> {
        if !(round_trip_efficiency > 0.0 && round_trip_efficiency <= 1.0) {
            return Err(ParameterError::Efficiency(round_trip_efficiency));
        }
        if !(usable_fraction > 0.0 && usable_fraction <= 1.0) {
            return Err(ParameterError::UsableFraction(usable_fraction));
        }
        Ok(Self {
            capacity_kwh: normalise_capacity(capacity_kwh)?,
            round_trip_efficiency,
            usable_fraction,
            usable_policy: UsablePolicy::default(),
        })
    }

    /// Returns a copy using the given usable-fraction policy.
    pub fn with_policy(self, usable_policy: UsablePolicy) -> Self {
        Self {
            usable_policy,
            ..self
        }
    }

    /// Returns a copy with a different capacity, keeping efficiency and policy.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Capacity`] if `capacity_kwh` is not finite.
    pub fn with_capacity(self, capacity_kwh: f64) -> Result<Self, ParameterError> {
        Ok(Self {
            capacity_kwh: normalise_capacity(capacity_kwh)?,
            ..self
        })
    }

    /// Nominal capacity (kWh, >= 0).
    pub fn capacity_kwh(&self) -> f64 {
        self.capacity_kwh
    }

    /// One-way efficiency applied on each of charge and discharge.
    pub fn round_trip_efficiency(&self) -> f64 {
        self.round_trip_efficiency
    }

    /// Usable (depth-of-discharge) fraction.
    pub fn usable_fraction(&self) -> f64 {
        self.usable_fraction
    }

    pub fn usable_policy(&self) -> UsablePolicy {
        self.usable_policy
    }

    /// Highest SoC the charge step may reach (kWh).
    pub fn soc_ceiling_kwh(&self) -> f64 {
        match self.usable_policy {
            UsablePolicy::ChargeCeiling => self.capacity_kwh * self.usable_fraction,
            UsablePolicy::Ignored | UsablePolicy::DischargeFloor => self.capacity_kwh,
        }
    }

    /// Lowest SoC the discharge step may leave behind (kWh).
    pub fn soc_floor_kwh(&self) -> f64 {
        match self.usable_policy {
            UsablePolicy::DischargeFloor => self.capacity_kwh * (1.0 - self.usable_fraction),
            UsablePolicy::Ignored | UsablePolicy::ChargeCeiling => 0.0,
        }
    }
}

fn normalise_capacity(capacity_kwh: f64) -> Result<f64, ParameterError> {
    if capacity_kwh.is_finite() {
        Ok(capacity_kwh.max(0.0))
    } else {
        Err(ParameterError::Capacity(capacity_kwh))
    }
}

/// Battery activity for one hour of the series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HourOutcome {
    /// State of charge at the end of the hour (kWh).
    pub soc_kwh: f64,
    /// Energy delivered to the load by the battery (kWh, after losses).
    pub battery_used_kwh: f64,
    /// Deficit neither PV nor battery could cover (kWh).
    pub unmet_load_kwh: f64,
    /// Charge energy discarded because the battery was full (kWh, after losses).
    pub curtailed_kwh: f64,
}

impl fmt::Display for HourOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "soc={:>7.3} kWh  battery={:>6.3} kWh  unmet={:>6.3} kWh  curtailed={:>6.3} kWh",
            self.soc_kwh, self.battery_used_kwh, self.unmet_load_kwh, self.curtailed_kwh,
        )
    }
}

/// Per-hour simulation output, aligned index-for-index with the input series.
///
/// Derefs to `[HourOutcome]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationTrace {
    capacity_kwh: f64,
    hours: Vec<HourOutcome>,
}

impl SimulationTrace {
    pub(crate) fn new(capacity_kwh: f64, hours: Vec<HourOutcome>) -> Self {
        Self {
            capacity_kwh,
            hours,
        }
    }

    /// Capacity the trace was simulated with (kWh).
    pub fn capacity_kwh(&self) -> f64 {
        self.capacity_kwh
    }

    pub fn hours(&self) -> &[HourOutcome] {
        &self.hours
    }

    /// Sum of battery energy delivered to the load (kWh).
    pub fn total_battery_used_kwh(&self) -> f64 {
        self.hours.iter().map(|h| h.battery_used_kwh).sum()
    }

    /// Sum of unmet load over the trace (kWh).
    pub fn total_unmet_load_kwh(&self) -> f64 {
        self.hours.iter().map(|h| h.unmet_load_kwh).sum()
    }

    /// Sum of curtailed charge energy (kWh).
    pub fn total_curtailed_kwh(&self) -> f64 {
        self.hours.iter().map(|h| h.curtailed_kwh).sum()
    }

    /// Highest state of charge reached (kWh), zero for an empty trace.
    pub fn peak_soc_kwh(&self) -> f64 {
        self.hours.iter().map(|h| h.soc_kwh).fold(0.0, f64::max)
    }
}

impl Deref for SimulationTrace {
    type Target = [HourOutcome];

    fn deref(&self) -> &Self::Target {
        &self.hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_parameters() {
        let p = BatteryParameters::new(50.0, 0.9, 0.8);
        assert!(p.is_ok());
        let p = p.ok();
        assert_eq!(p.map(|p| p.capacity_kwh()), Some(50.0));
        assert_eq!(p.map(|p| p.usable_policy()), Some(UsablePolicy::Ignored));
    }

    #[test]
    fn efficiency_bounds() {
        assert_eq!(
            BatteryParameters::new(10.0, 0.0, 0.8),
            Err(ParameterError::Efficiency(0.0))
        );
        assert_eq!(
            BatteryParameters::new(10.0, 1.01, 0.8),
            Err(ParameterError::Efficiency(1.01))
        );
        assert!(BatteryParameters::new(10.0, 1.0, 0.8).is_ok());
        assert!(BatteryParameters::new(10.0, f64::NAN, 0.8).is_err());
    }

    #[test]
    fn usable_fraction_bounds() {
        assert_eq!(
            BatteryParameters::new(10.0, 0.9, 0.0),
            Err(ParameterError::UsableFraction(0.0))
        );
        assert!(BatteryParameters::new(10.0, 0.9, 1.5).is_err());
        assert!(BatteryParameters::new(10.0, 0.9, 1.0).is_ok());
    }

    #[test]
    fn zero_and_negative_capacity_are_degenerate() {
        let zero = BatteryParameters::new(0.0, 0.9, 0.8);
        assert_eq!(zero.map(|p| p.capacity_kwh()), Ok(0.0));
        let negative = BatteryParameters::new(-5.0, 0.9, 0.8);
        assert_eq!(negative.map(|p| p.capacity_kwh()), Ok(0.0));
        assert!(BatteryParameters::new(f64::INFINITY, 0.9, 0.8).is_err());
    }

    #[test]
    fn policy_window() {
        let base = BatteryParameters::new(10.0, 0.9, 0.8).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(base.soc_ceiling_kwh(), 10.0);
        assert_eq!(base.soc_floor_kwh(), 0.0);

        let ceiling = base.with_policy(UsablePolicy::ChargeCeiling);
        assert_eq!(ceiling.soc_ceiling_kwh(), 8.0);
        assert_eq!(ceiling.soc_floor_kwh(), 0.0);

        let floor = base.with_policy(UsablePolicy::DischargeFloor);
        assert_eq!(floor.soc_ceiling_kwh(), 10.0);
        assert!((floor.soc_floor_kwh() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn with_capacity_keeps_policy() {
        let base = BatteryParameters::new(10.0, 0.9, 0.8)
            .map(|p| p.with_policy(UsablePolicy::DischargeFloor))
            .and_then(|p| p.with_capacity(40.0));
        let base = base.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(base.capacity_kwh(), 40.0);
        assert_eq!(base.usable_policy(), UsablePolicy::DischargeFloor);
    }

    #[test]
    fn trace_totals() {
        let hours = vec![
            HourOutcome {
                soc_kwh: 3.0,
                battery_used_kwh: 0.0,
                unmet_load_kwh: 0.0,
                curtailed_kwh: 1.0,
            },
            HourOutcome {
                soc_kwh: 1.0,
                battery_used_kwh: 1.8,
                unmet_load_kwh: 0.5,
                curtailed_kwh: 0.0,
            },
        ];
        let trace = SimulationTrace::new(3.0, hours);
        assert_eq!(trace.len(), 2);
        assert!((trace.total_battery_used_kwh() - 1.8).abs() < 1e-12);
        assert!((trace.total_unmet_load_kwh() - 0.5).abs() < 1e-12);
        assert!((trace.total_curtailed_kwh() - 1.0).abs() < 1e-12);
        assert_eq!(trace.peak_soc_kwh(), 3.0);
    }

    #[test]
    fn hour_outcome_display_does_not_panic() {
        let s = format!("{}", HourOutcome::default());
        assert!(!s.is_empty());
    }
}

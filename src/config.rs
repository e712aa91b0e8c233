//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::sim::sizing::{
    DEFAULT_TOLERANCE_KWH, MAX_CANDIDATES, SearchStrategy, SizingConfig, range_steps,
};
use crate::sim::types::{BatteryParameters, UsablePolicy};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the reference scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::reference`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Battery used for the single dispatch run.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Capacity search range and tolerance.
    #[serde(default)]
    pub sizing: SizingSection,
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Nominal capacity (kWh).
    pub capacity_kwh: f64,
    /// Efficiency applied once per direction (0.0–1.0].
    pub round_trip_efficiency: f64,
    /// Usable fraction of capacity (0.0–1.0].
    pub usable_fraction: f64,
    /// How `usable_fraction` constrains the state of charge.
    pub usable_policy: UsablePolicy,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 50.0,
            round_trip_efficiency: 0.90,
            usable_fraction: 0.80,
            usable_policy: UsablePolicy::Ignored,
        }
    }
}

/// Capacity search parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingSection {
    /// Smallest candidate capacity (kWh).
    pub min_kwh: f64,
    /// Largest candidate capacity, inclusive (kWh).
    pub max_kwh: f64,
    /// Spacing between candidates (kWh).
    pub step_kwh: f64,
    /// Annual unmet load considered negligible (kWh, inclusive).
    pub tolerance_kwh: f64,
    /// Candidate evaluation order.
    pub strategy: SearchStrategy,
}

impl Default for SizingSection {
    fn default() -> Self {
        Self {
            min_kwh: 10.0,
            max_kwh: 200.0,
            step_kwh: 10.0,
            tolerance_kwh: DEFAULT_TOLERANCE_KWH,
            strategy: SearchStrategy::Linear,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.round_trip_efficiency"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the reference scenario: 50 kWh battery, 90% efficiency,
    /// search 10–200 kWh in 10 kWh steps with a 1 kWh tolerance.
    pub fn reference() -> Self {
        Self::default()
    }

    /// Returns the reserve preset: usable fraction enforced as a discharge floor.
    pub fn reserve() -> Self {
        Self {
            battery: BatteryConfig {
                usable_policy: UsablePolicy::DischargeFloor,
                ..BatteryConfig::default()
            },
            sizing: SizingSection::default(),
        }
    }

    /// Returns the coarse preset: wide range, 25 kWh steps, binary search.
    pub fn coarse() -> Self {
        Self {
            battery: BatteryConfig::default(),
            sizing: SizingSection {
                min_kwh: 25.0,
                max_kwh: 500.0,
                step_kwh: 25.0,
                strategy: SearchStrategy::Binary,
                ..SizingSection::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["reference", "reserve", "coarse"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "reference" => Ok(Self::reference()),
            "reserve" => Ok(Self::reserve()),
            "coarse" => Ok(Self::coarse()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let bat = &self.battery;
        if !bat.capacity_kwh.is_finite() {
            errors.push(ConfigError::new("battery.capacity_kwh", "must be finite"));
        }
        if !(bat.round_trip_efficiency > 0.0 && bat.round_trip_efficiency <= 1.0) {
            errors.push(ConfigError::new(
                "battery.round_trip_efficiency",
                "must be in (0.0, 1.0]",
            ));
        }
        if !(bat.usable_fraction > 0.0 && bat.usable_fraction <= 1.0) {
            errors.push(ConfigError::new(
                "battery.usable_fraction",
                "must be in (0.0, 1.0]",
            ));
        }

        let s = &self.sizing;
        let step_ok = s.step_kwh > 0.0 && s.step_kwh.is_finite();
        let bounds_ok = s.min_kwh.is_finite() && s.max_kwh.is_finite() && s.min_kwh <= s.max_kwh;
        if !step_ok {
            errors.push(ConfigError::new("sizing.step_kwh", "must be > 0"));
        }
        if !bounds_ok {
            errors.push(ConfigError::new(
                "sizing.min_kwh",
                "must be finite and <= sizing.max_kwh",
            ));
        }
        if step_ok && bounds_ok && range_steps(s.min_kwh, s.max_kwh, s.step_kwh).is_none() {
            errors.push(ConfigError::new(
                "sizing.step_kwh",
                format!("range would yield more than {MAX_CANDIDATES} candidates"),
            ));
        }
        if !(s.tolerance_kwh >= 0.0 && s.tolerance_kwh.is_finite()) {
            errors.push(ConfigError::new("sizing.tolerance_kwh", "must be >= 0"));
        }

        errors
    }

    /// Builds validated battery parameters from the `[battery]` section.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the offending field.
    pub fn battery_parameters(&self) -> Result<BatteryParameters, ConfigError> {
        let bat = &self.battery;
        BatteryParameters::new(bat.capacity_kwh, bat.round_trip_efficiency, bat.usable_fraction)
            .map(|p| p.with_policy(bat.usable_policy))
            .map_err(|e| ConfigError::new("battery", e.to_string()))
    }

    /// Builds the candidate list and tolerance from the `[sizing]` section.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the range or tolerance is invalid.
    pub fn sizing_config(&self) -> Result<SizingConfig, ConfigError> {
        let s = &self.sizing;
        SizingConfig::from_range(s.min_kwh, s.max_kwh, s.step_kwh, s.tolerance_kwh, s.strategy)
            .map_err(|e| ConfigError::new("sizing", e.to_string()))
    }
}

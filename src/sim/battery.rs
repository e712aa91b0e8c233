use super::types::{BatteryParameters, HourOutcome};

/// State carried from one hour to the next during a dispatch run.
///
/// A fresh state starts empty. It is owned by a single run and discarded
/// afterwards, so concurrent runs never share it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatteryState {
    /// Stored energy (kWh).
    pub soc_kwh: f64,
}

impl BatteryState {
    /// An empty battery.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Applies one hour of surplus and deficit and returns the hour's outcome.
    ///
    /// Charge is always applied before discharge. Both directions lose
    /// energy through `round_trip_efficiency` once.
    ///
    /// # Arguments
    ///
    /// * `surplus_kw` - PV output above load this hour (kW == kWh)
    /// * `deficit_kw` - Load above PV output this hour (kW == kWh)
    /// * `params` - Battery parameters for this run
    pub fn step(
        &mut self,
        surplus_kw: f64,
        deficit_kw: f64,
        params: &BatteryParameters,
    ) -> HourOutcome {
        let eta = params.round_trip_efficiency();

        // Charge, discarding whatever does not fit below the ceiling
        let offered = self.soc_kwh + surplus_kw * eta;
        let ceiling = params.soc_ceiling_kwh();
        let charged = offered.min(ceiling);
        let curtailed_kwh = (offered - charged).max(0.0);
        self.soc_kwh = charged;

        if deficit_kw <= 0.0 {
            return HourOutcome {
                soc_kwh: self.soc_kwh,
                battery_used_kwh: 0.0,
                unmet_load_kwh: 0.0,
                curtailed_kwh,
            };
        }

        let floor = params.soc_floor_kwh();
        if self.soc_kwh <= floor {
            return HourOutcome {
                soc_kwh: self.soc_kwh,
                battery_used_kwh: 0.0,
                unmet_load_kwh: deficit_kw,
                curtailed_kwh,
            };
        }

        // Discharge; (deficit / eta) * eta may overshoot by an ulp
        let available = self.soc_kwh - floor;
        let requested = deficit_kw / eta;
        let discharge = if available <= requested {
            self.soc_kwh = floor;
            available
        } else {
            self.soc_kwh -= requested;
            requested
        };
        let battery_used_kwh = (discharge * eta).min(deficit_kw);

        HourOutcome {
            soc_kwh: self.soc_kwh,
            battery_used_kwh,
            unmet_load_kwh: deficit_kw - battery_used_kwh,
            curtailed_kwh,
        }
    }
}

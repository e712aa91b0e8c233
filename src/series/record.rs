use std::fmt;

use chrono::NaiveDateTime;

/// One hour of matched PV production and household load.
///
/// Records are produced by [`HourlyRecord::from_pv_load`], which derives the
/// surplus, deficit and on-site share from the two measured flows. With an
/// hourly cadence every kW value is numerically the kWh of that hour.
///
/// # Invariants
/// - `surplus_kw` and `deficit_kw` are never both positive.
/// - `surplus_kw = max(pv_kw - load_kw, 0)` and `deficit_kw = max(load_kw - pv_kw, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyRecord {
    /// Start of the hour.
    pub timestamp: NaiveDateTime,
    /// PV production (kW, >= 0).
    pub pv_kw: f64,
    /// Household load (kW, >= 0).
    pub load_kw: f64,
    /// PV output in excess of load (kW, >= 0).
    pub surplus_kw: f64,
    /// Load in excess of PV output (kW, >= 0).
    pub deficit_kw: f64,
}

impl HourlyRecord {
    /// Builds a record from measured PV and load, deriving surplus and deficit.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use pv_battery_sim::series::HourlyRecord;
    ///
    /// let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
    ///     .and_then(|d| d.and_hms_opt(12, 0, 0))
    ///     .expect("valid date");
    /// let r = HourlyRecord::from_pv_load(ts, 6.0, 2.5);
    /// assert_eq!(r.surplus_kw, 3.5);
    /// assert_eq!(r.deficit_kw, 0.0);
    /// assert_eq!(r.on_site_use_kw(), 2.5);
    /// ```
    pub fn from_pv_load(timestamp: NaiveDateTime, pv_kw: f64, load_kw: f64) -> Self {
        Self {
            timestamp,
            pv_kw,
            load_kw,
            surplus_kw: (pv_kw - load_kw).max(0.0),
            deficit_kw: (load_kw - pv_kw).max(0.0),
        }
    }

    /// PV energy consumed directly by the load in this hour.
    pub fn on_site_use_kw(&self) -> f64 {
        self.pv_kw.min(self.load_kw)
    }
}

impl fmt::Display for HourlyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | pv={:>6.2} kW  load={:>6.2} kW | surplus={:.2}  deficit={:.2}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.pv_kw,
            self.load_kw,
            self.surplus_kw,
            self.deficit_kw,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date")
    }

    #[test]
    fn surplus_when_pv_exceeds_load() {
        let r = HourlyRecord::from_pv_load(noon(), 5.0, 1.5);
        assert_eq!(r.surplus_kw, 3.5);
        assert_eq!(r.deficit_kw, 0.0);
        assert_eq!(r.on_site_use_kw(), 1.5);
    }

    #[test]
    fn deficit_when_load_exceeds_pv() {
        let r = HourlyRecord::from_pv_load(noon(), 0.5, 2.0);
        assert_eq!(r.surplus_kw, 0.0);
        assert_eq!(r.deficit_kw, 1.5);
        assert_eq!(r.on_site_use_kw(), 0.5);
    }

    #[test]
    fn balanced_hour_has_neither() {
        let r = HourlyRecord::from_pv_load(noon(), 2.0, 2.0);
        assert_eq!(r.surplus_kw, 0.0);
        assert_eq!(r.deficit_kw, 0.0);
    }

    #[test]
    fn display_does_not_panic() {
        let r = HourlyRecord::from_pv_load(noon(), 2.0, 1.0);
        let s = format!("{r}");
        assert!(s.starts_with("2024-06-01 12:00"));
    }
}

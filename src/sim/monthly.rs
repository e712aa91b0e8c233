//! Calendar-month energy breakdown of a simulated series.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;

use crate::series::HourlyRecord;

use super::types::SimulationTrace;

/// Energy totals (kWh) for one calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthlySummary {
    pub year: i32,
    /// 1-based month number.
    pub month: u32,
    pub pv_kwh: f64,
    pub load_kwh: f64,
    pub on_site_use_kwh: f64,
    pub surplus_kwh: f64,
    pub deficit_kwh: f64,
    pub battery_used_kwh: f64,
    pub unmet_load_kwh: f64,
}

impl fmt::Display for MonthlySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02} | pv={:>8.1}  load={:>8.1}  on-site={:>8.1}  surplus={:>8.1}  \
             deficit={:>8.1}  battery={:>8.1}  unmet={:>8.1}",
            self.year,
            self.month,
            self.pv_kwh,
            self.load_kwh,
            self.on_site_use_kwh,
            self.surplus_kwh,
            self.deficit_kwh,
            self.battery_used_kwh,
            self.unmet_load_kwh,
        )
    }
}

/// Groups records and their trace by calendar month, in chronological order.
///
/// `trace` must come from simulating `records`; the two are paired by index.
pub fn monthly_breakdown(records: &[HourlyRecord], trace: &SimulationTrace) -> Vec<MonthlySummary> {
    debug_assert_eq!(records.len(), trace.len(), "trace does not match records");
    let mut months: BTreeMap<(i32, u32), MonthlySummary> = BTreeMap::new();
    for (r, h) in records.iter().zip(trace.iter()) {
        let key = (r.timestamp.year(), r.timestamp.month());
        let m = months.entry(key).or_insert_with(|| MonthlySummary {
            year: key.0,
            month: key.1,
            ..MonthlySummary::default()
        });
        m.pv_kwh += r.pv_kw;
        m.load_kwh += r.load_kw;
        m.on_site_use_kwh += r.on_site_use_kw();
        m.surplus_kwh += r.surplus_kw;
        m.deficit_kwh += r.deficit_kw;
        m.battery_used_kwh += h.battery_used_kwh;
        m.unmet_load_kwh += h.unmet_load_kwh;
    }
    months.into_values().collect()
}

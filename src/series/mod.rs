//! Validated hourly PV/load series fed to the dispatch simulator.

mod record;

use std::ops::Deref;

use chrono::{NaiveDateTime, TimeDelta};
use thiserror::Error;

pub use record::HourlyRecord;

/// Reasons an hourly series is rejected at the provider boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("record {index}: {field} must be finite and >= 0, got {value}")]
    InvalidValue {
        index: usize,
        field: &'static str,
        value: f64,
    },
    #[error("record {index}: surplus and deficit are both positive")]
    SurplusAndDeficit { index: usize },
    #[error("record {index}: timestamp {timestamp} is not after the previous record")]
    NotIncreasing {
        index: usize,
        timestamp: NaiveDateTime,
    },
    #[error("record {index}: expected timestamp {expected}, got {actual} (series must be hourly without gaps)")]
    Gap {
        index: usize,
        expected: NaiveDateTime,
        actual: NaiveDateTime,
    },
    #[error("pv and load lengths differ: {pv} vs {load}")]
    LengthMismatch { pv: usize, load: usize },
}

/// Chronologically ordered, gap-free hourly records.
///
/// Construction checks the cadence and value invariants once so the
/// simulator can consume the records without re-validating them. Derefs to
/// `[HourlyRecord]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries {
    records: Vec<HourlyRecord>,
}

impl HourlySeries {
    /// Validates and wraps the given records.
    ///
    /// # Errors
    ///
    /// Returns the first [`SeriesError`] found, scanning in order.
    pub fn new(records: Vec<HourlyRecord>) -> Result<Self, SeriesError> {
        let step = TimeDelta::hours(1);
        for (index, r) in records.iter().enumerate() {
            for (field, value) in [
                ("pv_kw", r.pv_kw),
                ("load_kw", r.load_kw),
                ("surplus_kw", r.surplus_kw),
                ("deficit_kw", r.deficit_kw),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(SeriesError::InvalidValue {
                        index,
                        field,
                        value,
                    });
                }
            }
            if r.surplus_kw > 0.0 && r.deficit_kw > 0.0 {
                return Err(SeriesError::SurplusAndDeficit { index });
            }
            if index == 0 {
                continue;
            }
            let prev = records[index - 1].timestamp;
            if r.timestamp <= prev {
                return Err(SeriesError::NotIncreasing {
                    index,
                    timestamp: r.timestamp,
                });
            }
            let expected = prev + step;
            if r.timestamp != expected {
                return Err(SeriesError::Gap {
                    index,
                    expected,
                    actual: r.timestamp,
                });
            }
        }
        Ok(Self { records })
    }

    /// Builds a series of consecutive hours starting at `start` from parallel
    /// PV and load vectors.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::LengthMismatch`] if the slices differ in length,
    /// or any validation error from [`HourlySeries::new`].
    pub fn from_pv_load(
        start: NaiveDateTime,
        pv_kw: &[f64],
        load_kw: &[f64],
    ) -> Result<Self, SeriesError> {
        if pv_kw.len() != load_kw.len() {
            return Err(SeriesError::LengthMismatch {
                pv: pv_kw.len(),
                load: load_kw.len(),
            });
        }
        let records = pv_kw
            .iter()
            .zip(load_kw)
            .enumerate()
            .map(|(i, (&pv, &load))| {
                HourlyRecord::from_pv_load(start + TimeDelta::hours(i as i64), pv, load)
            })
            .collect();
        Self::new(records)
    }

    /// The validated records in timestamp order.
    pub fn records(&self) -> &[HourlyRecord] {
        &self.records
    }

    /// Total PV production over the series (kWh).
    pub fn total_pv_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.pv_kw).sum()
    }

    /// Total load over the series (kWh).
    pub fn total_load_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.load_kw).sum()
    }
}

impl Deref for HourlySeries {
    type Target = [HourlyRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    #[test]
    fn consecutive_hours_are_accepted() {
        let series = HourlySeries::from_pv_load(start(), &[0.0, 3.0, 1.0], &[1.0, 1.0, 1.0]);
        let series = series.expect("consecutive hours should be accepted");
        assert_eq!(series.len(), 3);
        assert_eq!(series[1].surplus_kw, 2.0);
        assert_eq!(series.total_pv_kwh(), 4.0);
        assert_eq!(series.total_load_kwh(), 3.0);
    }

    #[test]
    fn empty_series_is_valid() {
        let series = HourlySeries::new(Vec::new());
        assert!(series.is_ok_and(|s| s.is_empty()));
    }

    #[test]
    fn gap_is_rejected() {
        let t0 = start();
        let records = vec![
            HourlyRecord::from_pv_load(t0, 1.0, 1.0),
            HourlyRecord::from_pv_load(t0 + TimeDelta::hours(2), 1.0, 1.0),
        ];
        let err = HourlySeries::new(records);
        assert!(matches!(err, Err(SeriesError::Gap { index: 1, .. })));
    }

    #[test]
    fn out_of_order_is_rejected() {
        let t0 = start();
        let records = vec![
            HourlyRecord::from_pv_load(t0 + TimeDelta::hours(1), 1.0, 1.0),
            HourlyRecord::from_pv_load(t0, 1.0, 1.0),
        ];
        let err = HourlySeries::new(records);
        assert!(matches!(err, Err(SeriesError::NotIncreasing { index: 1, .. })));
    }

    #[test]
    fn negative_pv_is_rejected() {
        let err = HourlySeries::from_pv_load(start(), &[1.0, -0.5], &[1.0, 1.0]);
        assert!(matches!(
            err,
            Err(SeriesError::InvalidValue {
                index: 1,
                field: "pv_kw",
                ..
            })
        ));
    }

    #[test]
    fn nan_load_is_rejected() {
        let err = HourlySeries::from_pv_load(start(), &[1.0], &[f64::NAN]);
        assert!(matches!(
            err,
            Err(SeriesError::InvalidValue {
                field: "load_kw",
                ..
            })
        ));
    }

    #[test]
    fn inconsistent_record_is_rejected() {
        let record = HourlyRecord {
            timestamp: start(),
            pv_kw: 1.0,
            load_kw: 1.0,
            surplus_kw: 0.5,
            deficit_kw: 0.5,
        };
        let err = HourlySeries::new(vec![record]);
        assert_eq!(err, Err(SeriesError::SurplusAndDeficit { index: 0 }));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = HourlySeries::from_pv_load(start(), &[1.0, 2.0], &[1.0]);
        assert_eq!(err, Err(SeriesError::LengthMismatch { pv: 2, load: 1 }));
    }
}

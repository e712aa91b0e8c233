//! Minimum battery capacity search.
//!
//! Runs the dispatch simulation over an ascending list of candidate
//! capacities and picks the smallest one whose annual unmet load is within
//! tolerance. Every run gets its own state, so candidates are independent.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::series::HourlyRecord;

use super::dispatch::total_unmet_load_kwh;
use super::types::{BatteryParameters, ParameterError, UsablePolicy};

/// Unmet-load tolerance used by the reference sizing run (kWh per year).
pub const DEFAULT_TOLERANCE_KWH: f64 = 1.0;

/// Upper bound on the candidates a range may expand to.
pub const MAX_CANDIDATES: usize = 100_000;

/// Order in which candidates are evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Ascending scan, stopping at the first candidate within tolerance.
    #[default]
    Linear,
    /// Lower-bound bisection; relies on unmet load falling as capacity grows.
    ///
    /// Runs as [`Linear`](Self::Linear) under
    /// [`UsablePolicy::DischargeFloor`], where a larger floor can leave more
    /// load unmet.
    Binary,
    /// Evaluate every candidate, then pick the smallest within tolerance.
    Sweep,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linear => "linear",
            Self::Binary => "binary",
            Self::Sweep => "sweep",
        };
        f.write_str(name)
    }
}

/// Invalid sizing configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("candidate {index} is not a finite capacity: {value}")]
    NonFiniteCandidate { index: usize, value: f64 },
    #[error("candidate {index} ({value} kWh) is smaller than the one before it")]
    Unordered { index: usize, value: f64 },
    #[error("tolerance_kwh must be finite and >= 0, got {0}")]
    Tolerance(f64),
    #[error(
        "invalid capacity range {min_kwh}..={max_kwh} step {step_kwh} \
         (expected min <= max, step > 0, at most {limit} candidates)",
        limit = MAX_CANDIDATES
    )]
    Range {
        min_kwh: f64,
        max_kwh: f64,
        step_kwh: f64,
    },
    #[error(transparent)]
    Parameters(#[from] ParameterError),
}

/// Candidate capacities, tolerance, and search strategy for one sizing run.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingConfig {
    candidates: Vec<f64>,
    tolerance_kwh: f64,
    strategy: SearchStrategy,
}

impl SizingConfig {
    /// Creates a sizing configuration from an explicit candidate list.
    ///
    /// # Errors
    ///
    /// Returns a [`SizingError`] if a candidate is not finite, the list is
    /// not ascending, or the tolerance is negative or not finite.
    pub fn new(
        candidates: Vec<f64>,
        tolerance_kwh: f64,
        strategy: SearchStrategy,
    ) -> Result<Self, SizingError> {
        if !tolerance_kwh.is_finite() || tolerance_kwh < 0.0 {
            return Err(SizingError::Tolerance(tolerance_kwh));
        }
        for (index, &value) in candidates.iter().enumerate() {
            if !value.is_finite() {
                return Err(SizingError::NonFiniteCandidate { index, value });
            }
            if index > 0 && value < candidates[index - 1] {
                return Err(SizingError::Unordered { index, value });
            }
        }
        Ok(Self {
            candidates,
            tolerance_kwh,
            strategy,
        })
    }

    /// Creates candidates `min, min + step, ...` up to and including `max`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pv_battery_sim::sim::sizing::{SearchStrategy, SizingConfig};
    ///
    /// let cfg = SizingConfig::from_range(10.0, 200.0, 10.0, 1.0, SearchStrategy::Linear);
    /// assert_eq!(cfg.map(|c| c.candidates().len()), Ok(20));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::Range`] if `step <= 0`, `min > max`, any bound
    /// is not finite, or the range holds more than [`MAX_CANDIDATES`].
    pub fn from_range(
        min_kwh: f64,
        max_kwh: f64,
        step_kwh: f64,
        tolerance_kwh: f64,
        strategy: SearchStrategy,
    ) -> Result<Self, SizingError> {
        let range_error = SizingError::Range {
            min_kwh,
            max_kwh,
            step_kwh,
        };
        let finite = min_kwh.is_finite() && max_kwh.is_finite() && step_kwh.is_finite();
        if !finite || step_kwh <= 0.0 || min_kwh > max_kwh {
            return Err(range_error);
        }
        let steps = range_steps(min_kwh, max_kwh, step_kwh).ok_or(range_error)?;
        let candidates = (0..=steps)
            .map(|k| min_kwh + k as f64 * step_kwh)
            .collect();
        Self::new(candidates, tolerance_kwh, strategy)
    }

    /// Candidate capacities (kWh), ascending.
    pub fn candidates(&self) -> &[f64] {
        &self.candidates
    }

    pub fn tolerance_kwh(&self) -> f64 {
        self.tolerance_kwh
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }
}

/// Number of whole steps from `min` to `max`, if the range stays within
/// [`MAX_CANDIDATES`]. Bounds must already be finite with `step > 0`.
pub(crate) fn range_steps(min_kwh: f64, max_kwh: f64, step_kwh: f64) -> Option<usize> {
    // Small slack so a max that is a multiple of the step survives rounding
    let steps = ((max_kwh - min_kwh) / step_kwh + 1e-9).floor();
    (steps < MAX_CANDIDATES as f64).then_some(steps as usize)
}

/// One simulated candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateEvaluation {
    pub capacity_kwh: f64,
    pub total_unmet_load_kwh: f64,
    pub meets_tolerance: bool,
}

/// Result of a sizing search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingOutcome {
    /// Smallest candidate whose unmet load is within tolerance.
    Found {
        capacity_kwh: f64,
        total_unmet_load_kwh: f64,
    },
    /// No candidate met the tolerance; the search range should be widened.
    Exhausted,
}

/// Sizing outcome plus every candidate examined, in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingReport {
    pub outcome: SizingOutcome,
    pub tolerance_kwh: f64,
    /// Strategy that actually ran.
    pub strategy: SearchStrategy,
    pub evaluations: Vec<CandidateEvaluation>,
}

impl SizingReport {
    /// The chosen capacity, if any candidate met the tolerance.
    pub fn capacity_kwh(&self) -> Option<f64> {
        match self.outcome {
            SizingOutcome::Found { capacity_kwh, .. } => Some(capacity_kwh),
            SizingOutcome::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.outcome == SizingOutcome::Exhausted
    }

    /// Largest capacity that was simulated.
    pub fn largest_evaluated_kwh(&self) -> Option<f64> {
        self.evaluations
            .iter()
            .map(|e| e.capacity_kwh)
            .reduce(f64::max)
    }
}

impl fmt::Display for SizingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Battery Sizing ({} search) ---", self.strategy)?;
        for e in &self.evaluations {
            writeln!(
                f,
                "Battery {:>7.1} kWh -> unmet load: {:.2} kWh",
                e.capacity_kwh, e.total_unmet_load_kwh
            )?;
        }
        match self.outcome {
            SizingOutcome::Found { capacity_kwh, .. } => write!(
                f,
                "Minimum capacity:      {capacity_kwh:.1} kWh (unmet <= {:.2} kWh)",
                self.tolerance_kwh
            ),
            SizingOutcome::Exhausted => write!(
                f,
                "Minimum capacity:      not found (largest tried: {:.1} kWh)",
                self.largest_evaluated_kwh().unwrap_or(0.0)
            ),
        }
    }
}

/// Searches the configured candidates for the smallest adequate battery.
///
/// `template` supplies efficiency, usable fraction, and policy; its capacity
/// is replaced by each candidate in turn.
///
/// # Errors
///
/// Returns [`SizingError::Parameters`] if a candidate capacity is rejected.
pub fn size_battery(
    records: &[HourlyRecord],
    template: &BatteryParameters,
    config: &SizingConfig,
) -> Result<SizingReport, SizingError> {
    let mut evaluations = Vec::new();
    let mut evaluate = |capacity_kwh: f64| -> Result<bool, SizingError> {
        let params = template.with_capacity(capacity_kwh)?;
        let unmet = total_unmet_load_kwh(records, &params);
        let meets_tolerance = unmet <= config.tolerance_kwh;
        debug!(capacity_kwh, unmet_kwh = unmet, meets_tolerance, "evaluated candidate");
        evaluations.push(CandidateEvaluation {
            capacity_kwh,
            total_unmet_load_kwh: unmet,
            meets_tolerance,
        });
        Ok(meets_tolerance)
    };

    let strategy = match config.strategy {
        SearchStrategy::Binary if template.usable_policy() == UsablePolicy::DischargeFloor => {
            warn!("unmet load is not monotone under a discharge floor; scanning linearly");
            SearchStrategy::Linear
        }
        strategy => strategy,
    };

    let candidates = config.candidates();
    let chosen = match strategy {
        SearchStrategy::Linear => {
            let mut chosen = None;
            for (i, &c) in candidates.iter().enumerate() {
                if evaluate(c)? {
                    chosen = Some(i);
                    break;
                }
            }
            chosen
        }
        SearchStrategy::Binary => {
            let (mut lo, mut hi) = (0, candidates.len());
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if evaluate(candidates[mid])? {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }
            (lo < candidates.len()).then_some(lo)
        }
        SearchStrategy::Sweep => {
            let mut chosen = None;
            for (i, &c) in candidates.iter().enumerate() {
                if evaluate(c)? && chosen.is_none() {
                    chosen = Some(i);
                }
            }
            chosen
        }
    };

    let outcome = match chosen {
        Some(i) => {
            let capacity_kwh = candidates[i];
            let total_unmet_load_kwh = evaluations
                .iter()
                .find(|e| e.capacity_kwh == capacity_kwh)
                .map_or(0.0, |e| e.total_unmet_load_kwh);
            info!(capacity_kwh, unmet_kwh = total_unmet_load_kwh, "minimum capacity found");
            SizingOutcome::Found {
                capacity_kwh,
                total_unmet_load_kwh,
            }
        }
        None => {
            warn!(
                candidates = candidates.len(),
                tolerance_kwh = config.tolerance_kwh,
                "no candidate capacity meets the unmet-load tolerance"
            );
            SizingOutcome::Exhausted
        }
    };

    Ok(SizingReport {
        outcome,
        tolerance_kwh: config.tolerance_kwh,
        strategy,
        evaluations,
    })
}

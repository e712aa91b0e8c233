/// Hour-to-hour battery state transition.
pub mod battery;
/// Dispatch simulation over an hourly series.
pub mod dispatch;
pub mod metrics;
pub mod monthly;
pub mod sizing;
pub mod types;

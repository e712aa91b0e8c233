//! Hourly PV-plus-battery dispatch simulation and capacity sizing.

pub mod config;
/// CSV import of hourly series and export of simulation output.
pub mod io;
pub mod series;
/// Battery dispatch, sizing search, and system metrics.
pub mod sim;

//! CSV adapters at the edges of the simulation: series in, traces out.

pub mod export;
pub mod import;

//! CSV export for simulation traces and sizing evaluations.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::series::HourlyRecord;
use crate::sim::sizing::SizingReport;
use crate::sim::types::SimulationTrace;

/// Column header for the hourly trace export.
const TRACE_HEADER: &str = "timestamp,pv_kw,load_kw,on_site_use_kw,surplus_kw,deficit_kw,\
                            soc_kwh,battery_used_kwh,unmet_load_kwh,curtailed_kwh,\
                            total_load_supplied_kw";

/// Column header for the sizing evaluation export.
const SIZING_HEADER: &str = "capacity_kwh,total_unmet_load_kwh,meets_tolerance";

/// Exports the hourly trace to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_trace_csv(
    records: &[HourlyRecord],
    trace: &SimulationTrace,
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    write_trace_csv(records, trace, io::BufWriter::new(file))
}

/// Writes one row per hour: the input record, the battery outcome, and the
/// load supplied by PV plus battery.
///
/// `records` and `trace` are paired index-for-index, so `trace` must come
/// from simulating `records`. Output is deterministic for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_trace_csv(
    records: &[HourlyRecord],
    trace: &SimulationTrace,
    writer: impl Write,
) -> io::Result<()> {
    debug_assert_eq!(records.len(), trace.len(), "trace does not match records");
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(TRACE_HEADER.split(',').map(str::trim))?;

    for (r, h) in records.iter().zip(trace.iter()) {
        let on_site = r.on_site_use_kw();
        wtr.write_record(&[
            r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.4}", r.pv_kw),
            format!("{:.4}", r.load_kw),
            format!("{:.4}", on_site),
            format!("{:.4}", r.surplus_kw),
            format!("{:.4}", r.deficit_kw),
            format!("{:.4}", h.soc_kwh),
            format!("{:.4}", h.battery_used_kwh),
            format!("{:.4}", h.unmet_load_kwh),
            format!("{:.4}", h.curtailed_kwh),
            format!("{:.4}", on_site + h.battery_used_kwh),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the sizing evaluations to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_sizing_csv(report: &SizingReport, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_sizing_csv(report, io::BufWriter::new(file))
}

/// Writes one row per evaluated candidate, sorted by capacity.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_sizing_csv(report: &SizingReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SIZING_HEADER.split(','))?;

    let mut evaluations = report.evaluations.clone();
    evaluations.sort_by(|a, b| a.capacity_kwh.total_cmp(&b.capacity_kwh));
    for e in &evaluations {
        wtr.write_record(&[
            format!("{:.4}", e.capacity_kwh),
            format!("{:.4}", e.total_unmet_load_kwh),
            e.meets_tolerance.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

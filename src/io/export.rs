//! CSV export for tick telemetry and device energy.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::devices::Device;
use crate::sim::clock::format_hhmm;
use crate::sim::types::StepResult;

/// Column header for tick telemetry.
const TICK_HEADER: &str = "minute,time,total_kw,allowed_kw,active_count,transitions";

/// Column header for the per-device energy report.
const ENERGY_HEADER: &str = "id,name,kind,priority,power_kw,is_on,on_minutes,energy_kwh";

/// Exports tick results to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[StepResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(results, io::BufWriter::new(file))
}

/// Writes tick results as CSV to any writer, one row per tick.
///
/// Transitions are joined with `;` in a single column.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[StepResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(TICK_HEADER.split(','))?;
    for r in results {
        wtr.write_record(&[
            r.minute.to_string(),
            format_hhmm(r.minute),
            format!("{:.4}", r.total_kw),
            format!("{:.4}", r.allowed_kw),
            r.active_count.to_string(),
            r.transitions_joined(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the metered energy of every device to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_energy_csv<'a>(
    devices: impl IntoIterator<Item = &'a Device>,
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    write_energy_csv(devices, io::BufWriter::new(file))
}

/// Writes one row per device with its metered energy.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_energy_csv<'a>(
    devices: impl IntoIterator<Item = &'a Device>,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(ENERGY_HEADER.split(','))?;
    for d in devices {
        wtr.write_record(&[
            d.id().to_string(),
            d.name().to_string(),
            d.kind_label().to_string(),
            d.priority().to_string(),
            format!("{:.4}", d.power_kw()),
            d.is_on().to_string(),
            d.on_minutes().to_string(),
            format!("{:.4}", d.metered_energy_kwh()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

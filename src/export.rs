//! Flat CSV export of a finished measurement cycle.
//!
//! Layout: a header row of positions (preceded by a name row when the
//! layout has named points), then one row per sample with the timestamp in
//! the first column.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::accumulator::MeasurementCycle;
use crate::error::Result;

/// Writes a cycle as CSV to an arbitrary writer.
pub fn write_csv<W: Write>(cycle: &MeasurementCycle, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    if !cycle.position_names.is_empty() {
        let mut names = Vec::with_capacity(cycle.position_names.len() + 1);
        names.push("Gage/Segment Name".to_string());
        names.extend(cycle.position_names.iter().cloned());
        out.write_record(&names)?;
    }

    let mut header = Vec::with_capacity(cycle.positions.len() + 1);
    header.push("X-axis".to_string());
    header.extend(cycle.positions.iter().map(|pos| format!("{pos:.2}")));
    out.write_record(&header)?;

    for (timestamp, row) in cycle.timestamps.iter().zip(&cycle.rows) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(timestamp.clone());
        record.extend(row.iter().map(f64::to_string));
        out.write_record(&record)?;
    }

    out.flush()?;
    Ok(())
}

/// Saves a cycle to `path`, appending a `.csv` extension when missing.
/// Returns the path actually written.
pub fn save_csv(cycle: &MeasurementCycle, path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut path = path.as_ref().to_path_buf();
    if path.extension().map_or(true, |ext| ext != "csv") {
        let mut name = path.into_os_string();
        name.push(".csv");
        path = PathBuf::from(name);
    }
    let file = File::create(&path)?;
    write_csv(cycle, file)?;
    tracing::info!(path = %path.display(), "cycle exported");
    Ok(path)
}

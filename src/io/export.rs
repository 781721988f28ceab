//! CSV export for hourly trajectories, Monte Carlo samples and degradation
//! curves.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::lcoe::curve::CurvePoint;
use crate::lcoe::monte_carlo::SampleRecord;
use crate::sim::types::HourRecord;

/// Column header of the hourly trajectory export.
const HOURLY_HEADER: &str = "hour,current_a,soc_pct,soh_pct,capacity_ah,efc";

/// Column header of the Monte Carlo sample export.
const SAMPLES_HEADER: &str = "iteration,capex_per_kwh,capex_total,discount_rate,\
                              opex_fraction,degradation_factor,lcoe";

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Writes one row per simulated hour to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_hourly_to_path(records: &[HourRecord], path: &Path) -> Result<()> {
    write_hourly(records, create(path)?)
}

/// Writes one row per simulated hour to any writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_hourly(records: &[HourRecord], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HOURLY_HEADER.split(','))?;

    for r in records {
        wtr.write_record(&[
            r.hour.to_string(),
            format!("{:.4}", r.current_a),
            format!("{:.6}", r.soc_pct),
            format!("{:.6}", r.soh_pct),
            format!("{:.6}", r.capacity_ah),
            format!("{:.6}", r.efc),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the valid Monte Carlo iterations to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_samples_to_path(samples: &[SampleRecord], path: &Path) -> Result<()> {
    write_samples(samples, create(path)?)
}

/// Writes the valid Monte Carlo iterations to any writer. Excluded iterations
/// are omitted.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_samples(samples: &[SampleRecord], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SAMPLES_HEADER.split(',').map(str::trim))?;

    for r in samples {
        let Some(lcoe) = r.lcoe else { continue };
        wtr.write_record(&[
            r.iteration.to_string(),
            r.sample.capex_per_kwh.to_string(),
            r.capex_total.to_string(),
            r.sample.discount_rate.to_string(),
            r.sample.opex_fraction.to_string(),
            r.sample.degradation_factor.to_string(),
            lcoe.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes a degradation curve to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_curve_to_path(points: &[CurvePoint], label: &str, path: &Path) -> Result<()> {
    write_curve(points, label, create(path)?)
}

/// Writes a degradation curve as `Time_Years,SOH_Pct_<label>`, adding an
/// `R_int_Ohm` column when every point carries a resistance.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_curve(points: &[CurvePoint], label: &str, writer: impl Write) -> Result<()> {
    let with_r_int = !points.is_empty() && points.iter().all(|p| p.r_int_ohm.is_some());
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let soh_column = format!("SOH_Pct_{label}");
    let mut header = vec!["Time_Years", soh_column.as_str()];
    if with_r_int {
        header.push("R_int_Ohm");
    }
    wtr.write_record(&header)?;

    for p in points {
        let mut row = vec![format!("{:.6}", p.time_years), format!("{:.6}", p.soh_pct)];
        if let Some(r) = p.r_int_ohm.filter(|_| with_r_int) {
            row.push(format!("{r:.8}"));
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

//! Degradation-curve CSV import.

use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::config::CurveConfig;
use crate::error::{Error, Result};
use crate::lcoe::curve::{CurvePoint, DegradationCurve};

const TIME_COLUMN: &str = "Time_Years";
const SOH_PREFIX: &str = "SOH_Pct_";
const R_INT_COLUMN: &str = "R_int_Ohm";

/// A degradation curve as read from CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveTable {
    /// Name of the SoH column that was used.
    pub soh_column: String,
    pub points: Vec<CurvePoint>,
}

/// Reads `Time_Years`, the first `SOH_Pct_*` column and, when present,
/// `R_int_Ohm` from `path`.
///
/// # Errors
///
/// Returns [`Error::MissingInput`] if the file does not exist,
/// [`Error::MissingColumn`] if a required column is absent, and
/// [`Error::InvalidInput`] for a non-numeric cell.
pub fn read_degradation_csv(path: &Path) -> Result<CurveTable> {
    if !path.exists() {
        return Err(Error::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path)?;
    parse_degradation_csv(file, path)
}

/// Parses degradation-curve CSV from any reader. `origin` names the source in
/// errors.
///
/// # Errors
///
/// Same as [`read_degradation_csv`], minus the existence check.
pub fn parse_degradation_csv(reader: impl Read, origin: &Path) -> Result<CurveTable> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let missing = |column: &str| Error::MissingColumn {
        path: origin.to_path_buf(),
        column: column.to_string(),
    };
    let time_idx = headers
        .iter()
        .position(|h| h == TIME_COLUMN)
        .ok_or_else(|| missing(TIME_COLUMN))?;
    let (soh_idx, soh_column) = headers
        .iter()
        .enumerate()
        .find(|(_, h)| h.starts_with(SOH_PREFIX))
        .map(|(i, h)| (i, h.to_string()))
        .ok_or_else(|| missing(&format!("{SOH_PREFIX}*")))?;
    let r_int_idx = headers.iter().position(|h| h == R_INT_COLUMN);

    let mut points = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let cell = |idx: usize, column: &str| -> Result<f64> {
            let raw = record.get(idx).unwrap_or("");
            raw.parse().map_err(|_| {
                Error::invalid(
                    column,
                    format!("row {}: \"{raw}\" is not a number", row + 1),
                )
            })
        };
        points.push(CurvePoint {
            time_years: cell(time_idx, TIME_COLUMN)?,
            soh_pct: cell(soh_idx, &soh_column)?,
            r_int_ohm: r_int_idx.map(|i| cell(i, R_INT_COLUMN)).transpose()?,
        });
    }

    Ok(CurveTable { soh_column, points })
}

/// Yearly curve resolved from a `[curve]` section.
#[derive(Debug, Clone)]
pub struct LoadedCurve {
    pub curve: DegradationCurve,
    /// Raw points when the curve came from CSV (or the fallback).
    pub points: Option<Vec<CurvePoint>>,
    /// Whether the linear approximation replaced a missing file.
    pub used_fallback: bool,
}

/// Builds the yearly SoH curve for a project of `lifetime_years`.
///
/// The `"csv"` source falls back to the built-in linear approximation only
/// when `allow_fallback` is set.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a zero `lifetime_years`,
/// [`Error::MissingInput`] for an absent CSV without opt-in, and any parse or
/// resampling error.
pub fn load_curve(config: &CurveConfig, lifetime_years: usize) -> Result<LoadedCurve> {
    if lifetime_years == 0 {
        return Err(Error::invalid("economics.lifetime_years", "must be > 0"));
    }
    if config.source != "csv" {
        return Ok(LoadedCurve {
            curve: DegradationCurve::linear_cycle(
                config.eol_relative_soh,
                config.cycle_years.max(1),
                lifetime_years,
            ),
            points: None,
            used_fallback: false,
        });
    }

    let (points, used_fallback) = match read_degradation_csv(&config.path) {
        Ok(table) => {
            info!(
                path = %config.path.display(),
                column = %table.soh_column,
                points = table.points.len(),
                "Loaded degradation curve"
            );
            (table.points, false)
        }
        Err(Error::MissingInput { path }) if config.allow_fallback => {
            warn!(
                path = %path.display(),
                "Degradation file not found, using linear approximation"
            );
            (DegradationCurve::fallback_points(), true)
        }
        Err(e) => return Err(e),
    };

    let times: Vec<f64> = points.iter().map(|p| p.time_years).collect();
    let soh: Vec<f64> = points.iter().map(|p| p.soh_pct).collect();
    let curve = DegradationCurve::from_points(
        &times,
        &soh,
        config.soh_reference_pct,
        lifetime_years,
        config.cycle(),
    )?;
    Ok(LoadedCurve {
        curve,
        points: Some(points),
        used_fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = "Time_Years,SOH_Pct_PyBaMM,R_int_Ohm\n\
                          0.0,80.0,0.010\n\
                          5.0,75.0,0.012\n\
                          10.0,70.0,0.015\n";

    #[test]
    fn parses_columns_and_resistance() {
        let table = parse_degradation_csv(SAMPLE.as_bytes(), Path::new("mem")).unwrap();
        assert_eq!(table.soh_column, "SOH_Pct_PyBaMM");
        assert_eq!(table.points.len(), 3);
        assert_eq!(table.points[1].soh_pct, 75.0);
        assert_eq!(table.points[2].r_int_ohm, Some(0.015));
    }

    #[test]
    fn resistance_is_optional() {
        let csv = "SOH_Pct_Sim,Time_Years\n100.0,0.0\n99.0,1.0\n";
        let table = parse_degradation_csv(csv.as_bytes(), Path::new("mem")).unwrap();
        assert_eq!(table.points[1].time_years, 1.0);
        assert_eq!(table.points[1].r_int_ohm, None);
    }

    #[test]
    fn missing_soh_column_is_reported() {
        let csv = "Time_Years,SoH\n0.0,100.0\n";
        let err = parse_degradation_csv(csv.as_bytes(), Path::new("deg.csv")).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "SOH_Pct_*"));
    }

    #[test]
    fn non_numeric_cell_is_rejected() {
        let csv = "Time_Years,SOH_Pct_X\n0.0,abc\n";
        let err = parse_degradation_csv(csv.as_bytes(), Path::new("mem")).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn missing_file_needs_opt_in() {
        let config = CurveConfig {
            source: "csv".to_string(),
            path: PathBuf::from("/nonexistent/degradation.csv"),
            ..CurveConfig::default()
        };
        let err = load_curve(&config, 25).unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));

        let config = CurveConfig {
            allow_fallback: true,
            ..config
        };
        let loaded = load_curve(&config, 25).unwrap();
        assert!(loaded.used_fallback);
        assert_eq!(loaded.curve.len(), 25);
    }

    #[test]
    fn linear_source_ignores_path() {
        let loaded = load_curve(&CurveConfig::default(), 25).unwrap();
        assert!(!loaded.used_fallback);
        assert!(loaded.points.is_none());
        assert_eq!(loaded.curve, DegradationCurve::linear_cycle(0.875, 10, 25));
    }

    #[test]
    fn zero_lifetime_is_rejected() {
        let err = load_curve(&CurveConfig::default(), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { ref field, .. } if field == "economics.lifetime_years"));

        let config = CurveConfig {
            source: "csv".to_string(),
            path: PathBuf::from("/nonexistent/degradation.csv"),
            allow_fallback: true,
            ..CurveConfig::default()
        };
        assert!(matches!(load_curve(&config, 0), Err(Error::InvalidInput { .. })));
    }
}

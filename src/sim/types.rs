//! Core simulation types: horizon configuration and per-hour records.

use std::fmt;

use crate::battery::profile::HOURS_PER_DAY;

/// Hours in a simulated (non-leap) year.
pub const HOURS_PER_YEAR: usize = 365 * HOURS_PER_DAY;

/// Timing of an hourly simulation run.
///
/// # Examples
///
/// ```
/// use slb_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::days(365);
/// assert_eq!(cfg.hours, 8760);
/// assert_eq!(cfg.dt_hours, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Number of simulated hours.
    pub hours: usize,
    /// Duration of one step in hours.
    pub dt_hours: f64,
}

impl SimConfig {
    /// Creates an hourly configuration over `hours` steps.
    ///
    /// # Panics
    ///
    /// Panics if `hours` is zero.
    pub fn new(hours: usize) -> Self {
        assert!(hours > 0, "hours must be > 0");
        Self {
            hours,
            dt_hours: 1.0,
        }
    }

    /// Hourly configuration over whole days.
    pub fn days(days: usize) -> Self {
        Self::new(days * HOURS_PER_DAY)
    }

    /// One simulated year at hourly resolution.
    pub fn one_year() -> Self {
        Self::new(HOURS_PER_YEAR)
    }
}

/// Battery state recorded at the end of one simulated hour.
#[derive(Debug, Clone, PartialEq)]
pub struct HourRecord {
    /// Hour index.
    pub hour: usize,
    /// Applied current (A; positive=charge, negative=discharge).
    pub current_a: f64,
    /// State of charge after the hour (%).
    pub soc_pct: f64,
    /// State of health after the hour (% of nominal).
    pub soh_pct: f64,
    /// Usable capacity after the hour (Ah).
    pub capacity_ah: f64,
    /// Cumulative equivalent full cycles after the hour.
    pub efc: f64,
}

impl fmt::Display for HourRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hour {}: I={:.2} A, SoC={:.2}%, SoH={:.4}%, Cap={:.4} Ah, EFC={:.2}",
            self.hour, self.current_a, self.soc_pct, self.soh_pct, self.capacity_ah, self.efc
        )
    }
}

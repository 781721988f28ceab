use std::ops::Index;

/// Hours in one day of a repeating pattern.
pub const HOURS_PER_DAY: usize = 24;

/// A fixed daily current pattern that repeats every 24 hours.
///
/// The battery discharges inside `[discharge_start_hour, discharge_end_hour)`
/// and charges for the rest of the day.
///
/// # Sign Convention
/// Discharge hours yield negative current, charge hours positive current.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPattern {
    /// Discharge current magnitude (A).
    pub discharge_current_a: f64,
    /// Charge current magnitude (A).
    pub charge_current_a: f64,
    /// First discharge hour of the day (inclusive).
    pub discharge_start_hour: usize,
    /// Last discharge hour of the day (exclusive).
    pub discharge_end_hour: usize,
}

impl DailyPattern {
    /// Creates a pattern with explicit currents and discharge window.
    ///
    /// # Panics
    ///
    /// Panics if the window is empty or extends past hour 24, or if either
    /// current is negative.
    pub fn new(
        discharge_current_a: f64,
        charge_current_a: f64,
        discharge_start_hour: usize,
        discharge_end_hour: usize,
    ) -> Self {
        assert!(
            discharge_start_hour < discharge_end_hour && discharge_end_hour <= HOURS_PER_DAY,
            "discharge window must satisfy start < end <= 24"
        );
        assert!(
            discharge_current_a >= 0.0 && charge_current_a >= 0.0,
            "currents are magnitudes and must be >= 0"
        );
        Self {
            discharge_current_a,
            charge_current_a,
            discharge_start_hour,
            discharge_end_hour,
        }
    }

    /// Symmetric pattern at a C-rate of the nominal capacity.
    ///
    /// `c_rate = 0.25` on a 100 Ah pack charges and discharges at 25 A.
    pub fn from_c_rate(
        nominal_capacity_ah: f64,
        c_rate: f64,
        discharge_start_hour: usize,
        discharge_end_hour: usize,
    ) -> Self {
        let current = nominal_capacity_ah * c_rate;
        Self::new(current, current, discharge_start_hour, discharge_end_hour)
    }

    /// Signed current for an hour of the day (0..24).
    pub fn current_at(&self, hour_of_day: usize) -> f64 {
        let hour = hour_of_day % HOURS_PER_DAY;
        if (self.discharge_start_hour..self.discharge_end_hour).contains(&hour) {
            -self.discharge_current_a
        } else {
            self.charge_current_a
        }
    }
}

impl Default for DailyPattern {
    /// 0.25 C on a 100 Ah pack, discharging 08:00-20:00.
    fn default() -> Self {
        Self::from_c_rate(100.0, 0.25, 8, 20)
    }
}

/// Ordered signed current values, one per simulated hour.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlyProfile {
    currents_a: Vec<f64>,
}

impl HourlyProfile {
    /// Wraps externally supplied hourly currents.
    pub fn from_values(currents_a: Vec<f64>) -> Self {
        Self { currents_a }
    }

    /// Expands a daily pattern over `hours` hours.
    pub fn from_daily_pattern(pattern: &DailyPattern, hours: usize) -> Self {
        Self {
            currents_a: (0..hours).map(|h| pattern.current_at(h)).collect(),
        }
    }

    /// The same current every hour.
    pub fn constant(hours: usize, current_a: f64) -> Self {
        Self {
            currents_a: vec![current_a; hours],
        }
    }

    pub fn len(&self) -> usize {
        self.currents_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currents_a.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.currents_a
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.currents_a.iter().copied()
    }
}

impl Index<usize> for HourlyProfile {
    type Output = f64;

    fn index(&self, hour: usize) -> &f64 {
        &self.currents_a[hour]
    }
}

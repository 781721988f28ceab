//! Yearly relative state-of-health curves for the economic model.

use crate::error::{Error, Result};

/// One sample of a time-indexed degradation curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    /// Time since start of service (years).
    pub time_years: f64,
    /// State of health (%), relative to whatever reference the curve uses.
    pub soh_pct: f64,
    /// Internal resistance (Ω), when the source provides it.
    pub r_int_ohm: Option<f64>,
}

/// Breakpoints of the hard-coded approximation: 80% fading to 70% over each
/// 10-year cycle, restored by replacement, ending at 75% after 25 years.
const FALLBACK_TIMES_YEARS: [f64; 6] = [0.0, 10.0, 10.001, 20.0, 20.001, 25.0];
const FALLBACK_SOH_PCT: [f64; 6] = [80.0, 70.0, 80.0, 70.0, 80.0, 75.0];

/// Relative SoH fraction for each project year `1..=N`.
///
/// Index 0 holds year 1. Values are fractions (1.0 = initial SoH), which the
/// LCOE model multiplies into the base annual energy.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradationCurve {
    relative_soh: Vec<f64>,
}

impl DegradationCurve {
    /// Wraps explicit yearly fractions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `relative_soh` is empty or holds a
    /// negative or non-finite value.
    pub fn from_values(relative_soh: Vec<f64>) -> Result<Self> {
        if relative_soh.is_empty() {
            return Err(Error::invalid("curve", "needs at least one year"));
        }
        if let Some(year) = relative_soh.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::invalid(
                "curve",
                format!("year {} has an invalid SoH fraction", year + 1),
            ));
        }
        Ok(Self { relative_soh })
    }

    /// Linear fade from 1.0 to `eol_relative_soh` over each `cycle_years`
    /// cycle, repeating after every replacement, floored at the EoL value.
    ///
    /// Year `y` of a cycle (1-based) sits at
    /// `1 - (1 - eol) * y / cycle_years`.
    ///
    /// # Panics
    ///
    /// Panics if `cycle_years` or `lifetime_years` is zero.
    pub fn linear_cycle(eol_relative_soh: f64, cycle_years: usize, lifetime_years: usize) -> Self {
        assert!(cycle_years > 0, "cycle_years must be > 0");
        assert!(lifetime_years > 0, "lifetime_years must be > 0");
        let loss = 1.0 - eol_relative_soh;
        let relative_soh = (1..=lifetime_years)
            .map(|year| {
                let year_in_cycle = (year - 1) % cycle_years + 1;
                let soh = 1.0 - loss * year_in_cycle as f64 / cycle_years as f64;
                soh.max(eol_relative_soh)
            })
            .collect();
        Self { relative_soh }
    }

    /// Resamples a time-indexed curve onto integer project years.
    ///
    /// Values between samples are linearly interpolated; years before the
    /// first or after the last sample take the nearest endpoint. Each value is
    /// divided by `reference_pct` (100 for a curve already relative to its
    /// initial SoH, 80 for an absolute curve of a pack that starts at 80%).
    /// With `cycle_years`, the lookup time restarts every cycle so each
    /// replacement restores the initial SoH.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the slices differ in length, are
    /// empty, contain non-finite values, or if the times are not strictly
    /// increasing. Also rejects a non-positive `reference_pct` and a zero
    /// lifetime or cycle.
    pub fn from_points(
        times_years: &[f64],
        soh_pct: &[f64],
        reference_pct: f64,
        lifetime_years: usize,
        cycle_years: Option<usize>,
    ) -> Result<Self> {
        if times_years.len() != soh_pct.len() {
            return Err(Error::invalid(
                "curve",
                format!(
                    "{} time values but {} SoH values",
                    times_years.len(),
                    soh_pct.len()
                ),
            ));
        }
        if times_years.is_empty() {
            return Err(Error::invalid("curve", "has no points"));
        }
        if times_years.iter().chain(soh_pct).any(|v| !v.is_finite()) {
            return Err(Error::invalid("curve", "contains non-finite values"));
        }
        if times_years.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::invalid(
                "curve.Time_Years",
                "must be strictly increasing",
            ));
        }
        if !(reference_pct > 0.0) {
            return Err(Error::invalid("curve.soh_reference_pct", "must be > 0"));
        }
        if lifetime_years == 0 {
            return Err(Error::invalid("economics.lifetime_years", "must be > 0"));
        }
        if cycle_years == Some(0) {
            return Err(Error::invalid("curve.cycle_years", "must be > 0"));
        }

        let relative_soh = (1..=lifetime_years)
            .map(|year| {
                let t = match cycle_years {
                    Some(cycle) => (year - 1) % cycle + 1,
                    None => year,
                };
                interp(t as f64, times_years, soh_pct) / reference_pct
            })
            .collect();
        Ok(Self { relative_soh })
    }

    /// The linear approximation used when no degradation file is available.
    pub fn fallback_points() -> Vec<CurvePoint> {
        FALLBACK_TIMES_YEARS
            .iter()
            .zip(FALLBACK_SOH_PCT)
            .map(|(&time_years, soh_pct)| CurvePoint {
                time_years,
                soh_pct,
                r_int_ohm: None,
            })
            .collect()
    }

    /// Resamples [`DegradationCurve::fallback_points`] like
    /// [`DegradationCurve::from_points`].
    ///
    /// # Errors
    ///
    /// Fails only on an invalid `reference_pct`, lifetime or cycle.
    pub fn fallback_linear(
        reference_pct: f64,
        lifetime_years: usize,
        cycle_years: Option<usize>,
    ) -> Result<Self> {
        Self::from_points(
            &FALLBACK_TIMES_YEARS,
            &FALLBACK_SOH_PCT,
            reference_pct,
            lifetime_years,
            cycle_years,
        )
    }

    /// Yearly fractions, year 1 first.
    pub fn values(&self) -> &[f64] {
        &self.relative_soh
    }

    /// Number of years covered.
    pub fn len(&self) -> usize {
        self.relative_soh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relative_soh.is_empty()
    }

    /// Fraction for a 1-based project year.
    pub fn year(&self, year: usize) -> Option<f64> {
        year.checked_sub(1).and_then(|i| self.relative_soh.get(i).copied())
    }

    /// Scales the first `years` values by `factor` and clamps each to
    /// `[floor, 1.0]`.
    pub fn adjusted(&self, factor: f64, floor: f64, years: usize) -> Vec<f64> {
        self.relative_soh
            .iter()
            .take(years)
            .map(|v| (v * factor).min(1.0).max(floor))
            .collect()
    }
}

/// Piecewise-linear interpolation that holds the endpoint values outside the
/// sampled range. `xs` must be strictly increasing and non-empty.
pub fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let i = xs.partition_point(|&xi| xi <= x) - 1;
    let frac = (x - xs[i]) / (xs[i + 1] - xs[i]);
    ys[i] + frac * (ys[i + 1] - ys[i])
}

/// First time at which SoH falls to or below `eol_pct`, or `None` if the curve
/// never reaches it.
pub fn technical_life_years(points: &[CurvePoint], eol_pct: f64) -> Option<f64> {
    points
        .iter()
        .filter(|p| p.soh_pct <= eol_pct)
        .map(|p| p.time_years)
        .reduce(f64::min)
}

/// Straight-line curve from `initial_pct` to `final_pct` over `years`,
/// sampled `points_per_year` times a year (plus the t=0 point).
///
/// # Panics
///
/// Panics if `points_per_year` is zero or `years` is not positive.
pub fn linear_points(
    initial_pct: f64,
    final_pct: f64,
    years: f64,
    points_per_year: usize,
) -> Vec<CurvePoint> {
    assert!(points_per_year > 0, "points_per_year must be > 0");
    assert!(years > 0.0, "years must be > 0");
    let steps = (years * points_per_year as f64).round().max(1.0) as usize;
    (0..=steps)
        .map(|i| {
            let frac = i as f64 / steps as f64;
            CurvePoint {
                time_years: years * frac,
                soh_pct: initial_pct + (final_pct - initial_pct) * frac,
                r_int_ohm: None,
            }
        })
        .collect()
}

use crate::error::{Error, Result};

/// Capacity-fade rate as a function of depth of discharge.
///
/// Each point pairs a DoD percentage with a capacity loss per 100 equivalent
/// full cycles (EFC). Lookups interpolate linearly between points and
/// extrapolate linearly past the first/last point, after clamping the queried
/// DoD to \[0, 100\]. The returned rate is never negative.
///
/// The table is an input: it can come from a physics model run elsewhere or
/// from a hand-calibrated fit. Nothing here depends on how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradationTable {
    dod_pct: Vec<f64>,
    rate_per_100_efc: Vec<f64>,
}

impl DegradationTable {
    /// Builds a table from `(dod_pct, rate_per_100_efc)` points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if fewer than two points are given, any
    /// value is non-finite, DoD is not strictly increasing or the rates
    /// decrease with DoD.
    pub fn new(points: &[(f64, f64)]) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::invalid(
                "degradation",
                "table needs at least two (dod_pct, rate) points",
            ));
        }
        if points.iter().any(|(d, r)| !d.is_finite() || !r.is_finite()) {
            return Err(Error::invalid("degradation", "table values must be finite"));
        }
        for pair in points.windows(2) {
            let ((d0, r0), (d1, r1)) = (pair[0], pair[1]);
            if d1 <= d0 {
                return Err(Error::invalid(
                    "degradation.dod_pct",
                    format!("must be strictly increasing, got {d0} then {d1}"),
                ));
            }
            if r1 < r0 {
                return Err(Error::invalid(
                    "degradation.rate_per_100_efc",
                    format!("must be non-decreasing in DoD, got {r0} then {r1}"),
                ));
            }
        }

        Ok(Self {
            dod_pct: points.iter().map(|p| p.0).collect(),
            rate_per_100_efc: points.iter().map(|p| p.1).collect(),
        })
    }

    /// The calibration used for the second-life pack study.
    pub fn reference() -> Self {
        Self {
            dod_pct: vec![0.0, 10.0, 50.0, 100.0],
            rate_per_100_efc: vec![0.0, 0.015, 0.075, 0.150],
        }
    }

    /// Table breakpoints as `(dod_pct, rate_per_100_efc)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.dod_pct
            .iter()
            .copied()
            .zip(self.rate_per_100_efc.iter().copied())
    }

    /// Capacity loss per 100 EFC at the given depth of discharge.
    pub fn rate_per_100_efc(&self, dod_pct: f64) -> f64 {
        let dod = dod_pct.clamp(0.0, 100.0);
        let n = self.dod_pct.len();

        // Segment used for interpolation; the outer segments double as the
        // extrapolation lines.
        let upper = self
            .dod_pct
            .iter()
            .position(|&d| d >= dod)
            .unwrap_or(n - 1)
            .clamp(1, n - 1);
        let lower = upper - 1;

        let (x0, x1) = (self.dod_pct[lower], self.dod_pct[upper]);
        let (y0, y1) = (self.rate_per_100_efc[lower], self.rate_per_100_efc[upper]);
        let rate = y0 + (y1 - y0) * (dod - x0) / (x1 - x0);
        rate.max(0.0)
    }

    /// Fractional SoH loss per single EFC at the given depth of discharge.
    pub fn rate_per_efc(&self, dod_pct: f64) -> f64 {
        self.rate_per_100_efc(dod_pct) / 100.0
    }
}

impl Default for DegradationTable {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exact_at_breakpoints() {
        let table = DegradationTable::reference();
        assert_eq!(table.rate_per_100_efc(0.0), 0.0);
        assert_relative_eq!(table.rate_per_100_efc(10.0), 0.015, epsilon = 1e-12);
        assert_relative_eq!(table.rate_per_100_efc(50.0), 0.075, epsilon = 1e-12);
        assert_relative_eq!(table.rate_per_100_efc(100.0), 0.150, epsilon = 1e-12);
    }

    #[test]
    fn interpolates_between_breakpoints() {
        let table = DegradationTable::reference();
        let blend = 0.015 + (0.075 - 0.015) * (30.0 - 10.0) / (50.0 - 10.0);
        assert_relative_eq!(table.rate_per_100_efc(30.0), blend, epsilon = 1e-12);
        assert_relative_eq!(table.rate_per_efc(30.0), blend / 100.0, epsilon = 1e-14);
    }

    #[test]
    fn monotonic_over_full_range() {
        let table = DegradationTable::reference();
        let mut prev = table.rate_per_100_efc(0.0);
        for step in 1..=1000 {
            let rate = table.rate_per_100_efc(f64::from(step) * 0.1);
            assert!(rate >= prev, "rate decreased at dod={}", f64::from(step) * 0.1);
            prev = rate;
        }
    }

    #[test]
    fn dod_is_clamped() {
        let table = DegradationTable::reference();
        assert_eq!(table.rate_per_100_efc(-20.0), table.rate_per_100_efc(0.0));
        assert_eq!(table.rate_per_100_efc(140.0), table.rate_per_100_efc(100.0));
    }

    #[test]
    fn extrapolates_beyond_table_domain() {
        let table = DegradationTable::new(&[(20.0, 0.02), (80.0, 0.08)]).unwrap();
        assert_relative_eq!(table.rate_per_100_efc(100.0), 0.10, epsilon = 1e-12);
        assert_relative_eq!(table.rate_per_100_efc(10.0), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn extrapolation_never_goes_negative() {
        let table = DegradationTable::new(&[(40.0, 0.01), (60.0, 0.05)]).unwrap();
        // The extrapolated line crosses zero at 35% DoD.
        assert_eq!(table.rate_per_100_efc(0.0), 0.0);
    }

    #[test]
    fn rejects_decreasing_rates() {
        let err = DegradationTable::new(&[(0.0, 0.1), (50.0, 0.05)]).unwrap_err();
        assert!(err.to_string().contains("rate_per_100_efc"));
    }

    #[test]
    fn rejects_single_point() {
        assert!(DegradationTable::new(&[(100.0, 0.15)]).is_err());
    }

    #[test]
    fn rejects_unsorted_dod() {
        assert!(DegradationTable::new(&[(50.0, 0.05), (10.0, 0.05)]).is_err());
    }
}

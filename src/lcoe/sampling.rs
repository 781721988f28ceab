//! Input distributions for the Monte Carlo LCOE study.
//!
//! Every spread is the full width of a 2σ band as a percentage of the nominal
//! value, so a 20% spread on a CAPEX of 200 $/kWh gives σ = 20 $/kWh.

use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal};

use super::model::CostSample;
use crate::error::{Error, Result};

/// Percent spreads and lower bounds for each uncertain input.
#[derive(Debug, Clone, PartialEq)]
pub struct UncertaintySpec {
    /// CAPEX per kWh spread (% of nominal, log-normal).
    pub capex_spread_pct: f64,
    /// Discount rate spread (% of nominal, normal).
    pub discount_spread_pct: f64,
    /// OPEX fraction spread (% of nominal, normal).
    pub opex_spread_pct: f64,
    /// Degradation factor spread (% around 1.0, normal).
    pub degradation_spread_pct: f64,
    /// Lowest sampled discount rate.
    pub discount_floor: f64,
    /// Lowest sampled OPEX fraction.
    pub opex_floor: f64,
    /// Lowest sampled degradation factor.
    pub degradation_floor: f64,
}

impl Default for UncertaintySpec {
    fn default() -> Self {
        Self {
            capex_spread_pct: 20.0,
            discount_spread_pct: 20.0,
            opex_spread_pct: 50.0,
            degradation_spread_pct: 20.0,
            discount_floor: 0.01,
            opex_floor: 0.005,
            degradation_floor: 0.8,
        }
    }
}

impl UncertaintySpec {
    /// All spreads zero: every draw equals the nominal inputs.
    pub fn deterministic() -> Self {
        Self {
            capex_spread_pct: 0.0,
            discount_spread_pct: 0.0,
            opex_spread_pct: 0.0,
            degradation_spread_pct: 0.0,
            ..Self::default()
        }
    }
}

/// Log-normal `(mu, sigma)` whose mean is `nominal` and whose standard
/// deviation is `nominal * spread_pct / 200`. The median sits slightly lower,
/// at `nominal / sqrt(1 + cv²)`.
///
/// # Examples
///
/// ```
/// use slb_sim::lcoe::sampling::lognormal_params;
///
/// let (mu, sigma) = lognormal_params(200.0, 0.0);
/// assert_eq!(sigma, 0.0);
/// assert!((mu - 200f64.ln()).abs() < 1e-12);
/// ```
pub fn lognormal_params(nominal: f64, spread_pct: f64) -> (f64, f64) {
    let cv = spread_pct / 200.0;
    let var_ratio = 1.0 + cv * cv;
    let sigma = var_ratio.ln().sqrt();
    let mu = (nominal / var_ratio.sqrt()).ln();
    (mu, sigma)
}

/// Standard deviation for a normal input with a 2σ band of `spread_pct`.
fn normal_sigma(nominal: f64, spread_pct: f64) -> f64 {
    nominal * spread_pct / 100.0 / 2.0
}

/// Draws [`CostSample`]s around a nominal sample.
///
/// Inputs with a zero spread are not sampled at all and come back as the
/// exact nominal value.
#[derive(Debug, Clone)]
pub struct InputSampler {
    nominal: CostSample,
    capex: Option<LogNormal<f64>>,
    discount: Option<Normal<f64>>,
    opex: Option<Normal<f64>>,
    degradation: Option<Normal<f64>>,
    spec: UncertaintySpec,
}

impl InputSampler {
    /// Builds the distributions for `nominal` under `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a negative or non-finite spread, a
    /// floor outside its physical range (discount and degradation floors must
    /// be > 0, the OPEX floor >= 0), or a non-positive nominal CAPEX.
    pub fn new(nominal: CostSample, spec: UncertaintySpec) -> Result<Self> {
        for (floor, field, allow_zero) in [
            (spec.discount_floor, "monte_carlo.discount_floor", false),
            (spec.opex_floor, "monte_carlo.opex_floor", true),
            (spec.degradation_floor, "monte_carlo.degradation_floor", false),
        ] {
            let in_range = if allow_zero { floor >= 0.0 } else { floor > 0.0 };
            if !floor.is_finite() || !in_range {
                let bound = if allow_zero { ">= 0" } else { "> 0" };
                return Err(Error::invalid(field, format!("must be finite and {bound}")));
            }
        }
        let capex = if spec.capex_spread_pct == 0.0 {
            None
        } else {
            if !spec.capex_spread_pct.is_finite() || spec.capex_spread_pct < 0.0 {
                return Err(Error::invalid(
                    "monte_carlo.capex_spread_pct",
                    "must be finite and >= 0",
                ));
            }
            if !(nominal.capex_per_kwh > 0.0) {
                return Err(Error::invalid(
                    "economics.capex_per_kwh",
                    "must be > 0 to sample a log-normal",
                ));
            }
            let (mu, sigma) = lognormal_params(nominal.capex_per_kwh, spec.capex_spread_pct);
            Some(
                LogNormal::new(mu, sigma)
                    .map_err(|e| Error::invalid("monte_carlo.capex_spread_pct", e.to_string()))?,
            )
        };
        let discount = normal(
            nominal.discount_rate,
            spec.discount_spread_pct,
            "monte_carlo.discount_spread_pct",
        )?;
        let opex = normal(
            nominal.opex_fraction,
            spec.opex_spread_pct,
            "monte_carlo.opex_spread_pct",
        )?;
        let degradation = normal(
            nominal.degradation_factor,
            spec.degradation_spread_pct,
            "monte_carlo.degradation_spread_pct",
        )?;

        Ok(Self {
            nominal,
            capex,
            discount,
            opex,
            degradation,
            spec,
        })
    }

    /// Draws one set of inputs. Normal draws are floored at their configured
    /// minimum.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> CostSample {
        CostSample {
            capex_per_kwh: self
                .capex
                .as_ref()
                .map_or(self.nominal.capex_per_kwh, |d| d.sample(rng)),
            discount_rate: self.discount.as_ref().map_or(self.nominal.discount_rate, |d| {
                d.sample(rng).max(self.spec.discount_floor)
            }),
            opex_fraction: self.opex.as_ref().map_or(self.nominal.opex_fraction, |d| {
                d.sample(rng).max(self.spec.opex_floor)
            }),
            degradation_factor: self
                .degradation
                .as_ref()
                .map_or(self.nominal.degradation_factor, |d| {
                    d.sample(rng).max(self.spec.degradation_floor)
                }),
        }
    }
}

fn normal(nominal: f64, spread_pct: f64, field: &str) -> Result<Option<Normal<f64>>> {
    if spread_pct == 0.0 {
        return Ok(None);
    }
    if !spread_pct.is_finite() || spread_pct < 0.0 {
        return Err(Error::invalid(field, "must be finite and >= 0"));
    }
    Normal::new(nominal, normal_sigma(nominal, spread_pct).abs())
        .map(Some)
        .map_err(|e| Error::invalid(field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn nominal() -> CostSample {
        CostSample {
            capex_per_kwh: 200.0,
            discount_rate: 0.08,
            opex_fraction: 0.02,
            degradation_factor: 1.0,
        }
    }

    #[test]
    fn lognormal_params_follow_two_sigma_convention() {
        let (mu, sigma) = lognormal_params(200.0, 20.0);
        let expected_sigma = (1.0f64 + 0.1 * 0.1).ln().sqrt();
        assert_relative_eq!(sigma, expected_sigma, epsilon = 1e-12);
        assert_relative_eq!(mu, 200f64.ln() - expected_sigma.powi(2) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_spread_returns_nominal_exactly() {
        let sampler = InputSampler::new(nominal(), UncertaintySpec::deterministic()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(sampler.sample(&mut rng), nominal());
        }
    }

    #[test]
    fn floors_bound_normal_tails() {
        let spec = UncertaintySpec {
            discount_spread_pct: 400.0,
            opex_spread_pct: 400.0,
            degradation_spread_pct: 400.0,
            ..UncertaintySpec::default()
        };
        let sampler = InputSampler::new(nominal(), spec).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let s = sampler.sample(&mut rng);
            assert!(s.discount_rate >= 0.01);
            assert!(s.opex_fraction >= 0.005);
            assert!(s.degradation_factor >= 0.8);
            assert!(s.capex_per_kwh > 0.0);
        }
    }

    #[test]
    fn capex_mean_is_nominal_and_median_below() {
        let sampler = InputSampler::new(nominal(), UncertaintySpec::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut draws: Vec<f64> = (0..100_000)
            .map(|_| sampler.sample(&mut rng).capex_per_kwh)
            .collect();
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        draws.sort_by(f64::total_cmp);
        let median = draws[draws.len() / 2];

        // cv = 0.1: median = 200 / sqrt(1.01) ≈ 199.007, σ of the mean ≈ 0.063.
        let expected_median = 200.0 / 1.01f64.sqrt();
        assert!((mean - 200.0).abs() < 0.3, "mean {mean}");
        assert!((median - expected_median).abs() < 0.3, "median {median}");
        assert!(median < mean);
    }

    #[test]
    fn floors_outside_physical_range_are_rejected() {
        for spec in [
            UncertaintySpec {
                discount_floor: -5.0,
                ..UncertaintySpec::default()
            },
            UncertaintySpec {
                discount_floor: 0.0,
                ..UncertaintySpec::default()
            },
            UncertaintySpec {
                opex_floor: -0.01,
                ..UncertaintySpec::default()
            },
            UncertaintySpec {
                degradation_floor: -1.0,
                ..UncertaintySpec::default()
            },
            UncertaintySpec {
                degradation_floor: f64::NAN,
                ..UncertaintySpec::default()
            },
        ] {
            let err = InputSampler::new(nominal(), spec.clone()).unwrap_err();
            assert!(err.to_string().contains("floor"), "{spec:?}: {err}");
        }

        let zero_opex_floor = UncertaintySpec {
            opex_floor: 0.0,
            ..UncertaintySpec::default()
        };
        assert!(InputSampler::new(nominal(), zero_opex_floor).is_ok());
    }

    #[test]
    fn wide_spreads_stay_physical() {
        let spec = UncertaintySpec {
            discount_spread_pct: 3000.0,
            degradation_spread_pct: 400.0,
            ..UncertaintySpec::default()
        };
        let sampler = InputSampler::new(nominal(), spec).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..2000 {
            let s = sampler.sample(&mut rng);
            assert!(s.discount_rate > 0.0);
            assert!(s.degradation_factor > 0.0);
        }
    }

    #[test]
    fn negative_spread_is_rejected() {
        let spec = UncertaintySpec {
            opex_spread_pct: -1.0,
            ..UncertaintySpec::default()
        };
        assert!(InputSampler::new(nominal(), spec).is_err());
    }
}

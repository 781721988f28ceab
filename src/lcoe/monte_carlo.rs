//! Monte Carlo propagation of cost and degradation uncertainty into LCOE.

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::model::{CostSample, LcoeModel, MaxCapex};
use super::sampling::{InputSampler, UncertaintySpec};
use super::sensitivity::{SensitivityEntry, global_sensitivity};
use super::stats::{mean, percentile, sorted};
use crate::error::{Error, Result};

/// Percentiles reported by default.
pub const DEFAULT_PERCENTILES: [f64; 3] = [10.0, 50.0, 90.0];

/// Inputs and result of one Monte Carlo iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub iteration: usize,
    pub sample: CostSample,
    /// Sampled CAPEX per kWh times capacity.
    pub capex_total: f64,
    /// `None` when the iteration was excluded (non-positive energy PV).
    pub lcoe: Option<f64>,
}

/// Runs the LCOE model over sampled inputs.
///
/// Inputs are drawn sequentially from one seeded generator, so a given seed
/// always yields the same sample table regardless of thread count. The LCOE
/// evaluations are independent and run on the rayon pool.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    model: LcoeModel,
    sampler: InputSampler,
    percentiles: Vec<f64>,
    risk_percentile: f64,
}

impl MonteCarloEngine {
    /// Creates an engine reporting P10/P50/P90 with P90 as the risk level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the spreads cannot form valid
    /// distributions around the model's nominal inputs.
    pub fn new(model: LcoeModel, uncertainty: UncertaintySpec) -> Result<Self> {
        let sampler = InputSampler::new(model.nominal_sample(), uncertainty)?;
        Ok(Self {
            model,
            sampler,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            risk_percentile: 90.0,
        })
    }

    /// Sets the reported percentiles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if any value is outside `[0, 100]`.
    pub fn with_percentiles(mut self, percentiles: Vec<f64>) -> Result<Self> {
        if let Some(p) = percentiles.iter().find(|p| !(0.0..=100.0).contains(*p)) {
            return Err(Error::invalid(
                "monte_carlo.percentiles",
                format!("{p} is outside [0, 100]"),
            ));
        }
        self.percentiles = percentiles;
        Ok(self)
    }

    /// Sets the percentile used for the affordability threshold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `p` is outside `[0, 100]`.
    pub fn with_risk_percentile(mut self, p: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&p) {
            return Err(Error::invalid(
                "monte_carlo.risk_percentile",
                format!("{p} is outside [0, 100]"),
            ));
        }
        self.risk_percentile = p;
        Ok(self)
    }

    pub fn model(&self) -> &LcoeModel {
        &self.model
    }

    /// Draws `iterations` input sets and evaluates each one.
    ///
    /// With `seed = None` a fresh seed is taken from the OS; the seed actually
    /// used is recorded in the report.
    pub fn run(&self, iterations: usize, seed: Option<u64>) -> MonteCarloReport {
        let seed = seed.unwrap_or_else(rand::random);
        info!(iterations, seed, "Starting Monte Carlo LCOE run");

        let mut rng = StdRng::seed_from_u64(seed);
        let draws: Vec<CostSample> = (0..iterations)
            .map(|_| self.sampler.sample(&mut rng))
            .collect();

        let samples: Vec<SampleRecord> = draws
            .par_iter()
            .enumerate()
            .map(|(iteration, sample)| {
                let breakdown = self.model.evaluate(sample);
                SampleRecord {
                    iteration,
                    sample: *sample,
                    capex_total: breakdown.capex_total,
                    lcoe: breakdown.lcoe,
                }
            })
            .collect();

        let report = MonteCarloReport::from_samples(self, iterations, seed, samples);
        if report.excluded > 0 {
            warn!(
                excluded = report.excluded,
                "Iterations excluded for non-positive energy present value"
            );
        }
        debug!(valid = report.valid(), "Monte Carlo statistics computed");
        report
    }
}

/// Distribution summary of a Monte Carlo run.
#[derive(Debug, Clone)]
pub struct MonteCarloReport {
    pub iterations: usize,
    /// Seed that reproduces this run.
    pub seed: u64,
    /// Every iteration, including excluded ones.
    pub samples: Vec<SampleRecord>,
    /// Iterations without a valid LCOE.
    pub excluded: usize,
    pub mean_lcoe: Option<f64>,
    /// `(percentile, LCOE)` pairs in the requested order.
    pub percentiles: Vec<(f64, Option<f64>)>,
    pub risk_percentile: f64,
    pub risk_lcoe: Option<f64>,
    /// Highest CAPEX that meets the risk-percentile LCOE.
    pub max_capex: Option<MaxCapex>,
    /// LCOE under the nominal inputs.
    pub nominal_lcoe: Option<f64>,
    pub sensitivity: Vec<SensitivityEntry>,
}

impl MonteCarloReport {
    fn from_samples(
        engine: &MonteCarloEngine,
        iterations: usize,
        seed: u64,
        samples: Vec<SampleRecord>,
    ) -> Self {
        let lcoe: Vec<f64> = samples.iter().filter_map(|r| r.lcoe).collect();
        let excluded = samples.len() - lcoe.len();
        let ordered = sorted(&lcoe);

        let percentiles = engine
            .percentiles
            .iter()
            .map(|&p| (p, percentile(&ordered, p)))
            .collect();
        let risk_lcoe = percentile(&ordered, engine.risk_percentile);
        let max_capex = risk_lcoe.map(|target| engine.model.max_affordable_capex(target));
        let sensitivity = global_sensitivity(&samples);

        Self {
            iterations,
            seed,
            excluded,
            mean_lcoe: mean(&lcoe),
            percentiles,
            risk_percentile: engine.risk_percentile,
            risk_lcoe,
            max_capex,
            nominal_lcoe: engine.model.evaluate_nominal().lcoe,
            sensitivity,
            samples,
        }
    }

    /// Iterations with a valid LCOE.
    pub fn valid(&self) -> usize {
        self.samples.len() - self.excluded
    }

    /// LCOE values of the valid iterations, in iteration order.
    pub fn lcoe_values(&self) -> Vec<f64> {
        self.samples.iter().filter_map(|r| r.lcoe).collect()
    }

    /// LCOE at `p`, if `p` was one of the reported percentiles.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|(q, _)| *q == p)
            .and_then(|(_, v)| *v)
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$}"))
}

impl fmt::Display for MonteCarloReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Monte Carlo LCOE ---")?;
        writeln!(f, "Iterations: {}", self.iterations)?;
        writeln!(f, "Seed: {}", self.seed)?;
        writeln!(f, "Excluded iterations: {}", self.excluded)?;
        writeln!(f, "Nominal LCOE: {} $/kWh", fmt_opt(self.nominal_lcoe, 4))?;
        writeln!(f, "LCOE mean: {} $/kWh", fmt_opt(self.mean_lcoe, 4))?;
        for (p, value) in &self.percentiles {
            writeln!(f, "LCOE P{p}: {} $/kWh", fmt_opt(*value, 4))?;
        }
        writeln!(
            f,
            "Max CAPEX total (P{}): {} $",
            self.risk_percentile,
            fmt_opt(self.max_capex.map(|m| m.total), 2)
        )?;
        writeln!(
            f,
            "Max CAPEX per kWh (P{}): {} $/kWh",
            self.risk_percentile,
            fmt_opt(self.max_capex.map(|m| m.per_kwh), 2)
        )?;
        write!(f, "--- Global Sensitivity (Spearman) ---")?;
        for entry in &self.sensitivity {
            let rho = entry
                .rho
                .map_or_else(|| "n/a".to_string(), |r| format!("{r:+.3}"));
            write!(f, "\n{}: {}", entry.input, rho)?;
        }
        Ok(())
    }
}

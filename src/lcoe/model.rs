//! Discounted life-cycle cost and energy model.

use std::fmt;

use super::curve::DegradationCurve;
use crate::error::{Error, Result};

/// Nominal techno-economic parameters of a storage project.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomicParams {
    /// Nameplate storage capacity (kWh).
    pub capacity_kwh: f64,
    /// Up-front CAPEX per kWh of capacity.
    pub capex_per_kwh: f64,
    /// Real discount rate (fraction per year).
    pub discount_rate: f64,
    /// Annual OPEX as a fraction of total CAPEX.
    pub opex_fraction: f64,
    /// Yearly decline of replacement cost (0 = flat future cost).
    pub cost_reduction_rate: f64,
    /// Replacement cost as a fraction of the initial CAPEX.
    pub replacement_cost_fraction: f64,
    /// Project years in which the pack is replaced.
    pub replacement_years: Vec<usize>,
    /// Economic lifetime (years).
    pub lifetime_years: usize,
    /// Energy delivered in a year at the initial SoH (kWh).
    pub base_annual_energy_kwh: f64,
    /// Lowest relative SoH the adjusted curve may reach.
    pub soh_floor: f64,
}

impl Default for EconomicParams {
    fn default() -> Self {
        Self {
            capacity_kwh: 38.8,
            capex_per_kwh: 200.0,
            discount_rate: 0.08,
            opex_fraction: 0.02,
            cost_reduction_rate: 0.0,
            replacement_cost_fraction: 1.0,
            replacement_years: vec![10, 20],
            lifetime_years: 25,
            base_annual_energy_kwh: EnergyModel::default().annual_energy_kwh(),
            soh_floor: 0.875,
        }
    }
}

/// Derives the annual energy throughput of a second-life pack.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyModel {
    pub capacity_kwh: f64,
    /// SoH at the start of second life (fraction of nameplate).
    pub initial_soh: f64,
    /// Operating depth-of-discharge limit (fraction).
    pub max_dod: f64,
    pub round_trip_efficiency: f64,
    /// Days per year with one cycle.
    pub operating_days: f64,
}

impl Default for EnergyModel {
    fn default() -> Self {
        Self {
            capacity_kwh: 38.8,
            initial_soh: 0.80,
            max_dod: 0.25,
            round_trip_efficiency: 0.75,
            operating_days: 365.0,
        }
    }
}

impl EnergyModel {
    /// Energy delivered per cycle day (kWh).
    pub fn daily_energy_kwh(&self) -> f64 {
        self.capacity_kwh * self.initial_soh * self.max_dod * self.round_trip_efficiency
    }

    /// Energy delivered per year (kWh).
    pub fn annual_energy_kwh(&self) -> f64 {
        self.daily_energy_kwh() * self.operating_days
    }
}

/// Converts a real discount rate to a nominal one (Fisher relation).
///
/// # Examples
///
/// ```
/// use slb_sim::lcoe::model::nominal_discount_rate;
///
/// let r = nominal_discount_rate(0.08, 0.02);
/// assert!((r - 0.1016).abs() < 1e-12);
/// ```
pub fn nominal_discount_rate(real_rate: f64, inflation_rate: f64) -> f64 {
    (1.0 + real_rate) * (1.0 + inflation_rate) - 1.0
}

/// `1 / (1 + r)^t` for `t = 1..=years`.
pub fn discount_factors(rate: f64, years: usize) -> Vec<f64> {
    let base = 1.0 + rate;
    (1..=years).map(|t| base.powi(t as i32).recip()).collect()
}

/// One realisation of the uncertain inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostSample {
    pub capex_per_kwh: f64,
    pub discount_rate: f64,
    pub opex_fraction: f64,
    /// Multiplier on the relative SoH curve (1.0 = nominal).
    pub degradation_factor: f64,
}

/// Present values behind one LCOE evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LcoeBreakdown {
    pub capex_total: f64,
    pub opex_npv: f64,
    pub replacement_npv: f64,
    /// CAPEX plus discounted OPEX and replacements.
    pub total_cost_npv: f64,
    /// Discounted energy delivered (kWh).
    pub energy_npv: f64,
    /// Cost per kWh; `None` when the energy present value is not positive.
    pub lcoe: Option<f64>,
}

impl fmt::Display for LcoeBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Nominal LCOE ---")?;
        writeln!(f, "CAPEX total: {:.2} $", self.capex_total)?;
        writeln!(f, "OPEX NPV: {:.2} $", self.opex_npv)?;
        writeln!(f, "Replacement NPV: {:.2} $", self.replacement_npv)?;
        writeln!(f, "Life-cycle cost NPV: {:.2} $", self.total_cost_npv)?;
        writeln!(f, "Energy NPV: {:.2} kWh", self.energy_npv)?;
        match self.lcoe {
            Some(lcoe) => write!(f, "LCOE: {lcoe:.4} $/kWh"),
            None => write!(f, "LCOE: n/a $/kWh"),
        }
    }
}

/// Affordability threshold derived from a target LCOE.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxCapex {
    pub total: f64,
    pub per_kwh: f64,
}

/// Nominal cash flows of one project year.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualRow {
    pub year: usize,
    pub relative_soh: f64,
    pub energy_kwh: f64,
    pub discount_factor: f64,
    pub energy_pv_kwh: f64,
    pub opex: f64,
    pub replacement_cost: f64,
}

/// Levelized cost of energy for a storage project with a degradation curve.
#[derive(Debug, Clone)]
pub struct LcoeModel {
    params: EconomicParams,
    curve: DegradationCurve,
}

impl LcoeModel {
    /// Validates `params` against `curve`.
    ///
    /// Replacement years outside `1..=lifetime_years` are kept but never
    /// contribute a cost.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the lifetime is zero, the curve
    /// covers fewer years than the lifetime, or a capacity, energy or rate is
    /// out of range.
    pub fn new(params: EconomicParams, curve: DegradationCurve) -> Result<Self> {
        if params.lifetime_years == 0 {
            return Err(Error::invalid("economics.lifetime_years", "must be > 0"));
        }
        if curve.len() < params.lifetime_years {
            return Err(Error::invalid(
                "curve",
                format!(
                    "covers {} years, lifetime is {}",
                    curve.len(),
                    params.lifetime_years
                ),
            ));
        }
        if !(params.capacity_kwh > 0.0) {
            return Err(Error::invalid("economics.capacity_kwh", "must be > 0"));
        }
        if !(params.base_annual_energy_kwh >= 0.0) {
            return Err(Error::invalid(
                "economics.base_annual_energy_kwh",
                "must be >= 0",
            ));
        }
        if !(params.discount_rate > -1.0) {
            return Err(Error::invalid("economics.discount_rate", "must be > -1"));
        }
        if !(0.0..1.0).contains(&params.cost_reduction_rate) {
            return Err(Error::invalid(
                "economics.cost_reduction_rate",
                "must be in [0, 1)",
            ));
        }
        Ok(Self { params, curve })
    }

    pub fn params(&self) -> &EconomicParams {
        &self.params
    }

    pub fn curve(&self) -> &DegradationCurve {
        &self.curve
    }

    /// The non-sampled inputs.
    pub fn nominal_sample(&self) -> CostSample {
        CostSample {
            capex_per_kwh: self.params.capex_per_kwh,
            discount_rate: self.params.discount_rate,
            opex_fraction: self.params.opex_fraction,
            degradation_factor: 1.0,
        }
    }

    /// Replacement years that fall within the project lifetime.
    fn replacements(&self) -> impl Iterator<Item = usize> + '_ {
        self.params
            .replacement_years
            .iter()
            .copied()
            .filter(|y| (1..=self.params.lifetime_years).contains(y))
    }

    /// Cost of a replacement in `year` per unit of initial CAPEX.
    fn replacement_factor(&self, year: usize) -> f64 {
        self.params.replacement_cost_fraction
            * (1.0 - self.params.cost_reduction_rate).powi(year as i32)
    }

    /// Evaluates the discounted costs, energy and LCOE for one sample.
    pub fn evaluate(&self, sample: &CostSample) -> LcoeBreakdown {
        let years = self.params.lifetime_years;
        let df = discount_factors(sample.discount_rate, years);
        let soh = self
            .curve
            .adjusted(sample.degradation_factor, self.params.soh_floor, years);

        let energy_npv: f64 = soh
            .iter()
            .zip(&df)
            .map(|(s, d)| self.params.base_annual_energy_kwh * s * d)
            .sum();

        let capex_total = sample.capex_per_kwh * self.params.capacity_kwh;
        let opex_annual = capex_total * sample.opex_fraction;
        let opex_npv: f64 = df.iter().map(|d| opex_annual * d).sum();
        let replacement_npv: f64 = self
            .replacements()
            .map(|y| capex_total * self.replacement_factor(y) * df[y - 1])
            .sum();

        let total_cost_npv = capex_total + opex_npv + replacement_npv;
        let lcoe = (energy_npv > 0.0).then(|| total_cost_npv / energy_npv);

        LcoeBreakdown {
            capex_total,
            opex_npv,
            replacement_npv,
            total_cost_npv,
            energy_npv,
            lcoe,
        }
    }

    /// Evaluates the nominal inputs.
    pub fn evaluate_nominal(&self) -> LcoeBreakdown {
        self.evaluate(&self.nominal_sample())
    }

    /// Life-cycle cost per unit of initial CAPEX at the nominal discount rate:
    /// `1 + opex * Σdf + Σ replacement_factor(y) * df(y)`.
    pub fn lcc_capex_multiplier(&self) -> f64 {
        let df = discount_factors(self.params.discount_rate, self.params.lifetime_years);
        let opex_factor = self.params.opex_fraction * df.iter().sum::<f64>();
        let replacement_factor: f64 = self
            .replacements()
            .map(|y| self.replacement_factor(y) * df[y - 1])
            .sum();
        1.0 + opex_factor + replacement_factor
    }

    /// Highest initial CAPEX that still meets `target_lcoe` under the nominal
    /// energy yield and cost structure.
    pub fn max_affordable_capex(&self, target_lcoe: f64) -> MaxCapex {
        let energy_npv = self.evaluate_nominal().energy_npv;
        let total = target_lcoe * energy_npv / self.lcc_capex_multiplier();
        MaxCapex {
            total,
            per_kwh: total / self.params.capacity_kwh,
        }
    }

    /// Nominal per-year energy and cost flows.
    pub fn annual_breakdown(&self) -> Vec<AnnualRow> {
        let years = self.params.lifetime_years;
        let df = discount_factors(self.params.discount_rate, years);
        let soh = self.curve.adjusted(1.0, self.params.soh_floor, years);
        let capex_total = self.params.capex_per_kwh * self.params.capacity_kwh;
        let replacements: Vec<usize> = self.replacements().collect();

        (1..=years)
            .map(|year| {
                let energy_kwh = self.params.base_annual_energy_kwh * soh[year - 1];
                let replacement_cost = if replacements.contains(&year) {
                    capex_total * self.replacement_factor(year)
                } else {
                    0.0
                };
                AnnualRow {
                    year,
                    relative_soh: soh[year - 1],
                    energy_kwh,
                    discount_factor: df[year - 1],
                    energy_pv_kwh: energy_kwh * df[year - 1],
                    opex: capex_total * self.params.opex_fraction,
                    replacement_cost,
                }
            })
            .collect()
    }
}

/// Deterministic LCOE at one CAPEX level.
#[derive(Debug, Clone, PartialEq)]
pub struct CapexScenario {
    /// CAPEX change relative to the nominal value (fraction, e.g. -0.1).
    pub delta: f64,
    pub capex_per_kwh: f64,
    /// Total discounted life-cycle cost.
    pub lcc: f64,
    pub lcoe: Option<f64>,
}

/// CAPEX sweep around the nominal value.
#[derive(Debug, Clone)]
pub struct CapexSensitivity {
    pub scenarios: Vec<CapexScenario>,
    /// LCOE at the nominal CAPEX.
    pub base_lcoe: Option<f64>,
}

impl CapexSensitivity {
    /// LCOE change of each scenario relative to the base case.
    pub fn lcoe_deltas(&self) -> Vec<Option<f64>> {
        self.scenarios
            .iter()
            .map(|s| Some(s.lcoe? - self.base_lcoe?))
            .collect()
    }
}

/// Evaluates the nominal model at `capex_per_kwh * (1 + delta)` for each delta.
pub fn capex_sensitivity(model: &LcoeModel, deltas: &[f64]) -> CapexSensitivity {
    let nominal = model.nominal_sample();
    let scenarios = deltas
        .iter()
        .map(|&delta| {
            let sample = CostSample {
                capex_per_kwh: nominal.capex_per_kwh * (1.0 + delta),
                ..nominal
            };
            let breakdown = model.evaluate(&sample);
            CapexScenario {
                delta,
                capex_per_kwh: sample.capex_per_kwh,
                lcc: breakdown.total_cost_npv,
                lcoe: breakdown.lcoe,
            }
        })
        .collect();
    CapexSensitivity {
        scenarios,
        base_lcoe: model.evaluate_nominal().lcoe,
    }
}

impl fmt::Display for CapexSensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- CAPEX Sensitivity ---")?;
        for (scenario, delta) in self.scenarios.iter().zip(self.lcoe_deltas()) {
            let lcoe = scenario
                .lcoe
                .map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"));
            let delta = delta.map_or_else(|| "n/a".to_string(), |v| format!("{v:+.4}"));
            writeln!(
                f,
                "CAPEX {:+.0}%: {:.2} $/kWh, LCC {:.2} $, LCOE {} $/kWh ({} vs base)",
                scenario.delta * 100.0,
                scenario.capex_per_kwh,
                scenario.lcc,
                lcoe,
                delta
            )?;
        }
        Ok(())
    }
}

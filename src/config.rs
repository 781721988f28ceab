//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::battery::{
    BatteryState, DailyPattern, DegradationTable, DodPolicy, ExhaustionPolicy, HourlyProfile,
};
use crate::error::Result;
use crate::lcoe::curve::DegradationCurve;
use crate::lcoe::model::{EconomicParams, EnergyModel, LcoeModel, nominal_discount_rate};
use crate::lcoe::monte_carlo::MonteCarloEngine;
use crate::lcoe::sampling::UncertaintySpec;
use crate::sim::engine::HourlySimulator;
use crate::sim::types::SimConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Hourly simulation horizon and policies.
    pub simulation: SimulationConfig,
    /// Pack parameters.
    pub battery: BatteryConfig,
    /// DoD-dependent fade table.
    pub degradation: DegradationConfig,
    /// Daily current pattern.
    pub profile: ProfileConfig,
    /// Project economics.
    pub economics: EconomicsConfig,
    /// Source of the yearly SoH curve for the LCOE model.
    pub curve: CurveConfig,
    /// Monte Carlo study parameters.
    pub monte_carlo: MonteCarloConfig,
}

/// Hourly simulation horizon and policies.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of days to simulate (must be > 0).
    pub days: usize,
    /// Initial state of charge (%).
    pub initial_soc_pct: f64,
    /// DoD used for fade lookup: `"reference"` or `"swing_average"`.
    pub dod_policy: String,
    /// DoD looked up under the `"reference"` policy (%).
    pub reference_dod_pct: f64,
    /// Behaviour at zero capacity: `"floor"` or `"halt"`.
    pub exhaustion: String,
    /// Samples per year in the exported degradation curve.
    pub curve_points_per_year: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 365,
            initial_soc_pct: 100.0,
            dod_policy: "reference".to_string(),
            reference_dod_pct: 100.0,
            exhaustion: "floor".to_string(),
            curve_points_per_year: 12,
        }
    }
}

/// Pack parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Nameplate capacity (Ah).
    pub nominal_capacity_ah: f64,
    /// State of health at the start of second life (%).
    pub initial_soh_pct: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            nominal_capacity_ah: 100.0,
            initial_soh_pct: 80.0,
        }
    }
}

/// DoD-dependent fade table as parallel columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DegradationConfig {
    /// Depth-of-discharge breakpoints (%), strictly increasing.
    pub dod_pct: Vec<f64>,
    /// Capacity fade per 100 EFC at each breakpoint (% of initial).
    pub rate_per_100_efc: Vec<f64>,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        let (dod_pct, rate_per_100_efc) = DegradationTable::reference().points().unzip();
        Self {
            dod_pct,
            rate_per_100_efc,
        }
    }
}

/// Daily charge/discharge pattern.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Current as a fraction of nominal capacity per hour.
    pub c_rate: f64,
    /// Explicit discharge current (A), overrides `c_rate`.
    pub discharge_current_a: Option<f64>,
    /// Explicit charge current (A), overrides `c_rate`.
    pub charge_current_a: Option<f64>,
    /// First discharge hour (inclusive).
    pub discharge_start_hour: usize,
    /// Last discharge hour (exclusive).
    pub discharge_end_hour: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            c_rate: 0.25,
            discharge_current_a: None,
            charge_current_a: None,
            discharge_start_hour: 8,
            discharge_end_hour: 20,
        }
    }
}

/// Project economics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicsConfig {
    /// Nameplate storage capacity (kWh).
    pub capacity_kwh: f64,
    pub capex_per_kwh: f64,
    /// Real discount rate.
    pub discount_rate: f64,
    /// Inflation folded into the discount rate (Fisher); 0 keeps it real.
    pub inflation_rate: f64,
    /// Annual OPEX as a fraction of CAPEX.
    pub opex_fraction: f64,
    pub cost_reduction_rate: f64,
    /// Replacement cost as a fraction of initial CAPEX.
    pub replacement_cost_fraction: f64,
    pub replacement_years: Vec<usize>,
    pub lifetime_years: usize,
    /// Direct annual energy (kWh); derived from the fields below when unset.
    pub annual_energy_kwh: Option<f64>,
    /// SoH at the start of second life (fraction).
    pub initial_soh: f64,
    /// Operating DoD limit (fraction).
    pub max_dod: f64,
    pub round_trip_efficiency: f64,
    pub operating_days: f64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        let params = EconomicParams::default();
        let energy = EnergyModel::default();
        Self {
            capacity_kwh: params.capacity_kwh,
            capex_per_kwh: params.capex_per_kwh,
            discount_rate: params.discount_rate,
            inflation_rate: 0.0,
            opex_fraction: params.opex_fraction,
            cost_reduction_rate: params.cost_reduction_rate,
            replacement_cost_fraction: params.replacement_cost_fraction,
            replacement_years: params.replacement_years,
            lifetime_years: params.lifetime_years,
            annual_energy_kwh: None,
            initial_soh: energy.initial_soh,
            max_dod: energy.max_dod,
            round_trip_efficiency: energy.round_trip_efficiency,
            operating_days: energy.operating_days,
        }
    }
}

/// Where the yearly SoH curve comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CurveConfig {
    /// `"linear"` (repeating linear fade) or `"csv"` (degradation file).
    pub source: String,
    /// Degradation CSV for the `"csv"` source.
    pub path: PathBuf,
    /// Relative SoH at the end of each cycle; also the lowest value the
    /// sampled curve may take.
    pub eol_relative_soh: f64,
    /// Replacement cycle (years); 0 disables cycle restarts for CSV curves.
    pub cycle_years: usize,
    /// SoH (%) that maps to a relative value of 1.0 for CSV curves.
    pub soh_reference_pct: f64,
    /// Use the built-in linear approximation when the CSV is missing.
    pub allow_fallback: bool,
    /// SoH (%) at which a CSV curve reaches end of technical life.
    pub eol_pct: f64,
    /// Suffix of the `SOH_Pct_` column in exported curves.
    pub label: String,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            source: "linear".to_string(),
            path: PathBuf::from("degradation_output.csv"),
            eol_relative_soh: 0.875,
            cycle_years: 10,
            soh_reference_pct: 100.0,
            allow_fallback: false,
            eol_pct: 70.0,
            label: "Sim".to_string(),
        }
    }
}

impl CurveConfig {
    /// Cycle length, or `None` when restarts are disabled.
    pub fn cycle(&self) -> Option<usize> {
        (self.cycle_years > 0).then_some(self.cycle_years)
    }
}

/// Monte Carlo study parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonteCarloConfig {
    pub iterations: usize,
    /// Fixed seed; a fresh one is drawn per run when unset.
    pub seed: Option<u64>,
    pub capex_spread_pct: f64,
    pub discount_spread_pct: f64,
    pub opex_spread_pct: f64,
    pub degradation_spread_pct: f64,
    pub discount_floor: f64,
    pub opex_floor: f64,
    pub degradation_floor: f64,
    /// Reported LCOE percentiles.
    pub percentiles: Vec<f64>,
    /// Percentile used for the max-CAPEX threshold.
    pub risk_percentile: f64,
    /// CAPEX changes for the deterministic sweep (fractions).
    pub capex_deltas: Vec<f64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        let spec = UncertaintySpec::default();
        Self {
            iterations: 10_000,
            seed: None,
            capex_spread_pct: spec.capex_spread_pct,
            discount_spread_pct: spec.discount_spread_pct,
            opex_spread_pct: spec.opex_spread_pct,
            degradation_spread_pct: spec.degradation_spread_pct,
            discount_floor: spec.discount_floor,
            opex_floor: spec.opex_floor,
            degradation_floor: spec.degradation_floor,
            percentiles: vec![10.0, 50.0, 90.0],
            risk_percentile: 90.0,
            capex_deltas: vec![-0.1, 0.0, 0.1],
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.days"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// The second-life study: 100 Ah pack at 80% SoH cycled at 0.25 C for a
    /// year, and a 25-year, 38.8 kWh project at 200 $/kWh.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Baseline with every Monte Carlo spread set to zero and a fixed seed.
    pub fn deterministic() -> Self {
        Self {
            monte_carlo: MonteCarloConfig {
                iterations: 100,
                seed: Some(1),
                capex_spread_pct: 0.0,
                discount_spread_pct: 0.0,
                opex_spread_pct: 0.0,
                degradation_spread_pct: 0.0,
                ..MonteCarloConfig::default()
            },
            ..Self::default()
        }
    }

    /// Pessimistic CAPEX case (+10%).
    pub fn high_capex() -> Self {
        Self {
            economics: EconomicsConfig {
                capex_per_kwh: 220.0,
                ..EconomicsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Optimistic CAPEX case (-10%).
    pub fn low_capex() -> Self {
        Self {
            economics: EconomicsConfig {
                capex_per_kwh: 180.0,
                ..EconomicsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Baseline simulator with fade looked up at the mean swing depth.
    pub fn swing_average() -> Self {
        Self {
            simulation: SimulationConfig {
                dod_policy: "swing_average".to_string(),
                ..SimulationConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &[
        "baseline",
        "deterministic",
        "high_capex",
        "low_capex",
        "swing_average",
    ];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> std::result::Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "deterministic" => Ok(Self::deterministic()),
            "high_capex" => Ok(Self::high_capex()),
            "low_capex" => Ok(Self::low_capex()),
            "swing_average" => Ok(Self::swing_average()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError::new(field, message));
            }
        };

        let s = &self.simulation;
        check(s.days > 0, "simulation.days", "must be > 0");
        check(
            (0.0..=100.0).contains(&s.initial_soc_pct),
            "simulation.initial_soc_pct",
            "must be in [0, 100]",
        );
        check(
            matches!(s.dod_policy.as_str(), "reference" | "swing_average"),
            "simulation.dod_policy",
            "must be \"reference\" or \"swing_average\"",
        );
        check(
            (0.0..=100.0).contains(&s.reference_dod_pct),
            "simulation.reference_dod_pct",
            "must be in [0, 100]",
        );
        check(
            matches!(s.exhaustion.as_str(), "floor" | "halt"),
            "simulation.exhaustion",
            "must be \"floor\" or \"halt\"",
        );
        check(
            s.curve_points_per_year > 0,
            "simulation.curve_points_per_year",
            "must be > 0",
        );

        let b = &self.battery;
        check(
            b.nominal_capacity_ah > 0.0,
            "battery.nominal_capacity_ah",
            "must be > 0",
        );
        check(
            b.initial_soh_pct > 0.0 && b.initial_soh_pct <= 100.0,
            "battery.initial_soh_pct",
            "must be in (0, 100]",
        );

        let d = &self.degradation;
        check(
            d.dod_pct.len() == d.rate_per_100_efc.len(),
            "degradation.rate_per_100_efc",
            "must have one entry per degradation.dod_pct value",
        );
        if let Err(e) = self.degradation_table() {
            errors.push(ConfigError::new("degradation", e.to_string()));
        }

        let p = &self.profile;
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError::new(field, message));
            }
        };
        check(p.c_rate >= 0.0, "profile.c_rate", "must be >= 0");
        check(
            p.discharge_current_a.is_none_or(|a| a >= 0.0),
            "profile.discharge_current_a",
            "must be >= 0",
        );
        check(
            p.charge_current_a.is_none_or(|a| a >= 0.0),
            "profile.charge_current_a",
            "must be >= 0",
        );
        check(
            p.discharge_start_hour < p.discharge_end_hour && p.discharge_end_hour <= 24,
            "profile.discharge_start_hour",
            "must be < profile.discharge_end_hour <= 24",
        );

        let e = &self.economics;
        check(e.capacity_kwh > 0.0, "economics.capacity_kwh", "must be > 0");
        check(e.capex_per_kwh > 0.0, "economics.capex_per_kwh", "must be > 0");
        check(e.discount_rate > -1.0, "economics.discount_rate", "must be > -1");
        check(e.opex_fraction >= 0.0, "economics.opex_fraction", "must be >= 0");
        check(
            (0.0..1.0).contains(&e.cost_reduction_rate),
            "economics.cost_reduction_rate",
            "must be in [0, 1)",
        );
        check(
            e.replacement_cost_fraction >= 0.0,
            "economics.replacement_cost_fraction",
            "must be >= 0",
        );
        check(e.lifetime_years > 0, "economics.lifetime_years", "must be > 0");
        check(
            e.replacement_years.iter().all(|&y| y > 0),
            "economics.replacement_years",
            "years are 1-based and must be > 0",
        );
        check(
            e.annual_energy_kwh.is_none_or(|v| v >= 0.0),
            "economics.annual_energy_kwh",
            "must be >= 0",
        );

        let c = &self.curve;
        check(
            matches!(c.source.as_str(), "linear" | "csv"),
            "curve.source",
            "must be \"linear\" or \"csv\"",
        );
        check(
            (0.0..=1.0).contains(&c.eol_relative_soh),
            "curve.eol_relative_soh",
            "must be in [0, 1]",
        );
        check(
            c.source != "linear" || c.cycle_years > 0,
            "curve.cycle_years",
            "must be > 0 for the linear source",
        );
        check(
            c.soh_reference_pct > 0.0,
            "curve.soh_reference_pct",
            "must be > 0",
        );

        let m = &self.monte_carlo;
        check(m.iterations > 0, "monte_carlo.iterations", "must be > 0");
        for (value, field) in [
            (m.capex_spread_pct, "monte_carlo.capex_spread_pct"),
            (m.discount_spread_pct, "monte_carlo.discount_spread_pct"),
            (m.opex_spread_pct, "monte_carlo.opex_spread_pct"),
            (m.degradation_spread_pct, "monte_carlo.degradation_spread_pct"),
        ] {
            check(value >= 0.0, field, "must be >= 0");
        }
        check(
            m.discount_floor > 0.0,
            "monte_carlo.discount_floor",
            "must be > 0",
        );
        check(m.opex_floor >= 0.0, "monte_carlo.opex_floor", "must be >= 0");
        check(
            m.degradation_floor > 0.0,
            "monte_carlo.degradation_floor",
            "must be > 0",
        );
        check(
            m.percentiles.iter().all(|p| (0.0..=100.0).contains(p)),
            "monte_carlo.percentiles",
            "must be in [0, 100]",
        );
        check(
            (0.0..=100.0).contains(&m.risk_percentile),
            "monte_carlo.risk_percentile",
            "must be in [0, 100]",
        );
        check(
            m.capex_deltas.iter().all(|d| *d > -1.0),
            "monte_carlo.capex_deltas",
            "must be > -1",
        );

        errors
    }

    /// Simulation horizon.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig::days(self.simulation.days)
    }

    /// Fade table from the `[degradation]` columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the columns differ in length or do not form a
    /// valid table.
    pub fn degradation_table(&self) -> Result<DegradationTable> {
        let d = &self.degradation;
        if d.dod_pct.len() != d.rate_per_100_efc.len() {
            return Err(ConfigError::new(
                "degradation.rate_per_100_efc",
                "must have one entry per degradation.dod_pct value",
            )
            .into());
        }
        let points: Vec<(f64, f64)> = d
            .dod_pct
            .iter()
            .copied()
            .zip(d.rate_per_100_efc.iter().copied())
            .collect();
        DegradationTable::new(&points)
    }

    pub fn dod_policy(&self) -> DodPolicy {
        match self.simulation.dod_policy.as_str() {
            "swing_average" => DodPolicy::SwingAverage,
            _ => DodPolicy::Reference {
                dod_pct: self.simulation.reference_dod_pct,
            },
        }
    }

    pub fn exhaustion_policy(&self) -> ExhaustionPolicy {
        match self.simulation.exhaustion.as_str() {
            "halt" => ExhaustionPolicy::Halt,
            _ => ExhaustionPolicy::Floor,
        }
    }

    /// Daily pattern; explicit currents win over the C-rate.
    pub fn daily_pattern(&self) -> DailyPattern {
        let p = &self.profile;
        let c_rate_current = self.battery.nominal_capacity_ah * p.c_rate;
        DailyPattern::new(
            p.discharge_current_a.unwrap_or(c_rate_current),
            p.charge_current_a.unwrap_or(c_rate_current),
            p.discharge_start_hour,
            p.discharge_end_hour,
        )
    }

    /// Current profile covering the whole horizon.
    pub fn hourly_profile(&self) -> HourlyProfile {
        HourlyProfile::from_daily_pattern(&self.daily_pattern(), self.sim_config().hours)
    }

    /// Simulator ready to run [`ScenarioConfig::hourly_profile`].
    ///
    /// Call [`ScenarioConfig::validate`] first; invalid values panic in the
    /// battery and profile constructors.
    ///
    /// # Errors
    ///
    /// Returns an error if the degradation table is invalid.
    pub fn simulator(&self) -> Result<HourlySimulator> {
        let battery = BatteryState::new(
            self.battery.nominal_capacity_ah,
            self.battery.initial_soh_pct,
            self.simulation.initial_soc_pct,
        );
        Ok(
            HourlySimulator::new(self.sim_config(), battery, self.degradation_table()?)
                .with_dod_policy(self.dod_policy())
                .with_exhaustion_policy(self.exhaustion_policy()),
        )
    }

    /// Annual energy throughput: the direct value, or the derived one.
    pub fn energy_model(&self) -> EnergyModel {
        let e = &self.economics;
        EnergyModel {
            capacity_kwh: e.capacity_kwh,
            initial_soh: e.initial_soh,
            max_dod: e.max_dod,
            round_trip_efficiency: e.round_trip_efficiency,
            operating_days: e.operating_days,
        }
    }

    /// Nominal economic parameters, with inflation folded into the discount
    /// rate.
    pub fn economic_params(&self) -> EconomicParams {
        let e = &self.economics;
        EconomicParams {
            capacity_kwh: e.capacity_kwh,
            capex_per_kwh: e.capex_per_kwh,
            discount_rate: if e.inflation_rate == 0.0 {
                e.discount_rate
            } else {
                nominal_discount_rate(e.discount_rate, e.inflation_rate)
            },
            opex_fraction: e.opex_fraction,
            cost_reduction_rate: e.cost_reduction_rate,
            replacement_cost_fraction: e.replacement_cost_fraction,
            replacement_years: e.replacement_years.clone(),
            lifetime_years: e.lifetime_years,
            base_annual_energy_kwh: e
                .annual_energy_kwh
                .unwrap_or_else(|| self.energy_model().annual_energy_kwh()),
            soh_floor: self.curve.eol_relative_soh,
        }
    }

    /// LCOE model over `curve`.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve is shorter than the lifetime or the
    /// economics are out of range.
    pub fn lcoe_model(&self, curve: DegradationCurve) -> Result<LcoeModel> {
        LcoeModel::new(self.economic_params(), curve)
    }

    pub fn uncertainty(&self) -> UncertaintySpec {
        let m = &self.monte_carlo;
        UncertaintySpec {
            capex_spread_pct: m.capex_spread_pct,
            discount_spread_pct: m.discount_spread_pct,
            opex_spread_pct: m.opex_spread_pct,
            degradation_spread_pct: m.degradation_spread_pct,
            discount_floor: m.discount_floor,
            opex_floor: m.opex_floor,
            degradation_floor: m.degradation_floor,
        }
    }

    /// Monte Carlo engine over `curve`, with the configured percentiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the model or the distributions are invalid.
    pub fn monte_carlo_engine(&self, curve: DegradationCurve) -> Result<MonteCarloEngine> {
        MonteCarloEngine::new(self.lcoe_model(curve)?, self.uncertainty())?
            .with_percentiles(self.monte_carlo.percentiles.clone())?
            .with_risk_percentile(self.monte_carlo.risk_percentile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent").unwrap_err();
        assert!(err.message.contains("unknown preset"));
        assert!(err.message.contains("swing_average"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
days = 30
initial_soc_pct = 50.0
dod_policy = "swing_average"
exhaustion = "halt"

[battery]
nominal_capacity_ah = 200.0
initial_soh_pct = 75.0

[degradation]
dod_pct = [0.0, 100.0]
rate_per_100_efc = [0.0, 0.2]

[profile]
c_rate = 0.5
discharge_start_hour = 10
discharge_end_hour = 18

[economics]
capex_per_kwh = 150.0
replacement_years = [12]
annual_energy_kwh = 1500.0

[curve]
source = "csv"
path = "curve.csv"
cycle_years = 0
allow_fallback = true

[monte_carlo]
iterations = 500
seed = 7
percentiles = [5.0, 95.0]
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert!(cfg.validate().is_empty());
        assert_eq!(cfg.sim_config().hours, 720);
        assert_eq!(cfg.dod_policy(), DodPolicy::SwingAverage);
        assert_eq!(cfg.exhaustion_policy(), ExhaustionPolicy::Halt);
        assert_eq!(cfg.daily_pattern().discharge_current_a, 100.0);
        assert_eq!(cfg.economic_params().base_annual_energy_kwh, 1500.0);
        assert_eq!(cfg.curve.cycle(), None);
        assert_eq!(cfg.monte_carlo.seed, Some(7));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
days = 10
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = ScenarioConfig::from_toml_str("[economics]\ncapex_per_kwh = 250.0\n").unwrap();
        assert_eq!(cfg.economics.capex_per_kwh, 250.0);
        assert_eq!(cfg.economics.lifetime_years, 25);
        assert_eq!(cfg.simulation.days, 365);
        assert_eq!(cfg.monte_carlo.seed, None);
    }

    #[test]
    fn validation_catches_bad_policy_strings() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.dod_policy = "average".to_string();
        cfg.simulation.exhaustion = "stop".to_string();
        cfg.curve.source = "pybamm".to_string();
        let errors = cfg.validate();
        for field in ["simulation.dod_policy", "simulation.exhaustion", "curve.source"] {
            assert!(errors.iter().any(|e| e.field == field), "missing {field}");
        }
    }

    #[test]
    fn validation_catches_non_physical_floors() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.monte_carlo.discount_floor = -5.0;
        cfg.monte_carlo.opex_floor = -0.01;
        cfg.monte_carlo.degradation_floor = -1.0;
        let errors = cfg.validate();
        for field in [
            "monte_carlo.discount_floor",
            "monte_carlo.opex_floor",
            "monte_carlo.degradation_floor",
        ] {
            assert!(errors.iter().any(|e| e.field == field), "missing {field}");
        }

        cfg.monte_carlo.discount_floor = 0.0;
        cfg.monte_carlo.opex_floor = 0.0;
        cfg.monte_carlo.degradation_floor = 0.5;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "monte_carlo.discount_floor"));
        assert!(!errors.iter().any(|e| e.field == "monte_carlo.opex_floor"));
        assert!(!errors.iter().any(|e| e.field == "monte_carlo.degradation_floor"));
    }

    #[test]
    fn validation_catches_mismatched_table() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.degradation.rate_per_100_efc.pop();
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "degradation.rate_per_100_efc")
        );
        assert!(cfg.degradation_table().is_err());
    }

    #[test]
    fn validation_catches_bad_window_and_soh() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.profile.discharge_start_hour = 20;
        cfg.battery.initial_soh_pct = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "profile.discharge_start_hour"));
        assert!(errors.iter().any(|e| e.field == "battery.initial_soh_pct"));
    }

    #[test]
    fn baseline_reproduces_study_yield() {
        let params = ScenarioConfig::baseline().economic_params();
        assert!((params.base_annual_energy_kwh - 5.82 * 365.0).abs() < 1e-6);
        assert_eq!(params.discount_rate, 0.08);
    }

    #[test]
    fn inflation_gives_nominal_rate() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.economics.inflation_rate = 0.02;
        assert!((cfg.economic_params().discount_rate - 0.1016).abs() < 1e-12);
    }

    #[test]
    fn capex_presets_bracket_baseline() {
        let base = ScenarioConfig::baseline().economics.capex_per_kwh;
        assert!(ScenarioConfig::high_capex().economics.capex_per_kwh > base);
        assert!(ScenarioConfig::low_capex().economics.capex_per_kwh < base);
    }
}

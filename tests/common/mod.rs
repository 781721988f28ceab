//! Shared fixtures for integration tests.

#![allow(dead_code)]

use slb_sim::battery::{BatteryState, DegradationTable, HourlyProfile};
use slb_sim::lcoe::{DegradationCurve, EconomicParams, LcoeModel};
use slb_sim::sim::{HourlySimulator, SimConfig};

/// 100 Ah pack at 80% SoH, full SoC (80 Ah usable).
pub fn second_life_battery() -> BatteryState {
    BatteryState::new(100.0, 80.0, 100.0)
}

/// Simulator over `days` with the reference fade table.
pub fn simulator(days: usize) -> HourlySimulator {
    HourlySimulator::new(
        SimConfig::days(days),
        second_life_battery(),
        DegradationTable::reference(),
    )
}

/// 12 h discharge then 12 h charge at `current_a`, repeated over `days`.
pub fn half_day_profile(current_a: f64, days: usize) -> HourlyProfile {
    let values = (0..days * 24)
        .map(|h| if h % 24 < 12 { -current_a } else { current_a })
        .collect();
    HourlyProfile::from_values(values)
}

/// One-year project: 38.8 kWh at 200 $/kWh, 8% discount, 2% OPEX,
/// 1000 kWh/yr, no replacements.
pub fn one_year_params() -> EconomicParams {
    EconomicParams {
        replacement_years: Vec::new(),
        lifetime_years: 1,
        base_annual_energy_kwh: 1000.0,
        ..EconomicParams::default()
    }
}

/// Model with a flat curve at full relative SoH.
pub fn flat_model(params: EconomicParams) -> LcoeModel {
    let curve = DegradationCurve::from_values(vec![1.0; params.lifetime_years])
        .expect("flat curve is valid");
    LcoeModel::new(params, curve).expect("model is valid")
}

/// Baseline 25-year model with replacements at years 10 and 20.
pub fn baseline_model() -> LcoeModel {
    let params = EconomicParams::default();
    let curve = DegradationCurve::linear_cycle(0.875, 10, params.lifetime_years);
    LcoeModel::new(params, curve).expect("baseline model is valid")
}

//! Levelized cost of energy for second-life storage.
//!
//! - [`curve`]: yearly relative SoH curves and the technical-life lookup.
//! - [`model`]: discounted cost/energy model, affordability threshold and
//!   CAPEX sweep.
//! - [`sampling`]: input distributions.
//! - [`monte_carlo`]: parallel Monte Carlo engine and its report.
//! - [`sensitivity`]: Spearman rank correlation and global sensitivity.
//! - [`stats`]: percentiles and means.

pub mod curve;
pub mod model;
pub mod monte_carlo;
pub mod sampling;
pub mod sensitivity;
pub mod stats;

pub use curve::{CurvePoint, DegradationCurve};
pub use model::{
    CostSample, EconomicParams, EnergyModel, LcoeBreakdown, LcoeModel, MaxCapex,
    capex_sensitivity, nominal_discount_rate,
};
pub use monte_carlo::{MonteCarloEngine, MonteCarloReport, SampleRecord};
pub use sampling::{UncertaintySpec, lognormal_params};
pub use sensitivity::{global_sensitivity, spearman};
pub use stats::percentile;

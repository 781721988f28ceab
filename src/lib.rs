//! Second-life battery degradation simulator and Monte Carlo LCOE engine.

pub mod battery;
pub mod config;
pub mod error;
pub mod io;
pub mod lcoe;
pub mod logging;
/// Hourly simulation clock, engine and summary.
pub mod sim;

pub use error::{Error, Result};

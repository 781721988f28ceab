//! Battery-side models: fade-rate table, pack state and current profiles.

/// Depth-of-discharge dependent fade-rate lookup.
pub mod degradation;
/// Hourly current profiles.
pub mod profile;
/// SoC/SoH state with equivalent-full-cycle accounting.
pub mod state;

pub use degradation::DegradationTable;
pub use profile::{DailyPattern, HourlyProfile};
pub use state::{BatteryState, DodPolicy, ExhaustionPolicy, HourUpdate};

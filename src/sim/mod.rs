/// Hourly simulation clock.
pub mod clock;
pub mod engine;
pub mod kpi;
pub mod types;

pub use engine::{HourlySimulator, SimulationOutcome};
pub use kpi::SimulationSummary;
pub use types::{HourRecord, SimConfig};

//! Post-hoc summary of an hourly simulation.

use std::fmt;

use super::engine::SimulationOutcome;

/// Aggregate indicators derived from a complete simulation run.
///
/// Computed from the per-hour records so that the summary can never disagree
/// with the exported trajectory.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    /// Simulated hours.
    pub hours: usize,
    /// SoH at the start of the run (% of nominal).
    pub initial_soh_pct: f64,
    /// SoH after the last hour (% of nominal).
    pub final_soh_pct: f64,
    /// Capacity lost over the run (Ah).
    pub capacity_fade_ah: f64,
    /// Capacity lost as a percentage of the initial usable capacity.
    pub capacity_fade_pct_of_initial: f64,
    /// Cumulative equivalent full cycles.
    pub total_efc: f64,
    /// Hours in which a degradation event fired.
    pub degradation_events: usize,
    /// Lowest SoC reached (%).
    pub min_soc_pct: f64,
    /// Highest SoC reached (%).
    pub max_soc_pct: f64,
    /// First hour at which capacity was exhausted.
    pub exhausted_at_hour: Option<usize>,
}

impl SimulationSummary {
    /// Summarises an outcome. An empty run reports its initial state.
    pub fn from_outcome(outcome: &SimulationOutcome) -> Self {
        let final_capacity_ah = outcome
            .last()
            .map_or(outcome.initial_capacity_ah, |r| r.capacity_ah);
        let final_soh_pct = outcome.last().map_or(outcome.initial_soh_pct, |r| r.soh_pct);

        let (min_soc_pct, max_soc_pct) = if outcome.records.is_empty() {
            (outcome.initial_soc_pct, outcome.initial_soc_pct)
        } else {
            outcome
                .records
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                    (lo.min(r.soc_pct), hi.max(r.soc_pct))
                })
        };

        let capacity_fade_ah = outcome.initial_capacity_ah - final_capacity_ah;
        Self {
            hours: outcome.records.len(),
            initial_soh_pct: outcome.initial_soh_pct,
            final_soh_pct,
            capacity_fade_ah,
            capacity_fade_pct_of_initial: capacity_fade_ah / outcome.initial_capacity_ah * 100.0,
            total_efc: outcome.total_efc,
            degradation_events: outcome.degradation_events,
            min_soc_pct,
            max_soc_pct,
            exhausted_at_hour: outcome.exhausted_at_hour,
        }
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation Summary ---")?;
        writeln!(f, "Hours simulated:       {}", self.hours)?;
        writeln!(f, "Initial SoH:           {:.2}%", self.initial_soh_pct)?;
        writeln!(f, "Final SoH:             {:.2}%", self.final_soh_pct)?;
        writeln!(
            f,
            "Capacity fade:         {:.4} Ah ({:.3}% of initial)",
            self.capacity_fade_ah, self.capacity_fade_pct_of_initial
        )?;
        writeln!(f, "Total EFC:             {:.1}", self.total_efc)?;
        writeln!(f, "Degradation events:    {}", self.degradation_events)?;
        writeln!(
            f,
            "SoC range:             {:.1}% .. {:.1}%",
            self.min_soc_pct, self.max_soc_pct
        )?;
        match self.exhausted_at_hour {
            Some(hour) => write!(f, "Capacity exhausted:    hour {hour}"),
            None => write!(f, "Capacity exhausted:    no"),
        }
    }
}

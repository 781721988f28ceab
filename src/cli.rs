use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    /// Load the scenario from a TOML file.
    #[arg(long, global = true, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, deterministic, high_capex, low_capex, swing_average).
    #[arg(long, global = true)]
    pub preset: Option<String>,

    /// Override the Monte Carlo seed.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the hourly battery simulation and print its summary.
    Simulate(SimulateArgs),

    /// Run the Monte Carlo LCOE study with global sensitivity analysis.
    #[command(name = "monte-carlo")]
    MonteCarlo(MonteCarloArgs),

    /// Deterministic LCOE with the annual table and a CAPEX sweep.
    Lcoe,

    /// Write a straight-line degradation curve for hand-off to the LCOE model.
    Curve(CurveArgs),
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Export the hourly trajectory as CSV.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Export the relative-SoH degradation curve as CSV.
    #[arg(long = "curve-out")]
    pub curve_out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MonteCarloArgs {
    /// Override the configured iteration count.
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Export the valid iterations as CSV.
    #[arg(long = "samples-out")]
    pub samples_out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CurveArgs {
    /// Destination CSV.
    #[arg(long)]
    pub out: PathBuf,

    /// SoH at t=0 (%).
    #[arg(long, default_value_t = 100.0)]
    pub initial_pct: f64,

    /// SoH at the end of the curve (%).
    #[arg(long, default_value_t = 87.5)]
    pub final_pct: f64,

    /// Curve duration (years).
    #[arg(long, default_value_t = 10.0)]
    pub years: f64,

    #[arg(long, default_value_t = 12)]
    pub points_per_year: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_scenario_with_subcommand() {
        let cli = Cli::try_parse_from(["slb-sim", "--scenario", "s.toml", "lcoe"]).unwrap();
        assert_eq!(cli.scenario.as_deref().and_then(|p| p.to_str()), Some("s.toml"));
        assert!(cli.preset.is_none());
        assert!(matches!(cli.command, Command::Lcoe));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "slb-sim",
            "monte-carlo",
            "--iterations",
            "50",
            "--seed",
            "7",
            "--preset",
            "deterministic",
        ])
        .unwrap();
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.preset.as_deref(), Some("deterministic"));
        match cli.command {
            Command::MonteCarlo(args) => assert_eq!(args.iterations, Some(50)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn scenario_and_preset_are_exclusive() {
        let result = Cli::try_parse_from([
            "slb-sim",
            "--scenario",
            "s.toml",
            "--preset",
            "baseline",
            "simulate",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn curve_requires_out() {
        assert!(Cli::try_parse_from(["slb-sim", "curve"]).is_err());
        let cli = Cli::try_parse_from(["slb-sim", "curve", "--out", "c.csv"]).unwrap();
        match cli.command {
            Command::Curve(args) => {
                assert_eq!(args.final_pct, 87.5);
                assert_eq!(args.points_per_year, 12);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}

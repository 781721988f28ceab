//! slb-sim entry point: CLI wiring and config-driven model construction.

mod cli;

use std::process;

use clap::Parser;
use tracing::info;

use slb_sim::config::ScenarioConfig;
use slb_sim::io::{load_curve, write_curve_to_path, write_hourly_to_path, write_samples_to_path};
use slb_sim::lcoe::capex_sensitivity;
use slb_sim::lcoe::curve::{linear_points, technical_life_years};
use slb_sim::sim::SimulationSummary;
use slb_sim::{Error, Result};

use cli::{Cli, Command, CurveArgs, MonteCarloArgs, SimulateArgs};

/// Loads the scenario: `--scenario` takes priority, then `--preset`, then
/// the baseline.
fn load_scenario(cli: &Cli) -> Result<ScenarioConfig> {
    let scenario = if let Some(ref path) = cli.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };
    Ok(scenario)
}

fn simulate(scenario: &ScenarioConfig, args: &SimulateArgs) -> Result<()> {
    let mut simulator = scenario.simulator()?;
    let profile = scenario.hourly_profile();
    let outcome = simulator.run(&profile)?;

    println!("{}", SimulationSummary::from_outcome(&outcome));

    if let Some(ref path) = args.out {
        write_hourly_to_path(&outcome.records, path)?;
        eprintln!("Hourly trajectory written to {}", path.display());
    }
    if let Some(ref path) = args.curve_out {
        let points = outcome.degradation_curve(scenario.simulation.curve_points_per_year);
        write_curve_to_path(&points, &scenario.curve.label, path)?;
        eprintln!("Degradation curve written to {}", path.display());
    }
    Ok(())
}

fn monte_carlo(scenario: &ScenarioConfig, args: &MonteCarloArgs) -> Result<()> {
    let loaded = load_curve(&scenario.curve, scenario.economics.lifetime_years)?;
    let engine = scenario.monte_carlo_engine(loaded.curve)?;
    let report = engine.run(scenario.monte_carlo.iterations, scenario.monte_carlo.seed);

    println!("{report}");

    if let Some(ref path) = args.samples_out {
        write_samples_to_path(&report.samples, path)?;
        eprintln!("Samples written to {}", path.display());
    }
    Ok(())
}

fn lcoe(scenario: &ScenarioConfig) -> Result<()> {
    let loaded = load_curve(&scenario.curve, scenario.economics.lifetime_years)?;
    let points = loaded.points.clone();
    let model = scenario.lcoe_model(loaded.curve)?;

    println!("{}", model.evaluate_nominal());
    println!();
    println!("--- Annual Breakdown ---");
    println!(
        "{:>4} {:>8} {:>12} {:>8} {:>12} {:>10} {:>12}",
        "year", "rel_soh", "energy_kwh", "df", "energy_pv", "opex", "replacement"
    );
    for row in model.annual_breakdown() {
        println!(
            "{:>4} {:>8.4} {:>12.2} {:>8.4} {:>12.2} {:>10.2} {:>12.2}",
            row.year,
            row.relative_soh,
            row.energy_kwh,
            row.discount_factor,
            row.energy_pv_kwh,
            row.opex,
            row.replacement_cost
        );
    }
    println!();
    print!("{}", capex_sensitivity(&model, &scenario.monte_carlo.capex_deltas));

    if let Some(points) = points {
        println!();
        match technical_life_years(&points, scenario.curve.eol_pct) {
            Some(years) => println!(
                "Technical life (SoH <= {}%): {years:.2} years",
                scenario.curve.eol_pct
            ),
            None => println!(
                "Technical life (SoH <= {}%): not reached",
                scenario.curve.eol_pct
            ),
        }
    }
    Ok(())
}

fn curve(scenario: &ScenarioConfig, args: &CurveArgs) -> Result<()> {
    if args.points_per_year == 0 || args.years <= 0.0 || !args.years.is_finite() {
        return Err(Error::InvalidInput {
            field: "curve".to_string(),
            message: "--years must be > 0 and --points-per-year must be >= 1".to_string(),
        });
    }
    let points = linear_points(args.initial_pct, args.final_pct, args.years, args.points_per_year);
    write_curve_to_path(&points, &scenario.curve.label, &args.out)?;
    info!(points = points.len(), path = %args.out.display(), "Linear curve written");
    eprintln!("Degradation curve written to {}", args.out.display());
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let mut scenario = load_scenario(cli)?;

    if let Some(seed) = cli.seed {
        scenario.monte_carlo.seed = Some(seed);
    }
    if let Command::MonteCarlo(MonteCarloArgs {
        iterations: Some(n),
        ..
    }) = &cli.command
    {
        scenario.monte_carlo.iterations = *n;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    match &cli.command {
        Command::Simulate(args) => simulate(&scenario, args),
        Command::MonteCarlo(args) => monte_carlo(&scenario, args),
        Command::Lcoe => lcoe(&scenario),
        Command::Curve(args) => curve(&scenario, args),
    }
}

fn main() {
    let cli = Cli::parse();
    slb_sim::logging::init(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

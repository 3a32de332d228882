//! `run` - execute one or many scenario files against an assumptions set.
//!
//! ```text
//! run --file scenarios/college.json --assumptions assumptions.json
//! run --all scenarios/ --assumptions assumptions.json --constants constants.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use ldi_engine::allocator::GlidePath;
use ldi_engine::model::{Model, ScenarioShape};
use ldi_engine::{scenario, solver};

#[derive(Debug, Parser)]
#[command(name = "run", about = "Run LDI scenario projections")]
struct Cli {
    /// Run a single scenario file.
    #[arg(long, conflicts_with = "all")]
    file: Option<PathBuf>,

    /// Run every *.json file in a directory as a scenario.
    #[arg(long, conflicts_with = "file")]
    all: Option<PathBuf>,

    /// Assumptions file (inflation, discount rate, asset returns).
    #[arg(long)]
    assumptions: PathBuf,

    /// Optional constants file for `${key}` substitution in scenario files.
    #[arg(long)]
    constants: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let assumptions = scenario::load_assumptions(&cli.assumptions)
        .with_context(|| format!("loading assumptions from {}", cli.assumptions.display()))?;
    let allocator = GlidePath;

    let scenario_paths = collect_scenario_paths(&cli)?;
    if scenario_paths.is_empty() {
        eprintln!("no scenario files found");
        std::process::exit(1);
    }

    let mut any_failed = false;
    for path in scenario_paths {
        match run_one(&path, cli.constants.as_deref(), &assumptions, &allocator) {
            Ok(()) => {}
            Err(e) => {
                any_failed = true;
                eprintln!("{}: {e:#}", path.display());
            }
        }
    }

    if any_failed {
        std::process::exit(1);
    }
    Ok(())
}

fn collect_scenario_paths(cli: &Cli) -> Result<Vec<PathBuf>> {
    if let Some(file) = &cli.file {
        return Ok(vec![file.clone()]);
    }
    if let Some(dir) = &cli.all {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("reading scenario directory {}", dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();
        return Ok(paths);
    }
    anyhow::bail!("must pass either --file or --all")
}

fn run_one(
    scenario_path: &Path,
    constants_path: Option<&Path>,
    assumptions: &ldi_engine::Assumptions,
    allocator: &GlidePath,
) -> Result<()> {
    let input = scenario::load_scenario(scenario_path, constants_path)
        .with_context(|| format!("loading scenario {}", scenario_path.display()))?;
    let shape: ScenarioShape = input.into();

    let model = Model::new(shape.clone(), assumptions, allocator)
        .with_context(|| format!("building model for {}", scenario_path.display()))?;
    let result = model.run().context("running projection")?;

    let net_contribution_today = solver::net_contribution_today(&shape, assumptions, allocator)
        .context("solving net_contribution_today")?;
    let monthly_contribution = solver::monthly_contribution(&shape, assumptions, allocator)
        .context("solving monthly_contribution")?;

    let payload = result
        .into_scenario_result(net_contribution_today.value, monthly_contribution.value);

    println!("{}", serde_json::to_string_pretty(&payload).context("serializing result")?);
    if !net_contribution_today.converged {
        eprintln!("{}: net_contribution_today solver did not converge", scenario_path.display());
    }
    if !monthly_contribution.converged {
        eprintln!("{}: monthly_contribution solver did not converge", scenario_path.display());
    }

    Ok(())
}

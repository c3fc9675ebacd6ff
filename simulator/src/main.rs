use anyhow::Context;
use clap::Parser;
use report::model::SimulationReport;
use std::path::PathBuf;
use workflow::config::{ProcessingMode, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod report;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Point-target SAR echo simulator and RDA image former")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Pulses along the simulated track
    #[arg(long, default_value_t = 64)]
    pulses: usize,
    /// Targets per side of the square grid around the scene centre
    #[arg(long, default_value_t = 1)]
    grid: usize,
    /// Randomly placed scatterers added to the grid
    #[arg(long, default_value_t = 0)]
    random_targets: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Only form the cropped image
    #[arg(long, default_value_t = false)]
    cropped_only: bool,
    /// Where the JSON report is written
    #[arg(long, default_value = "tools/data/sarsim_report.json")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.pulses, args.grid, args.random_targets, args.seed)
    };
    if args.cropped_only {
        workflow_config.processing.mode = ProcessingMode::Cropped;
    }

    let runner = Runner::new(workflow_config);
    let result = runner.execute().context("running simulation workflow")?;
    let report = SimulationReport::from_result(&result);

    println!("Offline run -> {}", report.headline());
    report.write_json(&args.output)?;
    log::info!("report written to {}", args.output.display());

    Ok(())
}

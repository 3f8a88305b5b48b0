use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use inventory_uncertainty_sim::calibration::run_calibration;
use inventory_uncertainty_sim::config::ExperimentConfig;
use inventory_uncertainty_sim::experiment::{
    candidate_policies, prepare_inputs, run_volatility_experiment,
};
use inventory_uncertainty_sim::logging::init_tracing;
use inventory_uncertainty_sim::metrics::summarize_monte_carlo;
use inventory_uncertainty_sim::monte_carlo::run_policy;
use inventory_uncertainty_sim::preprocessing::preprocess_pipeline;
use inventory_uncertainty_sim::reporting::{
    display_banner, display_calibration, display_comparison, display_metric_summary,
    write_comparison_csv, write_run_histories,
};
use inventory_uncertainty_sim::Result;

/// Compare replenishment policies over bootstrapped demand paths
#[derive(Debug, Parser)]
#[command(name = "inventory-sim", version)]
struct Args {
    /// TOML experiment configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Inventory CSV to calibrate on
    #[arg(long)]
    data: Option<PathBuf>,

    /// Monte Carlo runs per policy and volatility level
    #[arg(long)]
    runs: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Periods to simulate
    #[arg(long)]
    horizon: Option<usize>,

    /// Where to write the comparison CSV
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write every baseline run's history to this CSV
    #[arg(long)]
    histories: Option<PathBuf>,
}

impl Args {
    fn resolve_config(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_file(path)?,
            None => ExperimentConfig::default(),
        };

        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(runs) = self.runs {
            config.n_runs = runs;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.resolve_config()?;

    display_banner();

    // Step 1: load data and calibrate error pools per group
    let table = preprocess_pipeline(&config.data_path, &config.store)?;
    let (calibration, group_column) = run_calibration(&table)?;
    display_calibration(&calibration, &group_column);

    // Step 2: pick the best-observed group and build its series
    let inputs = prepare_inputs(&table, &calibration, &group_column, &config)?;
    println!(
        "Group '{}': {} periods, {} error samples\n",
        inputs.group_id,
        inputs.series.len(),
        inputs.errors.len()
    );

    // Step 3: baseline regime, detailed per policy
    println!("Baseline volatility ({} runs, seed {}):", config.n_runs, config.seed);
    for (name, params) in candidate_policies(&inputs.series, &config) {
        let runs = run_policy(
            &params,
            inputs.series.forecast(),
            &inputs.errors,
            config.initial_inventory,
            config.n_runs,
            config.seed,
        )?;
        display_metric_summary(name, &summarize_monte_carlo(&runs, config.holding_cost));

        if let Some(path) = &args.histories {
            let path = path.with_file_name(format!(
                "{}_{}",
                name,
                path.file_name().and_then(|f| f.to_str()).unwrap_or("histories.csv")
            ));
            write_run_histories(&path, &runs)?;
        }
    }

    // Step 4: full volatility comparison
    let rows = run_volatility_experiment(&inputs, &config)?;
    display_comparison(&rows);

    write_comparison_csv(&config.output_path, &rows)?;
    println!("\nResults saved to: {}", config.output_path.display());

    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "experiment failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

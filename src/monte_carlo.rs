//! Monte Carlo orchestration.
//!
//! The sequential entry points create one seeded generator per call and draw
//! every run's bootstrap path from it in run order, so the seed alone fixes
//! all demand paths. The parallel entry point gives each run its own stream
//! of the same seed instead.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::demand::generate_demand_path;
use crate::error::{Result, SimulationError};
use crate::models::RunResult;
use crate::policies::{OrderPolicy, PolicyParameters, ReorderPointPolicy, TrailingMeanPolicy};
use crate::simulation::{run_single_simulation, run_single_simulation_trailing_mean};

fn validate_inputs(error_pool: &[f64], n_runs: usize) -> Result<()> {
    if n_runs == 0 {
        return Err(SimulationError::invalid_input("n_runs must be positive"));
    }
    if error_pool.is_empty() {
        return Err(SimulationError::invalid_input(
            "cannot bootstrap demand from an empty error pool",
        ));
    }
    Ok(())
}

/// Shared loop: draw a path from the call's generator, simulate it, tag it.
fn run_sequential<F>(
    forecast: &[f64],
    error_pool: &[f64],
    n_runs: usize,
    seed: u64,
    mut simulate: F,
) -> Result<Vec<RunResult>>
where
    F: FnMut(&[f64]) -> Result<RunResult>,
{
    validate_inputs(error_pool, n_runs)?;
    debug!(n_runs, horizon = forecast.len(), seed, "starting monte carlo");

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut runs = Vec::with_capacity(n_runs);

    for run_id in 0..n_runs {
        let demand_path = generate_demand_path(forecast, error_pool, &mut rng)?;
        let mut run = simulate(&demand_path)?;
        run.run_id = run_id;
        trace!(run_id, lost_sales = run.total_lost_sales(), "run complete");
        runs.push(run);
    }

    Ok(runs)
}

/// Run `n_runs` bootstrap replications of a fixed-parameter policy
pub fn run_monte_carlo_simulation<P: OrderPolicy>(
    forecast: &[f64],
    error_pool: &[f64],
    policy: &P,
    params: &P::Params,
    initial_inventory: f64,
    n_runs: usize,
    seed: u64,
) -> Result<Vec<RunResult>> {
    run_sequential(forecast, error_pool, n_runs, seed, |demand_path| {
        run_single_simulation(demand_path, forecast, policy, params, initial_inventory)
    })
}

/// Run `n_runs` bootstrap replications of the trailing-mean rule
pub fn run_monte_carlo_simulation_trailing_mean(
    forecast: &[f64],
    error_pool: &[f64],
    initial_inventory: f64,
    n_runs: usize,
    window: usize,
    seed: u64,
) -> Result<Vec<RunResult>> {
    let policy = TrailingMeanPolicy::new(window)?;
    run_sequential(forecast, error_pool, n_runs, seed, |demand_path| {
        run_single_simulation_trailing_mean(demand_path, forecast, &policy, initial_inventory)
    })
}

/// Dispatch a tagged policy configuration to its matching orchestrator
pub fn run_policy(
    params: &PolicyParameters,
    forecast: &[f64],
    error_pool: &[f64],
    initial_inventory: f64,
    n_runs: usize,
    seed: u64,
) -> Result<Vec<RunResult>> {
    match params {
        PolicyParameters::ReorderPoint(rq) => run_monte_carlo_simulation(
            forecast,
            error_pool,
            &ReorderPointPolicy,
            rq,
            initial_inventory,
            n_runs,
            seed,
        ),
        PolicyParameters::TrailingMean { window } => run_monte_carlo_simulation_trailing_mean(
            forecast,
            error_pool,
            initial_inventory,
            n_runs,
            *window,
            seed,
        ),
    }
}

/// Parallel variant: run `i` draws from stream `i` of `seed`.
///
/// Results are identical for a given seed regardless of thread count, but
/// differ from `run_monte_carlo_simulation` with the same seed.
pub fn run_monte_carlo_parallel<P>(
    forecast: &[f64],
    error_pool: &[f64],
    policy: &P,
    params: &P::Params,
    initial_inventory: f64,
    n_runs: usize,
    seed: u64,
) -> Result<Vec<RunResult>>
where
    P: OrderPolicy,
    P::Params: Sync,
{
    validate_inputs(error_pool, n_runs)?;
    debug!(n_runs, horizon = forecast.len(), seed, "starting parallel monte carlo");

    let mut runs = (0..n_runs)
        .into_par_iter()
        .map(|run_id| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(run_id as u64);
            let demand_path = generate_demand_path(forecast, error_pool, &mut rng)?;
            let mut run =
                run_single_simulation(&demand_path, forecast, policy, params, initial_inventory)?;
            run.run_id = run_id;
            Ok(run)
        })
        .collect::<Result<Vec<RunResult>>>()?;

    runs.sort_by_key(|run| run.run_id);
    Ok(runs)
}

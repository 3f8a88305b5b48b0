//! Period-by-period inventory simulation.
//! Lost-sales model with a fixed lead time of one period: an order placed at
//! the end of period t is on hand at the start of period t + 1.

use crate::error::{Result, SimulationError};
use crate::models::{PeriodRecord, RunResult};
use crate::policies::{OrderDecision, OrderPolicy, TrailingMeanParams, TrailingMeanPolicy};

/// Mutable state of one run
#[derive(Clone, Debug)]
pub struct SimulationState {
    pub period_index: usize,
    pub on_order_quantity: f64,
    pub on_hand_inventory: f64,
    history: Vec<PeriodRecord>,
}

impl SimulationState {
    pub fn new(initial_inventory: f64) -> Self {
        SimulationState {
            period_index: 0,
            on_order_quantity: 0.0,
            on_hand_inventory: initial_inventory,
            history: Vec::new(),
        }
    }

    pub fn with_capacity(initial_inventory: f64, periods: usize) -> Self {
        SimulationState {
            history: Vec::with_capacity(periods),
            ..SimulationState::new(initial_inventory)
        }
    }

    pub fn history(&self) -> &[PeriodRecord] {
        &self.history
    }

    /// Apply one period: receive the pending order, serve demand, then ask
    /// `decide` for the next order given ending inventory.
    /// A negative or non-finite order is rejected and leaves the state untouched.
    pub fn step<F>(&mut self, demand: f64, forecast: f64, decide: F) -> Result<()>
    where
        F: FnOnce(f64) -> OrderDecision,
    {
        let arrivals = self.on_order_quantity;
        let inventory_start = self.on_hand_inventory + arrivals;

        let sales = inventory_start.min(demand);
        let lost_sales = demand - sales;
        let inventory_end = inventory_start - sales;

        let order_qty = decide(inventory_end).order_qty();
        if !order_qty.is_finite() || order_qty < 0.0 {
            return Err(SimulationError::invalid_input(format!(
                "period {}: order quantity must be a non-negative number, got {}",
                self.period_index, order_qty
            )));
        }

        self.on_order_quantity = order_qty;
        self.on_hand_inventory = inventory_end;

        self.history.push(PeriodRecord {
            period: self.period_index,
            demand,
            forecast,
            sales,
            lost_sales,
            ending_inventory: inventory_end,
            order_qty,
            arrivals,
        });
        self.period_index += 1;

        Ok(())
    }

    /// Freeze the accumulated history into an immutable run
    pub fn into_run(self, run_id: usize) -> RunResult {
        RunResult {
            run_id,
            periods: self.history,
        }
    }
}

fn check_run_inputs(
    demand_path: &[f64],
    forecast_path: &[f64],
    initial_inventory: f64,
) -> Result<()> {
    if !initial_inventory.is_finite() || initial_inventory < 0.0 {
        return Err(SimulationError::invalid_input(format!(
            "initial inventory must be a non-negative number, got {}",
            initial_inventory
        )));
    }
    if demand_path.len() != forecast_path.len() {
        return Err(SimulationError::invalid_input(format!(
            "demand path has {} periods but forecast path has {}",
            demand_path.len(),
            forecast_path.len()
        )));
    }
    Ok(())
}

/// Simulate one demand path under a fixed-parameter policy
pub fn run_single_simulation<P: OrderPolicy>(
    demand_path: &[f64],
    forecast_path: &[f64],
    policy: &P,
    params: &P::Params,
    initial_inventory: f64,
) -> Result<RunResult> {
    check_run_inputs(demand_path, forecast_path, initial_inventory)?;

    let mut state = SimulationState::with_capacity(initial_inventory, demand_path.len());
    for (demand, forecast) in demand_path.iter().zip(forecast_path) {
        state.step(*demand, *forecast, |position| policy.decide(position, params))?;
    }

    Ok(state.into_run(0))
}

/// Simulate one demand path under the trailing-mean rule.
/// The order placed in period t is the mean of realized demand strictly
/// before t, over at most `policy.window` periods.
pub fn run_single_simulation_trailing_mean(
    demand_path: &[f64],
    forecast_path: &[f64],
    policy: &TrailingMeanPolicy,
    initial_inventory: f64,
) -> Result<RunResult> {
    check_run_inputs(demand_path, forecast_path, initial_inventory)?;

    let mut state = SimulationState::with_capacity(initial_inventory, demand_path.len());
    for (t, (demand, forecast)) in demand_path.iter().zip(forecast_path).enumerate() {
        let params = TrailingMeanParams {
            trailing_mean: policy.trailing_mean(&demand_path[..t]),
        };
        state.step(*demand, *forecast, |position| policy.decide(position, &params))?;
    }

    Ok(state.into_run(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::{ReorderPointPolicy, RqParams};
    use proptest::prelude::*;

    #[derive(Debug)]
    struct NeverOrder;

    impl OrderPolicy for NeverOrder {
        type Params = ();

        fn decide(&self, _inventory_position: f64, _params: &()) -> OrderDecision {
            OrderDecision::none()
        }
    }

    fn rq(reorder_point: f64, order_quantity: f64) -> RqParams {
        RqParams {
            reorder_point,
            order_quantity,
            safety_factor: 1.0,
            sigma: 0.0,
        }
    }

    #[test]
    fn test_three_period_scenario() {
        let run = run_single_simulation(
            &[50.0, 0.0, 100.0],
            &[50.0, 50.0, 50.0],
            &NeverOrder,
            &(),
            60.0,
        )
        .unwrap();

        let expected = [
            (0.0, 50.0, 0.0, 10.0),
            (0.0, 0.0, 0.0, 10.0),
            (0.0, 10.0, 90.0, 0.0),
        ];
        assert_eq!(run.len(), 3);
        for (record, (arrivals, sales, lost, ending)) in run.periods.iter().zip(expected) {
            assert_eq!(record.arrivals, arrivals);
            assert_eq!(record.sales, sales);
            assert_eq!(record.lost_sales, lost);
            assert_eq!(record.ending_inventory, ending);
            assert_eq!(record.order_qty, 0.0);
        }
    }

    #[test]
    fn test_order_arrives_next_period() {
        let run = run_single_simulation(
            &[30.0, 30.0, 30.0, 30.0],
            &[30.0; 4],
            &ReorderPointPolicy,
            &rq(50.0, 100.0),
            60.0,
        )
        .unwrap();

        // period 0 ends at 30 <= 50, order 100 arrives in period 1
        assert_eq!(run.periods[0].order_qty, 100.0);
        assert_eq!(run.periods[1].arrivals, 100.0);
        assert_eq!(run.periods[1].ending_inventory, 100.0);
        assert_eq!(run.periods[1].order_qty, 0.0);
        assert_eq!(run.periods[2].arrivals, 0.0);
    }

    #[test]
    fn test_state_lifecycle() {
        let mut state = SimulationState::new(5.0);
        assert_eq!(state.period_index, 0);
        assert_eq!(state.on_order_quantity, 0.0);

        state.step(8.0, 8.0, |_| OrderDecision::order(4.0)).unwrap();
        assert_eq!(state.period_index, 1);
        assert_eq!(state.on_hand_inventory, 0.0);
        assert_eq!(state.on_order_quantity, 4.0);
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].lost_sales, 3.0);
    }

    #[test]
    fn test_mismatched_paths_rejected() {
        let result = run_single_simulation(&[1.0, 2.0], &[1.0], &NeverOrder, &(), 0.0);
        assert!(matches!(result, Err(SimulationError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_initial_inventory_rejected() {
        for initial in [-10.0, f64::NAN, f64::INFINITY] {
            let result = run_single_simulation(&[5.0, 5.0], &[5.0, 5.0], &NeverOrder, &(), initial);
            assert!(matches!(result, Err(SimulationError::InvalidInput(_))), "{}", initial);
        }

        let policy = TrailingMeanPolicy::new(3).unwrap();
        let result = run_single_simulation_trailing_mean(&[5.0], &[5.0], &policy, -1.0);
        assert!(matches!(result, Err(SimulationError::InvalidInput(_))));
    }

    #[test]
    fn test_negative_order_quantity_rejected() {
        let result = run_single_simulation(
            &[5.0; 5],
            &[5.0; 5],
            &ReorderPointPolicy,
            &rq(100.0, -50.0),
            10.0,
        );
        assert!(matches!(result, Err(SimulationError::InvalidInput(_))));

        let mut state = SimulationState::new(10.0);
        let result = state.step(4.0, 4.0, |_| OrderDecision::order(f64::NAN));
        assert!(matches!(result, Err(SimulationError::InvalidInput(_))));
        assert!(state.history().is_empty());
        assert_eq!(state.on_hand_inventory, 10.0);
    }

    #[test]
    fn test_empty_path_yields_empty_run() {
        let run = run_single_simulation(&[], &[], &NeverOrder, &(), 10.0).unwrap();
        assert!(run.is_empty());
    }

    #[test]
    fn test_trailing_mean_orders_past_demand() {
        let policy = TrailingMeanPolicy::new(2).unwrap();
        let run = run_single_simulation_trailing_mean(
            &[10.0, 20.0, 40.0, 0.0],
            &[0.0; 4],
            &policy,
            100.0,
        )
        .unwrap();

        let orders: Vec<f64> = run.periods.iter().map(|p| p.order_qty).collect();
        assert_eq!(orders, vec![0.0, 10.0, 15.0, 30.0]);
        assert_eq!(run.periods[2].arrivals, 10.0);
        assert_eq!(run.periods[3].arrivals, 15.0);
    }

    fn path_strategy() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.0f64..500.0, 0..60)
    }

    proptest! {
        #[test]
        fn invariants_hold_for_rq_policy(
            demand in path_strategy(),
            initial in 0.0f64..400.0,
            reorder_point in 0.0f64..300.0,
            order_quantity in 0.0f64..600.0,
        ) {
            let forecast = vec![0.0; demand.len()];
            let run = run_single_simulation(
                &demand,
                &forecast,
                &ReorderPointPolicy,
                &rq(reorder_point, order_quantity),
                initial,
            ).unwrap();

            prop_assert_eq!(run.len(), demand.len());
            if let Some(first) = run.periods.first() {
                prop_assert_eq!(first.arrivals, 0.0);
            }
            for pair in run.periods.windows(2) {
                prop_assert_eq!(pair[1].arrivals, pair[0].order_qty);
            }
            for p in &run.periods {
                prop_assert!(p.ending_inventory >= 0.0);
                prop_assert!(p.sales >= 0.0 && p.sales <= p.demand);
                prop_assert!(p.sales <= p.inventory_start() + 1e-9);
                prop_assert!(p.lost_sales >= 0.0);
            }
            let balance = run.total_sales() + run.total_lost_sales() - run.total_demand();
            prop_assert!(balance.abs() < 1e-6);
        }

        #[test]
        fn trailing_mean_respects_lead_time(demand in path_strategy(), window in 1usize..10) {
            let policy = TrailingMeanPolicy::new(window).unwrap();
            let forecast = vec![0.0; demand.len()];
            let run =
                run_single_simulation_trailing_mean(&demand, &forecast, &policy, 50.0).unwrap();

            for pair in run.periods.windows(2) {
                prop_assert_eq!(pair[1].arrivals, pair[0].order_qty);
            }
            for p in &run.periods {
                prop_assert!(p.order_qty.is_finite());
                prop_assert!(p.ending_inventory >= 0.0);
            }
        }
    }
}

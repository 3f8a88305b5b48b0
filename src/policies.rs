//! Replenishment policies.
//! Parameter derivation for the (r, Q) family plus the decision rules the
//! simulation driver consults once per period.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Outcome of a policy decision. A zero quantity means no order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrderDecision {
    pub place_order: bool,
    pub quantity: f64,
}

impl OrderDecision {
    pub fn none() -> Self {
        OrderDecision {
            place_order: false,
            quantity: 0.0,
        }
    }

    pub fn order(quantity: f64) -> Self {
        OrderDecision {
            place_order: true,
            quantity,
        }
    }

    /// Quantity recorded in the run history
    pub fn order_qty(&self) -> f64 {
        if self.place_order {
            self.quantity
        } else {
            0.0
        }
    }
}

/// Decision logic consulted at the end of every period.
///
/// Each policy family declares the parameter record it understands, so a
/// policy can only ever be driven with its own parameters.
pub trait OrderPolicy: Debug + Send + Sync {
    type Params: Debug;

    /// Decide whether to order, given end-of-period inventory.
    fn decide(&self, inventory_position: f64, params: &Self::Params) -> OrderDecision;
}

/// Parameters of a continuous-review (r, Q) policy
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RqParams {
    pub reorder_point: f64,
    pub order_quantity: f64,
    /// Safety factor z used to derive the reorder point
    pub safety_factor: f64,
    /// Demand volatility used to derive the reorder point (0 for static)
    pub sigma: f64,
}

/// Per-period parameter record of the trailing-mean rule
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailingMeanParams {
    pub trailing_mean: f64,
}

/// Policy configuration, tagged by family
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PolicyParameters {
    ReorderPoint(RqParams),
    TrailingMean { window: usize },
}

/// Fixed-quantity reorder-point policy
#[derive(Clone, Copy, Debug, Default)]
pub struct ReorderPointPolicy;

impl OrderPolicy for ReorderPointPolicy {
    type Params = RqParams;

    fn decide(&self, inventory_position: f64, params: &RqParams) -> OrderDecision {
        continuous_review_policy(inventory_position, params.reorder_point, params.order_quantity)
    }
}

/// Orders the trailing mean of realized demand every period
#[derive(Clone, Copy, Debug)]
pub struct TrailingMeanPolicy {
    pub window: usize,
}

impl TrailingMeanPolicy {
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(SimulationError::invalid_input(
                "trailing-mean window must be positive",
            ));
        }
        Ok(TrailingMeanPolicy { window })
    }

    /// Mean of the last `window` values of `realized`, or 0 when empty
    pub fn trailing_mean(&self, realized: &[f64]) -> f64 {
        let start = realized.len().saturating_sub(self.window);
        let recent = &realized[start..];
        if recent.is_empty() {
            return 0.0;
        }
        recent.iter().sum::<f64>() / recent.len() as f64
    }
}

impl OrderPolicy for TrailingMeanPolicy {
    type Params = TrailingMeanParams;

    fn decide(&self, _inventory_position: f64, params: &TrailingMeanParams) -> OrderDecision {
        historical_mean_policy(params.trailing_mean)
    }
}

/// Safety stock SS = z * sigma * sqrt(L)
pub fn calculate_safety_stock(demand_std: f64, lead_time: f64, z: f64) -> f64 {
    z * demand_std * lead_time.sqrt()
}

/// Reorder point r = mean * L + SS
pub fn calculate_reorder_point(mean_demand: f64, lead_time: f64, safety_stock: f64) -> f64 {
    mean_demand * lead_time + safety_stock
}

/// Economic order quantity sqrt(2DS / H)
pub fn calculate_eoq(demand: f64, ordering_cost: f64, holding_cost: f64) -> Result<f64> {
    if holding_cost <= 0.0 {
        return Err(SimulationError::invalid_input(
            "EOQ requires a positive holding cost",
        ));
    }
    if demand < 0.0 || ordering_cost < 0.0 {
        return Err(SimulationError::invalid_input(
            "EOQ requires non-negative demand and ordering cost",
        ));
    }
    Ok((2.0 * demand * ordering_cost / holding_cost).sqrt())
}

/// (r, Q) rule: order Q when the position is at or below r
pub fn continuous_review_policy(
    inventory_position: f64,
    reorder_point: f64,
    order_quantity: f64,
) -> OrderDecision {
    if inventory_position <= reorder_point {
        OrderDecision::order(order_quantity)
    } else {
        OrderDecision::none()
    }
}

/// Always order the trailing mean of past demand
pub fn historical_mean_policy(trailing_mean: f64) -> OrderDecision {
    OrderDecision::order(trailing_mean)
}

/// (r, Q) parameters that ignore demand variability
pub fn configure_static_rq(
    mean_demand: f64,
    lead_time: f64,
    order_quantity: f64,
    z: f64,
) -> RqParams {
    configure_rq(mean_demand, 0.0, lead_time, order_quantity, z)
}

/// (r, Q) parameters with a safety stock sized from demand volatility
pub fn configure_tuned_rq(
    mean_demand: f64,
    demand_std: f64,
    lead_time: f64,
    order_quantity: f64,
    z: f64,
) -> RqParams {
    configure_rq(mean_demand, demand_std, lead_time, order_quantity, z)
}

fn configure_rq(
    mean_demand: f64,
    sigma: f64,
    lead_time: f64,
    order_quantity: f64,
    z: f64,
) -> RqParams {
    let safety_stock = calculate_safety_stock(sigma, lead_time, z);
    RqParams {
        reorder_point: calculate_reorder_point(mean_demand, lead_time, safety_stock),
        order_quantity,
        safety_factor: z,
        sigma,
    }
}

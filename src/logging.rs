//! Tracing initialisation for the command-line runner.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g. `calibration=debug`
pub const LOG_ENV: &str = "INVENTORY_SIM_LOG";

/// Install the global subscriber. Later calls are no-ops.
///
/// Falls back to `inventory_uncertainty_sim=info` when `INVENTORY_SIM_LOG`
/// is unset or invalid.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("inventory_uncertainty_sim=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init();
    });
}

use serde::{Deserialize, Serialize};

/// Tunables of the FAST-style window controller and the run itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Weight of the new target in the window update
    pub gamma: f64,
    /// Packets the flow tries to keep queued in the network
    pub alpha: f64,
    pub window_update_period_ms: f64,
    pub timeout_ms: f64,
    pub initial_window: f64,
    /// Stop the run once virtual time passes this point
    pub max_time_ms: Option<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gamma: 0.5,
            alpha: 15.0,
            window_update_period_ms: 100.0,
            timeout_ms: 500.0,
            initial_window: 1.0,
            max_time_ms: None,
        }
    }
}

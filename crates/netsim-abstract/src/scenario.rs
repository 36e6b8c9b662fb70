use crate::config::SimConfig;
use serde::{Deserialize, Serialize};

/// Bytes in one megabyte of flow data.
pub const MB_TO_BYTES: f64 = 1_000_000.0;

/// A network description as read from disk, before validation.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Topology {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: SimConfigOverride,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

/// A bidirectional cable. It becomes two one-directional links, `<id>a` (a -> b) and `<id>b` (b -> a).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LinkSpec {
    pub id: String,
    pub a: String,
    pub b: String,
    /// Bytes per millisecond
    pub bandwidth: f64,
    /// Propagation delay in milliseconds
    pub delay: f64,
    /// Buffer capacity in bytes
    pub buffer: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FlowSpec {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub data_mb: f64,
    #[serde(default)]
    pub start_ms: f64,
}

impl FlowSpec {
    pub fn total_bytes(&self) -> u64 {
        (self.data_mb * MB_TO_BYTES).round() as u64
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SimConfigOverride {
    pub gamma: Option<f64>,
    pub alpha: Option<f64>,
    pub window_update_period_ms: Option<f64>,
    pub timeout_ms: Option<f64>,
    pub initial_window: Option<f64>,
    pub max_time_ms: Option<f64>,
}

impl SimConfigOverride {
    pub fn apply_to(&self, config: &mut SimConfig) {
        if let Some(v) = self.gamma {
            config.gamma = v;
        }
        if let Some(v) = self.alpha {
            config.alpha = v;
        }
        if let Some(v) = self.window_update_period_ms {
            config.window_update_period_ms = v;
        }
        if let Some(v) = self.timeout_ms {
            config.timeout_ms = v;
        }
        if let Some(v) = self.initial_window {
            config.initial_window = v;
        }
        if let Some(v) = self.max_time_ms {
            config.max_time_ms = Some(v);
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// The named flow delivers everything, optionally before a deadline
    FlowCompletes { flow: String, within_ms: Option<f64> },
    /// Total drops on one directional link (or on all links) stay at or below `max`
    MaxDropped { link: Option<String>, max: u64 },
    /// The run finishes within the given virtual time
    MaxDuration { ms: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
name = "two hosts"

[config]
alpha = 20.0

[[links]]
id = "L1"
a = "H1"
b = "H2"
bandwidth = 1250.0
delay = 10.0
buffer = 64000

[[flows]]
id = "F1"
source = "H1"
destination = "H2"
data_mb = 0.5
start_ms = 1000.0

[[assertions]]
type = "flow_completes"
flow = "F1"
within_ms = 20000.0

[[assertions]]
type = "max_dropped"
max = 0
"#;

    #[test]
    fn parses_toml_topology() {
        let topology: Topology = toml::from_str(SAMPLE).unwrap();
        assert_eq!(topology.name, "two hosts");
        assert_eq!(topology.links.len(), 1);
        assert_eq!(topology.links[0].buffer, 64000);
        assert_eq!(topology.flows[0].total_bytes(), 500_000);
        assert_eq!(
            topology.assertions[1],
            Assertion::MaxDropped { link: None, max: 0 }
        );

        let mut config = SimConfig::default();
        topology.config.apply_to(&mut config);
        assert_eq!(config.alpha, 20.0);
        assert_eq!(config.gamma, 0.5);
        assert_eq!(config.max_time_ms, None);
    }
}

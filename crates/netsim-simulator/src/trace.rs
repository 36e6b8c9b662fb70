use serde::Serialize;
use netsim_abstract::SimConfig;

use crate::flow::FlowState;
use crate::metrics::{FlowSeries, LinkSeries};

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub config: SimConfig,
    pub duration_ms: f64,
    pub events_processed: u64,
    pub flows: Vec<FlowReport>,
    pub links: Vec<LinkReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub state: FlowState,
    pub total_packets: u64,
    pub packets_sent: u64,
    pub retransmissions: u64,
    pub completed_at_ms: Option<f64>,
    pub final_window: f64,
    pub min_rtt_ms: Option<f64>,
    pub avg_rtt_ms: Option<f64>,
    pub series: FlowSeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub name: String,
    pub from: String,
    pub to: String,
    pub dropped: u64,
    pub series: LinkSeries,
}

impl SimulationReport {
    pub fn flow(&self, name: &str) -> Option<&FlowReport> {
        self.flows.iter().find(|f| f.name == name)
    }

    pub fn link(&self, name: &str) -> Option<&LinkReport> {
        self.links.iter().find(|l| l.name == name)
    }

    pub fn total_dropped(&self) -> u64 {
        self.links.iter().map(|l| l.dropped).sum()
    }
}

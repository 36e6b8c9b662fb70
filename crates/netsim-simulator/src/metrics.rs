use netsim_abstract::{FlowId, LinkId, MetricsSink};
use serde::Serialize;
use std::collections::HashMap;

const BYTES_TO_MEGABITS: f64 = 8.0e-6;
const MS_PER_SEC: f64 = 1000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkSeries {
    /// (time_ms, bytes queued)
    pub buffer_occupancy: Vec<(f64, u64)>,
    /// (time_ms, packets dropped at that instant)
    pub dropped: Vec<(f64, u64)>,
    /// (arrival_ms, Mbps achieved by one packet)
    pub rate_mbps: Vec<(f64, f64)>,
}

impl LinkSeries {
    pub fn total_dropped(&self) -> u64 {
        self.dropped.iter().map(|(_, n)| n).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowSeries {
    pub sent_bytes: Vec<(f64, u64)>,
    pub received: Vec<(f64, u64)>,
    pub round_trip_ms: Vec<(f64, f64)>,
    pub window: Vec<(f64, f64)>,
}

/// In-memory `MetricsSink` backing the simulation report.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    links: HashMap<LinkId, LinkSeries>,
    flows: HashMap<FlowId, FlowSeries>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&self, id: LinkId) -> Option<&LinkSeries> {
        self.links.get(&id)
    }

    pub fn flow(&self, id: FlowId) -> Option<&FlowSeries> {
        self.flows.get(&id)
    }

    pub fn total_dropped(&self) -> u64 {
        self.links.values().map(LinkSeries::total_dropped).sum()
    }

    fn link_mut(&mut self, id: LinkId) -> &mut LinkSeries {
        self.links.entry(id).or_default()
    }

    fn flow_mut(&mut self, id: FlowId) -> &mut FlowSeries {
        self.flows.entry(id).or_default()
    }
}

impl MetricsSink for MetricsRecorder {
    fn record_buffer_occupancy(&mut self, link: LinkId, time: f64, bytes_used: u64) {
        self.link_mut(link).buffer_occupancy.push((time, bytes_used));
    }

    fn record_dropped_packet(&mut self, link: LinkId, time: f64, count: u64) {
        let dropped = &mut self.link_mut(link).dropped;
        // Drops at the same instant share one sample
        match dropped.last_mut() {
            Some((t, n)) if *t == time => *n += count,
            _ => dropped.push((time, count)),
        }
    }

    fn record_link_rate(&mut self, link: LinkId, packet_size: u64, transit_ms: f64, time: f64) {
        if transit_ms <= 0.0 {
            return;
        }
        let rate = packet_size as f64 * BYTES_TO_MEGABITS / (transit_ms / MS_PER_SEC);
        self.link_mut(link).rate_mbps.push((time, rate));
    }

    fn record_flow_send_rate(&mut self, flow: FlowId, bytes_sent: u64, time: f64) {
        self.flow_mut(flow).sent_bytes.push((time, bytes_sent));
    }

    fn record_flow_receive_sample(&mut self, flow: FlowId, time: f64, received: u64) {
        self.flow_mut(flow).received.push((time, received));
    }

    fn record_packet_rtd(&mut self, flow: FlowId, time: f64, delay_ms: f64) {
        self.flow_mut(flow).round_trip_ms.push((time, delay_ms));
    }

    fn record_window_size(&mut self, flow: FlowId, time: f64, window: f64) {
        self.flow_mut(flow).window.push((time, window));
    }
}

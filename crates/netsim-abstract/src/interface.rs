use crate::id::{FlowId, LinkId};

/// Sink for the time series produced while the simulation runs.
/// Calls are fire-and-forget: implementations must not fail or block.
pub trait MetricsSink {
    /// Bytes queued in a link buffer right after an admission.
    fn record_buffer_occupancy(&mut self, link: LinkId, time: f64, bytes_used: u64);

    fn record_dropped_packet(&mut self, link: LinkId, time: f64, count: u64);

    /// One packet crossed `link`, spending `transit_ms` between admission and arrival.
    fn record_link_rate(&mut self, link: LinkId, packet_size: u64, transit_ms: f64, time: f64);

    fn record_flow_send_rate(&mut self, flow: FlowId, bytes_sent: u64, time: f64);

    /// Running count of data packets the destination host has received for `flow`.
    fn record_flow_receive_sample(&mut self, flow: FlowId, time: f64, received: u64);

    fn record_packet_rtd(&mut self, flow: FlowId, time: f64, delay_ms: f64);

    fn record_window_size(&mut self, flow: FlowId, time: f64, window: f64);
}

/// Discards every sample.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetrics;

impl MetricsSink for NullMetrics {
    fn record_buffer_occupancy(&mut self, _link: LinkId, _time: f64, _bytes_used: u64) {}
    fn record_dropped_packet(&mut self, _link: LinkId, _time: f64, _count: u64) {}
    fn record_link_rate(&mut self, _link: LinkId, _size: u64, _transit_ms: f64, _time: f64) {}
    fn record_flow_send_rate(&mut self, _flow: FlowId, _bytes_sent: u64, _time: f64) {}
    fn record_flow_receive_sample(&mut self, _flow: FlowId, _time: f64, _received: u64) {}
    fn record_packet_rtd(&mut self, _flow: FlowId, _time: f64, _delay_ms: f64) {}
    fn record_window_size(&mut self, _flow: FlowId, _time: f64, _window: f64) {}
}

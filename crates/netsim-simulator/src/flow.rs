//! FAST-TCP style congestion control.
//!
//! One [`Flow`] plays both ends of a connection: the sender, which keeps a
//! window of unacknowledged data packets in the network, and the receiver,
//! which answers every data packet with a cumulative ack.

use crate::context::SimulationContext;
use crate::error::SimError;
use crate::scheduler::Event;
use netsim_abstract::{AckPacket, DataPacket, FlowId, HostId, Packet, SimConfig, sizes};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowState {
    NotStarted,
    Sending,
    Done,
}

/// Controller parameters, copied out of [`SimConfig`] when the flow is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastParams {
    pub gamma: f64,
    pub alpha: f64,
    pub update_period_ms: f64,
    pub timeout_ms: f64,
    pub initial_window: f64,
}

impl From<&SimConfig> for FastParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            gamma: config.gamma,
            alpha: config.alpha,
            update_period_ms: config.window_update_period_ms,
            timeout_ms: config.timeout_ms,
            initial_window: config.initial_window,
        }
    }
}

impl Default for FastParams {
    fn default() -> Self {
        Self::from(&SimConfig::default())
    }
}

#[derive(Debug)]
pub struct Flow {
    pub id: FlowId,
    pub name: String,
    pub source: HostId,
    pub destination: HostId,
    pub total_bytes: u64,
    pub start_time: f64,
    total_packets: u64,
    params: FastParams,

    window: f64,
    /// Next packet id the receiver is known to expect
    last_ack: u64,
    unacknowledged: BTreeSet<u64>,
    // receiver side
    not_received: BTreeSet<u64>,

    min_rtt: Option<f64>,
    rtt_sum: f64,
    rtt_count: u64,

    state: FlowState,
    packets_sent: u64,
    retransmissions: u64,
    completed_at: Option<f64>,
}

impl Flow {
    pub fn new(
        id: FlowId,
        name: impl Into<String>,
        source: HostId,
        destination: HostId,
        total_bytes: u64,
        start_time: f64,
        params: FastParams,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            source,
            destination,
            total_bytes,
            start_time,
            total_packets: total_bytes.div_ceil(sizes::DATA),
            params,
            window: params.initial_window,
            last_ack: 0,
            unacknowledged: BTreeSet::new(),
            not_received: BTreeSet::new(),
            min_rtt: None,
            rtt_sum: 0.0,
            rtt_count: 0,
            state: FlowState::NotStarted,
            packets_sent: 0,
            retransmissions: 0,
            completed_at: None,
        }
    }

    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    pub fn last_ack(&self) -> u64 {
        self.last_ack
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == FlowState::Done
    }

    pub fn unacknowledged(&self) -> &BTreeSet<u64> {
        &self.unacknowledged
    }

    pub fn min_rtt(&self) -> Option<f64> {
        self.min_rtt
    }

    pub fn avg_rtt(&self) -> Option<f64> {
        (self.rtt_count > 0).then(|| self.rtt_sum / self.rtt_count as f64)
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    pub fn retransmissions(&self) -> u64 {
        self.retransmissions
    }

    pub fn completed_at(&self) -> Option<f64> {
        self.completed_at
    }

    pub fn start(&mut self, ctx: &mut SimulationContext<'_>) -> Result<(), SimError> {
        info!(
            "[{}] starting at {}ms: {} packets from {} to {}",
            self.name,
            ctx.now(),
            self.total_packets,
            self.source,
            self.destination
        );
        self.not_received = (0..self.total_packets).collect();
        self.state = FlowState::Sending;

        if self.total_packets == 0 {
            return self.finish(ctx);
        }

        self.send_up_to_window(ctx, self.window.ceil() as i64)?;
        ctx.schedule_after(
            self.params.update_period_ms,
            Event::WindowUpdate { flow: self.id },
        )
    }

    pub fn send_packet(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        packet: Packet,
    ) -> Result<(), SimError> {
        let host = match &packet {
            Packet::Data(data) => {
                self.unacknowledged.insert(data.id);
                self.packets_sent += 1;
                ctx.schedule_after(
                    self.params.timeout_ms,
                    Event::PacketTimeout {
                        flow: self.id,
                        packet_id: data.id,
                    },
                )?;
                self.source
            }
            Packet::Ack(_) => self.destination,
        };
        ctx.schedule_now(Event::FlowSendPackets {
            host,
            packets: vec![packet],
        })
    }

    /// Send up to `n` packets that are not already outstanding, starting at the
    /// cumulative ack. Returns how many were sent.
    pub fn send_up_to_window(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        n: i64,
    ) -> Result<u64, SimError> {
        let mut sent = 0u64;
        let mut id = self.last_ack;
        while (sent as i64) < n && id < self.total_packets {
            if !self.unacknowledged.contains(&id) {
                let packet = DataPacket::new(id, self.source, self.destination, self.id, ctx.now());
                self.send_packet(ctx, Packet::Data(packet))?;
                sent += 1;
            }
            id += 1;
        }

        ctx.metrics
            .record_flow_send_rate(self.id, sent * sizes::DATA, ctx.scheduler.now());
        Ok(sent)
    }

    pub fn on_ack_received(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        next_expected: u64,
        timestamp: f64,
    ) -> Result<(), SimError> {
        let rtt = ctx.now() - timestamp;
        self.record_rtt(ctx, rtt);

        if next_expected <= self.last_ack {
            return Ok(());
        }
        self.last_ack = next_expected.min(self.total_packets);
        self.unacknowledged = self.unacknowledged.split_off(&self.last_ack);

        if self.last_ack == self.total_packets {
            return self.finish(ctx);
        }

        let room = self.window.ceil() as i64 - self.unacknowledged.len() as i64;
        self.send_up_to_window(ctx, room)?;
        Ok(())
    }

    /// Retransmit `packet_id` if it is still outstanding. Returns whether it was.
    pub fn on_timeout(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        packet_id: u64,
    ) -> Result<bool, SimError> {
        if !self.unacknowledged.contains(&packet_id) {
            return Ok(false);
        }
        debug!("[{}] timeout, retransmitting {}", self.name, packet_id);
        self.retransmissions += 1;
        let packet = DataPacket::new(packet_id, self.source, self.destination, self.id, ctx.now());
        self.send_packet(ctx, Packet::Data(packet))?;
        Ok(true)
    }

    pub fn on_window_update(&mut self, ctx: &mut SimulationContext<'_>) -> Result<(), SimError> {
        self.window = match (self.min_rtt, self.avg_rtt()) {
            (Some(min_rtt), Some(avg_rtt)) => {
                let FastParams { gamma, alpha, .. } = self.params;
                let doubled = 2.0 * self.window;
                let target = (1.0 - gamma) * self.window
                    + gamma * (min_rtt / avg_rtt * self.window + alpha);
                doubled.min(target)
            }
            _ => 1.0,
        };
        ctx.metrics.record_window_size(self.id, ctx.scheduler.now(), self.window);

        if self.is_done() {
            return Ok(());
        }
        ctx.schedule_after(
            self.params.update_period_ms,
            Event::WindowUpdate { flow: self.id },
        )
    }

    /// Receiver side: note the arrival and answer with a cumulative ack.
    pub fn on_data_packet_received(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        data: &DataPacket,
    ) -> Result<(), SimError> {
        self.not_received.remove(&data.id);
        let next_expected = self
            .not_received
            .first()
            .copied()
            .unwrap_or(self.total_packets);
        let ack = AckPacket::answering(data, next_expected);
        self.send_packet(ctx, Packet::Ack(ack))
    }

    fn record_rtt(&mut self, ctx: &mut SimulationContext<'_>, rtt: f64) {
        ctx.metrics.record_packet_rtd(self.id, ctx.scheduler.now(), rtt);
        self.min_rtt = Some(self.min_rtt.map_or(rtt, |min| min.min(rtt)));
        self.rtt_sum += rtt;
        self.rtt_count += 1;
    }

    fn finish(&mut self, ctx: &mut SimulationContext<'_>) -> Result<(), SimError> {
        self.unacknowledged.clear();
        self.state = FlowState::Done;
        self.completed_at = Some(ctx.now());
        ctx.schedule_now(Event::FlowDone { flow: self.id })
    }
}

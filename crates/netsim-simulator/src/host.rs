use crate::context::SimulationContext;
use crate::error::SimError;
use crate::flow::Flow;
use crate::scheduler::Event;
use netsim_abstract::{FlowId, HostId, LinkId, Packet};
use std::collections::HashMap;

/// End point of the network. Relays packets between its flows and its one outgoing link.
#[derive(Debug)]
pub struct Host {
    pub id: HostId,
    pub name: String,
    pub out_link: LinkId,
    // per-flow data packet counts, only for metrics
    received: HashMap<FlowId, u64>,
}

impl Host {
    pub fn new(id: HostId, name: impl Into<String>, out_link: LinkId) -> Self {
        Self {
            id,
            name: name.into(),
            out_link,
            received: HashMap::new(),
        }
    }

    pub fn received(&self, flow: FlowId) -> u64 {
        self.received.get(&flow).copied().unwrap_or(0)
    }

    pub fn send_packets(
        &self,
        ctx: &mut SimulationContext<'_>,
        packets: Vec<Packet>,
    ) -> Result<(), SimError> {
        for packet in packets {
            ctx.schedule_now(Event::PacketSend {
                link: self.out_link,
                packet,
            })?;
        }
        Ok(())
    }

    /// Hand an arriving packet to its flow: acks become `AckReceived` events,
    /// data goes straight to the receiving side of `flows[packet.flow]`.
    pub fn receive_packet(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        packet: Packet,
        flows: &mut [Flow],
    ) -> Result<(), SimError> {
        if packet.destination() != self.id {
            return Err(SimError::Misrouted {
                kind: packet.kind(),
                expected: packet.destination(),
                actual: self.id,
            });
        }

        match packet {
            Packet::Ack(ack) => ctx.schedule_now(Event::AckReceived {
                flow: ack.flow,
                next_expected: ack.next_expected,
                timestamp: ack.timestamp,
            }),
            Packet::Data(data) => {
                let flow = flows
                    .get_mut(data.flow.index())
                    .ok_or(SimError::UnknownFlow(data.flow))?;
                let count = self.received.entry(data.flow).or_insert(0);
                *count += 1;
                ctx.metrics
                    .record_flow_receive_sample(data.flow, ctx.scheduler.now(), *count);
                flow.on_data_packet_received(ctx, &data)
            }
        }
    }
}

use crate::id::{FlowId, HostId};
use serde::{Deserialize, Serialize};

/// Fixed packet sizes in bytes
pub mod sizes {
    pub const DATA: u64 = 1024;
    pub const ACK: u64 = 64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPacket {
    /// Sequence number, unique within the owning flow
    pub id: u64,
    pub origin: HostId,
    pub destination: HostId,
    pub flow: FlowId,
    pub size: u64,
    /// Virtual time (ms) at which this copy was created
    pub timestamp: f64,
}

impl DataPacket {
    pub fn new(id: u64, origin: HostId, destination: HostId, flow: FlowId, timestamp: f64) -> Self {
        Self {
            id,
            origin,
            destination,
            flow,
            size: sizes::DATA,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AckPacket {
    /// Cumulative ack: the next packet id the receiver expects
    pub next_expected: u64,
    pub origin: HostId,
    pub destination: HostId,
    pub flow: FlowId,
    pub size: u64,
    /// Timestamp copied from the data packet that triggered this ack
    pub timestamp: f64,
}

impl AckPacket {
    /// Build the ack answering `data`. Origin and destination are reversed.
    pub fn answering(data: &DataPacket, next_expected: u64) -> Self {
        Self {
            next_expected,
            origin: data.destination,
            destination: data.origin,
            flow: data.flow,
            size: sizes::ACK,
            timestamp: data.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Packet {
    Data(DataPacket),
    Ack(AckPacket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketKind {
    Data,
    Ack,
}

/// Identifies every copy of "the same" packet: retransmissions share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketKey {
    pub flow: FlowId,
    pub kind: PacketKind,
    pub id: u64,
}

impl Packet {
    pub fn size(&self) -> u64 {
        match self {
            Packet::Data(p) => p.size,
            Packet::Ack(p) => p.size,
        }
    }

    pub fn flow(&self) -> FlowId {
        match self {
            Packet::Data(p) => p.flow,
            Packet::Ack(p) => p.flow,
        }
    }

    pub fn destination(&self) -> HostId {
        match self {
            Packet::Data(p) => p.destination,
            Packet::Ack(p) => p.destination,
        }
    }

    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Data(_) => PacketKind::Data,
            Packet::Ack(_) => PacketKind::Ack,
        }
    }

    pub fn key(&self) -> PacketKey {
        let id = match self {
            Packet::Data(p) => p.id,
            Packet::Ack(p) => p.next_expected,
        };
        PacketKey {
            flow: self.flow(),
            kind: self.kind(),
            id,
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Packet::Ack(_))
    }
}

pub mod config;
pub mod id;
pub mod interface;
pub mod packet;
pub mod scenario;

pub use config::SimConfig;
pub use id::{FlowId, HostId, LinkId};
pub use interface::{MetricsSink, NullMetrics};
pub use packet::{AckPacket, DataPacket, Packet, PacketKey, PacketKind};
// Re-export size constants so callers can write `sizes::DATA`
pub use packet::sizes;

pub use scenario::{Assertion, FlowSpec, LinkSpec, SimConfigOverride, Topology};

use netsim_abstract::{FlowId, HostId, LinkId, PacketKind};
use thiserror::Error;

/// Fatal faults inside the core. Modeled network conditions (drops, stale timers) never show up here.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("event scheduled at {when}ms but the clock already reads {now}ms")]
    ScheduledInPast { when: f64, now: f64 },
    #[error("no link with index {0}")]
    UnknownLink(LinkId),
    #[error("no host with index {0}")]
    UnknownHost(HostId),
    #[error("no flow with index {0}")]
    UnknownFlow(FlowId),
    #[error("{kind:?} packet for {expected} delivered to {actual}")]
    Misrouted {
        kind: PacketKind,
        expected: HostId,
        actual: HostId,
    },
}

/// Popping from a scheduler with nothing left. This is how a run ends.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no pending events")]
pub struct SchedulerEmpty;

/// Structural problems found while building the network. No event has been scheduled yet.
#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    #[error("{kind} `{id}` defined twice")]
    DuplicateIdentifier { kind: &'static str, id: String },
    #[error("host `{0}` has two outgoing links")]
    MultipleOutLinks(String),
    #[error("flow `{flow}` references unknown host `{host}`")]
    UnknownHost { flow: String, host: String },
    #[error("flow `{0}` has the same source and destination")]
    LoopbackFlow(String),
    #[error("flow `{flow}`: `{from}` and `{to}` are not joined by a link")]
    UnreachableDestination { flow: String, from: String, to: String },
    #[error("link `{id}` has invalid {field}: {value}")]
    InvalidLink {
        id: String,
        field: &'static str,
        value: f64,
    },
    #[error("flow `{id}` has invalid {field}: {value}")]
    InvalidFlow {
        id: String,
        field: &'static str,
        value: f64,
    },
}

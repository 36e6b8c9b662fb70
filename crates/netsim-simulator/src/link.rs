use crate::context::SimulationContext;
use crate::error::SimError;
use crate::scheduler::Event;
use netsim_abstract::{HostId, LinkId, Packet, PacketKey};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Entry timestamps of packets currently on a link.
///
/// Retransmissions reuse a packet key, so several copies of one key can be on
/// the link at once. They leave in the order they entered, so each exit pairs
/// with the oldest outstanding entry for its key.
#[derive(Debug, Default)]
pub struct TransitLog {
    entries: HashMap<PacketKey, VecDeque<f64>>,
}

impl TransitLog {
    pub fn enter(&mut self, key: PacketKey, time: f64) {
        self.entries.entry(key).or_default().push_back(time);
    }

    /// Resolve the oldest entry for `key`.
    pub fn exit(&mut self, key: PacketKey) -> Option<f64> {
        let queue = self.entries.get_mut(&key)?;
        let entered = queue.pop_front();
        if queue.is_empty() {
            self.entries.remove(&key);
        }
        entered
    }

    /// Copies of `key` still unresolved.
    pub fn outstanding(&self, key: PacketKey) -> usize {
        self.entries.get(&key).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What `enqueue_packet` did with a packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// The link was idle; the packet arrives at this time.
    Transmitting { arrives_at: f64 },
    /// Queued behind other traffic; occupancy after admission.
    Buffered { occupancy: u64 },
    Dropped,
}

/// A uni-directional link. Data only flows from `from` to `to`.
#[derive(Debug)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub from: HostId,
    pub to: HostId,
    /// Bytes per millisecond
    pub bandwidth: f64,
    /// Milliseconds
    pub delay: f64,
    /// Bytes
    pub capacity: u64,
    occupancy: u64,
    busy: bool,
    buffer: VecDeque<Packet>,
    transit: TransitLog,
}

impl Link {
    pub fn new(
        id: LinkId,
        name: impl Into<String>,
        from: HostId,
        to: HostId,
        bandwidth: f64,
        delay: f64,
        capacity: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            from,
            to,
            bandwidth,
            delay,
            capacity,
            occupancy: 0,
            busy: false,
            buffer: VecDeque::new(),
            transit: TransitLog::default(),
        }
    }

    pub fn occupancy(&self) -> u64 {
        self.occupancy
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn queued(&self) -> usize {
        self.buffer.len()
    }

    pub fn transit(&self) -> &TransitLog {
        &self.transit
    }

    /// Time from starting to transmit `size` bytes until they arrive at `to`.
    pub fn travel_time(&self, size: u64) -> f64 {
        self.delay + size as f64 / self.bandwidth
    }

    pub fn enqueue_packet(
        &mut self,
        ctx: &mut SimulationContext<'_>,
        packet: Packet,
    ) -> Result<Admission, SimError> {
        let now = ctx.now();
        let size = packet.size();

        // An idle link still counts the packet against its buffer
        if self.occupancy + size > self.capacity {
            debug!(
                "[{}] DROP {:?} (occupancy {} + {} > {})",
                self.name,
                packet.key(),
                self.occupancy,
                size,
                self.capacity
            );
            ctx.metrics.record_dropped_packet(self.id, now, 1);
            return Ok(Admission::Dropped);
        }

        self.transit.enter(packet.key(), now);

        if !self.busy && self.buffer.is_empty() {
            self.busy = true;
            let arrives_at = self.transmit(ctx, packet)?;
            return Ok(Admission::Transmitting { arrives_at });
        }

        self.buffer.push_back(packet);
        self.occupancy += size;
        ctx.metrics
            .record_buffer_occupancy(self.id, now, self.occupancy);
        Ok(Admission::Buffered {
            occupancy: self.occupancy,
        })
    }

    /// React to the end of a transmission: start the next queued packet or go idle.
    pub fn handle_link_free(&mut self, ctx: &mut SimulationContext<'_>) -> Result<(), SimError> {
        match self.buffer.pop_front() {
            None => {
                self.busy = false;
            }
            Some(packet) => {
                self.occupancy -= packet.size();
                self.busy = true;
                self.transmit(ctx, packet)?;
            }
        }
        Ok(())
    }

    fn transmit(&mut self, ctx: &mut SimulationContext<'_>, packet: Packet) -> Result<f64, SimError> {
        let now = ctx.now();
        let finish = now + self.travel_time(packet.size());
        let entered = self.transit.exit(packet.key()).unwrap_or(now);
        ctx.metrics
            .record_link_rate(self.id, packet.size(), finish - entered, finish);

        ctx.scheduler.schedule(finish, Event::LinkFree { link: self.id })?;
        ctx.scheduler.schedule(
            finish,
            Event::PacketReceive {
                host: self.to,
                packet,
            },
        )?;
        Ok(finish)
    }
}

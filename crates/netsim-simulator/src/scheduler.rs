use crate::error::{SchedulerEmpty, SimError};
use netsim_abstract::{FlowId, HostId, LinkId, Packet};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    FlowStart {
        flow: FlowId,
    },
    PacketSend {
        link: LinkId,
        packet: Packet,
    },
    LinkFree {
        link: LinkId,
    },
    PacketReceive {
        host: HostId,
        packet: Packet,
    },
    FlowSendPackets {
        host: HostId,
        packets: Vec<Packet>,
    },
    AckReceived {
        flow: FlowId,
        next_expected: u64,
        timestamp: f64,
    },
    PacketTimeout {
        flow: FlowId,
        packet_id: u64,
    },
    WindowUpdate {
        flow: FlowId,
    },
    FlowDone {
        flow: FlowId,
    },
}

#[derive(Debug)]
struct Scheduled {
    time: f64,
    event: Event,
    id: u64, // insertion order, breaks ties between equal times
}

// Custom Ord for Min-Heap (smallest time pops first)
impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse comparison: smallest (time, id) is Greater in BinaryHeap
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Global event queue and virtual clock.
#[derive(Debug, Default)]
pub struct EventScheduler {
    now: f64,
    queue: BinaryHeap<Scheduled>,
    next_id: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the last popped event.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn schedule(&mut self, when: f64, event: Event) -> Result<(), SimError> {
        if when < self.now || when.is_nan() {
            return Err(SimError::ScheduledInPast {
                when,
                now: self.now,
            });
        }
        self.queue.push(Scheduled {
            time: when,
            event,
            id: self.next_id,
        });
        self.next_id += 1;
        Ok(())
    }

    pub fn schedule_after(&mut self, delay: f64, event: Event) -> Result<(), SimError> {
        self.schedule(self.now + delay, event)
    }

    pub fn schedule_now(&mut self, event: Event) -> Result<(), SimError> {
        self.schedule(self.now, event)
    }

    /// Remove the earliest event and advance the clock to it.
    pub fn pop_next(&mut self) -> Result<(f64, Event), SchedulerEmpty> {
        let next = self.queue.pop().ok_or(SchedulerEmpty)?;
        self.now = next.time;
        Ok((next.time, next.event))
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.queue.peek().map(|s| s.time)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of events ever scheduled.
    pub fn scheduled_total(&self) -> u64 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(flow: usize) -> Event {
        Event::WindowUpdate { flow: FlowId(flow) }
    }

    #[test]
    fn pops_in_time_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(5.0, update(0)).unwrap();
        scheduler.schedule(1.5, update(1)).unwrap();
        scheduler.schedule(3.0, update(2)).unwrap();

        let times: Vec<f64> = std::iter::from_fn(|| scheduler.pop_next().ok())
            .map(|(t, _)| t)
            .collect();
        assert_eq!(times, vec![1.5, 3.0, 5.0]);
        assert_eq!(scheduler.now(), 5.0);
    }

    #[test]
    fn equal_times_pop_in_insertion_order() {
        let mut scheduler = EventScheduler::new();
        for flow in 0..5 {
            scheduler.schedule(2.0, update(flow)).unwrap();
        }
        for flow in 0..5 {
            let (_, event) = scheduler.pop_next().unwrap();
            assert_eq!(event, update(flow));
        }
    }

    #[test]
    fn empty_queue_reports_scheduler_empty() {
        let mut scheduler = EventScheduler::new();
        assert_eq!(scheduler.pop_next().unwrap_err(), SchedulerEmpty);
        scheduler.schedule_now(update(0)).unwrap();
        assert!(scheduler.pop_next().is_ok());
        assert_eq!(scheduler.pop_next().unwrap_err(), SchedulerEmpty);
    }

    #[test]
    fn rejects_events_in_the_past() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(10.0, update(0)).unwrap();
        scheduler.pop_next().unwrap();

        let err = scheduler.schedule(9.0, update(1)).unwrap_err();
        assert!(matches!(err, SimError::ScheduledInPast { .. }));
        assert!(scheduler.is_empty());

        scheduler.schedule_after(0.0, update(1)).unwrap();
        assert_eq!(scheduler.peek_time(), Some(10.0));
        assert_eq!(scheduler.scheduled_total(), 2);
    }
}

use crate::context::SimulationContext;
use crate::error::{SimError, TopologyError};
use crate::metrics::MetricsRecorder;
use crate::network::Network;
use crate::scheduler::{Event, EventScheduler};
use crate::trace::{FlowReport, LinkReport, SimulationReport};
use netsim_abstract::{MetricsSink, SimConfig, Topology};
use tracing::{debug, info, warn};

/// Drives a [`Network`] by popping events off the scheduler and dispatching
/// them to the link, host or flow that owns them.
pub struct Simulator<M: MetricsSink = MetricsRecorder> {
    scheduler: EventScheduler,
    metrics: M,
    network: Network,
    config: SimConfig,
    initialized: bool,
    events_processed: u64,
    flows_done: usize,
}

impl Simulator<MetricsRecorder> {
    pub fn new(network: Network, config: SimConfig) -> Self {
        Self::with_metrics(network, config, MetricsRecorder::new())
    }

    pub fn from_topology(topology: &Topology, config: SimConfig) -> Result<Self, TopologyError> {
        let network = Network::from_topology(topology, &config)?;
        Ok(Self::new(network, config))
    }

    /// Produce a serializable snapshot of the current simulation state.
    pub fn export_report(&self) -> SimulationReport {
        let host_name = |id: netsim_abstract::HostId| {
            self.network
                .hosts
                .get(id.index())
                .map_or_else(|| id.to_string(), |h| h.name.clone())
        };

        let flows = self
            .network
            .flows
            .iter()
            .map(|flow| FlowReport {
                name: flow.name.clone(),
                source: host_name(flow.source),
                destination: host_name(flow.destination),
                state: flow.state(),
                total_packets: flow.total_packets(),
                packets_sent: flow.packets_sent(),
                retransmissions: flow.retransmissions(),
                completed_at_ms: flow.completed_at(),
                final_window: flow.window(),
                min_rtt_ms: flow.min_rtt(),
                avg_rtt_ms: flow.avg_rtt(),
                series: self.metrics.flow(flow.id).cloned().unwrap_or_default(),
            })
            .collect();

        let links = self
            .network
            .links
            .iter()
            .map(|link| {
                let series = self.metrics.link(link.id).cloned().unwrap_or_default();
                LinkReport {
                    name: link.name.clone(),
                    from: host_name(link.from),
                    to: host_name(link.to),
                    dropped: series.total_dropped(),
                    series,
                }
            })
            .collect();

        SimulationReport {
            config: self.config.clone(),
            duration_ms: self.scheduler.now(),
            events_processed: self.events_processed,
            flows,
            links,
        }
    }
}

impl<M: MetricsSink> Simulator<M> {
    pub fn with_metrics(network: Network, config: SimConfig, metrics: M) -> Self {
        Self {
            scheduler: EventScheduler::new(),
            metrics,
            network,
            config,
            initialized: false,
            events_processed: 0,
            flows_done: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    pub fn current_time(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn peek_next_event_time(&self) -> Option<f64> {
        self.scheduler.peek_time()
    }

    pub fn remaining_events(&self) -> usize {
        self.scheduler.len()
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    pub fn all_flows_done(&self) -> bool {
        self.flows_done == self.network.flows.len()
    }

    /// Schedule a `FlowStart` for every flow at its start time.
    pub fn init(&mut self) -> Result<(), SimError> {
        if self.initialized {
            return Ok(());
        }
        for flow in &self.network.flows {
            self.scheduler
                .schedule(flow.start_time, Event::FlowStart { flow: flow.id })?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Process the next event. Returns false once the queue is empty.
    pub fn step(&mut self) -> Result<bool, SimError> {
        let Ok((time, event)) = self.scheduler.pop_next() else {
            return Ok(false);
        };
        debug!("Processing event at {}: {:?}", time, event);
        self.events_processed += 1;

        let mut ctx = SimulationContext::new(&mut self.scheduler, &mut self.metrics);
        match event {
            Event::FlowStart { flow } => self.network.flow_mut(flow)?.start(&mut ctx)?,
            Event::PacketSend { link, packet } => {
                self.network.link_mut(link)?.enqueue_packet(&mut ctx, packet)?;
            }
            Event::LinkFree { link } => self.network.link_mut(link)?.handle_link_free(&mut ctx)?,
            Event::PacketReceive { host, packet } => {
                let Network { hosts, flows, .. } = &mut self.network;
                let host = hosts
                    .get_mut(host.index())
                    .ok_or(SimError::UnknownHost(host))?;
                host.receive_packet(&mut ctx, packet, flows)?;
            }
            Event::FlowSendPackets { host, packets } => {
                self.network.host(host)?.send_packets(&mut ctx, packets)?;
            }
            Event::AckReceived {
                flow,
                next_expected,
                timestamp,
            } => self
                .network
                .flow_mut(flow)?
                .on_ack_received(&mut ctx, next_expected, timestamp)?,
            Event::PacketTimeout { flow, packet_id } => {
                self.network.flow_mut(flow)?.on_timeout(&mut ctx, packet_id)?;
            }
            Event::WindowUpdate { flow } => {
                self.network.flow_mut(flow)?.on_window_update(&mut ctx)?
            }
            Event::FlowDone { flow } => {
                let flow = self.network.flow_mut(flow)?;
                info!(
                    "Flow {} is done at {}ms ({} retransmissions)",
                    flow.name,
                    time,
                    flow.retransmissions()
                );
                self.flows_done += 1;
            }
        }
        Ok(true)
    }

    /// Run until no events remain or the configured time limit is passed.
    pub fn run_until_complete(&mut self) -> Result<(), SimError> {
        self.init()?;
        loop {
            if let Some(limit) = self.config.max_time_ms
                && let Some(next) = self.scheduler.peek_time()
                && next > limit
            {
                warn!(
                    "Stopping at {}ms: next event at {}ms is past the {}ms limit",
                    self.scheduler.now(),
                    next,
                    limit
                );
                break;
            }
            if !self.step()? {
                break;
            }
        }
        info!(
            "Simulation finished at {}ms after {} events ({}/{} flows done)",
            self.scheduler.now(),
            self.events_processed,
            self.flows_done,
            self.network.flows.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Simulator;
    use crate::flow::FlowState;
    use netsim_abstract::{FlowSpec, LinkSpec, NullMetrics, SimConfig, Topology, sizes};

    fn topology(bandwidth: f64, delay: f64, buffer: u64, flows: &[(&str, u64, f64)]) -> Topology {
        Topology {
            name: "test".to_string(),
            links: vec![LinkSpec {
                id: "L1".to_string(),
                a: "H1".to_string(),
                b: "H2".to_string(),
                bandwidth,
                delay,
                buffer,
            }],
            flows: flows
                .iter()
                .map(|(id, packets, start_ms)| FlowSpec {
                    id: id.to_string(),
                    source: "H1".to_string(),
                    destination: "H2".to_string(),
                    data_mb: (*packets * sizes::DATA) as f64 / 1_000_000.0,
                    start_ms: *start_ms,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn lossless_flow_completes() {
        let topology = topology(1000.0, 5.0, 1_000_000, &[("F1", 50, 0.0)]);
        let mut sim = Simulator::from_topology(&topology, SimConfig::default()).unwrap();
        sim.run_until_complete().unwrap();

        assert!(sim.all_flows_done());
        assert_eq!(sim.remaining_events(), 0);
        let flow = sim.network().find_flow("F1").unwrap();
        assert_eq!(flow.state(), FlowState::Done);
        assert_eq!(flow.last_ack(), 50);
        assert_eq!(flow.retransmissions(), 0);
        assert_eq!(flow.packets_sent(), 50);

        let report = sim.export_report();
        assert_eq!(report.total_dropped(), 0);
        let f1 = report.flow("F1").unwrap();
        assert!(f1.completed_at_ms.is_some());
        assert_eq!(f1.source, "H1");
        assert_eq!(report.link("L1a").unwrap().to, "H2");
        // One receive sample per delivered data packet
        assert_eq!(f1.series.received.len(), 50);
    }

    #[test]
    fn invariants_hold_at_every_step() {
        let topology = topology(100.0, 1.0, 2048, &[("F1", 30, 0.0)]);
        let config = SimConfig {
            max_time_ms: Some(120_000.0),
            ..Default::default()
        };
        let mut sim = Simulator::from_topology(&topology, config).unwrap();
        sim.init().unwrap();

        let mut last_ack = 0;
        while sim.step().unwrap() {
            for link in &sim.network().links {
                assert!(link.occupancy() <= link.capacity);
            }
            let flow = &sim.network().flows[0];
            assert!(flow.last_ack() >= last_ack);
            assert!(flow.last_ack() <= flow.total_packets());
            last_ack = flow.last_ack();
            if sim.current_time() > 120_000.0 {
                break;
            }
        }
        assert_eq!(last_ack, 30);
    }

    #[test]
    fn losses_are_recovered_by_timeouts() {
        let topology = topology(100.0, 1.0, 2048, &[("F1", 40, 0.0)]);
        let config = SimConfig {
            max_time_ms: Some(120_000.0),
            ..Default::default()
        };
        let mut sim = Simulator::from_topology(&topology, config).unwrap();
        sim.run_until_complete().unwrap();

        let report = sim.export_report();
        let f1 = report.flow("F1").unwrap();
        assert_eq!(f1.state, FlowState::Done);
        assert!(report.link("L1a").unwrap().dropped > 0);
        assert!(f1.retransmissions > 0);
        assert_eq!(f1.packets_sent, 40 + f1.retransmissions);
    }

    #[test]
    fn two_flows_share_a_link() {
        let topology = topology(500.0, 2.0, 64_000, &[("F1", 40, 0.0), ("F2", 40, 50.0)]);
        let mut sim = Simulator::from_topology(&topology, SimConfig::default()).unwrap();
        sim.run_until_complete().unwrap();

        assert!(sim.all_flows_done());
        let report = sim.export_report();
        let f2 = report.flow("F2").unwrap();
        assert!(f2.completed_at_ms.unwrap() > 50.0);
        assert!(f2.min_rtt_ms.unwrap() > 0.0);
    }

    #[test]
    fn identical_inputs_replay_identically() {
        let topology = topology(100.0, 1.0, 4096, &[("F1", 30, 0.0), ("F2", 20, 10.0)]);
        let config = SimConfig {
            max_time_ms: Some(120_000.0),
            ..Default::default()
        };
        let run = || {
            let mut sim = Simulator::from_topology(&topology, config.clone()).unwrap();
            sim.run_until_complete().unwrap();
            sim.export_report()
        };
        let first = run();
        let second = run();

        assert_eq!(first.duration_ms, second.duration_ms);
        assert_eq!(first.events_processed, second.events_processed);
        for (a, b) in first.flows.iter().zip(&second.flows) {
            assert_eq!(a.completed_at_ms, b.completed_at_ms);
            assert_eq!(a.series, b.series);
        }
        for (a, b) in first.links.iter().zip(&second.links) {
            assert_eq!(a.series, b.series);
        }
    }

    #[test]
    fn time_limit_stops_the_run() {
        let topology = topology(1000.0, 5.0, 1_000_000, &[("F1", 500, 0.0)]);
        let config = SimConfig {
            max_time_ms: Some(50.0),
            ..Default::default()
        };
        let mut sim = Simulator::from_topology(&topology, config).unwrap();
        sim.run_until_complete().unwrap();
        assert!(sim.current_time() <= 50.0);
        assert!(!sim.all_flows_done());
        assert!(sim.remaining_events() > 0);
    }

    #[test]
    fn runs_with_a_custom_metrics_sink() {
        let topology = topology(1000.0, 5.0, 1_000_000, &[("F1", 10, 0.0)]);
        let network =
            crate::network::Network::from_topology(&topology, &SimConfig::default()).unwrap();
        let mut sim = Simulator::with_metrics(network, SimConfig::default(), NullMetrics);
        sim.run_until_complete().unwrap();
        assert!(sim.all_flows_done());
    }
}

use crate::error::{SimError, TopologyError};
use crate::flow::{FastParams, Flow};
use crate::host::Host;
use crate::link::Link;
use netsim_abstract::{FlowId, HostId, LinkId, SimConfig, Topology};
use std::collections::HashMap;
use tracing::debug;

/// Every link, host and flow of one run, indexed by their ids.
#[derive(Debug, Default)]
pub struct Network {
    pub links: Vec<Link>,
    pub hosts: Vec<Host>,
    pub flows: Vec<Flow>,
}

impl Network {
    /// Validate a topology and instantiate its entities.
    pub fn from_topology(topology: &Topology, config: &SimConfig) -> Result<Self, TopologyError> {
        let mut link_ids: HashMap<String, LinkId> = HashMap::new();
        let mut host_ids: HashMap<String, HostId> = HashMap::new();
        let mut host_names: Vec<String> = Vec::new();
        let mut out_links: Vec<Option<LinkId>> = Vec::new();
        let mut links = Vec::new();

        let mut host_id = |name: &str, names: &mut Vec<String>, outs: &mut Vec<Option<LinkId>>| {
            *host_ids.entry(name.to_string()).or_insert_with(|| {
                names.push(name.to_string());
                outs.push(None);
                HostId(names.len() - 1)
            })
        };

        for spec in &topology.links {
            if !(spec.bandwidth.is_finite() && spec.bandwidth > 0.0) {
                return Err(TopologyError::InvalidLink {
                    id: spec.id.clone(),
                    field: "bandwidth",
                    value: spec.bandwidth,
                });
            }
            if !(spec.delay.is_finite() && spec.delay >= 0.0) {
                return Err(TopologyError::InvalidLink {
                    id: spec.id.clone(),
                    field: "delay",
                    value: spec.delay,
                });
            }

            let a = host_id(&spec.a, &mut host_names, &mut out_links);
            let b = host_id(&spec.b, &mut host_names, &mut out_links);
            for (suffix, from, to) in [("a", a, b), ("b", b, a)] {
                let name = format!("{}{}", spec.id, suffix);
                if link_ids.contains_key(&name) {
                    return Err(TopologyError::DuplicateIdentifier {
                        kind: "link",
                        id: spec.id.clone(),
                    });
                }
                let id = LinkId(links.len());
                if out_links[from.index()].replace(id).is_some() {
                    return Err(TopologyError::MultipleOutLinks(
                        host_names[from.index()].clone(),
                    ));
                }
                debug!("creating link {} from {} to {}", name, from, to);
                links.push(Link::new(
                    id,
                    name.clone(),
                    from,
                    to,
                    spec.bandwidth,
                    spec.delay,
                    spec.buffer,
                ));
                link_ids.insert(name, id);
            }
        }

        let hosts = host_names
            .into_iter()
            .zip(out_links)
            .enumerate()
            .filter_map(|(idx, (name, out))| out.map(|link| Host::new(HostId(idx), name, link)))
            .collect::<Vec<_>>();

        let params = FastParams::from(config);
        let mut flow_ids: HashMap<&str, FlowId> = HashMap::new();
        let mut flows = Vec::new();
        for spec in &topology.flows {
            if flow_ids.contains_key(spec.id.as_str()) {
                return Err(TopologyError::DuplicateIdentifier {
                    kind: "flow",
                    id: spec.id.clone(),
                });
            }
            if !(spec.data_mb.is_finite() && spec.data_mb >= 0.0) {
                return Err(TopologyError::InvalidFlow {
                    id: spec.id.clone(),
                    field: "data_mb",
                    value: spec.data_mb,
                });
            }
            if !(spec.start_ms.is_finite() && spec.start_ms >= 0.0) {
                return Err(TopologyError::InvalidFlow {
                    id: spec.id.clone(),
                    field: "start_ms",
                    value: spec.start_ms,
                });
            }
            let lookup = |host: &str| {
                host_ids
                    .get(host)
                    .copied()
                    .ok_or_else(|| TopologyError::UnknownHost {
                        flow: spec.id.clone(),
                        host: host.to_string(),
                    })
            };
            let source = lookup(&spec.source)?;
            let destination = lookup(&spec.destination)?;
            if source == destination {
                return Err(TopologyError::LoopbackFlow(spec.id.clone()));
            }
            // No forwarding: data and acks each need a direct link
            if !joined(&hosts, &links, source, destination)
                || !joined(&hosts, &links, destination, source)
            {
                return Err(TopologyError::UnreachableDestination {
                    flow: spec.id.clone(),
                    from: spec.source.clone(),
                    to: spec.destination.clone(),
                });
            }

            let id = FlowId(flows.len());
            flow_ids.insert(&spec.id, id);
            flows.push(Flow::new(
                id,
                spec.id.clone(),
                source,
                destination,
                spec.total_bytes(),
                spec.start_ms,
                params,
            ));
        }

        Ok(Self {
            links,
            hosts,
            flows,
        })
    }

    pub fn link_mut(&mut self, id: LinkId) -> Result<&mut Link, SimError> {
        self.links
            .get_mut(id.index())
            .ok_or(SimError::UnknownLink(id))
    }

    pub fn host(&self, id: HostId) -> Result<&Host, SimError> {
        self.hosts.get(id.index()).ok_or(SimError::UnknownHost(id))
    }

    pub fn flow_mut(&mut self, id: FlowId) -> Result<&mut Flow, SimError> {
        self.flows
            .get_mut(id.index())
            .ok_or(SimError::UnknownFlow(id))
    }

    pub fn find_link(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.name == name)
    }

    pub fn find_host(&self, name: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.name == name)
    }

    pub fn find_flow(&self, name: &str) -> Option<&Flow> {
        self.flows.iter().find(|f| f.name == name)
    }
}

/// Whether `from`'s outgoing link ends at `to`.
fn joined(hosts: &[Host], links: &[Link], from: HostId, to: HostId) -> bool {
    hosts
        .iter()
        .find(|host| host.id == from)
        .and_then(|host| links.get(host.out_link.index()))
        .is_some_and(|link| link.to == to)
}

use anyhow::{Context, anyhow};
use netsim_abstract::{Assertion, SimConfig, Topology};
use tracing::info;

use crate::engine::Simulator;
use crate::trace::SimulationReport;

/// Defaults patched by the topology's `[config]` table. A `max_duration`
/// assertion doubles as the run cutoff when no explicit limit is set.
pub fn effective_config(topology: &Topology) -> SimConfig {
    let mut config = SimConfig::default();
    topology.config.apply_to(&mut config);
    if config.max_time_ms.is_none() {
        config.max_time_ms = topology.assertions.iter().find_map(|a| match a {
            Assertion::MaxDuration { ms } => Some(*ms),
            _ => None,
        });
    }
    config
}

pub fn run_topology(topology: &Topology, config: SimConfig) -> anyhow::Result<SimulationReport> {
    if !topology.name.is_empty() {
        info!("Running topology: {}", topology.name);
    }
    if !topology.description.is_empty() {
        info!("Description: {}", topology.description);
    }

    let mut sim =
        Simulator::from_topology(topology, config).context("Failed to build network")?;
    sim.run_until_complete().context("Simulation aborted")?;
    Ok(sim.export_report())
}

pub fn check_assertions(assertions: &[Assertion], report: &SimulationReport) -> anyhow::Result<()> {
    for assertion in assertions {
        match assertion {
            Assertion::FlowCompletes { flow, within_ms } => {
                let summary = report
                    .flow(flow)
                    .ok_or_else(|| anyhow!("Assertion refers to unknown flow {}", flow))?;
                let done_at = summary.completed_at_ms.ok_or_else(|| {
                    anyhow!("Assertion Failed: flow {} did not complete", flow)
                })?;
                if let Some(limit) = within_ms
                    && done_at > *limit
                {
                    return Err(anyhow!(
                        "Assertion Failed: flow {} completed at {}ms, expected within {}ms",
                        flow,
                        done_at,
                        limit
                    ));
                }
            }
            Assertion::MaxDropped { link, max } => {
                let dropped = match link {
                    Some(name) => {
                        report
                            .link(name)
                            .ok_or_else(|| anyhow!("Assertion refers to unknown link {}", name))?
                            .dropped
                    }
                    None => report.total_dropped(),
                };
                if dropped > *max {
                    return Err(anyhow!(
                        "Assertion Failed: {} packets dropped on {}, expected at most {}",
                        dropped,
                        link.as_deref().unwrap_or("all links"),
                        max
                    ));
                }
            }
            Assertion::MaxDuration { ms } => {
                let unfinished: Vec<&str> = report
                    .flows
                    .iter()
                    .filter(|f| f.completed_at_ms.is_none_or(|t| t > *ms))
                    .map(|f| f.name.as_str())
                    .collect();
                if !unfinished.is_empty() {
                    return Err(anyhow!(
                        "Assertion Failed: flows {:?} not finished within {}ms",
                        unfinished,
                        ms
                    ));
                }
            }
        }
    }

    info!("All {} assertions passed", assertions.len());
    Ok(())
}

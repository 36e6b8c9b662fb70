use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use netsim_abstract::SimConfig;
use netsim_loader::load_topology;
use netsim_simulator::SimulationReport;
use netsim_simulator::scenario_runner::{check_assertions, effective_config, run_topology};

#[derive(Parser, Debug)]
#[command(author, version, about = "Discrete-event FAST TCP network simulator")]
struct Args {
    /// Topology file (`.toml`, or the whitespace text format).
    #[arg(long)]
    topology: PathBuf,

    /// Write a JSON trace of the finished simulation.
    #[arg(long)]
    trace_out: Option<PathBuf>,

    /// Window update weight, overrides the topology file.
    #[arg(long)]
    gamma: Option<f64>,

    /// Packets each flow keeps queued, overrides the topology file.
    #[arg(long)]
    alpha: Option<f64>,

    /// Stop the run at this virtual time (ms).
    #[arg(long)]
    max_time: Option<f64>,
}

impl Args {
    fn apply_to(&self, config: &mut SimConfig) {
        if let Some(v) = self.gamma {
            config.gamma = v;
        }
        if let Some(v) = self.alpha {
            config.alpha = v;
        }
        if let Some(v) = self.max_time {
            config.max_time_ms = Some(v);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();
    info!("netsim starting…");

    let topology = load_topology(&args.topology)?;
    let mut config = effective_config(&topology);
    args.apply_to(&mut config);

    let report = run_topology(&topology, config)?;
    print_summary(&report);

    if let Some(trace_path) = &args.trace_out {
        write_trace(trace_path, &report)?;
    }

    check_assertions(&topology.assertions, &report)
}

fn print_summary(report: &SimulationReport) {
    info!(
        "Simulation finished at {:.3}ms after {} events",
        report.duration_ms, report.events_processed
    );
    for flow in &report.flows {
        match flow.completed_at_ms {
            Some(t) => info!(
                "flow {}: {} packets delivered at {:.3}ms ({} retransmissions)",
                flow.name, flow.total_packets, t, flow.retransmissions
            ),
            None => info!(
                "flow {}: unfinished in state {:?} after {} sends",
                flow.name, flow.state, flow.packets_sent
            ),
        }
    }
    for link in report.links.iter().filter(|l| l.dropped > 0) {
        info!("link {}: {} packets dropped", link.name, link.dropped);
    }
}

fn write_trace(path: &Path, report: &SimulationReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize simulation trace")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write trace file {}", path.display()))?;
    info!("Trace written to {}", path.display());
    Ok(())
}

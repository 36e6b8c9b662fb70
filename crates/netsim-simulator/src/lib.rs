pub mod context;
pub mod engine;
pub mod error;
pub mod flow;
pub mod host;
pub mod link;
pub mod metrics;
pub mod network;
pub mod scenario_runner;
pub mod scheduler;
pub mod trace;

pub use context::SimulationContext;
pub use engine::Simulator;
pub use error::{SchedulerEmpty, SimError, TopologyError};
pub use flow::{FastParams, Flow, FlowState};
pub use host::Host;
pub use link::{Admission, Link, TransitLog};
pub use metrics::{FlowSeries, LinkSeries, MetricsRecorder};
pub use network::Network;
pub use scheduler::{Event, EventScheduler};
pub use trace::SimulationReport;

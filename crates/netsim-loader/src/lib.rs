pub mod text;

use anyhow::{Context, Result};
use netsim_abstract::Topology;
use std::fs;
use std::path::Path;
use tracing::debug;

pub use text::{ParseError, parse_text};

/// On-disk topology formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopologyFormat {
    Toml,
    Text,
}

impl TopologyFormat {
    /// `.toml` files are TOML, anything else is read as the whitespace text format.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => TopologyFormat::Toml,
            _ => TopologyFormat::Text,
        }
    }
}

pub fn load_topology(path: &Path) -> Result<Topology> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read topology file {}", path.display()))?;
    let format = TopologyFormat::from_path(path);
    debug!("loading {} as {:?}", path.display(), format);
    parse_topology(&content, format)
        .with_context(|| format!("Failed to parse topology file {}", path.display()))
}

pub fn parse_topology(content: &str, format: TopologyFormat) -> Result<Topology> {
    let topology = match format {
        TopologyFormat::Toml => toml::from_str(content)?,
        TopologyFormat::Text => parse_text(content)?,
    };
    debug!(
        "parsed {} links and {} flows",
        topology.links.len(),
        topology.flows.len()
    );
    Ok(topology)
}

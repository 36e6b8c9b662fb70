//! Whitespace separated topology files.
//!
//! ```text
//! # links: id a b rate(MB/s) delay(ms) buffer(MB)
//! L1 H1 H2 12.5 10 0.064
//!
//! # flows: id source destination data(MB) start(s)
//! F1 H1 H2 20 1.0
//! ```
//!
//! The first section lists links, the section after the first blank line lists flows.

use netsim_abstract::{FlowSpec, LinkSpec, Topology};
use std::str::FromStr;
use thiserror::Error;

/// MB/s to bytes per millisecond.
const RATE_TO_BYTES_PER_MS: f64 = 1000.0;
const MB_TO_BYTES: f64 = 1_000_000.0;
const SEC_TO_MS: f64 = 1000.0;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid {field} `{value}`")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: unexpected section, only links and flows are supported")]
    ExtraSection { line: usize },
}

pub fn parse_text(input: &str) -> Result<Topology, ParseError> {
    let mut topology = Topology::default();
    // 0 = links, 1 = flows
    let mut section = 0;
    // A blank line only closes a section once it has entries
    let mut section_has_entries = false;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() {
            if section_has_entries {
                section += 1;
                section_has_entries = false;
            }
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match section {
            0 => topology.links.push(parse_link(line_no, &fields)?),
            1 => topology.flows.push(parse_flow(line_no, &fields)?),
            _ => return Err(ParseError::ExtraSection { line: line_no }),
        }
        section_has_entries = true;
    }

    Ok(topology)
}

fn parse_link(line: usize, fields: &[&str]) -> Result<LinkSpec, ParseError> {
    expect_fields(line, fields, 6)?;
    let rate: f64 = number(line, "rate", fields[3])?;
    let delay: f64 = number(line, "delay", fields[4])?;
    let buffer_mb: f64 = number(line, "buffer", fields[5])?;
    Ok(LinkSpec {
        id: fields[0].to_string(),
        a: fields[1].to_string(),
        b: fields[2].to_string(),
        bandwidth: rate * RATE_TO_BYTES_PER_MS,
        delay,
        buffer: (buffer_mb * MB_TO_BYTES).round() as u64,
    })
}

fn parse_flow(line: usize, fields: &[&str]) -> Result<FlowSpec, ParseError> {
    expect_fields(line, fields, 5)?;
    let data_mb: f64 = number(line, "data amount", fields[3])?;
    let start_s: f64 = number(line, "start time", fields[4])?;
    Ok(FlowSpec {
        id: fields[0].to_string(),
        source: fields[1].to_string(),
        destination: fields[2].to_string(),
        data_mb,
        start_ms: start_s * SEC_TO_MS,
    })
}

fn expect_fields(line: usize, fields: &[&str], expected: usize) -> Result<(), ParseError> {
    if fields.len() != expected {
        return Err(ParseError::FieldCount {
            line,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

fn number<T: FromStr>(line: usize, field: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# links
L0 H1 H2 12.5 10 0.064
L1 H3 H4 10 10 0.064

# flows
F1 H1 H2 20 1.0
";

    #[test]
    fn parses_links_and_flows_with_unit_conversion() {
        let topology = parse_text(SAMPLE).unwrap();
        assert_eq!(topology.links.len(), 2);
        let l0 = &topology.links[0];
        assert_eq!((l0.id.as_str(), l0.a.as_str(), l0.b.as_str()), ("L0", "H1", "H2"));
        assert_eq!(l0.bandwidth, 12_500.0);
        assert_eq!(l0.delay, 10.0);
        assert_eq!(l0.buffer, 64_000);

        assert_eq!(topology.flows.len(), 1);
        let f1 = &topology.flows[0];
        assert_eq!(f1.data_mb, 20.0);
        assert_eq!(f1.start_ms, 1000.0);
    }

    #[test]
    fn sample_topology_builds_a_network() {
        let topology = parse_text(SAMPLE).unwrap();
        let network = netsim_simulator::Network::from_topology(
            &topology,
            &netsim_abstract::SimConfig::default(),
        )
        .unwrap();
        assert_eq!(network.links.len(), 4);
        assert_eq!(network.hosts.len(), 4);
    }

    #[test]
    fn repeated_blank_lines_are_one_separator() {
        let input = "L0 H1 H2 1 1 1\n\n\n# flows\nF1 H1 H2 1 0\n";
        let topology = parse_text(input).unwrap();
        assert_eq!(topology.links.len(), 1);
        assert_eq!(topology.flows.len(), 1);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse_text("L0 H1 H2 1 1\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldCount {
                line: 1,
                expected: 6,
                found: 5
            }
        );

        let err = parse_text("L0 H1 H2 1 1 1\n\nF1 H1 H2 lots 0\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidNumber {
                line: 3,
                field: "data amount",
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn third_section_is_rejected() {
        let err = parse_text("L0 H1 H2 1 1 1\n\nF1 H1 H2 1 0\n\nX1 1 2\n").unwrap_err();
        assert_eq!(err, ParseError::ExtraSection { line: 5 });
    }
}

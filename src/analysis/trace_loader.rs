//! Flow-monitor trace loading.
//!
//! Reads the XML written by ns-3's `FlowMonitor::SerializeToXmlFile` and joins
//! its `FlowStats` rows with the 5-tuples of the `Ipv4FlowClassifier` section.
//! The document layout is flat and machine-generated, so elements are picked
//! out with regular expressions instead of a full XML parser.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::types::*;
use crate::utils::duration::parse_duration_to_ns;

/// Errors that abort the processing of a single trace file
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to read trace {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Trace has no <{0}> section")]
    MissingSection(&'static str),

    #[error("{context}: missing attribute '{attribute}'")]
    MissingAttribute {
        context: String,
        attribute: &'static str,
    },

    #[error("{context}: invalid timestamp '{value}' in '{attribute}'")]
    InvalidTimestamp {
        context: String,
        attribute: &'static str,
        value: String,
    },

    #[error("{context}: invalid value '{value}' in '{attribute}'")]
    InvalidNumber {
        context: String,
        attribute: &'static str,
        value: String,
    },

    #[error("flowId {flow_id} out of range (trace has {rows} flow statistics rows)")]
    FlowIndexOutOfRange { flow_id: u64, rows: usize },

    #[error("flow statistics row {row} has flowId {found}, expected {expected}")]
    FlowIdMismatch { row: usize, found: u64, expected: u64 },
}

/// Compiled regex patterns for flow-monitor XML
pub struct TracePatterns {
    /// Match: "<FlowStats> ... </FlowStats>"
    pub flow_stats: Regex,
    /// Match: "<Ipv4FlowClassifier> ... </Ipv4FlowClassifier>"
    pub classifier: Regex,
    /// Match: "<Flow attr=... >" or "<Flow attr=... />"
    pub flow_element: Regex,
    /// Match: name="value"
    pub attribute: Regex,
}

impl TracePatterns {
    pub fn new() -> Self {
        Self {
            flow_stats: Regex::new(r"(?s)<FlowStats\b[^>]*>(.*?)</FlowStats>")
                .expect("Invalid flow_stats regex"),
            classifier: Regex::new(r"(?s)<Ipv4FlowClassifier\b[^>]*>(.*?)</Ipv4FlowClassifier>")
                .expect("Invalid classifier regex"),
            flow_element: Regex::new(r"<Flow\s([^>]*)>").expect("Invalid flow_element regex"),
            attribute: Regex::new(r#"([A-Za-z_][\w.-]*)\s*=\s*"([^"]*)""#)
                .expect("Invalid attribute regex"),
        }
    }
}

impl Default for TracePatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global patterns instance
pub static PATTERNS: LazyLock<TracePatterns> = LazyLock::new(TracePatterns::new);

/// Timing and counter attributes of one `FlowStats` row
#[derive(Debug, Clone, PartialEq)]
struct FlowStatsRow {
    start_time: Nanos,
    stop_time: Nanos,
    lost_packets: u64,
    rx_packets: u64,
    rx_bytes: u64,
}

/// Load a trace file into a map of flow key to flow record
pub fn load_trace(path: &Path) -> Result<FlowTable, ParseError> {
    let xml = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_trace(&xml)
}

/// Parse the text of a flow-monitor document
pub fn parse_trace(xml: &str) -> Result<FlowTable, ParseError> {
    let stats_section = PATTERNS
        .flow_stats
        .captures(xml)
        .and_then(|caps| caps.get(1))
        .ok_or(ParseError::MissingSection("FlowStats"))?;
    let classifier_section = PATTERNS
        .classifier
        .captures(xml)
        .and_then(|caps| caps.get(1))
        .ok_or(ParseError::MissingSection("Ipv4FlowClassifier"))?;

    let rows = parse_stats_rows(stats_section.as_str())?;

    let mut flows = FlowTable::with_capacity(rows.len());
    for caps in PATTERNS.flow_element.captures_iter(classifier_section.as_str()) {
        let attrs = attributes(&caps[1]);
        let context = format!(
            "classifier flow {}",
            attrs.get("flowId").copied().unwrap_or("?")
        );

        let flow_id: u64 = number(&attrs, "flowId", &context)?;
        // flowId is the 1-based position of the matching statistics row
        let row = usize::try_from(flow_id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|index| rows.get(index))
            .ok_or(ParseError::FlowIndexOutOfRange {
                flow_id,
                rows: rows.len(),
            })?;

        let key = FlowKey {
            source_address: text(&attrs, "sourceAddress", &context)?.to_string(),
            destination_address: text(&attrs, "destinationAddress", &context)?.to_string(),
            source_port: number(&attrs, "sourcePort", &context)?,
            destination_port: number(&attrs, "destinationPort", &context)?,
            protocol: number(&attrs, "protocol", &context)?,
        };

        let record = FlowRecord::new(
            flow_id as u32,
            row.start_time,
            row.stop_time,
            row.lost_packets,
            row.rx_packets,
            row.rx_bytes,
        );

        if let Some(previous) = flows.insert(key.clone(), record) {
            log::warn!(
                "Duplicate 5-tuple {} (flowId {} replaced by {})",
                key,
                previous.flow_id,
                flow_id
            );
        }
    }

    log::debug!("Loaded {} flows from {} statistics rows", flows.len(), rows.len());
    Ok(flows)
}

/// Parse the statistics rows in document order
fn parse_stats_rows(section: &str) -> Result<Vec<FlowStatsRow>, ParseError> {
    let mut rows = Vec::new();

    for (index, caps) in PATTERNS.flow_element.captures_iter(section).enumerate() {
        let attrs = attributes(&caps[1]);
        let expected = index as u64 + 1;
        let context = format!("statistics row {}", index);

        if attrs.contains_key("flowId") {
            let found: u64 = number(&attrs, "flowId", &context)?;
            if found != expected {
                return Err(ParseError::FlowIdMismatch {
                    row: index,
                    found,
                    expected,
                });
            }
        }

        rows.push(FlowStatsRow {
            start_time: timestamp(&attrs, "timeFirstTxPacket", &context)?,
            stop_time: timestamp(&attrs, "timeLastRxPacket", &context)?,
            lost_packets: number(&attrs, "lostPackets", &context)?,
            rx_packets: number(&attrs, "rxPackets", &context)?,
            rx_bytes: number(&attrs, "rxBytes", &context)?,
        });
    }

    Ok(rows)
}

/// Collect name="value" pairs of one element
fn attributes(element: &str) -> HashMap<&str, &str> {
    PATTERNS
        .attribute
        .captures_iter(element)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let value = caps.get(2)?.as_str();
            Some((name, value))
        })
        .collect()
}

fn text<'a>(
    attrs: &HashMap<&'a str, &'a str>,
    attribute: &'static str,
    context: &str,
) -> Result<&'a str, ParseError> {
    attrs
        .get(attribute)
        .copied()
        .ok_or_else(|| ParseError::MissingAttribute {
            context: context.to_string(),
            attribute,
        })
}

fn number<T: FromStr>(
    attrs: &HashMap<&str, &str>,
    attribute: &'static str,
    context: &str,
) -> Result<T, ParseError> {
    let value = text(attrs, attribute, context)?;
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        context: context.to_string(),
        attribute,
        value: value.to_string(),
    })
}

fn timestamp(
    attrs: &HashMap<&str, &str>,
    attribute: &'static str,
    context: &str,
) -> Result<Nanos, ParseError> {
    let value = text(attrs, attribute, context)?;
    parse_duration_to_ns(value).map_err(|_| ParseError::InvalidTimestamp {
        context: context.to_string(),
        attribute,
        value: value.to_string(),
    })
}

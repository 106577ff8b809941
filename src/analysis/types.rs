//! Core data types for flow-trace analysis.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Simulation timestamp or duration in nanoseconds
pub type Nanos = f64;

/// Nanoseconds per second
pub const NANOS_PER_SEC: f64 = 1e9;

/// One direction of one connection, as listed by the flow classifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowKey {
    pub source_address: String,
    pub destination_address: String,
    pub source_port: u16,
    pub destination_port: u16,
    pub protocol: u8,
}

impl FlowKey {
    /// Key of the opposite direction of the same connection
    pub fn reversed(&self) -> FlowKey {
        FlowKey {
            source_address: self.destination_address.clone(),
            destination_address: self.source_address.clone(),
            source_port: self.destination_port,
            destination_port: self.source_port,
            protocol: self.protocol,
        }
    }
}

impl std::fmt::Display for FlowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} ({})",
            self.source_address,
            self.source_port,
            self.destination_address,
            self.destination_port,
            self.protocol
        )
    }
}

/// Logical direction of a flow within its connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Not yet seen by the classifier
    #[default]
    Unclassified,
    /// Counted flow: the higher-id half of a pair, or an unpaired flow
    Request,
    /// Lower-id half of a bidirectional pair
    Response,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Unclassified => write!(f, "unclassified"),
            Direction::Request => write!(f, "request"),
            Direction::Response => write!(f, "response"),
        }
    }
}

/// Per-flow statistics joined from the flow-monitor stats and classifier sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub flow_id: u32,
    pub start_time: Nanos,
    pub stop_time: Nanos,
    /// `stop_time - start_time`, never negative
    pub complete_time: Nanos,
    pub lost_packets: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub direction: Direction,
    pub fct_slowdown: f64,
}

impl FlowRecord {
    pub fn new(
        flow_id: u32,
        start_time: Nanos,
        stop_time: Nanos,
        lost_packets: u64,
        rx_packets: u64,
        rx_bytes: u64,
    ) -> Self {
        // Flows that never delivered a packet report a zero last-rx time
        let complete_time = (stop_time - start_time).max(0.0);
        Self {
            flow_id,
            start_time,
            stop_time,
            complete_time,
            lost_packets,
            rx_packets,
            rx_bytes,
            direction: Direction::Unclassified,
            fct_slowdown: 0.0,
        }
    }
}

/// All flows of one trace file
pub type FlowTable = HashMap<FlowKey, FlowRecord>;

/// Identity of a query burst: flows sent to the same host at the same instant
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub destination_address: String,
    /// Bit pattern of the start time; orders like the value for non-negative times
    start_time_bits: u64,
}

impl QueryKey {
    pub fn new(destination_address: impl Into<String>, start_time: Nanos) -> Self {
        // -0.0 and 0.0 are the same instant
        let start_time = if start_time == 0.0 { 0.0 } else { start_time };
        Self {
            destination_address: destination_address.into(),
            start_time_bits: start_time.to_bits(),
        }
    }

    pub fn start_time(&self) -> Nanos {
        f64::from_bits(self.start_time_bits)
    }
}

/// Aggregate of all request flows belonging to one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryBurst {
    pub total_bytes: u64,
    pub max_complete_time: Nanos,
    pub member_count: usize,
}

/// Lost and received packet totals of a traffic class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketCounters {
    pub lost: u64,
    pub received: u64,
}

impl PacketCounters {
    pub fn add(&mut self, flow: &FlowRecord) {
        self.lost += flow.lost_packets;
        self.received += flow.rx_packets;
    }
}

/// Outcome of direction classification over one trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub total_flows: usize,
    /// Number of bidirectional connections (each contributes two flows)
    pub paired_connections: usize,
    pub unpaired_flows: usize,
}

/// Diagnostic counts for one processed trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub trace: String,
    pub flows: usize,
    pub paired_connections: usize,
    pub unpaired_flows: usize,
    pub burst_flows: usize,
    pub queries: usize,
    pub web_flows: usize,
}

//! Query (burst) aggregation.
//!
//! Request flows are split by destination port: ports at or above the
//! configured threshold belong to query bursts, where many servers answer one
//! host at the same instant; the rest is background web traffic. A query
//! finishes when its slowest member flow does.

use std::collections::BTreeMap;

use super::classifier::ideal_completion_secs;
use super::types::*;
use crate::config::AnalysisConfig;

impl QueryBurst {
    /// Start a burst from its first member flow
    pub fn new(flow: &FlowRecord) -> Self {
        Self {
            total_bytes: flow.rx_bytes,
            max_complete_time: flow.complete_time,
            member_count: 1,
        }
    }

    /// Fold another member flow into the burst
    pub fn absorb(&mut self, flow: &FlowRecord) {
        self.total_bytes += flow.rx_bytes;
        self.max_complete_time = self.max_complete_time.max(flow.complete_time);
        self.member_count += 1;
    }

    /// Query completion time over the theoretical minimum
    ///
    /// The base-RTT term is doubled relative to the per-flow formula to
    /// account for the fan-out request round trip preceding the responses.
    pub fn slowdown(&self, config: &AnalysisConfig) -> f64 {
        self.max_complete_time
            / NANOS_PER_SEC
            / ideal_completion_secs(self.total_bytes, 2.0 * 2.0, config)
    }
}

/// Request traffic of one trace, split into query bursts and web flows
#[derive(Debug, Clone, Default)]
pub struct TrafficAggregation {
    pub bursts: BTreeMap<QueryKey, QueryBurst>,
    /// Request flows folded into bursts
    pub burst_flows: usize,
    pub query_packets: PacketCounters,
    pub web_fct: Vec<Nanos>,
    pub web_slowdown: Vec<f64>,
    pub web_packets: PacketCounters,
}

impl TrafficAggregation {
    /// Completion time of every query
    pub fn query_completion_times(&self) -> Vec<Nanos> {
        self.bursts.values().map(|b| b.max_complete_time).collect()
    }

    /// Slowdown of every query
    pub fn query_slowdowns(&self, config: &AnalysisConfig) -> Vec<f64> {
        self.bursts.values().map(|b| b.slowdown(config)).collect()
    }

    pub fn web_flows(&self) -> usize {
        self.web_fct.len()
    }
}

/// Fold one burst flow into the burst map keyed by (destination, start time)
pub fn fold_burst(
    bursts: &mut BTreeMap<QueryKey, QueryBurst>,
    destination_address: &str,
    flow: &FlowRecord,
) {
    let key = QueryKey::new(destination_address, flow.start_time);
    bursts
        .entry(key)
        .and_modify(|burst| burst.absorb(flow))
        .or_insert_with(|| QueryBurst::new(flow));
}

/// Split classified request flows into query bursts and web samples
pub fn aggregate_traffic<'a>(
    flows: impl IntoIterator<Item = (&'a FlowKey, &'a FlowRecord)>,
    config: &AnalysisConfig,
) -> TrafficAggregation {
    let mut aggregation = TrafficAggregation::default();

    for (key, flow) in flows {
        if flow.direction != Direction::Request {
            continue;
        }

        if key.destination_port >= config.query_port_threshold {
            fold_burst(&mut aggregation.bursts, &key.destination_address, flow);
            aggregation.burst_flows += 1;
            aggregation.query_packets.add(flow);
        } else {
            aggregation.web_fct.push(flow.complete_time);
            aggregation.web_slowdown.push(flow.fct_slowdown);
            aggregation.web_packets.add(flow);
        }
    }

    log::debug!(
        "Aggregated {} burst flows into {} queries, {} web flows",
        aggregation.burst_flows,
        aggregation.bursts.len(),
        aggregation.web_flows()
    );
    aggregation
}

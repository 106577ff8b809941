//! Flow direction classification and per-flow slowdown.
//!
//! A TCP connection shows up in the trace as two flows with mirrored
//! 5-tuples. The one with the lower flowId is the response half; the other is
//! the request half, which carries the connection's metrics. Flows without a
//! mirror are one-directional (UDP) and count as requests.

use super::types::*;
use crate::config::AnalysisConfig;

/// Theoretical minimum completion time in seconds for `bytes` over an idle path
pub fn ideal_completion_secs(bytes: u64, rtt_terms: f64, config: &AnalysisConfig) -> f64 {
    rtt_terms * config.base_rtt_secs() + bytes as f64 * 8.0 / config.link_rate_bps()
}

/// Observed completion time over the theoretical minimum of one flow
///
/// `(complete_time / 1e9) / (2 * base_rtt + bytes * 8 / link_rate)`
pub fn flow_slowdown(complete_time: Nanos, rx_bytes: u64, config: &AnalysisConfig) -> f64 {
    complete_time / NANOS_PER_SEC / ideal_completion_secs(rx_bytes, 2.0, config)
}

/// Role of a flow given its own id and the id of its mirrored flow, if any
pub fn direction_for(flow_id: u32, reverse_flow_id: Option<u32>) -> Direction {
    match reverse_flow_id {
        Some(peer) if flow_id < peer => Direction::Response,
        _ => Direction::Request,
    }
}

/// Assign a direction and slowdown to every flow of a trace
pub fn classify_flows(flows: &mut FlowTable, config: &AnalysisConfig) -> ClassificationSummary {
    let assignments: Vec<(FlowKey, Direction, bool)> = flows
        .iter()
        .map(|(key, flow)| {
            let reversed = key.reversed();
            // A flow whose tuple mirrors onto itself has no partner
            let peer = if reversed == *key {
                None
            } else {
                flows.get(&reversed).map(|peer| peer.flow_id)
            };
            (key.clone(), direction_for(flow.flow_id, peer), peer.is_some())
        })
        .collect();

    let mut summary = ClassificationSummary {
        total_flows: flows.len(),
        ..Default::default()
    };
    let mut paired_flows = 0;

    for (key, direction, paired) in assignments {
        if let Some(flow) = flows.get_mut(&key) {
            flow.direction = direction;
            flow.fct_slowdown = flow_slowdown(flow.complete_time, flow.rx_bytes, config);
        }
        if paired {
            paired_flows += 1;
        } else {
            summary.unpaired_flows += 1;
        }
    }
    summary.paired_connections = paired_flows / 2;

    log::debug!(
        "Classified {} flows: {} bidirectional connections, {} unpaired",
        summary.total_flows,
        summary.paired_connections,
        summary.unpaired_flows
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(src: &str, dst: &str, sport: u16, dport: u16) -> FlowKey {
        FlowKey {
            source_address: src.to_string(),
            destination_address: dst.to_string(),
            source_port: sport,
            destination_port: dport,
            protocol: 6,
        }
    }

    #[test]
    fn test_lower_flow_id_is_response() {
        let config = AnalysisConfig::default();
        let forward = key("10.0.0.1", "10.0.1.1", 49153, 20010);
        let mut flows = FlowTable::new();
        flows.insert(forward.clone(), FlowRecord::new(3, 0.0, 1000.0, 0, 1, 100));
        flows.insert(forward.reversed(), FlowRecord::new(7, 0.0, 900.0, 0, 1, 50));

        let summary = classify_flows(&mut flows, &config);
        assert_eq!(flows[&forward].direction, Direction::Response);
        assert_eq!(flows[&forward.reversed()].direction, Direction::Request);
        assert_eq!(summary.total_flows, 2);
        assert_eq!(summary.paired_connections, 1);
        assert_eq!(summary.unpaired_flows, 0);
    }

    #[test]
    fn test_pairs_get_exactly_one_response() {
        let config = AnalysisConfig::default();
        let mut flows = FlowTable::new();
        let mut next_id = 1;
        for i in 0..20u16 {
            let forward = key("10.0.0.1", "10.0.2.1", 40000 + i, 20010 + i);
            // Alternate which half appears first so both orders are covered
            let (a, b) = if i % 2 == 0 {
                (forward.clone(), forward.reversed())
            } else {
                (forward.reversed(), forward.clone())
            };
            flows.insert(a, FlowRecord::new(next_id, 0.0, 10.0, 0, 1, 10));
            flows.insert(b, FlowRecord::new(next_id + 1, 0.0, 10.0, 0, 1, 10));
            next_id += 2;
        }

        classify_flows(&mut flows, &config);
        for (k, flow) in &flows {
            let peer = &flows[&k.reversed()];
            assert_ne!(flow.direction, peer.direction);
            let expected = if flow.flow_id < peer.flow_id {
                Direction::Response
            } else {
                Direction::Request
            };
            assert_eq!(flow.direction, expected);
        }
    }

    #[test]
    fn test_unpaired_flow_is_request() {
        let config = AnalysisConfig::default();
        let mut flows = FlowTable::new();
        let udp = FlowKey {
            protocol: 17,
            ..key("10.0.0.1", "10.0.0.2", 5000, 6000)
        };
        flows.insert(udp.clone(), FlowRecord::new(1, 0.0, 10.0, 0, 1, 10));
        // A mirror with a different protocol is not a partner
        let tcp_mirror = key("10.0.0.2", "10.0.0.1", 6000, 5000);
        flows.insert(tcp_mirror.clone(), FlowRecord::new(2, 0.0, 10.0, 0, 1, 10));

        let summary = classify_flows(&mut flows, &config);
        assert_eq!(flows[&udp].direction, Direction::Request);
        assert_eq!(flows[&tcp_mirror].direction, Direction::Request);
        assert_eq!(summary.paired_connections, 0);
        assert_eq!(summary.unpaired_flows, 2);
    }

    #[test]
    fn test_self_mirrored_tuple_is_unpaired() {
        let config = AnalysisConfig::default();
        let mut flows = FlowTable::new();
        let looped = key("10.0.0.1", "10.0.0.1", 7000, 7000);
        flows.insert(looped.clone(), FlowRecord::new(1, 0.0, 10.0, 0, 1, 10));
        let summary = classify_flows(&mut flows, &config);
        assert_eq!(flows[&looped].direction, Direction::Request);
        assert_eq!(summary.unpaired_flows, 1);
    }

    #[test]
    fn test_flow_slowdown_reference_values() {
        let config = AnalysisConfig::default();
        // Ideal time for an empty flow is 2 * 80us = 160us
        let slowdown = flow_slowdown(160_000.0, 0, &config);
        assert!((slowdown - 1.0).abs() < 1e-9);

        // 100 KB at 100 Gbps adds 8us of serialization
        let ideal = 160e-6 + 100_000.0 * 8.0 / 1e11;
        let slowdown = flow_slowdown(1e6, 100_000, &config);
        assert!((slowdown - 1e-3 / ideal).abs() < 1e-9);
    }

    #[test]
    fn test_classify_sets_slowdown() {
        let config = AnalysisConfig::default();
        let mut flows = FlowTable::new();
        let k = key("10.0.0.1", "10.0.0.2", 1, 2);
        flows.insert(k.clone(), FlowRecord::new(1, 0.0, 320_000.0, 0, 1, 0));
        classify_flows(&mut flows, &config);
        assert!((flows[&k].fct_slowdown - 2.0).abs() < 1e-9);
    }
}

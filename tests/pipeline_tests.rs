#[cfg(test)]
mod pipeline_tests {
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use occamy_analyzer::analysis::{
        analyze_traces, build_trend_charts, build_utilization_report, collect_trace_files,
        normalize_against_baseline, ConfigKey, MetricsTable, XAxis,
    };
    use occamy_analyzer::config::AnalysisConfig;

    const START_NS: f64 = 1e9;

    /// One query (a mirrored TCP pair answering on port 20010) plus one web flow
    fn trace_xml(query_ns: f64, web_ns: f64) -> String {
        format!(
            r#"<?xml version="1.0" ?>
<FlowMonitor>
  <FlowStats>
    <Flow flowId="1" timeFirstTxPacket="+{start}ns" timeLastRxPacket="+{start}ns" txBytes="60" rxBytes="52" lostPackets="0" rxPackets="1">
    </Flow>
    <Flow flowId="2" timeFirstTxPacket="+{start}ns" timeLastRxPacket="+{query_stop}ns" txBytes="21000" rxBytes="20000" lostPackets="1" rxPackets="19">
    </Flow>
    <Flow flowId="3" timeFirstTxPacket="+{start}ns" timeLastRxPacket="+{web_stop}ns" txBytes="10500" rxBytes="10000" lostPackets="0" rxPackets="10">
    </Flow>
  </FlowStats>
  <Ipv4FlowClassifier>
    <Flow flowId="1" sourceAddress="10.1.1.2" destinationAddress="10.1.2.2" protocol="6" sourcePort="20010" destinationPort="49153" />
    <Flow flowId="2" sourceAddress="10.1.2.2" destinationAddress="10.1.1.2" protocol="6" sourcePort="49153" destinationPort="20010" />
    <Flow flowId="3" sourceAddress="10.1.3.2" destinationAddress="10.1.4.2" protocol="17" sourcePort="49154" destinationPort="80" />
  </Ipv4FlowClassifier>
</FlowMonitor>
"#,
            start = START_NS,
            query_stop = START_NS + query_ns,
            web_stop = START_NS + web_ns,
        )
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn key(text: &str) -> ConfigKey {
        text.parse().unwrap()
    }

    fn experiment_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, query_ns, web_ns) in [
            ("DT-1.0~DCTCP-0.2-0.0-200.0-4194304-2", 800_000.0, 400_000.0),
            ("DT-1.0~DCTCP-0.9-0.0-200.0-4194304-2", 1_600_000.0, 900_000.0),
            ("ABM-2.0~DCTCP-0.2-0.0-200.0-4194304-2", 400_000.0, 300_000.0),
            ("ABM-2.0~DCTCP-0.9-0.0-200.0-4194304-2", 1_200_000.0, 450_000.0),
        ] {
            write_file(dir.path(), &format!("{}.xml", name), &trace_xml(query_ns, web_ns));
        }
        write_file(
            dir.path(),
            "PUSHOUT-1.0~DCTCP-0.2-0.0-200.0-4194304-2.xml",
            "<FlowMonitor><FlowStats></FlowStats></FlowMonitor>",
        );
        dir
    }

    #[test]
    fn test_batch_metrics_file_round_trip() {
        let dir = experiment_dir();
        let config = AnalysisConfig::default();

        let traces = collect_trace_files(dir.path()).unwrap();
        assert_eq!(traces.len(), 5);

        let outcome = analyze_traces(&traces, &config);
        assert_eq!(outcome.table.len(), 4);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].path.contains("PUSHOUT-1.0"));

        let record = outcome
            .table
            .get(&key("DT-1.0~DCTCP-0.2-0.0-200.0-4194304-2"))
            .unwrap();
        assert_eq!(record.query_qct_ave, 800_000.0);
        assert_eq!(record.query_qct_99th, 800_000.0);
        assert_eq!(record.web_fct_ave, 400_000.0);
        assert_eq!(record.query_pkt_loss_rate, 1.0 / 19.0);
        assert_eq!(record.web_pkt_loss_rate, 0.0);
        assert!(record.query_qct_ave_slowdown > 1.0);

        let metrics_path = dir.path().join("data").join("metrics.txt");
        fs::create_dir_all(metrics_path.parent().unwrap()).unwrap();
        outcome.table.write_to(&metrics_path).unwrap();
        let reread = MetricsTable::read_from(&metrics_path).unwrap();
        assert_eq!(reread, outcome.table);

        let contents = fs::read_to_string(&metrics_path).unwrap();
        let first = contents.lines().next().unwrap();
        assert!(first.starts_with("ABM-2.0~DCTCP-0.2-0.0-200.0-4194304-2 "));
        assert_eq!(first.split(' ').count(), 30);
    }

    #[test]
    fn test_normalized_trend_charts() {
        let dir = experiment_dir();
        let config = AnalysisConfig::default();
        let traces = collect_trace_files(dir.path()).unwrap();
        let mut table = analyze_traces(&traces, &config).table;

        let summary = normalize_against_baseline(&mut table, "DT-1.0");
        assert_eq!(summary.normalized_records, 2);
        assert_eq!(summary.baseline_records, 2);

        let abm = table.get(&key("ABM-2.0~DCTCP-0.2-0.0-200.0-4194304-2")).unwrap();
        assert_eq!(abm.query_qct_ave, 0.5);
        assert_eq!(abm.web_fct_ave, 0.25);
        // same bytes on both sides, so slowdowns improve by the same ratio
        assert!((abm.query_qct_ave_slowdown - 0.5).abs() < 1e-12);
        assert!((abm.web_fct_99th_slowdown - 0.25).abs() < 1e-12);

        let dt = table.get(&key("DT-1.0~DCTCP-0.9-0.0-200.0-4194304-2")).unwrap();
        assert!(dt.values().iter().all(|v| *v == 0.0));

        let charts = build_trend_charts(&table, &config, XAxis::AllreduceSize);
        assert_eq!(charts.len(), 2);
        let chart = &charts[1];
        assert_eq!(chart.name, "web_fct_99th_slowdown-DCTCP-XX-0.0-200.0-4194304-2");
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].method, "DT-1.0");
        assert_eq!(chart.series[1].method, "ABM-2.0");

        let labels: Vec<&str> = chart.series[1]
            .points
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, vec!["32KB", "2.25MB"]);
        assert!((chart.series[1].points[1].value - 0.5).abs() < 1e-12);

        let json = serde_json::to_string(&charts).unwrap();
        assert!(json.contains("\"Allreduce 99th FCT Slowdown\""));
    }

    #[test]
    fn test_utilization_cdfs_per_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::default();
        let alpha_half = "DT-0.5~DCTCP-0.2-0.0-200.0-4194304-2";
        let alpha_one = "DT-1.0~DCTCP-0.2-0.0-200.0-4194304-2";

        let mut logs = vec![
            write_file(
                dir.path(),
                &format!("{}-q-sw-0.txt", alpha_half),
                "0.001 0 0.25 0 0 0 2e11 0 0 0\n0.002 1 0 0.5 0 0 0 4e11 0 0\nshort line\n",
            ),
            write_file(
                dir.path(),
                &format!("{}-q-sw-1.txt", alpha_half),
                "0.001 3 0 0 0 0.75 0 0 0 6e11\n",
            ),
            write_file(
                dir.path(),
                &format!("{}-q-sw-0.txt", alpha_one),
                "0.001 0 1.0 0 0 0 8e11 0 0 0\n",
            ),
        ];
        logs.push(dir.path().join(format!("{}-q-sw-2.txt", alpha_one)));

        let report = build_utilization_report(&logs, &config);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.distributions.len(), 2);

        let half = report
            .distributions
            .iter()
            .find(|d| d.key == alpha_half)
            .unwrap();
        assert_eq!(half.switches, vec![0, 1]);
        assert_eq!(half.samples, 3);
        let buffer: Vec<f64> = half.buffer_cdf.iter().map(|p| p.value).collect();
        assert_eq!(buffer, vec![25.0, 50.0, 75.0]);
        let bandwidth: Vec<f64> = half.bandwidth_cdf.iter().map(|p| p.value).collect();
        assert_eq!(bandwidth, vec![25.0, 50.0, 75.0]);
        assert_eq!(half.buffer_cdf[0].fraction, 1.0 / 3.0);
        assert_eq!(half.buffer_cdf[2].fraction, 1.0);
    }
}

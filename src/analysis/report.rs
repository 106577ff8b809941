//! Report generation for flow-trace analysis.
//!
//! Generates both JSON and human-readable text reports.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use super::metrics::MetricsRecord;
use super::pipeline::TraceFailure;
use super::table::MetricsTable;
use super::types::TraceSummary;
use crate::config::AnalysisConfig;

/// Metadata about the analysis run
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub analysis_timestamp: String,
    pub tool_version: String,
    pub baseline_method: String,
    pub configurations: usize,
    pub methods: Vec<String>,
    pub traces_failed: usize,
}

/// Everything written to the JSON and text reports
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    /// Metrics keyed by config key
    pub records: BTreeMap<String, MetricsRecord>,
    pub traces: Vec<TraceSummary>,
    pub failures: Vec<TraceFailure>,
}

impl AnalysisReport {
    pub fn new(
        table: &MetricsTable,
        traces: Vec<TraceSummary>,
        failures: Vec<TraceFailure>,
        config: &AnalysisConfig,
    ) -> Self {
        let metadata = ReportMetadata {
            analysis_timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            baseline_method: config.baseline_method.clone(),
            configurations: table.len(),
            methods: table.methods().into_iter().collect(),
            traces_failed: failures.len(),
        };
        let records = table
            .iter()
            .map(|(key, record)| (key.to_string(), *record))
            .collect();

        Self {
            metadata,
            records,
            traces,
            failures,
        }
    }
}

/// Generate JSON report
pub fn generate_json_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

fn micros(nanos: f64) -> f64 {
    nanos / 1e3
}

/// Generate human-readable text report
pub fn generate_text_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let mut lines: Vec<String> = Vec::new();

    // Header
    lines.push("=".repeat(80));
    lines.push("                      OCCAMY FLOW-TRACE ANALYSIS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    // Metadata
    lines.push(format!("Analysis Date: {}", report.metadata.analysis_timestamp));
    lines.push(format!("Baseline Method: {}", report.metadata.baseline_method));
    lines.push(format!("Configurations: {}", report.metadata.configurations));
    lines.push(format!("Methods: {}", report.metadata.methods.join(", ")));
    lines.push(String::new());

    for (key, record) in &report.records {
        lines.push("-".repeat(80));
        lines.push(key.clone());
        lines.push("-".repeat(80));
        lines.push(format!(
            "  Query QCT:       avg {:>12.2}us   p99 {:>12.2}us",
            micros(record.query_qct_ave),
            micros(record.query_qct_99th)
        ));
        lines.push(format!(
            "  Query slowdown:  avg {:>12.3}     p99 {:>12.3}",
            record.query_qct_ave_slowdown, record.query_qct_99th_slowdown
        ));
        lines.push(format!(
            "  Web FCT:         avg {:>12.2}us   p99 {:>12.2}us",
            micros(record.web_fct_ave),
            micros(record.web_fct_99th)
        ));
        lines.push(format!(
            "  Web slowdown:    avg {:>12.3}     p99 {:>12.3}",
            record.web_fct_ave_slowdown, record.web_fct_99th_slowdown
        ));
        lines.push(format!(
            "  Packet loss:     query {:.4}%   web {:.4}%",
            record.query_pkt_loss_rate * 100.0,
            record.web_pkt_loss_rate * 100.0
        ));
        lines.push(String::new());
    }

    if !report.traces.is_empty() {
        lines.push("=".repeat(80));
        lines.push("                              TRACE DIAGNOSTICS".to_string());
        lines.push("=".repeat(80));
        lines.push(String::new());
        lines.push(format!(
            "{:<48} {:>7} {:>7} {:>7} {:>7}",
            "Trace", "Flows", "Pairs", "Queries", "Web"
        ));
        for trace in &report.traces {
            lines.push(format!(
                "{:<48} {:>7} {:>7} {:>7} {:>7}",
                trace.trace, trace.flows, trace.paired_connections, trace.queries, trace.web_flows
            ));
        }
        lines.push(String::new());
    }

    if !report.failures.is_empty() {
        lines.push(format!("Failed traces ({}):", report.failures.len()));
        for failure in &report.failures {
            lines.push(format!("  {}: {}", failure.path, failure.error));
        }
        lines.push(String::new());
    }

    // Footer
    lines.push("=".repeat(80));

    let content = lines.join("\n");
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

/// Print a summary to stdout
pub fn print_summary(report: &AnalysisReport) {
    println!("\n=== OCCAMY FLOW-TRACE ANALYSIS SUMMARY ===\n");
    println!("Configurations: {}", report.metadata.configurations);
    println!("Methods: {}", report.metadata.methods.join(", "));
    if report.metadata.traces_failed > 0 {
        println!("Failed traces: {}", report.metadata.traces_failed);
    }

    if !report.traces.is_empty() {
        let flows: usize = report.traces.iter().map(|t| t.flows).sum();
        let queries: usize = report.traces.iter().map(|t| t.queries).sum();
        println!("\nTraces: {}", report.traces.len());
        println!("  Flows: {}", flows);
        println!("  Queries: {}", queries);
    }

    let worst = report.records.iter().max_by(|a, b| {
        a.1.web_fct_99th_slowdown
            .total_cmp(&b.1.web_fct_99th_slowdown)
    });
    if let Some((key, record)) = worst {
        println!("\nHighest web 99th FCT slowdown:");
        println!("  {} ({:.3})", key, record.web_fct_99th_slowdown);
    }

    println!();
}

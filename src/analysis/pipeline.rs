//! Per-trace pipeline and parallel batch processing.
//!
//! Each trace goes through load → classify → aggregate → summarize
//! independently on the rayon pool. Results are inserted into the metrics
//! table on the calling thread once the parallel pass is over.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use super::classifier::classify_flows;
use super::config_key::ConfigKey;
use super::metrics::{summarize, MetricsRecord};
use super::query::aggregate_traffic;
use super::table::MetricsTable;
use super::trace_loader::load_trace;
use super::types::TraceSummary;
use crate::config::AnalysisConfig;

/// Trace files (`*.xml`) directly inside `dir`, sorted by name
pub fn collect_trace_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read trace directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "xml") {
            files.push(path);
        }
    }
    files.sort();

    log::info!("Found {} trace files in {}", files.len(), dir.display());
    Ok(files)
}

/// Config key of a trace, taken from its file stem
pub fn trace_key(path: &Path) -> Result<ConfigKey> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| eyre!("Trace path {} has no file name", path.display()))?;
    stem.parse::<ConfigKey>()
        .with_context(|| format!("Trace {} is not named after a config key", path.display()))
}

/// Everything one trace contributes to the batch
#[derive(Debug, Clone)]
pub struct TraceAnalysis {
    pub key: ConfigKey,
    pub metrics: MetricsRecord,
    pub summary: TraceSummary,
}

/// Run the full per-file pipeline on one trace
pub fn process_trace_file(path: &Path, config: &AnalysisConfig) -> Result<TraceAnalysis> {
    let key = trace_key(path)?;
    let mut flows = load_trace(path)
        .with_context(|| format!("Failed to load trace {}", path.display()))?;

    let classification = classify_flows(&mut flows, config);
    let aggregation = aggregate_traffic(flows.iter(), config);
    let metrics = summarize(&aggregation, config);

    let summary = TraceSummary {
        trace: key.to_string(),
        flows: classification.total_flows,
        paired_connections: classification.paired_connections,
        unpaired_flows: classification.unpaired_flows,
        burst_flows: aggregation.burst_flows,
        queries: aggregation.bursts.len(),
        web_flows: aggregation.web_flows(),
    };

    log::debug!(
        "Processed {}: {} flows, {} queries, {} web flows",
        key,
        summary.flows,
        summary.queries,
        summary.web_flows
    );
    Ok(TraceAnalysis {
        key,
        metrics,
        summary,
    })
}

/// A trace that could not be processed
#[derive(Debug, Clone, Serialize)]
pub struct TraceFailure {
    pub path: String,
    pub error: String,
}

/// Result of a batch: the table plus per-trace diagnostics
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub table: MetricsTable,
    pub summaries: Vec<TraceSummary>,
    pub failures: Vec<TraceFailure>,
}

/// Process traces in parallel and collect their metrics
///
/// A trace that fails to parse is logged and recorded in `failures`; it never
/// aborts the batch.
pub fn analyze_traces(paths: &[PathBuf], config: &AnalysisConfig) -> BatchOutcome {
    log::info!("Analyzing {} traces in parallel...", paths.len());

    let results: Vec<(&PathBuf, Result<TraceAnalysis>)> = paths
        .par_iter()
        .map(|path| (path, process_trace_file(path, config)))
        .collect();

    let mut outcome = BatchOutcome::default();
    for (path, result) in results {
        let inserted = result.and_then(|analysis| {
            outcome.table.insert(analysis.key, analysis.metrics)?;
            Ok(analysis.summary)
        });
        match inserted {
            Ok(summary) => outcome.summaries.push(summary),
            Err(e) => {
                log::warn!("Skipping {}: {:#}", path.display(), e);
                outcome.failures.push(TraceFailure {
                    path: path.display().to_string(),
                    error: format!("{:#}", e),
                });
            }
        }
    }

    log::info!(
        "Analyzed {} traces ({} failed)",
        outcome.table.len(),
        outcome.failures.len()
    );
    outcome
}

//! Flow-trace analysis for Occamy buffer-management experiments.
//!
//! This module turns ns-3 flow-monitor traces into per-configuration query
//! and web metrics, normalizes methods against a baseline, and builds the
//! chart data (trend series and utilization CDFs) derived from them.

pub mod types;
pub mod trace_loader;
pub mod classifier;
pub mod query;
pub mod stats;
pub mod metrics;
pub mod config_key;
pub mod table;
pub mod normalize;
pub mod distribution;
pub mod utilization;
pub mod trend;
pub mod pipeline;
pub mod report;

pub use types::*;
pub use trace_loader::{load_trace, parse_trace, ParseError};
pub use classifier::classify_flows;
pub use query::aggregate_traffic;
pub use metrics::{summarize, MetricsRecord};
pub use config_key::{ConfigKey, ConfigKeyError, Scenario};
pub use table::{MetricsTable, TableError};
pub use normalize::normalize_against_baseline;
pub use distribution::{empirical_cdf, CdfPoint};
pub use utilization::{build_utilization_report, parse_utilization_log, UtilizationError};
pub use trend::{build_trend_charts, XAxis};
pub use pipeline::{analyze_traces, collect_trace_files, process_trace_file};
pub use report::{generate_json_report, generate_text_report};

//! # occamy-analyzer - Flow-trace analysis for Occamy buffer-management experiments
//!
//! This library turns the output of ns-3 datacenter experiments into the
//! numbers and chart data used to compare switch buffer-management methods.
//!
//! ## Overview
//!
//! Every experiment is identified by a configuration key
//! (`method~protocol-load-sizeRate-flowRate-bufferSize-queueCount`) and leaves
//! behind a flow-monitor XML trace and, optionally, per-switch utilization
//! logs. The analyzer reduces each trace to a fixed 29-field metrics record,
//! collects the records of a whole batch into a metrics table, and derives
//! normalized comparisons against a baseline method.
//!
//! ## Key Features
//!
//! - **Query completion time**: request flows sent to the same host at the same
//!   instant are merged into one query, finishing with its slowest member
//! - **Slowdown**: completion time over the ideal time on an idle 100 Gbps path
//! - **Baseline normalization**: relative improvement of every method over DT-1.0
//! - **Parallel batches**: traces and utilization logs are processed on rayon
//! - **Chart data**: trend series across load levels and utilization CDFs as JSON
//!
//! ## Architecture
//!
//! - `config`: analysis parameters and their defaults
//! - `config_loader`: YAML configuration loading and validation
//! - `analysis`: trace loading, classification, aggregation, metrics and reports
//! - `utils`: duration parsing for ns-3 timestamps
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use occamy_analyzer::analysis::{analyze_traces, collect_trace_files, normalize_against_baseline};
//! use occamy_analyzer::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::default();
//! let traces = collect_trace_files(Path::new("traces"))?;
//! let mut outcome = analyze_traces(&traces, &config);
//! outcome.table.write_to(Path::new("data/metrics.txt"))?;
//!
//! normalize_against_baseline(&mut outcome.table, &config.baseline_method);
//! outcome.table.write_to(Path::new("data/metrics-normalized.txt"))?;
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```
//!
//! ## Error Handling
//!
//! Parsing stages return typed errors (`ParseError`, `ConfigKeyError`,
//! `TableError`, `UtilizationError`); orchestration code returns
//! `color_eyre::eyre::Result` with context attached. A trace that fails to
//! parse is logged and skipped, never aborting the batch.

pub mod config;
pub mod config_loader;
pub mod utils;
pub mod analysis;

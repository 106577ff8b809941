//! Switch utilization logs and their CDF report.
//!
//! Each switch writes one log per experiment, named
//! `{config key}-q-sw-{switch}.txt`. Every line is one sample:
//!
//! ```text
//! <time> <mmu> <buf_0> .. <buf_{n-1}> <bw_0> .. <bw_{n-1}> ...
//! ```
//!
//! where `<mmu>` selects which MMU the sample belongs to, the buffer columns
//! are occupancy fractions and the bandwidth columns are raw memory-bandwidth
//! units.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rayon::prelude::*;
use serde::Serialize;

use super::config_key::{ConfigKey, ConfigKeyError};
use super::distribution::{empirical_cdf, CdfPoint};
use crate::config::AnalysisConfig;

/// Separates the config key from the switch index in log file names
pub const SWITCH_MARKER: &str = "-q-sw-";

/// Errors from reading a single utilization log
#[derive(Debug, thiserror::Error)]
pub enum UtilizationError {
    #[error("Failed to read utilization log {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' is not a utilization log name (expected <key>-q-sw-<n>.txt)")]
    FileName(String),

    #[error("utilization log '{name}' has an invalid key: {source}")]
    Key {
        name: String,
        #[source]
        source: ConfigKeyError,
    },

    #[error("line {line}: invalid {column} '{value}'")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },
}

/// Samples of one or more utilization logs, as percentages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UtilizationSamples {
    pub buffer_utilization: Vec<f64>,
    pub memory_bandwidth: Vec<f64>,
}

impl UtilizationSamples {
    pub fn len(&self) -> usize {
        self.buffer_utilization.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer_utilization.is_empty()
    }

    pub fn extend(&mut self, other: UtilizationSamples) {
        self.buffer_utilization.extend(other.buffer_utilization);
        self.memory_bandwidth.extend(other.memory_bandwidth);
    }
}

/// Decoded utilization log file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilizationLogName {
    pub key: ConfigKey,
    pub switch: u32,
}

impl UtilizationLogName {
    pub fn from_path(path: &Path) -> Result<Self, UtilizationError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UtilizationError::FileName(path.display().to_string()))?;
        name.parse()
    }
}

impl FromStr for UtilizationLogName {
    type Err = UtilizationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let bad_name = || UtilizationError::FileName(name.to_string());
        let stem = name.strip_suffix(".txt").ok_or_else(bad_name)?;
        let (key, switch) = stem.rsplit_once(SWITCH_MARKER).ok_or_else(bad_name)?;
        let switch = switch.parse().map_err(|_| bad_name())?;
        let key = key.parse().map_err(|source| UtilizationError::Key {
            name: name.to_string(),
            source,
        })?;
        Ok(Self { key, switch })
    }
}

/// A finite numeric column; `nan` and `inf` parse as f64 but are not samples
fn column(parts: &[&str], index: usize, line: usize, column: &'static str) -> Result<f64, UtilizationError> {
    parts[index]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| UtilizationError::InvalidValue {
            line,
            column,
            value: parts[index].to_string(),
        })
}

/// Parse utilization samples from log text
///
/// Lines shorter than `min_log_fields` and lines naming an MMU outside
/// `0..mmu_count` are skipped.
pub fn parse_utilization_str(
    content: &str,
    config: &AnalysisConfig,
) -> Result<UtilizationSamples, UtilizationError> {
    let mut samples = UtilizationSamples::default();
    let mmu_count = config.mmu_count;
    let bandwidth_offset = 2 + mmu_count;
    let min_fields = config.min_log_fields.max(bandwidth_offset + mmu_count);

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < min_fields {
            continue;
        }

        let mmu: i64 = parts[1].parse().map_err(|_| UtilizationError::InvalidValue {
            line: line_no,
            column: "mmu index",
            value: parts[1].to_string(),
        })?;
        let mmu = match usize::try_from(mmu) {
            Ok(mmu) if mmu < mmu_count => mmu,
            _ => continue,
        };

        let buffer = column(&parts, 2 + mmu, line_no, "buffer utilization")?;
        let bandwidth = column(&parts, bandwidth_offset + mmu, line_no, "memory bandwidth")?;
        samples.buffer_utilization.push(buffer * 100.0);
        samples
            .memory_bandwidth
            .push(bandwidth / config.memory_bandwidth_capacity * 100.0);
    }

    Ok(samples)
}

/// Read and parse one utilization log
pub fn parse_utilization_log(
    path: &Path,
    config: &AnalysisConfig,
) -> Result<UtilizationSamples, UtilizationError> {
    let content = fs::read_to_string(path).map_err(|source| UtilizationError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_utilization_str(&content, config)
}

/// Utilization distributions of one configuration, merged over its switches
#[derive(Debug, Clone, Serialize)]
pub struct UtilizationDistribution {
    pub key: String,
    pub switches: Vec<u32>,
    pub samples: usize,
    pub buffer_cdf: Vec<CdfPoint>,
    pub bandwidth_cdf: Vec<CdfPoint>,
}

/// CDFs of every configuration found among a set of utilization logs
#[derive(Debug, Clone, Default, Serialize)]
pub struct UtilizationReport {
    pub distributions: Vec<UtilizationDistribution>,
    /// Logs that were missing or could not be read
    pub skipped: Vec<String>,
}

/// Parse utilization logs in parallel and build per-configuration CDFs
///
/// Missing or unreadable logs are logged and skipped.
pub fn build_utilization_report(paths: &[PathBuf], config: &AnalysisConfig) -> UtilizationReport {
    log::info!("Parsing {} utilization logs in parallel...", paths.len());

    let results: Vec<Result<(UtilizationLogName, UtilizationSamples), String>> = paths
        .par_iter()
        .map(|path| {
            if !path.exists() {
                log::warn!("Utilization log not found: {}", path.display());
                return Err(path.display().to_string());
            }
            let parsed = UtilizationLogName::from_path(path)
                .and_then(|name| Ok((name, parse_utilization_log(path, config)?)));
            match parsed {
                Ok((name, samples)) => {
                    log::debug!(
                        "Parsed {}: {} samples",
                        path.display(),
                        samples.len()
                    );
                    Ok((name, samples))
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    Err(path.display().to_string())
                }
            }
        })
        .collect();

    let mut report = UtilizationReport::default();
    let mut merged: BTreeMap<ConfigKey, (Vec<u32>, UtilizationSamples)> = BTreeMap::new();
    for result in results {
        match result {
            Ok((name, samples)) => {
                let entry = merged.entry(name.key).or_default();
                entry.0.push(name.switch);
                entry.1.extend(samples);
            }
            Err(path) => report.skipped.push(path),
        }
    }

    for (key, (mut switches, samples)) in merged {
        switches.sort_unstable();
        if samples.is_empty() {
            log::warn!("No utilization samples for {}", key);
        }
        report.distributions.push(UtilizationDistribution {
            key: key.to_string(),
            switches,
            samples: samples.len(),
            buffer_cdf: empirical_cdf(&samples.buffer_utilization),
            bandwidth_cdf: empirical_cdf(&samples.memory_bandwidth),
        });
    }

    log::info!(
        "Built utilization CDFs for {} configurations ({} logs skipped)",
        report.distributions.len(),
        report.skipped.len()
    );
    report
}

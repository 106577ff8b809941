use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::analysis::metrics::MetricsRecord;

/// Analysis parameters shared by every stage of the pipeline.
///
/// All fields default to the reference Occamy topology: 100 Gbps links, an
/// 80us base round-trip time and DT-1.0 as the baseline buffer-management
/// method.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Method every other method is normalized against
    pub baseline_method: String,
    /// Topology-wide base round-trip time
    #[serde(with = "humantime_serde")]
    pub base_rtt: Duration,
    /// Bottleneck link capacity in Gbps
    pub link_rate_gbps: f64,
    /// Destination ports at or above this value carry query (burst) traffic
    pub query_port_threshold: u16,
    /// Raw memory-bandwidth units corresponding to 100% utilization
    pub memory_bandwidth_capacity: f64,
    /// Number of MMUs reported per utilization log line
    pub mmu_count: usize,
    /// Utilization log lines with fewer fields are skipped
    pub min_log_fields: usize,
    /// Metrics plotted by the trend charts
    pub performance_parameters: Vec<String>,
    /// Explicit method order for charts; all methods in the table when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            baseline_method: "DT-1.0".to_string(),
            base_rtt: Duration::from_micros(80),
            link_rate_gbps: 100.0,
            query_port_threshold: 20010,
            memory_bandwidth_capacity: 8e11,
            mmu_count: 4,
            min_log_fields: 10,
            performance_parameters: vec![
                "query_qct_ave_slowdown".to_string(),
                "web_fct_99th_slowdown".to_string(),
            ],
            methods: None,
        }
    }
}

impl AnalysisConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.baseline_method.is_empty() {
            return Err(ValidationError::InvalidBaseline(
                "baseline_method cannot be empty".to_string(),
            ));
        }
        if self.baseline_method.contains('~') || self.baseline_method.contains(char::is_whitespace) {
            return Err(ValidationError::InvalidBaseline(format!(
                "baseline_method '{}' cannot contain '~' or whitespace",
                self.baseline_method
            )));
        }

        if self.base_rtt.is_zero() {
            return Err(ValidationError::InvalidTopology(
                "base_rtt must be greater than zero".to_string(),
            ));
        }
        if !(self.link_rate_gbps.is_finite() && self.link_rate_gbps > 0.0) {
            return Err(ValidationError::InvalidTopology(format!(
                "link_rate_gbps must be positive, got {}",
                self.link_rate_gbps
            )));
        }

        if self.mmu_count == 0 {
            return Err(ValidationError::InvalidUtilization(
                "mmu_count must be at least 1".to_string(),
            ));
        }
        if !(self.memory_bandwidth_capacity.is_finite() && self.memory_bandwidth_capacity > 0.0) {
            return Err(ValidationError::InvalidUtilization(format!(
                "memory_bandwidth_capacity must be positive, got {}",
                self.memory_bandwidth_capacity
            )));
        }
        // Bandwidth columns start right after the buffer columns
        let required = 2 + 2 * self.mmu_count;
        if self.min_log_fields < required {
            return Err(ValidationError::InvalidUtilization(format!(
                "min_log_fields ({}) must cover {} MMU columns ({} fields)",
                self.min_log_fields, self.mmu_count, required
            )));
        }

        for name in &self.performance_parameters {
            if !MetricsRecord::FIELD_NAMES.contains(&name.as_str()) {
                return Err(ValidationError::UnknownMetric(name.clone()));
            }
        }

        if let Some(methods) = &self.methods {
            if methods
                .iter()
                .any(|m| m.is_empty() || m.contains('~') || m.contains(char::is_whitespace))
            {
                return Err(ValidationError::InvalidBaseline(
                    "methods must be non-empty and cannot contain '~' or whitespace".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Base round-trip time in seconds
    pub fn base_rtt_secs(&self) -> f64 {
        self.base_rtt.as_secs_f64()
    }

    /// Link rate in bits per second
    pub fn link_rate_bps(&self) -> f64 {
        self.link_rate_gbps * 1e9
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid baseline configuration: {0}")]
    InvalidBaseline(String),
    #[error("Invalid topology configuration: {0}")]
    InvalidTopology(String),
    #[error("Invalid utilization configuration: {0}")]
    InvalidUtilization(String),
    #[error("Unknown performance parameter: {0}")]
    UnknownMetric(String),
}

//! Fixed-schema metrics record and the per-trace summarizer.

use serde::{Deserialize, Serialize};

use super::query::TrafficAggregation;
use super::stats::{loss_rate, TailSummary};
use crate::config::AnalysisConfig;

/// Declares `MetricsRecord` with its fields in output order, plus the
/// name table and positional accessors that keep the file columns, JSON keys
/// and struct fields in lockstep.
macro_rules! metrics_schema {
    ($($field:ident),+ $(,)?) => {
        /// Summary metrics of one (method, configuration) trace
        ///
        /// Times are in nanoseconds, slowdowns and loss rates are ratios. Every
        /// field defaults to zero.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
        pub struct MetricsRecord {
            $(pub $field: f64,)+
        }

        impl MetricsRecord {
            /// Field names in schema (and metrics-file column) order
            pub const FIELD_NAMES: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Field values in schema order
            pub fn values(&self) -> Vec<f64> {
                vec![$(self.$field),+]
            }

            /// Mutable references to every field, in schema order
            pub fn fields_mut(&mut self) -> Vec<&mut f64> {
                vec![$(&mut self.$field),+]
            }

            /// Rebuild a record from values in schema order
            pub fn from_values(values: &[f64]) -> Option<Self> {
                if values.len() != Self::FIELD_NAMES.len() {
                    return None;
                }
                let mut iter = values.iter().copied();
                Some(Self {
                    $($field: iter.next()?,)+
                })
            }

            /// Look up a field by its schema name
            pub fn get(&self, name: &str) -> Option<f64> {
                match name {
                    $(stringify!($field) => Some(self.$field),)+
                    _ => None,
                }
            }
        }
    };
}

metrics_schema! {
    query_qct_ave,
    query_qct_99th,
    query_qct_ave_slowdown,
    query_qct_99th_slowdown,
    query_pkt_loss_rate,
    query_fct_ave,
    query_fct_99th,
    query_fct_ave_slowdown,
    query_fct_99th_slowdown,
    web_pkt_loss_rate,
    web_fct_ave,
    web_fct_99th,
    web_fct_ave_slowdown,
    web_fct_99th_slowdown,
    small_web_pkt_loss_rate,
    small_web_fct_ave,
    small_web_fct_99th,
    small_web_fct_ave_slowdown,
    small_web_fct_99th_slowdown,
    medium_web_pkt_loss_rate,
    medium_web_fct_ave,
    medium_web_fct_99th,
    medium_web_fct_ave_slowdown,
    medium_web_fct_99th_slowdown,
    large_web_pkt_loss_rate,
    large_web_fct_ave,
    large_web_fct_99th,
    large_web_fct_ave_slowdown,
    large_web_fct_99th_slowdown,
}

impl MetricsRecord {
    /// Number of fields in the schema
    pub fn field_count() -> usize {
        Self::FIELD_NAMES.len()
    }

    /// Set every field to zero
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Summarize the aggregated traffic of one trace
///
/// Per-flow query FCT fields and the size-tiered web fields are reserved
/// slots and stay zero.
pub fn summarize(aggregation: &TrafficAggregation, config: &AnalysisConfig) -> MetricsRecord {
    // QCT and QCT slowdown are sorted independently, as are FCT and FCT slowdown
    let qct = TailSummary::from_samples(aggregation.query_completion_times());
    let qct_slowdown = TailSummary::from_samples(aggregation.query_slowdowns(config));
    let web_fct = TailSummary::from_samples(aggregation.web_fct.clone());
    let web_slowdown = TailSummary::from_samples(aggregation.web_slowdown.clone());

    MetricsRecord {
        query_qct_ave: qct.mean,
        query_qct_99th: qct.p99,
        query_qct_ave_slowdown: qct_slowdown.mean,
        query_qct_99th_slowdown: qct_slowdown.p99,
        query_pkt_loss_rate: loss_rate(
            aggregation.query_packets.lost,
            aggregation.query_packets.received,
        ),
        web_pkt_loss_rate: loss_rate(
            aggregation.web_packets.lost,
            aggregation.web_packets.received,
        ),
        web_fct_ave: web_fct.mean,
        web_fct_99th: web_fct.p99,
        web_fct_ave_slowdown: web_slowdown.mean,
        web_fct_99th_slowdown: web_slowdown.p99,
        ..Default::default()
    }
}

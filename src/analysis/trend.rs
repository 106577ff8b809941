//! Trend chart data: one metric across load levels, one series per method.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::config_key::{ConfigKey, Scenario};
use super::table::MetricsTable;
use crate::config::AnalysisConfig;

/// All-reduce message size for each load level of the all-reduce experiments
const ALLREDUCE_SIZES: [(f64, &str); 17] = [
    (0.1, "16KB"),
    (0.2, "32KB"),
    (0.3, "64KB"),
    (0.4, "128KB"),
    (0.5, "256KB"),
    (0.6, "512KB"),
    (0.65, "786KB"),
    (0.7, "1MB"),
    (0.72, "1.25MB"),
    (0.74, "1.5MB"),
    (0.76, "1.75MB"),
    (0.8, "2MB"),
    (0.9, "2.25MB"),
    (1.0, "2.5MB"),
    (1.1, "2.75MB"),
    (1.2, "3MB"),
    (1.3, "4MB"),
];

/// What the x axis of a trend chart shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum XAxis {
    /// The load level as written in the config key
    #[default]
    Load,
    /// The all-reduce message size the load level stands for
    AllreduceSize,
}

impl XAxis {
    pub fn title(&self) -> &'static str {
        match self {
            XAxis::Load => "Load",
            XAxis::AllreduceSize => "Allreduce Size",
        }
    }
}

impl fmt::Display for XAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XAxis::Load => write!(f, "load"),
            XAxis::AllreduceSize => write!(f, "allreduce-size"),
        }
    }
}

impl FromStr for XAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(XAxis::Load),
            "allreduce-size" => Ok(XAxis::AllreduceSize),
            other => Err(format!(
                "unknown x axis '{}' (expected 'load' or 'allreduce-size')",
                other
            )),
        }
    }
}

/// Message size label of an all-reduce load level
pub fn allreduce_size_label(load: f64) -> Option<&'static str> {
    ALLREDUCE_SIZES
        .iter()
        .find(|(level, _)| (level - load).abs() < 1e-9)
        .map(|(_, label)| *label)
}

/// Y-axis label of a performance parameter
pub fn y_label(parameter: &str) -> String {
    match parameter {
        "web_fct_ave_slowdown" => "Allreduce Avg FCT Slowdown".to_string(),
        "web_fct_99th_slowdown" => "Allreduce 99th FCT Slowdown".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub load: String,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub method: String,
    pub points: Vec<TrendPoint>,
}

/// Data of one line chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    /// `{parameter}-{protocol}-XX-{sizeRate}-{flowRate}-{bufferSize}-{queueCount}`
    pub name: String,
    pub parameter: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<TrendSeries>,
}

/// Scenario fields other than the load level
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ScenarioGroup {
    protocol: String,
    request_size_rate: String,
    request_flow_rate: String,
    buffer_size: String,
    queue_count: String,
}

impl ScenarioGroup {
    fn of(scenario: &Scenario) -> Self {
        Self {
            protocol: scenario.protocol.clone(),
            request_size_rate: scenario.request_size_rate.clone(),
            request_flow_rate: scenario.request_flow_rate.clone(),
            buffer_size: scenario.buffer_size.clone(),
            queue_count: scenario.queue_count.clone(),
        }
    }

    fn chart_name(&self, parameter: &str) -> String {
        format!(
            "{}-{}-XX-{}-{}-{}-{}",
            parameter,
            self.protocol,
            self.request_size_rate,
            self.request_flow_rate,
            self.buffer_size,
            self.queue_count
        )
    }
}

fn compare_loads(a: &Scenario, b: &Scenario) -> Ordering {
    let numeric = match (a.load_value(), b.load_value()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    };
    numeric.then_with(|| a.load_level.cmp(&b.load_level))
}

/// Methods in chart order
///
/// The configured list when present, otherwise the baseline first and the
/// remaining methods of the table sorted.
pub fn method_order(table: &MetricsTable, config: &AnalysisConfig) -> Vec<String> {
    if let Some(methods) = &config.methods {
        return methods.clone();
    }
    let mut methods = table.methods();
    let mut ordered = Vec::with_capacity(methods.len());
    if methods.remove(&config.baseline_method) {
        ordered.push(config.baseline_method.clone());
    }
    ordered.extend(methods);
    ordered
}

/// Build one chart per (scenario group, performance parameter)
///
/// A method with no record at some load level gets no point there.
pub fn build_trend_charts(
    table: &MetricsTable,
    config: &AnalysisConfig,
    x_axis: XAxis,
) -> Vec<TrendChart> {
    let mut groups: BTreeMap<ScenarioGroup, Vec<Scenario>> = BTreeMap::new();
    for scenario in table.scenarios() {
        groups.entry(ScenarioGroup::of(&scenario)).or_default().push(scenario);
    }
    let methods = method_order(table, config);

    let mut charts = Vec::new();
    for (group, mut scenarios) in groups {
        scenarios.sort_by(compare_loads);

        for parameter in &config.performance_parameters {
            let series = methods
                .iter()
                .map(|method| TrendSeries {
                    method: method.clone(),
                    points: series_points(table, method, &scenarios, parameter, x_axis),
                })
                .collect();

            charts.push(TrendChart {
                name: group.chart_name(parameter),
                parameter: parameter.clone(),
                x_label: x_axis.title().to_string(),
                y_label: y_label(parameter),
                series,
            });
        }
    }

    log::info!(
        "Built {} trend charts over {} methods",
        charts.len(),
        methods.len()
    );
    charts
}

fn series_points(
    table: &MetricsTable,
    method: &str,
    scenarios: &[Scenario],
    parameter: &str,
    x_axis: XAxis,
) -> Vec<TrendPoint> {
    let mut points = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let key = ConfigKey {
            method: method.to_string(),
            scenario: scenario.clone(),
        };
        let Some(record) = table.get(&key) else {
            log::warn!("No metrics for {}, skipping point", key);
            continue;
        };
        let Some(value) = record.get(parameter) else {
            log::warn!("Unknown performance parameter '{}'", parameter);
            continue;
        };

        let label = match x_axis {
            XAxis::Load => scenario.load_level.clone(),
            XAxis::AllreduceSize => scenario
                .load_value()
                .and_then(allreduce_size_label)
                .map(str::to_string)
                .unwrap_or_else(|| scenario.load_level.clone()),
        };
        points.push(TrendPoint {
            load: scenario.load_level.clone(),
            label,
            value,
        });
    }
    points
}

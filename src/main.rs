//! Flow-trace analysis CLI for Occamy buffer-management experiments.
//!
//! Computes per-configuration metrics from flow-monitor traces, normalizes
//! them against a baseline method, and exports chart data and reports.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Context, Result};
use serde::Serialize;

use occamy_analyzer::analysis::{
    self,
    report::{print_summary, AnalysisReport},
    MetricsTable, XAxis,
};
use occamy_analyzer::config::AnalysisConfig;
use occamy_analyzer::config_loader;

#[derive(Parser, Debug)]
#[command(name = "occamy-analyzer")]
#[command(about = "Flow-completion and buffer-utilization analysis for Occamy experiments")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Analysis configuration YAML (reference defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of parallel workers (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the metrics file from a directory of flow-monitor traces
    Metrics {
        /// Directory containing `<config key>.xml` traces
        #[arg(long)]
        traces: PathBuf,

        /// Metrics file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Also write JSON and text reports into this directory
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// Normalize a metrics file against the baseline method
    Normalize {
        /// Metrics file to read
        #[arg(short, long)]
        input: PathBuf,

        /// Normalized metrics file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Baseline method (defaults to the configured one)
        #[arg(long)]
        baseline: Option<String>,
    },

    /// Export trend chart data across load levels
    Trend {
        /// Metrics file to read
        #[arg(short, long)]
        input: PathBuf,

        /// JSON chart data to write
        #[arg(short, long)]
        output: PathBuf,

        /// Normalize against the baseline before charting
        #[arg(long)]
        normalize: bool,

        /// X axis: `load` or `allreduce-size`
        #[arg(long, default_value = "load", value_parser = parse_x_axis)]
        x_axis: XAxis,
    },

    /// Export buffer and memory-bandwidth utilization CDFs
    Cdf {
        /// Utilization logs named `<config key>-q-sw-<n>.txt`
        #[arg(long, num_args = 1.., required = true)]
        logs: Vec<PathBuf>,

        /// JSON chart data to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write JSON and text reports for a metrics file
    Report {
        /// Metrics file to read
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for reports
        #[arg(short, long, default_value = "analysis_output")]
        output_dir: PathBuf,
    },
}

fn parse_x_axis(value: &str) -> Result<XAxis, String> {
    value.parse()
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    // Set thread pool size
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let config = config_loader::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Metrics {
            traces,
            output,
            report_dir,
        } => run_metrics(&traces, &output, report_dir.as_deref(), &config)?,
        Commands::Normalize {
            input,
            output,
            baseline,
        } => {
            let baseline = baseline.unwrap_or_else(|| config.baseline_method.clone());
            let mut table = MetricsTable::read_from(&input)?;
            let summary = analysis::normalize_against_baseline(&mut table, &baseline);
            if !summary.missing_baseline.is_empty() {
                log::warn!(
                    "{} configurations have no {} run and were dropped",
                    summary.missing_baseline.len(),
                    baseline
                );
            }
            create_parent_dir(&output)?;
            table.write_to(&output)?;
        }
        Commands::Trend {
            input,
            output,
            normalize,
            x_axis,
        } => {
            let mut table = MetricsTable::read_from(&input)?;
            if normalize {
                let summary = analysis::normalize_against_baseline(&mut table, &config.baseline_method);
                if !summary.missing_baseline.is_empty() {
                    log::warn!(
                        "{} configurations have no {} run and were left out of the charts",
                        summary.missing_baseline.len(),
                        config.baseline_method
                    );
                }
            }
            let charts = analysis::build_trend_charts(&table, &config, x_axis);
            write_json(&charts, &output)?;
        }
        Commands::Cdf { logs, output } => {
            let report = analysis::build_utilization_report(&logs, &config);
            if report.distributions.is_empty() {
                bail!("None of the {} utilization logs could be read", logs.len());
            }
            write_json(&report, &output)?;
        }
        Commands::Report { input, output_dir } => {
            let table = MetricsTable::read_from(&input)?;
            let report = AnalysisReport::new(&table, Vec::new(), Vec::new(), &config);
            write_reports(&report, &output_dir)?;
            print_summary(&report);
        }
    }

    Ok(())
}

fn run_metrics(
    traces_dir: &Path,
    output: &Path,
    report_dir: Option<&Path>,
    config: &AnalysisConfig,
) -> Result<()> {
    let traces = analysis::collect_trace_files(traces_dir)?;
    if traces.is_empty() {
        bail!("No trace files found in {}", traces_dir.display());
    }

    let outcome = analysis::analyze_traces(&traces, config);
    if outcome.table.is_empty() {
        bail!("None of the {} traces could be analyzed", traces.len());
    }

    create_parent_dir(output)?;
    outcome.table.write_to(output)?;

    let report = AnalysisReport::new(&outcome.table, outcome.summaries, outcome.failures, config);
    if let Some(dir) = report_dir {
        write_reports(&report, dir)?;
    }
    print_summary(&report);
    Ok(())
}

fn write_reports(report: &AnalysisReport, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    analysis::generate_json_report(report, &dir.join("analysis_report.json"))?;
    analysis::generate_text_report(report, &dir.join("analysis_report.txt"))?;
    Ok(())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    create_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).context("Failed to serialize chart data")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Chart data written to {}", path.display());
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::aggregate::{aggregate, Aggregation, Headline};
use crate::color::ColorAssignment;
use crate::config::ReportConfig;
use crate::dataset::Dataset;
use crate::error::ReportError;
use crate::render::{PanelComposer, SvgCanvas};
use crate::score::ScoreCard;
use crate::synth::synthesize_all;

pub const REPORT_TITLE: &str = "API Performance Report";

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

/// Per-endpoint numbers written to the JSON summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EndpointSummary {
    pub endpoint: String,
    pub runs: usize,
    pub max_concurrency: u32,
    pub peak_throughput_rps: f64,
    pub best_mean_latency_ms: f64,
    /// Percentiles of the row with the highest concurrency.
    pub p50_latency_ms: f64,
    pub p90_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub successful_requests: u64,
    pub failed_requests: u64,
}

/// Machine-readable companion of a rendered report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportSummary {
    pub report_id: Uuid,
    pub generated_at: DateTime<Local>,
    pub source: String,
    pub row_count: usize,
    pub endpoint_count: usize,
    pub endpoints: Vec<EndpointSummary>,
    pub headline: Headline,
    pub score: ScoreCard,
}

impl ReportSummary {
    pub fn build(
        dataset: &Dataset,
        aggregation: &Aggregation,
        score: ScoreCard,
        generated_at: DateTime<Local>,
    ) -> Self {
        let endpoints = aggregation
            .groups
            .iter()
            .map(|group| {
                let rows = group.rows.iter().map(|&i| &dataset.rows[i]);
                let peak = &dataset.rows[group.max_load_row];
                EndpointSummary {
                    endpoint: group.endpoint.clone(),
                    runs: group.rows.len(),
                    max_concurrency: peak.concurrency,
                    peak_throughput_rps: rows.clone().map(|r| r.throughput_rps).fold(0.0, f64::max),
                    best_mean_latency_ms: rows
                        .map(|r| r.mean_latency_ms)
                        .fold(f64::INFINITY, f64::min),
                    p50_latency_ms: peak.p50_latency_ms,
                    p90_latency_ms: peak.p90_latency_ms,
                    p95_latency_ms: peak.p95_latency_ms,
                    p99_latency_ms: peak.p99_latency_ms,
                    successful_requests: group.successful_requests,
                    failed_requests: group.failed_requests,
                }
            })
            .collect();

        Self {
            report_id: Uuid::new_v4(),
            generated_at,
            source: dataset.source.clone(),
            row_count: dataset.len(),
            endpoint_count: aggregation.groups.len(),
            endpoints,
            headline: aggregation.headline,
            score,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub svg_path: PathBuf,
    pub summary_path: Option<PathBuf>,
    pub summary: ReportSummary,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Base file name `<prefix>-<timestamp>` shared by the SVG and JSON outputs.
pub fn report_stem(prefix: &str, timestamp_format: &str, at: &DateTime<Local>) -> String {
    format!("{}-{}", prefix, at.format(timestamp_format))
}

/// Render the full report for `dataset` as an SVG document in memory.
pub fn render_svg(
    dataset: &Dataset,
    aggregation: &Aggregation,
    score: &ScoreCard,
    config: &ReportConfig,
) -> Result<String, ReportError> {
    let samples = synthesize_all(dataset, aggregation, &config.recipe, &mut rand::thread_rng())?;
    debug!(sets = samples.len(), "synthetic samples drawn");

    let colors = ColorAssignment::from_aggregation(aggregation, &config.style.palette)?;
    let composer = PanelComposer::new(dataset, aggregation, &samples, score, &colors, &config.style);

    let mut buffer = String::new();
    {
        let mut canvas = SvgCanvas::new(&mut buffer, &config.style, REPORT_TITLE)?;
        composer.compose(&mut canvas)?;
        canvas.finish()?;
    }
    Ok(buffer)
}

/// Aggregate, score and render `dataset`, then write the report files.
///
/// Nothing touches the filesystem until the figure has been fully rendered.
pub fn generate_report(dataset: &Dataset, config: &ReportConfig) -> Result<ReportOutcome, ReportError> {
    config.validate()?;

    let aggregation = aggregate(dataset)?;
    info!(
        rows = dataset.len(),
        endpoints = aggregation.groups.len(),
        "dataset aggregated"
    );

    let score = ScoreCard::from_headline(&aggregation.headline);
    info!(score = score.composite, tier = %score.tier, "performance scored");

    let svg = render_svg(dataset, &aggregation, &score, config)?;

    let now = Local::now();
    let stem = report_stem(&config.output.file_prefix, &config.output.timestamp_format, &now);
    let directory = &config.output.directory;
    std::fs::create_dir_all(directory)?;

    let svg_path = directory.join(format!("{stem}.svg"));
    std::fs::write(&svg_path, svg)?;
    info!(path = %svg_path.display(), "report written");

    let summary = ReportSummary::build(dataset, &aggregation, score, now);
    let summary_path = if config.output.summary_json {
        let path = directory.join(format!("{stem}.json"));
        write_summary(&path, &summary)?;
        Some(path)
    } else {
        None
    };

    Ok(ReportOutcome {
        svg_path,
        summary_path,
        summary,
    })
}

fn write_summary(path: &Path, summary: &ReportSummary) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "summary written");
    Ok(())
}

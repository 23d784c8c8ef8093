use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use perfreport_core::{generate_report, Dataset, ReportConfig, ReportError, ReportOutcome};

/// Render a load-test result file into a single SVG performance report.
#[derive(Parser, Debug)]
#[command(name = "perfreport")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Delimited result file, one row per (endpoint, concurrency) run
    input: PathBuf,

    /// Directory for the report (defaults to the current directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Field delimiter of the input file
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Also write a JSON summary next to the report
    #[arg(long)]
    summary_json: bool,
}

impl Args {
    fn report_config(&self) -> Result<ReportConfig, ReportError> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::load(path)?,
            None => ReportConfig::default(),
        };
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if self.summary_json {
            config.output.summary_json = true;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(args: &Args) -> Result<ReportOutcome, ReportError> {
    let config = args.report_config()?;
    let dataset = Dataset::load(&args.input, &config.dataset_options()?)?;
    info!(source = %dataset.source, rows = dataset.len(), "dataset loaded");
    generate_report(&dataset, &config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(outcome) => {
            let summary = &outcome.summary;
            println!("Report generated: {}", outcome.svg_path.display());
            if let Some(path) = &outcome.summary_path {
                println!("Summary written:  {}", path.display());
            }
            println!(
                "Score: {:.1} / 100 ({}) across {} endpoints, {} runs",
                summary.score.composite, summary.score.tier, summary.endpoint_count, summary.row_count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            if e.is_input_error() {
                error!(input = %args.input.display(), "cannot read results: {e}");
            } else {
                error!("report generation failed: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

pub mod aggregate;
pub mod color;
pub mod config;
pub mod dataset;
pub mod error;
pub mod render;
pub mod report;
pub mod score;
pub mod synth;

pub use config::ReportConfig;
pub use dataset::{Dataset, DatasetOptions};
pub use error::ReportError;
pub use report::{generate_report, ReportOutcome, ReportSummary};

pub mod io;

use serde::{Deserialize, Serialize};

pub use io::DatasetOptions;

/// One performance-test observation: a single endpoint run at a single
/// concurrency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResultRow {
    pub endpoint: String,
    /// Number of simulated simultaneous clients. Always at least 1.
    pub concurrency: u32,
    /// Requests per second.
    pub throughput_rps: f64,
    pub mean_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p90_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    /// Percentage in the range 0–100.
    pub success_rate: f64,
    pub successful_requests: u64,
    pub failed_requests: u64,
}

impl ResultRow {
    /// Successful plus failed requests, `None` when the sum overflows.
    pub fn total_requests(&self) -> Option<u64> {
        self.successful_requests.checked_add(self.failed_requests)
    }

    /// Percentile markers in ascending percentile order.
    pub fn percentiles(&self) -> [f64; 4] {
        [
            self.p50_latency_ms,
            self.p90_latency_ms,
            self.p95_latency_ms,
            self.p99_latency_ms,
        ]
    }
}

/// Header names of the required input columns. The defaults match the
/// result CSV written by the load-test runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ColumnNames {
    pub endpoint: String,
    pub concurrency: String,
    pub throughput: String,
    pub mean_latency: String,
    pub p50_latency: String,
    pub p90_latency: String,
    pub p95_latency: String,
    pub p99_latency: String,
    pub success_rate: String,
    pub successful_requests: String,
    pub failed_requests: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            endpoint: "Endpoint".to_string(),
            concurrency: "Concurrent Users".to_string(),
            throughput: "Throughput (req/s)".to_string(),
            mean_latency: "Mean (ms)".to_string(),
            p50_latency: "P50 (ms)".to_string(),
            p90_latency: "P90 (ms)".to_string(),
            p95_latency: "P95 (ms)".to_string(),
            p99_latency: "P99 (ms)".to_string(),
            success_rate: "Success Rate (%)".to_string(),
            successful_requests: "Successful Requests".to_string(),
            failed_requests: "Failed Requests".to_string(),
        }
    }
}

/// The loaded result set, rows kept in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Where the rows came from (usually a file path), for console output.
    pub source: String,
    pub rows: Vec<ResultRow>,
}

impl Dataset {
    pub fn new(source: impl Into<String>, rows: Vec<ResultRow>) -> Self {
        Self {
            source: source.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_requests_sums_both_counts() {
        let mut r = fixtures::row("search", 10, 100.0, 20.0);
        r.successful_requests = 90;
        r.failed_requests = 10;
        assert_eq!(r.total_requests(), Some(100));
    }

    #[test]
    fn total_requests_overflow_is_none() {
        let mut r = fixtures::row("search", 10, 100.0, 20.0);
        r.successful_requests = u64::MAX;
        r.failed_requests = 1;
        assert_eq!(r.total_requests(), None);
    }

    #[test]
    fn percentiles_are_in_marker_order() {
        let r = fixtures::row("search", 10, 100.0, 10.0);
        assert_eq!(r.percentiles(), [9.0, 15.0, 18.0, 25.0]);
    }

    #[test]
    fn default_column_names() {
        let names = ColumnNames::default();
        assert_eq!(names.endpoint, "Endpoint");
        assert_eq!(names.concurrency, "Concurrent Users");
        assert_eq!(names.p95_latency, "P95 (ms)");
    }
}

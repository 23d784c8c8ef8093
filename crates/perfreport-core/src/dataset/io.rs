use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::dataset::{ColumnNames, Dataset, ResultRow};
use crate::error::ReportError;

/// How to read a result file.
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub columns: ColumnNames,
    pub delimiter: u8,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            delimiter: b',',
        }
    }
}

/// Resolved header positions of the required columns.
struct ColumnIndex {
    endpoint: usize,
    concurrency: usize,
    throughput: usize,
    mean_latency: usize,
    p50: usize,
    p90: usize,
    p95: usize,
    p99: usize,
    success_rate: usize,
    successful: usize,
    failed: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord, names: &ColumnNames) -> Result<Self, ReportError> {
        let headers: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            endpoint: find(&names.endpoint)?,
            concurrency: find(&names.concurrency)?,
            throughput: find(&names.throughput)?,
            mean_latency: find(&names.mean_latency)?,
            p50: find(&names.p50_latency)?,
            p90: find(&names.p90_latency)?,
            p95: find(&names.p95_latency)?,
            p99: find(&names.p99_latency)?,
            success_rate: find(&names.success_rate)?,
            successful: find(&names.successful_requests)?,
            failed: find(&names.failed_requests)?,
        })
    }
}

/// One data record together with its line number, for error reporting.
struct Record<'a> {
    fields: &'a csv::StringRecord,
    line: u64,
}

impl Record<'_> {
    fn invalid(&self, column: &str, value: &str) -> ReportError {
        ReportError::InvalidValue {
            line: self.line,
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    fn raw(&self, idx: usize, column: &str) -> Result<&str, ReportError> {
        self.fields
            .get(idx)
            .map(str::trim)
            .ok_or_else(|| self.invalid(column, "<missing field>"))
    }

    fn parse<T: FromStr>(&self, idx: usize, column: &str) -> Result<T, ReportError> {
        let raw = self.raw(idx, column)?;
        raw.parse::<T>().map_err(|_| self.invalid(column, raw))
    }

    /// A finite, non-negative real.
    fn measure(&self, idx: usize, column: &str) -> Result<f64, ReportError> {
        let value: f64 = self.parse(idx, column)?;
        if !value.is_finite() || value < 0.0 {
            return Err(self.invalid(column, self.raw(idx, column)?));
        }
        Ok(value)
    }
}

impl Dataset {
    /// Read a delimited result file from disk.
    pub fn load(path: impl AsRef<Path>, options: &DatasetOptions) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        Self::from_reader(path.display().to_string(), file, options)
    }

    /// Parse delimited text with a header row.
    ///
    /// Every required column must be present; extra columns are ignored.
    /// A file without data rows is rejected with [`ReportError::EmptyDataset`].
    pub fn from_reader<R: Read>(
        source: impl Into<String>,
        reader: R,
        options: &DatasetOptions,
    ) -> Result<Self, ReportError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let index = ColumnIndex::resolve(reader.headers()?, &options.columns)?;
        let names = &options.columns;

        let mut rows = Vec::new();
        for result in reader.records() {
            let fields = result?;
            let line = fields.position().map(|p| p.line()).unwrap_or_default();
            let record = Record {
                fields: &fields,
                line,
            };
            rows.push(parse_row(&record, &index, names)?);
        }

        if rows.is_empty() {
            return Err(ReportError::EmptyDataset);
        }

        let source = source.into();
        debug!(source = %source, rows = rows.len(), "parsed result rows");
        Ok(Dataset::new(source, rows))
    }
}

fn parse_row(
    record: &Record<'_>,
    index: &ColumnIndex,
    names: &ColumnNames,
) -> Result<ResultRow, ReportError> {
    let endpoint = record.raw(index.endpoint, &names.endpoint)?;
    if endpoint.is_empty() {
        return Err(record.invalid(&names.endpoint, "<empty>"));
    }

    let concurrency: u32 = record.parse(index.concurrency, &names.concurrency)?;
    if concurrency == 0 {
        return Err(record.invalid(&names.concurrency, "0"));
    }

    let success_rate = record.measure(index.success_rate, &names.success_rate)?;
    if success_rate > 100.0 {
        return Err(record.invalid(
            &names.success_rate,
            record.raw(index.success_rate, &names.success_rate)?,
        ));
    }

    let successful_requests: u64 =
        record.parse(index.successful, &names.successful_requests)?;
    let failed_requests: u64 = record.parse(index.failed, &names.failed_requests)?;
    if successful_requests.checked_add(failed_requests).is_none() {
        return Err(record.invalid(
            &names.failed_requests,
            record.raw(index.failed, &names.failed_requests)?,
        ));
    }

    Ok(ResultRow {
        endpoint: endpoint.to_string(),
        concurrency,
        throughput_rps: record.measure(index.throughput, &names.throughput)?,
        mean_latency_ms: record.measure(index.mean_latency, &names.mean_latency)?,
        p50_latency_ms: record.measure(index.p50, &names.p50_latency)?,
        p90_latency_ms: record.measure(index.p90, &names.p90_latency)?,
        p95_latency_ms: record.measure(index.p95, &names.p95_latency)?,
        p99_latency_ms: record.measure(index.p99, &names.p99_latency)?,
        success_rate,
        successful_requests,
        failed_requests,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Endpoint,Concurrent Users,Throughput (req/s),Mean (ms),P50 (ms),\
P90 (ms),P95 (ms),P99 (ms),Success Rate (%),Successful Requests,Failed Requests";

    fn parse(content: &str) -> Result<Dataset, ReportError> {
        Dataset::from_reader("inline", content.as_bytes(), &DatasetOptions::default())
    }

    #[test]
    fn parses_well_formed_rows_in_file_order() {
        let content = format!(
            "{HEADER}\n\
             search,1,50,200,180,250,300,400,100,500,0\n\
             checkout,10,120.5,35.2,30,50,60,90,99.5,995,5\n"
        );
        let ds = parse(&content).expect("dataset should parse");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.source, "inline");
        assert_eq!(ds.rows[0].endpoint, "search");
        assert_eq!(ds.rows[1].endpoint, "checkout");
        assert_eq!(ds.rows[1].concurrency, 10);
        assert!((ds.rows[1].throughput_rps - 120.5).abs() < 1e-9);
        assert_eq!(ds.rows[1].failed_requests, 5);
    }

    #[test]
    fn parses_runner_output_with_unused_columns() {
        let content = "Endpoint,Concurrent Users,Successful Requests,Failed Requests,Duration (s),\
Throughput (req/s),Success Rate (%),Min (ms),Mean (ms),Max (ms),P50 (ms),P90 (ms),P95 (ms),P99 (ms)\n\
DNS JSON Query API,10,1000,0,2.50,400.00,100.00,1,5.00,20,4,8,10,15\n";
        let ds = parse(content).expect("runner output should parse");
        let r = &ds.rows[0];
        assert_eq!(r.endpoint, "DNS JSON Query API");
        assert_eq!(r.concurrency, 10);
        assert_eq!(r.successful_requests, 1000);
        assert_eq!(r.failed_requests, 0);
        assert!((r.throughput_rps - 400.0).abs() < 1e-9);
        assert!((r.success_rate - 100.0).abs() < 1e-9);
        assert!((r.mean_latency_ms - 5.0).abs() < 1e-9);
        assert_eq!(r.percentiles(), [4.0, 8.0, 10.0, 15.0]);
    }

    #[test]
    fn column_order_is_free_and_extra_columns_are_ignored() {
        let content = "Notes,Failed Requests,Successful Requests,Success Rate (%),P99 (ms),\
P95 (ms),P90 (ms),P50 (ms),Mean (ms),Throughput (req/s),Concurrent Users,Endpoint\n\
warmup,1,99,99,40,30,20,10,12,80,4,login\n";
        let ds = parse(content).expect("dataset should parse");
        let r = &ds.rows[0];
        assert_eq!(r.endpoint, "login");
        assert_eq!(r.concurrency, 4);
        assert_eq!(r.successful_requests, 99);
        assert_eq!(r.failed_requests, 1);
        assert!((r.p99_latency_ms - 40.0).abs() < 1e-9);
    }

    #[test]
    fn whitespace_around_fields_is_trimmed() {
        let content = format!("{HEADER}\n search , 2 , 10 , 5 , 4 , 6 , 7 , 9 , 100 , 20 , 0 \n");
        let ds = parse(&content).expect("dataset should parse");
        assert_eq!(ds.rows[0].endpoint, "search");
        assert_eq!(ds.rows[0].concurrency, 2);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let content = "Endpoint,Concurrent Users\nsearch,1\n";
        match parse(content) {
            Err(ReportError::MissingColumn(name)) => assert_eq!(name, "Throughput (req/s)"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn header_only_file_is_empty_dataset() {
        let content = format!("{HEADER}\n");
        assert!(matches!(parse(&content), Err(ReportError::EmptyDataset)));
    }

    #[test]
    fn non_numeric_throughput_is_invalid_value() {
        let content = format!("{HEADER}\nsearch,1,fast,200,180,250,300,400,100,500,0\n");
        match parse(&content) {
            Err(ReportError::InvalidValue { line, column, value }) => {
                assert_eq!(line, 2);
                assert_eq!(column, "Throughput (req/s)");
                assert_eq!(value, "fast");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let content = format!("{HEADER}\nsearch,0,50,200,180,250,300,400,100,500,0\n");
        assert!(matches!(parse(&content), Err(ReportError::InvalidValue { .. })));
    }

    #[test]
    fn negative_latency_is_rejected() {
        let content = format!("{HEADER}\nsearch,1,50,-2,180,250,300,400,100,500,0\n");
        assert!(matches!(parse(&content), Err(ReportError::InvalidValue { .. })));
    }

    #[test]
    fn success_rate_above_hundred_is_rejected() {
        let content = format!("{HEADER}\nsearch,1,50,200,180,250,300,400,100.5,500,0\n");
        assert!(matches!(parse(&content), Err(ReportError::InvalidValue { .. })));
    }

    #[test]
    fn request_counts_overflowing_u64_are_rejected() {
        let content = format!(
            "{HEADER}\nsearch,1,50,200,180,250,300,400,100,18446744073709551615,1\n"
        );
        match parse(&content) {
            Err(ReportError::InvalidValue { line, column, value }) => {
                assert_eq!(line, 2);
                assert_eq!(column, "Failed Requests");
                assert_eq!(value, "1");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let content = format!("{HEADER}\n,1,50,200,180,250,300,400,100,500,0\n");
        assert!(matches!(parse(&content), Err(ReportError::InvalidValue { .. })));
    }

    #[test]
    fn custom_delimiter_and_column_names() {
        let mut options = DatasetOptions {
            delimiter: b';',
            ..DatasetOptions::default()
        };
        options.columns.endpoint = "service".to_string();
        let content = "service;Concurrent Users;Throughput (req/s);Mean (ms);P50 (ms);\
P90 (ms);P95 (ms);P99 (ms);Success Rate (%);Successful Requests;Failed Requests\n\
orders;8;75;12;10;15;18;25;98;490;10\n";
        let ds = Dataset::from_reader("inline", content.as_bytes(), &options)
            .expect("dataset should parse");
        assert_eq!(ds.rows[0].endpoint, "orders");
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("results.csv");
        std::fs::write(&path, format!("{HEADER}\nsearch,1,50,200,180,250,300,400,100,500,0\n"))
            .expect("write should succeed");
        let ds = Dataset::load(&path, &DatasetOptions::default()).expect("load should succeed");
        assert_eq!(ds.len(), 1);
        assert!(ds.source.ends_with("results.csv"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = Dataset::load("/nonexistent/results.csv", &DatasetOptions::default());
        assert!(matches!(result, Err(ReportError::Io(_))));
    }
}

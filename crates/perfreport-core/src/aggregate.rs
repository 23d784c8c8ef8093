use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{Dataset, ResultRow};
use crate::error::ReportError;

// ---------------------------------------------------------------------------
// EndpointGroup: all runs of one endpoint
// ---------------------------------------------------------------------------

/// All rows sharing one endpoint identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointGroup {
    pub endpoint: String,
    /// Row indices ordered by concurrency ascending. Rows with equal
    /// concurrency keep their original relative order.
    pub rows: Vec<usize>,
    /// Index of the row with the highest concurrency.
    pub max_load_row: usize,
    pub successful_requests: u64,
    pub failed_requests: u64,
}

impl EndpointGroup {
    /// Never overflows: [`aggregate`] rejects groups whose total does not
    /// fit in `u64`.
    pub fn total_requests(&self) -> u64 {
        self.successful_requests.saturating_add(self.failed_requests)
    }
}

// ---------------------------------------------------------------------------
// Headline: dataset-wide scalar reductions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Headline {
    pub max_throughput_rps: f64,
    pub min_mean_latency_ms: f64,
    pub mean_success_rate: f64,
    /// Successful plus failed requests over every row.
    pub total_requests: u64,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Grouped and reduced view of a [`Dataset`], recomputed per report.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// One group per distinct endpoint, in order of first appearance.
    pub groups: Vec<EndpointGroup>,
    pub headline: Headline,
}

impl Aggregation {
    /// Distinct endpoint identifiers in order of first appearance.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.endpoint.as_str())
    }

    pub fn group(&self, endpoint: &str) -> Option<&EndpointGroup> {
        self.groups.iter().find(|g| g.endpoint == endpoint)
    }
}

/// Partition rows by endpoint identity and compute every reduction the
/// report panels need.
///
/// Grouping is by identifier value, so rows of one endpoint need not be
/// contiguous. An empty dataset is rejected.
pub fn aggregate(dataset: &Dataset) -> Result<Aggregation, ReportError> {
    let rows = &dataset.rows;
    if rows.is_empty() {
        return Err(ReportError::EmptyDataset);
    }

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut members: Vec<(&str, Vec<usize>)> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let slot = *positions.entry(row.endpoint.as_str()).or_insert_with(|| {
            members.push((row.endpoint.as_str(), Vec::new()));
            members.len() - 1
        });
        members[slot].1.push(idx);
    }

    let groups = members
        .into_iter()
        .map(|(endpoint, indices)| build_group(rows, endpoint, indices))
        .collect::<Result<Vec<_>, ReportError>>()?;

    let headline = headline(rows)?;
    for g in &groups {
        debug!(
            endpoint = %g.endpoint,
            runs = g.rows.len(),
            max_load_row = g.max_load_row,
            "endpoint grouped"
        );
    }

    Ok(Aggregation { groups, headline })
}

/// Sum of request counts, failing instead of wrapping on overflow.
fn checked_total(
    counts: impl IntoIterator<Item = Option<u64>>,
    scope: &str,
) -> Result<u64, ReportError> {
    counts
        .into_iter()
        .try_fold(0u64, |acc, n| n.and_then(|n| acc.checked_add(n)))
        .ok_or_else(|| ReportError::CountOverflow(scope.to_string()))
}

fn build_group(
    rows: &[ResultRow],
    endpoint: &str,
    indices: Vec<usize>,
) -> Result<EndpointGroup, ReportError> {
    let max_load_row = select_max_load(rows, &indices).ok_or(ReportError::EmptyDataset)?;
    let successful_requests = checked_total(
        indices.iter().map(|&i| Some(rows[i].successful_requests)),
        &format!("successful requests of '{endpoint}'"),
    )?;
    let failed_requests = checked_total(
        indices.iter().map(|&i| Some(rows[i].failed_requests)),
        &format!("failed requests of '{endpoint}'"),
    )?;
    checked_total(
        [Some(successful_requests), Some(failed_requests)],
        &format!("total requests of '{endpoint}'"),
    )?;

    let mut ordered = indices;
    // Stable, so equal concurrency keeps file order.
    ordered.sort_by_key(|&i| rows[i].concurrency);

    Ok(EndpointGroup {
        endpoint: endpoint.to_string(),
        rows: ordered,
        max_load_row,
        successful_requests,
        failed_requests,
    })
}

/// Index of the row with the highest concurrency among `indices`.
///
/// Ties go to the index listed first, so `indices` should be in original
/// row order. `None` when `indices` is empty.
pub fn select_max_load(rows: &[ResultRow], indices: &[usize]) -> Option<usize> {
    let (&first, rest) = indices.split_first()?;
    let mut best = first;
    for &i in rest {
        if rows[i].concurrency > rows[best].concurrency {
            best = i;
        }
    }
    Some(best)
}

fn headline(rows: &[ResultRow]) -> Result<Headline, ReportError> {
    let max_throughput_rps = rows
        .iter()
        .map(|r| r.throughput_rps)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_mean_latency_ms = rows
        .iter()
        .map(|r| r.mean_latency_ms)
        .fold(f64::INFINITY, f64::min);
    let mean_success_rate =
        rows.iter().map(|r| r.success_rate).sum::<f64>() / rows.len() as f64;
    let total_requests = checked_total(rows.iter().map(ResultRow::total_requests), "total requests")?;

    Ok(Headline {
        max_throughput_rps,
        min_mean_latency_ms,
        mean_success_rate,
        total_requests,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

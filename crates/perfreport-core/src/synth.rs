//! Illustrative latency samples for the distribution panel.
//!
//! Each row is expanded into three normal clusters centred on its P50, P90
//! and P95 markers. The result only gives the violin plot a plausible shape;
//! it is not a reconstruction of the real latency distribution, and P99 is
//! not used.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregation;
use crate::dataset::{Dataset, ResultRow};
use crate::error::ReportError;

/// Cluster sizes and relative spreads used to synthesize samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SampleRecipe {
    pub p50_count: usize,
    pub p50_spread: f64,
    pub p90_count: usize,
    pub p90_spread: f64,
    pub p95_count: usize,
    pub p95_spread: f64,
}

impl Default for SampleRecipe {
    fn default() -> Self {
        Self {
            p50_count: 25,
            p50_spread: 0.10,
            p90_count: 10,
            p90_spread: 0.05,
            p95_count: 5,
            p95_spread: 0.05,
        }
    }
}

impl SampleRecipe {
    pub fn samples_per_row(&self) -> usize {
        self.p50_count + self.p90_count + self.p95_count
    }
}

/// Pooled synthetic samples for one (endpoint, concurrency) row.
#[derive(Debug, Clone)]
pub struct SampleSet {
    pub endpoint: String,
    pub concurrency: u32,
    pub samples: Vec<f64>,
}

impl SampleSet {
    pub fn label(&self) -> String {
        format!("{}@{}", self.endpoint, self.concurrency)
    }
}

/// Draw the pooled sample vector for a single row: the P50 cluster first,
/// then P90, then P95.
pub fn synthesize<R: Rng + ?Sized>(
    row: &ResultRow,
    recipe: &SampleRecipe,
    rng: &mut R,
) -> Result<Vec<f64>, ReportError> {
    let mut samples = Vec::with_capacity(recipe.samples_per_row());
    let clusters = [
        (row.p50_latency_ms, recipe.p50_spread, recipe.p50_count),
        (row.p90_latency_ms, recipe.p90_spread, recipe.p90_count),
        (row.p95_latency_ms, recipe.p95_spread, recipe.p95_count),
    ];
    for (center, spread, count) in clusters {
        let normal = Normal::new(center, (center * spread).abs()).map_err(|e| {
            ReportError::Render(format!(
                "cannot sample around {center} ms for '{}': {e}",
                row.endpoint
            ))
        })?;
        samples.extend((0..count).map(|_| normal.sample(rng)));
    }
    Ok(samples)
}

/// Sample sets for every row, ordered by endpoint (first appearance) and then
/// by ascending concurrency.
pub fn synthesize_all<R: Rng + ?Sized>(
    dataset: &Dataset,
    aggregation: &Aggregation,
    recipe: &SampleRecipe,
    rng: &mut R,
) -> Result<Vec<SampleSet>, ReportError> {
    let mut sets = Vec::with_capacity(dataset.len());
    for group in &aggregation.groups {
        for &idx in &group.rows {
            let row = &dataset.rows[idx];
            sets.push(SampleSet {
                endpoint: group.endpoint.clone(),
                concurrency: row.concurrency,
                samples: synthesize(row, recipe, rng)?,
            });
        }
    }
    Ok(sets)
}

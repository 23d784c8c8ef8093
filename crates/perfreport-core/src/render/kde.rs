//! Gaussian kernel density outline used to draw violins.

use std::f64::consts::PI;

/// Silverman's rule-of-thumb bandwidth. Zero when the samples have no spread.
pub fn silverman_bandwidth(samples: &[f64]) -> f64 {
    let n = samples.len();
    if n < 2 {
        return 0.0;
    }
    let mean = samples.iter().sum::<f64>() / n as f64;
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    1.06 * variance.sqrt() * (n as f64).powf(-0.2)
}

/// Density at `steps + 1` evenly spaced heights spanning the samples plus
/// three bandwidths on each side, scaled so the widest point is 1.0.
///
/// Returns an empty outline when the samples are empty or have no spread.
pub fn density_profile(samples: &[f64], steps: usize) -> Vec<(f64, f64)> {
    let bw = silverman_bandwidth(samples);
    if bw <= 0.0 || !bw.is_finite() {
        return Vec::new();
    }

    let lo = samples.iter().copied().fold(f64::INFINITY, f64::min) - 3.0 * bw;
    let hi = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 3.0 * bw;
    let steps = steps.max(2);
    let norm = 1.0 / ((2.0 * PI).sqrt() * bw * samples.len() as f64);

    let mut profile: Vec<(f64, f64)> = (0..=steps)
        .map(|i| {
            let y = lo + (hi - lo) * i as f64 / steps as f64;
            let density = samples
                .iter()
                .map(|s| (-0.5 * ((y - s) / bw).powi(2)).exp())
                .sum::<f64>()
                * norm;
            (y, density)
        })
        .collect();

    let peak = profile.iter().map(|p| p.1).fold(0.0, f64::max);
    if peak > 0.0 {
        for p in &mut profile {
            p.1 /= peak;
        }
    }
    profile
}

/// Median of the samples, `None` when empty.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

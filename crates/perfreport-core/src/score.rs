use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::Headline;

/// Throughput and latency each contribute at most this many points.
pub const THROUGHPUT_CAP: f64 = 40.0;
pub const LATENCY_CAP: f64 = 40.0;
/// Success rate contributes at most this many points.
pub const SUCCESS_WEIGHT: f64 = 20.0;

pub const EXCELLENT_THRESHOLD: f64 = 70.0;
pub const GOOD_THRESHOLD: f64 = 50.0;

/// Qualitative band of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Excellent,
    Good,
    NeedsImprovement,
}

impl Tier {
    pub fn for_score(score: f64) -> Self {
        if score >= EXCELLENT_THRESHOLD {
            Tier::Excellent
        } else if score >= GOOD_THRESHOLD {
            Tier::Good
        } else {
            Tier::NeedsImprovement
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Excellent => "EXCELLENT",
            Tier::Good => "GOOD",
            Tier::NeedsImprovement => "NEEDS IMPROVEMENT",
        };
        write!(f, "{s}")
    }
}

/// Composite performance score with its breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoreCard {
    pub throughput: f64,
    pub latency: f64,
    pub success: f64,
    /// Sum of the three sub-scores, within [0, 100].
    pub composite: f64,
    pub tier: Tier,
}

impl ScoreCard {
    /// Score from the dataset-wide extrema.
    ///
    /// Throughput saturates at 400 req/s, latency reaches zero points at
    /// 400 ms, and success rate is linear up to 100 %.
    pub fn compute(max_throughput_rps: f64, min_mean_latency_ms: f64, mean_success_rate: f64) -> Self {
        let throughput = (max_throughput_rps / 10.0).min(THROUGHPUT_CAP);
        let latency = (LATENCY_CAP - min_mean_latency_ms / 10.0).max(0.0);
        let success = (mean_success_rate / 100.0) * SUCCESS_WEIGHT;
        let composite = throughput + latency + success;

        Self {
            throughput,
            latency,
            success,
            composite,
            tier: Tier::for_score(composite),
        }
    }

    pub fn from_headline(headline: &Headline) -> Self {
        Self::compute(
            headline.max_throughput_rps,
            headline.min_mean_latency_ms,
            headline.mean_success_rate,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn perfect_inputs_score_hundred() {
        let s = ScoreCard::compute(400.0, 0.0, 100.0);
        assert!(approx(s.composite, 100.0));
        assert_eq!(s.tier, Tier::Excellent);
    }

    #[test]
    fn throughput_saturates_at_forty() {
        assert!(approx(ScoreCard::compute(10_000.0, 0.0, 100.0).composite, 100.0));
        assert!(approx(ScoreCard::compute(450.0, 400.0, 0.0).throughput, 40.0));
    }

    #[test]
    fn latency_floors_at_zero() {
        assert!(approx(ScoreCard::compute(0.0, 400.0, 0.0).latency, 0.0));
        assert!(approx(ScoreCard::compute(0.0, 5_000.0, 0.0).latency, 0.0));
    }

    #[test]
    fn zero_contribution_from_every_term_scores_zero() {
        let s = ScoreCard::compute(0.0, 400.0, 0.0);
        assert!(approx(s.composite, 0.0));
        assert_eq!(s.tier, Tier::NeedsImprovement);
    }

    #[test]
    fn zero_latency_alone_earns_full_latency_points() {
        let s = ScoreCard::compute(0.0, 0.0, 0.0);
        assert!(approx(s.latency, 40.0));
        assert!(approx(s.composite, 40.0));
    }

    #[test]
    fn search_scenario_breakdown() {
        let s = ScoreCard::compute(450.0, 5.0, 97.0);
        assert!(approx(s.throughput, 40.0));
        assert!(approx(s.latency, 39.5));
        assert!(approx(s.success, 19.4));
        assert!(approx(s.composite, 40.0 + 39.5 + 19.4));
    }

    #[test]
    fn composite_stays_within_bounds() {
        for &tp in &[0.0, 1.0, 99.0, 400.0, 1e6] {
            for &lat in &[0.0, 3.0, 250.0, 400.0, 1e6] {
                for &sr in &[0.0, 42.0, 100.0] {
                    let s = ScoreCard::compute(tp, lat, sr);
                    assert!((0.0..=100.0).contains(&s.composite), "{tp} {lat} {sr}");
                }
            }
        }
    }

    #[test]
    fn tier_breakpoints() {
        assert_eq!(Tier::for_score(70.0), Tier::Excellent);
        assert_eq!(Tier::for_score(69.999), Tier::Good);
        assert_eq!(Tier::for_score(50.0), Tier::Good);
        assert_eq!(Tier::for_score(49.999), Tier::NeedsImprovement);
    }

    #[test]
    fn tier_display() {
        assert_eq!(Tier::Excellent.to_string(), "EXCELLENT");
        assert_eq!(Tier::NeedsImprovement.to_string(), "NEEDS IMPROVEMENT");
    }
}

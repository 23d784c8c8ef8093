use tracing::debug;

use crate::aggregate::Aggregation;
use crate::color::ColorAssignment;
use crate::config::{ReportStyle, Rgb};
use crate::dataset::Dataset;
use crate::error::ReportError;
use crate::render::{
    group_thousands, BarSeries, Canvas, Emphasis, GaugePanel, GroupedBarsPanel, LineSeriesPanel,
    PanelSlot, ScatterPanel, ScatterPoint, ScatterSeries, Series, StackedBarsPanel,
    TextBlockPanel, TextLine, Violin, ViolinPanel,
};
use crate::score::{ScoreCard, Tier};
use crate::synth::SampleSet;

/// Largest scatter marker radius, given to the highest concurrency level.
pub const MAX_MARKER_RADIUS: f64 = 18.0;

/// Mean success rate at or above which the gauge shows the favorable color.
pub const GAUGE_FAVORABLE: f64 = 95.0;
/// Mean success rate at or above which the gauge shows the intermediate color.
pub const GAUGE_INTERMEDIATE: f64 = 90.0;

const PERCENTILE_LABELS: [&str; 4] = ["P50", "P90", "P95", "P99"];

/// Builds the seven report panels from the aggregated data and draws them
/// onto a [`Canvas`].
pub struct PanelComposer<'a> {
    dataset: &'a Dataset,
    aggregation: &'a Aggregation,
    samples: &'a [SampleSet],
    score: &'a ScoreCard,
    colors: &'a ColorAssignment,
    style: &'a ReportStyle,
}

impl<'a> PanelComposer<'a> {
    pub fn new(
        dataset: &'a Dataset,
        aggregation: &'a Aggregation,
        samples: &'a [SampleSet],
        score: &'a ScoreCard,
        colors: &'a ColorAssignment,
        style: &'a ReportStyle,
    ) -> Self {
        Self {
            dataset,
            aggregation,
            samples,
            score,
            colors,
            style,
        }
    }

    /// Draw every panel. The first failure aborts the whole composition.
    pub fn compose(&self, canvas: &mut dyn Canvas) -> Result<(), ReportError> {
        canvas.draw_line_series(PanelSlot::THROUGHPUT, &self.throughput_panel()?)?;
        canvas.draw_grouped_bars(PanelSlot::LATENCY_PERCENTILES, &self.percentile_panel()?)?;
        canvas.draw_arc_gauge(PanelSlot::SUCCESS_GAUGE, &self.gauge_panel())?;
        canvas.draw_scatter(PanelSlot::LATENCY_SCATTER, &self.scatter_panel()?)?;
        canvas.draw_stacked_bars(PanelSlot::REQUEST_TOTALS, &self.totals_panel())?;
        canvas.draw_violin(PanelSlot::DISTRIBUTION, &self.distribution_panel()?)?;
        canvas.draw_text_block(PanelSlot::SCORECARD, &self.scorecard_panel())?;
        debug!(panels = PanelSlot::ALL.len(), "report panels composed");
        Ok(())
    }

    fn color(&self, endpoint: &str) -> Result<Rgb, ReportError> {
        self.colors
            .color_of(endpoint)
            .ok_or_else(|| ReportError::Render(format!("no color assigned to endpoint '{endpoint}'")))
    }

    pub fn throughput_panel(&self) -> Result<LineSeriesPanel, ReportError> {
        let series = self
            .aggregation
            .groups
            .iter()
            .map(|g| {
                self.color(&g.endpoint).map(|color| Series {
                    label: g.endpoint.clone(),
                    color,
                    points: g
                        .rows
                        .iter()
                        .map(|&i| {
                            let r = &self.dataset.rows[i];
                            (r.concurrency as f64, r.throughput_rps)
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        Ok(LineSeriesPanel {
            title: "Throughput vs Concurrency".to_string(),
            x_label: "Concurrent clients".to_string(),
            y_label: "Throughput (req/s)".to_string(),
            series,
        })
    }

    /// Percentiles at each endpoint's max-load row, one bar per endpoint in
    /// every percentile group.
    pub fn percentile_panel(&self) -> Result<GroupedBarsPanel, ReportError> {
        let groups = self
            .aggregation
            .groups
            .iter()
            .map(|g| {
                let row = &self.dataset.rows[g.max_load_row];
                self.color(&g.endpoint).map(|color| BarSeries {
                    label: format!("{} @{}", g.endpoint, row.concurrency),
                    color,
                    values: row.percentiles().to_vec(),
                })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        Ok(GroupedBarsPanel {
            title: "Latency Percentiles at Max Load".to_string(),
            y_label: "Latency (ms)".to_string(),
            categories: PERCENTILE_LABELS.iter().map(|s| s.to_string()).collect(),
            groups,
        })
    }

    pub fn gauge_panel(&self) -> GaugePanel {
        let rate = self.aggregation.headline.mean_success_rate;
        GaugePanel {
            title: "Overall Success Rate".to_string(),
            value: rate,
            max: 100.0,
            color: success_band_color(rate, self.style),
            track_color: Rgb(0xe0, 0xe0, 0xe0),
            caption: format!("{rate:.1}%"),
        }
    }

    /// Mean vs P95 latency per row, marker radius proportional to
    /// concurrency.
    pub fn scatter_panel(&self) -> Result<ScatterPanel, ReportError> {
        let max_concurrency = self
            .dataset
            .rows
            .iter()
            .map(|r| r.concurrency)
            .max()
            .unwrap_or(1)
            .max(1) as f64;

        let series = self
            .aggregation
            .groups
            .iter()
            .map(|g| {
                self.color(&g.endpoint).map(|color| ScatterSeries {
                    label: g.endpoint.clone(),
                    color,
                    points: g
                        .rows
                        .iter()
                        .map(|&i| {
                            let r = &self.dataset.rows[i];
                            ScatterPoint {
                                x: r.mean_latency_ms,
                                y: r.p95_latency_ms,
                                radius: MAX_MARKER_RADIUS * r.concurrency as f64 / max_concurrency,
                            }
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        Ok(ScatterPanel {
            title: "Mean vs P95 Latency".to_string(),
            x_label: "Mean latency (ms)".to_string(),
            y_label: "P95 latency (ms)".to_string(),
            series,
        })
    }

    pub fn totals_panel(&self) -> StackedBarsPanel {
        let groups = &self.aggregation.groups;
        StackedBarsPanel {
            title: "Request Totals".to_string(),
            y_label: "Requests".to_string(),
            categories: groups.iter().map(|g| g.endpoint.clone()).collect(),
            layers: vec![
                BarSeries {
                    label: "Successful".to_string(),
                    color: self.style.success_color,
                    values: groups.iter().map(|g| g.successful_requests as f64).collect(),
                },
                BarSeries {
                    label: "Failed".to_string(),
                    color: self.style.failure_color,
                    values: groups.iter().map(|g| g.failed_requests as f64).collect(),
                },
            ],
        }
    }

    pub fn distribution_panel(&self) -> Result<ViolinPanel, ReportError> {
        let violins = self
            .samples
            .iter()
            .map(|set| {
                self.color(&set.endpoint).map(|color| Violin {
                    label: set.label(),
                    color,
                    samples: set.samples.clone(),
                })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        Ok(ViolinPanel {
            title: "Latency Distribution (synthetic, from percentiles)".to_string(),
            y_label: "Latency (ms)".to_string(),
            violins,
        })
    }

    pub fn scorecard_panel(&self) -> TextBlockPanel {
        let h = &self.aggregation.headline;
        let s = self.score;
        TextBlockPanel {
            title: "Performance Score".to_string(),
            background: tier_color(s.tier, self.style).lighten(0.75),
            lines: vec![
                TextLine::new(format!("{:.0}/100", s.composite), Emphasis::Heading),
                TextLine::new(s.tier.to_string(), Emphasis::Strong),
                TextLine::new(
                    format!("Max throughput: {:.1} req/s", h.max_throughput_rps),
                    Emphasis::Body,
                ),
                TextLine::new(
                    format!("Best mean latency: {:.1} ms", h.min_mean_latency_ms),
                    Emphasis::Body,
                ),
                TextLine::new(
                    format!("Mean success rate: {:.1}%", h.mean_success_rate),
                    Emphasis::Body,
                ),
                TextLine::new(
                    format!("Total requests: {}", group_thousands(h.total_requests)),
                    Emphasis::Body,
                ),
            ],
        }
    }
}

/// Gauge color for a mean success rate.
pub fn success_band_color(rate: f64, style: &ReportStyle) -> Rgb {
    if rate >= GAUGE_FAVORABLE {
        style.favorable_color
    } else if rate >= GAUGE_INTERMEDIATE {
        style.intermediate_color
    } else {
        style.poor_color
    }
}

pub fn tier_color(tier: Tier, style: &ReportStyle) -> Rgb {
    match tier {
        Tier::Excellent => style.favorable_color,
        Tier::Good => style.intermediate_color,
        Tier::NeedsImprovement => style.poor_color,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::dataset::fixtures::row;
    use crate::dataset::ResultRow;
    use crate::synth::{synthesize_all, SampleRecipe};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Records every draw call instead of rendering.
    #[derive(Default)]
    struct RecordingCanvas {
        calls: Vec<(&'static str, PanelSlot)>,
        fail_on: Option<&'static str>,
    }

    impl RecordingCanvas {
        fn record(&mut self, kind: &'static str, slot: PanelSlot) -> Result<(), ReportError> {
            if self.fail_on == Some(kind) {
                return Err(ReportError::Render(format!("{kind} failed")));
            }
            self.calls.push((kind, slot));
            Ok(())
        }
    }

    impl Canvas for RecordingCanvas {
        fn draw_line_series(&mut self, slot: PanelSlot, _: &LineSeriesPanel) -> Result<(), ReportError> {
            self.record("line", slot)
        }
        fn draw_grouped_bars(&mut self, slot: PanelSlot, _: &GroupedBarsPanel) -> Result<(), ReportError> {
            self.record("grouped", slot)
        }
        fn draw_stacked_bars(&mut self, slot: PanelSlot, _: &StackedBarsPanel) -> Result<(), ReportError> {
            self.record("stacked", slot)
        }
        fn draw_scatter(&mut self, slot: PanelSlot, _: &ScatterPanel) -> Result<(), ReportError> {
            self.record("scatter", slot)
        }
        fn draw_arc_gauge(&mut self, slot: PanelSlot, _: &GaugePanel) -> Result<(), ReportError> {
            self.record("gauge", slot)
        }
        fn draw_violin(&mut self, slot: PanelSlot, _: &ViolinPanel) -> Result<(), ReportError> {
            self.record("violin", slot)
        }
        fn draw_text_block(&mut self, slot: PanelSlot, _: &TextBlockPanel) -> Result<(), ReportError> {
            self.record("text", slot)
        }
    }

    struct Fixture {
        dataset: Dataset,
        aggregation: Aggregation,
        samples: Vec<SampleSet>,
        score: ScoreCard,
        colors: ColorAssignment,
        style: ReportStyle,
    }

    impl Fixture {
        fn new(rows: Vec<ResultRow>) -> Self {
            let dataset = Dataset::new("test", rows);
            let aggregation = aggregate(&dataset).unwrap();
            let mut rng = StdRng::seed_from_u64(11);
            let samples =
                synthesize_all(&dataset, &aggregation, &SampleRecipe::default(), &mut rng).unwrap();
            let score = ScoreCard::from_headline(&aggregation.headline);
            let style = ReportStyle::default();
            let colors = ColorAssignment::from_aggregation(&aggregation, &style.palette).unwrap();
            Self {
                dataset,
                aggregation,
                samples,
                score,
                colors,
                style,
            }
        }

        fn composer(&self) -> PanelComposer<'_> {
            PanelComposer::new(
                &self.dataset,
                &self.aggregation,
                &self.samples,
                &self.score,
                &self.colors,
                &self.style,
            )
        }
    }

    fn two_endpoints() -> Fixture {
        let mut rows = vec![
            row("search", 10, 400.0, 50.0),
            row("login", 1, 20.0, 10.0),
            row("search", 1, 50.0, 200.0),
            row("login", 8, 60.0, 14.0),
            row("search", 100, 450.0, 5.0),
        ];
        rows[1].failed_requests = 7;
        rows[3].successful_requests = 400;
        Fixture::new(rows)
    }

    #[test]
    fn compose_draws_all_seven_panels_in_their_slots() {
        let fx = two_endpoints();
        let mut canvas = RecordingCanvas::default();
        fx.composer().compose(&mut canvas).unwrap();
        assert_eq!(
            canvas.calls,
            vec![
                ("line", PanelSlot::THROUGHPUT),
                ("grouped", PanelSlot::LATENCY_PERCENTILES),
                ("gauge", PanelSlot::SUCCESS_GAUGE),
                ("scatter", PanelSlot::LATENCY_SCATTER),
                ("stacked", PanelSlot::REQUEST_TOTALS),
                ("violin", PanelSlot::DISTRIBUTION),
                ("text", PanelSlot::SCORECARD),
            ]
        );
    }

    #[test]
    fn panel_failure_aborts_composition() {
        let fx = two_endpoints();
        let mut canvas = RecordingCanvas {
            fail_on: Some("scatter"),
            ..RecordingCanvas::default()
        };
        let result = fx.composer().compose(&mut canvas);
        assert!(matches!(result, Err(ReportError::Render(_))));
        assert_eq!(canvas.calls.len(), 3);
    }

    #[test]
    fn throughput_lines_are_per_endpoint_in_concurrency_order() {
        let fx = two_endpoints();
        let panel = fx.composer().throughput_panel().unwrap();
        assert_eq!(panel.series.len(), 2);
        assert_eq!(panel.series[0].label, "search");
        assert_eq!(
            panel.series[0].points,
            vec![(1.0, 50.0), (10.0, 400.0), (100.0, 450.0)]
        );
        assert_eq!(panel.series[1].points, vec![(1.0, 20.0), (8.0, 60.0)]);
    }

    #[test]
    fn endpoint_colors_are_consistent_across_panels() {
        let fx = two_endpoints();
        let composer = fx.composer();
        let search = fx.colors.color_of("search").unwrap();
        let login = fx.colors.color_of("login").unwrap();
        assert_eq!(search, fx.style.palette[0]);
        assert_eq!(login, fx.style.palette[1]);

        let lines = composer.throughput_panel().unwrap();
        let bars = composer.percentile_panel().unwrap();
        let scatter = composer.scatter_panel().unwrap();
        assert_eq!(lines.series[0].color, search);
        assert_eq!(bars.groups[0].color, search);
        assert_eq!(scatter.series[1].color, login);

        let violins = composer.distribution_panel().unwrap();
        for v in &violins.violins {
            let expected = if v.label.starts_with("search") { search } else { login };
            assert_eq!(v.color, expected);
        }
    }

    #[test]
    fn percentile_bars_use_max_load_rows() {
        let fx = two_endpoints();
        let panel = fx.composer().percentile_panel().unwrap();
        assert_eq!(panel.categories, vec!["P50", "P90", "P95", "P99"]);
        let expected = fx.dataset.rows[4].percentiles().to_vec();
        assert_eq!(panel.groups[0].values, expected);
        assert_eq!(panel.groups[0].label, "search @100");
        assert_eq!(panel.groups[1].label, "login @8");
    }

    #[test]
    fn scatter_radius_is_proportional_to_concurrency() {
        let fx = two_endpoints();
        let panel = fx.composer().scatter_panel().unwrap();
        let search = &panel.series[0].points;
        assert_eq!(search.len(), 3);
        assert!((search[2].radius - MAX_MARKER_RADIUS).abs() < 1e-12);
        assert!((search[1].radius - MAX_MARKER_RADIUS * 0.1).abs() < 1e-12);
        assert_eq!(search[0].x, fx.dataset.rows[2].mean_latency_ms);
        assert_eq!(search[0].y, fx.dataset.rows[2].p95_latency_ms);
    }

    #[test]
    fn stacked_totals_match_headline_total() {
        let fx = two_endpoints();
        let panel = fx.composer().totals_panel();
        assert_eq!(panel.categories, vec!["search", "login"]);
        let stacked_total: f64 = panel.layers.iter().flat_map(|l| l.values.iter()).sum();
        assert_eq!(stacked_total as u64, fx.aggregation.headline.total_requests);
        assert_eq!(panel.layers[1].values, vec![0.0, 7.0]);
    }

    #[test]
    fn violins_follow_endpoint_then_concurrency_order() {
        let fx = two_endpoints();
        let panel = fx.composer().distribution_panel().unwrap();
        let labels: Vec<&str> = panel.violins.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["search@1", "search@10", "search@100", "login@1", "login@8"]
        );
    }

    #[test]
    fn gauge_color_thresholds() {
        let style = ReportStyle::default();
        assert_eq!(success_band_color(95.0, &style), style.favorable_color);
        assert_eq!(success_band_color(94.9, &style), style.intermediate_color);
        assert_eq!(success_band_color(90.0, &style), style.intermediate_color);
        assert_eq!(success_band_color(89.9, &style), style.poor_color);
    }

    #[test]
    fn gauge_shows_mean_success_rate() {
        let mut rows = vec![row("a", 1, 1.0, 1.0), row("a", 2, 1.0, 1.0)];
        rows[0].success_rate = 90.0;
        rows[1].success_rate = 80.0;
        let fx = Fixture::new(rows);
        let gauge = fx.composer().gauge_panel();
        assert_eq!(gauge.value, 85.0);
        assert_eq!(gauge.caption, "85.0%");
        assert_eq!(gauge.color, fx.style.poor_color);
    }

    #[test]
    fn scorecard_lists_score_tier_and_headline_numbers() {
        let fx = two_endpoints();
        let card = fx.composer().scorecard_panel();
        let texts: Vec<&str> = card.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts[0], format!("{:.0}/100", fx.score.composite));
        assert_eq!(texts[1], fx.score.tier.to_string());
        assert_eq!(texts[2], "Max throughput: 450.0 req/s");
        assert_eq!(texts[3], "Best mean latency: 5.0 ms");
        assert_eq!(texts[4], "Mean success rate: 100.0%");
        assert_eq!(fx.aggregation.headline.total_requests, 4407);
        assert_eq!(texts[5], "Total requests: 4,407");
        assert_eq!(
            card.background,
            tier_color(fx.score.tier, &fx.style).lighten(0.75)
        );
    }
}

//! Panel descriptions and the drawing capability the composer renders
//! through.
//!
//! Panels are plain data: every number and color a panel shows is decided by
//! the [`composer`], so a [`Canvas`] implementation only has to draw. The SVG
//! implementation lives in [`svg`].

pub mod composer;
pub mod kde;
pub mod layout;
pub mod svg;

use std::f64::consts::PI;

use crate::config::Rgb;
use crate::error::ReportError;

pub use composer::PanelComposer;
pub use layout::{GridLayout, PanelSlot, Rect};
pub use svg::SvgCanvas;

// ---------------------------------------------------------------------------
// Panel descriptions
// ---------------------------------------------------------------------------

/// One named line with its points, already in x order.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: Rgb,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSeriesPanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

/// Bars of one color, one value per category.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub label: String,
    pub color: Rgb,
    pub values: Vec<f64>,
}

/// Side-by-side bars per category.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedBarsPanel {
    pub title: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub groups: Vec<BarSeries>,
}

/// A value label centred on one non-empty stacked segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLabel {
    pub category: usize,
    pub layer: usize,
    /// Vertical centre of the segment.
    pub y: f64,
    pub value: f64,
}

/// Bars stacked bottom-up in layer order, one stack per category.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedBarsPanel {
    pub title: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub layers: Vec<BarSeries>,
}

impl StackedBarsPanel {
    /// Height of the tallest stack.
    pub fn max_stack(&self) -> f64 {
        (0..self.categories.len())
            .map(|c| self.layers.iter().map(|l| l.values[c]).sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// Labels for every segment with a non-zero value.
    pub fn value_labels(&self) -> Vec<SegmentLabel> {
        let mut labels = Vec::new();
        for category in 0..self.categories.len() {
            let mut base = 0.0;
            for (layer, series) in self.layers.iter().enumerate() {
                let value = series.values[category];
                if value > 0.0 {
                    labels.push(SegmentLabel {
                        category,
                        layer,
                        y: base + value / 2.0,
                        value,
                    });
                }
                base += value;
            }
        }
        labels
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    /// Marker radius in pixels.
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub label: String,
    pub color: Rgb,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ScatterSeries>,
}

/// Semicircular gauge filled from the left up to `value / max`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugePanel {
    pub title: String,
    pub value: f64,
    pub max: f64,
    pub color: Rgb,
    pub track_color: Rgb,
    pub caption: String,
}

impl GaugePanel {
    pub fn fraction(&self) -> f64 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.value / self.max).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violin {
    pub label: String,
    pub color: Rgb,
    pub samples: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViolinPanel {
    pub title: String,
    pub y_label: String,
    pub violins: Vec<Violin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Heading,
    Strong,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub emphasis: Emphasis,
}

impl TextLine {
    pub fn new(text: impl Into<String>, emphasis: Emphasis) -> Self {
        Self {
            text: text.into(),
            emphasis,
        }
    }
}

/// A chart-less panel of centred text lines on a solid background.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlockPanel {
    pub title: String,
    pub background: Rgb,
    pub lines: Vec<TextLine>,
}

// ---------------------------------------------------------------------------
// Canvas: the drawing capability
// ---------------------------------------------------------------------------

/// Drawing primitives needed by the report, one per panel kind.
///
/// Implementations draw each panel into the grid cell named by `slot`.
pub trait Canvas {
    fn draw_line_series(&mut self, slot: PanelSlot, panel: &LineSeriesPanel) -> Result<(), ReportError>;

    fn draw_grouped_bars(&mut self, slot: PanelSlot, panel: &GroupedBarsPanel) -> Result<(), ReportError>;

    fn draw_stacked_bars(&mut self, slot: PanelSlot, panel: &StackedBarsPanel) -> Result<(), ReportError>;

    fn draw_scatter(&mut self, slot: PanelSlot, panel: &ScatterPanel) -> Result<(), ReportError>;

    fn draw_arc_gauge(&mut self, slot: PanelSlot, panel: &GaugePanel) -> Result<(), ReportError>;

    fn draw_violin(&mut self, slot: PanelSlot, panel: &ViolinPanel) -> Result<(), ReportError>;

    fn draw_text_block(&mut self, slot: PanelSlot, panel: &TextBlockPanel) -> Result<(), ReportError>;
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// Closed outline of a ring segment around the origin.
///
/// Angles are in radians, measured counter-clockwise from the positive x
/// axis; a semicircular gauge runs from `PI` (left) to `0` (right).
pub fn arc_band(start: f64, end: f64, inner: f64, outer: f64, steps: usize) -> Vec<(f64, f64)> {
    let steps = steps.max(1);
    let angle = |i: usize| start + (end - start) * i as f64 / steps as f64;
    let mut points = Vec::with_capacity(2 * (steps + 1));
    for i in 0..=steps {
        let a = angle(i);
        points.push((outer * a.cos(), outer * a.sin()));
    }
    for i in (0..=steps).rev() {
        let a = angle(i);
        points.push((inner * a.cos(), inner * a.sin()));
    }
    points
}

/// Gauge end angle for a fill fraction in [0, 1].
pub fn gauge_angle(fraction: f64) -> f64 {
    PI * (1.0 - fraction.clamp(0.0, 1.0))
}

/// Integer with `,` between groups of three digits, e.g. `12,345`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Label for an f64 tick that falls on a category index, empty otherwise.
pub fn category_label(categories: &[String], position: f64) -> String {
    let idx = position.round();
    if (position - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

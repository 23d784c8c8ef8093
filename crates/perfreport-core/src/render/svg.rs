use std::f64::consts::PI;
use std::iter;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::{ReportStyle, Rgb};
use crate::error::ReportError;
use crate::render::kde::{density_profile, median};
use crate::render::{
    arc_band, category_label, gauge_angle, group_thousands, Canvas, Emphasis, GaugePanel,
    GridLayout, GroupedBarsPanel, LineSeriesPanel, PanelSlot, ScatterPanel, StackedBarsPanel,
    TextBlockPanel, ViolinPanel,
};

/// Share of a category slot covered by its bars.
const BAR_SPAN: f64 = 0.8;
const STACK_HALF_WIDTH: f64 = 0.3;
const VIOLIN_HALF_WIDTH: f64 = 0.4;
const VIOLIN_STEPS: usize = 60;
const GAUGE_INNER: f64 = 0.62;
const GAUGE_OUTER: f64 = 1.0;
const GAUGE_STEPS: usize = 90;

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

/// Upper bound of a value axis starting at zero.
fn upper(max: f64) -> f64 {
    if max.is_finite() && max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn centered() -> Pos {
    Pos::new(HPos::Center, VPos::Center)
}

/// [`Canvas`] that renders the report into an in-memory SVG document.
///
/// Nothing is written to disk here; the caller decides what to do with the
/// buffer once [`SvgCanvas::finish`] succeeds.
pub struct SvgCanvas<'a> {
    root: DrawingArea<SVGBackend<'a>, Shift>,
    layout: GridLayout,
    style: &'a ReportStyle,
}

impl<'a> SvgCanvas<'a> {
    pub fn new(buffer: &'a mut String, style: &'a ReportStyle, title: &str) -> Result<Self, ReportError> {
        let root = SVGBackend::with_string(buffer, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE).map_err(ReportError::render)?;

        let layout = GridLayout::new(style.width, style.height);
        let title_style = TextStyle::from(
            (style.font_family.as_str(), style.figure_title_size, FontStyle::Bold).into_font(),
        )
        .pos(centered());
        root.draw_text(
            title,
            &title_style,
            (style.width as i32 / 2, layout.title_band() / 2),
        )
        .map_err(ReportError::render)?;

        Ok(Self { root, layout, style })
    }

    /// Flush the document into the buffer.
    pub fn finish(self) -> Result<(), ReportError> {
        self.root.present().map_err(ReportError::render)
    }

    fn area(&self, slot: PanelSlot) -> DrawingArea<SVGBackend<'a>, Shift> {
        let r = self.layout.cell_rect(slot);
        self.root.clone().shrink((r.x, r.y), (r.width, r.height))
    }

    fn font(&self, size: u32) -> TextStyle<'a> {
        TextStyle::from((self.style.font_family.as_str(), size).into_font())
    }

    fn bold(&self, size: u32) -> TextStyle<'a> {
        TextStyle::from((self.style.font_family.as_str(), size, FontStyle::Bold).into_font())
    }
}

impl Canvas for SvgCanvas<'_> {
    fn draw_line_series(&mut self, slot: PanelSlot, panel: &LineSeriesPanel) -> Result<(), ReportError> {
        let area = self.area(slot);
        let points = || panel.series.iter().flat_map(|s| s.points.iter());
        let x_max = points().map(|p| p.0).fold(0.0, f64::max);
        let y_max = points().map(|p| p.1).fold(0.0, f64::max);

        let mut chart = ChartBuilder::on(&area)
            .caption(panel.title.as_str(), self.bold(self.style.title_size))
            .margin(12)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..upper(x_max), 0f64..upper(y_max))
            .map_err(ReportError::render)?;

        chart
            .configure_mesh()
            .x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .label_style(self.font(self.style.value_size))
            .axis_desc_style(self.font(self.style.label_size))
            .draw()
            .map_err(ReportError::render)?;

        for series in &panel.series {
            let color = rgb(series.color);
            chart
                .draw_series(LineSeries::new(series.points.iter().copied(), color.stroke_width(3)))
                .map_err(ReportError::render)?
                .label(series.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
            chart
                .draw_series(series.points.iter().map(|&p| Circle::new(p, 5, color.filled())))
                .map_err(ReportError::render)?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .label_font(self.font(self.style.value_size))
            .draw()
            .map_err(ReportError::render)?;
        Ok(())
    }

    fn draw_grouped_bars(&mut self, slot: PanelSlot, panel: &GroupedBarsPanel) -> Result<(), ReportError> {
        let area = self.area(slot);
        let n_categories = panel.categories.len().max(1);
        let bar_width = BAR_SPAN / panel.groups.len().max(1) as f64;
        let y_max = panel
            .groups
            .iter()
            .flat_map(|g| g.values.iter().copied())
            .fold(0.0, f64::max);
        let categories = &panel.categories;
        let x_formatter = |x: &f64| category_label(categories, *x);

        let mut chart = ChartBuilder::on(&area)
            .caption(panel.title.as_str(), self.bold(self.style.title_size))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5f64..(n_categories as f64 - 0.5), 0f64..upper(y_max))
            .map_err(ReportError::render)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n_categories)
            .x_label_formatter(&x_formatter)
            .y_desc(panel.y_label.as_str())
            .label_style(self.font(self.style.value_size))
            .axis_desc_style(self.font(self.style.label_size))
            .draw()
            .map_err(ReportError::render)?;

        for (g, series) in panel.groups.iter().enumerate() {
            let color = rgb(series.color);
            let offset = -BAR_SPAN / 2.0 + bar_width * g as f64;
            chart
                .draw_series(series.values.iter().enumerate().map(|(c, &v)| {
                    let x0 = c as f64 + offset;
                    Rectangle::new([(x0, 0.0), (x0 + bar_width, v)], color.filled())
                }))
                .map_err(ReportError::render)?
                .label(series.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .label_font(self.font(self.style.value_size))
            .draw()
            .map_err(ReportError::render)?;
        Ok(())
    }

    fn draw_stacked_bars(&mut self, slot: PanelSlot, panel: &StackedBarsPanel) -> Result<(), ReportError> {
        let area = self.area(slot);
        let n_categories = panel.categories.len().max(1);
        let categories = &panel.categories;
        let x_formatter = |x: &f64| category_label(categories, *x);

        let mut chart = ChartBuilder::on(&area)
            .caption(panel.title.as_str(), self.bold(self.style.title_size))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(
                -0.5f64..(n_categories as f64 - 0.5),
                0f64..upper(panel.max_stack()),
            )
            .map_err(ReportError::render)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n_categories)
            .x_label_formatter(&x_formatter)
            .y_desc(panel.y_label.as_str())
            .label_style(self.font(self.style.value_size))
            .axis_desc_style(self.font(self.style.label_size))
            .draw()
            .map_err(ReportError::render)?;

        let mut bases = vec![0.0; panel.categories.len()];
        for series in &panel.layers {
            let color = rgb(series.color);
            let bars: Vec<_> = series
                .values
                .iter()
                .enumerate()
                .map(|(c, &v)| {
                    let x = c as f64;
                    Rectangle::new(
                        [(x - STACK_HALF_WIDTH, bases[c]), (x + STACK_HALF_WIDTH, bases[c] + v)],
                        color.filled(),
                    )
                })
                .collect();
            for (base, v) in bases.iter_mut().zip(&series.values) {
                *base += v;
            }
            chart
                .draw_series(bars)
                .map_err(ReportError::render)?
                .label(series.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
        }

        let value_style = self.bold(self.style.value_size).pos(centered());
        chart
            .draw_series(panel.value_labels().into_iter().map(|l| {
                Text::new(
                    group_thousands(l.value.round() as u64),
                    (l.category as f64, l.y),
                    value_style.clone(),
                )
            }))
            .map_err(ReportError::render)?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .label_font(self.font(self.style.value_size))
            .draw()
            .map_err(ReportError::render)?;
        Ok(())
    }

    fn draw_scatter(&mut self, slot: PanelSlot, panel: &ScatterPanel) -> Result<(), ReportError> {
        let area = self.area(slot);
        let points = || panel.series.iter().flat_map(|s| s.points.iter());
        let x_max = points().map(|p| p.x).fold(0.0, f64::max);
        let y_max = points().map(|p| p.y).fold(0.0, f64::max);

        let mut chart = ChartBuilder::on(&area)
            .caption(panel.title.as_str(), self.bold(self.style.title_size))
            .margin(12)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..upper(x_max), 0f64..upper(y_max))
            .map_err(ReportError::render)?;

        chart
            .configure_mesh()
            .x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .label_style(self.font(self.style.value_size))
            .axis_desc_style(self.font(self.style.label_size))
            .draw()
            .map_err(ReportError::render)?;

        for series in &panel.series {
            let color = rgb(series.color);
            chart
                .draw_series(series.points.iter().map(|p| {
                    Circle::new((p.x, p.y), p.radius.max(2.0).round() as i32, color.mix(0.6).filled())
                }))
                .map_err(ReportError::render)?
                .label(series.label.as_str())
                .legend(move |(x, y)| Circle::new((x + 6, y), 5, color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .label_font(self.font(self.style.value_size))
            .draw()
            .map_err(ReportError::render)?;
        Ok(())
    }

    fn draw_arc_gauge(&mut self, slot: PanelSlot, panel: &GaugePanel) -> Result<(), ReportError> {
        let area = self.area(slot);
        let mut chart = ChartBuilder::on(&area)
            .caption(panel.title.as_str(), self.bold(self.style.title_size))
            .margin(20)
            .build_cartesian_2d(-1.25f64..1.25, -0.45f64..1.15)
            .map_err(ReportError::render)?;

        let track = arc_band(PI, 0.0, GAUGE_INNER, GAUGE_OUTER, GAUGE_STEPS);
        chart
            .draw_series(iter::once(Polygon::new(track, rgb(panel.track_color).filled())))
            .map_err(ReportError::render)?;

        let fraction = panel.fraction();
        if fraction > 0.0 {
            let steps = ((GAUGE_STEPS as f64 * fraction).ceil() as usize).max(1);
            let fill = arc_band(PI, gauge_angle(fraction), GAUGE_INNER, GAUGE_OUTER, steps);
            chart
                .draw_series(iter::once(Polygon::new(fill, rgb(panel.color).filled())))
                .map_err(ReportError::render)?;
        }

        let value_color = rgb(panel.color);
        let value_style = self
            .bold(self.style.figure_title_size + 10)
            .color(&value_color)
            .pos(centered());
        let scale_style = self.font(self.style.label_size).pos(centered());
        let mid = (GAUGE_INNER + GAUGE_OUTER) / 2.0;
        chart
            .draw_series([
                Text::new(panel.caption.clone(), (0.0, 0.2), value_style),
                Text::new("0".to_string(), (-mid, -0.12), scale_style.clone()),
                Text::new(format!("{:.0}", panel.max), (mid, -0.12), scale_style),
            ])
            .map_err(ReportError::render)?;
        Ok(())
    }

    fn draw_violin(&mut self, slot: PanelSlot, panel: &ViolinPanel) -> Result<(), ReportError> {
        let area = self.area(slot);
        let n = panel.violins.len().max(1);
        let y_max = panel
            .violins
            .iter()
            .flat_map(|v| v.samples.iter().copied())
            .fold(0.0, f64::max);
        let labels: Vec<String> = panel.violins.iter().map(|v| v.label.clone()).collect();
        let x_formatter = |x: &f64| category_label(&labels, *x);

        let mut chart = ChartBuilder::on(&area)
            .caption(panel.title.as_str(), self.bold(self.style.title_size))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..upper(y_max))
            .map_err(ReportError::render)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&x_formatter)
            .y_desc(panel.y_label.as_str())
            .label_style(self.font(self.style.value_size))
            .axis_desc_style(self.font(self.style.label_size))
            .draw()
            .map_err(ReportError::render)?;

        for (i, violin) in panel.violins.iter().enumerate() {
            let color = rgb(violin.color);
            let center = i as f64;
            let profile = density_profile(&violin.samples, VIOLIN_STEPS);

            if !profile.is_empty() {
                let mut outline: Vec<(f64, f64)> = profile
                    .iter()
                    .map(|&(y, w)| (center + w * VIOLIN_HALF_WIDTH, y.max(0.0)))
                    .collect();
                outline.extend(
                    profile
                        .iter()
                        .rev()
                        .map(|&(y, w)| (center - w * VIOLIN_HALF_WIDTH, y.max(0.0))),
                );
                let mut border = outline.clone();
                border.push(outline[0]);
                chart
                    .draw_series(iter::once(Polygon::new(outline, color.mix(0.45).filled())))
                    .map_err(ReportError::render)?;
                chart
                    .draw_series(iter::once(PathElement::new(border, color.stroke_width(1))))
                    .map_err(ReportError::render)?;
            }

            // Median tick; also the only mark for a sample set without spread.
            if let Some(m) = median(&violin.samples) {
                let half = if profile.is_empty() { VIOLIN_HALF_WIDTH } else { VIOLIN_HALF_WIDTH / 2.0 };
                chart
                    .draw_series(iter::once(PathElement::new(
                        vec![(center - half, m), (center + half, m)],
                        BLACK.stroke_width(2),
                    )))
                    .map_err(ReportError::render)?;
            }
        }
        Ok(())
    }

    fn draw_text_block(&mut self, slot: PanelSlot, panel: &TextBlockPanel) -> Result<(), ReportError> {
        let area = self.area(slot);
        area.fill(&rgb(panel.background)).map_err(ReportError::render)?;

        let (w, h) = area.dim_in_pixel();
        let (w, h) = (w as i32, h as i32);
        area.draw(&Rectangle::new([(1, 1), (w - 2, h - 2)], BLACK.mix(0.4).stroke_width(2)))
            .map_err(ReportError::render)?;

        let cx = w / 2;
        area.draw_text(
            &panel.title,
            &self.bold(self.style.title_size).pos(centered()),
            (cx, h / 8),
        )
        .map_err(ReportError::render)?;

        // Remaining lines share the space below the title evenly.
        let top = h / 4;
        let step = (h - top) / (panel.lines.len() as i32 + 1).max(1);
        for (i, line) in panel.lines.iter().enumerate() {
            let style = match line.emphasis {
                Emphasis::Heading => self.bold(self.style.figure_title_size + 14),
                Emphasis::Strong => self.bold(self.style.title_size + 4),
                Emphasis::Body => self.font(self.style.label_size + 3),
            };
            area.draw_text(&line.text, &style.pos(centered()), (cx, top + step * i as i32 + step / 2))
                .map_err(ReportError::render)?;
        }
        Ok(())
    }
}

//! Plotters-rendered monthly trend chart for the Analytics page.
//!
//! Drawn into the Ratatui buffer through `plotters-ratatui-backend`; series
//! and bounds are computed by the caller.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::metrics::Trend;

pub struct TrendChart<'a> {
    /// `YYYY-MM` per point; the x value is the index into this slice.
    pub months: &'a [String],
    pub values: &'a [f64],
    pub trend: Option<Trend>,
    pub y_bounds: [f64; 2],
    pub y_label: &'a str,
}

impl<'a> TrendChart<'a> {
    pub fn new(months: &'a [String], values: &'a [f64], trend: Option<Trend>, y_label: &'a str) -> Self {
        Self {
            months,
            values,
            trend,
            y_bounds: y_bounds(values, trend),
            y_label,
        }
    }

    fn x_max(&self) -> f64 {
        (self.months.len().max(2) - 1) as f64
    }
}

/// Padded value range covering the points and both ends of the trend line.
pub fn y_bounds(values: &[f64], trend: Option<Trend>) -> [f64; 2] {
    let x_max = (values.len().max(2) - 1) as f64;
    let ends = trend.map(|t| [t.at(0.0), t.at(x_max)]);

    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.iter().chain(ends.iter().flatten()).copied().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi - lo < 1.0 {
        lo -= 0.5;
        hi += 0.5;
    }
    let pad = (hi - lo) * 0.1;
    [lo - pad, hi + pad]
}

impl Widget for TrendChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }
        let [y0, y1] = self.y_bounds;
        if self.values.is_empty() || !(y0.is_finite() && y1.is_finite()) || y1 <= y0 {
            return;
        }
        let x1 = self.x_max();

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(0.0..x1, y0..y1)?;

            let month_label = |x: &f64| {
                let idx = x.round();
                if idx < 0.0 || (x - idx).abs() > 0.01 {
                    return String::new();
                }
                self.months.get(idx as usize).cloned().unwrap_or_default()
            };

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(self.y_label)
                .x_labels(self.months.len().clamp(2, 6))
                .y_labels(5)
                .x_label_formatter(&month_label)
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            if let Some(trend) = self.trend {
                let line_color = RGBColor(255, 200, 0);
                chart.draw_series(LineSeries::new(
                    [(0.0, trend.at(0.0)), (x1, trend.at(x1))],
                    &line_color,
                ))?;
            }

            let series_color = RGBColor(0, 255, 255);
            chart.draw_series(LineSeries::new(
                self.values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
                &series_color,
            ))?;
            // `Circle` radii are mis-scaled by the backend; pixels mark the points.
            chart.draw_series(
                self.values
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| Pixel::new((i as f64, v), WHITE)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

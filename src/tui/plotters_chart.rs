//! Spectrum chart for the TUI, drawn with Plotters into the Ratatui buffer.
//!
//! Counts are drawn as a mid-step trace (the same path as the SVG overlay) and
//! the fitted model as a line over the display grid.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::CurveGrid;
use crate::plot::ascii::pad_range;
use crate::plot::step_points;

/// Smallest area in which the chart is attempted.
const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 8;

/// Plot-ready series and axis bounds for one fit.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumSeries {
    /// Steps-mid vertices of the measured counts.
    pub steps: Vec<(f64, f64)>,
    /// Fitted model over the display grid.
    pub fit: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl SpectrumSeries {
    pub fn new(data: &CurveGrid, curve: &CurveGrid) -> Self {
        let steps = step_points(data);
        let fit: Vec<(f64, f64)> = curve
            .x
            .iter()
            .zip(&curve.y)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| (x, y))
            .collect();

        let x_bounds = match bounds(steps.iter().chain(&fit).map(|p| p.0)) {
            Some((lo, hi)) if hi > lo => [lo, hi],
            Some((lo, _)) => [lo - 1.0, lo + 1.0],
            None => [0.0, 1.0],
        };
        let (y_lo, y_hi) = bounds(steps.iter().chain(&fit).map(|p| p.1)).unwrap_or((0.0, 1.0));
        let (y_lo, y_hi) = pad_range(y_lo, y_hi, 0.05);

        Self {
            steps,
            fit,
            x_bounds,
            y_bounds: [y_lo, y_hi],
        }
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Render-only widget over a prepared [`SpectrumSeries`].
pub struct SpectrumChart<'a> {
    pub series: &'a SpectrumSeries,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_tick: fn(f64) -> String,
}

impl Widget for SpectrumChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.series.x_bounds;
        let [y0, y1] = self.series.y_bounds;
        let series = self.series;
        let fmt = self.fmt_tick;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt(*v))
                .y_label_formatter(&|v| fmt(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            chart.draw_series(LineSeries::new(series.steps.iter().copied(), &CYAN))?;
            chart.draw_series(LineSeries::new(series.fit.iter().copied(), &RED))?;
            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_trace_counts_as_steps() {
        let data = CurveGrid {
            x: vec![0.0, 10.0, 20.0],
            y: vec![5.0, 9.0, 6.0],
        };
        let curve = CurveGrid {
            x: vec![0.0, 20.0],
            y: vec![5.0, 6.0],
        };
        let s = SpectrumSeries::new(&data, &curve);

        assert_eq!(
            s.steps,
            vec![(0.0, 5.0), (5.0, 5.0), (5.0, 9.0), (15.0, 9.0), (15.0, 6.0), (20.0, 6.0)]
        );
        assert_eq!(s.x_bounds, [0.0, 20.0]);
        assert!(s.y_bounds[0] < 5.0 && s.y_bounds[1] > 9.0);
    }

    #[test]
    fn single_point_gets_a_usable_range() {
        let one = CurveGrid {
            x: vec![3.0],
            y: vec![1.0],
        };
        let s = SpectrumSeries::new(&one, &one);
        assert!(s.x_bounds[1] > s.x_bounds[0]);
        assert!(s.y_bounds[1] > s.y_bounds[0]);
    }
}

//! SVG overlay of corrected data and fitted curve.
//!
//! Data are drawn as a mid-step series, the fit as a smooth line over the
//! 1000-point grid. Output goes to a string first so callers decide where it
//! lands.

use std::fs;
use std::path::Path;

use plotters::prelude::*;

use crate::domain::CurveGrid;
use crate::error::HfsError;
use crate::plot::ascii::pad_range;

pub const SVG_SIZE: (u32, u32) = (1000, 600);

/// Title used for a fit overlay.
pub fn plot_title(file_name: &str, mode: &str) -> String {
    format!("Fit: {file_name} ({mode})")
}

/// Vertices of a steps-mid path through `(x, y)` (sorted by x).
pub fn step_points(data: &CurveGrid) -> Vec<(f64, f64)> {
    let mut pts: Vec<(f64, f64)> = data
        .x
        .iter()
        .zip(&data.y)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    pts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut out = Vec::with_capacity(pts.len() * 2);
    for (i, &(x, y)) in pts.iter().enumerate() {
        if i == 0 {
            out.push((x, y));
        } else {
            let (xp, yp) = pts[i - 1];
            let mid = 0.5 * (xp + x);
            out.push((mid, yp));
            out.push((mid, y));
        }
        if i + 1 == pts.len() {
            out.push((x, y));
        }
    }
    out
}

/// Render the overlay as an SVG document.
pub fn render_svg(data: &CurveGrid, curve: &CurveGrid, title: &str) -> Result<String, HfsError> {
    let mut buf = String::new();
    draw(&mut buf, data, curve, title).map_err(|e| HfsError::Io(format!("SVG rendering failed: {e}")))?;
    Ok(buf)
}

/// Render and write the overlay to `path`.
pub fn write_svg(path: &Path, data: &CurveGrid, curve: &CurveGrid, title: &str) -> Result<(), HfsError> {
    let svg = render_svg(data, curve, title)?;
    fs::write(path, svg)
        .map_err(|e| HfsError::Io(format!("failed to write SVG '{}': {e}", path.display())))?;
    log::info!("wrote SVG overlay to '{}'", path.display());
    Ok(())
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo.is_finite() && hi > lo { (lo, hi) } else { (0.0, 1.0) }
}

fn draw(
    buf: &mut String,
    data: &CurveGrid,
    curve: &CurveGrid,
    title: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (x0, x1) = bounds(data.x.iter().chain(&curve.x).copied());
    let (y0, y1) = bounds(data.y.iter().chain(&curve.y).copied());
    let (y0, y1) = pad_range(y0.min(0.0), y1, 0.05);

    let root = SVGBackend::with_string(buf, SVG_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc("Frequency [MHz]")
        .y_desc("Counts")
        .x_labels(8)
        .y_labels(6)
        .draw()?;

    let data_color = RGBColor(31, 119, 180);
    chart
        .draw_series(LineSeries::new(step_points(data), &data_color))?
        .label("Data")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &data_color));

    let fit_points: Vec<(f64, f64)> = curve.x.iter().copied().zip(curve.y.iter().copied()).collect();
    chart
        .draw_series(LineSeries::new(fit_points, RED.stroke_width(2)))?
        .label("Fit")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - title line (file name and beam mode, see [`plot_title`])
//! - measured counts: `o`
//! - fitted curve: `-` line

use crate::domain::{CurveFile, CurveGrid};
use crate::plot::svg::plot_title;

/// Render corrected data with the fitted curve on top.
pub fn render_ascii_plot(
    data: &CurveGrid,
    curve: &CurveGrid,
    title: &str,
    width: usize,
    height: usize,
) -> String {
    let points = pairs(data);
    let line = pairs(curve);
    let (x_min, x_max) = x_range(&points, &line).unwrap_or((0.0, 1.0));
    render_plot(&points, &line, title, x_min, x_max, width, height)
}

/// Render a saved curve file (its data and fitted grid).
pub fn render_ascii_plot_from_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let title = plot_title(&curve.source_file, curve.beam_mode.as_str());
    render_ascii_plot(&curve.data, &curve.grid, &title, width, height)
}

fn pairs(g: &CurveGrid) -> Vec<(f64, f64)> {
    g.x.iter()
        .zip(&g.y)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect()
}

fn render_plot(
    points: &[(f64, f64)],
    curve: &[(f64, f64)],
    title: &str,
    x_min: f64,
    x_max: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = y_range(points, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);

    for &(x, y) in points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&format!(
        "Plot: x=[{x_min:.1}, {x_max:.1}] MHz | counts=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    out
}

fn x_range(points: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for &(x, _) in points.iter().chain(curve) {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(points: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points.iter().chain(curve) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

pub(crate) fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let data = CurveGrid {
            x: vec![0.0, 100.0],
            y: vec![10.0, 21.0],
        };
        let curve = CurveGrid {
            x: vec![0.0, 100.0],
            y: vec![10.0, 10.0],
        };

        let txt = render_ascii_plot(&data, &curve, "Fit: scan.dat (co)", 10, 5);
        let expected = concat!(
            "Fit: scan.dat (co)\n",
            "Plot: x=[0.0, 100.0] MHz | counts=[9.45, 21.55]\n",
            "         o\n",
            "\n",
            "\n",
            "\n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn degenerate_ranges_still_render() {
        let flat = CurveGrid {
            x: vec![5.0],
            y: vec![1.0],
        };
        let txt = render_ascii_plot(&flat, &flat, "flat", 20, 6);
        assert_eq!(txt.lines().count(), 8);
    }

    #[test]
    fn curve_file_plot_is_titled_with_file_and_mode() {
        use crate::domain::{BeamMode, ConstantInputs, FitStatistics};

        let mut constants = ConstantInputs::default().parse().unwrap();
        constants.beam_mode = BeamMode::Anti;
        let grid = CurveGrid {
            x: vec![0.0, 50.0, 100.0],
            y: vec![7.0, 30.0, 7.0],
        };
        let file = CurveFile {
            tool: "hfs".to_string(),
            generated: chrono::Utc::now(),
            source_file: "na21_run7.dat".to_string(),
            beam_mode: BeamMode::Anti,
            constants,
            parameters: Vec::new(),
            statistics: FitStatistics {
                ndata: 3,
                nvarys: 0,
                nfev: 1,
                iterations: 0,
                chisqr: 0.0,
                redchi: 0.0,
                aic: 0.0,
                bic: 0.0,
            },
            data: grid.clone(),
            grid,
        };

        let txt = render_ascii_plot_from_curve_file(&file, 30, 8);
        assert_eq!(txt.lines().next(), Some("Fit: na21_run7.dat (anti)"));
    }
}

//! ASCII plotting for terminal output.
//!
//! Fixed-size character grids with deterministic output (golden tests):
//! - horizontal bars: `#`
//! - series points: `o`
//! - fitted trend: `-` line

use crate::metrics::Trend;

/// Render labelled horizontal bars scaled to the largest value.
pub fn render_bar_chart(bars: &[(String, f64)], width: usize) -> String {
    let width = width.max(1);
    let label_w = bars.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = bars.iter().map(|(_, v)| *v).fold(0.0f64, f64::max);

    let mut out = String::new();
    for (label, value) in bars {
        let filled = if max > 0.0 {
            ((value.max(0.0) / max) * width as f64).round() as usize
        } else {
            0
        };
        let filled = filled.min(width);
        out.push_str(&format!(
            "{label:<label_w$} |{}{} {}\n",
            "#".repeat(filled),
            " ".repeat(width - filled),
            fmt_value(*value)
        ));
    }
    out
}

/// Render a series as points over an optional trend line.
///
/// `x` is the series index; `labels` name the first and last points on the
/// footer line.
pub fn render_trend_plot(
    title: &str,
    labels: &[String],
    values: &[f64],
    trend: Option<&Trend>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let n = values.len();
    let x_max = (n.max(2) - 1) as f64;

    let trend_ends = trend.map(|t| (t.at(0.0), t.at(x_max)));
    let (y_min, y_max) = y_range(values, trend_ends).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Trend first so points overlay it.
    if let Some((y0, y1)) = trend_ends {
        let (cx0, cy0) = (map_x(0.0, x_max, width), map_y(y0, y_min, y_max, height));
        let (cx1, cy1) = (map_x(x_max, x_max, width), map_y(y1, y_min, y_max, height));
        draw_line(&mut grid, cx0, cy0, cx1, cy1, '-');
    }

    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        let x = map_x(i as f64, x_max, width);
        let y = map_y(v, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!("{title}: n={n} | y=[{y_min:.2}, {y_max:.2}]\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    if let (Some(first), Some(last)) = (labels.first(), labels.last()) {
        out.push_str(&format!("x: {first} .. {last}\n"));
    }
    out
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

fn y_range(values: &[f64], trend: Option<(f64, f64)>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    let trend_ys = trend.map(|(a, b)| [a, b]);
    for &y in values.iter().chain(trend_ys.iter().flatten()) {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if !(min_y.is_finite() && max_y.is_finite()) {
        None
    } else if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // Flat series: centre it.
        Some((min_y - 1.0, max_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = if x_max > 0.0 { (x / x_max).clamp(0.0, 1.0) } else { 0.0 };
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (max).
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (mut x, mut y) = (x0 as isize, y0 as isize);
    let (x1, y1) = (x1 as isize, y1 as isize);

    let dx = (x1 - x).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let dy = -(y1 - y).abs();
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
            .filter(|c| **c == ' ')
        {
            *cell = ch;
        }

        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_chart_golden() {
        let bars = vec![
            ("Behavioral".to_string(), 700.0),
            ("Financial".to_string(), 350.0),
            ("Ensemble".to_string(), 0.0),
        ];
        let expected = concat!(
            "Behavioral |########## 700\n",
            "Financial  |#####      350\n",
            "Ensemble   |           0\n",
        );
        assert_eq!(render_bar_chart(&bars, 10), expected);
    }

    #[test]
    fn trend_plot_golden() {
        let labels = vec!["2024-01".to_string(), "2024-02".to_string()];
        let trend = Trend {
            intercept: 100.0,
            slope: 10.0,
        };
        let txt = render_trend_plot("Avg score", &labels, &[100.0, 110.0], Some(&trend), 10, 5);
        let expected = concat!(
            "Avg score: n=2 | y=[99.50, 110.50]\n",
            "        -o\n",
            "      --  \n",
            "    --    \n",
            "  --      \n",
            "o-        \n",
            "x: 2024-01 .. 2024-02\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn flat_or_empty_series_do_not_panic() {
        let txt = render_trend_plot("flat", &[], &[5.0, 5.0, 5.0], None, 12, 5);
        assert!(txt.starts_with("flat: n=3"));
        let txt = render_trend_plot("empty", &[], &[], None, 12, 5);
        assert_eq!(txt.lines().count(), 6);
    }
}

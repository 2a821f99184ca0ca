use crate::models::chart::{ChartKind, ChartLayout, LayoutSeries};
use crate::models::series::{millis_to_date, TimeSeriesPoint, PORTFOLIO_KEY};
use crate::services::chart_service::ChartService;
use crate::services::table_service::group_thousands;

use super::canvas::{Canvas, Padding, Stroke, TextAnchor};

const AXIS_COLOR: &str = "#8c8c8c";
const GRID_COLOR: &str = "#3a3a3a";
const LABEL_COLOR: &str = "#cccccc";
const FALLBACK_COLORS: [&str; 8] = [
    "#ff8e53", "#64b5f6", "#ff4d4d", "#ffef2f", "#74c0fc", "#b388ff", "#81c784", "#f06292",
];

/// Per-draw switches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Start/end value annotations.
    pub show_labels: bool,
    pub show_legend: bool,
    /// Glow position along the lead series, `0.0..1.0`; `None` draws no glow.
    pub glow_phase: Option<f64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_labels: true,
            show_legend: true,
            glow_phase: None,
        }
    }
}

/// Draws a [`ChartLayout`] onto any [`Canvas`]: grid, axes, year ticks,
/// one line per series, optional labels and legend.
pub struct ChartRenderer {
    padding: Padding,
}

impl ChartRenderer {
    pub fn new(padding: Padding) -> Self {
        Self { padding }
    }

    pub fn render(&self, canvas: &mut dyn Canvas, layout: &ChartLayout, options: &RenderOptions) {
        let frame = Frame::new(canvas, self.padding, layout);
        let percent = layout.kind.is_percent_axis();

        // Value grid.
        for tick in ChartService::generate_value_ticks(layout.min_value, layout.max_value, percent) {
            if tick < layout.min_value || tick > layout.max_value {
                continue;
            }
            let y = frame.y(tick);
            let stroke = if tick == 0.0 {
                Stroke::solid(AXIS_COLOR, 1.0)
            } else {
                Stroke::solid(GRID_COLOR, 0.5)
            };
            canvas.line((frame.left, y), (frame.right, y), &stroke);
            canvas.text(
                (frame.left - 6.0, y + 3.0),
                &format_axis_value(tick, percent),
                TextAnchor::End,
                AXIS_COLOR,
            );
        }

        // Time axis.
        canvas.line(
            (frame.left, frame.bottom),
            (frame.right, frame.bottom),
            &Stroke::solid(AXIS_COLOR, 1.0),
        );
        for tick in ChartService::generate_year_based_ticks(layout.min_time, layout.max_time) {
            let x = frame.x(tick.time);
            if tick.is_year_start {
                canvas.line((x, frame.top), (x, frame.bottom), &Stroke::dashed(GRID_COLOR, 0.75));
            }
            canvas.text((x, frame.bottom + 14.0), &tick.label, TextAnchor::Middle, AXIS_COLOR);
        }

        // Series.
        for (idx, series) in layout.series.iter().enumerate() {
            let color = series_color(&series.key, idx);
            let points: Vec<(f64, f64)> = series
                .points
                .iter()
                .filter(|p| p.value.is_finite())
                .map(|p| (frame.x(p.time()), frame.y(p.value)))
                .collect();
            let width = if series.key == PORTFOLIO_KEY { 2.0 } else { 1.5 };
            canvas.polyline(&points, &Stroke::solid(color, width));

            if options.show_labels {
                self.draw_end_labels(canvas, &frame, series, color, percent);
            }
        }

        if let Some(phase) = options.glow_phase {
            if let Some(lead) = layout.series.first() {
                let span = (layout.max_time - layout.min_time) as f64;
                let time = layout.min_time + (span * phase.clamp(0.0, 1.0)) as i64;
                let value = lead.interpolator.value_at(time);
                let center = (frame.x(time), frame.y(value));
                let color = series_color(&lead.key, 0);
                canvas.circle(center, 6.0, color, 0.25);
                canvas.circle(center, 2.5, color, 0.9);
            }
        }

        if options.show_legend && layout.series.len() > 1 {
            self.draw_legend(canvas, &frame, layout);
        }
    }

    /// Value at the first and last real points of `series`.
    fn draw_end_labels(
        &self,
        canvas: &mut dyn Canvas,
        frame: &Frame,
        series: &LayoutSeries,
        color: &str,
        percent: bool,
    ) {
        let real: Vec<&TimeSeriesPoint> = series
            .points
            .iter()
            .filter(|p| p.value.is_finite() && !p.synthetic)
            .collect();
        let (Some(first), Some(last)) = (real.first(), real.last()) else {
            return;
        };
        canvas.text(
            (frame.x(first.time()) + 4.0, frame.y(first.value) - 6.0),
            &format_axis_value(first.value, percent),
            TextAnchor::Start,
            color,
        );
        if first.date != last.date {
            canvas.text(
                (frame.x(last.time()) - 4.0, frame.y(last.value) - 6.0),
                &format_axis_value(last.value, percent),
                TextAnchor::End,
                color,
            );
        }
    }

    fn draw_legend(&self, canvas: &mut dyn Canvas, frame: &Frame, layout: &ChartLayout) {
        let x = frame.left + 10.0;
        let mut y = frame.top + 14.0;
        for (idx, series) in layout.series.iter().enumerate() {
            let color = series_color(&series.key, idx);
            canvas.line((x, y - 4.0), (x + 20.0, y - 4.0), &Stroke::solid(color, 1.5));
            canvas.text((x + 26.0, y), &series.key, TextAnchor::Start, LABEL_COLOR);
            y += 16.0;
        }
    }
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(Padding::default())
    }
}

/// Title line for `kind` over the time span of `layout`.
#[must_use]
pub fn chart_title(layout: &ChartLayout) -> String {
    let from = millis_to_date(layout.min_time);
    let to = millis_to_date(layout.max_time);
    let name = match layout.kind {
        ChartKind::Contribution => "Contribution & Balance".to_string(),
        other => capitalize(&other.showing_label()),
    };
    format!("{name} ({from} to {to})")
}

// ── Geometry ────────────────────────────────────────────────────────

/// Plot-area mapping from data space to canvas space.
struct Frame {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    min_time: i64,
    max_time: i64,
    min_value: f64,
    max_value: f64,
}

impl Frame {
    fn new(canvas: &dyn Canvas, padding: Padding, layout: &ChartLayout) -> Self {
        let left = padding.left;
        let right = (canvas.width() - padding.right).max(left + 1.0);
        let top = padding.top;
        let bottom = (canvas.height() - padding.bottom).max(top + 1.0);
        Self {
            left,
            right,
            top,
            bottom,
            min_time: layout.min_time,
            max_time: layout.max_time,
            min_value: layout.min_value,
            max_value: layout.max_value,
        }
    }

    fn x(&self, time: i64) -> f64 {
        let span = (self.max_time - self.min_time) as f64;
        if span <= 0.0 {
            return (self.left + self.right) / 2.0;
        }
        self.left + (time - self.min_time) as f64 / span * (self.right - self.left)
    }

    fn y(&self, value: f64) -> f64 {
        let span = self.max_value - self.min_value;
        if span.abs() < f64::EPSILON {
            return (self.top + self.bottom) / 2.0;
        }
        let norm = (value - self.min_value) / span;
        self.top + (1.0 - norm) * (self.bottom - self.top)
    }
}

// ── Formatting ──────────────────────────────────────────────────────

fn series_color(key: &str, idx: usize) -> &'static str {
    match key {
        "^LZ" | "balance" => "#fb8500",
        "^GSPC" | "contribution" => "#64b5f6",
        "^IXIC" => "#74c0fc",
        "^DJI" => "#6aaefc",
        "^SSEC" => "#5da9f6",
        "^HSI" => "#7ab8ff",
        "^N225" => "#89c2ff",
        "USD" => "#FF8E53",
        "CNY" => "#ff4d4d",
        "JPY" => "#64b5f6",
        "KRW" => "#ffef2f",
        _ => FALLBACK_COLORS[idx % FALLBACK_COLORS.len()],
    }
}

/// Axis label: percents keep up to two decimals, large amounts are
/// abbreviated (`1.2M`, `350k`).
#[must_use]
pub fn format_axis_value(value: f64, percent: bool) -> String {
    if percent {
        let rounded = (value * 100.0).round() / 100.0;
        return if rounded.fract() == 0.0 {
            format!("{rounded:.0}%")
        } else {
            format!("{rounded:.2}%")
        };
    }
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 10_000.0 {
        format!("{:.0}k", value / 1_000.0)
    } else if abs >= 100.0 {
        group_thousands(value, 0)
    } else {
        format!("{value:.2}")
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

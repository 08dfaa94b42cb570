//! Hand-built SVG charts.
//!
//! The harness reports only need four shapes (single bars, grouped bars
//! with error whiskers, error-bar curves and a log-log roofline), so the
//! markup is written directly; charts stay dependency-free and diff well.

use std::fmt::Write as _;

const SVG_W: f64 = 720.0;
const SVG_H: f64 = 420.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 44.0;
const MARGIN_BOTTOM: f64 = 86.0;

const PALETTE: [&str; 8] = [
    "#4C78A8", "#F58518", "#E45756", "#72B7B2", "#54A24B", "#B279A2", "#FF9DA7", "#9D755D",
];

/// One bar/line series of a grouped chart.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
    pub errors: Option<Vec<Option<f64>>>,
}

/// One curve of a line chart: (x, y) points plus optional y error bars.
#[derive(Debug, Clone)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
    pub errors: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XScale {
    Linear,
    Log2,
}

/// A measured point overlaid on the roofline.
#[derive(Debug, Clone)]
pub struct RooflinePoint {
    pub label: String,
    pub ai: f64,
    pub gflops: f64,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn fmt_tick(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.abs() >= 100.0 {
        return format!("{value:.0}");
    }
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Evenly spaced "nice" ticks covering [lo, hi].
fn linear_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let range = (hi - lo).max(f64::MIN_POSITIVE);
    let raw_step = range / 5.0;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| range / s <= 6.0)
        .unwrap_or(magnitude);
    let mut ticks = Vec::new();
    let mut v = (lo / step).floor() * step;
    while v <= hi + step * 1e-9 {
        if v >= lo - step * 1e-9 {
            ticks.push(v);
        }
        v += step;
    }
    ticks
}

/// 1-2-5 ticks per decade for a log10 axis.
fn log10_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let mut ticks = Vec::new();
    let mut p = lo.log10().floor() as i32;
    while 10f64.powi(p) <= hi * 1.1 {
        for m in [1.0, 2.0, 5.0] {
            let v = m * 10f64.powi(p);
            if v >= lo * 0.8 && v <= hi * 1.2 {
                ticks.push(v);
            }
        }
        p += 1;
    }
    ticks
}

fn header(out: &mut String, title: &str) {
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{SVG_W}\" height=\"{SVG_H}\" font-family=\"monospace,Arial,sans-serif\">"
    );
    let _ = writeln!(out, "<rect width=\"{SVG_W}\" height=\"{SVG_H}\" fill=\"#FAFAFA\"/>");
    let _ = writeln!(
        out,
        "<text x=\"{:.1}\" y=\"24\" text-anchor=\"middle\" font-size=\"14\" font-weight=\"bold\" fill=\"#222\">{}</text>",
        SVG_W / 2.0,
        escape(title)
    );
}

fn empty_chart(title: &str) -> String {
    let mut out = String::new();
    header(&mut out, title);
    let _ = writeln!(
        out,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\" fill=\"#888\">no data</text>",
        SVG_W / 2.0,
        SVG_H / 2.0
    );
    out.push_str("</svg>\n");
    out
}

struct Plot {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    y_min: f64,
    y_max: f64,
}

impl Plot {
    fn new(y_min: f64, y_max: f64) -> Self {
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: SVG_W - MARGIN_LEFT - MARGIN_RIGHT,
            height: SVG_H - MARGIN_TOP - MARGIN_BOTTOM,
            y_min,
            y_max,
        }
    }

    fn y_of(&self, v: f64) -> f64 {
        let span = (self.y_max - self.y_min).max(f64::MIN_POSITIVE);
        self.top + (1.0 - (v - self.y_min) / span) * self.height
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn grid(&self, out: &mut String, y_label: &str) {
        for tick in linear_ticks(self.y_min, self.y_max) {
            let ty = self.y_of(tick);
            let _ = writeln!(
                out,
                "<line x1=\"{:.1}\" y1=\"{ty:.1}\" x2=\"{:.1}\" y2=\"{ty:.1}\" stroke=\"#DDD\" stroke-width=\"1\" stroke-dasharray=\"3,3\"/>",
                self.left,
                self.left + self.width
            );
            let _ = writeln!(
                out,
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"9\" fill=\"#666\">{}</text>",
                self.left - 6.0,
                ty + 3.0,
                fmt_tick(tick)
            );
        }
        let _ = writeln!(
            out,
            "<text x=\"16\" y=\"{:.1}\" font-size=\"10\" fill=\"#333\" transform=\"rotate(-90 16 {:.1})\" text-anchor=\"middle\">{}</text>",
            self.top + self.height / 2.0,
            self.top + self.height / 2.0,
            escape(y_label)
        );
        let _ = writeln!(
            out,
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#999\" stroke-width=\"1\"/>",
            self.left,
            self.bottom(),
            self.left + self.width,
            self.bottom()
        );
    }

    fn x_label(&self, out: &mut String, label: &str) {
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#333\">{}</text>",
            self.left + self.width / 2.0,
            SVG_H - 8.0,
            escape(label)
        );
    }

    fn rotated_tick(&self, out: &mut String, x: f64, label: &str) {
        let y = self.bottom() + 12.0;
        let _ = writeln!(
            out,
            "<text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"end\" font-size=\"8.5\" fill=\"#333\" transform=\"rotate(-45 {x:.1} {y:.1})\">{}</text>",
            escape(label)
        );
    }

    fn whisker(&self, out: &mut String, x: f64, value: f64, error: f64) {
        if error <= 0.0 {
            return;
        }
        let y_lo = self.y_of(value - error);
        let y_hi = self.y_of(value + error);
        let _ = writeln!(
            out,
            "<line x1=\"{x:.1}\" y1=\"{y_lo:.1}\" x2=\"{x:.1}\" y2=\"{y_hi:.1}\" stroke=\"#555\" stroke-width=\"1.2\"/>"
        );
        for y in [y_lo, y_hi] {
            let _ = writeln!(
                out,
                "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#555\" stroke-width=\"1.2\"/>",
                x - 3.0,
                x + 3.0
            );
        }
    }
}

fn value_bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo.is_finite() && hi.is_finite() {
        Some((lo, hi))
    } else {
        None
    }
}

fn legend(out: &mut String, names: &[&str]) {
    let mut x = MARGIN_LEFT + 6.0;
    let y = MARGIN_TOP - 10.0;
    for (idx, name) in names.iter().enumerate() {
        let colour = PALETTE[idx % PALETTE.len()];
        let _ = writeln!(
            out,
            "<rect x=\"{x:.1}\" y=\"{:.1}\" width=\"9\" height=\"9\" fill=\"{colour}\" opacity=\"0.85\"/>",
            y - 8.0
        );
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{y:.1}\" font-size=\"9.5\" fill=\"#333\">{}</text>",
            x + 12.0,
            escape(name)
        );
        x += 12.0 + 7.0 * name.len() as f64 + 16.0;
    }
}

/// Vertical bar chart; bars extend from the zero line so negative deltas
/// hang downwards.
pub fn bar_chart(title: &str, y_label: &str, labels: &[String], values: &[Option<f64>]) -> String {
    let Some((lo, hi)) = value_bounds(values.iter().flatten().copied()) else {
        return empty_chart(title);
    };
    let pad = ((hi - lo).abs().max(hi.abs().max(lo.abs())) * 0.08).max(1e-6);
    let plot = Plot::new(lo.min(0.0) - pad, hi.max(0.0) + pad);

    let mut out = String::new();
    header(&mut out, title);
    plot.grid(&mut out, y_label);

    let zero_y = plot.y_of(0.0);
    let _ = writeln!(
        out,
        "<line x1=\"{:.1}\" y1=\"{zero_y:.1}\" x2=\"{:.1}\" y2=\"{zero_y:.1}\" stroke=\"#888\" stroke-width=\"1\"/>",
        plot.left,
        plot.left + plot.width
    );

    let slot = plot.width / labels.len().max(1) as f64;
    let bar_w = (slot * 0.65).min(48.0);
    for (idx, label) in labels.iter().enumerate() {
        let x_mid = plot.left + (idx as f64 + 0.5) * slot;
        plot.rotated_tick(&mut out, x_mid, label);
        let Some(value) = values.get(idx).copied().flatten() else {
            continue;
        };
        let vy = plot.y_of(value);
        let (top, height) = if value >= 0.0 {
            (vy, zero_y - vy)
        } else {
            (zero_y, vy - zero_y)
        };
        let _ = writeln!(
            out,
            "<rect x=\"{:.1}\" y=\"{top:.1}\" width=\"{bar_w:.1}\" height=\"{:.1}\" rx=\"1.5\" fill=\"{}\" opacity=\"0.85\"/>",
            x_mid - bar_w / 2.0,
            height.max(0.5),
            PALETTE[0]
        );
        let label_y = if value >= 0.0 { vy - 3.0 } else { vy + 10.0 };
        let _ = writeln!(
            out,
            "<text x=\"{x_mid:.1}\" y=\"{label_y:.1}\" text-anchor=\"middle\" font-size=\"8\" fill=\"#555\">{}</text>",
            fmt_tick(value)
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Grouped vertical bars: one slot per x tick, one bar per series within
/// each slot, optional error whiskers.
pub fn grouped_bar_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    x_ticks: &[String],
    series: &[Series],
) -> String {
    let extents = series.iter().flat_map(|s| {
        s.values.iter().enumerate().filter_map(move |(i, v)| {
            v.map(|v| {
                let e = s
                    .errors
                    .as_ref()
                    .and_then(|e| e.get(i).copied().flatten())
                    .unwrap_or(0.0);
                [v - e, v + e]
            })
        })
    });
    let Some((lo, hi)) = value_bounds(extents.flatten()) else {
        return empty_chart(title);
    };
    let pad = ((hi - lo).abs().max(hi.abs().max(lo.abs())) * 0.08).max(1e-6);
    let plot = Plot::new(lo.min(0.0) - pad, hi.max(0.0) + pad);

    let mut out = String::new();
    header(&mut out, title);
    plot.grid(&mut out, y_label);
    plot.x_label(&mut out, x_label);
    let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
    legend(&mut out, &names);

    let zero_y = plot.y_of(0.0);
    let slot = plot.width / x_ticks.len().max(1) as f64;
    let bar_w = (slot * 0.8 / series.len().max(1) as f64).min(36.0);

    for (tick_idx, tick) in x_ticks.iter().enumerate() {
        let slot_left = plot.left + tick_idx as f64 * slot;
        plot.rotated_tick(&mut out, slot_left + slot / 2.0, tick);
        for (series_idx, s) in series.iter().enumerate() {
            let Some(value) = s.values.get(tick_idx).copied().flatten() else {
                continue;
            };
            let x = slot_left + slot * 0.1 + series_idx as f64 * bar_w;
            let vy = plot.y_of(value);
            let (top, height) = if value >= 0.0 {
                (vy, zero_y - vy)
            } else {
                (zero_y, vy - zero_y)
            };
            let _ = writeln!(
                out,
                "<rect x=\"{x:.1}\" y=\"{top:.1}\" width=\"{bar_w:.1}\" height=\"{:.1}\" rx=\"1.5\" fill=\"{}\" opacity=\"0.85\"/>",
                height.max(0.5),
                PALETTE[series_idx % PALETTE.len()]
            );
            if let Some(error) = s.errors.as_ref().and_then(|e| e.get(tick_idx).copied().flatten()) {
                plot.whisker(&mut out, x + bar_w / 2.0, value, error);
            }
        }
    }

    out.push_str("</svg>\n");
    out
}

/// Error-bar curves, optionally on a log2 x axis and with labelled vertical
/// markers (cache-capacity boundaries).
pub fn line_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[LineSeries],
    x_scale: XScale,
    markers: &[(f64, String)],
    draw_lines: bool,
) -> String {
    let x_map = |v: f64| match x_scale {
        XScale::Linear => v,
        XScale::Log2 => v.log2(),
    };
    let usable = |v: f64| x_scale == XScale::Linear || v > 0.0;

    let Some((x_lo, x_hi)) = value_bounds(
        series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.0))
            .filter(|v| usable(*v))
            .map(x_map),
    ) else {
        return empty_chart(title);
    };
    let y_extents = series.iter().flat_map(|s| {
        s.points.iter().enumerate().map(move |(i, p)| {
            let e = s.errors.as_ref().and_then(|e| e.get(i).copied()).unwrap_or(0.0);
            [p.1 - e, p.1 + e]
        })
    });
    let Some((y_lo, y_hi)) = value_bounds(y_extents.flatten()) else {
        return empty_chart(title);
    };

    let x_pad = ((x_hi - x_lo) * 0.04).max(1e-9);
    let (x_lo, x_hi) = (x_lo - x_pad, x_hi + x_pad);
    let y_pad = ((y_hi - y_lo).abs() * 0.08).max(1e-9);
    let plot = Plot::new(y_lo - y_pad, y_hi + y_pad);

    let x_of = |v: f64| plot.left + (x_map(v) - x_lo) / (x_hi - x_lo) * plot.width;

    let mut out = String::new();
    header(&mut out, title);
    plot.grid(&mut out, y_label);
    plot.x_label(&mut out, x_label);
    if series.len() > 1 {
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        legend(&mut out, &names);
    }

    // x ticks
    match x_scale {
        XScale::Linear => {
            for tick in linear_ticks(x_lo, x_hi) {
                let tx = plot.left + (tick - x_lo) / (x_hi - x_lo) * plot.width;
                let _ = writeln!(
                    out,
                    "<text x=\"{tx:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"8.5\" fill=\"#333\">{}</text>",
                    plot.bottom() + 14.0,
                    fmt_tick(tick)
                );
            }
        }
        XScale::Log2 => {
            let mut p = x_lo.floor() as i32;
            while (p as f64) <= x_hi {
                if (p as f64) >= x_lo {
                    let tx = plot.left + (p as f64 - x_lo) / (x_hi - x_lo) * plot.width;
                    let _ = writeln!(
                        out,
                        "<text x=\"{tx:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"8.5\" fill=\"#333\">{}</text>",
                        plot.bottom() + 14.0,
                        fmt_tick(2f64.powi(p))
                    );
                }
                p += 1;
            }
        }
    }

    for (x, label) in markers {
        if !usable(*x) {
            continue;
        }
        let mx = x_of(*x);
        if mx < plot.left || mx > plot.left + plot.width {
            continue;
        }
        let _ = writeln!(
            out,
            "<line x1=\"{mx:.1}\" y1=\"{:.1}\" x2=\"{mx:.1}\" y2=\"{:.1}\" stroke=\"#999\" stroke-width=\"1\" stroke-dasharray=\"4,3\"/>",
            plot.top,
            plot.bottom()
        );
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"8.5\" fill=\"#666\" transform=\"rotate(-90 {:.1} {:.1})\">{}</text>",
            mx - 3.0,
            plot.top + 12.0,
            mx - 3.0,
            plot.top + 12.0,
            escape(label)
        );
    }

    for (series_idx, s) in series.iter().enumerate() {
        let colour = PALETTE[series_idx % PALETTE.len()];
        let mut sorted: Vec<(usize, &(f64, f64))> = s
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| usable(p.0))
            .collect();
        sorted.sort_by(|a, b| a.1 .0.partial_cmp(&b.1 .0).unwrap_or(std::cmp::Ordering::Equal));

        if draw_lines && sorted.len() > 1 {
            let path: Vec<String> = sorted
                .iter()
                .map(|(_, p)| format!("{:.1},{:.1}", x_of(p.0), plot.y_of(p.1)))
                .collect();
            let _ = writeln!(
                out,
                "<polyline points=\"{}\" fill=\"none\" stroke=\"{colour}\" stroke-width=\"1.5\"/>",
                path.join(" ")
            );
        }
        for (orig_idx, point) in sorted {
            let px = x_of(point.0);
            let py = plot.y_of(point.1);
            let _ = writeln!(
                out,
                "<circle cx=\"{px:.1}\" cy=\"{py:.1}\" r=\"2.6\" fill=\"{colour}\"/>"
            );
            if let Some(error) = s.errors.as_ref().and_then(|e| e.get(orig_idx).copied()) {
                plot.whisker(&mut out, px, point.1, error);
            }
        }
    }

    out.push_str("</svg>\n");
    out
}

/// Log-log roofline: `y = min(P_peak, B_mem · AI)` with measured geometric
/// means overlaid as labelled points.
pub fn roofline_chart(title: &str, b_mem: f64, p_peak: f64, points: &[RooflinePoint]) -> String {
    let positive: Vec<&RooflinePoint> = points.iter().filter(|p| p.ai > 0.0 && p.gflops > 0.0).collect();
    if positive.is_empty() || b_mem <= 0.0 || p_peak <= 0.0 {
        return empty_chart(title);
    }

    let ai_lo = positive.iter().map(|p| p.ai).fold(f64::INFINITY, f64::min) / 2.0;
    let ai_hi = positive.iter().map(|p| p.ai).fold(0.0_f64, f64::max) * 2.0;
    let (x_lo, x_hi) = (ai_lo.max(1e-3), ai_hi.max(10.0));
    let y_data_lo = positive.iter().map(|p| p.gflops).fold(f64::INFINITY, f64::min);
    let (y_lo, y_hi) = ((y_data_lo / 2.0).max(1e-2), (p_peak * 2.0).max(1.0));

    let plot = Plot::new(y_lo.log10(), y_hi.log10());
    let x_of = |v: f64| plot.left + (v.log10() - x_lo.log10()) / (x_hi.log10() - x_lo.log10()) * plot.width;
    let y_of = |v: f64| plot.y_of(v.log10());

    let mut out = String::new();
    header(&mut out, title);

    for tick in log10_ticks(y_lo, y_hi) {
        let ty = y_of(tick);
        let _ = writeln!(
            out,
            "<line x1=\"{:.1}\" y1=\"{ty:.1}\" x2=\"{:.1}\" y2=\"{ty:.1}\" stroke=\"#DDD\" stroke-width=\"1\" stroke-dasharray=\"3,3\"/>",
            plot.left,
            plot.left + plot.width
        );
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"9\" fill=\"#666\">{}</text>",
            plot.left - 6.0,
            ty + 3.0,
            fmt_tick(tick)
        );
    }
    for tick in log10_ticks(x_lo, x_hi) {
        let tx = x_of(tick);
        let _ = writeln!(
            out,
            "<text x=\"{tx:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"9\" fill=\"#666\">{}</text>",
            plot.bottom() + 14.0,
            fmt_tick(tick)
        );
    }
    plot.x_label(&mut out, "Arithmetic Intensity (FLOPs / Byte)");
    let _ = writeln!(
        out,
        "<text x=\"16\" y=\"{:.1}\" font-size=\"10\" fill=\"#333\" transform=\"rotate(-90 16 {:.1})\" text-anchor=\"middle\">GFLOP/s (measured)</text>",
        plot.top + plot.height / 2.0,
        plot.top + plot.height / 2.0
    );

    // Roof polyline sampled across the x range.
    let samples = 120;
    let mut path = Vec::with_capacity(samples);
    for i in 0..samples {
        let t = i as f64 / (samples - 1) as f64;
        let ai = x_lo * (x_hi / x_lo).powf(t);
        let roof = p_peak.min(b_mem * ai);
        path.push(format!("{:.1},{:.1}", x_of(ai), y_of(roof)));
    }
    let _ = writeln!(
        out,
        "<polyline points=\"{}\" fill=\"none\" stroke=\"#333\" stroke-width=\"1.6\"/>",
        path.join(" ")
    );
    let peak_y = y_of(p_peak);
    let _ = writeln!(
        out,
        "<line x1=\"{:.1}\" y1=\"{peak_y:.1}\" x2=\"{:.1}\" y2=\"{peak_y:.1}\" stroke=\"#999\" stroke-width=\"1\" stroke-dasharray=\"5,4\"/>",
        plot.left,
        plot.left + plot.width
    );
    let _ = writeln!(
        out,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"9\" fill=\"#555\">roof: min(P={p_peak:.1}, B·AI), B={b_mem:.1} GiB/s</text>",
        plot.left + plot.width - 4.0,
        plot.top + 12.0
    );

    for (idx, point) in positive.iter().enumerate() {
        let px = x_of(point.ai);
        let py = y_of(point.gflops);
        let colour = PALETTE[idx % PALETTE.len()];
        let _ = writeln!(out, "<circle cx=\"{px:.1}\" cy=\"{py:.1}\" r=\"3.2\" fill=\"{colour}\"/>");
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"8\" fill=\"#333\">{}</text>",
            px + 5.0,
            py - 4.0,
            escape(&point.label)
        );
    }

    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_chart_renders_one_rect_per_value() {
        let svg = bar_chart(
            "deltas",
            "Δ%",
            &["dot-f32-s1".to_string(), "mul-f32-s1".to_string()],
            &[Some(5.0), Some(-3.0)],
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>\n"));
        assert_eq!(svg.matches("<rect x=").count(), 2);
    }

    #[test]
    fn charts_without_data_render_a_placeholder() {
        let svg = bar_chart("empty", "y", &[], &[]);
        assert!(svg.contains("no data"));
        let svg = line_chart("empty", "x", "y", &[], XScale::Linear, &[], true);
        assert!(svg.contains("no data"));
    }

    #[test]
    fn grouped_bars_include_legend_and_whiskers() {
        let svg = grouped_bar_chart(
            "bw",
            "read %",
            "GB/s",
            &["50%".to_string(), "100%".to_string()],
            &[Series {
                name: "seq".to_string(),
                values: vec![Some(20.0), Some(25.0)],
                errors: Some(vec![Some(1.0), None]),
            }],
        );
        assert!(svg.contains("seq"));
        // one error whisker: vertical line plus two caps
        assert!(svg.matches("stroke=\"#555\"").count() >= 3);
    }

    #[test]
    fn line_chart_marks_log2_ticks_and_markers() {
        let svg = line_chart(
            "wss",
            "KiB",
            "ns",
            &[LineSeries {
                name: "latency".to_string(),
                points: vec![(32.0, 1.2), (64.0, 1.3), (128.0, 4.0)],
                errors: Some(vec![0.1, 0.1, 0.2]),
            }],
            XScale::Log2,
            &[(64.0, "L1d".to_string())],
            true,
        );
        assert!(svg.contains("polyline"));
        assert!(svg.contains("L1d"));
    }

    #[test]
    fn roofline_draws_roof_and_points() {
        let svg = roofline_chart(
            "roofline",
            30.0,
            80.0,
            &[RooflinePoint {
                label: "dot-f32-L1".to_string(),
                ai: 0.25,
                gflops: 7.5,
            }],
        );
        assert!(svg.contains("polyline"));
        assert!(svg.contains("dot-f32-L1"));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = bar_chart("a<b", "y", &["x&y".to_string()], &[Some(1.0)]);
        assert!(svg.contains("a&lt;b"));
        assert!(svg.contains("x&amp;y"));
    }
}

use chrono::NaiveDate;
use maud::{Markup, html};
use tracker::PerDose;

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 200.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 30.0;

const TEXT_STYLE: &str = "fill: var(--foreground); font-family: inherit";
const SVG_CONTAINER_STYLE: &str = "width:100%;height:auto";
const DOSE_COLORS: [&str; 2] = ["var(--dose-first)", "var(--dose-second)"];

fn format_date(date: NaiveDate) -> String {
    date.format("%-m/%-d").to_string()
}

/// Integer with thousands separators.
pub fn format_count(v: i64) -> String {
    let digits = v.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if v < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Bars per day with the second dose stacked on top of the first.
pub fn render_daily_chart(days: &[(NaiveDate, PerDose<u64>)], label: &str) -> Markup {
    if days.is_empty() {
        return empty_chart(label);
    }

    let max_val = days.iter().map(|(_, v)| v[0] + v[1]).max().unwrap_or(0).max(1) as f64;

    let chart_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let chart_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let bar_w = chart_w / days.len() as f64;

    html! {
        svg viewBox=(format!("0 0 {WIDTH} {HEIGHT}")) xmlns="http://www.w3.org/2000/svg" style=(SVG_CONTAINER_STYLE) {
            rect width=(WIDTH) height=(HEIGHT) style="fill: var(--background)" {}
            text x=(MARGIN_LEFT) y="14" font-size="12" style=(TEXT_STYLE) { (label) }
            text x=(MARGIN_LEFT - 5.0) y=(MARGIN_TOP + 10.0) font-size="10" text-anchor="end" style=(TEXT_STYLE) {
                (format_count(max_val as i64))
            }
            text x=(MARGIN_LEFT - 5.0) y=(MARGIN_TOP + chart_h) font-size="10" text-anchor="end" style=(TEXT_STYLE) { "0" }
            @for (i, (date, counts)) in days.iter().enumerate() {
                @let x = MARGIN_LEFT + i as f64 * bar_w;
                @let first_h = counts[0] as f64 / max_val * chart_h;
                @let second_h = counts[1] as f64 / max_val * chart_h;
                @let first_y = MARGIN_TOP + chart_h - first_h;
                rect x=(x) y=(first_y) width=((bar_w - 1.0).max(0.5)) height=(first_h) style=(format!("fill: {}", DOSE_COLORS[0])) {
                    title { (format_date(*date)) " 1st: " (format_count(counts[0] as i64)) }
                }
                rect x=(x) y=(first_y - second_h) width=((bar_w - 1.0).max(0.5)) height=(second_h) style=(format!("fill: {}", DOSE_COLORS[1])) {
                    title { (format_date(*date)) " 2nd: " (format_count(counts[1] as i64)) }
                }
            }
            (write_x_axis(days, chart_w))
        }
    }
}

/// One line per dose over the running totals.
pub fn render_cumulative_chart(days: &[(NaiveDate, PerDose<u64>)], label: &str) -> Markup {
    if days.is_empty() {
        return empty_chart(label);
    }

    let max_val = days.iter().map(|(_, v)| v[0].max(v[1])).max().unwrap_or(0).max(1) as f64;

    let chart_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let chart_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let x_at = |i: usize| MARGIN_LEFT + (i as f64 / (days.len() - 1).max(1) as f64) * chart_w;
    let y_at = |v: u64| MARGIN_TOP + chart_h - (v as f64 / max_val) * chart_h;

    let lines: Vec<String> = (0..2)
        .map(|dose| {
            days.iter()
                .enumerate()
                .map(|(i, (_, counts))| format!("{},{}", x_at(i), y_at(counts[dose])))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    html! {
        svg viewBox=(format!("0 0 {WIDTH} {HEIGHT}")) xmlns="http://www.w3.org/2000/svg" style=(SVG_CONTAINER_STYLE) {
            rect width=(WIDTH) height=(HEIGHT) style="fill: var(--background)" {}
            text x=(MARGIN_LEFT) y="14" font-size="12" style=(TEXT_STYLE) { (label) }
            text x=(MARGIN_LEFT - 5.0) y=(MARGIN_TOP + 10.0) font-size="10" text-anchor="end" style=(TEXT_STYLE) {
                (format_count(max_val as i64))
            }
            text x=(MARGIN_LEFT - 5.0) y=(MARGIN_TOP + chart_h) font-size="10" text-anchor="end" style=(TEXT_STYLE) { "0" }
            @for (dose, points) in lines.iter().enumerate() {
                polyline points=(points) fill="none" stroke-width="2" style=(format!("stroke: {}", DOSE_COLORS[dose])) {}
            }
            @if let Some((date, counts)) = days.last() {
                @for dose in 0..2 {
                    circle cx=(x_at(days.len() - 1)) cy=(y_at(counts[dose])) r="3" style=(format!("fill: {}", DOSE_COLORS[dose])) {
                        title { (format_date(*date)) ": " (format_count(counts[dose] as i64)) }
                    }
                }
            }
            (write_x_axis(days, chart_w))
        }
    }
}

fn write_x_axis(days: &[(NaiveDate, PerDose<u64>)], chart_w: f64) -> Markup {
    let label_y = HEIGHT - 5.0;
    html! {
        @if let Some((date, _)) = days.first() {
            text x=(MARGIN_LEFT) y=(label_y) font-size="11" text-anchor="start" style=(TEXT_STYLE) {
                (format_date(*date))
            }
        }
        @if days.len() > 2 {
            @let mid = days.len() / 2;
            @let mid_x = MARGIN_LEFT + chart_w / 2.0;
            text x=(mid_x) y=(label_y) font-size="11" text-anchor="middle" style=(TEXT_STYLE) {
                (format_date(days[mid].0))
            }
        }
        @if let Some((date, _)) = days.last() {
            @let end_x = MARGIN_LEFT + chart_w;
            text x=(end_x) y=(label_y) font-size="11" text-anchor="end" style=(TEXT_STYLE) {
                (format_date(*date))
            }
        }
    }
}

fn empty_chart(label: &str) -> Markup {
    html! {
        svg viewBox=(format!("0 0 {WIDTH} {HEIGHT}")) xmlns="http://www.w3.org/2000/svg" style=(SVG_CONTAINER_STYLE) {
            rect width=(WIDTH) height=(HEIGHT) style="fill: var(--background)" {}
            text x=(WIDTH / 2.0) y=(HEIGHT / 2.0) font-size="14" text-anchor="middle" style=(TEXT_STYLE) {
                (label) " (no data)"
            }
        }
    }
}

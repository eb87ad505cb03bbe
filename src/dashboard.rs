//! Dashboard module: self-contained HTML page for the population summaries.
//!
//! Produces one HTML string with inline SVG that holds:
//! - A year selector listing every year, most recent first
//! - One section per year with the metric card, regional donut, top-N bar
//!   chart, tile-grid choropleth and national trend line
//! - A few lines of inline JS that show the section of the selected year
//!
//! All chart geometry is computed here; the page needs no external assets.
use chrono::NaiveDateTime;
use tracing::debug;

use crate::aggregation::{
    DerivedSummary, RegionTotal, StatePopulation, StateValue, TrendPoint, DEFAULT_TOP_N,
};
use crate::error::Result;
use crate::format::{si_two_digits, thousands};
use crate::regions::RegionCatalog;
use crate::table::PopulationTable;

// ── Config ──────────────────────────────────────────────────────────────────

/// Options for one dashboard render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Page heading and `<title>`
    pub title: String,
    /// Year shown first (default: most recent year in the table)
    pub selected_year: Option<i32>,
    /// Length of the top-N ranking
    pub top_n: usize,
    /// Footer timestamp; omitted when `None`
    pub generated_at: Option<NaiveDateTime>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "US Population Analytics".to_string(),
            selected_year: None,
            top_n: DEFAULT_TOP_N,
            generated_at: None,
        }
    }
}

const REGION_COLORS: [&str; 4] = ["#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4"];

const BAR_COLORS: [&str; 5] = [
    "rgb(247,251,255)",
    "rgb(198,219,239)",
    "rgb(107,174,214)",
    "rgb(33,113,181)",
    "rgb(8,48,107)",
];

const MAGMA: [(u8, u8, u8); 10] = [
    (0x00, 0x00, 0x04),
    (0x18, 0x0f, 0x3d),
    (0x44, 0x0f, 0x76),
    (0x72, 0x1f, 0x81),
    (0x9e, 0x2f, 0x7f),
    (0xcd, 0x40, 0x71),
    (0xf1, 0x60, 0x5d),
    (0xfd, 0x96, 0x68),
    (0xfe, 0xca, 0x8d),
    (0xfc, 0xfd, 0xbf),
];

/// Tile-grid positions (column, row) standing in for state outlines.
#[rustfmt::skip]
const TILE_GRID: [(&str, u8, u8); 51] = [
    ("AK", 0, 0), ("ME", 11, 0),
    ("VT", 10, 1), ("NH", 11, 1),
    ("WA", 1, 2), ("ID", 2, 2), ("MT", 3, 2), ("ND", 4, 2), ("MN", 5, 2), ("IL", 6, 2),
    ("WI", 7, 2), ("MI", 8, 2), ("NY", 9, 2), ("RI", 10, 2), ("MA", 11, 2),
    ("OR", 1, 3), ("NV", 2, 3), ("WY", 3, 3), ("SD", 4, 3), ("IA", 5, 3), ("IN", 6, 3),
    ("OH", 7, 3), ("PA", 8, 3), ("NJ", 9, 3), ("CT", 10, 3),
    ("CA", 1, 4), ("UT", 2, 4), ("CO", 3, 4), ("NE", 4, 4), ("MO", 5, 4), ("KY", 6, 4),
    ("WV", 7, 4), ("VA", 8, 4), ("MD", 9, 4), ("DE", 10, 4),
    ("AZ", 2, 5), ("NM", 3, 5), ("KS", 4, 5), ("AR", 5, 5), ("TN", 6, 5), ("NC", 7, 5),
    ("SC", 8, 5), ("DC", 9, 5),
    ("OK", 4, 6), ("LA", 5, 6), ("MS", 6, 6), ("AL", 7, 6), ("GA", 8, 6),
    ("HI", 0, 7), ("TX", 4, 7), ("FL", 9, 7),
];

// ── HTML generation ─────────────────────────────────────────────────────────

/// Main entry point: renders the full dashboard page.
///
/// Fails with `InvalidYear` if `options.selected_year` is not in the table.
pub fn render_dashboard(
    table: &PopulationTable,
    catalog: &RegionCatalog,
    options: &RenderOptions,
) -> Result<String> {
    let selected = options.selected_year.unwrap_or_else(|| table.latest_year());
    table.ensure_year(selected)?;

    let mut options_html = String::new();
    let mut sections = String::new();
    for year in table.year_choices() {
        let summary = DerivedSummary::compute(table, year, catalog, options.top_n)?;
        let is_selected = year == selected;
        options_html.push_str(&format!(
            r#"<option value="{year}"{}>{year}</option>"#,
            if is_selected { " selected" } else { "" }
        ));
        sections.push_str(&render_section(&summary, options.top_n, is_selected));
    }

    let footer_stamp = options
        .generated_at
        .map(|at| format!(" · Generated {}", at.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();

    let html = format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body {{ font-family: Arial, sans-serif; margin: 16px; color: #333; }}
  .grid {{ display: grid; grid-template-columns: 1fr 2fr; gap: 16px; }}
  .metric-card {{
    border: 1px solid #dee2e6; border-radius: 8px; padding: 12px; text-align: center;
  }}
  .metric-value {{ font-size: 28px; font-weight: bold; }}
  .metric-label {{ font-size: 14px; color: #666; }}
  .chart-title {{ font-size: 14px; font-weight: 600; margin: 12px 0 4px; }}
  .axis {{ font-size: 10px; fill: #868e96; }}
  .tile-label {{ font-size: 10px; text-anchor: middle; pointer-events: none; }}
</style>
</head>
<body>
<h1>{title}</h1>
<select id="year-select" onchange="showYear(this.value)">{options_html}</select>
{sections}
<hr>
<footer>Data Source: US Census Bureau{footer_stamp}</footer>
<script>
function showYear(year) {{
  document.querySelectorAll("section[data-year]").forEach(function (s) {{
    s.hidden = s.dataset.year !== String(year);
  }});
}}
</script>
</body>
</html>
"##,
        title = escape_html(&options.title),
    );

    debug!(
        selected,
        years = table.distinct_years().len(),
        bytes = html.len(),
        "dashboard rendered"
    );
    Ok(html)
}

fn render_section(summary: &DerivedSummary, top_n: usize, visible: bool) -> String {
    format!(
        r#"<section data-year="{year}"{hidden}>
<div class="grid">
<div>
  <div class="metric-card">
    <div class="metric-value">{total}</div>
    <div class="metric-label">Total Population</div>
  </div>
  <div class="chart-title">Population by Region</div>
  {pie}
  <div class="chart-title">Top {top_n} States</div>
  {bars}
</div>
<div>
  <div class="chart-title">Population by State</div>
  {map}
  <div class="chart-title">Population Trend Over Time</div>
  {trend}
</div>
</div>
</section>
"#,
        year = summary.year,
        hidden = if visible { "" } else { " hidden" },
        total = thousands(summary.total_population),
        pie = region_donut_svg(&summary.region_totals),
        bars = top_states_svg(&summary.top_states),
        map = state_tiles_svg(&summary.state_values),
        trend = trend_svg(&summary.national_trend, summary.year),
    )
}

// ── Charts ──────────────────────────────────────────────────────────────────

fn region_donut_svg(regions: &[RegionTotal]) -> String {
    const SIZE: f64 = 240.0;
    const OUTER: f64 = 100.0;
    const INNER: f64 = 50.0;
    let center = SIZE / 2.0;

    let total: i64 = regions.iter().map(|r| r.population).sum();
    let mut svg = svg_open("pie", SIZE, SIZE);

    if total <= 0 {
        svg.push_str(&format!(
            r#"<text x="{center}" y="{center}" text-anchor="middle" class="axis">"#
        ));
        svg.push_str("No regional data</text>");
    } else {
        let mut start = -std::f64::consts::FRAC_PI_2;
        for (i, region) in regions.iter().enumerate() {
            if region.population <= 0 {
                continue;
            }
            let color = REGION_COLORS[i % REGION_COLORS.len()];
            let share = region.population as f64 / total as f64;
            let tooltip = format!(
                "{}: {}",
                escape_html(&region.region),
                thousands(region.population)
            );

            if region.population == total {
                svg.push_str(&format!(
                    r#"<circle cx="{center}" cy="{center}" r="{}" fill="none" "#,
                    (OUTER + INNER) / 2.0,
                ));
                svg.push_str(&format!(
                    r#"stroke="{color}" stroke-width="{}"><title>{tooltip}</title></circle>"#,
                    OUTER - INNER,
                ));
                break;
            }

            let end = start + share * std::f64::consts::TAU;
            svg.push_str(&format!(
                r##"<path d="{}" fill="{color}" stroke="#fff" stroke-width="1">"##,
                donut_slice_path(center, OUTER, INNER, start, end)
            ));
            svg.push_str(&format!("<title>{tooltip}</title></path>"));
            start = end;
        }
    }
    svg.push_str("</svg>");

    // Legend in catalog order
    svg.push_str(r#"<div class="legend">"#);
    for (i, region) in regions.iter().enumerate() {
        svg.push_str(&format!(
            r#"<div><span style="color:{}">●</span> {} {}</div>"#,
            REGION_COLORS[i % REGION_COLORS.len()],
            escape_html(&region.region),
            thousands(region.population),
        ));
    }
    svg.push_str("</div>");
    svg
}

fn donut_slice_path(center: f64, outer: f64, inner: f64, start: f64, end: f64) -> String {
    let point = |radius: f64, angle: f64| {
        (
            center + radius * angle.cos(),
            center + radius * angle.sin(),
        )
    };
    let large = if end - start > std::f64::consts::PI { 1 } else { 0 };
    let (ox1, oy1) = point(outer, start);
    let (ox2, oy2) = point(outer, end);
    let (ix2, iy2) = point(inner, end);
    let (ix1, iy1) = point(inner, start);
    format!(
        "M {ox1:.2} {oy1:.2} A {outer} {outer} 0 {large} 1 {ox2:.2} {oy2:.2} \
         L {ix2:.2} {iy2:.2} A {inner} {inner} 0 {large} 0 {ix1:.2} {iy1:.2} Z"
    )
}

fn top_states_svg(states: &[StatePopulation]) -> String {
    const LABEL_W: f64 = 110.0;
    const BAR_W: f64 = 250.0;
    const ROW_H: f64 = 24.0;
    let width = LABEL_W + BAR_W + 50.0;
    let height = ROW_H * states.len().max(1) as f64;

    let max = states.iter().map(|s| s.population).max().unwrap_or(0).max(1) as f64;

    let mut svg = svg_open("bars", width, height);
    for (i, state) in states.iter().enumerate() {
        let y = i as f64 * ROW_H;
        let bar = state.population as f64 / max * BAR_W;
        let name = escape_html(&state.state);
        svg.push_str(&format!(
            r#"<text x="{}" y="{:.1}" text-anchor="end" class="axis">{name}</text>"#,
            LABEL_W - 6.0,
            y + ROW_H * 0.65,
        ));
        svg.push_str(&format!(
            r#"<rect x="{LABEL_W}" y="{:.1}" width="{bar:.1}" height="{}" fill="{}" "#,
            y + 3.0,
            ROW_H - 6.0,
            BAR_COLORS[i % BAR_COLORS.len()],
        ));
        svg.push_str(&format!(
            r##"stroke="#adb5bd" stroke-width="0.5"><title>{name}: {}</title></rect>"##,
            thousands(state.population),
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" class="axis">{}</text>"#,
            LABEL_W + bar + 4.0,
            y + ROW_H * 0.65,
            si_two_digits(state.population as f64),
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn state_tiles_svg(values: &[StateValue]) -> String {
    const TILE: f64 = 36.0;
    const GAP: f64 = 3.0;
    let width = 12.0 * (TILE + GAP);
    let height = 8.0 * (TILE + GAP) + 24.0;

    let min = values.iter().map(|v| v.population).min().unwrap_or(0) as f64;
    let max = values.iter().map(|v| v.population).max().unwrap_or(0) as f64;
    let span = (max - min).max(1.0);

    let mut svg = svg_open("map", width, height);
    for &(code, column, row) in &TILE_GRID {
        let x = column as f64 * (TILE + GAP);
        let y = row as f64 * (TILE + GAP);
        let value = values.iter().find(|v| v.states_code == code);
        let (fill, text_fill, tooltip) = match value {
            Some(v) => {
                let t = (v.population as f64 - min) / span;
                let text = if t < 0.6 { "#fff" } else { "#000" };
                (
                    ramp_color(t),
                    text,
                    format!("{}: {}", escape_html(&v.state), thousands(v.population)),
                )
            }
            None => ("#dee2e6".to_string(), "#868e96", format!("{code}: no data")),
        };
        svg.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{TILE}" height="{TILE}" rx="3" fill="{fill}">"#
        ));
        svg.push_str(&format!("<title>{tooltip}</title></rect>"));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" class="tile-label" fill="{text_fill}">{code}</text>"#,
            x + TILE / 2.0,
            y + TILE / 2.0 + 4.0,
        ));
    }

    let unplaced = values
        .iter()
        .filter(|v| !TILE_GRID.iter().any(|(code, _, _)| *code == v.states_code))
        .count();
    if unplaced > 0 {
        debug!(unplaced, "state codes without a map tile");
    }

    // Color bar
    let bar_y = 8.0 * (TILE + GAP) + 4.0;
    let steps = 20;
    let step_w = 160.0 / steps as f64;
    for i in 0..steps {
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{bar_y}" width="{:.1}" height="10" fill="{}"/>"#,
            40.0 + i as f64 * step_w,
            step_w + 0.5,
            ramp_color(i as f64 / (steps - 1) as f64),
        ));
    }
    svg.push_str(&format!(
        r#"<text x="36" y="{:.1}" text-anchor="end" class="axis">{}</text>"#,
        bar_y + 9.0,
        si_two_digits(min),
    ));
    svg.push_str(&format!(
        r#"<text x="204" y="{:.1}" class="axis">{}</text>"#,
        bar_y + 9.0,
        si_two_digits(max),
    ));
    svg.push_str("</svg>");
    svg
}

fn trend_svg(trend: &[TrendPoint], selected_year: i32) -> String {
    const WIDTH: f64 = 460.0;
    const HEIGHT: f64 = 200.0;
    const LEFT: f64 = 48.0;
    const RIGHT: f64 = 16.0;
    const TOP: f64 = 12.0;
    const BOTTOM: f64 = 28.0;

    let mut svg = svg_open("trend", WIDTH, HEIGHT);
    if trend.is_empty() {
        svg.push_str("</svg>");
        return svg;
    }

    let first_year = trend.first().map(|p| p.year).unwrap_or(0) as f64;
    let last_year = trend.last().map(|p| p.year).unwrap_or(0) as f64;
    let min = trend.iter().map(|p| p.population).min().unwrap_or(0) as f64;
    let max = trend.iter().map(|p| p.population).max().unwrap_or(0) as f64;

    let plot_w = WIDTH - LEFT - RIGHT;
    let plot_h = HEIGHT - TOP - BOTTOM;
    let x_of = |year: i32| {
        if last_year > first_year {
            LEFT + (year as f64 - first_year) / (last_year - first_year) * plot_w
        } else {
            LEFT + plot_w / 2.0
        }
    };
    let y_of = |population: i64| {
        if max > min {
            TOP + (max - population as f64) / (max - min) * plot_h
        } else {
            TOP + plot_h / 2.0
        }
    };

    let points: Vec<String> = trend
        .iter()
        .map(|p| format!("{:.1},{:.1}", x_of(p.year), y_of(p.population)))
        .collect();
    svg.push_str(&format!(
        r##"<polyline points="{}" fill="none" stroke="#45B7D1" stroke-width="2"/>"##,
        points.join(" ")
    ));

    for p in trend {
        let (x, y) = (x_of(p.year), y_of(p.population));
        let (r, fill) = if p.year == selected_year {
            (5, "#FF6B6B")
        } else {
            (3, "#45B7D1")
        };
        svg.push_str(&format!(
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="{r}" fill="{fill}"><title>{}: {}</title>"#,
            p.year,
            thousands(p.population),
        ));
        svg.push_str(&format!(
            r#"</circle><text x="{x:.1}" y="{:.1}" text-anchor="middle" class="axis">{}</text>"#,
            HEIGHT - 8.0,
            p.year,
        ));
    }

    for (y, value) in [(TOP + 4.0, max), (TOP + plot_h + 4.0, min)] {
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{y:.1}" text-anchor="end" class="axis">{}</text>"#,
            LEFT - 4.0,
            si_two_digits(value),
        ));
    }
    svg.push_str("</svg>");
    svg
}

// ── Helpers ─────────────────────────────────────────────────────────────────

const SVG_NS: &str = "http://www.w3.org/2000/svg";

fn svg_open(class: &str, width: f64, height: f64) -> String {
    format!(r#"<svg class="{class}" width="{width}" height="{height}" xmlns="{SVG_NS}">"#)
}

/// Color on the magma ramp for `t` in `[0, 1]`.
fn ramp_color(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (MAGMA.len() - 1) as f64;
    let i = (pos.floor() as usize).min(MAGMA.len() - 2);
    let frac = pos - i as f64;
    let (r0, g0, b0) = MAGMA[i];
    let (r1, g1, b1) = MAGMA[i + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    format!("#{:02x}{:02x}{:02x}", lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

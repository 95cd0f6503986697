use std::f64::consts::PI;
use std::fmt::Write;

use super::{rating_label, ChartSlice, ReviewReport, INSIGHT_RATINGS};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub title: String,
    /// Insight table rows per printed page
    pub rows_per_page: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: "Review Report".to_string(),
            rows_per_page: 25,
        }
    }
}

const PAGE_STYLE: &str = "\
body { font-family: Helvetica, Arial, sans-serif; color: #222; margin: 0; }\n\
.page { padding: 24px 32px; page-break-after: always; break-after: page; }\n\
.page:last-child { page-break-after: auto; break-after: auto; }\n\
h1 { color: #744ecd; }\n\
table { border-collapse: collapse; margin: 12px 0; }\n\
th, td { border: 1px solid #ccc; padding: 4px 12px; text-align: left; }\n\
.charts { display: flex; gap: 32px; }\n\
.footer { color: #888; font-size: 12px; margin-top: 16px; }\n";

/// Total printed pages: the summary page plus the insight pages
pub fn page_count(report: &ReviewReport, options: &ExportOptions) -> usize {
    1 + insight_pages(report.insights.row_count(), options.rows_per_page)
}

fn insight_pages(rows: usize, rows_per_page: usize) -> usize {
    let per_page = rows_per_page.max(1);
    rows.div_ceil(per_page).max(1)
}

/// Renders the report as a paginated, print-ready HTML document with the
/// charts embedded as SVG images.
pub fn render_html(report: &ReviewReport, options: &ExportOptions) -> String {
    let total_pages = page_count(report, options);
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n",
        escape_html(&options.title),
        PAGE_STYLE
    );

    // Page 1: counts and charts
    html.push_str("<section class=\"page\">\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape_html(&options.title));
    html.push_str("<h2>Number of Ratings</h2>\n<table class=\"ratings-table\">\n");
    html.push_str("<thead><tr><th>Star Rating</th><th>Number of Star Ratings</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for count in &report.counts {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(&rating_label(count.star_rating)),
            count.count
        );
    }
    let _ = writeln!(
        html,
        "</tbody>\n<tfoot><tr><th>Total</th><th>{}</th></tr></tfoot>\n</table>",
        report.total
    );

    html.push_str("<div class=\"charts\">\n");
    html.push_str("<div class=\"chart-container\"><h2>Pie Chart</h2>\n");
    html.push_str(&pie_svg(&report.pie_slices()));
    html.push_str("</div>\n<div class=\"chart-container\"><h2>Bar Chart</h2>\n");
    html.push_str(&bar_svg(&report.bar_series()));
    html.push_str("</div>\n</div>\n");
    push_footer(&mut html, 1, total_pages);
    html.push_str("</section>\n");

    // Insight pages
    let rows = report.insights.rows();
    let per_page = options.rows_per_page.max(1);
    let chunks: Vec<_> = if rows.is_empty() {
        vec![&rows[..]]
    } else {
        rows.chunks(per_page).collect()
    };

    for (i, chunk) in chunks.iter().enumerate() {
        html.push_str("<section class=\"page\">\n<h2>Insights</h2>\n");
        if chunk.is_empty() {
            html.push_str("<p>No low ratings.</p>\n");
        } else {
            html.push_str("<table class=\"insights-table\">\n<thead><tr>");
            for rating in INSIGHT_RATINGS {
                let _ = write!(html, "<th>{} Star</th>", rating);
            }
            html.push_str("</tr></thead>\n<tbody>\n");
            for row in chunk.iter() {
                html.push_str("<tr>");
                for cell in row {
                    let _ = write!(html, "<td>{}</td>", escape_html(cell.unwrap_or("")));
                }
                html.push_str("</tr>\n");
            }
            html.push_str("</tbody>\n</table>\n");
        }
        push_footer(&mut html, i + 2, total_pages);
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn push_footer(html: &mut String, page: usize, total: usize) {
    let _ = writeln!(html, "<div class=\"footer\">Page {} of {}</div>", page, total);
}

const PIE_RADIUS: f64 = 100.0;
const PIE_CENTER: f64 = 110.0;

fn pie_svg(slices: &[ChartSlice]) -> String {
    let mut svg = String::from(
        "<svg class=\"pie-chart\" xmlns=\"http://www.w3.org/2000/svg\" width=\"220\" height=\"220\" viewBox=\"0 0 220 220\">\n",
    );

    let visible: Vec<&ChartSlice> = slices.iter().filter(|s| s.count > 0).collect();
    match visible.as_slice() {
        [] => {
            let _ = writeln!(
                svg,
                "<circle cx=\"{c}\" cy=\"{c}\" r=\"{r}\" fill=\"#eee\"/>",
                c = PIE_CENTER,
                r = PIE_RADIUS
            );
        }
        [only] => {
            let _ = writeln!(
                svg,
                "<circle cx=\"{c}\" cy=\"{c}\" r=\"{r}\" fill=\"{}\"><title>{}: {}</title></circle>",
                only.color,
                escape_html(&only.label),
                only.count,
                c = PIE_CENTER,
                r = PIE_RADIUS
            );
        }
        many => {
            let mut angle = -PI / 2.0;
            for slice in many {
                let sweep = slice.percent / 100.0 * 2.0 * PI;
                let (x1, y1) = point_on_circle(angle);
                let (x2, y2) = point_on_circle(angle + sweep);
                let large_arc = if sweep > PI { 1 } else { 0 };
                let _ = writeln!(
                    svg,
                    "<path d=\"M {c} {c} L {x1:.2} {y1:.2} A {r} {r} 0 {large_arc} 1 {x2:.2} {y2:.2} Z\" fill=\"{}\"><title>{}: {}</title></path>",
                    slice.color,
                    escape_html(&slice.label),
                    slice.count,
                    c = PIE_CENTER,
                    r = PIE_RADIUS,
                );
                angle += sweep;
            }
        }
    }

    svg.push_str("</svg>\n");
    svg
}

fn point_on_circle(angle: f64) -> (f64, f64) {
    (
        PIE_CENTER + PIE_RADIUS * angle.cos(),
        PIE_CENTER + PIE_RADIUS * angle.sin(),
    )
}

const BAR_WIDTH: f64 = 40.0;
const BAR_GAP: f64 = 20.0;
const BAR_AREA_HEIGHT: f64 = 180.0;

fn bar_svg(bars: &[ChartSlice]) -> String {
    let width = (bars.len() as f64 * (BAR_WIDTH + BAR_GAP) + BAR_GAP).max(100.0);
    let height = BAR_AREA_HEIGHT + 40.0;
    let max = bars.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg class=\"bar-chart\" xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = width,
        h = height
    );

    for (i, bar) in bars.iter().enumerate() {
        let bar_height = bar.count as f64 / max * BAR_AREA_HEIGHT;
        let x = BAR_GAP + i as f64 * (BAR_WIDTH + BAR_GAP);
        let y = BAR_AREA_HEIGHT - bar_height + 10.0;
        let _ = writeln!(
            svg,
            "<rect x=\"{x}\" y=\"{y:.2}\" width=\"{BAR_WIDTH}\" height=\"{bar_height:.2}\" fill=\"{}\"><title>{}: {}</title></rect>",
            bar.color,
            escape_html(&bar.label),
            bar.count
        );
        let _ = writeln!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"12\" text-anchor=\"middle\">{}</text>",
            x + BAR_WIDTH / 2.0,
            BAR_AREA_HEIGHT + 28.0,
            escape_html(&bar.label)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

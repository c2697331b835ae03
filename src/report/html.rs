use crate::report::report_model::{HEADERS, TaggingReport, row_cells};

// ============================================================================
// HTML reporter — self-contained HTML report
// ============================================================================

/// Generate a self-contained HTML report.
///
/// Features:
/// - Header colored by outcome (events found, placeholder only, or skips)
/// - Summary line with event and skip counts
/// - One table row per event, grouped visually by page
/// - Inline CSS (no external dependencies)
pub fn generate_html_report(report: &TaggingReport) -> String {
    let header_color = if report.used_fallback {
        "#9E9E9E"
    } else if report.skipped.is_empty() {
        "#4CAF50"
    } else {
        "#FF9800"
    };

    let status_text = if report.used_fallback {
        "NO EVENTS DETECTED"
    } else if report.skipped.is_empty() {
        "EVENTS TAGGED"
    } else {
        "EVENTS TAGGED WITH SKIPPED IMAGES"
    };

    let duration_text = report
        .duration_ms
        .map(|ms| format!(" in {:.1}s", ms as f64 / 1000.0))
        .unwrap_or_default();

    let header_row = HEADERS
        .iter()
        .map(|h| format!("<th>{}</th>", escape_html(h)))
        .collect::<String>();

    let mut rows = String::new();
    let mut last_page: Option<&str> = None;
    for event in &report.events {
        let class = if last_page.is_some_and(|p| p != event.page) {
            " class=\"page-start\""
        } else {
            ""
        };
        last_page = Some(event.page.as_str());

        let cells = row_cells(event)
            .iter()
            .map(|c| format!("<td>{}</td>", escape_html(c)))
            .collect::<String>();
        rows.push_str(&format!("<tr{}>{}</tr>\n", class, cells));
    }

    let mut skipped = String::new();
    if !report.skipped.is_empty() {
        skipped.push_str("<ul class=\"skipped\">\n");
        for s in &report.skipped {
            skipped.push_str(&format!(
                "<li>{}: {}</li>\n",
                escape_html(&s.page),
                escape_html(&s.reason)
            ));
        }
        skipped.push_str("</ul>\n");
    }

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title} — Data Tagging</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; padding: 0; background: #f5f5f5; }}
.header {{ background: {header_color}; color: white; padding: 20px 30px; }}
.header h1 {{ margin: 0 0 8px 0; font-size: 24px; }}
.header p {{ margin: 0; font-size: 16px; opacity: 0.9; }}
.content {{ max-width: 1100px; margin: 20px auto; padding: 0 20px; }}
table {{ width: 100%; border-collapse: collapse; background: white; font-size: 14px; }}
th, td {{ text-align: left; padding: 8px 10px; border-bottom: 1px solid #eee; }}
th {{ background: #fafafa; }}
tr.page-start td {{ border-top: 2px solid #ccc; }}
.skipped {{ margin: 16px 0 0 0; padding-left: 20px; }}
.skipped li {{ color: #e65100; font-size: 13px; margin-bottom: 4px; }}
</style>
</head>
<body>
<div class="header">
<h1>{status_text}</h1>
<p>{title} ({source}): {detected} events from {images} images, {skipped_count} skipped{duration}</p>
</div>
<div class="content">
<table>
<tr>{header_row}</tr>
{rows}</table>
{skipped}</div>
</body>
</html>"##,
        title = escape_html(&report.title),
        header_color = header_color,
        status_text = status_text,
        source = escape_html(&report.source),
        detected = report.detected_count(),
        images = report.image_count,
        skipped_count = report.skipped.len(),
        duration = duration_text,
        header_row = header_row,
        rows = rows,
        skipped = skipped,
    )
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

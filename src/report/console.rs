use crate::report::report_model::{HEADERS, TaggingReport, row_cells};

// ============================================================================
// Console reporter — aligned table for the terminal
// ============================================================================

const MAX_CELL_WIDTH: usize = 48;

/// Format a tagging report for terminal output.
///
/// Produces output like:
/// ```text
/// === Tagging: upload batch (heuristic, 2 images) ===
///
/// Page                 | Element       | Event Type | Trigger
/// ---------------------+---------------+------------+-------------------------
/// home.png (page 1)    | Upload Button | Click      | Detected text 'upload'
///
/// === Results: 1 events (Click: 1), 0 skipped in 0.4s ===
/// ```
/// Descriptions are left out of the table to keep rows on one line.
pub fn format_console_report(report: &TaggingReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== Tagging: {} ({}, {} images) ===\n\n",
        report.title, report.source, report.image_count
    ));

    let rows: Vec<[String; 4]> = report
        .events
        .iter()
        .map(|e| {
            let cells = row_cells(e);
            [
                clip(cells[0]),
                clip(cells[1]),
                clip(cells[2]),
                clip(cells[3]),
            ]
        })
        .collect();

    let mut widths = [0usize; 4];
    for (i, header) in HEADERS.iter().take(4).enumerate() {
        widths[i] = header.chars().count();
    }
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let header_cells: Vec<String> = HEADERS
        .iter()
        .take(4)
        .enumerate()
        .map(|(i, h)| pad(h, widths[i]))
        .collect();
    out.push_str(header_cells.join(" | ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');

    for row in &rows {
        let cells: Vec<String> = row.iter().enumerate().map(|(i, c)| pad(c, widths[i])).collect();
        out.push_str(cells.join(" | ").trim_end());
        out.push('\n');
    }

    if report.used_fallback {
        out.push_str("\n[NOTE] No events detected; placeholder row emitted\n");
    }

    for skipped in &report.skipped {
        out.push_str(&format!("[SKIPPED] {}: {}\n", skipped.page, skipped.reason));
    }

    let counts = report
        .counts_by_type
        .iter()
        .map(|(k, v)| format!("{}: {}", if k.is_empty() { "(none)" } else { k }, v))
        .collect::<Vec<_>>()
        .join(", ");

    out.push_str(&format!(
        "\n=== Results: {} events",
        report.detected_count()
    ));
    if !counts.is_empty() {
        out.push_str(&format!(" ({})", counts));
    }
    out.push_str(&format!(", {} skipped", report.skipped.len()));

    if let Some(ms) = report.duration_ms {
        let secs = ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }

    out.push_str(" ===\n");

    out
}

fn clip(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL_WIDTH {
        cell.to_string()
    } else {
        let mut cut: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
        cut.push_str("...");
        cut
    }
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{}{}", cell, " ".repeat(width.saturating_sub(len)))
}

use crate::report::report_model::{HEADERS, TaggingReport, row_cells};

// ============================================================================
// CSV reporter — spreadsheet import format
// ============================================================================

/// Generate a CSV sheet with one row per event.
///
/// ```text
/// Page,Element,Event Type,Trigger,Description
/// home.png (page 1),Upload Button,Click,Detected text 'upload',Auto-detected by keyword 'upload' in OCR text
/// ```
/// Lines end with CRLF. Cells containing separators, quotes or line breaks
/// are quoted.
pub fn generate_csv(report: &TaggingReport) -> String {
    let mut out = String::new();

    out.push_str(&csv_line(&HEADERS));
    for event in &report.events {
        out.push_str(&csv_line(&row_cells(event)));
    }

    out
}

fn csv_line(cells: &[&str]) -> String {
    let mut line = cells
        .iter()
        .map(|c| escape_csv(c))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

/// Quote a cell when it contains a comma, quote, or line break.
pub fn escape_csv(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

use std::io::Read;
use std::path::Path;

use crate::aggregate::aggregator::ImageInput;
use crate::cli::error::CliError;
use crate::report::console::format_console_report;
use crate::report::csv::generate_csv;
use crate::report::html::generate_html_report;
use crate::report::report_model::TaggingReport;
use crate::source::event_source::{EventSourceKind, SourceSettings};
use crate::tagging::event_model::Event;
use crate::tagging::matcher::match_events;
use crate::tagging::normalize::normalize_ocr_text;
use crate::tagging::rules::{FALLBACK_WORDS, RULES, rules_by_specificity};
use crate::tag_images;
use crate::trace::logger::{NullSink, TraceLogger, TraceSink};

/// Supported report outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Console,
    Csv,
    Html,
    Json,
}

impl ReportFormat {
    pub fn from_name(name: &str) -> Result<Self, CliError> {
        match name.trim().to_lowercase().as_str() {
            "console" => Ok(ReportFormat::Console),
            "csv" => Ok(ReportFormat::Csv),
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            other => Err(CliError::UnknownFormat(other.to_string())),
        }
    }
}

/// Render a report in the requested format.
pub fn render_report(report: &TaggingReport, format: ReportFormat) -> Result<String, CliError> {
    Ok(match format {
        ReportFormat::Console => format_console_report(report),
        ReportFormat::Csv => generate_csv(report),
        ReportFormat::Html => generate_html_report(report),
        ReportFormat::Json => {
            let mut json = serde_json::to_string_pretty(&report.events)?;
            json.push('\n');
            json
        }
    })
}

// ============================================================================
// tag subcommand
// ============================================================================

/// Tag the given screenshots and write the report. Returns the report.
pub fn cmd_tag(
    image_paths: &[String],
    source_name: &str,
    format_name: &str,
    output: Option<&str>,
    trace_file: Option<&str>,
    settings: &SourceSettings,
    verbose: u8,
) -> Result<TaggingReport, CliError> {
    if image_paths.is_empty() {
        return Err(CliError::NoImages);
    }

    let kind = EventSourceKind::from_name(source_name)
        .ok_or_else(|| CliError::UnknownSource(source_name.to_string()))?;
    let format = ReportFormat::from_name(format_name)?;
    let images = load_images(image_paths)?;

    if verbose > 0 {
        eprintln!("Tagging {} images with the {} source...", images.len(), kind);
    }

    let sink: Box<dyn TraceSink> = match trace_file {
        Some(path) => Box::new(TraceLogger::new(path)),
        None => Box::new(NullSink),
    };
    let start = std::time::Instant::now();
    let outcome = tag_images(&images, kind, settings, sink.as_ref());
    let duration = start.elapsed().as_millis();

    let report = TaggingReport::from_outcome("Data Tagging", &kind.to_string(), outcome)
        .with_duration(duration);

    let content = render_report(&report, format)?;
    write_output(output, &content)?;

    Ok(report)
}

/// Read screenshots from disk, keeping argument order.
pub fn load_images(paths: &[String]) -> Result<Vec<ImageInput>, CliError> {
    paths
        .iter()
        .map(|p| {
            ImageInput::from_path(Path::new(p)).map_err(|e| CliError::ReadInput {
                path: p.clone(),
                source: e,
            })
        })
        .collect()
}

// ============================================================================
// text subcommand
// ============================================================================

/// Run normalizer and matcher over raw text from a file or stdin.
pub fn cmd_text(file: Option<&str>) -> Result<Vec<Event>, CliError> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| CliError::ReadInput {
            path: path.to_string(),
            source: e,
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let events = match_events(&normalize_ocr_text(&raw));
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(events)
}

// ============================================================================
// rules subcommand
// ============================================================================

/// Format the rule table in matching order.
pub fn format_rules() -> String {
    let mut out = String::new();
    out.push_str("Phrase rules (longest first):\n");
    for r in rules_by_specificity(RULES) {
        out.push_str(&format!(
            "  {:<26} {:<6} {}\n",
            format!("\"{}\"", r.phrase),
            r.event.event_type(),
            r.element_hint
        ));
    }
    out.push_str(&format!("Fallback words: {}\n", FALLBACK_WORDS.join(", ")));
    out
}

pub fn cmd_rules() {
    print!("{}", format_rules());
}

// ============================================================================
// Helpers
// ============================================================================

fn write_output(output: Option<&str>, content: &str) -> Result<(), CliError> {
    match output {
        Some(path) => std::fs::write(path, content).map_err(|e| CliError::WriteOutput {
            path: path.to_string(),
            source: e,
        }),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

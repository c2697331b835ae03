/// Characters that end a line of OCR output. Besides `\n` and `\r` this
/// covers vertical tab, form feed, the ASCII file/group/record separators,
/// NEL and the Unicode line and paragraph separators.
pub const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Collapse raw multi-line OCR text into one lowercase matching string.
///
/// Blank lines are dropped, every remaining line is trimmed, and the lines
/// are joined with single spaces. Whitespace inside a line is left as is.
pub fn normalize_ocr_text(raw: &str) -> String {
    content_lines(raw).collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Count of non-blank lines in raw OCR text. Used in trace records.
pub fn content_line_count(raw: &str) -> usize {
    content_lines(raw).count()
}

fn content_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(LINE_BREAKS)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

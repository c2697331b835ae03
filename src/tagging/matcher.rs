use std::collections::HashSet;

use regex::Regex;

use crate::tagging::event_model::Event;
use crate::tagging::rules::{FALLBACK_WORDS, RULES, Rule, find_rule, rules_by_specificity};

// ============================================================================
// Heuristic matcher — keyword rules applied to normalized OCR text
// ============================================================================

/// Run the built-in rule table against normalized text.
///
/// Two passes feed one list: every phrase contained in the text (longest
/// phrase first), then every fallback word found on word boundaries. The
/// combined list is deduplicated on `(element, event_type)`, first wins.
///
/// Containment is a literal substring test, so "dropdownload" still fires
/// the "dropdown" rule.
pub fn match_events(normalized: &str) -> Vec<Event> {
    match_events_with(normalized, RULES, FALLBACK_WORDS)
}

/// Same as `match_events` with a caller-supplied rule table.
pub fn match_events_with(normalized: &str, rules: &[Rule], fallback_words: &[&str]) -> Vec<Event> {
    let mut candidates = phrase_matches(normalized, rules);
    candidates.extend(word_matches(normalized, rules, fallback_words));
    dedup_events(candidates)
}

/// Phrase pass: substring containment, longest phrase first.
pub fn phrase_matches(normalized: &str, rules: &[Rule]) -> Vec<Event> {
    rules_by_specificity(rules)
        .into_iter()
        .filter(|r| normalized.contains(r.phrase))
        .map(|r| Event {
            element: r.element_hint.to_string(),
            event_type: r.event.event_type(),
            trigger: format!("Detected text '{}'", r.phrase),
            description: format!("Auto-detected by keyword '{}' in OCR text", r.phrase),
        })
        .collect()
}

/// Word pass: `\bword\b` search for each fallback word that has a rule.
pub fn word_matches(normalized: &str, rules: &[Rule], fallback_words: &[&str]) -> Vec<Event> {
    fallback_words
        .iter()
        .filter_map(|word| {
            let r = rules.iter().find(|r| r.phrase == *word)?;
            let pattern = word_pattern(word)?;
            pattern.is_match(normalized).then(|| Event {
                element: r.element_hint.to_string(),
                event_type: r.event.event_type(),
                trigger: format!("Detected text '{}'", word),
                description: format!("Auto-detected by OCR word '{}'", word),
            })
        })
        .collect()
}

fn word_pattern(word: &str) -> Option<Regex> {
    match Regex::new(&format!(r"\b{}\b", regex::escape(word))) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("skipping fallback word {:?}: {}", word, e);
            None
        }
    }
}

/// Keep the first event for each `(element, event_type)` key, in order.
pub fn dedup_events(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|e| seen.insert((e.element.clone(), e.event_type.clone())))
        .collect()
}

/// Element hint configured for a built-in phrase, if any.
pub fn element_for_phrase(phrase: &str) -> Option<&'static str> {
    find_rule(phrase).map(|r| r.element_hint)
}

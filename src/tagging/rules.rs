use crate::tagging::event_model::EventType;

// ============================================================================
// Keyword rule table
// ============================================================================

/// Kind of event a rule produces. Kept separate from `EventType` so the
/// table can live in a `static` slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleEvent {
    Click,
    View,
}

impl RuleEvent {
    pub fn event_type(self) -> EventType {
        match self {
            RuleEvent::Click => EventType::Click,
            RuleEvent::View => EventType::View,
        }
    }
}

/// Static mapping from a lowercase trigger phrase to the event it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub phrase: &'static str,
    pub event: RuleEvent,
    pub element_hint: &'static str,
}

const fn rule(phrase: &'static str, event: RuleEvent, element_hint: &'static str) -> Rule {
    Rule {
        phrase,
        event,
        element_hint,
    }
}

pub static RULES: &[Rule] = &[
    rule("upload", RuleEvent::Click, "Upload Button"),
    rule("submit", RuleEvent::Click, "Submit Button"),
    rule("select", RuleEvent::Click, "Dropdown"),
    rule("dropdown", RuleEvent::Click, "Dropdown"),
    rule("discrepancy", RuleEvent::View, "Discrepancy panel"),
    rule("upload front", RuleEvent::Click, "Upload Front"),
    rule("upload back", RuleEvent::Click, "Upload Back"),
    rule("your deposit is on hold", RuleEvent::View, "Hold Banner"),
    rule("camera", RuleEvent::Click, "Camera Icon"),
];

/// Single words re-checked on word boundaries after the phrase pass.
pub static FALLBACK_WORDS: &[&str] = &["upload", "submit", "select", "dropdown", "camera"];

pub fn find_rule(phrase: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.phrase == phrase)
}

/// Rules ordered longest phrase first, by character count. Equal lengths
/// keep table order.
pub fn rules_by_specificity(rules: &[Rule]) -> Vec<&Rule> {
    let mut ordered: Vec<&Rule> = rules.iter().collect();
    ordered.sort_by_key(|r| std::cmp::Reverse(r.phrase.chars().count()));
    ordered
}

/// Problems with a rule table, reported by `validate_rules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleIssue {
    EmptyPhrase { index: usize },
    NotLowercase { phrase: String },
    EmptyElementHint { phrase: String },
    FallbackWithoutRule { word: String },
}

pub fn validate_rules(rules: &[Rule], fallback_words: &[&str]) -> Vec<RuleIssue> {
    let mut issues = Vec::new();

    for (index, r) in rules.iter().enumerate() {
        if r.phrase.trim().is_empty() {
            issues.push(RuleIssue::EmptyPhrase { index });
            continue;
        }
        if r.phrase != r.phrase.to_lowercase() {
            issues.push(RuleIssue::NotLowercase {
                phrase: r.phrase.to_string(),
            });
        }
        if r.element_hint.trim().is_empty() {
            issues.push(RuleIssue::EmptyElementHint {
                phrase: r.phrase.to_string(),
            });
        }
    }

    for word in fallback_words {
        if !rules.iter().any(|r| r.phrase == *word) {
            issues.push(RuleIssue::FallbackWithoutRule {
                word: word.to_string(),
            });
        }
    }

    issues
}


//! Match patterns - declarative matchers an intent registers against.
//!
//! Three pattern kinds:
//!
//! - **Keywords**: every keyword must appear in the message; scores highest.
//! - **Regex**: scores proportionally to the matched span length; named
//!   capture groups become extracted slots.
//! - **Phrase**: a literal phrase template with `{slot}` placeholders,
//!   compiled to a regex at registration.
//!
//! Patterns are declared as `PatternSpec` values and compiled once when the
//! registry is built; a bad regex is a registration error, not a runtime one.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

use crate::domain::RegistrationError;

/// Confidence for a full keyword-set hit.
const KEYWORD_SCORE: f64 = 0.95;
/// Ceiling for a regex match spanning the whole message.
const REGEX_MAX_SCORE: f64 = 0.9;
/// Confidence for a phrase template hit.
const PHRASE_SCORE: f64 = 0.85;

/// Declarative pattern as registered on an intent descriptor.
#[derive(Debug, Clone)]
pub enum PatternSpec {
    /// Every keyword must appear (case-insensitive substring).
    Keywords(Vec<String>),
    /// Raw regular expression, compiled case-insensitively.
    Regex(String),
    /// Literal phrase with `{slot}` placeholders.
    Phrase(String),
}

/// A pattern compiled at registry build time.
#[derive(Debug)]
pub(crate) enum CompiledPattern {
    Keywords {
        keywords: Vec<String>,
        literal_len: usize,
    },
    Regex(Regex),
    Phrase {
        regex: Regex,
        literal_len: usize,
    },
}

/// Outcome of evaluating one pattern against one message.
#[derive(Debug, Clone)]
pub(crate) struct PatternMatch {
    pub score: f64,
    pub slots: HashMap<String, String>,
    /// Length of the literal span that matched, for specificity tie-breaks.
    pub literal_len: usize,
}

impl CompiledPattern {
    /// Compile a declared pattern, attributing errors to the owning intent.
    pub(crate) fn compile(
        spec: &PatternSpec,
        intent_id: &str,
    ) -> Result<CompiledPattern, RegistrationError> {
        match spec {
            PatternSpec::Keywords(keywords) => {
                let keywords: Vec<String> =
                    keywords.iter().map(|k| k.to_lowercase()).collect();
                let literal_len = keywords.iter().map(String::len).sum();
                Ok(CompiledPattern::Keywords {
                    keywords,
                    literal_len,
                })
            }
            PatternSpec::Regex(pattern) => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| RegistrationError::InvalidPattern {
                        intent_id: intent_id.to_string(),
                        source,
                    })?;
                Ok(CompiledPattern::Regex(regex))
            }
            PatternSpec::Phrase(template) => {
                let (pattern, literal_len) = phrase_to_regex(template);
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| RegistrationError::InvalidPattern {
                        intent_id: intent_id.to_string(),
                        source,
                    })?;
                Ok(CompiledPattern::Phrase { regex, literal_len })
            }
        }
    }

    /// Evaluate against a message; `None` means score 0 (excluded).
    pub(crate) fn evaluate(&self, message: &str) -> Option<PatternMatch> {
        match self {
            CompiledPattern::Keywords {
                keywords,
                literal_len,
            } => {
                let haystack = message.to_lowercase();
                if keywords.iter().all(|k| haystack.contains(k.as_str())) {
                    Some(PatternMatch {
                        score: KEYWORD_SCORE,
                        slots: HashMap::new(),
                        literal_len: *literal_len,
                    })
                } else {
                    None
                }
            }
            CompiledPattern::Regex(regex) => {
                let best = regex
                    .find_iter(message)
                    .max_by_key(|m| m.len())?;
                let coverage = best.len() as f64 / message.len().max(1) as f64;
                // Slots come from the same span that produced the score.
                let slots = regex
                    .captures_at(message, best.start())
                    .map(|captures| named_slots(regex, &captures))
                    .unwrap_or_default();
                Some(PatternMatch {
                    score: REGEX_MAX_SCORE * coverage.min(1.0),
                    slots,
                    literal_len: best.len(),
                })
            }
            CompiledPattern::Phrase { regex, literal_len } => {
                let captures = regex.captures(message)?;
                let slots = named_slots(regex, &captures);
                Some(PatternMatch {
                    score: PHRASE_SCORE,
                    slots,
                    literal_len: *literal_len,
                })
            }
        }
    }
}

/// Named capture groups of one match become slots.
fn named_slots(regex: &Regex, captures: &regex::Captures<'_>) -> HashMap<String, String> {
    let mut slots = HashMap::new();
    for name in regex.capture_names().flatten() {
        if let Some(value) = captures.name(name) {
            slots.insert(name.to_string(), value.as_str().trim().to_string());
        }
    }
    slots
}

/// Convert a phrase template into a regex pattern.
///
/// Literal segments are escaped; `{slot}` becomes a lazy named capture,
/// except a trailing slot which captures greedily to the end of the line.
fn phrase_to_regex(template: &str) -> (String, usize) {
    let mut pattern = String::new();
    let mut literal_len = 0;
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let (literal, after) = rest.split_at(open);
        push_literal(&mut pattern, literal.trim_end());
        literal_len += literal.trim().len();

        let Some(close) = after.find('}') else {
            // Unbalanced brace: treat the remainder as literal
            push_literal(&mut pattern, after);
            literal_len += after.len();
            return (pattern, literal_len);
        };
        let name = &after[1..close];
        rest = &after[close + 1..];

        if rest.trim().is_empty() {
            pattern.push_str(&format!(r"\s*(?P<{}>.+)$", name));
            rest = "";
        } else {
            pattern.push_str(&format!(r"\s*(?P<{}>.+?)\s*", name));
            rest = rest.trim_start();
        }
    }

    push_literal(&mut pattern, rest);
    literal_len += rest.trim().len();
    (pattern, literal_len)
}

/// Escape and append one literal segment, anchored on word boundaries.
///
/// The boundaries keep a lazy slot from stopping inside a word, e.g.
/// "water plants at 6pm" must not bind a slot at the "at" inside "water".
fn push_literal(pattern: &mut String, literal: &str) {
    if literal.is_empty() {
        return;
    }
    if literal
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric())
    {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(literal));
    if literal
        .chars()
        .last()
        .is_some_and(|c| c.is_alphanumeric())
    {
        pattern.push_str(r"\b");
    }
}

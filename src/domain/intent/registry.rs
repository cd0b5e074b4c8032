//! Intent Handler Registry - built once at startup, read-only thereafter.
//!
//! Registration is a closed, enumerable set: every handler is a named,
//! statically-known entry declared at process start. There is no runtime
//! discovery, which keeps the registry auditable and safe for concurrent
//! lookup without locking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::RegistrationError;

use super::handler::IntentHandler;
use super::pattern::{CompiledPattern, PatternSpec};

/// A registered capability: patterns plus the handler they route to.
#[derive(Clone)]
pub struct IntentDescriptor {
    /// Unique intent id (e.g. "create_reminder").
    pub id: String,
    /// Ordered match patterns; at least one is required.
    pub patterns: Vec<PatternSpec>,
    /// Tie-break among equally-scored intents (higher wins).
    pub priority: u8,
    /// The handler invoked when this intent wins dispatch.
    pub handler: Arc<dyn IntentHandler>,
}

impl IntentDescriptor {
    /// Creates a descriptor with no patterns yet.
    pub fn new(id: impl Into<String>, handler: Arc<dyn IntentHandler>) -> Self {
        Self {
            id: id.into(),
            patterns: Vec::new(),
            priority: 0,
            handler,
        }
    }

    /// Sets the tie-break priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a keyword-set pattern.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.push(PatternSpec::Keywords(
            keywords.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Adds a regex pattern (compiled at registry build).
    pub fn with_regex(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(PatternSpec::Regex(pattern.into()));
        self
    }

    /// Adds a phrase template pattern.
    pub fn with_phrase(mut self, template: impl Into<String>) -> Self {
        self.patterns.push(PatternSpec::Phrase(template.into()));
        self
    }
}

impl std::fmt::Debug for IntentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentDescriptor")
            .field("id", &self.id)
            .field("patterns", &self.patterns.len())
            .field("priority", &self.priority)
            .finish()
    }
}

/// One scored candidate from a lookup.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub intent_id: String,
    /// 0.0 to 1.0; zero-score intents are excluded before this is built.
    pub confidence: f64,
    /// Named captures pooled across the intent's matching patterns.
    pub slots: HashMap<String, String>,
}

struct RegisteredIntent {
    id: String,
    priority: u8,
    patterns: Vec<CompiledPattern>,
    handler: Arc<dyn IntentHandler>,
}

/// Immutable registry of all intents, scored per dispatch.
pub struct IntentRegistry {
    intents: Vec<RegisteredIntent>,
}

impl IntentRegistry {
    /// Starts a builder.
    pub fn builder() -> IntentRegistryBuilder {
        IntentRegistryBuilder {
            descriptors: Vec::new(),
        }
    }

    /// Number of registered intents.
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Score the message against every registered intent.
    ///
    /// Returns match results best-first: confidence, then declared priority,
    /// then longest literal match. Zero-score intents are excluded.
    pub fn lookup(&self, message: &str) -> Vec<MatchResult> {
        let mut scored: Vec<(f64, u8, usize, MatchResult)> = Vec::new();

        for intent in &self.intents {
            let matches: Vec<_> = intent
                .patterns
                .iter()
                .filter_map(|p| p.evaluate(message))
                .collect();

            let best = matches.iter().cloned().max_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.literal_len.cmp(&b.literal_len))
            });

            if let Some(matched) = best {
                // Slots are pooled across every matching pattern, so a
                // keyword pattern outscoring a phrase pattern on the same
                // intent does not lose the phrase's captures.
                let mut slots = HashMap::new();
                for m in matches {
                    slots.extend(m.slots);
                }
                scored.push((
                    matched.score,
                    intent.priority,
                    matched.literal_len,
                    MatchResult {
                        intent_id: intent.id.clone(),
                        confidence: matched.score,
                        slots,
                    },
                ));
            }
        }

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.1.cmp(&a.1))
                .then(b.2.cmp(&a.2))
        });

        scored.into_iter().map(|(_, _, _, result)| result).collect()
    }

    /// The handler registered for an intent id.
    pub fn handler(&self, intent_id: &str) -> Option<Arc<dyn IntentHandler>> {
        self.intents
            .iter()
            .find(|i| i.id == intent_id)
            .map(|i| i.handler.clone())
    }
}

impl std::fmt::Debug for IntentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.intents.iter().map(|i| i.id.as_str()).collect();
        f.debug_struct("IntentRegistry").field("intents", &ids).finish()
    }
}

/// Builds the registry once at startup; all validation happens here.
pub struct IntentRegistryBuilder {
    descriptors: Vec<IntentDescriptor>,
}

impl IntentRegistryBuilder {
    /// Registers one intent descriptor.
    pub fn register(mut self, descriptor: IntentDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Compiles patterns and freezes the registry.
    ///
    /// Fails on an intent with zero patterns, a duplicate id, or a pattern
    /// that does not compile.
    pub fn build(self) -> Result<IntentRegistry, RegistrationError> {
        let mut seen = HashSet::new();
        let mut intents = Vec::with_capacity(self.descriptors.len());

        for descriptor in self.descriptors {
            if !seen.insert(descriptor.id.clone()) {
                return Err(RegistrationError::DuplicateIntent {
                    intent_id: descriptor.id,
                });
            }
            if descriptor.patterns.is_empty() {
                return Err(RegistrationError::EmptyPatterns {
                    intent_id: descriptor.id,
                });
            }

            let mut patterns = Vec::with_capacity(descriptor.patterns.len());
            for spec in &descriptor.patterns {
                patterns.push(CompiledPattern::compile(spec, &descriptor.id)?);
            }

            intents.push(RegisteredIntent {
                id: descriptor.id,
                priority: descriptor.priority,
                patterns,
                handler: descriptor.handler,
            });
        }

        Ok(IntentRegistry { intents })
    }
}

//! Dispatcher - decides, per inbound message, between a registered intent
//! handler and the AI conversation path.
//!
//! The decision is a confidence gate: the best intent match must clear the
//! acceptance threshold AND beat the runner-up by a clear margin, otherwise
//! the message is treated as open conversation. A handler that fails at
//! runtime also falls through to the AI path, so the user always gets an
//! answer from a single dispatch.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::ports::Message;

use super::intent::{HandlerInvocation, IntentRegistry, MatchResult};
use super::orchestrator::{AiOrchestrator, OrchestratorError};
use super::routing::TaskTier;
use super::session::{SessionContext, Turn};

/// Messages this short or shorter (in words) are treated as basic chat.
const BASIC_WORD_LIMIT: usize = 4;
/// Messages longer than this (in words) get the complex tier.
const COMPLEX_WORD_LIMIT: usize = 80;

const RESEARCH_KEYWORDS: &[&str] = &[
    "research",
    "look up",
    "find out",
    "sources",
    "compare",
    "investigate",
];

const ANALYTICAL_KEYWORDS: &[&str] = &[
    "analyze",
    "analyse",
    "explain why",
    "summarize",
    "summarise",
    "strategy",
    "plan out",
    "in detail",
];

/// Confidence gate and fallback wording for dispatch decisions.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    /// Minimum confidence for the best match to take the handler path.
    pub accept_threshold: f64,
    /// Required lead over the runner-up; a narrower lead is ambiguous.
    pub margin: f64,
    /// Reply used when the whole provider chain is exhausted.
    pub degraded_reply: String,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            accept_threshold: 0.75,
            margin: 0.1,
            degraded_reply:
                "I'm having trouble responding right now. Please try again in a moment."
                    .to_string(),
        }
    }
}

/// Which path produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Handler,
    Ai,
}

/// The reply plus routing metadata for one dispatched message.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub reply: String,
    pub source: ReplySource,
    /// Provider that answered, when the AI path was taken.
    pub provider: Option<String>,
    /// Winning intent id, when the handler path was taken.
    pub intent: Option<String>,
    /// Confidence of the winning intent match, when one was accepted.
    pub confidence: Option<f64>,
    /// True when the reply came from a degraded path (cooldown override or
    /// total provider exhaustion).
    pub degraded: bool,
}

/// Routes each message to a handler or the AI orchestrator.
#[derive(Debug)]
pub struct Dispatcher {
    registry: IntentRegistry,
    orchestrator: AiOrchestrator,
    policy: DispatchPolicy,
}

impl Dispatcher {
    /// Creates a dispatcher over a built registry and orchestrator.
    pub fn new(
        registry: IntentRegistry,
        orchestrator: AiOrchestrator,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            registry,
            orchestrator,
            policy,
        }
    }

    /// The orchestrator, for shared-state access (health snapshots).
    pub fn orchestrator(&self) -> &AiOrchestrator {
        &self.orchestrator
    }

    /// Dispatch one user message within its conversation context.
    ///
    /// Infallible by construction: every failure path degrades to a reply
    /// rather than an error. Appends both the user turn and the reply turn
    /// to the session.
    pub async fn handle(
        &self,
        message: &str,
        session: &mut SessionContext,
        tier_override: Option<TaskTier>,
        now: DateTime<Utc>,
    ) -> DispatchOutcome {
        session.push_turn(Turn::user(message, now));

        if let Some(winner) = self.accepted_match(message) {
            match self.run_handler(&winner, message, session).await {
                Some(reply) => {
                    info!(
                        conversation = session.conversation_id(),
                        intent = %winner.intent_id,
                        confidence = winner.confidence,
                        "handler path"
                    );
                    for (kind, value) in &winner.slots {
                        session.remember_entity(kind.clone(), value.clone());
                    }
                    session.push_turn(Turn::assistant(reply.clone(), now));
                    return DispatchOutcome {
                        reply,
                        source: ReplySource::Handler,
                        provider: None,
                        intent: Some(winner.intent_id),
                        confidence: Some(winner.confidence),
                        degraded: false,
                    };
                }
                None => {
                    // Fall through to AI; run_handler already logged the error.
                }
            }
        }

        let tier = tier_override.unwrap_or_else(|| derive_tier(message));
        let history = self.conversation_messages(session);

        match self.orchestrator.respond(history, tier, now).await {
            Ok(ai) => {
                info!(
                    conversation = session.conversation_id(),
                    provider = %ai.provider,
                    %tier,
                    degraded = ai.degraded,
                    "ai path"
                );
                session.push_turn(Turn::assistant(ai.content.clone(), now));
                DispatchOutcome {
                    reply: ai.content,
                    source: ReplySource::Ai,
                    provider: Some(ai.provider),
                    intent: None,
                    confidence: None,
                    degraded: ai.degraded,
                }
            }
            Err(err) => {
                warn!(
                    conversation = session.conversation_id(),
                    %tier,
                    error = %err,
                    "ai path unavailable, degraded reply"
                );
                let reply = self.policy.degraded_reply.clone();
                session.push_turn(Turn::assistant(reply.clone(), now));
                DispatchOutcome {
                    reply,
                    source: ReplySource::Ai,
                    provider: None,
                    intent: None,
                    confidence: None,
                    degraded: true,
                }
            }
        }
    }

    /// The best intent match, if it clears the threshold and margin gate.
    fn accepted_match(&self, message: &str) -> Option<MatchResult> {
        let mut matches = self.registry.lookup(message);
        if matches.is_empty() {
            return None;
        }

        let top = matches.remove(0);
        if top.confidence < self.policy.accept_threshold {
            debug!(
                intent = %top.intent_id,
                confidence = top.confidence,
                "best match below threshold"
            );
            return None;
        }
        if let Some(runner_up) = matches.first() {
            if top.confidence - runner_up.confidence < self.policy.margin {
                debug!(
                    intent = %top.intent_id,
                    runner_up = %runner_up.intent_id,
                    lead = top.confidence - runner_up.confidence,
                    "ambiguous intent match"
                );
                return None;
            }
        }
        Some(top)
    }

    /// Run the winning handler; `None` means fall through to the AI path.
    async fn run_handler(
        &self,
        winner: &MatchResult,
        message: &str,
        session: &SessionContext,
    ) -> Option<String> {
        let handler = self.registry.handler(&winner.intent_id)?;
        let invocation = HandlerInvocation {
            message,
            slots: &winner.slots,
            session,
        };
        match handler.execute(invocation).await {
            Ok(reply) => Some(reply.text),
            Err(err) => {
                warn!(
                    intent = %winner.intent_id,
                    error = %err,
                    "handler failed, falling through to ai path"
                );
                None
            }
        }
    }

    /// Session history as provider messages, oldest first.
    ///
    /// The just-pushed user turn is included, so this is the full prompt.
    fn conversation_messages(&self, session: &SessionContext) -> Vec<Message> {
        session
            .turns()
            .map(|turn| match turn.role {
                super::session::TurnRole::User => Message::user(&turn.content),
                super::session::TurnRole::Assistant => Message::assistant(&turn.content),
            })
            .collect()
    }
}

/// Heuristic task tier for a message without an explicit override.
pub fn derive_tier(message: &str) -> TaskTier {
    let lowered = message.to_lowercase();
    let words = lowered.split_whitespace().count();

    if RESEARCH_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return TaskTier::Research;
    }
    if words > COMPLEX_WORD_LIMIT
        || ANALYTICAL_KEYWORDS.iter().any(|k| lowered.contains(k))
    {
        return TaskTier::Complex;
    }
    if words <= BASIC_WORD_LIMIT {
        return TaskTier::Basic;
    }
    TaskTier::Standard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intent::{
        HandlerError, HandlerReply, IntentDescriptor, IntentHandler, IntentRegistry,
    };
    use crate::domain::routing::{
        BackoffPolicy, HealthTracker, ProviderDescriptor, ServiceSelector,
    };
    use crate::ports::{
        AiProvider, CompletionRequest, CompletionResponse, ProviderError, ProviderInfo,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn t0() -> DateTime<Utc> {
        "2025-01-15T12:00:00Z".parse().unwrap()
    }

    struct ScriptedProvider {
        outcomes: Mutex<Vec<Result<String, ProviderError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AiProvider for ScriptedProvider {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut outcomes = self.outcomes.lock().await;
            if outcomes.is_empty() {
                return Ok(CompletionResponse {
                    content: "ai reply".to_string(),
                    model: "scripted".to_string(),
                });
            }
            outcomes.remove(0).map(|content| CompletionResponse {
                content,
                model: "scripted".to_string(),
            })
        }

        fn provider_info(&self) -> ProviderInfo {
            ProviderInfo::new("scripted", "scripted")
        }
    }

    struct EchoHandler;

    #[async_trait]
    impl IntentHandler for EchoHandler {
        async fn execute(
            &self,
            invocation: HandlerInvocation<'_>,
        ) -> Result<HandlerReply, HandlerError> {
            let task = invocation
                .slots
                .get("task")
                .map(String::as_str)
                .unwrap_or("it");
            Ok(HandlerReply::new(format!("Reminder set for {task}")))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl IntentHandler for FailingHandler {
        async fn execute(
            &self,
            _invocation: HandlerInvocation<'_>,
        ) -> Result<HandlerReply, HandlerError> {
            Err(HandlerError::Collaborator("scheduler offline".to_string()))
        }
    }

    fn dispatcher_with(
        registry: IntentRegistry,
        provider: Arc<ScriptedProvider>,
    ) -> Dispatcher {
        let descriptors = vec![ProviderDescriptor::new(
            "scripted",
            TaskTier::all().to_vec(),
            1,
            60,
        )];
        let health = Arc::new(HealthTracker::new(
            vec!["scripted".to_string()],
            BackoffPolicy::default(),
        ));
        let selector = ServiceSelector::new(descriptors, health.clone()).unwrap();
        let mut adapters: HashMap<String, Arc<dyn AiProvider>> = HashMap::new();
        adapters.insert("scripted".to_string(), provider);
        let orchestrator =
            AiOrchestrator::new(selector, adapters, health, Duration::from_secs(5)).unwrap();
        Dispatcher::new(registry, orchestrator, DispatchPolicy::default())
    }

    fn reminder_registry() -> IntentRegistry {
        IntentRegistry::builder()
            .register(
                IntentDescriptor::new("create_reminder", Arc::new(EchoHandler))
                    .with_keywords(["remind me"])
                    .with_phrase("remind me to {task} at {time}"),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn confident_match_takes_the_handler_path() {
        let provider = ScriptedProvider::new(vec![]);
        let dispatcher = dispatcher_with(reminder_registry(), provider.clone());
        let mut session = SessionContext::new("conv-1", 12);

        let outcome = dispatcher
            .handle("remind me to call mom at 5pm", &mut session, None, t0())
            .await;

        assert_eq!(outcome.source, ReplySource::Handler);
        assert_eq!(outcome.intent.as_deref(), Some("create_reminder"));
        assert_eq!(outcome.confidence, Some(0.95));
        assert!(!outcome.degraded);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn handler_path_captures_slot_entities() {
        let provider = ScriptedProvider::new(vec![]);
        let dispatcher = dispatcher_with(reminder_registry(), provider);
        let mut session = SessionContext::new("conv-1", 12);

        dispatcher
            .handle("remind me to water plants at 6pm", &mut session, None, t0())
            .await;

        assert_eq!(session.entity("task"), Some("water plants"));
        assert_eq!(session.entity("time"), Some("6pm"));
    }

    #[tokio::test]
    async fn unmatched_message_takes_the_ai_path() {
        let provider = ScriptedProvider::new(vec![Ok("the weather is nice".to_string())]);
        let dispatcher = dispatcher_with(reminder_registry(), provider.clone());
        let mut session = SessionContext::new("conv-1", 12);

        let outcome = dispatcher
            .handle("what do you think about the weather", &mut session, None, t0())
            .await;

        assert_eq!(outcome.source, ReplySource::Ai);
        assert_eq!(outcome.reply, "the weather is nice");
        assert_eq!(outcome.provider.as_deref(), Some("scripted"));
        assert!(outcome.intent.is_none());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn ambiguous_matches_take_the_ai_path() {
        let registry = IntentRegistry::builder()
            .register(
                IntentDescriptor::new("create_reminder", Arc::new(EchoHandler))
                    .with_keywords(["log"]),
            )
            .register(
                IntentDescriptor::new("log_entry", Arc::new(EchoHandler))
                    .with_keywords(["log"]),
            )
            .build()
            .unwrap();
        let provider = ScriptedProvider::new(vec![Ok("sure".to_string())]);
        let dispatcher = dispatcher_with(registry, provider.clone());
        let mut session = SessionContext::new("conv-1", 12);

        // Both intents score 0.95; the lead is zero, below the margin.
        let outcome = dispatcher.handle("log something for today", &mut session, None, t0()).await;

        assert_eq!(outcome.source, ReplySource::Ai);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn failing_handler_falls_through_to_ai() {
        let registry = IntentRegistry::builder()
            .register(
                IntentDescriptor::new("create_reminder", Arc::new(FailingHandler))
                    .with_keywords(["remind me"]),
            )
            .build()
            .unwrap();
        let provider = ScriptedProvider::new(vec![Ok("I noted that down".to_string())]);
        let dispatcher = dispatcher_with(registry, provider.clone());
        let mut session = SessionContext::new("conv-1", 12);

        let outcome = dispatcher
            .handle("remind me to stretch", &mut session, None, t0())
            .await;

        assert_eq!(outcome.source, ReplySource::Ai);
        assert_eq!(outcome.reply, "I noted that down");
        assert!(!outcome.degraded);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn exhausted_providers_yield_the_degraded_reply() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::server(503, "down"))]);
        let dispatcher = dispatcher_with(reminder_registry(), provider);
        let mut session = SessionContext::new("conv-1", 12);

        let outcome = dispatcher
            .handle("tell me something interesting please", &mut session, None, t0())
            .await;

        assert_eq!(outcome.source, ReplySource::Ai);
        assert!(outcome.degraded);
        assert_eq!(
            outcome.reply,
            DispatchPolicy::default().degraded_reply
        );
        // Both the user turn and the degraded reply are retained.
        assert_eq!(session.turn_count(), 2);
    }

    #[tokio::test]
    async fn both_turns_are_appended_on_the_handler_path() {
        let provider = ScriptedProvider::new(vec![]);
        let dispatcher = dispatcher_with(reminder_registry(), provider);
        let mut session = SessionContext::new("conv-1", 12);

        dispatcher
            .handle("remind me to call mom at 5pm", &mut session, None, t0())
            .await;

        let contents: Vec<&str> = session.turns().map(|t| t.content.as_str()).collect();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0], "remind me to call mom at 5pm");
        assert!(contents[1].contains("call mom"));
    }

    #[tokio::test]
    async fn tier_override_is_respected() {
        let provider = ScriptedProvider::new(vec![Ok("deep answer".to_string())]);
        let dispatcher = dispatcher_with(reminder_registry(), provider);
        let mut session = SessionContext::new("conv-1", 12);

        let outcome = dispatcher
            .handle("hi", &mut session, Some(TaskTier::Complex), t0())
            .await;

        assert_eq!(outcome.reply, "deep answer");
    }

    #[test]
    fn short_messages_derive_the_basic_tier() {
        assert_eq!(derive_tier("hi"), TaskTier::Basic);
        assert_eq!(derive_tier("how are you today"), TaskTier::Basic);
    }

    #[test]
    fn ordinary_messages_derive_the_standard_tier() {
        assert_eq!(
            derive_tier("I've been feeling really anxious lately"),
            TaskTier::Standard
        );
    }

    #[test]
    fn research_keywords_derive_the_research_tier() {
        assert_eq!(
            derive_tier("can you look up flight prices to Lisbon"),
            TaskTier::Research
        );
        assert_eq!(
            derive_tier("compare these two phone plans with sources"),
            TaskTier::Research
        );
    }

    #[test]
    fn analytical_or_long_messages_derive_the_complex_tier() {
        assert_eq!(
            derive_tier("analyze my spending habits from last month"),
            TaskTier::Complex
        );

        let long = "word ".repeat(90);
        assert_eq!(derive_tier(&long), TaskTier::Complex);
    }
}

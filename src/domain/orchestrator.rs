//! AI Orchestrator - walks the fallback chain for one completion.
//!
//! The orchestrator asks the selector for an ordered candidate list, then
//! tries each provider in turn. The first success short-circuits the chain;
//! every attempt (success or failure) is reported to the health tracker so
//! selection ordering reflects live provider behavior.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::ports::{
    AiProvider, CompletionRequest, ErrorClass, Message, ProviderError,
};

use super::routing::{HealthTracker, ServiceSelector, TaskTier};
use super::RegistrationError;

/// A completed AI response with routing metadata.
#[derive(Debug, Clone)]
pub struct AiReply {
    pub content: String,
    /// Registered name of the provider that answered.
    pub provider: String,
    /// Model the provider reported.
    pub model: String,
    /// True when the answer came from a cooling-down provider because the
    /// whole tier was in cooldown.
    pub degraded: bool,
}

/// One failed attempt in an exhausted chain.
#[derive(Debug, Clone)]
pub struct ProviderAttempt {
    pub provider: String,
    pub class: ErrorClass,
    pub detail: String,
}

/// The fallback chain produced no response.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No registered provider has affinity for the requested tier.
    #[error("no provider registered for tier '{tier}'")]
    NoProviders { tier: TaskTier },

    /// Every candidate failed; per-attempt details are preserved.
    #[error("all {count} providers failed for tier '{tier}'", count = attempts.len())]
    Exhausted {
        tier: TaskTier,
        attempts: Vec<ProviderAttempt>,
    },
}

/// Drives provider selection and the fallback chain.
pub struct AiOrchestrator {
    selector: ServiceSelector,
    adapters: HashMap<String, Arc<dyn AiProvider>>,
    health: Arc<HealthTracker>,
    call_timeout: Duration,
}

impl AiOrchestrator {
    /// Creates an orchestrator over the selector's registered providers.
    ///
    /// Every descriptor the selector knows must have an adapter; a missing
    /// adapter is a startup error, never discovered mid-dispatch.
    pub fn new(
        selector: ServiceSelector,
        adapters: HashMap<String, Arc<dyn AiProvider>>,
        health: Arc<HealthTracker>,
        call_timeout: Duration,
    ) -> Result<Self, RegistrationError> {
        for descriptor in selector.descriptors() {
            if !adapters.contains_key(&descriptor.name) {
                return Err(RegistrationError::MissingAdapter {
                    name: descriptor.name.clone(),
                });
            }
        }
        Ok(Self {
            selector,
            adapters,
            health,
            call_timeout,
        })
    }

    /// The shared health tracker, for observability endpoints.
    pub fn health(&self) -> Arc<HealthTracker> {
        self.health.clone()
    }

    /// Produce one completion for the conversation at the given tier.
    ///
    /// Tries candidates in selector order; the first success wins and no
    /// further provider is called. Failures are classified, recorded, and
    /// carried into the aggregate error when the whole chain is exhausted.
    pub async fn respond(
        &self,
        messages: Vec<Message>,
        tier: TaskTier,
        now: DateTime<Utc>,
    ) -> Result<AiReply, OrchestratorError> {
        let request_id = Uuid::new_v4();
        let selection = self.selector.select(tier, now).await;

        if selection.candidates.is_empty() {
            error!(%request_id, %tier, "no provider has affinity for tier");
            return Err(OrchestratorError::NoProviders { tier });
        }

        debug!(
            %request_id,
            %tier,
            candidates = selection.candidates.len(),
            degraded = selection.degraded,
            "provider chain selected"
        );

        let mut attempts = Vec::new();

        for descriptor in &selection.candidates {
            // Registration guarantees the adapter exists; a gap here means a
            // bug in construction, so skip rather than panic.
            let Some(adapter) = self.adapters.get(&descriptor.name) else {
                warn!(%request_id, provider = %descriptor.name, "descriptor without adapter, skipping");
                continue;
            };

            let request = CompletionRequest::new(self.call_timeout)
                .with_messages(messages.clone());

            match self.attempt(adapter.as_ref(), request).await {
                Ok(response) => {
                    self.health.record_success(&descriptor.name, now).await;
                    info!(
                        %request_id,
                        provider = %descriptor.name,
                        model = %response.model,
                        attempts = attempts.len() + 1,
                        "completion succeeded"
                    );
                    return Ok(AiReply {
                        content: response.content,
                        provider: descriptor.name.clone(),
                        model: response.model,
                        degraded: selection.degraded,
                    });
                }
                Err(err) => {
                    let class = err.class();
                    self.health
                        .record_failure(&descriptor.name, class, now)
                        .await;
                    warn!(
                        %request_id,
                        provider = %descriptor.name,
                        %class,
                        error = %err,
                        "provider attempt failed, trying next candidate"
                    );
                    attempts.push(ProviderAttempt {
                        provider: descriptor.name.clone(),
                        class,
                        detail: err.to_string(),
                    });
                }
            }
        }

        error!(
            %request_id,
            %tier,
            attempts = attempts.len(),
            "provider chain exhausted"
        );
        Err(OrchestratorError::Exhausted { tier, attempts })
    }

    /// One provider call under the orchestrator-level timeout.
    ///
    /// Adapters enforce the timeout on their own transport too; this outer
    /// bound covers adapters that hang before issuing a request.
    async fn attempt(
        &self,
        adapter: &dyn AiProvider,
        request: CompletionRequest,
    ) -> Result<crate::ports::CompletionResponse, ProviderError> {
        match tokio::time::timeout(self.call_timeout, adapter.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_secs: self.call_timeout.as_secs() as u32,
            }),
        }
    }
}

impl std::fmt::Debug for AiOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiOrchestrator")
            .field("providers", &self.adapters.keys().collect::<Vec<_>>())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

//! companion-core server binary.
//!
//! Loads configuration, wires the routing core (health tracker, selector,
//! orchestrator, intent registry, dispatcher), and serves the chat HTTP
//! surface. All registration validation happens here, before the listener
//! binds; a malformed setup never serves traffic.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use companion_core::adapters::ai::{
    GeminiConfig, GeminiProvider, MockProvider, OpenRouterConfig, OpenRouterProvider,
};
use companion_core::adapters::http::chat::{self, ChatAppState};
use companion_core::adapters::memory::InMemoryMemoryStore;
use companion_core::adapters::services::{InMemoryJournalLog, InMemoryReminderScheduler};
use companion_core::application::handlers::intents::{CreateReminderHandler, LogEntryHandler};
use companion_core::config::{AppConfig, ProviderEntry, ProviderKind};
use companion_core::domain::dispatcher::{DispatchPolicy, Dispatcher};
use companion_core::domain::intent::IntentRegistry;
use companion_core::domain::orchestrator::AiOrchestrator;
use companion_core::domain::routing::{BackoffPolicy, HealthTracker, ServiceSelector};
use companion_core::domain::session::SessionRegistry;
use companion_core::ports::AiProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    config.validate()?;

    let provider_names: Vec<String> =
        config.ai.providers.iter().map(|p| p.name.clone()).collect();
    let health = Arc::new(HealthTracker::new(provider_names, BackoffPolicy::default()));
    let selector = ServiceSelector::new(config.ai.descriptors(), health.clone())?;

    let mut adapters: HashMap<String, Arc<dyn AiProvider>> = HashMap::new();
    for entry in &config.ai.providers {
        adapters.insert(entry.name.clone(), build_provider(entry)?);
    }

    let orchestrator =
        AiOrchestrator::new(selector, adapters, health.clone(), config.ai.call_timeout())?;

    let scheduler = Arc::new(InMemoryReminderScheduler::new());
    let journal = Arc::new(InMemoryJournalLog::new());
    let registry = IntentRegistry::builder()
        .register(CreateReminderHandler::descriptor(scheduler))
        .register(LogEntryHandler::descriptor(journal))
        .build()?;

    let policy = DispatchPolicy {
        accept_threshold: config.dispatch.accept_threshold,
        margin: config.dispatch.margin,
        degraded_reply: config.dispatch.degraded_reply.clone(),
    };
    let dispatcher = Arc::new(Dispatcher::new(registry, orchestrator, policy));

    let sessions = Arc::new(SessionRegistry::new(config.dispatch.max_recent_turns));
    let memory = Arc::new(InMemoryMemoryStore::new());

    let state = ChatAppState::new(dispatcher, sessions, memory, health);

    let app = chat::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?)
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let addr = config.server.socket_addr()?;
    info!(%addr, environment = ?config.server.environment, "starting companion-core");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Construct the adapter for one configured provider entry.
fn build_provider(entry: &ProviderEntry) -> Result<Arc<dyn AiProvider>, Box<dyn std::error::Error>> {
    match entry.kind {
        ProviderKind::Gemini => {
            let api_key = entry
                .api_key
                .clone()
                .ok_or_else(|| format!("provider '{}' is missing an api key", entry.name))?;
            let provider = GeminiProvider::new(
                GeminiConfig::new(&entry.name, api_key).with_model(&entry.model),
            )?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Openrouter => {
            let api_key = entry
                .api_key
                .clone()
                .ok_or_else(|| format!("provider '{}' is missing an api key", entry.name))?;
            let provider = OpenRouterProvider::new(
                OpenRouterConfig::new(&entry.name, api_key).with_model(&entry.model),
            )?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Mock => Ok(Arc::new(MockProvider::new(&entry.name))),
    }
}

/// CORS policy from configuration.
///
/// Explicit origins when configured; otherwise permissive outside production
/// and locked down in it.
fn cors_layer(config: &AppConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let origins = config.server.cors_origins_list();
    if origins.is_empty() {
        if config.is_production() {
            return Ok(CorsLayer::new());
        }
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let parsed: Result<Vec<HeaderValue>, _> =
        origins.iter().map(|o| o.parse::<HeaderValue>()).collect();
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed?))
        .allow_methods(Any)
        .allow_headers(Any))
}

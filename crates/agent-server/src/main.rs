//! Note Agent HTTP Server
//!
//! Axum-based server that runs requests through the agent loop with the
//! note tools attached.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{routing::{get, post}, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{Agent, LlmProvider};
use agent_runtime::AnthropicProvider;
use note_tools::{MemoryNoteStore, NoteStore, WeaviateStore};

use crate::config::{ServerConfig, StoreBackend};
use crate::handlers::{chat_handler, health_check};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Initialize LLM provider
    let provider: Arc<dyn LlmProvider> = Arc::new(AnthropicProvider::from_env()?);
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to {}", provider.name()),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {} not reachable - requests will fail", provider.name());
            tracing::warn!("  Check ANTHROPIC_API_KEY and ANTHROPIC_BASE_URL");
        }
    }

    // Initialize note store
    let store: Arc<dyn NoteStore> = match config.store {
        StoreBackend::Weaviate => Arc::new(WeaviateStore::from_env()?),
        StoreBackend::Memory => Arc::new(MemoryNoteStore::new()),
    };
    if store.health_check().await {
        tracing::info!("✓ Note store ready ({})", store.name());
    } else {
        tracing::warn!("⚠ Note store {} not ready - note tools will report errors", store.name());
        tracing::warn!("  Run `init-notes` once Weaviate is up");
    }

    // Initialize tools
    let tools = Arc::new(note_tools::registry(store.clone())?);
    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let state = AppState {
        provider,
        tools,
        store,
        config: Arc::new(config),
    };

    if let Some(prompt) = state.config.startup_prompt.clone() {
        run_startup_prompt(&state, &prompt).await;
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let addr = state.config.bind_addr.clone();
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 note agent server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health   - Health check");
    tracing::info!("  POST /api/chat - Run a request through the agent");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Answer `AGENT_PROMPT` once and print the result
async fn run_startup_prompt(state: &AppState, prompt: &str) {
    let agent = Agent::new(
        state.provider.clone(),
        state.tools.clone(),
        state.config.agent.clone(),
    );

    tracing::info!(prompt, "Running startup prompt");
    match agent.ask(prompt).await {
        Ok(transcript) => {
            tracing::info!(
                iterations = transcript.run.iterations,
                "Startup prompt answered"
            );
            println!("{}", transcript.run.final_text);
        }
        Err(e) => tracing::error!(code = e.code(), "Startup prompt failed: {}", e),
    }
}

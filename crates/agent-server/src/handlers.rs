//! HTTP Handlers

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use agent_core::{Agent, AgentError, Conversation, Transcript};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider_connected: bool,
    pub store_connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub model: String,
    pub iterations: usize,
    pub conversation: Conversation,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_status(err: &AgentError) -> StatusCode {
    if err.is_completion_failure() {
        StatusCode::BAD_GATEWAY
    } else if matches!(err, AgentError::Cancelled) {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn api_error(err: &AgentError) -> ApiError {
    (
        error_status(err),
        Json(ErrorResponse {
            error: err.user_message(),
            code: err.code().into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (provider_connected, store_connected) =
        tokio::join!(state.provider.health_check(), state.store.health_check());

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider_connected: provider_connected.unwrap_or(false),
        store_connected,
    })
}

/// Run `message` through the agent, cancelling the run once `limit` elapses.
///
/// The deadline lives in this future, so dropping it (client gone) drops
/// the timer with it.
async fn ask_within(agent: &Agent, message: &str, limit: Duration) -> agent_core::Result<Transcript> {
    let cancel = CancellationToken::new();
    let run = agent.ask_with_cancel(message, cancel.clone());
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => result,
        () = tokio::time::sleep(limit) => {
            tracing::warn!(?limit, "Run deadline reached, cancelling");
            cancel.cancel();
            run.await
        }
    }
}

/// Run one request through the agent loop
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Message must not be empty".into(),
                code: "EMPTY_MESSAGE".into(),
            }),
        ));
    }

    let mut config = state.config.agent.clone();
    if let Some(model) = payload.model {
        config.generation.model = model;
    }
    let model = config.generation.model.clone();

    let agent = Agent::new(state.provider.clone(), state.tools.clone(), config);

    let transcript = ask_within(&agent, &payload.message, state.config.run_timeout)
        .await
        .map_err(|e| {
            tracing::error!(code = e.code(), "Agent error: {}", e);
            api_error(&e)
        })?;

    tracing::info!(
        iterations = transcript.run.iterations,
        turns = transcript.conversation.len(),
        tokens = transcript.run.usage.total(),
        "Chat request answered"
    );

    Ok(Json(ChatResponse {
        message: transcript.run.final_text,
        model,
        iterations: transcript.run.iterations,
        conversation: transcript.conversation,
    }))
}

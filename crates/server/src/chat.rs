//! The `/chat` endpoint.
//!
//! One turn per request: classify first (so the intent can travel as a
//! response header), then stream the delegated agent's events as SSE
//! `data:` lines terminated by `data: [DONE]`. Failures before the stream
//! starts map to JSON error bodies with the taxonomy's status codes; a
//! dropped connection stops generation through channel backpressure.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{error, info};

use slidesmith_agent::{to_chat_history, Orchestrator};
use slidesmith_core::errors::ChatError;
use slidesmith_core::message::Message;
use slidesmith_core::protocol::{encode_done, encode_event};

pub const INTENT_HEADER: &str = "x-agent-intent";
pub const TARGET_SLIDE_HEADER: &str = "x-agent-target-slide";

/// Events buffered between the runner and a slow client before the producer
/// awaits.
const STREAM_CHANNEL_CAPACITY: usize = 32;

#[derive(Clone)]
pub struct ChatState {
    /// `None` when no language model is bound; every turn then fails with a
    /// configuration error before any classification attempt.
    pub orchestrator: Option<Arc<Orchestrator>>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub context: String,
    pub theme: Option<String>,
}

pub fn router(state: ChatState) -> Router {
    Router::new().route("/chat", post(chat)).with_state(state)
}

fn error_response(error: ChatError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = Json(json!({
        "error": error.error_class(),
        "details": error.to_string(),
    }));
    (status, body).into_response()
}

pub async fn chat(State(state): State<ChatState>, Json(request): Json<ChatRequest>) -> Response {
    let Some(orchestrator) = state.orchestrator else {
        return error_response(ChatError::Configuration(
            "set llm.model (or SLIDESMITH_LLM_MODEL) to enable chat".to_string(),
        ));
    };

    let history = to_chat_history(&request.messages);
    let intent = match orchestrator.route(&history, &request.context).await {
        Ok(intent) => intent,
        Err(routing_error) => {
            error!(
                event_name = "ai.chat.routing_failed",
                error = %routing_error,
                "turn failed before delegation"
            );
            return error_response(routing_error);
        }
    };

    info!(
        event_name = "ai.chat.turn_started",
        intent = intent.kind.as_str(),
        messages = request.messages.len(),
        "delegating chat turn"
    );

    let (events_tx, events_rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
    let context = request.context;
    let theme = request.theme;
    tokio::spawn(async move {
        let result = orchestrator
            .execute(intent, history, &context, theme.as_deref(), &events_tx)
            .await;
        if let Err(agent_error) = result {
            error!(
                event_name = "ai.chat.agent_failed",
                intent = intent.kind.as_str(),
                error = %agent_error,
                "agent turn failed mid-stream"
            );
        }
    });

    let events = futures_util::stream::unfold(events_rx, |mut events_rx| async move {
        events_rx.recv().await.map(|event| (event, events_rx))
    });
    let body_stream = events
        .map(|event| encode_event(&event).unwrap_or_default())
        .chain(futures_util::stream::once(async { encode_done() }))
        .map(|line| Ok::<_, Infallible>(Bytes::from(line)));

    let mut response = Response::new(Body::from_stream(body_stream));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
        .headers_mut()
        .insert(INTENT_HEADER, HeaderValue::from_static(intent.kind.as_str()));
    if let Some(target_slide) = intent.target_slide {
        if let Ok(value) = HeaderValue::from_str(&target_slide.to_string()) {
            response.headers_mut().insert(TARGET_SLIDE_HEADER, value);
        }
    }
    response
}

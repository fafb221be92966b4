//! The language-model seam.
//!
//! The model is an opaque capability: given a system prompt, a message list,
//! and a tool schema set, it produces either one structured JSON answer or a
//! stream of text/tool chunks. Everything above this trait is
//! provider-agnostic.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use slidesmith_core::message::{Message, Part, Role};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model answered with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("model response could not be interpreted: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error.to_string())
    }
}

/// One message in provider wire shape (OpenAI chat-completions layout).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: WireFunction,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireFunction {
    pub name: String,
    pub arguments: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: Some(content.into()), tool_calls: None, tool_call_id: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: Some(content.into()), tool_calls: None, tool_call_id: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_with_tools(content: String, tool_calls: Vec<WireToolCall>) -> Self {
        Self {
            role: "assistant".into(),
            content: if content.is_empty() { None } else { Some(content) },
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Flatten stored conversation history into provider wire shape. Text parts
/// concatenate in order; tool invocations travel through the tool channel and
/// are not replayed as prose.
pub fn to_chat_history(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|message| {
            let text = message.plain_text();
            let content = if text.is_empty() {
                // A tool-only assistant turn still needs a content slot.
                message
                    .parts
                    .iter()
                    .find_map(|part| match part {
                        Part::ToolInvocation { result: Some(result), .. } => Some(result.clone()),
                        _ => None,
                    })
                    .unwrap_or_default()
            } else {
                text
            };
            match message.role {
                Role::User => ChatMessage::user(content),
                Role::Assistant => ChatMessage::assistant(content),
                Role::System => ChatMessage::system(content),
            }
        })
        .collect()
}

/// A tool call as the model emitted it: arguments are the raw accumulated
/// string, not yet parsed or validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// One fragment of a streaming model step. A `ToolCall` chunk is only emitted
/// once its arguments have fully accumulated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepChunk {
    TextDelta(String),
    ToolCall(ToolCallRequest),
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StepChunk, LlmError>> + Send>>;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// One non-streaming completion constrained to a single JSON object.
    /// Used by the orchestrator's classification call.
    async fn complete_json(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<Value, LlmError>;

    /// One streaming model step with the given tool schemas bound.
    async fn stream_step(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ChunkStream, LlmError>;
}

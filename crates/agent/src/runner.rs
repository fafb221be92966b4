//! Bounded multi-step agent loop.
//!
//! Each step is one streaming model turn. Text deltas are forwarded to the
//! event channel as they arrive; completed tool calls are validated against
//! the catalog and the profile's bound subset, emitted as
//! `tool-input-available` events, and their deterministic rendering is fed
//! back to the model as the tool result. A step with no tool calls is the
//! final answer; the step ceiling force-stops everything else.

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use slidesmith_core::errors::{ChatError, ValidationError};
use slidesmith_core::proposal::{ProposalInput, ProposalKind};
use slidesmith_core::protocol::{StreamEvent, ToolCall};

use crate::llm::{
    ChatMessage, LanguageModel, LlmError, StepChunk, ToolCallRequest, WireFunction, WireToolCall,
};
use crate::profile::AgentProfile;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentReply {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

fn stream_failure(error: LlmError) -> ChatError {
    match error {
        LlmError::Status { status, message } => ChatError::Transport { status, message },
        LlmError::Request(message) | LlmError::MalformedResponse(message) => {
            ChatError::Transport { status: 502, message }
        }
    }
}

fn decode_call(
    profile: &AgentProfile,
    call: &ToolCallRequest,
) -> Result<(Value, ProposalInput), ValidationError> {
    if !profile.binds_tool(&call.name) {
        return Err(ValidationError::UnknownTool { tool_name: call.name.clone() });
    }
    // Bound tools are always catalog members, so the name lookup is total here.
    let tool_name = ProposalKind::from_tool_name(&call.name)
        .map(ProposalKind::tool_name)
        .unwrap_or("unknown");
    let input: Value = serde_json::from_str(&call.arguments).map_err(|error| {
        ValidationError::MalformedInput { tool_name, detail: error.to_string() }
    })?;
    let proposal = ProposalInput::parse(&call.name, &input)?;
    Ok((input, proposal))
}

pub async fn run_agent(
    model: &dyn LanguageModel,
    profile: &AgentProfile,
    system_prompt: &str,
    history: Vec<ChatMessage>,
    events: &mpsc::Sender<StreamEvent>,
) -> Result<AgentReply, ChatError> {
    let schemas = profile.tool_schemas();
    let mut messages = history;
    let mut reply = AgentReply::default();

    for step in 0..profile.step_limit {
        let mut stream = model
            .stream_step(system_prompt, &messages, &schemas)
            .await
            .map_err(stream_failure)?;

        let mut step_text = String::new();
        let mut step_calls: Vec<ToolCallRequest> = Vec::new();

        while let Some(chunk) = stream.next().await {
            match chunk.map_err(stream_failure)? {
                StepChunk::TextDelta(delta) => {
                    let event = StreamEvent::TextDelta { delta: delta.clone() };
                    if events.send(event).await.is_err() {
                        debug!(step, "stream consumer dropped, stopping generation");
                        return Ok(reply);
                    }
                    step_text.push_str(&delta);
                }
                StepChunk::ToolCall(call) => step_calls.push(call),
            }
        }

        reply.text.push_str(&step_text);

        if step_calls.is_empty() {
            // Final textual answer.
            return Ok(reply);
        }

        let wire_calls = step_calls
            .iter()
            .map(|call| WireToolCall {
                id: call.id.clone(),
                call_type: "function".to_string(),
                function: WireFunction { name: call.name.clone(), arguments: call.arguments.clone() },
            })
            .collect();
        messages.push(ChatMessage::assistant_with_tools(step_text, wire_calls));

        for call in step_calls {
            match decode_call(profile, &call) {
                Ok((input, proposal)) => {
                    let event = StreamEvent::ToolInputAvailable {
                        tool_call_id: call.id.clone(),
                        tool_name: call.name.clone(),
                        input: input.clone(),
                    };
                    if events.send(event).await.is_err() {
                        debug!(step, "stream consumer dropped, stopping generation");
                        return Ok(reply);
                    }
                    let rendered = proposal.format();
                    reply.tool_calls.push(ToolCall {
                        tool_call_id: call.id.clone(),
                        tool_name: call.name.clone(),
                        input,
                    });
                    messages.push(ChatMessage::tool_result(call.id, rendered));
                }
                Err(error) => {
                    // The malformed call is dropped from the decoded result,
                    // not retried; the model still needs a result slot for
                    // its call id.
                    warn!(step, tool = %call.name, %error, "dropping invalid tool call");
                    messages.push(ChatMessage::tool_result(
                        call.id,
                        format!("Proposal rejected: {error}"),
                    ));
                }
            }
        }
    }

    warn!(
        step_limit = profile.step_limit,
        agent = profile.kind.as_str(),
        "agent reached step ceiling without a final answer, force-stopping"
    );
    Ok(reply)
}

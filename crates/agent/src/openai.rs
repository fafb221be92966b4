//! OpenAI-compatible chat-completions client.
//!
//! Works against any endpoint speaking the `/chat/completions` dialect.
//! Streaming responses arrive as `data: ` SSE lines; tool-call arguments are
//! delivered as indexed fragments and are re-assembled here, so consumers
//! only ever see complete tool calls.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::debug;

use slidesmith_core::config::LlmConfig;

use crate::llm::{
    ChatMessage, ChunkStream, LanguageModel, LlmError, StepChunk, ToolCallRequest,
};

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    /// Build a client from config; `None` when no model is bound.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, LlmError> {
        let Some(model) = config.model.clone() else {
            return Ok(None);
        };
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(LlmError::from)?;
        Ok(Some(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.as_ref().map(|key| key.expose_secret().to_string()),
            model,
        }))
    }

    fn request(&self, body: &Value) -> reqwest::RequestBuilder {
        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.http.post(url).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    fn wire_messages(system: &str, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(ChatMessage::system(system));
        wire.extend(messages.iter().cloned());
        wire
    }
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(LlmError::Status { status: status.as_u16(), message })
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete_json(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<Value, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": Self::wire_messages(system, messages),
            "response_format": { "type": "json_object" },
            "stream": false,
        });

        let response = error_for_status(self.request(&body).send().await?).await?;
        let payload: Value = response.json().await?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::MalformedResponse("no message content".to_string()))?;
        serde_json::from_str(content)
            .map_err(|error| LlmError::MalformedResponse(error.to_string()))
    }

    async fn stream_step(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ChunkStream, LlmError> {
        let mut body = json!({
            "model": self.model,
            "messages": Self::wire_messages(system, messages),
            "stream": true,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.to_vec());
        }

        let response = error_for_status(self.request(&body).send().await?).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut line_buffer = String::new();
            let mut pending_calls: HashMap<usize, ToolCallRequest> = HashMap::new();
            let mut finished = false;

            'stream: while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(error) => {
                        let _ = tx.send(Err(LlmError::from(error)));
                        return;
                    }
                };
                line_buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline) = line_buffer.find('\n') {
                    let line: String = line_buffer.drain(..=newline).collect();
                    let Some(payload) = line.trim().strip_prefix("data: ") else {
                        continue;
                    };
                    if payload == slidesmith_core::DONE_SENTINEL {
                        finished = true;
                        break 'stream;
                    }
                    let Ok(frame) = serde_json::from_str::<Value>(payload) else {
                        // Malformed frames are skipped, not fatal.
                        continue;
                    };
                    let choice = &frame["choices"][0];

                    if let Some(delta) = choice["delta"]["content"].as_str() {
                        if tx.send(Ok(StepChunk::TextDelta(delta.to_string()))).is_err() {
                            return;
                        }
                    }
                    if let Some(fragments) = choice["delta"]["tool_calls"].as_array() {
                        for fragment in fragments {
                            let index = fragment["index"].as_u64().unwrap_or(0) as usize;
                            let entry = pending_calls.entry(index).or_insert_with(|| {
                                ToolCallRequest {
                                    id: String::new(),
                                    name: String::new(),
                                    arguments: String::new(),
                                }
                            });
                            if let Some(id) = fragment["id"].as_str() {
                                entry.id = id.to_string();
                            }
                            if let Some(name) = fragment["function"]["name"].as_str() {
                                entry.name = name.to_string();
                            }
                            if let Some(arguments) = fragment["function"]["arguments"].as_str() {
                                entry.arguments.push_str(arguments);
                            }
                        }
                    }
                    if let Some(reason) = choice["finish_reason"].as_str() {
                        debug!(finish_reason = reason, "model step finished");
                        finished = true;
                        break 'stream;
                    }
                }
            }

            if !finished {
                debug!("model byte stream ended without a finish frame");
            }

            // Arguments only accumulate fragment by fragment; emit the calls
            // once the step is over, in index order.
            let mut calls: Vec<_> = pending_calls.into_iter().collect();
            calls.sort_by_key(|(index, _)| *index);
            for (_, call) in calls {
                if tx.send(Ok(StepChunk::ToolCall(call))).is_err() {
                    return;
                }
            }
        });

        let stream =
            futures_util::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            });
        Ok(Box::pin(stream))
    }
}

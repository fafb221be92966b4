//! Conversation history model and the persisted snapshot format.
//!
//! Part and message order is significant: it is turn and content order.
//! Snapshots persist the full part structure, including resolved
//! tool-invocation results, so history replay never needs re-streaming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const DEFAULT_CONTEXT: &str = "# Title\n\nAdd your content here";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// State of a tool invocation recorded in history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    Call,
    Result,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Part {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool-invocation")]
    ToolInvocation {
        #[serde(rename = "toolName")]
        tool_name: String,
        state: InvocationState,
        #[serde(skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub parts: Vec<Part>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { id: Uuid::new_v4(), role, parts, created_at: Utc::now() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::Text { text: text.into() }])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![Part::Text { text: text.into() }])
    }

    pub fn push_tool_invocation(&mut self, tool_name: impl Into<String>, input: Value) {
        self.parts.push(Part::ToolInvocation {
            tool_name: tool_name.into(),
            state: InvocationState::Result,
            input: Some(input),
            result: None,
        });
    }

    /// Concatenation of the text parts, in part order. Tool invocations do
    /// not contribute; the model sees those through its own tool channel.
    pub fn plain_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                Part::ToolInvocation { .. } => None,
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self { context: DEFAULT_CONTEXT.to_string(), theme: None, messages: Vec::new() }
    }
}

impl Conversation {
    pub fn with_theme(theme: Option<String>) -> Self {
        Self { theme, ..Self::default() }
    }

    /// Most recent assistant tool invocation for the given tool, scanning
    /// newest-first.
    pub fn last_invocation_of(&self, tool_name: &str) -> Option<&Part> {
        self.messages
            .iter()
            .rev()
            .filter(|message| message.role == Role::Assistant)
            .flat_map(|message| message.parts.iter())
            .find(|part| {
                matches!(part, Part::ToolInvocation { tool_name: name, .. } if name == tool_name)
            })
    }
}

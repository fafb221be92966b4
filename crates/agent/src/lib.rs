//! Agent runtime for the slidesmith assistant.
//!
//! This crate hosts everything between the transport and the language model:
//! - `llm` — the provider-agnostic model seam (`LanguageModel`) and wire
//!   message shapes.
//! - `openai` — an OpenAI-compatible `/chat/completions` implementation.
//! - `prompt` — system prompt assembly with cached guideline text.
//! - `profile` — the fixed agent profiles (tool subset + step ceiling).
//! - `runner` — the bounded step loop that turns model chunks into protocol
//!   events.
//! - `orchestrator` — one-shot intent classification and routing.
//!
//! The model is strictly a proposer. Document state only ever changes through
//! the core crate's mutation applier, on the client's explicit opt-in.

pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod profile;
pub mod prompt;
pub mod runner;

pub use llm::{
    to_chat_history, ChatMessage, ChunkStream, LanguageModel, LlmError, StepChunk, ToolCallRequest,
};
pub use openai::OpenAiClient;
pub use orchestrator::{Intent, Orchestrator};
pub use profile::{profile_for, AgentProfile, DEFAULT_STEP_LIMIT};
pub use prompt::{is_valid_theme_name, AgentKind, PromptBuilder};
pub use runner::{run_agent, AgentReply};

//! Core domain for the slidesmith assistant.
//!
//! Everything in this crate is pure and transport-free:
//! - `document` — slide deck view over a markdown string and the mutation
//!   applier that advances it.
//! - `proposal` — the five-tool proposal catalog: schemas, validation, and
//!   deterministic formatters.
//! - `protocol` — the line-oriented event stream codec shared by server and
//!   client.
//! - `message` — conversation history and the persisted snapshot format.
//! - `errors` — the per-turn failure taxonomy.
//! - `config` — application configuration with file + env + override layering.
//!
//! The language model itself is an external collaborator behind the agent
//! crate's trait; nothing here calls the network.

pub mod config;
pub mod document;
pub mod errors;
pub mod message;
pub mod proposal;
pub mod protocol;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use document::{
    apply_proposal, slide_count, split_slides, MutationOutcome, MutationPolicy, SLIDE_DELIMITER,
};
pub use errors::{ChatError, MutationError, ValidationError};
pub use message::{Conversation, InvocationState, Message, Part, Role, DEFAULT_CONTEXT};
pub use proposal::{
    format_tool_output, EditInput, InsertInput, PlanInput, ProposalInput, ProposalKind,
    ReplaceInput, ReviewInput,
};
pub use protocol::{
    encode_done, encode_event, DecodedReply, StreamDecoder, StreamEvent, ToolCall, DONE_SENTINEL,
};

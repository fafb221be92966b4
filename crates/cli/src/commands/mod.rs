pub mod apply;
pub mod chat;
pub mod reset;
pub mod show;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use slidesmith_core::Conversation;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { exit_code: 1, output: message.into() }
    }
}

/// Load the conversation snapshot, or start a fresh one when the file does
/// not exist yet.
pub fn load_snapshot(path: &Path) -> Result<Conversation> {
    if !path.exists() {
        return Ok(Conversation::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("snapshot {} is not a valid conversation", path.display()))
}

pub fn save_snapshot(path: &Path, conversation: &Conversation) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(conversation).context("failed to serialize snapshot")?;
    fs::write(path, rendered)
        .with_context(|| format!("failed to write snapshot {}", path.display()))
}

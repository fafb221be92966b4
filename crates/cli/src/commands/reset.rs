use std::path::Path;

use slidesmith_core::Conversation;

use super::{save_snapshot, CommandResult};

pub fn run(file: &Path, theme: Option<String>) -> CommandResult {
    let conversation = Conversation::with_theme(theme);
    match save_snapshot(file, &conversation) {
        Ok(()) => CommandResult::success(format!("reset {}", file.display())),
        Err(error) => CommandResult::failure(format!("reset failed: {error:#}")),
    }
}

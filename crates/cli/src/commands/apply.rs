use std::path::Path;

use slidesmith_core::{apply_proposal, Conversation, Part, ProposalInput, Role};

use super::{load_snapshot, save_snapshot, CommandResult};

pub fn run(file: &Path) -> CommandResult {
    let mut conversation = match load_snapshot(file) {
        Ok(conversation) => conversation,
        Err(error) => return CommandResult::failure(format!("apply failed: {error:#}")),
    };

    let Some((tool_name, proposal)) = latest_mutation_proposal(&conversation) else {
        return CommandResult::failure("no applicable proposal in history");
    };

    match apply_proposal(&conversation.context, &proposal) {
        Ok(outcome) => {
            conversation.context = outcome.into_document(&conversation.context);
            if let Err(error) = save_snapshot(file, &conversation) {
                return CommandResult::failure(format!("apply failed: {error:#}"));
            }
            CommandResult::success(format!("applied: {tool_name}"))
        }
        Err(refusal) => CommandResult::failure(format!("not applied ({tool_name}): {refusal}")),
    }
}

/// Newest-first scan for the most recent recorded proposal that can change
/// the deck. Plans and reviews are informational and never candidates.
fn latest_mutation_proposal(conversation: &Conversation) -> Option<(String, ProposalInput)> {
    conversation
        .messages
        .iter()
        .rev()
        .filter(|message| message.role == Role::Assistant)
        .flat_map(|message| message.parts.iter().rev())
        .find_map(|part| match part {
            Part::ToolInvocation { tool_name, input: Some(input), .. } => {
                let proposal = ProposalInput::parse(tool_name, input).ok()?;
                matches!(
                    proposal,
                    ProposalInput::Edit(_) | ProposalInput::Insert(_) | ProposalInput::Replace(_)
                )
                .then(|| (tool_name.clone(), proposal))
            }
            _ => None,
        })
}

use std::path::Path;

use slidesmith_core::{slide_count, Conversation, Part, Role};

use super::{load_snapshot, CommandResult};

pub fn run(file: &Path) -> CommandResult {
    match load_snapshot(file) {
        Ok(conversation) => CommandResult::success(render(&conversation)),
        Err(error) => CommandResult::failure(format!("show failed: {error:#}")),
    }
}

fn render(conversation: &Conversation) -> String {
    let mut lines = Vec::new();

    if let Some(theme) = &conversation.theme {
        lines.push(format!("theme: {theme}"));
    }
    lines.push(format!("deck ({} slides):", slide_count(&conversation.context)));
    lines.push(conversation.context.clone());
    lines.push(String::new());
    lines.push(format!("history ({} messages):", conversation.messages.len()));

    for message in &conversation.messages {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        let text = message.plain_text();
        if !text.is_empty() {
            lines.push(format!("[{role}] {text}"));
        }
        for part in &message.parts {
            if let Part::ToolInvocation { tool_name, result, .. } = part {
                lines.push(format!("[{role}] proposal via {tool_name}"));
                if let Some(result) = result {
                    lines.push(result.clone());
                }
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use slidesmith_core::{Conversation, Message};

    use super::render;

    #[test]
    fn render_lists_deck_and_turns() {
        let mut conversation = Conversation::with_theme(Some("corp".to_string()));
        conversation.context = "A\n---\nB".to_string();
        conversation.messages.push(Message::user("hello"));
        conversation.messages.push(Message::assistant("hi there"));

        let rendered = render(&conversation);
        assert!(rendered.contains("theme: corp"));
        assert!(rendered.contains("deck (2 slides):"));
        assert!(rendered.contains("[user] hello"));
        assert!(rendered.contains("[assistant] hi there"));
    }

    #[test]
    fn render_surfaces_recorded_proposals() {
        let mut conversation = Conversation::default();
        let mut assistant = Message::assistant("done");
        assistant.push_tool_invocation(
            "propose_replace",
            serde_json::json!({ "newMarkdown": "# New", "reason": "r" }),
        );
        conversation.messages.push(assistant);

        let rendered = render(&conversation);
        assert!(rendered.contains("proposal via propose_replace"));
    }
}

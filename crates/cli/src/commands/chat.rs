use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use futures_util::StreamExt;
use serde_json::json;
use slidesmith_core::{
    apply_proposal, format_tool_output, Conversation, InvocationState, Message, MutationPolicy,
    Part, ProposalInput, StreamDecoder, StreamEvent, ToolCall,
};

use super::{load_snapshot, save_snapshot, CommandResult};

const INTENT_HEADER: &str = "x-agent-intent";
const TARGET_SLIDE_HEADER: &str = "x-agent-target-slide";

pub async fn run(
    server: &str,
    file: &Path,
    message: &str,
    policy: MutationPolicy,
) -> CommandResult {
    match chat_turn(server, file, message, policy).await {
        Ok(summary) => CommandResult::success(summary),
        Err(error) => CommandResult::failure(format!("chat failed: {error:#}")),
    }
}

async fn chat_turn(
    server: &str,
    file: &Path,
    message: &str,
    policy: MutationPolicy,
) -> Result<String> {
    let mut conversation = load_snapshot(file)?;
    conversation.messages.push(Message::user(message));
    // Persist the user turn up front so it survives a transport failure.
    save_snapshot(file, &conversation)?;

    let response = reqwest::Client::new()
        .post(format!("{server}/chat"))
        .json(&json!({
            "messages": conversation.messages,
            "context": conversation.context,
            "theme": conversation.theme,
        }))
        .send()
        .await
        .context("request to chat server failed")?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        return Err(anyhow!("server returned {status}: {detail}"));
    }

    if let Some(intent) = response.headers().get(INTENT_HEADER).and_then(|v| v.to_str().ok()) {
        let target = response
            .headers()
            .get(TARGET_SLIDE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|slide| format!(", slide {slide}"))
            .unwrap_or_default();
        println!("[intent: {intent}{target}]");
    }

    let reply = stream_reply(response).await?;
    println!();

    let mut assistant = Message::assistant(reply.text);
    let mut summary = Vec::new();
    for call in &reply.tool_calls {
        let rendered = format_tool_output(&call.tool_name, &call.input);
        summary.push(rendered.clone());
        assistant.parts.push(Part::ToolInvocation {
            tool_name: call.tool_name.clone(),
            state: InvocationState::Result,
            input: Some(call.input.clone()),
            result: Some(rendered),
        });
    }
    conversation.messages.push(assistant);

    if policy.auto_applies() {
        for call in &reply.tool_calls {
            summary.push(auto_apply(&mut conversation, call));
        }
    }

    save_snapshot(file, &conversation)?;
    Ok(summary.join("\n\n"))
}

/// Drain the response body through the line decoder, printing text deltas as
/// they arrive. Tool calls are rendered after the stream completes.
async fn stream_reply(response: reqwest::Response) -> Result<slidesmith_core::DecodedReply> {
    let mut decoder = StreamDecoder::new();
    let mut stream = response.bytes_stream();
    let mut pending: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("reply stream was interrupted")?;
        pending.extend_from_slice(&chunk);

        // Feed complete lines only; a line is always whole UTF-8 even when
        // the transport splits a multibyte character across chunks.
        while let Some(newline) = pending.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = pending.drain(..=newline).collect();
            for event in decoder.push_chunk(&String::from_utf8_lossy(&line)) {
                if let StreamEvent::TextDelta { delta } = event {
                    print!("{delta}");
                    let _ = std::io::stdout().flush();
                }
            }
        }
    }

    Ok(decoder.finish())
}

fn auto_apply(conversation: &mut Conversation, call: &ToolCall) -> String {
    let proposal = match ProposalInput::parse(&call.tool_name, &call.input) {
        Ok(proposal) => proposal,
        Err(error) => return format!("not applied ({}): {error}", call.tool_name),
    };
    match apply_proposal(&conversation.context, &proposal) {
        Ok(outcome) => {
            let label = match &outcome {
                slidesmith_core::MutationOutcome::Updated(_) => "applied",
                slidesmith_core::MutationOutcome::Unchanged => "no document change",
            };
            conversation.context = outcome.into_document(&conversation.context);
            format!("{label}: {}", call.tool_name)
        }
        Err(refusal) => format!("not applied ({}): {refusal}", call.tool_name),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use slidesmith_core::{Conversation, ToolCall};

    use super::auto_apply;

    fn call(tool_name: &str, input: serde_json::Value) -> ToolCall {
        ToolCall { tool_call_id: "call-1".to_string(), tool_name: tool_name.to_string(), input }
    }

    #[test]
    fn auto_apply_advances_the_deck() {
        let mut conversation = Conversation::default();
        let report = auto_apply(
            &mut conversation,
            &call("propose_replace", json!({ "newMarkdown": "# New", "reason": "r" })),
        );
        assert_eq!(report, "applied: propose_replace");
        assert_eq!(conversation.context, "# New");
    }

    #[test]
    fn auto_apply_reports_informational_proposals_without_touching_the_deck() {
        let mut conversation = Conversation::default();
        let before = conversation.context.clone();
        let report = auto_apply(
            &mut conversation,
            &call("propose_plan", json!({ "title": "T", "outline": [{ "title": "S1" }] })),
        );
        assert_eq!(report, "no document change: propose_plan");
        assert_eq!(conversation.context, before);
    }

    #[test]
    fn auto_apply_refusal_leaves_the_deck_unchanged() {
        let mut conversation = Conversation::default();
        conversation.context = "A\n---\nB".to_string();
        let report = auto_apply(
            &mut conversation,
            &call("propose_edit", json!({ "slideIndex": 9, "newMarkdown": "X", "reason": "r" })),
        );
        assert!(report.starts_with("not applied (propose_edit)"));
        assert_eq!(conversation.context, "A\n---\nB");
    }
}

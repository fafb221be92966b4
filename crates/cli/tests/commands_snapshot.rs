use std::path::PathBuf;

use serde_json::json;
use slidesmith_cli::commands::{apply, load_snapshot, reset, save_snapshot, show};
use slidesmith_core::{Conversation, Message, DEFAULT_CONTEXT};

#[test]
fn reset_then_show_reports_a_fresh_deck() {
    let (_dir, path) = snapshot_path();

    let reset_result = reset::run(&path, Some("corp".to_string()));
    assert_eq!(reset_result.exit_code, 0, "expected reset to succeed");

    let show_result = show::run(&path);
    assert_eq!(show_result.exit_code, 0, "expected show to succeed");
    assert!(show_result.output.contains("theme: corp"));
    assert!(show_result.output.contains(DEFAULT_CONTEXT));
    assert!(show_result.output.contains("history (0 messages):"));
}

#[test]
fn recorded_proposal_survives_the_snapshot_and_applies_later() {
    let (_dir, path) = snapshot_path();

    let mut conversation = Conversation::default();
    conversation.context = "A\n---\nB".to_string();
    conversation.messages.push(Message::user("tighten slide 2"));
    let mut assistant = Message::assistant("Here is a tighter version.");
    assistant.push_tool_invocation(
        "propose_edit",
        json!({ "slideIndex": 1, "newMarkdown": "B, tightened", "reason": "brevity" }),
    );
    conversation.messages.push(assistant);
    save_snapshot(&path, &conversation).expect("snapshot saves");

    let result = apply::run(&path);
    assert_eq!(result.exit_code, 0, "expected apply to succeed");
    assert_eq!(result.output, "applied: propose_edit");

    let applied = load_snapshot(&path).expect("snapshot reloads");
    assert_eq!(applied.context, "A\n---\nB, tightened");
    // History itself is untouched; only the deck advanced.
    assert_eq!(applied.messages.len(), 2);
}

#[test]
fn repeated_apply_of_a_replace_is_idempotent() {
    let (_dir, path) = snapshot_path();

    let mut conversation = Conversation::default();
    let mut assistant = Message::assistant("Rewrote the deck.");
    assistant.push_tool_invocation(
        "propose_replace",
        json!({ "newMarkdown": "N1\n---\nN2", "reason": "fresh start" }),
    );
    conversation.messages.push(assistant);
    save_snapshot(&path, &conversation).expect("snapshot saves");

    let first = apply::run(&path);
    assert_eq!(first.exit_code, 0);
    let second = apply::run(&path);
    assert_eq!(second.exit_code, 0);

    let applied = load_snapshot(&path).expect("snapshot reloads");
    assert_eq!(applied.context, "N1\n---\nN2");
}

#[test]
fn apply_on_a_fresh_snapshot_fails_without_touching_it() {
    let (_dir, path) = snapshot_path();
    reset::run(&path, None);

    let result = apply::run(&path);
    assert_eq!(result.exit_code, 1, "expected apply to fail with no proposals");

    let conversation = load_snapshot(&path).expect("snapshot reloads");
    assert_eq!(conversation.context, DEFAULT_CONTEXT);
}

fn snapshot_path() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("conversation.json");
    (dir, path)
}

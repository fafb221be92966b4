//! Wire-level streaming protocol shared by the server encoder and the client
//! decoder.
//!
//! The stream is line-oriented, SSE style: every event is a single
//! `data: <json>` line, the terminator is `data: [DONE]`. Payloads carry a
//! `type` discriminator; the decoder ignores types it does not know and skips
//! payloads it cannot parse without aborting the rest of the stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Incremental fragment of the agent's natural-language reply.
    #[serde(rename = "text-delta")]
    TextDelta { delta: String },
    /// A tool call whose arguments are fully decoded and schema-validated.
    #[serde(rename = "tool-input-available")]
    ToolInputAvailable {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        input: Value,
    },
}

/// A decoded tool call, immutable once emitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_call_id: String,
    pub tool_name: String,
    pub input: Value,
}

pub fn encode_event(event: &StreamEvent) -> Result<String, serde_json::Error> {
    Ok(format!("data: {}\n\n", serde_json::to_string(event)?))
}

pub fn encode_done() -> String {
    format!("data: {DONE_SENTINEL}\n\n")
}

/// Fully decoded reply: the concatenation of all text deltas in emission
/// order plus the ordered tool calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedReply {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Incremental decoder for the event stream.
///
/// Raw chunks may split an event anywhere; lines are buffered until complete,
/// so an event is never observed half-parsed. Duplicate `toolCallId`s
/// overwrite the earlier entry in place rather than appending.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: String,
    reply: DecodedReply,
    done: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn text(&self) -> &str {
        &self.reply.text
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.reply.tool_calls
    }

    /// Feed a raw transport chunk. Returns the events decoded from lines that
    /// became complete with this chunk, in emission order.
    pub fn push_chunk(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            if let Some(event) = self.decode_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    /// Consume the decoder, flushing any trailing unterminated line.
    pub fn finish(mut self) -> DecodedReply {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.decode_line(line.trim_end_matches('\r'));
        }
        self.reply
    }

    fn decode_line(&mut self, line: &str) -> Option<StreamEvent> {
        let payload = line.strip_prefix("data: ")?.trim();
        if payload.is_empty() {
            return None;
        }
        if payload == DONE_SENTINEL {
            self.done = true;
            return None;
        }

        // Unknown `type` discriminators and malformed payloads are skipped.
        let event: StreamEvent = serde_json::from_str(payload).ok()?;
        match &event {
            StreamEvent::TextDelta { delta } => self.reply.text.push_str(delta),
            StreamEvent::ToolInputAvailable { tool_call_id, tool_name, input } => {
                let call = ToolCall {
                    tool_call_id: tool_call_id.clone(),
                    tool_name: tool_name.clone(),
                    input: input.clone(),
                };
                match self
                    .reply
                    .tool_calls
                    .iter_mut()
                    .find(|existing| existing.tool_call_id == *tool_call_id)
                {
                    Some(existing) => *existing = call,
                    None => self.reply.tool_calls.push(call),
                }
            }
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{encode_done, encode_event, StreamDecoder, StreamEvent};

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::TextDelta { delta: text.to_string() }
    }

    #[test]
    fn encoded_events_are_single_data_lines() {
        let line = encode_event(&delta("Hi")).expect("encodable");
        assert_eq!(line, "data: {\"type\":\"text-delta\",\"delta\":\"Hi\"}\n\n");
        assert_eq!(encode_done(), "data: [DONE]\n\n");
    }

    #[test]
    fn decoder_reconstructs_text_regardless_of_chunk_boundaries() {
        let wire = [
            encode_event(&delta("Hel")).unwrap(),
            encode_event(&delta("lo, ")).unwrap(),
            encode_event(&delta("deck")).unwrap(),
            encode_done(),
        ]
        .concat();

        // Split the raw bytes at awkward positions, including mid-JSON.
        for chunk_size in [1, 3, 7, wire.len()] {
            let mut decoder = StreamDecoder::new();
            let bytes = wire.as_bytes();
            let mut start = 0;
            while start < bytes.len() {
                let end = (start + chunk_size).min(bytes.len());
                decoder.push_chunk(std::str::from_utf8(&bytes[start..end]).unwrap());
                start = end;
            }
            assert!(decoder.is_done());
            assert_eq!(decoder.finish().text, "Hello, deck");
        }
    }

    #[test]
    fn tool_calls_keep_emission_order() {
        let mut decoder = StreamDecoder::new();
        let first = StreamEvent::ToolInputAvailable {
            tool_call_id: "call-1".to_string(),
            tool_name: "propose_plan".to_string(),
            input: json!({ "title": "T", "outline": [] }),
        };
        let second = StreamEvent::ToolInputAvailable {
            tool_call_id: "call-2".to_string(),
            tool_name: "propose_edit".to_string(),
            input: json!({ "slideIndex": 0, "newMarkdown": "x", "reason": "r" }),
        };
        decoder.push_chunk(&encode_event(&first).unwrap());
        decoder.push_chunk(&encode_event(&second).unwrap());

        let reply = decoder.finish();
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].tool_call_id, "call-1");
        assert_eq!(reply.tool_calls[1].tool_call_id, "call-2");
    }

    #[test]
    fn duplicate_tool_call_ids_overwrite_in_place() {
        let mut decoder = StreamDecoder::new();
        for reason in ["first", "second"] {
            let event = StreamEvent::ToolInputAvailable {
                tool_call_id: "call-1".to_string(),
                tool_name: "propose_edit".to_string(),
                input: json!({ "slideIndex": 0, "newMarkdown": "x", "reason": reason }),
            };
            decoder.push_chunk(&encode_event(&event).unwrap());
        }

        let reply = decoder.finish();
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].input["reason"], "second");
    }

    #[test]
    fn malformed_payload_is_skipped_without_aborting() {
        let mut decoder = StreamDecoder::new();
        decoder.push_chunk("data: {\"type\":\"tool-input-available\",\"broken\n");
        decoder.push_chunk(&encode_event(&delta("still alive")).unwrap());
        decoder.push_chunk(&encode_done());

        assert!(decoder.is_done());
        assert_eq!(decoder.finish().text, "still alive");
    }

    #[test]
    fn unknown_event_types_and_non_data_lines_are_ignored() {
        let mut decoder = StreamDecoder::new();
        decoder.push_chunk(": keep-alive comment\n");
        decoder.push_chunk("data: {\"type\":\"finish-step\"}\n\n");
        decoder.push_chunk(&encode_event(&delta("ok")).unwrap());

        assert_eq!(decoder.finish().text, "ok");
    }

    #[test]
    fn interleaved_deltas_and_tools_decode_in_generation_order() {
        let mut decoder = StreamDecoder::new();
        let mut seen = Vec::new();
        for chunk in [
            encode_event(&delta("Before ")).unwrap(),
            encode_event(&StreamEvent::ToolInputAvailable {
                tool_call_id: "call-9".to_string(),
                tool_name: "propose_replace".to_string(),
                input: json!({ "newMarkdown": "# D", "reason": "r" }),
            })
            .unwrap(),
            encode_event(&delta("after")).unwrap(),
        ] {
            seen.extend(decoder.push_chunk(&chunk));
        }

        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[1], StreamEvent::ToolInputAvailable { .. }));
        assert_eq!(decoder.finish().text, "Before after");
    }
}

//! SSE frame assembly and chat stream event classification
//!
//! The chat endpoints reply with a stream of UTF-8 text where logical
//! events are separated by a blank line (`\n\n`) and each event carries
//! one or more `data: `-prefixed lines. Payloads are classified by
//! content sniffing: a payload is treated as JSON only when it starts
//! with `{` and contains a known field-name substring; everything else
//! is a plain content delta.
//!
//! [`SseFrameBuffer`] reassembles events from arbitrarily split byte
//! chunks, so any chunking of the same byte stream yields the same
//! sequence of payloads.

use serde::Deserialize;

/// Sentinel payload that terminates a chat stream successfully
pub const DONE_SENTINEL: &str = "[DONE]";

/// Prefix carrying event payloads inside an SSE frame
const DATA_PREFIX: &str = "data: ";

/// Buffer that reassembles SSE events from raw byte chunks
///
/// Bytes accumulate until a `\n\n` boundary completes an event; the
/// event's `data: ` line payloads are then extracted in order. Chunks
/// may split events, lines, and even multi-byte characters at any byte
/// position.
///
/// # Examples
///
/// ```
/// use textly::chat::sse::SseFrameBuffer;
///
/// let mut buffer = SseFrameBuffer::new();
/// assert!(buffer.push_chunk(b"data: hel").is_empty());
/// let payloads = buffer.push_chunk(b"lo\n\ndata: world\n\n");
/// assert_eq!(payloads, vec!["hello".to_string(), "world".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct SseFrameBuffer {
    buffer: Vec<u8>,
}

impl SseFrameBuffer {
    /// Creates an empty frame buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of bytes and returns the payloads of all events
    /// completed by it
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = find_blank_line(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            extract_data_lines(&event[..pos], &mut payloads);
        }
        payloads
    }

    /// Drains any trailing partial event
    ///
    /// Called once the byte stream ends; a final event without a closing
    /// blank line is still processed.
    pub fn flush(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        if !self.buffer.is_empty() {
            let event = std::mem::take(&mut self.buffer);
            extract_data_lines(&event, &mut payloads);
        }
        payloads
    }

    /// Returns true when no partial event is pending
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Finds the byte offset of the first `\n\n` event separator
fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

/// Extracts `data: ` line payloads from one event block, in order
fn extract_data_lines(event: &[u8], payloads: &mut Vec<String>) {
    let block = String::from_utf8_lossy(event);
    for line in block.lines() {
        if let Some(value) = line.strip_prefix(DATA_PREFIX) {
            payloads.push(value.to_string());
        }
    }
}

/// A classified chat stream event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The `[DONE]` sentinel: the stream finished successfully
    Done,
    /// Server-assigned id for a conversation created in this exchange
    ConversationId(String),
    /// Server-assigned id for the user message just persisted
    MessageId(String),
    /// Reasoning state change and/or reasoning trace delta
    Thinking {
        /// New value of the "model is reasoning" flag, when present
        state: Option<bool>,
        /// Unescaped reasoning text to append, when present
        content: Option<String>,
    },
    /// Plain content delta to append to the assistant message
    Content(String),
}

#[derive(Debug, Deserialize)]
struct IdEnvelope {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThinkingEnvelope {
    #[serde(default)]
    thinking: Option<bool>,
    #[serde(default)]
    thinking_content: Option<String>,
}

/// Classifies a single `data: ` payload into a [`StreamEvent`]
///
/// Returns `None` when the payload should be skipped: JSON-looking
/// payloads that fail to parse (logged and dropped, the stream
/// continues) or envelopes missing their expected field.
///
/// # Examples
///
/// ```
/// use textly::chat::sse::{classify, StreamEvent};
///
/// assert_eq!(classify("[DONE]"), Some(StreamEvent::Done));
/// assert_eq!(
///     classify(r#"{"conversation_id": "abc"}"#),
///     Some(StreamEvent::ConversationId("abc".to_string()))
/// );
/// assert_eq!(
///     classify("plain delta"),
///     Some(StreamEvent::Content("plain delta".to_string()))
/// );
/// ```
pub fn classify(data: &str) -> Option<StreamEvent> {
    if data == DONE_SENTINEL {
        return Some(StreamEvent::Done);
    }

    if data.starts_with('{') && data.contains("conversation_id") {
        return match serde_json::from_str::<IdEnvelope>(data) {
            Ok(envelope) => envelope.conversation_id.map(StreamEvent::ConversationId),
            Err(e) => {
                tracing::warn!("Failed to parse conversation id event: {}", e);
                None
            }
        };
    }

    if data.starts_with('{') && data.contains("message_id") {
        return match serde_json::from_str::<IdEnvelope>(data) {
            Ok(envelope) => envelope.message_id.map(StreamEvent::MessageId),
            Err(e) => {
                tracing::warn!("Failed to parse message id event: {}", e);
                None
            }
        };
    }

    if data.starts_with('{') && (data.contains("thinking") || data.contains("thinking_content")) {
        return match serde_json::from_str::<ThinkingEnvelope>(data) {
            Ok(envelope) => {
                if envelope.thinking.is_none() && envelope.thinking_content.is_none() {
                    return None;
                }
                Some(StreamEvent::Thinking {
                    state: envelope.thinking,
                    content: envelope.thinking_content.map(|c| unescape_thinking(&c)),
                })
            }
            Err(e) => {
                tracing::warn!("Failed to parse thinking event: {}", e);
                None
            }
        };
    }

    Some(StreamEvent::Content(unescape_content(data)))
}

/// Unescapes literal `\n` sequences in a content delta
///
/// Content without escape sequences passes through unchanged, so the
/// operation is safe to apply to already-plain text.
///
/// # Examples
///
/// ```
/// use textly::chat::sse::unescape_content;
///
/// assert_eq!(unescape_content("a\\nb"), "a\nb");
/// assert_eq!(unescape_content("no escapes"), "no escapes");
/// ```
pub fn unescape_content(data: &str) -> String {
    data.replace("\\n", "\n")
}

/// Unescapes `\n`, `\"` and `\\` sequences in a thinking trace delta
///
/// Replacements run in that order, matching the producer's escaping.
pub fn unescape_thinking(data: &str) -> String {
    data.replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace("\\\\", "\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// All payloads from a byte stream fed in one piece.
    fn collect_all(body: &[u8]) -> Vec<String> {
        let mut buffer = SseFrameBuffer::new();
        let mut payloads = buffer.push_chunk(body);
        payloads.extend(buffer.flush());
        payloads
    }

    #[test]
    fn test_single_event() {
        let payloads = collect_all(b"data: hello\n\n");
        assert_eq!(payloads, vec!["hello".to_string()]);
    }

    #[test]
    fn test_two_events_in_one_chunk() {
        let payloads = collect_all(b"data: first\n\ndata: second\n\n");
        assert_eq!(payloads, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_multiple_data_lines_in_one_event() {
        let payloads = collect_all(b"data: one\ndata: two\n\n");
        assert_eq!(payloads, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_non_data_lines_ignored() {
        let payloads = collect_all(b"event: message\nid: 7\ndata: kept\n\n");
        assert_eq!(payloads, vec!["kept".to_string()]);
    }

    #[test]
    fn test_payload_whitespace_preserved() {
        let payloads = collect_all(b"data:  leading space\n\n");
        assert_eq!(payloads, vec![" leading space".to_string()]);
    }

    #[test]
    fn test_trailing_partial_event_flushed() {
        let mut buffer = SseFrameBuffer::new();
        assert!(buffer.push_chunk(b"data: tail").is_empty());
        assert!(!buffer.is_empty());
        assert_eq!(buffer.flush(), vec!["tail".to_string()]);
        assert!(buffer.is_empty());
    }

    /// Reassembly must be invariant under arbitrary chunk boundaries.
    #[test]
    fn test_chunking_invariance() {
        let body: &[u8] =
            b"data: {\"message_id\": \"m1\"}\n\ndata: Hello\ndata:  world\n\ndata: [DONE]\n\n";
        let expected = collect_all(body);
        assert!(!expected.is_empty());

        for split_size in 1..body.len() {
            let mut buffer = SseFrameBuffer::new();
            let mut payloads = Vec::new();
            for chunk in body.chunks(split_size) {
                payloads.extend(buffer.push_chunk(chunk));
            }
            payloads.extend(buffer.flush());
            assert_eq!(payloads, expected, "split at {} diverged", split_size);
        }
    }

    /// A multi-byte character split across chunks must survive intact.
    #[test]
    fn test_chunking_invariance_multibyte() {
        let body = "data: héllo wörld\n\n".as_bytes();
        let expected = collect_all(body);

        for split_size in 1..body.len() {
            let mut buffer = SseFrameBuffer::new();
            let mut payloads = Vec::new();
            for chunk in body.chunks(split_size) {
                payloads.extend(buffer.push_chunk(chunk));
            }
            payloads.extend(buffer.flush());
            assert_eq!(payloads, expected, "split at {} diverged", split_size);
        }
    }

    #[test]
    fn test_classify_done() {
        assert_eq!(classify("[DONE]"), Some(StreamEvent::Done));
    }

    #[test]
    fn test_classify_conversation_id() {
        let event = classify(r#"{"conversation_id": "conv42"}"#);
        assert_eq!(event, Some(StreamEvent::ConversationId("conv42".into())));
    }

    #[test]
    fn test_classify_message_id() {
        let event = classify(r#"{"message_id": "msg9"}"#);
        assert_eq!(event, Some(StreamEvent::MessageId("msg9".into())));
    }

    #[test]
    fn test_classify_thinking_state() {
        let event = classify(r#"{"thinking": true}"#);
        assert_eq!(
            event,
            Some(StreamEvent::Thinking {
                state: Some(true),
                content: None
            })
        );
    }

    #[test]
    fn test_classify_thinking_content_unescaped() {
        let event = classify(r#"{"thinking_content": "line\\none \\\"q\\\""}"#);
        match event {
            Some(StreamEvent::Thinking { state, content }) => {
                assert_eq!(state, None);
                assert_eq!(content.as_deref(), Some("line\none \"q\""));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_classify_plain_content() {
        let event = classify("Hello there");
        assert_eq!(event, Some(StreamEvent::Content("Hello there".into())));
    }

    #[test]
    fn test_classify_content_unescapes_newlines() {
        let event = classify("a\\nb");
        assert_eq!(event, Some(StreamEvent::Content("a\nb".into())));
    }

    /// Malformed JSON-looking payloads are skipped, not fatal.
    #[test]
    fn test_classify_invalid_json_skipped() {
        assert_eq!(classify(r#"{"conversation_id": broken"#), None);
        assert_eq!(classify(r#"{"message_id": "#), None);
        assert_eq!(classify(r#"{"thinking": nope}"#), None);
    }

    /// A JSON envelope without the sniffed field is skipped.
    #[test]
    fn test_classify_envelope_without_field_skipped() {
        assert_eq!(classify(r#"{"conversation_id": null}"#), None);
        assert_eq!(classify(r#"{"message_id": null}"#), None);
    }

    /// Content that merely mentions a sniff substring but is not JSON is
    /// still a content delta.
    #[test]
    fn test_classify_sniffing_requires_brace() {
        let event = classify("the conversation_id field");
        assert_eq!(
            event,
            Some(StreamEvent::Content("the conversation_id field".into()))
        );
    }

    #[test]
    fn test_unescape_content_idempotent_on_plain_text() {
        let text = "no escapes here\nreal newline kept";
        assert_eq!(unescape_content(text), text);
    }

    #[test]
    fn test_unescape_thinking_order() {
        assert_eq!(unescape_thinking("a\\nb"), "a\nb");
        assert_eq!(unescape_thinking("say \\\"hi\\\""), "say \"hi\"");
        assert_eq!(unescape_thinking("back\\\\slash"), "back\\slash");
    }
}

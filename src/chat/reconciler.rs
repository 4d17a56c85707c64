//! Stream reconciliation for the active conversation
//!
//! [`StreamReconciler`] folds classified stream events into the
//! conversation being answered: content deltas accumulate on the
//! assistant placeholder, thinking events update its reasoning state,
//! and id events swap the locally generated identifiers for the
//! server-confirmed ones.

use crate::chat::message::ChatConversation;
use crate::chat::sse::{classify, StreamEvent};

/// Per-stream reconciliation state
///
/// One reconciler lives for the duration of a single streamed exchange
/// (a `send` or an `edit`). It remembers which local ids belong to the
/// user message and the assistant placeholder so that id events can find
/// them even after earlier swaps.
///
/// # Examples
///
/// ```
/// use textly::chat::message::{ChatConversation, ChatMessage};
/// use textly::chat::reconciler::StreamReconciler;
///
/// let mut conv = ChatConversation::new_local("hi");
/// let user = ChatMessage::user("hi");
/// let assistant = ChatMessage::assistant_placeholder();
/// let (user_id, assistant_id) = (user.id.clone(), assistant.id.clone());
/// conv.push_message(user);
/// conv.push_message(assistant);
///
/// let mut reconciler = StreamReconciler::new(true, user_id, assistant_id);
/// reconciler.apply(&mut conv, "Hello");
/// reconciler.apply(&mut conv, " world");
/// assert_eq!(conv.messages[1].content, "Hello world");
/// ```
#[derive(Debug)]
pub struct StreamReconciler {
    /// Whether the conversation was created in this exchange
    is_new_conversation: bool,
    /// Current id of the user message awaiting confirmation
    user_message_id: String,
    /// Current id of the assistant placeholder
    assistant_message_id: String,
    /// Server-confirmed user message id, once received
    server_message_id: Option<String>,
    /// Server-confirmed conversation id, once received
    server_conversation_id: Option<String>,
}

impl StreamReconciler {
    /// Creates a reconciler for one streamed exchange
    ///
    /// # Arguments
    ///
    /// * `is_new_conversation` - True when the conversation was created by
    ///   this exchange; conversation id events are only honored then.
    /// * `user_message_id` - Local id of the just-appended user message.
    /// * `assistant_message_id` - Local id of the assistant placeholder.
    pub fn new(
        is_new_conversation: bool,
        user_message_id: impl Into<String>,
        assistant_message_id: impl Into<String>,
    ) -> Self {
        Self {
            is_new_conversation,
            user_message_id: user_message_id.into(),
            assistant_message_id: assistant_message_id.into(),
            server_message_id: None,
            server_conversation_id: None,
        }
    }

    /// Applies one raw `data: ` payload to the conversation
    ///
    /// Returns true when the payload was the `[DONE]` sentinel and the
    /// stream should stop being read. Unparseable payloads are skipped.
    pub fn apply(&mut self, conversation: &mut ChatConversation, data: &str) -> bool {
        let Some(event) = classify(data) else {
            return false;
        };

        match event {
            StreamEvent::Done => return true,
            StreamEvent::ConversationId(id) => {
                // Only honored for conversations created in this exchange.
                if self.is_new_conversation {
                    tracing::debug!("Adopting server conversation id {}", id);
                    conversation.id = id.clone();
                    self.server_conversation_id = Some(id);
                }
            }
            StreamEvent::MessageId(id) => {
                if let Some(message) = conversation.message_mut(&self.user_message_id) {
                    message.id = id.clone();
                }
                self.user_message_id = id.clone();
                self.server_message_id = Some(id);
            }
            StreamEvent::Thinking { state, content } => {
                if let Some(message) = conversation.message_mut(&self.assistant_message_id) {
                    if let Some(state) = state {
                        message.thinking = Some(state);
                    }
                    if let Some(content) = content {
                        message
                            .thinking_content
                            .get_or_insert_with(String::new)
                            .push_str(&content);
                    }
                }
            }
            StreamEvent::Content(delta) => {
                if let Some(message) = conversation.message_mut(&self.assistant_message_id) {
                    message.content.push_str(&delta);
                }
                conversation.updated_at = chrono::Utc::now();
            }
        }

        false
    }

    /// Finalizes the exchange after the stream ends
    ///
    /// When a server message id was received, the assistant message id
    /// is derived as `<serverMessageId>_assistant`. The suffix is a
    /// client convention, not a value supplied by the server.
    pub fn finish(&mut self, conversation: &mut ChatConversation) {
        if let Some(server_id) = &self.server_message_id {
            let assistant_id = format!("{}_assistant", server_id);
            if let Some(message) = conversation.message_mut(&self.assistant_message_id) {
                message.id = assistant_id.clone();
            }
            self.assistant_message_id = assistant_id;
        }
    }

    /// Server-confirmed conversation id, if one arrived
    pub fn server_conversation_id(&self) -> Option<&str> {
        self.server_conversation_id.as_deref()
    }

    /// Server-confirmed user message id, if one arrived
    pub fn server_message_id(&self) -> Option<&str> {
        self.server_message_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::ChatMessage;

    fn exchange(is_new: bool) -> (ChatConversation, StreamReconciler) {
        let mut conv = ChatConversation::new_local("hi");
        let user = ChatMessage::user("hi");
        let assistant = ChatMessage::assistant_placeholder();
        let user_id = user.id.clone();
        let assistant_id = assistant.id.clone();
        conv.push_message(user);
        conv.push_message(assistant);
        (conv, StreamReconciler::new(is_new, user_id, assistant_id))
    }

    #[test]
    fn test_content_deltas_accumulate() {
        let (mut conv, mut rec) = exchange(true);
        assert!(!rec.apply(&mut conv, "Hello"));
        assert!(!rec.apply(&mut conv, " wor"));
        assert!(!rec.apply(&mut conv, "ld"));
        assert_eq!(conv.messages[1].content, "Hello world");
    }

    #[test]
    fn test_content_newline_unescaping() {
        let (mut conv, mut rec) = exchange(true);
        rec.apply(&mut conv, "line one\\nline two");
        assert_eq!(conv.messages[1].content, "line one\nline two");
    }

    #[test]
    fn test_done_terminates() {
        let (mut conv, mut rec) = exchange(true);
        assert!(rec.apply(&mut conv, "[DONE]"));
    }

    #[test]
    fn test_conversation_id_adopted_when_new() {
        let (mut conv, mut rec) = exchange(true);
        rec.apply(&mut conv, r#"{"conversation_id": "conv-real"}"#);
        assert_eq!(conv.id, "conv-real");
        assert_eq!(rec.server_conversation_id(), Some("conv-real"));
    }

    #[test]
    fn test_conversation_id_ignored_when_continuing() {
        let (mut conv, mut rec) = exchange(false);
        let original = conv.id.clone();
        rec.apply(&mut conv, r#"{"conversation_id": "conv-real"}"#);
        assert_eq!(conv.id, original);
        assert_eq!(rec.server_conversation_id(), None);
    }

    #[test]
    fn test_message_id_swaps_user_message() {
        let (mut conv, mut rec) = exchange(true);
        rec.apply(&mut conv, r#"{"message_id": "srv-1"}"#);
        assert_eq!(conv.messages[0].id, "srv-1");
        assert_eq!(rec.server_message_id(), Some("srv-1"));
    }

    #[test]
    fn test_thinking_state_and_content() {
        let (mut conv, mut rec) = exchange(true);
        rec.apply(&mut conv, r#"{"thinking": true}"#);
        assert_eq!(conv.messages[1].thinking, Some(true));

        rec.apply(&mut conv, r#"{"thinking_content": "step one\\n"}"#);
        rec.apply(&mut conv, r#"{"thinking_content": "step two"}"#);
        assert_eq!(
            conv.messages[1].thinking_content.as_deref(),
            Some("step one\nstep two")
        );

        rec.apply(&mut conv, r#"{"thinking": false}"#);
        assert_eq!(conv.messages[1].thinking, Some(false));
    }

    #[test]
    fn test_finish_derives_assistant_id() {
        let (mut conv, mut rec) = exchange(true);
        rec.apply(&mut conv, r#"{"message_id": "srv-7"}"#);
        rec.apply(&mut conv, "answer");
        rec.finish(&mut conv);
        assert_eq!(conv.messages[1].id, "srv-7_assistant");
    }

    #[test]
    fn test_finish_without_server_id_keeps_local_id() {
        let (mut conv, mut rec) = exchange(true);
        let local = conv.messages[1].id.clone();
        rec.apply(&mut conv, "answer");
        rec.finish(&mut conv);
        assert_eq!(conv.messages[1].id, local);
    }

    /// Unparseable JSON-looking payloads are skipped without losing the
    /// rest of the stream.
    #[test]
    fn test_bad_payload_skipped_stream_continues() {
        let (mut conv, mut rec) = exchange(true);
        assert!(!rec.apply(&mut conv, r#"{"message_id": broken"#));
        rec.apply(&mut conv, "still streaming");
        assert_eq!(conv.messages[1].content, "still streaming");
    }

    /// A full exchange in protocol order, as the backend emits it.
    #[test]
    fn test_full_exchange_sequence() {
        let (mut conv, mut rec) = exchange(true);
        let frames = [
            r#"{"conversation_id": "c9"}"#,
            r#"{"message_id": "m9"}"#,
            r#"{"thinking": true}"#,
            r#"{"thinking_content": "hmm"}"#,
            r#"{"thinking": false}"#,
            "Final ",
            "answer",
            "[DONE]",
        ];
        let mut done = false;
        for frame in frames {
            if rec.apply(&mut conv, frame) {
                done = true;
                break;
            }
        }
        rec.finish(&mut conv);

        assert!(done);
        assert_eq!(conv.id, "c9");
        assert_eq!(conv.messages[0].id, "m9");
        assert_eq!(conv.messages[1].id, "m9_assistant");
        assert_eq!(conv.messages[1].content, "Final answer");
        assert_eq!(conv.messages[1].thinking, Some(false));
        assert_eq!(conv.messages[1].thinking_content.as_deref(), Some("hmm"));
    }
}

//! Chat service: send, edit, stop, and conversation management
//!
//! The service owns the interplay between optimistic local state and the
//! streamed backend responses. A send appends the user message and an
//! empty assistant placeholder before the network round trip completes;
//! the stream reconciler then mutates that placeholder in place. One
//! in-flight request is tracked at a time through a cancellation token;
//! `stop` cancels it without rolling back partial content.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::api::conversations::{
    ByteStream, ContinueConversationRequest, ConversationRecord, ConversationTransport,
    EditMessageRequest, StartConversationRequest,
};
use crate::api::parse_record_timestamp;
use crate::chat::message::{ChatConversation, ChatMessage, Role};
use crate::chat::reconciler::StreamReconciler;
use crate::chat::sse::SseFrameBuffer;
use crate::chat::store::ChatStore;
use crate::error::{is_stopped, Result, TextlyError};

/// Conversation kind used for the chat panel
const CHAT_KIND: &str = "chat";

/// Per-request model options
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Effective model id, when a model is selected
    pub model: Option<String>,
    /// Whether the model should reason before answering
    pub use_reasoning: bool,
}

/// Chat orchestration over a [`ConversationTransport`]
pub struct ChatService {
    transport: Arc<dyn ConversationTransport>,
    store: ChatStore,
    max_conversations: usize,
    cancel: Mutex<Option<CancellationToken>>,
}

impl ChatService {
    /// Creates a chat service
    ///
    /// # Arguments
    ///
    /// * `transport` - Conversation endpoints (HTTP in production, a
    ///   fake in tests)
    /// * `store` - Shared chat state store
    /// * `max_conversations` - Bound on the conversation list
    pub fn new(
        transport: Arc<dyn ConversationTransport>,
        store: ChatStore,
        max_conversations: usize,
    ) -> Self {
        Self {
            transport,
            store,
            max_conversations,
            cancel: Mutex::new(None),
        }
    }

    /// The store this service writes into
    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// Sends a user message, streaming the reply into the store
    ///
    /// Targets the given conversation when `conversation_id` is set,
    /// otherwise the current conversation, otherwise starts a new one.
    /// The user message and an empty assistant placeholder are appended
    /// optimistically before the request completes.
    ///
    /// Starting a send replaces the tracked cancellation token without
    /// cancelling a previous in-flight request; only [`ChatService::stop`]
    /// cancels.
    pub async fn send(
        &self,
        message: &str,
        conversation_id: Option<&str>,
        options: &SendOptions,
    ) -> Result<()> {
        let cancel = CancellationToken::new();
        self.track_cancel(cancel.clone());

        self.store.update(|state| {
            state.is_chat_loading = true;
            state.chat_error = None;
        });

        let user_message = ChatMessage::user(message);
        let user_id = user_message.id.clone();
        let max_conversations = self.max_conversations;

        // Resolve the target conversation and append the user message in
        // one state transaction.
        let prepared: std::result::Result<(String, bool, String), String> =
            self.store.update(|state| {
                let mut is_new = false;
                let conv_id = match conversation_id {
                    Some(requested) => {
                        if state.conversation(requested).is_none() {
                            return Err("Conversation not found".to_string());
                        }
                        requested.to_string()
                    }
                    None => {
                        let current = state
                            .current_id
                            .clone()
                            .filter(|id| state.conversation(id).is_some());
                        match current {
                            Some(current) => current,
                            None => {
                                is_new = true;
                                let conversation = ChatConversation::new_local(message);
                                let id = conversation.id.clone();
                                state.conversations.insert(0, conversation);
                                state.conversations.truncate(max_conversations);
                                id
                            }
                        }
                    }
                };

                let Some(conversation) = state.conversation_mut(&conv_id) else {
                    return Err("Conversation not found".to_string());
                };
                conversation.push_message(user_message);
                let title = conversation.title.clone();
                state.current_id = Some(conv_id.clone());
                Ok((conv_id, is_new, title))
            });

        let (conv_id, is_new, title) = match prepared {
            Ok(prepared) => prepared,
            Err(message) => return self.bail(message),
        };

        let stream_result = if is_new {
            self.transport
                .start(&StartConversationRequest {
                    message: message.to_string(),
                    title,
                    model: options.model.clone(),
                    use_reasoning: options.use_reasoning,
                })
                .await
        } else {
            self.transport
                .continue_conversation(&ContinueConversationRequest {
                    conversation_id: conv_id.clone(),
                    message: message.to_string(),
                    model: options.model.clone(),
                    use_reasoning: options.use_reasoning,
                })
                .await
        };

        let stream = match stream_result {
            Ok(stream) => stream,
            Err(e) => return self.bail_with(e),
        };

        self.run_stream(stream, is_new, user_id, conv_id, &cancel).await
    }

    /// Edits a persisted user message and regenerates the reply
    ///
    /// Truncates the conversation at the edited message (discarding the
    /// old branch irrecoverably), replaces its content, and resubmits
    /// through the same streaming path as [`ChatService::send`].
    pub async fn edit(
        &self,
        conversation_id: &str,
        message_id: &str,
        new_content: &str,
        options: &SendOptions,
    ) -> Result<()> {
        let cancel = CancellationToken::new();
        self.track_cancel(cancel.clone());

        self.store.update(|state| {
            state.is_chat_loading = true;
            state.chat_error = None;
        });

        let prepared: std::result::Result<(), String> = self.store.update(|state| {
            let Some(conversation) = state.conversation_mut(conversation_id) else {
                return Err("Conversation not found".to_string());
            };
            let Some(index) = conversation.message_index(message_id) else {
                return Err("Message not found".to_string());
            };
            if conversation.messages[index].role != Role::User {
                return Err("Can only edit user messages".to_string());
            }

            let mut edited = conversation.messages[index].clone();
            edited.content = new_content.to_string();
            edited.timestamp = Utc::now();
            conversation.truncate_at(index);
            conversation.push_message(edited);
            Ok(())
        });

        if let Err(message) = prepared {
            return self.bail(message);
        }

        let stream = match self
            .transport
            .edit(&EditMessageRequest {
                conversation_id: conversation_id.to_string(),
                message_id: message_id.to_string(),
                new_message: new_content.to_string(),
                model: options.model.clone(),
                use_reasoning: options.use_reasoning,
            })
            .await
        {
            Ok(stream) => stream,
            Err(e) => return self.bail_with(e),
        };

        self.run_stream(
            stream,
            false,
            message_id.to_string(),
            conversation_id.to_string(),
            &cancel,
        )
        .await
    }

    /// Cancels the in-flight request, if any
    ///
    /// The loading flag is cleared and the chat error field is set to a
    /// fixed "stopped by user" message. Partial content already streamed
    /// into the conversation is kept.
    pub fn stop(&self) {
        let token = {
            let mut guard = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
            guard.take()
        };
        if let Some(token) = token {
            token.cancel();
            self.store.update(|state| {
                state.is_chat_loading = false;
                state.chat_error = Some(TextlyError::Stopped.to_string());
            });
        }
    }

    /// Clears the current conversation so the next send starts a new one
    pub fn new_conversation(&self) {
        self.store.update(|state| state.current_id = None);
    }

    /// Opens a conversation that is already in the store
    pub fn open_conversation(&self, conversation_id: &str) {
        self.store.update(|state| {
            state.current_id = state
                .conversation(conversation_id)
                .map(|c| c.id.clone());
        });
    }

    /// Fetches the conversation list and merges it into local state
    ///
    /// Backend entries arrive without messages; any local conversation
    /// that already has messages (including the in-flight one) takes
    /// precedence over its backend shell. A current conversation the
    /// backend does not know yet is kept at the front of the list.
    pub async fn refresh_conversations(&self) -> Result<()> {
        let records = self.transport.list(CHAT_KIND, false).await?;
        self.store.update(|state| {
            let mut merged: Vec<ChatConversation> = records
                .iter()
                .map(|record| {
                    state
                        .conversations
                        .iter()
                        .find(|c| c.id == record.id && !c.messages.is_empty())
                        .cloned()
                        .unwrap_or_else(|| ChatConversation {
                            id: record.id.clone(),
                            title: record.title.clone(),
                            messages: Vec::new(),
                            created_at: parse_record_timestamp(&record.created),
                            updated_at: parse_record_timestamp(&record.updated),
                        })
                })
                .collect();

            if let Some(current) = state.current_id.clone() {
                if !merged.iter().any(|c| c.id == current) {
                    if let Some(local) = state.conversation(&current).cloned() {
                        merged.insert(0, local);
                    }
                }
            }

            state.conversations = merged;
        });
        Ok(())
    }

    /// Loads a conversation's messages and makes it current
    ///
    /// When the conversation is already present with messages and
    /// `force_reload` is false, the cached copy is used.
    pub async fn load_conversation(&self, conversation_id: &str, force_reload: bool) -> Result<()> {
        let cached = self.store.read(|state| {
            state
                .conversation(conversation_id)
                .filter(|c| !c.messages.is_empty())
                .map(|c| c.id.clone())
        });
        if let Some(id) = cached {
            if !force_reload {
                self.store.update(|state| state.current_id = Some(id));
                return Ok(());
            }
        }

        let record = match self.transport.get(conversation_id).await {
            Ok(record) => record,
            Err(e) => {
                self.store.update(|state| {
                    state.chat_error = Some("Failed to load conversation".to_string());
                });
                return Err(e);
            }
        };

        let conversation = conversation_from_record(&record);
        self.store.update(|state| {
            match state
                .conversations
                .iter_mut()
                .find(|c| c.id == conversation.id)
            {
                Some(existing) => *existing = conversation.clone(),
                None => state.conversations.push(conversation.clone()),
            }
            state.current_id = Some(conversation.id.clone());
        });
        Ok(())
    }

    /// Deactivates a conversation on the backend, then drops it locally
    ///
    /// Local state is only touched after the backend call succeeds.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        if let Err(e) = self.transport.deactivate(conversation_id).await {
            let message = e.to_string();
            self.store
                .update(|state| state.chat_error = Some(message.clone()));
            return Err(e);
        }

        self.store.update(|state| {
            state.conversations.retain(|c| c.id != conversation_id);
            if state.current_id.as_deref() == Some(conversation_id) {
                state.current_id = None;
            }
        });
        Ok(())
    }

    /// Appends the assistant placeholder and drives the stream to the end
    async fn run_stream(
        &self,
        stream: ByteStream,
        is_new: bool,
        user_id: String,
        conv_id: String,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let assistant = ChatMessage::assistant_placeholder();
        let assistant_id = assistant.id.clone();
        self.store.update(|state| {
            if let Some(conversation) = state.conversation_mut(&conv_id) {
                conversation.push_message(assistant);
            }
        });

        let mut reconciler = StreamReconciler::new(is_new, user_id, assistant_id);
        let mut active_id = conv_id;
        let result = self
            .consume_stream(stream, &mut reconciler, &mut active_id, cancel)
            .await;

        // Runs on every exit path, like a finally block: derive the
        // assistant id and clear the loading flag.
        self.store.update(|state| {
            if let Some(conversation) = state.conversation_mut(&active_id) {
                reconciler.finish(conversation);
            }
            state.is_chat_loading = false;
        });
        self.clear_cancel();

        match result {
            Ok(()) => Ok(()),
            Err(e) if is_stopped(&e) => {
                tracing::debug!("Chat request was stopped by the user");
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.store
                    .update(|state| state.chat_error = Some(message.clone()));
                Err(e)
            }
        }
    }

    /// Reads the byte stream, applying each SSE payload in arrival order
    async fn consume_stream(
        &self,
        mut stream: ByteStream,
        reconciler: &mut StreamReconciler,
        active_id: &mut String,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut frames = SseFrameBuffer::new();
        let mut done = false;

        'read: loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(TextlyError::Stopped.into());
                }
                chunk = stream.next() => {
                    match chunk {
                        Some(Ok(bytes)) => {
                            for payload in frames.push_chunk(&bytes) {
                                if self.apply_payload(reconciler, active_id, &payload) {
                                    done = true;
                                    break 'read;
                                }
                            }
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => break 'read,
                    }
                }
            }
        }

        if !done {
            for payload in frames.flush() {
                if self.apply_payload(reconciler, active_id, &payload) {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Applies one payload; returns true on the `[DONE]` sentinel
    ///
    /// When the reconciler adopts a server conversation id, the active id
    /// and the current-conversation pointer follow it.
    fn apply_payload(
        &self,
        reconciler: &mut StreamReconciler,
        active_id: &mut String,
        payload: &str,
    ) -> bool {
        let mut done = false;
        self.store.update(|state| {
            let old_id = active_id.clone();
            if let Some(conversation) = state.conversation_mut(&old_id) {
                done = reconciler.apply(conversation, payload);
                let new_id = conversation.id.clone();
                if new_id != old_id {
                    if state.current_id.as_deref() == Some(old_id.as_str()) {
                        state.current_id = Some(new_id.clone());
                    }
                    *active_id = new_id;
                }
            }
        });
        done
    }

    /// Fails a request before any stream was opened
    fn bail(&self, message: String) -> Result<()> {
        self.store.update(|state| {
            state.chat_error = Some(message.clone());
            state.is_chat_loading = false;
        });
        self.clear_cancel();
        Err(TextlyError::Chat(message).into())
    }

    /// Fails a request with an error from the transport
    fn bail_with(&self, error: anyhow::Error) -> Result<()> {
        self.store.update(|state| {
            state.chat_error = Some(error.to_string());
            state.is_chat_loading = false;
        });
        self.clear_cancel();
        Err(error)
    }

    fn track_cancel(&self, token: CancellationToken) {
        let mut guard = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token);
    }

    fn clear_cancel(&self) {
        let mut guard = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

/// Maps a backend conversation record into client state
///
/// Each active message record becomes a user message (carrying the
/// record id) followed by an assistant message with the derived
/// `<id>_assistant` identifier and a timestamp nudged one millisecond
/// later to keep ordering stable.
pub fn conversation_from_record(record: &ConversationRecord) -> ChatConversation {
    let mut messages = Vec::new();
    for message in &record.messages {
        if !message.active {
            continue;
        }
        let timestamp = parse_record_timestamp(&message.created);
        messages.push(ChatMessage {
            id: message.id.clone(),
            role: Role::User,
            content: message.user_message.clone(),
            timestamp,
            thinking: None,
            thinking_content: None,
        });
        messages.push(ChatMessage {
            id: format!("{}_assistant", message.id),
            role: Role::Assistant,
            content: message.response_message.clone(),
            timestamp: timestamp + chrono::Duration::milliseconds(1),
            thinking: None,
            thinking_content: message.thinking_content.clone(),
        });
    }

    ChatConversation {
        id: record.id.clone(),
        title: record.title.clone(),
        messages,
        created_at: parse_record_timestamp(&record.created),
        updated_at: parse_record_timestamp(&record.updated),
    }
}

//! Chat message and conversation types
//!
//! Messages carry locally generated identifiers until the backend confirms
//! them; conversations likewise start with a temporary id that is swapped
//! for the server-assigned one during the first streamed exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a derived conversation title (characters)
const TITLE_MAX_CHARS: usize = 50;

/// Role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message written by the user
    User,
    /// Message produced by the assistant
    Assistant,
}

/// A single chat message
///
/// Assistant messages accumulate their content incrementally while a
/// stream is in flight, and may carry a separate "thinking" trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identifier (local until the backend confirms it)
    pub id: String,
    /// Sender role
    pub role: Role,
    /// Visible text content
    pub content: String,
    /// Creation timestamp
    pub timestamp: DateTime<Utc>,
    /// Whether the model is currently reasoning (assistant messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<bool>,
    /// Accumulated reasoning trace (assistant messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_content: Option<String>,
}

impl ChatMessage {
    /// Creates a new user message with a locally generated id
    ///
    /// # Examples
    ///
    /// ```
    /// use textly::chat::message::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::user("Hello!");
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.content, "Hello!");
    /// assert!(!msg.id.is_empty());
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: local_id(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            thinking: None,
            thinking_content: None,
        }
    }

    /// Creates an empty assistant placeholder to stream content into
    ///
    /// # Examples
    ///
    /// ```
    /// use textly::chat::message::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::assistant_placeholder();
    /// assert_eq!(msg.role, Role::Assistant);
    /// assert!(msg.content.is_empty());
    /// ```
    pub fn assistant_placeholder() -> Self {
        Self {
            id: local_id(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: Utc::now(),
            thinking: None,
            thinking_content: None,
        }
    }

    /// Creates an assistant message with known content and id
    pub fn assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            thinking: None,
            thinking_content: None,
        }
    }
}

/// A conversation as seen by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConversation {
    /// Conversation identifier (local until the backend assigns one)
    pub id: String,
    /// Short human-readable title
    pub title: String,
    /// Ordered message list
    pub messages: Vec<ChatMessage>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ChatConversation {
    /// Creates a new local-only conversation seeded from the first message
    ///
    /// The title is derived from the message text; the id is temporary and
    /// will be replaced once the backend confirms the conversation.
    ///
    /// # Examples
    ///
    /// ```
    /// use textly::chat::message::ChatConversation;
    ///
    /// let conv = ChatConversation::new_local("Write me a haiku about rain");
    /// assert_eq!(conv.title, "Write me a haiku about rain");
    /// assert!(conv.messages.is_empty());
    /// ```
    pub fn new_local(first_message: &str) -> Self {
        let now = Utc::now();
        Self {
            id: local_id(),
            title: derive_title(first_message),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a message and touches the update timestamp
    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Returns the index of a message by id
    pub fn message_index(&self, message_id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == message_id)
    }

    /// Returns a mutable reference to a message by id
    pub fn message_mut(&mut self, message_id: &str) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    /// Drops every message from `index` onward
    ///
    /// This is the destructive-edit truncation: the discarded branch is
    /// not recoverable on the client.
    pub fn truncate_at(&mut self, index: usize) {
        self.messages.truncate(index);
        self.updated_at = Utc::now();
    }
}

/// Generates a short local identifier for optimistic state
///
/// The id only needs to be unique within client state until the backend
/// supplies the real one.
pub fn local_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(9);
    id
}

/// Derives a conversation title from its first message
///
/// Takes the first 50 characters and appends an ellipsis when the
/// message is longer.
///
/// # Examples
///
/// ```
/// use textly::chat::message::derive_title;
///
/// assert_eq!(derive_title("short"), "short");
/// let long = "x".repeat(60);
/// let title = derive_title(&long);
/// assert!(title.ends_with("..."));
/// ```
pub fn derive_title(message: &str) -> String {
    let mut title: String = message.chars().take(TITLE_MAX_CHARS).collect();
    if message.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

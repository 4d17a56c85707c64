//! Shared chat state store
//!
//! [`ChatStore`] holds the client-visible chat state behind a lock and
//! notifies subscribers through a watch channel whenever it changes, so
//! the terminal renderer can re-read state as a stream mutates it.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::chat::assist::SuggestionRecord;
use crate::chat::message::ChatConversation;

/// Client-visible chat state
///
/// Mirrors what the chat panel renders: the conversation list, the
/// currently open conversation, loading flags, error fields, and the
/// quick-action suggestion state.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    /// All known conversations, most recent first
    pub conversations: Vec<ChatConversation>,
    /// Id of the currently open conversation
    pub current_id: Option<String>,
    /// True while a chat stream is in flight
    pub is_chat_loading: bool,
    /// Last chat error, surfaced as a plain message
    pub chat_error: Option<String>,
    /// Latest quick-action suggestions
    pub suggestions: Vec<String>,
    /// True while a quick-action request is in flight
    pub is_assist_loading: bool,
    /// Last quick-action error
    pub assist_error: Option<String>,
    /// Bounded quick-action history, most recent first
    pub history: Vec<SuggestionRecord>,
}

impl ChatState {
    /// Returns the currently open conversation, if any
    pub fn current(&self) -> Option<&ChatConversation> {
        let id = self.current_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Returns a conversation by id
    pub fn conversation(&self, id: &str) -> Option<&ChatConversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Returns a mutable conversation by id
    pub fn conversation_mut(&mut self, id: &str) -> Option<&mut ChatConversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }
}

/// Shared, change-notifying wrapper around [`ChatState`]
///
/// Cloning the store is cheap and shares the same underlying state.
///
/// # Examples
///
/// ```
/// use textly::chat::store::ChatStore;
///
/// let store = ChatStore::new();
/// store.update(|state| state.is_chat_loading = true);
/// assert!(store.read(|state| state.is_chat_loading));
/// ```
#[derive(Debug, Clone)]
pub struct ChatStore {
    state: Arc<RwLock<ChatState>>,
    revision_tx: Arc<watch::Sender<u64>>,
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStore {
    /// Creates an empty store
    pub fn new() -> Self {
        let (revision_tx, _revision_rx) = watch::channel(0u64);
        Self {
            state: Arc::new(RwLock::new(ChatState::default())),
            revision_tx: Arc::new(revision_tx),
        }
    }

    /// Reads the state through a closure
    pub fn read<R>(&self, f: impl FnOnce(&ChatState) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Mutates the state through a closure and notifies subscribers
    pub fn update<R>(&self, f: impl FnOnce(&mut ChatState) -> R) -> R {
        let result = {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        };
        self.revision_tx.send_modify(|revision| *revision += 1);
        result
    }

    /// Subscribes to state revisions
    ///
    /// The receiver resolves whenever `update` runs; subscribers re-read
    /// the state they care about rather than receiving deltas.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }
}

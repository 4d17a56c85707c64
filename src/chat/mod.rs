//! AI chat: messages, stream reconciliation, state store, services

pub mod assist;
pub mod message;
pub mod reconciler;
pub mod service;
pub mod sse;
pub mod store;

pub use assist::AssistService;
pub use message::{ChatConversation, ChatMessage, Role};
pub use service::{ChatService, SendOptions};
pub use store::{ChatState, ChatStore};

//! Conversation endpoints
//!
//! The start/continue/edit endpoints reply with an SSE byte stream; the
//! list/get/deactivate endpoints are plain JSON. [`ConversationTransport`]
//! is the seam between the chat service and the network so tests can
//! drive the service with a scripted stream.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::{Result, TextlyError};

/// A stream of raw response body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = std::result::Result<Bytes, TextlyError>> + Send>>;

/// Request body for starting a new conversation
#[derive(Debug, Clone, Serialize)]
pub struct StartConversationRequest {
    /// First user message
    pub message: String,
    /// Title derived from the first message
    pub title: String,
    /// Effective model id, when a model is selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Whether the model should reason before answering
    pub use_reasoning: bool,
}

/// Request body for continuing an existing conversation
#[derive(Debug, Clone, Serialize)]
pub struct ContinueConversationRequest {
    /// Target conversation id
    pub conversation_id: String,
    /// New user message
    pub message: String,
    /// Effective model id, when a model is selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Whether the model should reason before answering
    pub use_reasoning: bool,
}

/// Request body for editing a persisted message
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageRequest {
    /// Target conversation id
    pub conversation_id: String,
    /// Id of the message being edited
    pub message_id: String,
    /// Replacement message text
    pub new_message: String,
    /// Effective model id, when a model is selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Whether the model should reason before answering
    pub use_reasoning: bool,
}

/// A conversation record as returned by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationRecord {
    /// Conversation id
    pub id: String,
    /// Conversation title
    pub title: String,
    /// Conversation kind (`chat`, `improvement`, ...)
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Total request count
    #[serde(default)]
    pub total_requests: u64,
    /// Aggregate input token count
    #[serde(default)]
    pub input_tokens: u64,
    /// Aggregate output token count
    #[serde(default)]
    pub output_tokens: u64,
    /// Aggregate cost
    #[serde(default)]
    pub cost: f64,
    /// Message records, present when requested
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
    /// Creation timestamp (backend format)
    #[serde(default)]
    pub created: String,
    /// Update timestamp (backend format)
    #[serde(default)]
    pub updated: String,
}

/// One persisted exchange: a user message and its response
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRecord {
    /// Record id; the client derives `<id>_assistant` for the reply
    pub id: String,
    /// The user's message text
    #[serde(default)]
    pub user_message: String,
    /// The assistant's response text
    #[serde(default)]
    pub response_message: String,
    /// Reasoning trace, when the model produced one
    #[serde(default)]
    pub thinking_content: Option<String>,
    /// Model that produced the response
    #[serde(default)]
    pub model: String,
    /// Input token count
    #[serde(default)]
    pub input_tokens: u64,
    /// Output token count
    #[serde(default)]
    pub output_tokens: u64,
    /// Reasoning token count, when reported
    #[serde(default)]
    pub reasoning_tokens: Option<u64>,
    /// Cost of this exchange
    #[serde(default)]
    pub cost: f64,
    /// Inactive records were truncated away by an edit
    #[serde(default = "default_active")]
    pub active: bool,
    /// Creation timestamp (backend format)
    #[serde(default)]
    pub created: String,
}

fn default_active() -> bool {
    true
}

/// Transport seam for the conversation endpoints
///
/// The chat service only depends on this trait; the HTTP implementation
/// lives in [`HttpConversationClient`] and tests substitute a fake that
/// replays scripted byte streams.
#[async_trait]
pub trait ConversationTransport: Send + Sync {
    /// Starts a new conversation; the response body streams SSE frames
    async fn start(&self, request: &StartConversationRequest) -> Result<ByteStream>;

    /// Continues an existing conversation; the response body streams SSE
    /// frames
    async fn continue_conversation(
        &self,
        request: &ContinueConversationRequest,
    ) -> Result<ByteStream>;

    /// Edits a persisted message and regenerates the reply; the response
    /// body streams SSE frames
    async fn edit(&self, request: &EditMessageRequest) -> Result<ByteStream>;

    /// Lists conversations of one kind
    async fn list(&self, kind: &str, include_messages: bool) -> Result<Vec<ConversationRecord>>;

    /// Fetches one conversation with its messages
    async fn get(&self, conversation_id: &str) -> Result<ConversationRecord>;

    /// Deactivates (soft-deletes) a conversation
    async fn deactivate(&self, conversation_id: &str) -> Result<()>;
}

/// HTTP implementation of [`ConversationTransport`]
#[derive(Debug, Clone)]
pub struct HttpConversationClient {
    api: ApiClient,
}

impl HttpConversationClient {
    /// Creates a client over the given API connection
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

fn into_byte_stream(response: reqwest::Response) -> ByteStream {
    Box::pin(response.bytes_stream().map_err(TextlyError::Http))
}

#[async_trait]
impl ConversationTransport for HttpConversationClient {
    async fn start(&self, request: &StartConversationRequest) -> Result<ByteStream> {
        let response = self.api.post_stream("/conversations/start", request).await?;
        Ok(into_byte_stream(response))
    }

    async fn continue_conversation(
        &self,
        request: &ContinueConversationRequest,
    ) -> Result<ByteStream> {
        let response = self
            .api
            .post_stream("/conversations/continue", request)
            .await?;
        Ok(into_byte_stream(response))
    }

    async fn edit(&self, request: &EditMessageRequest) -> Result<ByteStream> {
        let response = self.api.post_stream("/conversations/edit", request).await?;
        Ok(into_byte_stream(response))
    }

    async fn list(&self, kind: &str, include_messages: bool) -> Result<Vec<ConversationRecord>> {
        let mut query: Vec<(&str, &str)> = vec![("type", kind)];
        if include_messages {
            query.push(("include_messages", "true"));
        }
        self.api.get_json("/conversations/", &query).await
    }

    async fn get(&self, conversation_id: &str) -> Result<ConversationRecord> {
        self.api
            .get_json(&format!("/conversations/{}", conversation_id), &[])
            .await
    }

    async fn deactivate(&self, conversation_id: &str) -> Result<()> {
        let body = serde_json::json!({ "conversation_id": conversation_id });
        self.api.post_ok("/conversations/deactivate", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_request_serialization() {
        let request = StartConversationRequest {
            message: "hi".to_string(),
            title: "hi".to_string(),
            model: Some("gpt-x:online".to_string()),
            use_reasoning: true,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"message\":\"hi\""));
        assert!(json.contains("\"title\":\"hi\""));
        assert!(json.contains("\"model\":\"gpt-x:online\""));
        assert!(json.contains("\"use_reasoning\":true"));
    }

    #[test]
    fn test_continue_request_omits_missing_model() {
        let request = ContinueConversationRequest {
            conversation_id: "c1".to_string(),
            message: "more".to_string(),
            model: None,
            use_reasoning: false,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"conversation_id\":\"c1\""));
        assert!(!json.contains("model"));
    }

    #[test]
    fn test_edit_request_serialization() {
        let request = EditMessageRequest {
            conversation_id: "c1".to_string(),
            message_id: "m1".to_string(),
            new_message: "fixed".to_string(),
            model: None,
            use_reasoning: false,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"message_id\":\"m1\""));
        assert!(json.contains("\"new_message\":\"fixed\""));
    }

    #[test]
    fn test_conversation_record_deserialization() {
        let json = r#"{
            "id": "c1",
            "title": "Rain haiku",
            "type": "chat",
            "total_requests": 3,
            "input_tokens": 120,
            "output_tokens": 450,
            "cost": 0.0021,
            "created": "2024-05-01 12:00:00.000Z",
            "updated": "2024-05-01 12:05:00.000Z"
        }"#;
        let record: ConversationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "c1");
        assert_eq!(record.kind, "chat");
        assert_eq!(record.total_requests, 3);
        assert!(record.messages.is_empty());
    }

    #[test]
    fn test_message_record_defaults() {
        let json = r#"{"id": "m1", "created": "2024-05-01 12:00:00.000Z"}"#;
        let record: MessageRecord = serde_json::from_str(json).unwrap();
        assert!(record.active, "records default to active");
        assert!(record.user_message.is_empty());
        assert!(record.thinking_content.is_none());
        assert!(record.reasoning_tokens.is_none());
    }

    #[test]
    fn test_message_record_full() {
        let json = r#"{
            "id": "m2",
            "user_message": "q",
            "response_message": "a",
            "thinking_content": "because",
            "model": "gpt-x",
            "input_tokens": 10,
            "output_tokens": 20,
            "reasoning_tokens": 5,
            "cost": 0.001,
            "active": false,
            "created": "2024-05-01 12:00:00.000Z"
        }"#;
        let record: MessageRecord = serde_json::from_str(json).unwrap();
        assert!(!record.active);
        assert_eq!(record.thinking_content.as_deref(), Some("because"));
        assert_eq!(record.reasoning_tokens, Some(5));
    }
}

//! AI quick-assist endpoint
//!
//! A stateless request/response call, no streaming involved.

use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::chat::assist::AssistKind;
use crate::error::Result;

/// Quick-assist endpoint path
const ASSIST_PATH: &str = "/ai/assist";

/// Request body for the assist endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AssistRequest {
    /// Action kind, serialized as `type`
    #[serde(rename = "type")]
    pub kind: AssistKind,
    /// The selected text the action runs on
    pub text: String,
    /// Trimmed surrounding context, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Response body of the assist endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AssistResponse {
    /// The produced suggestion
    pub suggestion: String,
}

/// Client for the quick-assist endpoint
#[derive(Debug, Clone)]
pub struct AssistClient {
    api: ApiClient,
}

impl AssistClient {
    /// Creates an assist client
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Runs one quick action against the backend
    pub async fn request(&self, request: &AssistRequest) -> Result<AssistResponse> {
        self.api.post_json(ASSIST_PATH, request).await
    }
}

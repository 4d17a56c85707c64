//! AI model catalog endpoint

use serde::Deserialize;

use crate::api::ApiClient;
use crate::error::Result;

/// Model catalog endpoint path
const MODELS_PATH: &str = "/ai/models";

/// Response envelope of the model catalog
#[derive(Debug, Clone, Deserialize)]
pub struct ModelCatalogResponse {
    /// Available models
    pub models: Vec<ModelRecord>,
}

/// One model as the backend describes it
///
/// Capabilities arrive as a string array (`"reasoning"`,
/// `"reasoningsuffix"`, `"internet"`) and are decoded into typed flags
/// by [`crate::models::ChatModel::from_record`].
#[derive(Debug, Clone, Deserialize)]
pub struct ModelRecord {
    /// Backend record id
    pub id: String,
    /// Model identifier sent on chat requests
    pub identifier: String,
    /// Display name
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Icon hint
    #[serde(default)]
    pub icon: String,
    /// Capability strings
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Upstream provider name
    #[serde(default)]
    pub provider: String,
    /// Whether this is the default model
    #[serde(default)]
    pub default: bool,
}

/// Client for the model catalog
#[derive(Debug, Clone)]
pub struct ModelClient {
    api: ApiClient,
}

impl ModelClient {
    /// Creates a model catalog client
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetches the available models
    pub async fn list(&self) -> Result<Vec<ModelRecord>> {
        let response: ModelCatalogResponse = self.api.get_json(MODELS_PATH, &[]).await?;
        Ok(response.models)
    }
}

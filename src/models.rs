//! Model selection and capability handling
//!
//! The backend describes model capabilities as plain strings; the client
//! decodes them into typed flags, applies the user's per-model override
//! switches, and derives the effective model id sent on chat requests
//! (capability suffixes like `:online` and `:thinking`).

use serde::{Deserialize, Serialize};

use crate::api::models::ModelRecord;

/// Typed model capabilities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// The model can reason before answering
    pub reasoning: bool,
    /// Reasoning is requested via a `:thinking` id suffix
    pub uses_reasoning_suffix: bool,
    /// The model can browse the internet (`:online` id suffix)
    pub internet: bool,
    /// Plain chat is always available
    pub standard: bool,
}

/// A model as presented to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatModel {
    /// Model identifier sent on chat requests
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description
    pub description: String,
    /// Icon hint
    pub icon: String,
    /// Decoded capabilities
    pub capabilities: ModelCapabilities,
    /// Upstream provider name
    pub provider: String,
    /// Whether the backend marks this model as the default
    pub is_default: bool,
}

impl ChatModel {
    /// Decodes a backend model record
    ///
    /// The chat identifier is the record's `identifier` field, not its
    /// record id. `reasoningsuffix` implies `reasoning`.
    pub fn from_record(record: &ModelRecord) -> Self {
        let has = |name: &str| record.capabilities.iter().any(|c| c == name);
        Self {
            id: record.identifier.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            icon: record.icon.clone(),
            capabilities: ModelCapabilities {
                reasoning: has("reasoning") || has("reasoningsuffix"),
                uses_reasoning_suffix: has("reasoningsuffix"),
                internet: has("internet"),
                standard: true,
            },
            provider: record.provider.clone(),
            is_default: record.default,
        }
    }
}

/// Per-model capability override switches
///
/// Optional capabilities start disabled; a capability is only active
/// when the user explicitly switched it on for that model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityOverrides {
    /// Reasoning switch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<bool>,
    /// Internet switch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet: Option<bool>,
}

/// Computes the capabilities in effect for a model
///
/// Optional capabilities are off unless explicitly overridden on, even
/// when the model supports them.
///
/// # Examples
///
/// ```
/// use textly::models::{effective_capabilities, CapabilityOverrides, ChatModel, ModelCapabilities};
///
/// let model = ChatModel {
///     id: "m".to_string(),
///     name: "M".to_string(),
///     description: String::new(),
///     icon: String::new(),
///     capabilities: ModelCapabilities {
///         reasoning: true,
///         uses_reasoning_suffix: false,
///         internet: true,
///         standard: true,
///     },
///     provider: String::new(),
///     is_default: false,
/// };
///
/// let caps = effective_capabilities(&model, &CapabilityOverrides::default());
/// assert!(!caps.reasoning);
/// assert!(!caps.internet);
/// assert!(caps.standard);
/// ```
pub fn effective_capabilities(
    model: &ChatModel,
    overrides: &CapabilityOverrides,
) -> ModelCapabilities {
    ModelCapabilities {
        reasoning: overrides.reasoning == Some(true),
        uses_reasoning_suffix: model.capabilities.uses_reasoning_suffix,
        internet: overrides.internet == Some(true),
        standard: true,
    }
}

/// Derives the effective model id for a chat request
///
/// Appends `:online` when internet is enabled and `:thinking` when
/// reasoning is enabled on a suffix-style model.
pub fn effective_model_id(model: &ChatModel, overrides: &CapabilityOverrides) -> String {
    let caps = effective_capabilities(model, overrides);
    let mut id = model.id.clone();
    if caps.internet {
        id.push_str(":online");
    }
    if caps.reasoning && caps.uses_reasoning_suffix {
        id.push_str(":thinking");
    }
    id
}

/// Whether the chat request should ask for reasoning
pub fn should_use_reasoning(model: &ChatModel, overrides: &CapabilityOverrides) -> bool {
    effective_capabilities(model, overrides).reasoning
}

/// Picks the active model from the catalog
///
/// Order: the saved selection when it still exists, then the backend
/// default, then the first model.
pub fn select_model<'a>(models: &'a [ChatModel], saved_id: Option<&str>) -> Option<&'a ChatModel> {
    if let Some(saved) = saved_id {
        if let Some(model) = models.iter().find(|m| m.id == saved) {
            return Some(model);
        }
    }
    models.iter().find(|m| m.is_default).or_else(|| models.first())
}

//! Persisted client settings
//!
//! A handful of small values survive restarts: the last-open
//! conversation, the last-active panel tab, the selected model, and the
//! per-model capability overrides. They live in one JSON file that is
//! overwritten wholesale on every change; nothing here is precious
//! enough for anything smarter.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TextlyError};
use crate::models::CapabilityOverrides;

/// Environment variable overriding the settings file location
pub const SETTINGS_PATH_ENV: &str = "TEXTLY_SETTINGS_PATH";

/// Settings file name inside the data directory
const SETTINGS_FILE: &str = "settings.json";

/// The persisted settings blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Conversation reopened on the next chat session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_conversation_id: Option<String>,

    /// Last active panel tab
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_tab: Option<String>,

    /// Selected model id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_model: Option<String>,

    /// Capability override switches, keyed by model id
    #[serde(default)]
    pub capability_overrides: HashMap<String, CapabilityOverrides>,
}

impl ClientSettings {
    /// Override switches for one model (defaults when none are stored)
    pub fn overrides_for(&self, model_id: &str) -> CapabilityOverrides {
        self.capability_overrides
            .get(model_id)
            .copied()
            .unwrap_or_default()
    }
}

/// File-backed settings store
///
/// # Examples
///
/// ```no_run
/// use textly::settings::SettingsStore;
///
/// let store = SettingsStore::new().unwrap();
/// let mut settings = store.load().unwrap();
/// settings.selected_model = Some("gpt-x".to_string());
/// store.save(&settings).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store at the default location
    ///
    /// Honors the `TEXTLY_SETTINGS_PATH` override, otherwise uses the
    /// platform data directory.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(SETTINGS_PATH_ENV) {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "textly", "textly").ok_or_else(|| {
            TextlyError::Settings("could not determine data directory".to_string())
        })?;
        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .map_err(|e| TextlyError::Settings(format!("create {}: {}", data_dir.display(), e)))?;

        Ok(Self {
            path: data_dir.join(SETTINGS_FILE),
        })
    }

    /// Creates a store at an explicit path (used by tests)
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TextlyError::Settings(format!("create {}: {}", parent.display(), e))
            })?;
        }
        Ok(Self { path })
    }

    /// Loads the settings
    ///
    /// A missing file yields defaults. A corrupt file is logged and also
    /// yields defaults; the next save overwrites it.
    pub fn load(&self) -> Result<ClientSettings> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ClientSettings::default());
            }
            Err(e) => {
                return Err(
                    TextlyError::Settings(format!("read {}: {}", self.path.display(), e)).into(),
                )
            }
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(
                    "Corrupt settings file {}, using defaults: {}",
                    self.path.display(),
                    e
                );
                Ok(ClientSettings::default())
            }
        }
    }

    /// Saves the settings, replacing the file wholesale
    pub fn save(&self, settings: &ClientSettings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json)
            .map_err(|e| TextlyError::Settings(format!("write {}: {}", self.path.display(), e)))?;
        Ok(())
    }

    /// The file path backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }
}

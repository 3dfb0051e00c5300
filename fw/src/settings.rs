//! Persisted operator settings
//!
//! Holds the API key. Settings are loaded at the start of every operator
//! action and only written when the operator explicitly saves them.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from settings persistence
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Settings lock poisoned")]
    Poisoned,
}

/// Operator settings blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Torn API key; empty means remote calls fail fast
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

impl Settings {
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into() }
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Key with all but the last four characters hidden
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}

/// Key-value persistence for [`Settings`]
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings, SettingsError>;

    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;

    /// Forget persisted settings, reverting to defaults
    fn clear(&self) -> Result<(), SettingsError>;
}

/// JSON file store, optionally overridden by an environment variable
pub struct FileSettingsStore {
    path: PathBuf,
    key_env: Option<String>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!(?path, "FileSettingsStore::new: called");
        Self { path, key_env: None }
    }

    /// Prefer a non-empty `var` over the persisted key
    pub fn with_env_override(mut self, var: impl Into<String>) -> Self {
        self.key_env = Some(var.into());
        self
    }

    /// `~/.local/share/factionwatch/settings.json` on Linux
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("factionwatch")
            .join("settings.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        debug!(path = %self.path.display(), "FileSettingsStore::load: called");
        let mut settings = match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("FileSettingsStore::load: no settings file, using defaults");
                Settings::default()
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if let Some(var) = &self.key_env
            && let Ok(key) = std::env::var(var)
            && !key.trim().is_empty()
        {
            debug!(%var, "FileSettingsStore::load: api key taken from environment");
            settings.api_key = key;
        }

        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        debug!(path = %self.path.display(), "FileSettingsStore::save: called");
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let content = serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, content).map_err(|e| self.io_error(e))?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), SettingsError> {
        debug!(path = %self.path.display(), "FileSettingsStore::clear: called");
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Settings cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-process store for embedding and tests
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: RwLock<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        self.settings.read().map(|s| s.clone()).map_err(|_| SettingsError::Poisoned)
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let mut guard = self.settings.write().map_err(|_| SettingsError::Poisoned)?;
        *guard = settings.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), SettingsError> {
        self.save(&Settings::default())
    }
}

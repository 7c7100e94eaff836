//! Static model capability table.
//!
//! Capabilities are supplied by the caller (usually loaded once from a JSON
//! catalog) and are never mutated while a request is being dispatched.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_max_temperature() -> f64 {
    1.2
}

/// What the dispatcher needs to know about one chat model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelCapabilities {
    /// Provider-side model identifier sent in the request body
    pub model: String,
    /// Display name used in usage records
    pub name: String,
    /// Context window (prompt + response) in tokens
    pub context_max_token: u32,
    /// Token ceiling for rendered quotes
    pub quote_max_token: u32,
    /// Provider temperature reached at the top of the 0-10 caller scale
    #[serde(default = "default_max_temperature")]
    pub max_temperature: f64,
    /// Provider-level default instruction prepended to every request
    #[serde(default)]
    pub default_system: Option<String>,
    /// Whether prompts must pass moderation before the remote call
    #[serde(default)]
    pub censor: bool,
    /// Cost per token
    #[serde(default)]
    pub price: f64,
}

impl ModelCapabilities {
    pub fn new(model: impl Into<String>, context_max_token: u32, quote_max_token: u32) -> Self {
        let model = model.into();
        Self {
            name: model.clone(),
            model,
            context_max_token,
            quote_max_token,
            max_temperature: default_max_temperature(),
            default_system: None,
            censor: false,
            price: 0.0,
        }
    }
}

/// Ordered set of selectable chat models.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCatalog {
    models: Vec<ModelCapabilities>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelCapabilities>) -> Self {
        Self { models }
    }

    /// Load a catalog from a JSON array of capability entries.
    pub async fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let models: Vec<ModelCapabilities> = serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        tracing::info!("Loaded {} chat models from {:?}", models.len(), path);
        Ok(Self { models })
    }

    /// Load from the default location, or an empty catalog if there is none.
    pub async fn load_default() -> std::io::Result<Self> {
        Self::load_or_empty(get_default_catalog_path()).await
    }

    /// Like [`ModelCatalog::load`], but a missing file yields an empty catalog.
    pub async fn load_or_empty(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No model catalog at {:?}", path);
            return Ok(Self::default());
        }
        Self::load(path).await
    }

    pub fn add(&mut self, capabilities: ModelCapabilities) {
        self.models.retain(|m| m.model != capabilities.model);
        self.models.push(capabilities);
    }

    /// Exact lookup by provider model identifier.
    pub fn get(&self, model: &str) -> Option<&ModelCapabilities> {
        self.models.iter().find(|m| m.model == model)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// `~/.dispatch/chat_models.json`
pub fn get_default_catalog_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".dispatch").join("chat_models.json")
}

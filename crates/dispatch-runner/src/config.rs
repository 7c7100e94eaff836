use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use dispatch_core::ModelCatalog;
use dispatch_llm::OpenAICompatClient;
use serde::{Deserialize, Serialize};

use crate::invoker::DEFAULT_REQUEST_TIMEOUT;

const CONFIG_FILE_PATH: &str = "dispatcher.toml";

/// Process-level dispatcher settings: `dispatcher.toml`, then `DISPATCH_*` env overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Model used when a request does not name one
    pub default_model: Option<String>,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    /// Model catalog file; `~/.dispatch/chat_models.json` when unset
    pub catalog_path: Option<PathBuf>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_model: None,
            api_base: None,
            api_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            catalog_path: None,
        }
    }
}

impl DispatcherConfig {
    /// `dispatcher.toml` in the working directory, then the process environment.
    pub fn new() -> Self {
        Self::load_from(CONFIG_FILE_PATH, |key| std::env::var(key).ok())
    }

    /// Read `path` if it exists (a malformed file is logged and skipped),
    /// then apply overrides resolved through `lookup`.
    pub fn load_from(path: impl AsRef<Path>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = path.as_ref();
        let mut config = Self::default();

        if path.exists() {
            match Self::from_file(path) {
                Ok(file_config) => config = file_config,
                Err(e) => log::warn!("Ignoring {}: {:#}", path.display(), e),
            }
        }

        config.apply_env_overrides(lookup);
        config
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Override fields from `DISPATCH_*` variables resolved through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup("DISPATCH_DEFAULT_MODEL") {
            self.default_model = Some(model);
        }
        if let Some(api_base) = lookup("DISPATCH_API_BASE") {
            self.api_base = Some(api_base);
        }
        if let Some(api_key) = lookup("DISPATCH_API_KEY") {
            self.api_key = Some(api_key);
        }
        if let Some(path) = lookup("DISPATCH_CATALOG_PATH") {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(timeout) = lookup("DISPATCH_TIMEOUT_SECS") {
            match timeout.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => log::warn!("Invalid DISPATCH_TIMEOUT_SECS value: {:?}", timeout),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load the configured catalog, or the default one (empty when absent).
    pub async fn load_catalog(&self) -> std::io::Result<ModelCatalog> {
        match &self.catalog_path {
            Some(path) => ModelCatalog::load(path).await,
            None => ModelCatalog::load_default().await,
        }
    }

    /// OpenAI-compatible client for the configured endpoint.
    pub fn build_client(&self) -> OpenAICompatClient {
        let client = OpenAICompatClient::new(self.api_key.clone().unwrap_or_default());
        match &self.api_base {
            Some(base) => client.with_base_url(base.clone()),
            None => client,
        }
    }
}

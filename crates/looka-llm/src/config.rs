// Client-side configuration: where requests go, which model, and what each
// model is allowed to receive.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{LlmError, Result};
use crate::traits::{ChatClient, ChatOptions};

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000/api/proxy";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-0528:free";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_REFERER: &str = "http://localhost:3000";
pub const DEFAULT_TITLE: &str = "Looka AI Assistant";

/// Value shipped in sample configs; treated the same as no key at all
pub const API_KEY_PLACEHOLDER: &str = "your_api_key_here";

/// Where chat completion requests are sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Endpoint {
    /// Upstream API, authenticated by the client
    Direct {
        base_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
    /// Proxy that injects the credential server-side
    Proxy { url: String },
}

impl Endpoint {
    pub fn direct(api_key: impl Into<String>) -> Self {
        Self::Direct {
            base_url: OPENROUTER_API_BASE.to_string(),
            api_key: Some(api_key.into()),
        }
    }

    pub fn proxy(url: impl Into<String>) -> Self {
        Self::Proxy { url: url.into() }
    }

    pub fn completions_url(&self) -> String {
        match self {
            Self::Direct { base_url, .. } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
            Self::Proxy { url } => url.clone(),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            Self::Direct { api_key, .. } => api_key.as_deref(),
            Self::Proxy { .. } => None,
        }
    }

    /// Key to send, checked before any request is built
    ///
    /// Direct endpoints need a real key; the proxy needs none.
    pub fn credential(&self) -> Result<Option<&str>> {
        match self {
            Self::Direct { base_url, api_key } => api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty() && *k != API_KEY_PLACEHOLDER)
                .map(Some)
                .ok_or_else(|| LlmError::MissingCredential(base_url.clone())),
            Self::Proxy { .. } => Ok(None),
        }
    }
}

/// Static chat configuration, created once per session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
    /// Overrides the catalog limit when set
    pub max_tokens: Option<u32>,
    pub use_proxy: bool,
    pub proxy_url: String,
    pub base_url: String,
    /// Secret; only read from the environment, never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub referer: String,
    pub title: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            use_proxy: true,
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            base_url: OPENROUTER_API_BASE.to_string(),
            api_key: None,
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl ChatSettings {
    pub fn endpoint(&self) -> Endpoint {
        if self.use_proxy {
            Endpoint::proxy(self.proxy_url.clone())
        } else {
            Endpoint::Direct {
                base_url: self.base_url.clone(),
                api_key: self.api_key.clone(),
            }
        }
    }

    /// Request options for the configured model
    pub fn options(&self, catalog: &ModelCatalog) -> ChatOptions {
        ChatOptions::new()
            .temperature(self.temperature)
            .max_tokens(
                self.max_tokens
                    .unwrap_or_else(|| catalog.token_limit(&self.model)),
            )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    pub attachments: bool,
    pub images: bool,
}

impl ModelCapabilities {
    pub const fn new(attachments: bool, images: bool) -> Self {
        Self { attachments, images }
    }
}

/// Per-model token limits and capabilities, with a default entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub limits: HashMap<String, u32>,
    pub capabilities: HashMap<String, ModelCapabilities>,
    pub default_limit: u32,
    pub default_capabilities: ModelCapabilities,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        let models: [(&str, u32, ModelCapabilities); 8] = [
            ("deepseek/deepseek-r1-0528:free", 32768, ModelCapabilities::new(true, false)),
            ("meta-llama/llama-3.3-70b-instruct:free", 8192, ModelCapabilities::new(false, false)),
            ("meta-llama/llama-3.1-405b-instruct:free", 8192, ModelCapabilities::new(true, false)),
            ("meta-llama/llama-3.2-3b-instruct:free", 8192, ModelCapabilities::new(true, false)),
            ("qwen/qwen3-4b:free", 8192, ModelCapabilities::new(true, false)),
            ("mistralai/mistral-small-3.1-24b-instruct:free", 8192, ModelCapabilities::new(true, false)),
            ("google/gemma-3-4b-it:free", 8192, ModelCapabilities::new(true, false)),
            ("z-ai/glm-4.5-air:free", 8192, ModelCapabilities::new(true, true)),
        ];

        Self {
            limits: models
                .iter()
                .map(|(name, limit, _)| (name.to_string(), *limit))
                .collect(),
            capabilities: models
                .iter()
                .map(|(name, _, caps)| (name.to_string(), *caps))
                .collect(),
            default_limit: 4096,
            default_capabilities: ModelCapabilities::default(),
        }
    }
}

impl ModelCatalog {
    pub fn token_limit(&self, model: &str) -> u32 {
        self.limits.get(model).copied().unwrap_or(self.default_limit)
    }

    pub fn capabilities(&self, model: &str) -> ModelCapabilities {
        self.capabilities
            .get(model)
            .copied()
            .unwrap_or(self.default_capabilities)
    }

    /// Known model names, sorted
    pub fn models(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.limits.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Factory for creating chat clients from settings
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_client(settings: &ChatSettings) -> Result<Arc<dyn ChatClient>> {
        let client = crate::openai::CompletionsClient::from_settings(settings)?;
        Ok(Arc::new(client))
    }
}

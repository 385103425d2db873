use config::{Config as ConfigLoader, ConfigError, Environment, File};
use looka_llm::config::{API_KEY_PLACEHOLDER, DEFAULT_TITLE, OPENROUTER_API_BASE};
use serde::Deserialize;
use std::path::Path;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub upstream: UpstreamConfig,
    pub log: LogConfig,

    // Secret (from ENV only)
    #[serde(skip)]
    pub openrouter_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds until the upstream must have answered with headers
    pub timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            timeout: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// API base; `/chat/completions` is appended
    pub url: String,
    /// Sent as `HTTP-Referer` when the caller gave none
    pub referer: String,
    pub title: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: OPENROUTER_API_BASE.to_string(),
            referer: "https://looka-ai.vercel.app".to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (SERVER_PORT, UPSTREAM_URL, LOG_LEVEL, ...)
    ///
    /// A missing key is not an error here; the proxy answers 500 per request.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        for prefix in ["SERVER", "UPSTREAM", "LOG"] {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .keep_prefix(true)
                    .separator("_")
                    .try_parsing(true),
            );
        }

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.openrouter_api_key = api_key_from_env();

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.openrouter_api_key = usable_key(key.into());
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_VAR).ok().and_then(usable_key)
}

/// Blank and sample keys count as unset
fn usable_key(key: String) -> Option<String> {
    let key = key.trim().to_string();
    (!key.is_empty() && key != API_KEY_PLACEHOLDER).then_some(key)
}

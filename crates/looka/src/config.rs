use config::{Config as ConfigLoader, ConfigError, Environment, File};
use looka_llm::{ChatSettings, ModelCatalog};
use looka_persist::SupabaseConfig;
use serde::Deserialize;
use std::path::Path;

/// Terminal client configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: ChatSettings,
    pub catalog: Option<ModelCatalog>,
    /// Chats are kept in memory when no URL is configured
    pub supabase: SupabaseConfig,
    pub log: LogConfig,
    pub terminal: TerminalConfig,
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
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Force highlighted output on or off; detected from stdout when unset
    pub rich: Option<bool>,
    /// Use installed formatters (prettier, rustfmt, gofmt, black) when found
    pub external_formatters: bool,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (LLM_MODEL, SUPABASE_URL, LOG_LEVEL, ...)
    ///
    /// Secrets come from OPENROUTER_API_KEY and SUPABASE_ANON_KEY only.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        for prefix in ["LLM", "SUPABASE", "LOG"] {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .keep_prefix(true)
                    .separator("_")
                    .try_parsing(true),
            );
        }

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.llm.api_key = secret("OPENROUTER_API_KEY");
        cfg.supabase.anon_key = secret("SUPABASE_ANON_KEY").unwrap_or_default();

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    pub fn catalog(&self) -> ModelCatalog {
        self.catalog.clone().unwrap_or_default()
    }

    /// Whether a remote chat store is configured at all
    pub fn has_remote_store(&self) -> bool {
        !self.supabase.url.trim().is_empty()
    }
}

fn secret(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

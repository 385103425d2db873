//! Pretty-printing capability.
//!
//! [`PrettyPrinter`] is the only thing the formatting pipeline depends on.
//! [`ExternalFormatter`] shells out to installed formatters and may be
//! unavailable; [`FallbackFormatter`] is deterministic and always present.
//! [`FormatterChain`] combines them.

mod brace;
mod external;
mod json;
mod markup;

pub use brace::{pretty_braces, CommentStyle};
pub use external::{ExternalFormatter, ToolSpec};
pub use json::pretty_json;
pub use markup::pretty_markup;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{FormatError, Result};
use crate::language::LanguageFamily;

const SCRIPT_INDENT: &str = "    ";
const STYLESHEET_INDENT: &str = "  ";

#[async_trait]
pub trait PrettyPrinter: Send + Sync {
    fn name(&self) -> &str;

    /// Format `source` written in `language`
    async fn pretty(&self, language: Option<&str>, source: &str) -> Result<String>;
}

/// Deterministic per-family re-indentation; every output is a fixed point
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackFormatter;

impl FallbackFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, family: LanguageFamily, source: &str) -> Result<String> {
        match family {
            LanguageFamily::Json => pretty_json(source),
            LanguageFamily::Markup => Ok(pretty_markup(source)),
            LanguageFamily::Stylesheet => {
                Ok(pretty_braces(source, CommentStyle::Block, STYLESHEET_INDENT))
            }
            LanguageFamily::Script => {
                Ok(pretty_braces(source, CommentStyle::BlockAndLine, SCRIPT_INDENT))
            }
            LanguageFamily::Indented | LanguageFamily::Unknown => Ok(trim_trailing(source)),
        }
    }
}

#[async_trait]
impl PrettyPrinter for FallbackFormatter {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn pretty(&self, language: Option<&str>, source: &str) -> Result<String> {
        self.format(LanguageFamily::from_tag(language), source)
    }
}

fn trim_trailing(source: &str) -> String {
    source
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// Rich formatter first, then the fallback, then the raw source
#[derive(Clone)]
pub struct FormatterChain {
    rich: Option<Arc<dyn PrettyPrinter>>,
    fallback: FallbackFormatter,
}

impl Default for FormatterChain {
    fn default() -> Self {
        Self::fallback_only()
    }
}

impl FormatterChain {
    pub fn new(rich: Arc<dyn PrettyPrinter>) -> Self {
        Self {
            rich: Some(rich),
            fallback: FallbackFormatter::new(),
        }
    }

    pub fn fallback_only() -> Self {
        Self {
            rich: None,
            fallback: FallbackFormatter::new(),
        }
    }

    /// Chain backed by formatters found on `PATH`
    pub fn with_external() -> Self {
        Self::new(Arc::new(ExternalFormatter::new()))
    }

    /// Never fails: a block nobody can format keeps its raw source
    pub async fn pretty_or_raw(&self, language: Option<&str>, source: &str) -> String {
        match self.pretty(language, source).await {
            Ok(pretty) => pretty,
            Err(e) => {
                tracing::warn!(language = language.unwrap_or("none"), error = %e, "Pretty-print failed, showing raw source");
                source.to_string()
            }
        }
    }
}

#[async_trait]
impl PrettyPrinter for FormatterChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn pretty(&self, language: Option<&str>, source: &str) -> Result<String> {
        if let Some(rich) = &self.rich {
            match rich.pretty(language, source).await {
                Ok(pretty) => return Ok(pretty),
                Err(FormatError::Unavailable(_)) => {}
                Err(e) => {
                    tracing::debug!(formatter = rich.name(), error = %e, "Rich formatter failed, using fallback");
                }
            }
        }

        self.fallback.pretty(language, source).await
    }
}

use serde::{Deserialize, Serialize};

use crate::heuristic::punctuation_density;

/// Formatting family a language tag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageFamily {
    Json,
    Markup,
    Stylesheet,
    /// Brace and semicolon languages
    Script,
    /// Languages where indentation carries meaning
    Indented,
    Unknown,
}

impl LanguageFamily {
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return Self::Unknown;
        };

        match tag.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "html" | "htm" | "xhtml" | "xml" | "svg" | "vue" => Self::Markup,
            "css" | "scss" | "less" => Self::Stylesheet,
            "js" | "javascript" | "jsx" | "mjs" | "ts" | "typescript" | "tsx" | "java" | "c"
            | "h" | "cpp" | "cc" | "hpp" | "csharp" | "cs" | "go" | "golang" | "rust" | "rs"
            | "php" | "swift" | "kotlin" | "kt" | "scala" | "dart" => Self::Script,
            "python" | "py" | "yaml" | "yml" | "ruby" | "rb" | "shell" | "sh" | "bash" | "zsh"
            | "sql" => Self::Indented,
            _ => Self::Unknown,
        }
    }
}

/// Best guess at a language tag for unfenced code
pub fn guess_language(source: &str) -> Option<&'static str> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return None;
    }

    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        return Some("json");
    }

    if trimmed.starts_with("<?xml") {
        return Some("xml");
    }
    if trimmed.starts_with('<') {
        return Some("html");
    }

    let pythonic = trimmed.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("def ") || line.starts_with("import ") || line.starts_with("from ")
    });
    if pythonic && !trimmed.contains('{') {
        return Some("python");
    }

    if punctuation_density(trimmed) >= crate::heuristic::DENSITY_THRESHOLD {
        return Some("javascript");
    }

    None
}

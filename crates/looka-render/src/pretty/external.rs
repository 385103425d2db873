use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::PrettyPrinter;
use crate::error::{FormatError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A formatter binary and the arguments that make it read stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub program: &'static str,
    pub args: Vec<&'static str>,
}

impl ToolSpec {
    fn new(program: &'static str, args: &[&'static str]) -> Self {
        Self {
            program,
            args: args.to_vec(),
        }
    }

    /// Tool for a language tag, if one is known
    pub fn for_language(language: &str) -> Option<Self> {
        let prettier = |parser: &'static str| Self::new("prettier", &["--parser", parser]);

        let spec = match language.to_ascii_lowercase().as_str() {
            "js" | "javascript" | "jsx" | "mjs" => prettier("babel"),
            "ts" | "typescript" | "tsx" => prettier("typescript"),
            "json" => prettier("json"),
            "css" => prettier("css"),
            "scss" => prettier("scss"),
            "less" => prettier("less"),
            "html" | "htm" => prettier("html"),
            "vue" => prettier("vue"),
            "yaml" | "yml" => prettier("yaml"),
            "md" | "markdown" => prettier("markdown"),
            "rust" | "rs" => Self::new("rustfmt", &["--edition", "2021"]),
            "go" | "golang" => Self::new("gofmt", &[]),
            "python" | "py" => Self::new("black", &["--quiet", "-"]),
            _ => return None,
        };
        Some(spec)
    }
}

/// Rich formatter backed by binaries on `PATH`
///
/// Each binary is looked up once, on first use; a missing one makes the
/// language [`FormatError::Unavailable`] for the rest of the process.
pub struct ExternalFormatter {
    resolved: Mutex<HashMap<&'static str, Option<PathBuf>>>,
    timeout: Duration,
}

impl Default for ExternalFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalFormatter {
    pub fn new() -> Self {
        Self {
            resolved: Mutex::new(HashMap::new()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn resolve(&self, program: &'static str) -> Option<PathBuf> {
        let mut resolved = match self.resolved.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        resolved
            .entry(program)
            .or_insert_with(|| {
                let found = which::which(program).ok();
                tracing::debug!(program, found = found.is_some(), "Resolved external formatter");
                found
            })
            .clone()
    }

    async fn run(&self, path: PathBuf, spec: &ToolSpec, source: &str) -> Result<String> {
        let mut child = Command::new(&path)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes()).await?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| FormatError::failed(spec.program, "timed out"))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FormatError::failed(
                spec.program,
                format!("{}: {}", output.status, stderr.trim()),
            ));
        }

        let formatted = String::from_utf8_lossy(&output.stdout);
        Ok(formatted.trim_end().to_string())
    }
}

#[async_trait]
impl PrettyPrinter for ExternalFormatter {
    fn name(&self) -> &str {
        "external"
    }

    async fn pretty(&self, language: Option<&str>, source: &str) -> Result<String> {
        let language = language.unwrap_or("unknown");
        let spec = ToolSpec::for_language(language)
            .ok_or_else(|| FormatError::Unavailable(language.to_string()))?;
        let path = self
            .resolve(spec.program)
            .ok_or_else(|| FormatError::Unavailable(format!("{} ({} not installed)", language, spec.program)))?;

        self.run(path, &spec, source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_specs() {
        assert_eq!(ToolSpec::for_language("TSX").unwrap().args, vec!["--parser", "typescript"]);
        assert_eq!(ToolSpec::for_language("rust").unwrap().program, "rustfmt");
        assert!(ToolSpec::for_language("cobol").is_none());
    }

    #[tokio::test]
    async fn test_unknown_language_is_unavailable() {
        let formatter = ExternalFormatter::new();

        let err = formatter.pretty(Some("cobol"), "MOVE A TO B.").await.unwrap_err();

        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_missing_binary_is_remembered() {
        let formatter = ExternalFormatter::new();

        assert!(formatter.resolve("looka-no-such-formatter").is_none());
        let cached = formatter.resolved.lock().unwrap();
        assert_eq!(cached.get("looka-no-such-formatter"), Some(&None));
    }
}

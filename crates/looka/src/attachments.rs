use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use looka_llm::Attachment;
use std::path::Path;

const DEFAULT_MIME: &str = "application/octet-stream";

/// MIME type guessed from the file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("txt" | "log") => "text/plain",
        Some("md" | "markdown") => "text/markdown",
        Some("csv") => "text/csv",
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("js" | "mjs") => "text/javascript",
        Some("ts") => "text/typescript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("toml") => "application/toml",
        Some("yaml" | "yml") => "application/yaml",
        Some("py") => "text/x-python",
        Some("rs") => "text/x-rust",
        Some("go") => "text/x-go",
        Some("c" | "h") => "text/x-c",
        Some("java") => "text/x-java",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        _ => DEFAULT_MIME,
    }
}

/// Build an attachment from a file on disk
///
/// Images become base64 data URLs, anything readable as text becomes a
/// document excerpt, and everything else is described by name and size.
pub async fn attachment_from_path(path: &Path) -> Result<Attachment> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Cannot attach {}", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_for_path(path);

    if mime_type.starts_with("image/") {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        tracing::debug!(%name, bytes = bytes.len(), "Attached image");

        return Ok(Attachment::Image {
            name,
            mime_type: mime_type.to_string(),
            data: data_url(mime_type, &bytes),
        });
    }

    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            tracing::debug!(%name, chars = text.chars().count(), "Attached document");
            Ok(Attachment::document(name, mime_type, &text))
        }
        Err(error) => {
            tracing::debug!(%name, %error, "Not readable as text, attaching metadata only");
            Ok(Attachment::File {
                name,
                mime_type: mime_type.to_string(),
                size: metadata.len(),
            })
        }
    }
}

pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_by_extension() {
        assert_eq!(mime_for_path(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("notes.md")), "text/markdown");
        assert_eq!(mime_for_path(Path::new("Makefile")), DEFAULT_MIME);
    }

    #[test]
    fn test_data_url() {
        assert_eq!(data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }
}

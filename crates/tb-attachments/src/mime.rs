//! Content-based MIME validation.
//!
//! Detection inspects the bytes; a declared content type or the file
//! extension is never trusted. Two allow-listed families carry no magic
//! number and get explicit sniffing: SVG and plain text.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use tracing::debug;

/// Built-in allow-list, applied when configuration supplies no types
pub static DEFAULT_ALLOWED_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "text/plain",
        "image/jpeg",
        "image/png",
        "image/bmp",
        "image/gif",
        "image/tiff",
        "image/webp",
        // svg
        "image/svg+xml",
        // pdf
        "application/pdf",
        // word
        "application/rtf",
        "application/doc",
        "application/ms-doc",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        // excel
        "application/excel",
        "application/vnd.ms-excel",
        "application/x-excel",
        "application/x-msexcel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        // powerpoint
        "application/mspowerpoint",
        "application/powerpoint",
        "application/vnd.ms-powerpoint",
        "application/x-mspowerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        // zip
        "application/zip",
        "application/x-7z-compressed",
    ]
    .into_iter()
    .collect()
});

/// Detect the MIME type of a byte buffer. Returns `None` when the content
/// matches no known signature, which callers treat as a rejection.
///
/// The SVG sniff runs before magic-number detection: an XML prolog would
/// otherwise match as generic XML and hide the SVG element behind it.
pub fn detect_mime(content: &[u8]) -> Option<&'static str> {
    if looks_like_svg(content) {
        return Some("image/svg+xml");
    }
    if let Some(kind) = infer::get(content) {
        return Some(kind.mime_type());
    }
    if looks_like_text(content) {
        return Some("text/plain");
    }
    None
}

fn looks_like_svg(content: &[u8]) -> bool {
    let head = &content[..content.len().min(1024)];
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        // A multi-byte character may straddle the cut; keep the valid part
        Err(e) => match std::str::from_utf8(&head[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
    };
    let trimmed = text.trim_start();
    trimmed.starts_with("<svg") || (trimmed.starts_with("<?xml") && text.contains("<svg"))
}

fn looks_like_text(content: &[u8]) -> bool {
    !content.is_empty() && !content.contains(&0) && std::str::from_utf8(content).is_ok()
}

/// Allow-list gate for uploads.
///
/// Holds the raw configured value and re-derives the active set on every
/// check, so configuration changes take effect without rebuilding the
/// validator.
#[derive(Debug, Clone, Default)]
pub struct MimeValidator {
    /// Newline- or comma-separated types; empty applies the default list
    allowed_types: String,
}

impl MimeValidator {
    pub fn new(allowed_types: impl Into<String>) -> Self {
        Self {
            allowed_types: allowed_types.into(),
        }
    }

    /// Check a byte buffer against the allow-list. A type missing from the
    /// list and a failed detection are both rejections.
    pub fn is_allowed(&self, content: &[u8]) -> bool {
        match detect_mime(content) {
            Some(mime_type) => {
                let allowed = self.is_type_allowed(mime_type);
                if !allowed {
                    debug!(mime_type = mime_type, "Content type not in allow-list");
                }
                allowed
            }
            None => {
                debug!("Content type could not be detected");
                false
            }
        }
    }

    /// Path variant: inspects the file at `path`. Unreadable paths reject.
    pub async fn is_allowed_path(&self, path: &Path) -> bool {
        match tokio::fs::read(path).await {
            Ok(content) => self.is_allowed(&content),
            Err(_) => false,
        }
    }

    fn is_type_allowed(&self, mime_type: &str) -> bool {
        let mut configured = self
            .allowed_types
            .split(|c| c == '\n' || c == ',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .peekable();

        if configured.peek().is_none() {
            return DEFAULT_ALLOWED_TYPES.contains(mime_type);
        }
        configured.any(|t| t == mime_type)
    }
}

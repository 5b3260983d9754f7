//! File name and content-type helpers for uploads and previews.

use serde::{Deserialize, Serialize};

/// How a document can be rendered in the preview pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Image,
    Pdf,
    Text,
    Other,
}

impl PreviewKind {
    /// Whether the document can be previewed inline at all.
    pub fn previewable(&self) -> bool {
        !matches!(self, PreviewKind::Other)
    }
}

/// Classify a document for preview based on MIME type and filename.
pub fn preview_kind(mimetype: Option<&str>, filename: &str) -> PreviewKind {
    let lower = filename.to_lowercase();
    match mimetype {
        Some(m) if m.starts_with("image/") => PreviewKind::Image,
        Some("application/pdf") => PreviewKind::Pdf,
        Some(m) if m.starts_with("text/") => PreviewKind::Text,
        _ if lower.ends_with(".pdf") => PreviewKind::Pdf,
        _ if lower.ends_with(".txt") || lower.ends_with(".md") => PreviewKind::Text,
        _ => PreviewKind::Other,
    }
}

/// Whether extracted text can be read natively from the upload bytes
/// (everything else goes through the external OCR collaborator).
pub fn is_native_text(mimetype: Option<&str>) -> bool {
    matches!(mimetype, Some(m) if m.starts_with("text/") || m == "application/json")
}

/// Maximum stored filename length in bytes.
const MAX_FILENAME_BYTES: usize = 255;

/// Longest prefix of `s` that fits in `max_bytes` without splitting a
/// multi-byte character.
fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Sanitize a client-supplied filename.
///
/// Strips path components, replaces dangerous characters, enforces a
/// 255-byte limit while preserving the extension.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    if sanitized.len() > MAX_FILENAME_BYTES {
        // Keep the extension only when it leaves room for a stem; a dot
        // at position 0 is a dotfile, not an extension.
        let (stem, ext) = match sanitized.rfind('.') {
            Some(pos) if pos > 0 && sanitized.len() - pos < MAX_FILENAME_BYTES => {
                sanitized.split_at(pos)
            }
            _ => (sanitized, ""),
        };
        let stem = truncate_on_char_boundary(stem, MAX_FILENAME_BYTES - ext.len());
        return format!("{}{}", stem, ext);
    }

    sanitized.to_string()
}

/// File extension (with leading dot) of a filename, lowercased.
pub fn file_extension(filename: &str) -> String {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => filename[pos..].to_lowercase(),
        _ => String::new(),
    }
}

/// Detect a content type from upload bytes, falling back to the claimed type.
///
/// Magic-byte detection first (via `infer`); text-like claims are trusted
/// since they legitimately lack magic bytes.
pub fn detect_content_type(data: &[u8], claimed: Option<&str>) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }
    claimed
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Human-readable file size ("1.5 MB").
pub fn format_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.1} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Human-readable academic year label ("1st Year").
pub fn year_label(year: i32) -> String {
    match year {
        1 => "1st Year".to_string(),
        2 => "2nd Year".to_string(),
        3 => "3rd Year".to_string(),
        4 => "4th Year".to_string(),
        y => format!("{} Year", y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_kind_from_mime() {
        assert_eq!(preview_kind(Some("image/png"), "x.png"), PreviewKind::Image);
        assert_eq!(preview_kind(Some("application/pdf"), "x.pdf"), PreviewKind::Pdf);
        assert_eq!(preview_kind(Some("text/plain"), "x.txt"), PreviewKind::Text);
        assert_eq!(
            preview_kind(Some("application/zip"), "x.zip"),
            PreviewKind::Other
        );
    }

    #[test]
    fn test_preview_kind_extension_fallback() {
        assert_eq!(preview_kind(None, "notes.PDF"), PreviewKind::Pdf);
        assert_eq!(preview_kind(None, "notes.md"), PreviewKind::Text);
        assert_eq!(preview_kind(None, "archive.tar"), PreviewKind::Other);
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\x\\doc.pdf"), "doc.pdf");
    }

    #[test]
    fn test_sanitize_replaces_dangerous_chars() {
        assert_eq!(sanitize_filename("a<b>c:d.txt"), "a_b_c_d.txt");
    }

    #[test]
    fn test_sanitize_empty_becomes_unnamed() {
        assert_eq!(sanitize_filename(""), "unnamed_file");
        assert_eq!(sanitize_filename("   "), "unnamed_file");
    }

    #[test]
    fn test_sanitize_truncates_preserving_extension() {
        let long = format!("{}.pdf", "a".repeat(300));
        let out = sanitize_filename(&long);
        assert!(out.len() <= 255);
        assert!(out.ends_with(".pdf"));
    }

    #[test]
    fn test_sanitize_truncates_multibyte_on_char_boundary() {
        // 200 two-byte chars = 400 bytes, no dot
        let out = sanitize_filename(&"é".repeat(200));
        assert!(out.len() <= 255);
        assert!(out.chars().all(|c| c == 'é'));

        // Multi-byte stem with an ASCII extension
        let out = sanitize_filename(&format!("{}.pdf", "日".repeat(150)));
        assert!(out.len() <= 255);
        assert!(out.ends_with(".pdf"));
    }

    #[test]
    fn test_sanitize_oversized_extension_drops_it() {
        // Dotfile longer than the limit: the dot at position 0 is not an
        // extension, so the whole name is truncated
        let out = sanitize_filename(&format!(".{}", "a".repeat(300)));
        assert_eq!(out.len(), 255);

        // A 300-byte "extension" cannot be preserved either
        let out = sanitize_filename(&format!("doc.{}", "x".repeat(300)));
        assert_eq!(out.len(), 255);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("report.PDF"), ".pdf");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension(".bashrc"), "");
    }

    #[test]
    fn test_detect_content_type_png_magic() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(detect_content_type(&png, Some("text/plain")), "image/png");
    }

    #[test]
    fn test_detect_content_type_trusts_text_claim() {
        assert_eq!(
            detect_content_type(b"hello world", Some("text/plain")),
            "text/plain"
        );
        assert_eq!(
            detect_content_type(b"hello", None),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_is_native_text() {
        assert!(is_native_text(Some("text/plain")));
        assert!(is_native_text(Some("text/markdown")));
        assert!(is_native_text(Some("application/json")));
        assert!(!is_native_text(Some("application/pdf")));
        assert!(!is_native_text(None));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_year_label() {
        assert_eq!(year_label(1), "1st Year");
        assert_eq!(year_label(2), "2nd Year");
        assert_eq!(year_label(3), "3rd Year");
        assert_eq!(year_label(4), "4th Year");
        assert_eq!(year_label(7), "7 Year");
    }
}

//! Centralized default values shared across crates.

/// Maximum accepted upload size in bytes (50 MB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Session lifetime in days.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Signed URL expiry for downloads, in seconds.
pub const DOWNLOAD_URL_EXPIRY_SECS: u64 = 300;

/// Signed URL expiry for inline previews, in seconds.
pub const PREVIEW_URL_EXPIRY_SECS: u64 = 3600;

/// Default collection accent color.
pub const COLLECTION_COLOR: &str = "#667eea";

/// Default collection icon identifier.
pub const COLLECTION_ICON: &str = "folder";

/// Default Gemini API endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini generation model.
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default OpenAI-compatible API endpoint (fallback provider).
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default OpenAI generation model.
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Maximum number of related documents returned by recommendations.
pub const RELATED_LIMIT: usize = 10;

/// Cosine score floor below which similarity hits are dropped.
pub const SIMILARITY_FLOOR: f32 = 0.05;

//! paperstack-api - HTTP API server for paperstack
//!
//! Multi-tenant document organizer: uploads, tagging, collections,
//! sharing, comments, study groups, notifications, TF-IDF search, and
//! AI study tools (summaries, tag suggestions, quizzes, study plans,
//! chat) behind a bearer-token session API.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRequestParts, State},
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use uuid::Uuid;

use paperstack_core::{defaults, SessionInfo};
use paperstack_db::Database;
use paperstack_inference::{FallbackBackend, GenerationBackend};
use paperstack_storage::{StorageConfig, StorageRouter};

mod handlers;

use handlers::{
    ai, auth, chat, collections, comments, documents, groups, notifications, search, shares,
    stats, tags,
};

/// Request ID maker using UUIDv7 (time-ordered, sortable in logs).
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Global rate limiter type (direct quota, no keyed bucketing).
type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub storage: Arc<StorageRouter>,
    /// AI generation backend (None when no provider key is configured).
    pub inference: Option<Arc<dyn GenerationBackend + Send + Sync>>,
    /// Global rate limiter (None if rate limiting is disabled).
    rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

/// OpenAPI document metadata, served at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Paperstack API",
        version = "0.4.0",
        description = "Document organizer with collections, sharing, semantic search, and AI study tools"
    ),
    tags(
        (name = "Auth", description = "Session login and logout"),
        (name = "Documents", description = "Upload, metadata, download, preview"),
        (name = "Tags", description = "Tag cloud and tag-scoped listings"),
        (name = "Collections", description = "Document groupings"),
        (name = "Sharing", description = "Document and collection shares"),
        (name = "Comments", description = "Document annotations"),
        (name = "Groups", description = "Study groups and membership"),
        (name = "Notifications", description = "Per-user notification feed"),
        (name = "Search", description = "Text and TF-IDF semantic search"),
        (name = "AI", description = "Summaries, tag suggestions, quizzes, study plans, chat"),
        (name = "System", description = "Health checks and stats")
    )
)]
struct ApiDoc;

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Internal(paperstack_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unavailable(String),
}

impl From<paperstack_core::Error> for ApiError {
    fn from(err: paperstack_core::Error) -> Self {
        use paperstack_core::Error;
        match &err {
            Error::DocumentNotFound(id) => ApiError::NotFound(format!("Document {} not found", id)),
            Error::CollectionNotFound(id) => {
                ApiError::NotFound(format!("Collection {} not found", id))
            }
            Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            Error::Forbidden(msg) => ApiError::Forbidden(msg.clone()),
            Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    return ApiError::Conflict(msg);
                }
                if msg.contains("foreign key") {
                    return ApiError::BadRequest(msg);
                }
                ApiError::Internal(err)
            }
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// AUTHENTICATION EXTRACTOR
// =============================================================================

/// Extractor that requires a valid bearer session token.
///
/// Usage:
/// ```ignore
/// async fn my_handler(auth: RequireAuth) -> impl IntoResponse {
///     let account_id = auth.session.account_id;
///     // ... handler logic
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth {
    pub session: SessionInfo,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = match auth_header {
            Some(header) if header.starts_with("Bearer ") => {
                header.trim_start_matches("Bearer ").trim()
            }
            _ => {
                return Err(ApiError::Unauthorized(
                    "Authentication required".to_string(),
                ))
            }
        };

        let session = state.db.sessions.resolve(token).await?;
        Ok(RequireAuth { session })
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Parse allowed origins from the `ALLOWED_ORIGINS` environment variable
/// (comma-separated). Defaults to common local dev servers.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "paperstack_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "paperstack_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("paperstack-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/paperstack".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    // Rate limiting configuration
    // RATE_LIMIT_REQUESTS: requests per period (default: 100)
    // RATE_LIMIT_PERIOD_SECS: period in seconds (default: 60)
    let rate_limit_requests: u64 = std::env::var("RATE_LIMIT_REQUESTS")
        .unwrap_or_else(|_| "100".to_string())
        .parse()
        .unwrap_or(100);
    let rate_limit_period_secs: u64 = std::env::var("RATE_LIMIT_PERIOD_SECS")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .unwrap_or(60);
    let rate_limit_enabled: bool = std::env::var("RATE_LIMIT_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    info!(
        "Rate limiting: {} ({} requests per {} seconds)",
        if rate_limit_enabled {
            "enabled"
        } else {
            "disabled"
        },
        rate_limit_requests,
        rate_limit_period_secs
    );

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Initialize blob storage (local always, S3/Azure when configured)
    // and fail boot if the local fallback directory is not writable
    let storage = StorageConfig::from_env().build()?;
    storage.validate().await?;
    let storage = Arc::new(storage);
    info!("Storage initialized, active backend: {}", storage.active_kind());

    // AI generation backend: Gemini primary, OpenAI fallback
    let inference: Option<Arc<dyn GenerationBackend + Send + Sync>> =
        match FallbackBackend::from_env() {
            Some(backend) => {
                info!(
                    "Inference backend initialized: {} ({})",
                    backend.provider_id(),
                    backend.model_name()
                );
                Some(Arc::new(backend))
            }
            None => {
                info!("No inference provider configured, AI endpoints disabled");
                None
            }
        };

    // Create rate limiter if enabled
    let rate_limiter = if rate_limit_enabled {
        let quota = build_rate_quota(rate_limit_requests as u32, rate_limit_period_secs)?;
        Some(Arc::new(RateLimiter::direct(quota)))
    } else {
        None
    };

    let state = AppState {
        db,
        storage,
        inference,
        rate_limiter,
    };

    // Periodic pool health logging
    let metrics_pool = state.db.pool().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            paperstack_db::log_pool_metrics(&metrics_pool);
        }
    });

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/openapi.json", get(openapi_json))
        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        // Documents
        .route(
            "/api/v1/documents",
            get(documents::list_documents).post(documents::upload_documents),
        )
        .route("/api/v1/notes", post(documents::create_note))
        .route(
            "/api/v1/documents/:id",
            get(documents::get_document)
                .patch(documents::update_document)
                .delete(documents::delete_document),
        )
        .route("/api/v1/documents/:id/download", get(documents::download_document))
        .route("/api/v1/documents/:id/preview", get(documents::preview_document))
        .route("/api/v1/documents/:id/raw", get(documents::raw_document))
        .route("/api/v1/documents/:id/text", put(documents::put_document_text))
        .route("/api/v1/years", get(documents::list_years))
        // Tags
        .route("/api/v1/tags", get(tags::list_tags))
        .route("/api/v1/tags/:slug/documents", get(tags::documents_for_tag))
        // Collections
        .route(
            "/api/v1/collections",
            get(collections::list_collections).post(collections::create_collection),
        )
        .route(
            "/api/v1/collections/:id",
            get(collections::get_collection)
                .patch(collections::update_collection)
                .delete(collections::delete_collection),
        )
        .route(
            "/api/v1/collections/:id/documents",
            post(collections::add_documents),
        )
        .route(
            "/api/v1/collections/:id/documents/:doc_id",
            delete(collections::remove_document),
        )
        // Sharing
        .route(
            "/api/v1/documents/:id/shares",
            get(shares::list_document_shares).post(shares::share_document),
        )
        .route(
            "/api/v1/collections/:id/shares",
            get(shares::list_collection_shares).post(shares::share_collection),
        )
        .route("/api/v1/shares/:id", delete(shares::revoke_share))
        .route("/api/v1/shared-with-me", get(shares::shared_with_me))
        // Comments
        .route(
            "/api/v1/documents/:id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/api/v1/comments/:id", delete(comments::delete_comment))
        // Study groups
        .route(
            "/api/v1/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route(
            "/api/v1/groups/:id",
            get(groups::get_group).delete(groups::delete_group),
        )
        .route("/api/v1/groups/:id/members", post(groups::add_member))
        .route(
            "/api/v1/groups/:id/members/:account_id",
            delete(groups::remove_member),
        )
        // Notifications
        .route("/api/v1/notifications", get(notifications::list_notifications))
        .route(
            "/api/v1/notifications/:id/read",
            post(notifications::mark_read),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::mark_all_read),
        )
        // Search
        .route("/api/v1/search", get(search::search_documents))
        .route("/api/v1/search/semantic", get(search::semantic_search))
        .route("/api/v1/documents/:id/related", get(search::related_documents))
        // AI study tools
        .route("/api/v1/documents/:id/summarize", post(ai::summarize_document))
        .route("/api/v1/documents/:id/suggest-tags", post(ai::suggest_tags))
        .route("/api/v1/documents/:id/quiz", post(ai::generate_quiz))
        .route("/api/v1/study-plan", post(ai::generate_study_plan))
        // Chat
        .route(
            "/api/v1/chat/sessions",
            get(chat::list_sessions).post(chat::create_session),
        )
        .route("/api/v1/chat/sessions/:id", delete(chat::delete_session))
        .route(
            "/api/v1/chat/sessions/:id/messages",
            get(chat::list_messages).post(chat::post_message),
        )
        // Stats
        .route("/api/v1/stats", get(stats::library_stats))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(CatchPanicLayer::new())
        .layer({
            let allowed_origins = parse_allowed_origins();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600))
        })
        // Multipart uploads are capped at the configured maximum
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(defaults::MAX_UPLOAD_BYTES))
        .with_state(state);

    // Start server
    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// RATE LIMITING MIDDLEWARE
// =============================================================================

/// Build the rate limiter quota, rejecting zero values from the
/// environment instead of panicking at startup.
fn build_rate_quota(requests: u32, period_secs: u64) -> anyhow::Result<Quota> {
    let burst = NonZeroU32::new(requests)
        .ok_or_else(|| anyhow::anyhow!("RATE_LIMIT_REQUESTS must be at least 1"))?;
    let quota = Quota::with_period(std::time::Duration::from_secs(period_secs))
        .ok_or_else(|| anyhow::anyhow!("RATE_LIMIT_PERIOD_SECS must be at least 1"))?
        .allow_burst(burst);
    Ok(quota)
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!("Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate_limit_exceeded",
                    "error_description": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperstack_core::Error;

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (
                ApiError::Unauthorized("x".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::Forbidden("x".to_string()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (
                ApiError::BadRequest("x".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::Conflict("x".to_string()), StatusCode::CONFLICT),
            (
                ApiError::Unavailable("x".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_core_not_found_maps_to_404() {
        let id = Uuid::now_v7();
        let err: ApiError = Error::DocumentNotFound(id).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = Error::CollectionNotFound(id).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_core_auth_errors_map_to_auth_statuses() {
        let err: ApiError = Error::Unauthorized("expired".to_string()).into();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err: ApiError = Error::Forbidden("viewer".to_string()).into();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let err: ApiError = Error::InvalidInput("bad year".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_inference_error_maps_to_500() {
        let err: ApiError = Error::Inference("provider down".to_string()).into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_build_rate_quota_rejects_zero() {
        assert!(build_rate_quota(0, 60).is_err());
        assert!(build_rate_quota(100, 0).is_err());
    }

    #[test]
    fn test_build_rate_quota_accepts_defaults() {
        assert!(build_rate_quota(100, 60).is_ok());
    }

    #[test]
    fn test_request_id_is_uuid() {
        let mut maker = MakeRequestUuidV7;
        let request = axum::http::Request::new(());
        let id = maker.make_request_id(&request).unwrap();
        let value = id.header_value().to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&value).is_ok());
    }
}

//! # fieldkit HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Workspace counters
//! - `GET|POST /reports` - List (`?trashed=true` for the trash) or create reports
//! - `POST /reports/{id}/trash`, `POST /reports/{id}/restore` - Trash lifecycle
//! - `DELETE /reports/{id}` - Purge a report with its assets and folder
//! - `GET /reports/{id}/assets` - Assets of a report
//! - `GET|POST /reports/{id}/passives` - Passive equipment observations
//! - `GET /reports/{id}/export` - Export document (base64) and checksum
//! - `POST /validate` - Evaluate a draft without saving
//! - `POST /assets` - Explicit save
//! - `DELETE /assets/{id}` - Delete an asset and its photos
//! - `POST /assets/{id}/photos` - Attach a photo to a saved asset
//! - `DELETE /photos/{id}` - Delete a photo
//! - `POST /drafts` - Open an autosave session
//! - `PUT /drafts/{id}` - Replace the draft fields and autosave
//! - `POST /drafts/{id}/photos` - Capture a photo for the session
//! - `DELETE /drafts/{id}` - Close the session
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `FIELDKIT_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `FIELDKIT_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `FIELDKIT_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::get_api_key_from_env;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    ApiError, CreatePassiveRequest, CreateReportRequest, DraftResponse, DraftUpdateResponse,
    ErrorResponse, ExportResponse, HealthResponse, OpenDraftRequest, PhotoUploadRequest,
    ReportListQuery,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use fieldkit_core::{AssetDraft, AutosaveTrigger, FieldError, Workspace};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request body limit. A photo at the core's 12 MiB maximum grows to 16 MiB
/// in base64.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Sessions untouched for this long are dropped on the next open.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Most sessions kept open at once; the least recently used go first.
pub const MAX_OPEN_SESSIONS: usize = 256;

#[derive(Debug)]
struct OpenSession {
    trigger: AutosaveTrigger,
    last_used: Instant,
}

/// Open autosave sessions, keyed by session ID.
///
/// Clients close sessions with `DELETE /drafts/{id}`. Abandoned sessions are
/// reclaimed by [`DraftSessions::expire`].
#[derive(Debug, Default)]
pub struct DraftSessions {
    next_id: u64,
    open: BTreeMap<u64, OpenSession>,
}

impl DraftSessions {
    /// Start a session over `draft` and return it.
    pub fn open(&mut self, draft: AssetDraft) -> &AutosaveTrigger {
        self.next_id += 1;
        let id = self.next_id;
        &self
            .open
            .entry(id)
            .or_insert_with(|| OpenSession {
                trigger: AutosaveTrigger::new(id, draft),
                last_used: Instant::now(),
            })
            .trigger
    }

    /// Look up a session and mark it as used.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut AutosaveTrigger> {
        self.open.get_mut(&id).map(|session| {
            session.last_used = Instant::now();
            &mut session.trigger
        })
    }

    pub fn close(&mut self, id: u64) -> Option<AutosaveTrigger> {
        self.open.remove(&id).map(|session| session.trigger)
    }

    /// Remove sessions idle longer than [`SESSION_IDLE_TIMEOUT`] at `now`,
    /// then the least recently used ones until a new session fits under
    /// [`MAX_OPEN_SESSIONS`]. The caller discards their staged files.
    pub fn expire(&mut self, now: Instant) -> Vec<AutosaveTrigger> {
        let mut stale: Vec<u64> = self
            .open
            .iter()
            .filter(|(_, s)| now.saturating_duration_since(s.last_used) > SESSION_IDLE_TIMEOUT)
            .map(|(id, _)| *id)
            .collect();

        let remaining = self.open.len().saturating_sub(stale.len());
        if remaining >= MAX_OPEN_SESSIONS {
            let mut live: Vec<(Instant, u64)> = self
                .open
                .iter()
                .filter(|(id, _)| !stale.contains(*id))
                .map(|(id, s)| (s.last_used, *id))
                .collect();
            live.sort_unstable();
            let excess = remaining + 1 - MAX_OPEN_SESSIONS;
            stale.extend(live.into_iter().take(excess).map(|(_, id)| id));
        }

        stale.into_iter().filter_map(|id| self.close(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

/// Shared server state.
///
/// Lock order is `drafts` then `workspace`.
#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<RwLock<Workspace>>,
    pub drafts: Arc<Mutex<DraftSessions>>,
}

impl AppState {
    /// Create new app state over a workspace.
    #[must_use]
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace: Arc::new(RwLock::new(workspace)),
            drafts: Arc::new(Mutex::new(DraftSessions::default())),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build CORS layer from environment configuration.
///
/// Reads `FIELDKIT_CORS_ORIGINS`:
/// - If "*": allows all origins (development only)
/// - If not set: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("FIELDKIT_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (FIELDKIT_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in FIELDKIT_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No FIELDKIT_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting - if enabled
/// 5. Authentication - if an API key is configured
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set FIELDKIT_API_KEY environment variable to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/reports",
            get(handlers::list_reports_handler).post(handlers::create_report_handler),
        )
        .route("/reports/{id}", delete(handlers::purge_report_handler))
        .route("/reports/{id}/trash", post(handlers::trash_report_handler))
        .route("/reports/{id}/restore", post(handlers::restore_report_handler))
        .route("/reports/{id}/assets", get(handlers::list_assets_handler))
        .route(
            "/reports/{id}/passives",
            get(handlers::list_passives_handler).post(handlers::create_passive_handler),
        )
        .route("/reports/{id}/export", get(handlers::export_handler))
        .route("/validate", post(handlers::validate_handler))
        .route("/assets", post(handlers::save_asset_handler))
        .route("/assets/{id}", delete(handlers::delete_asset_handler))
        .route("/assets/{id}/photos", post(handlers::upload_photo_handler))
        .route("/photos/{id}", delete(handlers::delete_photo_handler))
        .route("/drafts", post(handlers::open_draft_handler))
        .route(
            "/drafts/{id}",
            put(handlers::update_draft_handler).delete(handlers::close_draft_handler),
        )
        .route("/drafts/{id}/photos", post(handlers::draft_photo_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, workspace: Workspace) -> Result<(), FieldError> {
    let state = AppState::new(workspace);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| FieldError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("fieldkit HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| FieldError::IoError(format!("Server error: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

// SPDX-License-Identifier: PMPL-1.0-or-later
//! AssetCheck API
//!
//! HTTP API server for the permission model and the content-audit workflow.
//! Every route under the version prefix is gated by the caller's stored
//! permission set.

pub mod audit;
pub mod auth;
pub mod config;
pub mod permissions;

use std::sync::Arc;
use std::time::Instant;

use assetcheck_access::AccessError;
use assetcheck_audit::{AuditError, AuditService};
use assetcheck_storage::{InMemoryBackend, SharedBackend, StorageError};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

pub use auth::{Actor, USER_ID_HEADER};
pub use config::ApiConfig;
pub use permissions::PermissionStore;

/// API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The audit log is not in a state that allows the requested review
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied(_) => ApiError::Forbidden(err.to_string()),
            AccessError::UnknownAction(_) | AccessError::UnknownGroup(_) => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Validation(msg) => ApiError::BadRequest(msg),
            AuditError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            AuditError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            AuditError::Storage(storage) => storage.into(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Unwrap a JSON body, turning axum's rejection into a `400` with our error
/// body.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: String,
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub start_time: Instant,
    pub config: Arc<ApiConfig>,
    pub backend: SharedBackend,
    pub permissions: Arc<PermissionStore<SharedBackend>>,
    pub audit: Arc<AuditService<SharedBackend>>,
}

impl AppState {
    /// State over an already opened backend.
    pub fn new(config: ApiConfig, backend: SharedBackend) -> Self {
        let permissions = PermissionStore::new(backend.clone(), config.bootstrap_admins.clone());
        let audit = AuditService::new(backend.clone(), config.proposal_limits());
        Self {
            start_time: Instant::now(),
            config: Arc::new(config),
            backend,
            permissions: Arc::new(permissions),
            audit: Arc::new(audit),
        }
    }

    pub fn in_memory(config: ApiConfig) -> Self {
        Self::new(config, Arc::new(InMemoryBackend::new()))
    }

    /// Open the backend `config` asks for.
    ///
    /// With the `persistent` feature and a `data_dir`, data lives in
    /// `{data_dir}/assetcheck.redb`; otherwise it is kept in memory.
    pub fn open(config: ApiConfig) -> Result<Self, StorageError> {
        let backend = open_backend(&config)?;
        Ok(Self::new(config, backend))
    }
}

#[cfg(feature = "persistent")]
fn open_backend(config: &ApiConfig) -> Result<SharedBackend, StorageError> {
    match &config.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join("assetcheck.redb");
            let backend = assetcheck_storage::RedbBackend::open(&path)?;
            info!(path = %path.display(), "Using persistent redb storage");
            Ok(Arc::new(backend))
        }
        None => Ok(Arc::new(InMemoryBackend::new())),
    }
}

#[cfg(not(feature = "persistent"))]
fn open_backend(config: &ApiConfig) -> Result<SharedBackend, StorageError> {
    if let Some(dir) = &config.data_dir {
        warn!(
            data_dir = %dir.display(),
            "Built without the `persistent` feature; data_dir ignored, using in-memory storage"
        );
    }
    Ok(Arc::new(InMemoryBackend::new()))
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    let prefix = state.config.version_prefix.clone();
    let body_limit = state.config.max_request_bytes();

    let api = Router::new()
        .route("/permissions/catalog", get(permissions::catalog_handler))
        .route(
            "/users/{id}/permissions",
            get(permissions::get_permissions_handler)
                .put(permissions::replace_permissions_handler)
                .patch(permissions::edit_permissions_handler),
        )
        .route(
            "/audit-logs",
            get(audit::list_handler).post(audit::submit_handler),
        )
        .route("/audit-logs/counts", get(audit::counts_handler))
        .route("/audit-logs/{id}", get(audit::get_handler))
        .route("/audit-logs/{id}/review", put(audit::review_handler));

    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .nest(&prefix, api)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Health check handler
#[instrument(skip(state))]
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        storage: state.backend.name().to_string(),
    })
}

/// Readiness check handler: the storage backend must answer a read.
#[instrument(skip(state))]
async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    match state.backend.exists(b"__ready__").await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            warn!(error = %err, "Storage not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Start the API server
pub async fn serve(config: ApiConfig) -> Result<(), std::io::Error> {
    let addr = config.bind_addr();
    let state = AppState::open(config).map_err(std::io::Error::other)?;
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}

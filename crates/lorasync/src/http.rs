//! HTTP front door.
//!
//! Thin axum adapter over [`TenantFanout`]: manual device upserts and a
//! read-only view of the association table.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use lorasync_core::{Association, CoreError, TenantFanout, UpsertDeviceRequest};

#[derive(Clone)]
pub struct AppState {
    fanout: Arc<TenantFanout>,
}

pub fn router(fanout: Arc<TenantFanout>) -> Router {
    Router::new()
        .route("/v1/devices", put(put_device))
        .route("/v1/device-assets", get(list_device_assets))
        .route("/v1/version", get(version))
        .with_state(AppState { fanout })
}

// ── Handlers ────────────────────────────────────────────────────────

async fn put_device(
    State(state): State<AppState>,
    Json(request): Json<UpsertDeviceRequest>,
) -> Result<Json<Vec<Association>>, ApiError> {
    let rows = state.fanout.upsert_device(&request).await?;
    info!(dev_eui = %request.dev_eui, rows = rows.len(), "manual device upsert");
    Ok(Json(rows))
}

async fn list_device_assets(
    State(state): State<AppState>,
) -> Result<Json<Vec<Association>>, ApiError> {
    Ok(Json(state.fanout.list_associations()?))
}

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
}

async fn version() -> Json<VersionInfo> {
    Json(VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Errors ──────────────────────────────────────────────────────────

/// `CoreError` rendered as `{ "error": "<message>" }` with a matching status.
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            CoreError::Validation { .. } => StatusCode::BAD_REQUEST,
            CoreError::NoMatchingConfiguration => StatusCode::NOT_FOUND,
            CoreError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            CoreError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

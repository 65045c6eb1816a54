//! Session API endpoints and the login guard

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub passcode: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub logged_in: bool,
    pub total_count: usize,
    /// Set when the login succeeded but the first fetch did not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Check the passcode, then load the table
pub async fn api_login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest { message: e.body_text() })?;
    state.tracker.login(&request.passcode).await?;

    let warning = match state.tracker.refresh().await {
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    };

    Ok(Json(SessionResponse {
        success: true,
        logged_in: true,
        total_count: state.tracker.count(),
        warning,
    }))
}

pub async fn api_logout(State(state): State<AppState>) -> ApiResult<Json<SessionResponse>> {
    state.tracker.logout().await?;

    Ok(Json(SessionResponse {
        success: true,
        logged_in: false,
        total_count: 0,
        warning: None,
    }))
}

/// Current login state
pub async fn api_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        success: true,
        logged_in: state.tracker.is_logged_in(),
        total_count: state.tracker.count(),
        warning: None,
    })
}

/// Reject requests until the session is unlocked
pub async fn require_login(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.tracker.is_logged_in() {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

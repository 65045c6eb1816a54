//! Error types for thuchi-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use thuchi_core::CoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Không tìm thấy: {resource}")]
    NotFound { resource: String },

    #[error("Yêu cầu không hợp lệ: {message}")]
    BadRequest { message: String },

    #[error("Chưa đăng nhập")]
    Unauthorized,

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Body of every failed response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub code: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Core(e) => match e {
                CoreError::InvalidPasscode | CoreError::NotLoggedIn => StatusCode::UNAUTHORIZED,
                CoreError::TransactionNotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::FetchFailed { .. }
                | CoreError::UpdateFailed { .. }
                | CoreError::DeleteFailed { .. } => StatusCode::BAD_GATEWAY,
                CoreError::IoError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> String {
        match self {
            ApiError::NotFound { .. } => "NOT_FOUND".to_string(),
            ApiError::BadRequest { .. } => "BAD_REQUEST".to_string(),
            ApiError::Unauthorized => "NOT_LOGGED_IN".to_string(),
            ApiError::Core(e) => e.code().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{} {}", status, self);
        } else {
            log::debug!("{} {}", status, self);
        }

        let body = ErrorBody {
            success: false,
            message: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

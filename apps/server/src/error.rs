// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.
//!
//! Only transport-level problems become [`ApiError`]s. A drawing that
//! cannot be analyzed is still a 200 response whose `status` says why.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use panelcut_core::AnalysisError;
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing file in request")]
    MissingFile,

    #[error("File too large: maximum size is {max_mb} MB")]
    FileTooLarge { max_mb: usize },

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Invalid value for {field}: {value}")]
    InvalidParameter { field: String, value: String },

    #[error("Layout export failed: {0}")]
    Export(#[from] panelcut_core::ExportError),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ApiError::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE"),
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MULTIPART_ERROR"),
            ApiError::InvalidParameter { .. } => (StatusCode::BAD_REQUEST, "INVALID_PARAMETER"),
            ApiError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR"),
            ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_ERROR"),
        };

        // Server-side faults are logged in full but reported generically
        let error = if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Failure talking to an external collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CollaboratorError {
    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },

    #[error("{service} request failed: {message}")]
    Transport { service: &'static str, message: String },

    #[error("{service} timed out")]
    Timeout { service: &'static str },

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} response could not be decoded: {message}")]
    Decode { service: &'static str, message: String },
}

impl CollaboratorError {
    /// Classify a reqwest failure.
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CollaboratorError::Timeout { service }
        } else if let Some(status) = err.status() {
            CollaboratorError::Status {
                service,
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            CollaboratorError::Decode {
                service,
                message: err.to_string(),
            }
        } else {
            CollaboratorError::Transport {
                service,
                message: err.to_string(),
            }
        }
    }
}

impl From<CollaboratorError> for AnalysisError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::Decode { .. } => AnalysisError::MalformedResponse(err.to_string()),
            _ => AnalysisError::CollaboratorUnavailable(err.to_string()),
        }
    }
}

//! Error responses shared by the API handlers

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

/// API errors
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Failed(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Failed(err)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Failed(err) => match err {
                Error::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
                Error::Generation(_) | Error::Http(_) => {
                    (StatusCode::BAD_GATEWAY, "generation_failed")
                }
                Error::ReadingMalformed(_) => (StatusCode::BAD_GATEWAY, "reading_malformed"),
                Error::Speech(_) | Error::Decode(_) => (StatusCode::BAD_GATEWAY, "speech_failed"),
                Error::Sigil(_) => (StatusCode::BAD_GATEWAY, "sigil_failed"),
                Error::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "not_configured"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code) = self.parts();
        let message = match self {
            Self::BadRequest(msg) => msg,
            Self::Failed(err) => {
                if status.is_server_error() {
                    tracing::warn!(code, error = %err, "request failed");
                }
                err.user_message()
            }
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}

//! Sigil image endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;

use super::{ApiError, ApiState};

/// Build sigil router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/", post(create_sigil)).with_state(state)
}

/// Reading text to draw a sigil for
#[derive(Debug, Deserialize)]
pub struct SigilRequest {
    pub text: String,
}

async fn create_sigil(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SigilRequest>,
) -> Result<Response, ApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Empty text".to_string()));
    }

    let image = state.sigils.generate_sigil(text).await?;
    let bytes = image.bytes()?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, image.mime_type)], bytes).into_response())
}
